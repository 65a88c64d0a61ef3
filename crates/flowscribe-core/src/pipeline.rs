//! The repair controller.
//!
//! One [`Pipeline::run`] call walks a fixed path through [`PipelineState`]:
//!
//! ```text
//! Init -> Generated -> Sanitized -> Rendered -> Done
//!                                \-> RepairAttempted -> Sanitized -> Rendered -> Done
//!                                                                 \-> Failed (placeholder)
//!                                \-> Failed (renderer unavailable)
//! ```
//!
//! There is no loop: the code calls the generator and the renderer at most
//! twice each, in sequence.

use std::fs;
use std::path::PathBuf;

use log::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    normalize, DiagramDefinition, Generator, OutputFormat, PipelineState, RenderResult, Renderer,
    RendererSettings, RepairContext,
};

/// Definition returned when both render attempts fail.
pub const FAILURE_PLACEHOLDER: &str = "graph TD;\n\
failed[Diagram could not be rendered] --> retry[Rephrase the description and try again]\n";

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("renderer unavailable: {diagnostic}")]
    RendererUnavailable { diagnostic: String },
}

/// How a pipeline names its artifacts. The directory belongs to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Prefix of every artifact name; the request id is appended to it.
    pub base_name: String,
    pub format: OutputFormat,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from(&RendererSettings::default())
    }
}

impl From<&RendererSettings> for PipelineConfig {
    fn from(settings: &RendererSettings) -> Self {
        Self {
            base_name: settings.base_name.clone(),
            format: settings.format,
        }
    }
}

/// Final result of a request. `success == false` means the repair cycle was
/// exhausted and `definition` is the failure placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    pub success: bool,
    pub definition: DiagramDefinition,
    pub image_path: PathBuf,
    pub request_id: String,
    /// Last renderer diagnostic, when the outcome is a failure.
    pub diagnostic: Option<String>,
    /// Every state the request passed through, starting with `Init`.
    pub history: Vec<PipelineState>,
}

pub struct Pipeline<G, R> {
    generator: G,
    renderer: R,
    config: PipelineConfig,
}

impl<G: Generator, R: Renderer> Pipeline<G, R> {
    pub fn new(generator: G, renderer: R, config: PipelineConfig) -> Self {
        Self {
            generator,
            renderer,
            config,
        }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Generate, sanitize and render a flowchart for `prompt`, repairing once on failure.
    ///
    /// # Errors
    ///
    /// Only [`PipelineError::RendererUnavailable`]. Every other failure ends in
    /// an outcome with `success == false`.
    pub async fn run(&self, prompt: &str) -> Result<PipelineOutcome, PipelineError> {
        let mut run = Run::start(&self.config.base_name);
        let format = self.config.format;

        let first = self.generator.generate(prompt, None).await;
        run.advance(PipelineState::Generated);

        let definition = normalize(&first.raw_text);
        run.advance(PipelineState::Sanitized);

        let rendered = self
            .renderer
            .render(&definition, &run.base_name, format)
            .await;
        let diagnostic = match rendered {
            RenderResult::Rendered { path } => return Ok(run.done(definition, path)),
            RenderResult::Unavailable { diagnostic } => return Err(run.unavailable(diagnostic)),
            RenderResult::Failed { diagnostic } => diagnostic,
        };

        run.advance(PipelineState::RepairAttempted);
        warn!(
            request_id = run.request_id,
            diagnostic = diagnostic;
            "render failed, asking generator for a repair"
        );

        let repair = RepairContext {
            definition,
            diagnostic,
        };
        let second = self.generator.generate(prompt, Some(&repair)).await;
        let repaired = normalize(&second.raw_text);
        run.advance(PipelineState::Sanitized);

        let rendered = self
            .renderer
            .render(&repaired, &run.base_name, format)
            .await;
        match rendered {
            RenderResult::Rendered { path } => Ok(run.done(repaired, path)),
            RenderResult::Unavailable { diagnostic } => Err(run.unavailable(diagnostic)),
            RenderResult::Failed { diagnostic } => {
                let path = self.renderer.artifact_path(&run.base_name, format);
                Ok(run.exhausted(path, diagnostic))
            }
        }
    }

    /// Sanitize and render an existing definition once. No generation, no repair.
    ///
    /// # Errors
    ///
    /// Only [`PipelineError::RendererUnavailable`].
    pub async fn render_existing(
        &self,
        raw: &str,
        base_name: &str,
    ) -> Result<PipelineOutcome, PipelineError> {
        let mut run = Run::start(base_name);
        let format = self.config.format;

        let definition = normalize(raw);
        run.advance(PipelineState::Sanitized);

        let rendered = self
            .renderer
            .render(&definition, &run.base_name, format)
            .await;
        match rendered {
            RenderResult::Rendered { path } => Ok(run.done(definition, path)),
            RenderResult::Unavailable { diagnostic } => Err(run.unavailable(diagnostic)),
            RenderResult::Failed { diagnostic } => {
                run.advance(PipelineState::Failed);
                Ok(PipelineOutcome {
                    success: false,
                    image_path: self.renderer.artifact_path(&run.base_name, format),
                    definition,
                    request_id: run.request_id,
                    diagnostic: Some(diagnostic),
                    history: run.history,
                })
            }
        }
    }
}

/// Per-request bookkeeping. Dropped once the outcome is built.
struct Run {
    request_id: String,
    base_name: String,
    history: Vec<PipelineState>,
}

impl Run {
    fn start(base_name: &str) -> Self {
        let request_id = Uuid::new_v4().simple().to_string();
        debug!(request_id = request_id; "pipeline started");
        Self {
            base_name: format!("{base_name}-{request_id}"),
            request_id,
            history: vec![PipelineState::Init],
        }
    }

    fn advance(&mut self, next: PipelineState) {
        debug!(request_id = self.request_id, state:? = next; "pipeline transition");
        self.history.push(next);
    }

    fn done(mut self, definition: DiagramDefinition, path: PathBuf) -> PipelineOutcome {
        self.advance(PipelineState::Rendered);
        self.advance(PipelineState::Done);
        info!(request_id = self.request_id, path = path.display().to_string(); "diagram rendered");
        PipelineOutcome {
            success: true,
            definition,
            image_path: path,
            request_id: self.request_id,
            diagnostic: None,
            history: self.history,
        }
    }

    fn unavailable(&mut self, diagnostic: String) -> PipelineError {
        self.advance(PipelineState::Failed);
        error!(request_id = self.request_id, diagnostic = diagnostic; "renderer unavailable");
        PipelineError::RendererUnavailable { diagnostic }
    }

    /// Both attempts failed: hand back the placeholder and an empty artifact.
    fn exhausted(mut self, path: PathBuf, diagnostic: String) -> PipelineOutcome {
        self.advance(PipelineState::Failed);
        warn!(
            request_id = self.request_id,
            path = path.display().to_string();
            "repair did not help, writing placeholder artifact"
        );
        if let Err(e) = write_empty_artifact(&path) {
            error!(path = path.display().to_string(), error = e.to_string(); "could not write placeholder artifact");
        }
        PipelineOutcome {
            success: false,
            definition: normalize(FAILURE_PLACEHOLDER),
            image_path: path,
            request_id: self.request_id,
            diagnostic: Some(diagnostic),
            history: self.history,
        }
    }
}

fn write_empty_artifact(path: &std::path::Path) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::File::create(path).map(|_| ())
}
