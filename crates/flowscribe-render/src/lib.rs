//! Renders diagram definitions with the Mermaid CLI (`mmdc`).
//!
//! Each call writes the definition to its own temporary `.mmd` file, which is
//! removed when the call returns, whatever the outcome.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::process::Command;

use flowscribe_core::{DiagramDefinition, OutputFormat, RenderResult, Renderer, RendererSettings};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("renderer `{program}` not found; install it with `npm install -g @mermaid-js/mermaid-cli` ({source})")]
    NotInstalled {
        program: String,
        #[source]
        source: which::Error,
    },

    #[error("could not run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program} --version` failed: {diagnostic}")]
    Probe { program: String, diagnostic: String },
}

/// The Mermaid CLI, resolved through `PATH` on every call.
#[derive(Debug, Clone)]
pub struct MermaidCli {
    program: String,
    output_dir: PathBuf,
}

impl MermaidCli {
    pub fn new(program: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            output_dir: output_dir.into(),
        }
    }

    pub fn from_settings(settings: &RendererSettings) -> Self {
        Self::new(&settings.program, &settings.output_dir)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn resolve(&self) -> Result<PathBuf, RenderError> {
        which::which(&self.program).map_err(|source| RenderError::NotInstalled {
            program: self.program.clone(),
            source,
        })
    }

    /// Run `<program> --version` and return what it prints.
    pub async fn check(&self) -> Result<String, RenderError> {
        let program = self.resolve()?;
        let output = Command::new(&program)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| RenderError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(RenderError::Probe {
                program: self.program.clone(),
                diagnostic: diagnostic_from(&output),
            });
        }
        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        info!(program = program.display().to_string(), version = version; "renderer available");
        Ok(version)
    }

    async fn invoke(
        &self,
        program: &Path,
        definition: &DiagramDefinition,
        output_path: &Path,
    ) -> io::Result<RenderResult> {
        let mut file = tempfile::Builder::new()
            .prefix("flowscribe-")
            .suffix(".mmd")
            .tempfile()?;
        file.write_all(definition.as_str().as_bytes())?;
        file.flush()?;
        // Close the handle but keep the deletion guard alive until we return.
        let input = file.into_temp_path();

        if let Some(dir) = output_path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        debug!(
            program = program.display().to_string(),
            input = input.display().to_string(),
            output = output_path.display().to_string();
            "invoking renderer"
        );

        let spawned = Command::new(program)
            .arg("-i")
            .arg(input.as_os_str())
            .arg("-o")
            .arg(output_path)
            .stdin(Stdio::null())
            .output()
            .await;

        let output = match spawned {
            Ok(output) => output,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(RenderResult::Unavailable {
                    diagnostic: format!("renderer `{}` not found: {e}", self.program),
                });
            }
            Err(e) => return Err(e),
        };

        if output.status.success() {
            info!(path = output_path.display().to_string(); "renderer succeeded");
            Ok(RenderResult::Rendered {
                path: output_path.to_path_buf(),
            })
        } else {
            let diagnostic = diagnostic_from(&output);
            warn!(status = output.status.to_string(), diagnostic = diagnostic; "renderer failed");
            Ok(RenderResult::Failed { diagnostic })
        }
    }
}

#[async_trait]
impl Renderer for MermaidCli {
    fn artifact_path(&self, target_base_name: &str, format: OutputFormat) -> PathBuf {
        format.artifact_path(&self.output_dir, target_base_name)
    }

    async fn render(
        &self,
        definition: &DiagramDefinition,
        target_base_name: &str,
        format: OutputFormat,
    ) -> RenderResult {
        let program = match self.resolve() {
            Ok(program) => program,
            Err(e) => {
                return RenderResult::Unavailable {
                    diagnostic: e.to_string(),
                }
            }
        };

        let output_path = self.artifact_path(target_base_name, format);
        match self.invoke(&program, definition, &output_path).await {
            Ok(result) => result,
            Err(e) => RenderResult::Failed {
                diagnostic: format!("could not run renderer: {e}"),
            },
        }
    }
}

/// Stderr and stdout of a failed run, or the exit status when both are empty.
fn diagnostic_from(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parts: Vec<&str> = [stderr.trim(), stdout.trim()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();

    if parts.is_empty() {
        format!("renderer exited with {}", output.status)
    } else {
        parts.join("\n")
    }
}
