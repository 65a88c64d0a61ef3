//! CLI logic for flowscribe.
//!
//! Wires the HTTP generator and the Mermaid CLI renderer into a
//! [`Pipeline`] and reports the outcome on stdout.

pub mod input;

mod args;

pub use args::{Args, Command, Overrides};

use std::fs;
use std::io;
use std::path::Path;

use log::{info, warn};
use thiserror::Error;

use flowscribe_core::{
    read_settings, read_settings_from, settings_path, write_settings, write_settings_to, Pipeline,
    OutputFormat, PipelineConfig, PipelineError, PipelineOutcome, RenderResult, Renderer, Settings,
    SettingsError,
};
use flowscribe_render::{MermaidCli, RenderError};
use flowscribe_suggest::OllamaGenerator;

use input::InputError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("could not read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("could not encode settings: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("diagram could not be rendered: {0}")]
    Unrendered(String),
}

/// Load settings from `--settings` when given, else from the global file,
/// then apply command-line overrides.
///
/// # Errors
///
/// An explicit settings file that cannot be read or parsed is an error. The
/// global file falls back to defaults instead.
pub fn load_settings(args: &Args) -> Result<Settings, CliError> {
    let mut settings = match &args.settings {
        Some(path) => read_settings_from(path)?,
        None => read_settings(),
    };
    apply_overrides(&mut settings, &args.overrides);
    Ok(settings)
}

pub fn apply_overrides(settings: &mut Settings, overrides: &Overrides) {
    if let Some(url) = &overrides.url {
        settings.generator.url = url.clone();
    }
    if let Some(model) = &overrides.model {
        settings.generator.model = model.clone();
    }
    if let Some(program) = &overrides.renderer {
        settings.renderer.program = program.clone();
    }
    if let Some(dir) = &overrides.output_dir {
        settings.renderer.output_dir = dir.clone();
    }
    if let Some(format) = overrides.format {
        settings.renderer.format = format;
    }
}

fn build_pipeline(settings: &Settings) -> Pipeline<OllamaGenerator, MermaidCli> {
    Pipeline::new(
        OllamaGenerator::new(settings.generator.clone()),
        MermaidCli::from_settings(&settings.renderer),
        PipelineConfig::from(&settings.renderer),
    )
}

/// Run the flowscribe CLI application.
///
/// # Errors
///
/// Returns [`CliError`] for unreadable input or settings, a missing renderer,
/// and a diagram that could not be rendered even after repair.
pub async fn run(args: &Args) -> Result<(), CliError> {
    let settings = load_settings(args)?;

    match &args.command {
        Command::Generate { text, file, also } => {
            let prompt = input::read_prompt(text.as_deref(), file.as_deref())?;
            info!(
                model = settings.generator.model,
                chars = prompt.chars().count();
                "Generating flowchart"
            );
            let pipeline = build_pipeline(&settings);
            let outcome = pipeline.run(&prompt).await?;
            report(&outcome)?;
            export_also(pipeline.renderer(), &outcome, settings.renderer.format, *also).await
        }
        Command::Render { file, also } => {
            let raw = fs::read_to_string(file).map_err(|source| CliError::Read {
                path: file.display().to_string(),
                source,
            })?;
            let base_name = base_name_for(file, &settings.renderer.base_name);
            info!(input = file.display().to_string(), base_name = base_name; "Rendering definition");
            let pipeline = build_pipeline(&settings);
            let outcome = pipeline.render_existing(&raw, &base_name).await?;
            report(&outcome)?;
            export_also(pipeline.renderer(), &outcome, settings.renderer.format, *also).await
        }
        Command::Check => {
            let renderer = MermaidCli::from_settings(&settings.renderer);
            let version = renderer.check().await?;
            println!("{} {}", renderer.program(), version);
            Ok(())
        }
        Command::Config { save } => {
            if *save {
                match &args.settings {
                    Some(path) => write_settings_to(path, &settings)?,
                    None => write_settings(&settings)?,
                }
                let path = args.settings.clone().unwrap_or_else(settings_path);
                info!(path = path.display().to_string(); "Settings saved");
            }
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
    }
}

/// Artifact prefix for `render`: the input's file stem, or the configured base name.
fn base_name_for(file: &Path, fallback: &str) -> String {
    file.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// Print the definition and image path. An unsuccessful outcome still prints
/// both, then surfaces as an error so the process exits non-zero.
fn report(outcome: &PipelineOutcome) -> Result<(), CliError> {
    print!("{}", outcome.definition);
    println!("{}", outcome.image_path.display());

    if outcome.success {
        info!(
            request_id = outcome.request_id,
            path = outcome.image_path.display().to_string();
            "Flowchart rendered"
        );
        Ok(())
    } else {
        let diagnostic = outcome.diagnostic.clone().unwrap_or_default();
        warn!(request_id = outcome.request_id, history:? = outcome.history; "Rendering failed");
        Err(CliError::Unrendered(diagnostic))
    }
}

/// Render an already rendered definition once more in a second format, next
/// to the first artifact. Outside the repair cycle: no retry, no placeholder.
async fn export_also(
    renderer: &MermaidCli,
    outcome: &PipelineOutcome,
    primary: OutputFormat,
    also: Option<OutputFormat>,
) -> Result<(), CliError> {
    let Some(format) = also.filter(|format| *format != primary) else {
        return Ok(());
    };
    let Some(base_name) = outcome.image_path.file_stem().and_then(|stem| stem.to_str()) else {
        return Ok(());
    };

    match renderer.render(&outcome.definition, base_name, format).await {
        RenderResult::Rendered { path } => {
            println!("{}", path.display());
            info!(request_id = outcome.request_id, path = path.display().to_string(); "Exported second format");
            Ok(())
        }
        RenderResult::Failed { diagnostic } | RenderResult::Unavailable { diagnostic } => {
            Err(CliError::Unrendered(diagnostic))
        }
    }
}
