pub mod pipeline;
pub mod rules;
pub mod sanitize;

pub use pipeline::{Pipeline, PipelineConfig, PipelineError, PipelineOutcome};
pub use sanitize::normalize;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// --- Types ---

/// Text returned by a generator. Always present: a failed call carries a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub raw_text: String,
}

impl GenerationResult {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
        }
    }
}

/// A flowchart definition that went through [`normalize`].
///
/// Starts with a header line, has no blank lines and ends with a newline.
/// The only way to build one is through the sanitizer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiagramDefinition(String);

impl DiagramDefinition {
    pub(crate) fn from_normalized(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The header declaration, e.g. `graph TD;`.
    pub fn header(&self) -> &str {
        self.0.lines().next().unwrap_or_default()
    }

    /// Statement lines after the header.
    pub fn statements(&self) -> impl Iterator<Item = &str> {
        self.0.lines().skip(1)
    }
}

impl fmt::Display for DiagramDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DiagramDefinition {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for DiagramDefinition {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for DiagramDefinition {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Svg,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }

    /// Where an artifact named `base_name` lands inside `output_dir`.
    pub fn artifact_path(self, output_dir: &Path, base_name: &str) -> PathBuf {
        output_dir.join(format!("{}.{}", base_name, self.extension()))
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "svg" => Ok(OutputFormat::Svg),
            other => Err(format!("unsupported output format: {other} (expected png or svg)")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Outcome of one renderer invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderResult {
    Rendered { path: PathBuf },
    Failed { diagnostic: String },
    /// The renderer executable could not be found. Regenerating text cannot fix this.
    Unavailable { diagnostic: String },
}

impl RenderResult {
    pub fn success(&self) -> bool {
        matches!(self, RenderResult::Rendered { .. })
    }

    /// Artifact path on success, diagnostic text otherwise.
    pub fn path_or_diagnostic(&self) -> String {
        match self {
            RenderResult::Rendered { path } => path.display().to_string(),
            RenderResult::Failed { diagnostic } | RenderResult::Unavailable { diagnostic } => {
                diagnostic.clone()
            }
        }
    }
}

/// What a repair call sends back to the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairContext {
    pub definition: DiagramDefinition,
    pub diagnostic: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    Init,
    Generated,
    Sanitized,
    Rendered,
    RepairAttempted,
    Failed,
    Done,
}

// --- Capabilities ---

/// Produces candidate diagram text from a prompt. Must not fail.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str, repair: Option<&RepairContext>) -> GenerationResult;
}

/// Turns a definition into an image artifact named after `target_base_name`.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Where an artifact for `target_base_name` lands. [`Renderer::render`]
    /// writes to this path on success.
    fn artifact_path(&self, target_base_name: &str, format: OutputFormat) -> PathBuf;

    async fn render(
        &self,
        definition: &DiagramDefinition,
        target_base_name: &str,
        format: OutputFormat,
    ) -> RenderResult;
}

// --- Settings ---

pub const DEFAULT_GENERATOR_URL: &str = "http://localhost:11434/api/chat";
pub const DEFAULT_MODEL: &str = "granite3.3:8b";
pub const DEFAULT_RENDERER: &str = "mmdc";
pub const DEFAULT_OUTPUT_DIR: &str = "static";
pub const DEFAULT_BASE_NAME: &str = "generated_flowchart";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid settings file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorSettings {
    /// Chat endpoint of the text-generation service
    pub url: String,
    pub model: String,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_GENERATOR_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RendererSettings {
    /// Executable name or path of the Mermaid CLI
    pub program: String,
    pub output_dir: PathBuf,
    /// Prefix for artifact names; each request appends its own id
    pub base_name: String,
    pub format: OutputFormat,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            program: DEFAULT_RENDERER.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            base_name: DEFAULT_BASE_NAME.to_string(),
            format: OutputFormat::Png,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub generator: GeneratorSettings,
    pub renderer: RendererSettings,
}

/// Resolve the global settings directory (~/.flowscribe/).
pub fn settings_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".flowscribe")
}

pub fn settings_path() -> PathBuf {
    settings_dir().join("settings.json")
}

/// Read the global settings, falling back to defaults when the file is missing or broken.
pub fn read_settings() -> Settings {
    let path = settings_path();
    if !path.exists() {
        return Settings::default();
    }
    match read_settings_from(&path) {
        Ok(settings) => settings,
        Err(e) => {
            log::warn!(path = path.display().to_string(), error = e.to_string(); "ignoring unreadable settings");
            Settings::default()
        }
    }
}

/// Read settings from an explicit file. Unlike [`read_settings`], errors are reported.
pub fn read_settings_from(path: &Path) -> Result<Settings, SettingsError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub fn write_settings(settings: &Settings) -> Result<(), SettingsError> {
    write_settings_to(&settings_path(), settings)
}

/// Uses temp file + rename so a concurrent reader never sees a half-written file.
pub fn write_settings_to(path: &Path, settings: &Settings) -> Result<(), SettingsError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_parses_case_insensitively() {
        assert_eq!("PNG".parse::<OutputFormat>(), Ok(OutputFormat::Png));
        assert_eq!("svg".parse::<OutputFormat>(), Ok(OutputFormat::Svg));
        assert!("gif".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn artifact_path_appends_extension() {
        let path = OutputFormat::Svg.artifact_path(Path::new("static"), "chart-1");
        assert_eq!(path, PathBuf::from("static/chart-1.svg"));
    }

    #[test]
    fn render_result_reports_path_or_diagnostic() {
        let ok = RenderResult::Rendered {
            path: PathBuf::from("static/a.png"),
        };
        assert!(ok.success());
        assert_eq!(ok.path_or_diagnostic(), "static/a.png");

        let failed = RenderResult::Failed {
            diagnostic: "Parse error on line 2".to_string(),
        };
        assert!(!failed.success());
        assert_eq!(failed.path_or_diagnostic(), "Parse error on line 2");
    }

    #[test]
    fn settings_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut settings = Settings::default();
        settings.generator.model = "llama3".to_string();
        settings.renderer.format = OutputFormat::Svg;

        write_settings_to(&path, &settings).unwrap();
        assert_eq!(read_settings_from(&path).unwrap(), settings);
    }

    #[test]
    fn partial_settings_fill_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"renderer":{"format":"svg"}}"#).unwrap();

        let settings = read_settings_from(&path).unwrap();
        assert_eq!(settings.renderer.format, OutputFormat::Svg);
        assert_eq!(settings.renderer.program, DEFAULT_RENDERER);
        assert_eq!(settings.generator, GeneratorSettings::default());
    }

    #[test]
    fn malformed_settings_are_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            read_settings_from(&path),
            Err(SettingsError::Json(_))
        ));
    }
}
