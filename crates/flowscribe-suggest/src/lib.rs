pub mod engine;
mod parse;
mod prompt;

use async_trait::async_trait;
use log::{debug, info, warn};

use flowscribe_core::{GenerationResult, Generator, GeneratorSettings, RepairContext};

pub use parse::extract_mermaid_block;

/// Returned in place of real output whenever the generator cannot be used.
/// Already satisfies the flowchart grammar.
pub const PLACEHOLDER_DEFINITION: &str = "graph TD;\n\
unavailable[Could not generate a diagram] --> check[Check that the generator service is running]\n";

/// Generator backed by an Ollama-compatible chat endpoint.
pub struct OllamaGenerator {
    client: reqwest::Client,
    settings: GeneratorSettings,
}

impl OllamaGenerator {
    pub fn new(settings: GeneratorSettings) -> Self {
        Self::with_client(reqwest::Client::new(), settings)
    }

    pub fn with_client(client: reqwest::Client, settings: GeneratorSettings) -> Self {
        Self { client, settings }
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    /// Ask the model for a flowchart. Returns the placeholder on any failure.
    async fn generate(&self, prompt: &str, repair: Option<&RepairContext>) -> GenerationResult {
        let system = prompt::system_prompt();
        let user_msg = match repair {
            Some(ctx) => prompt::repair_message(prompt, ctx),
            None => prompt::user_message(prompt),
        };

        info!(
            url = self.settings.url,
            model = self.settings.model,
            repair = repair.is_some();
            "sending prompt to generator"
        );

        let raw = match engine::generate(&self.client, &self.settings, &system, &user_msg).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = e.to_string(); "generate error, using placeholder");
                return GenerationResult::new(PLACEHOLDER_DEFINITION);
            }
        };

        debug!(raw = raw; "raw generator output");

        match parse::extract_mermaid_block(&raw) {
            Some(code) => {
                info!(lines = code.lines().count(); "extracted mermaid block");
                GenerationResult::new(code)
            }
            None => {
                warn!("no mermaid block in generator output, using placeholder");
                GenerationResult::new(PLACEHOLDER_DEFINITION)
            }
        }
    }
}
