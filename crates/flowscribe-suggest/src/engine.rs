use serde::{Deserialize, Serialize};

use flowscribe_core::GeneratorSettings;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("request to generator failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("generator returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("generator returned no message content")]
    EmptyContent,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 3],
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

/// One non-streaming chat round-trip. The control entry turns on the model's reasoning mode.
pub async fn generate(
    client: &reqwest::Client,
    settings: &GeneratorSettings,
    system: &str,
    user_msg: &str,
) -> Result<String, EngineError> {
    let body = ChatRequest {
        model: &settings.model,
        messages: [
            ChatMessage {
                role: "control",
                content: "thinking",
            },
            ChatMessage {
                role: "system",
                content: system,
            },
            ChatMessage {
                role: "user",
                content: user_msg,
            },
        ],
        stream: false,
    };

    let response = client.post(&settings.url).json(&body).send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(EngineError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let parsed: ChatResponse = response.json().await?;
    match parsed.message {
        Some(message) if !message.content.trim().is_empty() => Ok(message.content),
        _ => Err(EngineError::EmptyContent),
    }
}
