//! OpenAI API wire types.

use serde::{Deserialize, Serialize};

/// Chat completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<ChatMessage>,
    /// Completion length cap.
    pub max_tokens: u32,
}

/// A chat message with mixed text/image content.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Message role ("user", "assistant", ...).
    pub role: String,
    /// Content parts.
    pub content: Vec<ContentPart>,
}

/// One part of a multimodal message.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Plain text.
    Text {
        /// The text.
        text: String,
    },
    /// An image reference (HTTP or data URL).
    ImageUrl {
        /// The image URL wrapper.
        image_url: ImageUrl,
    },
}

/// Image URL wrapper.
#[derive(Debug, Clone, Serialize)]
pub struct ImageUrl {
    /// The image URL.
    pub url: String,
}

/// Chat completion response (the parts we read).
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    /// Completion choices.
    pub choices: Vec<ChatChoice>,
}

/// One completion choice.
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    /// The assistant message.
    pub message: AssistantMessage,
}

/// Assistant message payload.
#[derive(Debug, Deserialize)]
pub struct AssistantMessage {
    /// Completion text.
    #[serde(default)]
    pub content: Option<String>,
}

/// Image generation request.
#[derive(Debug, Clone, Serialize)]
pub struct ImageGenerationRequest {
    /// Model identifier.
    pub model: String,
    /// Generation prompt.
    pub prompt: String,
    /// Number of images to generate.
    pub n: u32,
    /// Output resolution, e.g. "1024x1024".
    pub size: String,
    /// Quality tier.
    pub quality: String,
    /// Rendering style.
    pub style: String,
}

/// Image generation/edit response.
#[derive(Debug, Deserialize)]
pub struct ImageResponse {
    /// Generated images.
    pub data: Vec<ImageData>,
}

/// One generated image, delivered by URL or inline base64.
#[derive(Debug, Deserialize)]
pub struct ImageData {
    /// Time-limited download URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Inline base64 payload.
    #[serde(default)]
    pub b64_json: Option<String>,
}

/// OpenAI error response envelope.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    /// Error details.
    pub error: ErrorDetail,
}

/// OpenAI error detail.
#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    /// Error message.
    pub message: String,
    /// Error type.
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
}
