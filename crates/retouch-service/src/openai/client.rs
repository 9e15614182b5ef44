//! OpenAI API client.
//!
//! One client instance is constructed at startup and shared by the
//! generation pipeline and the edit endpoint. All provider error bodies are
//! kept inside [`OpenAiError`] values: handlers log them and return generic
//! messages.

use super::types::{
    ChatMessage, ChatRequest, ChatResponse, ContentPart, ErrorResponse, ImageGenerationRequest,
    ImageResponse, ImageUrl,
};

/// Vision-capable chat model used for analysis and captioning.
const VISION_MODEL: &str = "gpt-4o";

/// Image generation model.
const GENERATION_MODEL: &str = "dall-e-3";

/// Image edit model.
const EDIT_MODEL: &str = "gpt-image-1";

/// Fixed output resolution for generations and edits.
const IMAGE_SIZE: &str = "1024x1024";

/// Cap on vision-call completions.
const MAX_COMPLETION_TOKENS: u32 = 150;

/// Errors from the OpenAI API.
#[derive(Debug, thiserror::Error)]
pub enum OpenAiError {
    /// The API returned a non-success status.
    #[error("OpenAI API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Provider error message (internal use only).
        message: String,
    },

    /// Network or protocol failure.
    #[error("OpenAI request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The response parsed but carried no usable payload.
    #[error("unexpected OpenAI response: {0}")]
    UnexpectedResponse(String),
}

/// OpenAI API client.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    /// Create a client against the given API base URL.
    #[must_use]
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    /// Describe the key elements of an image.
    ///
    /// # Errors
    ///
    /// Fails when the API rejects the call or returns no content; the
    /// pipeline treats this as fatal.
    pub async fn analyze_image(&self, image_data_url: &str) -> Result<String, OpenAiError> {
        self.vision_prompt(
            "Analyze this image and describe its key elements:",
            image_data_url,
        )
        .await
    }

    /// Enumerate the main objects in an image and suggest similar items.
    ///
    /// # Errors
    ///
    /// Fails when the API rejects the call; the pipeline treats this as
    /// advisory and continues without.
    pub async fn describe_similar_objects(
        &self,
        image_data_url: &str,
    ) -> Result<String, OpenAiError> {
        self.vision_prompt(
            "Identify the main objects in this image and suggest similar items:",
            image_data_url,
        )
        .await
    }

    async fn vision_prompt(
        &self,
        instruction: &str,
        image_data_url: &str,
    ) -> Result<String, OpenAiError> {
        let body = ChatRequest {
            model: VISION_MODEL.to_string(),
            messages: vec![ChatMessage {
                role: "user".into(),
                content: vec![
                    ContentPart::Text {
                        text: instruction.into(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: image_data_url.into(),
                        },
                    },
                ],
            }],
            max_tokens: MAX_COMPLETION_TOKENS,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let response = check_status(response).await?;
        let chat: ChatResponse = response.json().await?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| OpenAiError::UnexpectedResponse("no completion content".into()))
    }

    /// Generate exactly one image at the fixed resolution and highest
    /// quality tier, returning its download URL.
    ///
    /// # Errors
    ///
    /// Fails on API rejection or a response with no image.
    pub async fn generate_image(&self, prompt: &str) -> Result<String, OpenAiError> {
        let body = ImageGenerationRequest {
            model: GENERATION_MODEL.to_string(),
            prompt: prompt.to_string(),
            n: 1,
            size: IMAGE_SIZE.to_string(),
            quality: "hd".to_string(),
            style: "natural".to_string(),
        };

        let response = self
            .http
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let response = check_status(response).await?;
        let images: ImageResponse = response.json().await?;

        first_image_url(images)
    }

    /// Edit an image with the given instruction, returning a URL or a data
    /// URL depending on how the provider delivers the result.
    ///
    /// # Errors
    ///
    /// Fails on API rejection or a response with no image.
    pub async fn edit_image(
        &self,
        image_bytes: Vec<u8>,
        prompt: &str,
    ) -> Result<String, OpenAiError> {
        let image_part = reqwest::multipart::Part::bytes(image_bytes)
            .file_name("image.png")
            .mime_str("image/png")
            .map_err(|e| OpenAiError::UnexpectedResponse(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .text("model", EDIT_MODEL)
            .text("prompt", prompt.to_string())
            .text("n", "1")
            .text("size", IMAGE_SIZE)
            .part("image", image_part);

        let response = self
            .http
            .post(format!("{}/images/edits", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let response = check_status(response).await?;
        let images: ImageResponse = response.json().await?;

        first_image_url(images)
    }
}

/// Extract the first image as a URL, preferring the provider URL and
/// falling back to wrapping an inline payload as a data URL.
fn first_image_url(images: ImageResponse) -> Result<String, OpenAiError> {
    let image = images
        .data
        .into_iter()
        .next()
        .ok_or_else(|| OpenAiError::UnexpectedResponse("no images in response".into()))?;

    if let Some(url) = image.url {
        return Ok(url);
    }
    if let Some(b64) = image.b64_json {
        return Ok(format!("data:image/png;base64,{b64}"));
    }
    Err(OpenAiError::UnexpectedResponse(
        "image carried neither url nor b64_json".into(),
    ))
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, OpenAiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&text)
        .map_or_else(|_| truncated(&text), |e| e.error.message);

    Err(OpenAiError::Api {
        status: status.as_u16(),
        message,
    })
}

fn truncated(text: &str) -> String {
    text.chars().take(200).collect()
}
