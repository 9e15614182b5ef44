//! The generation orchestrator.
//!
//! One logical generation is four provider calls with strict data
//! dependencies between the first three:
//!
//! 1. Analyze the original image with the vision model.
//! 2. Compose an enhanced prompt from the analysis and the requested change.
//! 3. Generate one image from the enhanced prompt.
//! 4. Caption the main objects for advisory display.
//!
//! Steps 1 and 3 are fatal; step 4 is best-effort and degrades to `None`.
//! The caller wraps the whole run in an explicit deadline and debits the
//! ledger only after the outcome (and its artifacts) are safely stored.

use crate::openai::{OpenAiClient, OpenAiError};

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    /// Provider URL of the generated image (time-limited; persist promptly).
    pub generated_image_url: String,
    /// Vision-model analysis of the original image.
    pub analysis: String,
    /// Advisory similar-objects text; `None` when captioning failed.
    pub similar_objects: Option<String>,
}

/// Fatal pipeline failures.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Image analysis failed; nothing was generated.
    #[error("image analysis failed: {0}")]
    Analysis(#[source] OpenAiError),

    /// Image generation failed.
    #[error("image generation failed: {0}")]
    Generation(#[source] OpenAiError),
}

/// Compose the enhanced generation prompt.
///
/// The template explicitly instructs composition preservation so edits stay
/// anchored to the original scene.
#[must_use]
pub fn enhanced_prompt(analysis: &str, requested_change: &str) -> String {
    format!(
        "Based on this image analysis: \"{analysis}\", create a new image that: \
         {requested_change}. Maintain the original composition and key elements \
         while applying the requested changes."
    )
}

/// Run the full generation sequence against the provider.
///
/// # Errors
///
/// Returns [`PipelineError`] when analysis or generation fails. Captioning
/// failures are logged and surface as `similar_objects = None`.
pub async fn generate(
    openai: &OpenAiClient,
    prompt: &str,
    image_data_url: &str,
) -> Result<GenerationOutcome, PipelineError> {
    let analysis = openai
        .analyze_image(image_data_url)
        .await
        .map_err(PipelineError::Analysis)?;

    tracing::debug!(chars = analysis.len(), "image analysis complete");

    let enhanced = enhanced_prompt(&analysis, prompt);
    let generated_image_url = openai
        .generate_image(&enhanced)
        .await
        .map_err(PipelineError::Generation)?;

    let similar_objects = match openai.describe_similar_objects(image_data_url).await {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::warn!(error = %e, "similar-object captioning failed; continuing without");
            None
        }
    };

    Ok(GenerationOutcome {
        generated_image_url,
        analysis,
        similar_objects,
    })
}
