//! OpenAI integration for vision analysis, image generation, and edits.

pub mod client;
pub mod types;

pub use client::{OpenAiClient, OpenAiError};
