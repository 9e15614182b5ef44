//! Google Vision integration: token minting and web-detection search.

pub mod client;
pub mod token;

pub use client::{VisionClient, VisionError};
pub use token::{TokenError, TokenMinter};
