//! Client for Google's Gemini generative API.
//!
//! Wraps the three remote capabilities the studio relies on:
//! - text generation (free text or schema-constrained JSON)
//! - image generation / editing from a prompt and optional reference image
//! - long-running video generation operations
//!
//! Callers depend on the [`GenerativeProvider`] trait; [`GeminiClient`] is
//! the HTTP implementation.

pub mod client;
pub mod config;
pub mod error;
pub mod provider;
mod types;

pub use client::GeminiClient;
pub use config::GenAiConfig;
pub use error::{GenAiError, GenAiResult};
pub use provider::{
    GenerativeProvider, ImageRequest, OperationStatus, TextRequest, VideoOperation, VideoRequest,
};
