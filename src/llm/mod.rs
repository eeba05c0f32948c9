pub mod gemini;

pub use gemini::{GeminiClient, LlmResponse};

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Seam between the pipeline stages and the model API, so each stage can be
/// exercised against a scripted generator in tests.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<LlmResponse>;
}

pub type SharedGenerator = Arc<dyn TextGenerator>;
