pub mod openai;

use async_trait::async_trait;

use crate::errors::AppError;

pub use openai::OpenAiClient;

/// One system + user exchange with the model.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    /// Ask the provider to constrain output to a JSON object.
    pub json_mode: bool,
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier recorded on generated artifacts.
    fn model_name(&self) -> &str;

    /// Returns the text content of the first completion choice.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AppError>;
}
