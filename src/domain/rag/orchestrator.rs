//! Orchestrator trait

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::error::RagError;
use super::result::AnswerResult;

/// Runs a question through the self-correcting RAG graph
#[async_trait]
pub trait RagOrchestrator: Send + Sync + std::fmt::Debug {
    /// Answer a question, aborting with `RagError::Cancelled` once `cancel` fires
    async fn run_with_cancellation(
        &self,
        question: &str,
        cancel: CancellationToken,
    ) -> Result<AnswerResult, RagError>;

    /// Answer a question without external cancellation
    async fn run(&self, question: &str) -> Result<AnswerResult, RagError> {
        self.run_with_cancellation(question, CancellationToken::new())
            .await
    }
}
