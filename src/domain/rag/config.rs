//! Run configuration for the self-correcting RAG orchestrator

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::RagError;

/// Configuration for a self-correcting RAG run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagConfig {
    /// Maximum rewrite/retrieve cycles
    #[serde(default = "default_attempt_bound")]
    pub retrieval_attempt_bound: u32,
    /// Maximum generation cycles
    #[serde(default = "default_attempt_bound")]
    pub generation_attempt_bound: u32,
    /// Timeout applied to every collaborator call, in milliseconds
    #[serde(default = "default_per_call_timeout_ms")]
    pub per_call_timeout_ms: u64,
    /// Grade retrieved documents concurrently
    #[serde(default)]
    pub parallel_document_grading: bool,
}

fn default_attempt_bound() -> u32 {
    3
}

fn default_per_call_timeout_ms() -> u64 {
    60000
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            retrieval_attempt_bound: default_attempt_bound(),
            generation_attempt_bound: default_attempt_bound(),
            per_call_timeout_ms: default_per_call_timeout_ms(),
            parallel_document_grading: false,
        }
    }
}

impl RagConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retrieval_attempt_bound(mut self, bound: u32) -> Self {
        self.retrieval_attempt_bound = bound;
        self
    }

    pub fn with_generation_attempt_bound(mut self, bound: u32) -> Self {
        self.generation_attempt_bound = bound;
        self
    }

    pub fn with_per_call_timeout(mut self, timeout: Duration) -> Self {
        self.per_call_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_parallel_document_grading(mut self, parallel: bool) -> Self {
        self.parallel_document_grading = parallel;
        self
    }

    pub fn per_call_timeout(&self) -> Duration {
        Duration::from_millis(self.per_call_timeout_ms)
    }

    /// Reject configurations that would make the loop bounds meaningless
    pub fn validate(&self) -> Result<(), RagError> {
        if self.retrieval_attempt_bound == 0 {
            return Err(RagError::invalid_config(
                "retrieval_attempt_bound must be at least 1",
            ));
        }

        if self.generation_attempt_bound == 0 {
            return Err(RagError::invalid_config(
                "generation_attempt_bound must be at least 1",
            ));
        }

        if self.per_call_timeout_ms == 0 {
            return Err(RagError::invalid_config(
                "per_call_timeout_ms must be greater than 0",
            ));
        }

        Ok(())
    }
}
