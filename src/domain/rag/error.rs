//! Errors surfaced by a self-correcting RAG run

use thiserror::Error;

use super::collaborator::Collaborator;

/// Errors that end a run without an answer.
///
/// Loop-bound exhaustion is deliberately absent: it resolves to a flagged
/// best-effort `AnswerResult`.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RagError {
    #[error("{collaborator} timed out after {timeout_ms}ms")]
    CollaboratorTimeout {
        collaborator: Collaborator,
        timeout_ms: u64,
    },

    #[error("{collaborator} returned malformed output: {message}")]
    CollaboratorMalformedOutput {
        collaborator: Collaborator,
        message: String,
    },

    #[error("{collaborator} failed: {message}")]
    CollaboratorFailed {
        collaborator: Collaborator,
        message: String,
    },

    #[error("Run cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RagError {
    pub fn timeout(collaborator: Collaborator, timeout_ms: u64) -> Self {
        Self::CollaboratorTimeout {
            collaborator,
            timeout_ms,
        }
    }

    pub fn malformed_output(collaborator: Collaborator, message: impl Into<String>) -> Self {
        Self::CollaboratorMalformedOutput {
            collaborator,
            message: message.into(),
        }
    }

    pub fn collaborator_failed(collaborator: Collaborator, message: impl Into<String>) -> Self {
        Self::CollaboratorFailed {
            collaborator,
            message: message.into(),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The collaborator responsible for the failure, if any
    pub fn collaborator(&self) -> Option<Collaborator> {
        match self {
            Self::CollaboratorTimeout { collaborator, .. }
            | Self::CollaboratorMalformedOutput { collaborator, .. }
            | Self::CollaboratorFailed { collaborator, .. } => Some(*collaborator),
            Self::Cancelled | Self::InvalidConfig(_) => None,
        }
    }
}
