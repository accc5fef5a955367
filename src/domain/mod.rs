//! Domain layer - Core business logic and entities

pub mod error;
pub mod llm;
pub mod rag;

pub use error::DomainError;
pub use llm::{LlmProvider, LlmRequest, LlmResponse, Message, MessageRole};
pub use rag::{AnswerResult, Document, RagConfig, RagError, RagOrchestrator, Verdict};
