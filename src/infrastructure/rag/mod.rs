//! Self-correcting RAG orchestration and reference collaborators

mod adapter;
mod in_memory_source;
mod llm_collaborators;
mod orchestrator;

pub use adapter::CollaboratorAdapter;
pub use in_memory_source::InMemoryDocumentSource;
pub use llm_collaborators::{
    llm_collaborators, LlmAnswerGenerator, LlmAnswerRelevanceGrader, LlmChat,
    LlmGroundednessGrader, LlmQueryRewriter, LlmRelevanceGrader,
};
pub use orchestrator::SelfRagOrchestrator;
