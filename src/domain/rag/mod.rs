//! Self-correcting RAG domain
//!
//! Types, collaborator contracts and the control graph of a run that
//! retrieves evidence, grades it, generates an answer and verifies that
//! answer, looping back through query rewriting or regeneration within
//! configured bounds.

mod collaborator;
mod config;
mod document;
mod error;
mod graph;
mod orchestrator;
mod result;
mod state;
mod verdict;

pub use collaborator::{
    AnswerGenerator, AnswerRelevanceGrader, Collaborator, Collaborators, DocumentSource,
    GroundednessGrader, QueryRewriter, RelevanceGrader,
};
pub use config::RagConfig;
pub use document::{Document, MetadataValue};
pub use error::RagError;
pub use graph::{next_node, Completion, NodeOutcome, RagNode};
pub use orchestrator::RagOrchestrator;
pub use result::{AnswerResult, StepRecord, NO_GROUNDED_ANSWER};
pub use state::RunState;
pub use verdict::Verdict;

#[cfg(test)]
pub use collaborator::mock;
#[cfg(test)]
pub use collaborator::{
    MockAnswerGenerator, MockAnswerRelevanceGrader, MockDocumentSource, MockGroundednessGrader,
    MockQueryRewriter, MockRelevanceGrader,
};
