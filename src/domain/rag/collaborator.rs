//! Collaborator traits consumed by the orchestrator
//!
//! Each trait is the input/output contract of one external collaborator.
//! Implementations report contract violations (for example a grader that
//! produced neither verdict) as `DomainError::MalformedOutput`.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(test)]
use mockall::automock;

use super::document::Document;
use super::verdict::Verdict;
use crate::domain::DomainError;

/// Identifies a collaborator in errors, logs and traces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collaborator {
    DocumentSource,
    RelevanceGrader,
    AnswerGenerator,
    GroundednessGrader,
    AnswerRelevanceGrader,
    QueryRewriter,
}

impl Collaborator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collaborator::DocumentSource => "document_source",
            Collaborator::RelevanceGrader => "relevance_grader",
            Collaborator::AnswerGenerator => "answer_generator",
            Collaborator::GroundednessGrader => "groundedness_grader",
            Collaborator::AnswerRelevanceGrader => "answer_relevance_grader",
            Collaborator::QueryRewriter => "query_rewriter",
        }
    }
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns candidate evidence for a query. No results is an empty vector.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn retrieve(&self, query: &str) -> Result<Vec<Document>, DomainError>;
}

/// Judges whether one document is relevant to the question
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RelevanceGrader: Send + Sync {
    async fn grade(&self, question: &str, document: &Document) -> Result<Verdict, DomainError>;
}

/// Produces an answer from the question and the retained evidence
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, question: &str, documents: &[Document])
        -> Result<String, DomainError>;
}

/// Judges whether a generation is supported by the evidence.
/// `Verdict::Irrelevant` means the answer is hallucinated.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GroundednessGrader: Send + Sync {
    async fn grade(&self, generation: &str, documents: &[Document])
        -> Result<Verdict, DomainError>;
}

/// Judges whether a generation addresses the question
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AnswerRelevanceGrader: Send + Sync {
    async fn grade(&self, question: &str, generation: &str) -> Result<Verdict, DomainError>;
}

/// Rewrites a question to retrieve better evidence
#[cfg_attr(test, automock)]
#[async_trait]
pub trait QueryRewriter: Send + Sync {
    async fn rewrite(&self, question: &str) -> Result<String, DomainError>;
}

/// The full set of collaborators injected into an orchestrator
#[derive(Clone)]
pub struct Collaborators {
    pub document_source: Arc<dyn DocumentSource>,
    pub relevance_grader: Arc<dyn RelevanceGrader>,
    pub answer_generator: Arc<dyn AnswerGenerator>,
    pub groundedness_grader: Arc<dyn GroundednessGrader>,
    pub answer_relevance_grader: Arc<dyn AnswerRelevanceGrader>,
    pub query_rewriter: Arc<dyn QueryRewriter>,
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
