//! Mutable state threaded through one run

use serde::Serialize;

use super::document::Document;

/// State of a single self-correcting RAG run.
///
/// Created fresh per invocation and mutated only by the orchestrator's node
/// functions. The counters only ever increase.
#[derive(Debug, Clone, Serialize)]
pub struct RunState {
    /// Current working question, replaced on every rewrite
    pub question: String,
    original_question: String,
    /// Retained evidence from the most recent retrieval
    pub documents: Vec<Document>,
    /// Most recent generated answer
    pub generation: Option<String>,
    retrieval_attempts: u32,
    generation_attempts: u32,
}

impl RunState {
    pub fn new(question: impl Into<String>) -> Self {
        let question = question.into();
        Self {
            original_question: question.clone(),
            question,
            documents: Vec::new(),
            generation: None,
            retrieval_attempts: 0,
            generation_attempts: 0,
        }
    }

    pub fn original_question(&self) -> &str {
        &self.original_question
    }

    pub fn retrieval_attempts(&self) -> u32 {
        self.retrieval_attempts
    }

    pub fn generation_attempts(&self) -> u32 {
        self.generation_attempts
    }

    /// Replace the evidence set with a fresh retrieval
    pub fn replace_documents(&mut self, documents: Vec<Document>) {
        self.documents = documents;
    }

    /// Record a rewrite cycle
    pub fn record_rewrite(&mut self, question: String) {
        self.question = question;
        self.retrieval_attempts += 1;
    }

    /// Record a generation cycle
    pub fn record_generation(&mut self, generation: String) {
        self.generation = Some(generation);
        self.generation_attempts += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state() {
        let state = RunState::new("What is agent memory?");

        assert_eq!(state.question, "What is agent memory?");
        assert_eq!(state.original_question(), "What is agent memory?");
        assert!(state.documents.is_empty());
        assert!(state.generation.is_none());
        assert_eq!(state.retrieval_attempts(), 0);
        assert_eq!(state.generation_attempts(), 0);
    }

    #[test]
    fn test_rewrite_keeps_original_question() {
        let mut state = RunState::new("original");
        state.record_rewrite("first rewrite".to_string());
        state.record_rewrite("second rewrite".to_string());

        assert_eq!(state.question, "second rewrite");
        assert_eq!(state.original_question(), "original");
        assert_eq!(state.retrieval_attempts(), 2);
    }

    #[test]
    fn test_replace_documents_drops_stale_evidence() {
        let mut state = RunState::new("q");
        state.replace_documents(vec![Document::new("old-1"), Document::new("old-2")]);
        state.replace_documents(vec![Document::new("fresh")]);

        assert_eq!(state.documents, vec![Document::new("fresh")]);
    }

    #[test]
    fn test_record_generation() {
        let mut state = RunState::new("q");
        state.record_generation("first".to_string());
        state.record_generation("second".to_string());

        assert_eq!(state.generation.as_deref(), Some("second"));
        assert_eq!(state.generation_attempts(), 2);
    }
}
