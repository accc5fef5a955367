//! Run result types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::graph::{Completion, RagNode};
use super::state::RunState;

/// Answer reported when the run ended without any generation
pub const NO_GROUNDED_ANSWER: &str = "No answer could be grounded in the available evidence.";

/// Final result of a self-correcting RAG run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResult {
    /// Final answer, verified or best effort
    pub answer: String,

    /// Whether the groundedness grader accepted the answer
    pub grounded: bool,

    /// Whether the answer-relevance grader accepted the answer
    pub on_topic: bool,

    pub retrieval_attempts_used: u32,

    pub generation_attempts_used: u32,

    /// Identifier carried by every log line of the run
    pub run_id: Uuid,

    /// Working question at the end of the run
    pub question_used: String,

    /// Number of evidence documents the final answer was generated from
    pub documents_used: usize,

    /// Nodes executed, in order
    pub steps: Vec<StepRecord>,

    pub started_at: DateTime<Utc>,

    /// Total execution time in milliseconds
    pub execution_time_ms: u64,
}

impl AnswerResult {
    /// Build the result from the terminal state of a run
    pub fn from_state(
        run_id: Uuid,
        state: RunState,
        completion: Completion,
        steps: Vec<StepRecord>,
        started_at: DateTime<Utc>,
        execution_time_ms: u64,
    ) -> Self {
        let has_generation = state.generation.is_some();

        Self {
            answer: state
                .generation
                .clone()
                .unwrap_or_else(|| NO_GROUNDED_ANSWER.to_string()),
            grounded: has_generation && completion.grounded(),
            on_topic: has_generation && completion.on_topic(),
            retrieval_attempts_used: state.retrieval_attempts(),
            generation_attempts_used: state.generation_attempts(),
            run_id,
            documents_used: state.documents.len(),
            question_used: state.question,
            steps,
            started_at,
            execution_time_ms,
        }
    }

    /// Whether the answer passed both checks
    pub fn is_verified(&self) -> bool {
        self.grounded && self.on_topic
    }

    /// Number of times a node was executed
    pub fn executions_of(&self, node: RagNode) -> usize {
        self.steps.iter().filter(|s| s.node == node).count()
    }
}

/// One executed node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub node: RagNode,

    /// Short description of what the node produced
    pub note: String,

    /// Execution time in milliseconds
    pub execution_time_ms: u64,
}

impl StepRecord {
    pub fn new(node: RagNode, note: impl Into<String>, execution_time_ms: u64) -> Self {
        Self {
            node,
            note: note.into(),
            execution_time_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished_state() -> RunState {
        let mut state = RunState::new("What is agent memory?");
        state.replace_documents(vec![crate::domain::rag::Document::new("doc")]);
        state.record_generation("Agent memory stores...".to_string());
        state
    }

    #[test]
    fn test_verified_result() {
        let result = AnswerResult::from_state(
            Uuid::new_v4(),
            finished_state(),
            Completion::Verified,
            vec![StepRecord::new(RagNode::Generate, "answer generated", 12)],
            Utc::now(),
            40,
        );

        assert_eq!(result.answer, "Agent memory stores...");
        assert!(result.is_verified());
        assert_eq!(result.generation_attempts_used, 1);
        assert_eq!(result.documents_used, 1);
        assert_eq!(result.executions_of(RagNode::Generate), 1);
        assert_eq!(result.executions_of(RagNode::Retrieve), 0);
    }

    #[test]
    fn test_best_effort_flags() {
        let result = AnswerResult::from_state(
            Uuid::new_v4(),
            finished_state(),
            Completion::Ungrounded,
            vec![],
            Utc::now(),
            0,
        );

        assert!(!result.grounded);
        assert!(!result.on_topic);
        assert_eq!(result.answer, "Agent memory stores...");
    }

    #[test]
    fn test_missing_generation_uses_sentinel() {
        let result = AnswerResult::from_state(
            Uuid::new_v4(),
            RunState::new("q"),
            Completion::Verified,
            vec![],
            Utc::now(),
            0,
        );

        assert_eq!(result.answer, NO_GROUNDED_ANSWER);
        assert!(!result.grounded);
        assert!(!result.on_topic);
    }

    #[test]
    fn test_serialization() {
        let result = AnswerResult::from_state(
            Uuid::new_v4(),
            finished_state(),
            Completion::OffTopic,
            vec![StepRecord::new(RagNode::Done(Completion::OffTopic), "done", 0)],
            Utc::now(),
            5,
        );

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"grounded\":true"));
        assert!(json.contains("\"on_topic\":false"));
        assert!(json.contains("\"node\":\"done\""));

        let deserialized: AnswerResult = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.answer, "Agent memory stores...");
    }
}
