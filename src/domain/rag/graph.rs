//! Control graph of the self-correcting RAG run
//!
//! The graph is an explicit state machine: every node reports a
//! [`NodeOutcome`] and [`next_node`] decides where the run goes next. Routing
//! is a pure function of the outcome, the run state and the loop bounds, so
//! it can be exercised without any collaborator.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::config::RagConfig;
use super::state::RunState;
use super::verdict::Verdict;

/// How a run reached `Done`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    /// Grounded in the evidence and on-topic
    Verified,
    /// Still hallucinated when the generation bound ran out
    Ungrounded,
    /// Grounded but off-topic when the retrieval bound ran out
    OffTopic,
}

impl Completion {
    pub fn grounded(&self) -> bool {
        matches!(self, Self::Verified | Self::OffTopic)
    }

    pub fn on_topic(&self) -> bool {
        matches!(self, Self::Verified)
    }
}

/// Nodes of the control graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", content = "completion", rename_all = "snake_case")]
pub enum RagNode {
    Start,
    Retrieve,
    GradeDocuments,
    Rewrite,
    Generate,
    GradeGroundedness,
    GradeAnswerRelevance,
    Done(Completion),
}

impl RagNode {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            RagNode::Start => "start",
            RagNode::Retrieve => "retrieve",
            RagNode::GradeDocuments => "grade_documents",
            RagNode::Rewrite => "rewrite",
            RagNode::Generate => "generate",
            RagNode::GradeGroundedness => "grade_groundedness",
            RagNode::GradeAnswerRelevance => "grade_answer_relevance",
            RagNode::Done(_) => "done",
        }
    }
}

impl fmt::Display for RagNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a node produced, as far as routing is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeOutcome {
    Started,
    Retrieved { count: usize },
    DocumentsGraded { retained: usize },
    Rewritten,
    Generated,
    Groundedness(Verdict),
    AnswerRelevance(Verdict),
}

impl NodeOutcome {
    /// Short human-readable note for traces
    pub fn note(&self) -> String {
        match self {
            NodeOutcome::Started => "run started".to_string(),
            NodeOutcome::Retrieved { count } => format!("{} documents retrieved", count),
            NodeOutcome::DocumentsGraded { retained } => {
                format!("{} documents retained", retained)
            }
            NodeOutcome::Rewritten => "question rewritten".to_string(),
            NodeOutcome::Generated => "answer generated".to_string(),
            NodeOutcome::Groundedness(verdict) => format!("groundedness {}", verdict),
            NodeOutcome::AnswerRelevance(verdict) => format!("answer relevance {}", verdict),
        }
    }
}

/// Decide the next node after `outcome`.
///
/// Loop bounds are checked here, before another loop iteration is
/// committed to. `state` must already reflect the node that produced
/// `outcome` (counters incremented, documents replaced).
pub fn next_node(outcome: &NodeOutcome, state: &RunState, config: &RagConfig) -> RagNode {
    let retrieval_exhausted = state.retrieval_attempts() >= config.retrieval_attempt_bound;
    let generation_exhausted = state.generation_attempts() >= config.generation_attempt_bound;

    match outcome {
        NodeOutcome::Started => RagNode::Retrieve,
        NodeOutcome::Retrieved { .. } => RagNode::GradeDocuments,
        NodeOutcome::DocumentsGraded { retained } if *retained > 0 => RagNode::Generate,
        NodeOutcome::DocumentsGraded { .. } => RagNode::Rewrite,
        // Out of retrieval attempts: answer from whatever evidence is retained
        NodeOutcome::Rewritten if retrieval_exhausted => RagNode::Generate,
        NodeOutcome::Rewritten => RagNode::Retrieve,
        NodeOutcome::Generated => RagNode::GradeGroundedness,
        NodeOutcome::Groundedness(Verdict::Relevant) => RagNode::GradeAnswerRelevance,
        NodeOutcome::Groundedness(Verdict::Irrelevant) if generation_exhausted => {
            RagNode::Done(Completion::Ungrounded)
        }
        NodeOutcome::Groundedness(Verdict::Irrelevant) => RagNode::Generate,
        NodeOutcome::AnswerRelevance(Verdict::Relevant) => RagNode::Done(Completion::Verified),
        // A rewrite leads to another generation, which needs budget left
        NodeOutcome::AnswerRelevance(Verdict::Irrelevant)
            if retrieval_exhausted || generation_exhausted =>
        {
            RagNode::Done(Completion::OffTopic)
        }
        NodeOutcome::AnswerRelevance(Verdict::Irrelevant) => RagNode::Rewrite,
    }
}
