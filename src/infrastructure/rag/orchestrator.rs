//! Self-correcting RAG orchestrator

use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use futures::future::try_join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use super::adapter::CollaboratorAdapter;
use crate::domain::rag::{
    next_node, AnswerResult, Collaborators, Document, NodeOutcome, RagConfig, RagError, RagNode,
    RagOrchestrator, RunState, StepRecord,
};

/// Drives one question at a time through the control graph.
///
/// Holds no per-run state, so a single instance can serve concurrent runs.
#[derive(Debug)]
pub struct SelfRagOrchestrator {
    /// Collaborators consulted by every run
    collaborators: Collaborators,

    /// Loop bounds, timeout and grading mode
    config: RagConfig,
}

impl SelfRagOrchestrator {
    /// Create an orchestrator with the default configuration
    pub fn new(collaborators: Collaborators) -> Self {
        Self::with_config(collaborators, RagConfig::default())
    }

    /// Create with custom configuration
    pub fn with_config(collaborators: Collaborators, config: RagConfig) -> Self {
        Self {
            collaborators,
            config,
        }
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    async fn drive(
        &self,
        run_id: Uuid,
        question: &str,
        cancel: CancellationToken,
    ) -> Result<AnswerResult, RagError> {
        let start = Instant::now();
        let started_at = Utc::now();
        let adapter = CollaboratorAdapter::new(
            &self.collaborators,
            self.config.per_call_timeout(),
            cancel.clone(),
        );

        let mut state = RunState::new(question);
        let mut steps = Vec::new();
        let mut node = RagNode::Start;

        let completion = loop {
            if cancel.is_cancelled() {
                info!("Run cancelled before '{}'", node);
                return Err(RagError::Cancelled);
            }

            let step_start = Instant::now();

            let outcome = match node {
                RagNode::Done(completion) => break completion,
                RagNode::Start => NodeOutcome::Started,
                RagNode::Retrieve => self.retrieve(&mut state, &adapter).await?,
                RagNode::GradeDocuments => self.grade_documents(&mut state, &adapter).await?,
                RagNode::Rewrite => self.rewrite(&mut state, &adapter).await?,
                RagNode::Generate => self.generate(&mut state, &adapter).await?,
                RagNode::GradeGroundedness => {
                    self.grade_groundedness(&state, &adapter).await?
                }
                RagNode::GradeAnswerRelevance => {
                    self.grade_answer_relevance(&state, &adapter).await?
                }
            };

            steps.push(StepRecord::new(
                node,
                outcome.note(),
                step_start.elapsed().as_millis() as u64,
            ));

            let next = next_node(&outcome, &state, &self.config);
            debug!("'{}' -> '{}' ({})", node, next, outcome.note());
            node = next;
        };

        info!(
            "Run finished as {:?} after {} retrieval and {} generation attempts",
            completion,
            state.retrieval_attempts(),
            state.generation_attempts()
        );

        Ok(AnswerResult::from_state(
            run_id,
            state,
            completion,
            steps,
            started_at,
            start.elapsed().as_millis() as u64,
        ))
    }

    async fn retrieve(
        &self,
        state: &mut RunState,
        adapter: &CollaboratorAdapter<'_>,
    ) -> Result<NodeOutcome, RagError> {
        let documents = adapter.retrieve(&state.question).await?;
        let count = documents.len();
        state.replace_documents(documents);

        Ok(NodeOutcome::Retrieved { count })
    }

    /// Grade every retrieved document and keep the relevant ones in their
    /// original order
    async fn grade_documents(
        &self,
        state: &mut RunState,
        adapter: &CollaboratorAdapter<'_>,
    ) -> Result<NodeOutcome, RagError> {
        let documents = std::mem::take(&mut state.documents);
        let question = state.question.as_str();

        let verdicts = if self.config.parallel_document_grading {
            try_join_all(
                documents
                    .iter()
                    .map(|document| adapter.grade_document(question, document)),
            )
            .await?
        } else {
            let mut verdicts = Vec::with_capacity(documents.len());
            for document in &documents {
                verdicts.push(adapter.grade_document(question, document).await?);
            }
            verdicts
        };

        let retained: Vec<Document> = documents
            .into_iter()
            .zip(verdicts)
            .filter(|(_, verdict)| verdict.is_relevant())
            .map(|(document, _)| document)
            .collect();

        let count = retained.len();
        state.replace_documents(retained);

        Ok(NodeOutcome::DocumentsGraded { retained: count })
    }

    /// Rewrites always start from the original question
    async fn rewrite(
        &self,
        state: &mut RunState,
        adapter: &CollaboratorAdapter<'_>,
    ) -> Result<NodeOutcome, RagError> {
        let rewritten = adapter.rewrite(state.original_question()).await?;
        debug!("Question rewritten to '{}'", rewritten);
        state.record_rewrite(rewritten);

        Ok(NodeOutcome::Rewritten)
    }

    async fn generate(
        &self,
        state: &mut RunState,
        adapter: &CollaboratorAdapter<'_>,
    ) -> Result<NodeOutcome, RagError> {
        let generation = adapter.generate(&state.question, &state.documents).await?;
        state.record_generation(generation);

        Ok(NodeOutcome::Generated)
    }

    async fn grade_groundedness(
        &self,
        state: &RunState,
        adapter: &CollaboratorAdapter<'_>,
    ) -> Result<NodeOutcome, RagError> {
        // Generate always runs before either answer grader
        let generation = state.generation.as_deref().unwrap_or_default();
        let verdict = adapter
            .grade_groundedness(generation, &state.documents)
            .await?;

        Ok(NodeOutcome::Groundedness(verdict))
    }

    async fn grade_answer_relevance(
        &self,
        state: &RunState,
        adapter: &CollaboratorAdapter<'_>,
    ) -> Result<NodeOutcome, RagError> {
        let generation = state.generation.as_deref().unwrap_or_default();
        let verdict = adapter
            .grade_answer_relevance(state.original_question(), generation)
            .await?;

        Ok(NodeOutcome::AnswerRelevance(verdict))
    }
}

#[async_trait]
impl RagOrchestrator for SelfRagOrchestrator {
    async fn run_with_cancellation(
        &self,
        question: &str,
        cancel: CancellationToken,
    ) -> Result<AnswerResult, RagError> {
        self.config.validate()?;

        let run_id = Uuid::new_v4();
        let span = info_span!("rag_run", run_id = %run_id);

        async {
            info!("Answering '{}'", question);
            self.drive(run_id, question, cancel).await
        }
        .instrument(span)
        .await
    }
}
