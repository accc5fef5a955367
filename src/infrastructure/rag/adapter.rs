//! Collaborator adapters
//!
//! Translates run state into collaborator calls and applies the call policy:
//! every call is bounded by the per-call timeout and raced against
//! cancellation, and a failed or malformed reply is retried once with the
//! same inputs before it is escalated.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::rag::{Collaborator, Collaborators, Document, RagError, Verdict};
use crate::domain::DomainError;

/// Calls per collaborator invocation: the first try plus one retry
const MAX_ATTEMPTS: u32 = 2;

/// Typed, policy-enforcing access to the collaborators of one run
#[derive(Debug, Clone)]
pub struct CollaboratorAdapter<'a> {
    collaborators: &'a Collaborators,
    timeout: Duration,
    cancel: CancellationToken,
}

impl<'a> CollaboratorAdapter<'a> {
    pub fn new(collaborators: &'a Collaborators, timeout: Duration, cancel: CancellationToken) -> Self {
        Self {
            collaborators,
            timeout,
            cancel,
        }
    }

    pub async fn retrieve(&self, query: &str) -> Result<Vec<Document>, RagError> {
        let source = &self.collaborators.document_source;
        self.call(Collaborator::DocumentSource, || source.retrieve(query))
            .await
    }

    pub async fn grade_document(
        &self,
        question: &str,
        document: &Document,
    ) -> Result<Verdict, RagError> {
        let grader = &self.collaborators.relevance_grader;
        self.call(Collaborator::RelevanceGrader, || {
            grader.grade(question, document)
        })
        .await
    }

    pub async fn generate(&self, question: &str, documents: &[Document]) -> Result<String, RagError> {
        let generator = &self.collaborators.answer_generator;
        self.call(Collaborator::AnswerGenerator, || async move {
            let answer = generator.generate(question, documents).await?;
            require_text(Collaborator::AnswerGenerator, answer)
        })
        .await
    }

    pub async fn grade_groundedness(
        &self,
        generation: &str,
        documents: &[Document],
    ) -> Result<Verdict, RagError> {
        let grader = &self.collaborators.groundedness_grader;
        self.call(Collaborator::GroundednessGrader, || {
            grader.grade(generation, documents)
        })
        .await
    }

    pub async fn grade_answer_relevance(
        &self,
        question: &str,
        generation: &str,
    ) -> Result<Verdict, RagError> {
        let grader = &self.collaborators.answer_relevance_grader;
        self.call(Collaborator::AnswerRelevanceGrader, || {
            grader.grade(question, generation)
        })
        .await
    }

    pub async fn rewrite(&self, question: &str) -> Result<String, RagError> {
        let rewriter = &self.collaborators.query_rewriter;
        let rewritten = self
            .call(Collaborator::QueryRewriter, || async move {
                let rewritten = rewriter.rewrite(question).await?;
                require_text(Collaborator::QueryRewriter, rewritten)
            })
            .await?;

        if rewritten == question {
            warn!("Query rewriter returned the question unchanged: '{}'", question);
        }

        Ok(rewritten)
    }

    /// Run one collaborator call under the timeout, cancellation and retry policy
    async fn call<T, F, Fut>(&self, collaborator: Collaborator, mut op: F) -> Result<T, RagError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DomainError>>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(RagError::Cancelled),
                outcome = tokio::time::timeout(self.timeout, op()) => outcome,
            };

            match outcome {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) if attempt < MAX_ATTEMPTS => {
                    warn!(
                        "{} call failed (attempt {}/{}), retrying: {}",
                        collaborator, attempt, MAX_ATTEMPTS, e
                    );
                }
                Ok(Err(e)) => return Err(escalate(collaborator, e)),
                Err(_) => {
                    let timeout_ms = self.timeout.as_millis() as u64;
                    debug!("{} timed out after {}ms", collaborator, timeout_ms);
                    return Err(RagError::timeout(collaborator, timeout_ms));
                }
            }
        }
    }
}

fn require_text(collaborator: Collaborator, text: String) -> Result<String, DomainError> {
    if text.trim().is_empty() {
        return Err(DomainError::malformed_output(
            collaborator.as_str(),
            "empty output",
        ));
    }

    Ok(text)
}

fn escalate(collaborator: Collaborator, error: DomainError) -> RagError {
    match error {
        DomainError::MalformedOutput { message, .. } => {
            RagError::malformed_output(collaborator, message)
        }
        other => RagError::collaborator_failed(collaborator, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::rag::mock::{
        PredicateRelevanceGrader, RecordingQueryRewriter, Scripted, ScriptedAnswerGenerator,
        ScriptedAnswerRelevanceGrader, ScriptedDocumentSource, ScriptedGroundednessGrader,
    };
    use crate::domain::rag::{MockQueryRewriter, MockRelevanceGrader};

    fn collaborators_with_generator(generator: Arc<ScriptedAnswerGenerator>) -> Collaborators {
        Collaborators {
            document_source: Arc::new(ScriptedDocumentSource::always(vec![])),
            relevance_grader: Arc::new(PredicateRelevanceGrader::always(Verdict::Relevant)),
            answer_generator: generator,
            groundedness_grader: Arc::new(ScriptedGroundednessGrader::verdicts(&[
                Verdict::Relevant,
            ])),
            answer_relevance_grader: Arc::new(ScriptedAnswerRelevanceGrader::verdicts(&[
                Verdict::Relevant,
            ])),
            query_rewriter: Arc::new(RecordingQueryRewriter::new()),
        }
    }

    fn adapter(collaborators: &Collaborators) -> CollaboratorAdapter<'_> {
        CollaboratorAdapter::new(
            collaborators,
            Duration::from_secs(1),
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn test_empty_generation_retried_once() {
        let generator = Arc::new(ScriptedAnswerGenerator::new(vec![
            Scripted::Reply("   ".to_string()),
            Scripted::Reply("Agent memory stores...".to_string()),
        ]));
        let collaborators = collaborators_with_generator(generator.clone());

        let answer = adapter(&collaborators).generate("q", &[]).await.unwrap();

        assert_eq!(answer, "Agent memory stores...");
        assert_eq!(generator.call_count(), 2);
    }

    #[tokio::test]
    async fn test_malformed_output_escalates_after_retry() {
        let generator = Arc::new(ScriptedAnswerGenerator::always(""));
        let collaborators = collaborators_with_generator(generator.clone());

        let err = adapter(&collaborators).generate("q", &[]).await.unwrap_err();

        assert!(matches!(
            err,
            RagError::CollaboratorMalformedOutput {
                collaborator: Collaborator::AnswerGenerator,
                ..
            }
        ));
        assert_eq!(generator.call_count(), 2);
    }

    #[tokio::test]
    async fn test_grader_malformed_output_retried_with_same_inputs() {
        let mut grader = MockRelevanceGrader::new();
        let mut seq = mockall::Sequence::new();
        grader
            .expect_grade()
            .withf(|question, document| question == "q" && document.content == "doc")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(DomainError::malformed_output("grader", "maybe")));
        grader
            .expect_grade()
            .withf(|question, document| question == "q" && document.content == "doc")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(Verdict::Irrelevant));

        let mut collaborators =
            collaborators_with_generator(Arc::new(ScriptedAnswerGenerator::always("a")));
        collaborators.relevance_grader = Arc::new(grader);

        let verdict = adapter(&collaborators)
            .grade_document("q", &Document::new("doc"))
            .await;

        tokio_test::assert_ok!(&verdict);
        assert_eq!(verdict.unwrap(), Verdict::Irrelevant);
    }

    #[tokio::test]
    async fn test_provider_failure_escalates_as_collaborator_failed() {
        let generator = Arc::new(ScriptedAnswerGenerator::new(vec![Scripted::Fail(
            DomainError::provider("openai", "HTTP 503"),
        )]));
        let collaborators = collaborators_with_generator(generator.clone());

        let err = adapter(&collaborators).generate("q", &[]).await.unwrap_err();

        assert_eq!(
            err,
            RagError::collaborator_failed(
                Collaborator::AnswerGenerator,
                "Provider error: openai - HTTP 503"
            )
        );
        assert_eq!(generator.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_not_retried() {
        let generator = Arc::new(ScriptedAnswerGenerator::new(vec![Scripted::Hang]));
        let collaborators = collaborators_with_generator(generator.clone());

        let err = adapter(&collaborators).generate("q", &[]).await.unwrap_err();

        assert_eq!(err, RagError::timeout(Collaborator::AnswerGenerator, 1000));
        assert_eq!(generator.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_in_flight_call() {
        let generator = Arc::new(ScriptedAnswerGenerator::new(vec![Scripted::Hang]));
        let collaborators = collaborators_with_generator(generator);
        let cancel = CancellationToken::new();
        let adapter = CollaboratorAdapter::new(
            &collaborators,
            Duration::from_secs(3600 * 2),
            cancel.clone(),
        );

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            trigger.cancel();
        });

        let err = adapter.generate("q", &[]).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_rewrite_rejects_empty_output() {
        let mut rewriter = MockQueryRewriter::new();
        rewriter
            .expect_rewrite()
            .times(2)
            .returning(|_| Ok(String::new()));

        let mut collaborators =
            collaborators_with_generator(Arc::new(ScriptedAnswerGenerator::always("a")));
        collaborators.query_rewriter = Arc::new(rewriter);

        let err = adapter(&collaborators).rewrite("q").await.unwrap_err();
        assert_eq!(
            err,
            RagError::malformed_output(Collaborator::QueryRewriter, "empty output")
        );
    }

    #[tokio::test]
    async fn test_rewrite_accepts_unchanged_question() {
        let mut rewriter = MockQueryRewriter::new();
        rewriter
            .expect_rewrite()
            .times(1)
            .returning(|q| Ok(q.to_string()));

        let mut collaborators =
            collaborators_with_generator(Arc::new(ScriptedAnswerGenerator::always("a")));
        collaborators.query_rewriter = Arc::new(rewriter);

        let rewritten = adapter(&collaborators).rewrite("same").await.unwrap();
        assert_eq!(rewritten, "same");
    }
}
