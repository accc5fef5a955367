//! LLM-backed collaborators
//!
//! One implementation per collaborator trait, all driven by a shared
//! [`LlmChat`]. Graders ask the model for `{"binary_score": "yes" | "no"}`
//! and reject anything else as malformed output.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::llm::{LlmProvider, LlmRequest};
use crate::domain::rag::{
    AnswerGenerator, AnswerRelevanceGrader, Collaborator, Collaborators, Document,
    DocumentSource, GroundednessGrader, QueryRewriter, RelevanceGrader, Verdict,
};
use crate::domain::DomainError;

const RELEVANCE_SYSTEM_PROMPT: &str = "You are a grader assessing the relevance of a retrieved \
document to a user question. If the document contains keywords or meaning related to the \
question, grade it as relevant. The test does not need to be stringent; the goal is to filter \
out erroneous retrievals. Respond with a JSON object {\"binary_score\": \"yes\"} or \
{\"binary_score\": \"no\"}.";

const RELEVANCE_USER_PROMPT: &str =
    "Retrieved document:\n\n${document}\n\nUser question: ${question}";

const GROUNDEDNESS_SYSTEM_PROMPT: &str = "You are a grader assessing whether an LLM generation \
is grounded in and supported by a set of retrieved facts. Answer \"yes\" when the generation is \
supported by the facts and \"no\" otherwise. Respond with a JSON object \
{\"binary_score\": \"yes\"} or {\"binary_score\": \"no\"}.";

const GROUNDEDNESS_USER_PROMPT: &str = "Set of facts:\n\n${documents}\n\nLLM generation: ${generation}";

const ANSWER_RELEVANCE_SYSTEM_PROMPT: &str = "You are a grader assessing whether an answer \
addresses and resolves a question. Answer \"yes\" when it does and \"no\" otherwise. Respond \
with a JSON object {\"binary_score\": \"yes\"} or {\"binary_score\": \"no\"}.";

const ANSWER_RELEVANCE_USER_PROMPT: &str = "User question:\n\n${question}\n\nLLM generation: ${generation}";

const GENERATION_SYSTEM_PROMPT: &str = "You are an assistant for question-answering tasks. Use \
the retrieved context to answer the question. If you don't know the answer, just say that you \
don't know. Use three sentences maximum and keep the answer concise.";

const GENERATION_USER_PROMPT: &str = "Question: ${question}\n\nContext: ${context}\n\nAnswer:";

const REWRITE_SYSTEM_PROMPT: &str = "You are a question re-writer that converts an input \
question to a better version optimized for vectorstore retrieval. Look at the input and reason \
about the underlying semantic intent. Reply with the improved question only.";

const REWRITE_USER_PROMPT: &str =
    "Here is the initial question:\n\n${question}\n\nFormulate an improved question.";

/// Chat access shared by the LLM-backed collaborators
#[derive(Debug, Clone)]
pub struct LlmChat {
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: f32,
}

impl LlmChat {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    async fn complete(
        &self,
        system: &str,
        user: String,
        json_output: bool,
    ) -> Result<String, DomainError> {
        let mut builder = LlmRequest::builder()
            .system(system)
            .user(user)
            .temperature(self.temperature);

        if json_output {
            builder = builder.json_output();
        }

        let response = self.provider.chat(&self.model, builder.build()).await?;
        Ok(response.content().trim().to_string())
    }

    async fn binary_verdict(
        &self,
        collaborator: Collaborator,
        system: &str,
        user: String,
    ) -> Result<Verdict, DomainError> {
        let content = self.complete(system, user, true).await?;
        let verdict = parse_binary_score(collaborator, &content)?;

        debug!("{} verdict: {}", collaborator, verdict);
        Ok(verdict)
    }
}

#[derive(Debug, Deserialize)]
struct BinaryScore {
    binary_score: String,
}

/// Map a grader reply to a verdict, accepting a JSON object or a bare yes/no
fn parse_binary_score(collaborator: Collaborator, response: &str) -> Result<Verdict, DomainError> {
    let score = match extract_json(response) {
        Some(json) => serde_json::from_str::<BinaryScore>(json)
            .map(|parsed| parsed.binary_score)
            .map_err(|e| {
                warn!("Unparseable {} reply '{}': {}", collaborator, response, e);
                DomainError::malformed_output(collaborator.as_str(), e.to_string())
            })?,
        None => response.to_string(),
    };

    Verdict::from_binary_score(&score).ok_or_else(|| {
        DomainError::malformed_output(
            collaborator.as_str(),
            format!("expected binary_score 'yes' or 'no', got '{}'", score),
        )
    })
}

/// Extract a JSON object from a string (handles markdown code blocks)
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

fn format_documents(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|d| d.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Grades a single document against the question
#[derive(Debug, Clone)]
pub struct LlmRelevanceGrader {
    chat: LlmChat,
}

impl LlmRelevanceGrader {
    pub fn new(chat: LlmChat) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl RelevanceGrader for LlmRelevanceGrader {
    async fn grade(&self, question: &str, document: &Document) -> Result<Verdict, DomainError> {
        let prompt = RELEVANCE_USER_PROMPT
            .replace("${document}", &document.content)
            .replace("${question}", question);

        self.chat
            .binary_verdict(Collaborator::RelevanceGrader, RELEVANCE_SYSTEM_PROMPT, prompt)
            .await
    }
}

/// Hallucination check of a generation against the evidence
#[derive(Debug, Clone)]
pub struct LlmGroundednessGrader {
    chat: LlmChat,
}

impl LlmGroundednessGrader {
    pub fn new(chat: LlmChat) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl GroundednessGrader for LlmGroundednessGrader {
    async fn grade(&self, generation: &str, documents: &[Document]) -> Result<Verdict, DomainError> {
        let prompt = GROUNDEDNESS_USER_PROMPT
            .replace("${documents}", &format_documents(documents))
            .replace("${generation}", generation);

        self.chat
            .binary_verdict(
                Collaborator::GroundednessGrader,
                GROUNDEDNESS_SYSTEM_PROMPT,
                prompt,
            )
            .await
    }
}

#[derive(Debug, Clone)]
pub struct LlmAnswerRelevanceGrader {
    chat: LlmChat,
}

impl LlmAnswerRelevanceGrader {
    pub fn new(chat: LlmChat) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl AnswerRelevanceGrader for LlmAnswerRelevanceGrader {
    async fn grade(&self, question: &str, generation: &str) -> Result<Verdict, DomainError> {
        let prompt = ANSWER_RELEVANCE_USER_PROMPT
            .replace("${question}", question)
            .replace("${generation}", generation);

        self.chat
            .binary_verdict(
                Collaborator::AnswerRelevanceGrader,
                ANSWER_RELEVANCE_SYSTEM_PROMPT,
                prompt,
            )
            .await
    }
}

#[derive(Debug, Clone)]
pub struct LlmAnswerGenerator {
    chat: LlmChat,
}

impl LlmAnswerGenerator {
    pub fn new(chat: LlmChat) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl AnswerGenerator for LlmAnswerGenerator {
    async fn generate(&self, question: &str, documents: &[Document]) -> Result<String, DomainError> {
        let prompt = GENERATION_USER_PROMPT
            .replace("${question}", question)
            .replace("${context}", &format_documents(documents));

        self.chat
            .complete(GENERATION_SYSTEM_PROMPT, prompt, false)
            .await
    }
}

#[derive(Debug, Clone)]
pub struct LlmQueryRewriter {
    chat: LlmChat,
}

impl LlmQueryRewriter {
    pub fn new(chat: LlmChat) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl QueryRewriter for LlmQueryRewriter {
    async fn rewrite(&self, question: &str) -> Result<String, DomainError> {
        let prompt = REWRITE_USER_PROMPT.replace("${question}", question);
        let rewritten = self.chat.complete(REWRITE_SYSTEM_PROMPT, prompt, false).await?;

        Ok(rewritten.trim_matches('"').trim().to_string())
    }
}

/// Wire the LLM-backed collaborators around a document source
pub fn llm_collaborators(chat: LlmChat, document_source: Arc<dyn DocumentSource>) -> Collaborators {
    Collaborators {
        document_source,
        relevance_grader: Arc::new(LlmRelevanceGrader::new(chat.clone())),
        answer_generator: Arc::new(LlmAnswerGenerator::new(chat.clone())),
        groundedness_grader: Arc::new(LlmGroundednessGrader::new(chat.clone())),
        answer_relevance_grader: Arc::new(LlmAnswerRelevanceGrader::new(chat.clone())),
        query_rewriter: Arc::new(LlmQueryRewriter::new(chat)),
    }
}
