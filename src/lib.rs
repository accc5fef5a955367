//! PMP Self-RAG
//!
//! Self-correcting retrieval-augmented generation:
//! - Retrieval with per-document relevance grading
//! - Answer generation checked for groundedness and relevance
//! - Bounded corrective loops (query rewriting, regeneration)
//! - Per-call timeouts, retry of malformed collaborator output, cancellation

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;

use domain::llm::LlmProvider;
use infrastructure::llm::{HttpClient, OpenAiProvider};
use infrastructure::rag::{llm_collaborators, InMemoryDocumentSource, LlmChat, SelfRagOrchestrator};

/// Wire the orchestrator with the LLM-backed collaborators and the corpus
/// configured in `config`
pub async fn create_orchestrator(config: &AppConfig) -> anyhow::Result<SelfRagOrchestrator> {
    config.validate()?;
    config.rag.validate()?;

    let provider = create_llm_provider(config)?;
    let chat = LlmChat::new(provider, config.llm.model.clone())
        .with_temperature(config.llm.temperature);

    let source = InMemoryDocumentSource::from_json_file(
        &config.retrieval.corpus_path,
        config.retrieval.top_k,
    )
    .await?;
    info!(
        "Loaded {} documents from '{}'",
        source.len().await,
        config.retrieval.corpus_path
    );

    let collaborators = llm_collaborators(chat, Arc::new(source));

    Ok(SelfRagOrchestrator::with_config(
        collaborators,
        config.rag.clone(),
    ))
}

fn create_llm_provider(config: &AppConfig) -> anyhow::Result<Arc<dyn LlmProvider>> {
    let api_key = config
        .llm
        .resolve_api_key()
        .context("No API key configured: set APP__LLM__API_KEY or OPENAI_API_KEY")?;

    // Slightly above the per-call timeout so the run reports the timeout itself
    let http_timeout = config.rag.per_call_timeout() + Duration::from_secs(1);
    let client = HttpClient::with_timeout(http_timeout)?;

    info!(
        "Using OpenAI-compatible provider at {} (model: {})",
        config.llm.base_url, config.llm.model
    );

    Ok(Arc::new(OpenAiProvider::with_base_url(
        client,
        api_key,
        config.llm.base_url.clone(),
    )))
}
