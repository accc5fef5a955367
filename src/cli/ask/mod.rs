//! Ask command - answers one question and prints the result

use anyhow::Context;
use clap::{ArgGroup, Args};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::domain::rag::{AnswerResult, RagOrchestrator};
use crate::infrastructure::logging;

/// Question used by `--demo`
pub const DEMO_QUESTION: &str = "What is agent memory?";

/// Arguments for the ask command
#[derive(Args, Clone, Debug)]
#[command(group(ArgGroup::new("input").required(true).args(["demo", "question"])))]
pub struct AskArgs {
    /// Run the built-in demo question
    #[arg(long)]
    pub demo: bool,

    /// Question to answer
    #[arg(long, short)]
    pub question: Option<String>,

    /// Print the full result as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskArgs {
    pub fn question(&self) -> String {
        self.question
            .clone()
            .unwrap_or_else(|| DEMO_QUESTION.to_string())
    }
}

/// Answer the question, cancelling the run on Ctrl-C
pub async fn run(args: AskArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    logging::init_logging(&config.logging);

    let orchestrator = crate::create_orchestrator(&config).await?;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling run");
            trigger.cancel();
        }
    });

    let question = args.question();
    info!("Asking: {}", question);

    let result = orchestrator.run_with_cancellation(&question, cancel).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render(&result));
    }

    Ok(())
}

fn render(result: &AnswerResult) -> String {
    let status = match (result.grounded, result.on_topic) {
        (true, true) => "verified",
        (false, _) => "best effort (not grounded in the evidence)",
        (true, false) => "best effort (does not address the question)",
    };

    format!(
        "{}\n\nStatus: {}\nRetrieval attempts: {}\nGeneration attempts: {}\nEvidence documents: {}\nRun: {} ({}ms)\n",
        result.answer,
        status,
        result.retrieval_attempts_used,
        result.generation_attempts_used,
        result.documents_used,
        result.run_id,
        result.execution_time_ms
    )
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::domain::rag::{Completion, Document, RunState};

    fn result(completion: Completion) -> AnswerResult {
        let mut state = RunState::new(DEMO_QUESTION);
        state.replace_documents(vec![Document::new("doc")]);
        state.record_generation("Agent memory stores...".to_string());
        AnswerResult::from_state(Uuid::new_v4(), state, completion, vec![], Utc::now(), 42)
    }

    #[test]
    fn test_render_verified() {
        let output = render(&result(Completion::Verified));

        assert!(output.starts_with("Agent memory stores..."));
        assert!(output.contains("Status: verified"));
        assert!(output.contains("Generation attempts: 1"));
        assert!(output.contains("(42ms)"));
    }

    #[test]
    fn test_render_best_effort() {
        assert!(render(&result(Completion::Ungrounded)).contains("not grounded"));
        assert!(render(&result(Completion::OffTopic)).contains("does not address"));
    }
}
