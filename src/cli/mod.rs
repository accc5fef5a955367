//! CLI module for PMP Self-RAG
//!
//! Subcommands:
//! - `ask`: answer one question through the self-correcting RAG loop

pub mod ask;

use clap::{Parser, Subcommand};

/// PMP Self-RAG - retrieval-augmented answers checked for grounding and relevance
#[derive(Parser)]
#[command(name = "pmp-self-rag")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Answer a question
    Ask(ask::AskArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask_question() {
        let cli = Cli::try_parse_from(["pmp-self-rag", "ask", "--question", "What is CoT?"]).unwrap();

        let Command::Ask(args) = cli.command;
        assert_eq!(args.question(), "What is CoT?");
        assert!(!args.json);
    }

    #[test]
    fn test_parse_ask_demo_json() {
        let cli = Cli::try_parse_from(["pmp-self-rag", "ask", "--demo", "--json"]).unwrap();

        let Command::Ask(args) = cli.command;
        assert_eq!(args.question(), ask::DEMO_QUESTION);
        assert!(args.json);
    }

    #[test]
    fn test_demo_and_question_are_exclusive() {
        assert!(Cli::try_parse_from(["pmp-self-rag", "ask", "--demo", "--question", "q"]).is_err());
        assert!(Cli::try_parse_from(["pmp-self-rag", "ask"]).is_err());
    }
}
