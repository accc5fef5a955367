//! In-memory document source for local runs and testing

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use crate::domain::rag::{Document, DocumentSource};
use crate::domain::DomainError;

/// Ranks stored documents by how many distinct query words they contain
#[derive(Debug, Clone)]
pub struct InMemoryDocumentSource {
    documents: Arc<RwLock<Vec<Document>>>,
    top_k: usize,
}

impl InMemoryDocumentSource {
    pub fn new(top_k: usize) -> Self {
        Self {
            documents: Arc::new(RwLock::new(Vec::new())),
            top_k,
        }
    }

    pub fn with_documents(documents: Vec<Document>, top_k: usize) -> Self {
        Self {
            documents: Arc::new(RwLock::new(documents)),
            top_k,
        }
    }

    /// Load a corpus stored as a JSON array of documents
    pub async fn from_json_file(path: impl AsRef<Path>, top_k: usize) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            DomainError::configuration(format!(
                "Failed to read corpus '{}': {}",
                path.display(),
                e
            ))
        })?;

        let documents: Vec<Document> = serde_json::from_str(&raw).map_err(|e| {
            DomainError::configuration(format!(
                "Invalid corpus '{}': {}",
                path.display(),
                e
            ))
        })?;

        debug!("Loaded {} documents from '{}'", documents.len(), path.display());
        Ok(Self::with_documents(documents, top_k))
    }

    pub async fn add_documents(&self, documents: Vec<Document>) {
        self.documents.write().await.extend(documents);
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

/// Words too common to say anything about relevance
const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "could", "should", "can", "i", "you", "it", "we",
    "they", "what", "which", "who", "when", "where", "why", "how", "my", "your", "its", "our",
    "their", "this", "that", "these", "those", "to", "of", "in", "for", "on", "with", "at", "by",
    "from", "as", "into", "about", "and", "or", "but", "not",
];

fn terms(text: &str) -> HashSet<String> {
    text.unicode_words()
        .map(|w| w.to_lowercase())
        .filter(|w| w.chars().count() > 1 && !STOP_WORDS.contains(&w.as_str()))
        .collect()
}

#[async_trait]
impl DocumentSource for InMemoryDocumentSource {
    async fn retrieve(&self, query: &str) -> Result<Vec<Document>, DomainError> {
        let query_terms = terms(query);
        if query_terms.is_empty() {
            return Ok(Vec::new());
        }

        let documents = self.documents.read().await;

        let mut ranked: Vec<(usize, &Document)> = documents
            .iter()
            .map(|doc| {
                let doc_terms = terms(&doc.content);
                (query_terms.intersection(&doc_terms).count(), doc)
            })
            .filter(|(score, _)| *score > 0)
            .collect();

        // Stable sort keeps corpus order between equal scores
        ranked.sort_by(|a, b| b.0.cmp(&a.0));

        let results: Vec<Document> = ranked
            .into_iter()
            .take(self.top_k)
            .map(|(_, doc)| doc.clone())
            .collect();

        debug!("Retrieved {} documents for '{}'", results.len(), query);
        Ok(results)
    }
}
