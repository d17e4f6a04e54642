//! LLM-driven candidate selection.
//!
//! The model only proposes ids. Whatever it returns is filtered to the
//! candidate set and capped before use, and any failure to get a usable
//! proposal falls back to a fixed mix of external and internal candidates.

use crate::llm::ResponseFormat;
use crate::prompts::{RERANK_INSTRUCTIONS, SYSTEM_GUARD};
use crate::traits::ChatModel;
use crate::{ChatMessage, LlmError, RetrievedRecord, SourceType};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

pub const DEFAULT_MAX_RERANKED: usize = 6;

const INTERNAL_PREVIEW_CHARS: usize = 500;
const EXTERNAL_PREVIEW_CHARS: usize = 300;
const FALLBACK_PER_SOURCE: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionStrategy {
    /// Nothing to rank; the model was not called.
    Skipped,
    Model,
    Fallback(String),
}

#[derive(Debug, Clone)]
pub struct Reranked {
    pub records: Vec<RetrievedRecord>,
    pub strategy: SelectionStrategy,
}

#[derive(Debug, Serialize)]
struct CatalogEntry<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: SourceType,
    source: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct Selection {
    chosen_ids: Vec<String>,
}

pub struct Reranker {
    model: Arc<dyn ChatModel>,
    max_reranked: usize,
}

impl Reranker {
    pub fn new(model: Arc<dyn ChatModel>, max_reranked: usize) -> Self {
        Self {
            model,
            max_reranked,
        }
    }

    pub async fn rerank(&self, question: &str, candidates: Vec<RetrievedRecord>) -> Reranked {
        if candidates.is_empty() {
            return Reranked {
                records: Vec::new(),
                strategy: SelectionStrategy::Skipped,
            };
        }

        let (chosen, strategy) = match self.select_with_model(question, &candidates).await {
            Ok(chosen) => {
                info!(chosen = ?chosen, "rerank selected");
                (chosen, SelectionStrategy::Model)
            }
            Err(error) => {
                warn!(error = %error, "rerank failed, using heuristic mix");
                (fallback_ids(&candidates), SelectionStrategy::Fallback(error.to_string()))
            }
        };

        let records = filter_selected(candidates, &chosen, self.max_reranked);
        let external = records.iter().filter(|record| record.is_external()).count();
        info!(
            internal = records.len() - external,
            external,
            "rerank final selection"
        );

        Reranked { records, strategy }
    }

    async fn select_with_model(
        &self,
        question: &str,
        candidates: &[RetrievedRecord],
    ) -> Result<HashSet<String>, LlmError> {
        let catalog = serde_json::to_string_pretty(&build_catalog(candidates))?;
        let messages = [
            ChatMessage::system(SYSTEM_GUARD),
            ChatMessage::user(format!(
                "Question: {question}\n{RERANK_INSTRUCTIONS}\n\n<CATALOG>\n{catalog}\n</CATALOG>"
            )),
        ];

        let content = self
            .model
            .complete(&messages, ResponseFormat::JsonObject)
            .await?
            .ok_or(LlmError::EmptyResponse)?;

        let selection: Selection = serde_json::from_str(&content)?;
        validate_selection(selection.chosen_ids, candidates)
    }
}

fn build_catalog(candidates: &[RetrievedRecord]) -> Vec<CatalogEntry<'_>> {
    candidates
        .iter()
        .map(|candidate| match candidate {
            RetrievedRecord::Internal(chunk) => CatalogEntry {
                id: &chunk.id,
                kind: SourceType::Internal,
                source: format!("{} p.{}", chunk.doc_name, chunk.page_num),
                text: take_chars(&chunk.text, INTERNAL_PREVIEW_CHARS),
            },
            RetrievedRecord::External(result) => CatalogEntry {
                id: &result.id,
                kind: SourceType::External,
                source: if result.url.is_empty() {
                    "web".to_string()
                } else {
                    result.url.clone()
                },
                text: format!(
                    "{}. {}",
                    result.title,
                    take_chars(&result.snippet, EXTERNAL_PREVIEW_CHARS)
                ),
            },
        })
        .collect()
}

/// Keeps only ids that name a candidate. A proposal made entirely of unknown
/// ids is rejected; an explicitly empty proposal is respected.
fn validate_selection(
    proposed: Vec<String>,
    candidates: &[RetrievedRecord],
) -> Result<HashSet<String>, LlmError> {
    let known: HashSet<&str> = candidates.iter().map(RetrievedRecord::id).collect();
    let (valid, unknown): (Vec<String>, Vec<String>) = proposed
        .into_iter()
        .partition(|id| known.contains(id.as_str()));

    if valid.is_empty() && !unknown.is_empty() {
        return Err(LlmError::InvalidSelection(unknown));
    }
    if !unknown.is_empty() {
        warn!(unknown = ?unknown, "rerank proposed ids outside the candidate set");
    }

    Ok(valid.into_iter().collect())
}

/// Up to three external and three internal candidates, in retrieval order.
pub fn fallback_ids(candidates: &[RetrievedRecord]) -> HashSet<String> {
    let external = candidates
        .iter()
        .filter(|candidate| candidate.is_external())
        .take(FALLBACK_PER_SOURCE);
    let internal = candidates
        .iter()
        .filter(|candidate| !candidate.is_external())
        .take(FALLBACK_PER_SOURCE);

    external
        .chain(internal)
        .map(|candidate| candidate.id().to_string())
        .collect()
}

/// Candidates whose id was chosen, in their original order, capped at `max`.
pub fn filter_selected(
    candidates: Vec<RetrievedRecord>,
    chosen: &HashSet<String>,
    max: usize,
) -> Vec<RetrievedRecord> {
    candidates
        .into_iter()
        .filter(|candidate| chosen.contains(candidate.id()))
        .take(max)
        .collect()
}

fn take_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
