//! Grounded answer generation with per-source citations.

use crate::llm::ResponseFormat;
use crate::prompts::{ANSWER_INSTRUCTIONS, GREETING_RESPONSE, NOT_FOUND_RESPONSE, NO_CONTEXT, SYSTEM_GUARD};
use crate::traits::ChatModel;
use crate::{AnswerPayload, ChatMessage, Citation, LlmError, RetrievedRecord};
use std::sync::Arc;
use tracing::info;

const GREETINGS: [&str; 7] = ["hi", "hello", "hey", "thanks", "thank you", "bye", "goodbye"];
const GREETING_MAX_WORDS: usize = 5;
const PREVIEW_CHARS: usize = 150;

/// Small talk that should not reach retrieval at all.
pub fn is_greeting(question: &str) -> bool {
    let normalized = question.trim().to_lowercase();
    if GREETINGS.contains(&normalized.as_str()) {
        return true;
    }
    normalized.split_whitespace().count() <= GREETING_MAX_WORDS
        && GREETINGS.iter().any(|greeting| normalized.starts_with(greeting))
}

pub fn greeting_payload() -> AnswerPayload {
    AnswerPayload {
        answer: GREETING_RESPONSE.to_string(),
        citations: Vec::new(),
        used_chunks: 0,
    }
}

pub fn not_found_payload() -> AnswerPayload {
    AnswerPayload {
        answer: NOT_FOUND_RESPONSE.to_string(),
        citations: Vec::new(),
        used_chunks: 0,
    }
}

/// Renders internal and external records as separate labelled sections.
pub fn context_block(selected: &[RetrievedRecord]) -> String {
    if selected.is_empty() {
        return NO_CONTEXT.to_string();
    }

    let mut blocks = Vec::new();

    let internal: Vec<_> = selected
        .iter()
        .filter_map(|record| match record {
            RetrievedRecord::Internal(chunk) => Some(chunk),
            RetrievedRecord::External(_) => None,
        })
        .collect();
    if !internal.is_empty() {
        blocks.push("=== INTERNAL DOCUMENTS ===".to_string());
        for (position, chunk) in internal.iter().enumerate() {
            blocks.push(format!(
                "[INTERNAL-{}] {} - Page {}\n{}\n",
                position + 1,
                chunk.doc_name,
                chunk.page_num,
                chunk.text
            ));
        }
    }

    let external: Vec<_> = selected
        .iter()
        .filter_map(|record| match record {
            RetrievedRecord::External(result) => Some(result),
            RetrievedRecord::Internal(_) => None,
        })
        .collect();
    if !external.is_empty() {
        blocks.push("\n=== EXTERNAL WEB SOURCES ===".to_string());
        for (position, result) in external.iter().enumerate() {
            blocks.push(format!(
                "[EXTERNAL-{}] {}\nURL: {}\n{}\n",
                position + 1,
                result.title,
                result.url,
                result.snippet
            ));
        }
    }

    blocks.join("\n\n")
}

pub fn build_messages(
    question: &str,
    selected: &[RetrievedRecord],
    history: &[ChatMessage],
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(SYSTEM_GUARD));
    messages.extend(history.iter().cloned());
    messages.push(ChatMessage::user(format!(
        "{ANSWER_INSTRUCTIONS}\n\n<CONTEXT>\n{}\n</CONTEXT>\n\n<QUESTION>\n{question}\n</QUESTION>",
        context_block(selected)
    )));
    messages
}

/// The preview always ends in `...`, truncated or not.
fn preview(text: &str) -> String {
    let mut preview: String = text.chars().take(PREVIEW_CHARS).collect();
    preview.push_str("...");
    preview
}

pub fn citations(selected: &[RetrievedRecord]) -> Vec<Citation> {
    selected
        .iter()
        .map(|record| match record {
            RetrievedRecord::Internal(chunk) => Citation::Internal {
                id: chunk.id.clone(),
                doc_name: chunk.doc_name.clone(),
                page_num: chunk.page_num,
                preview: preview(&chunk.text),
            },
            RetrievedRecord::External(result) => {
                let source = if result.snippet.is_empty() {
                    &result.text
                } else {
                    &result.snippet
                };
                Citation::External {
                    id: result.id.clone(),
                    title: result.title.clone(),
                    url: result.url.clone(),
                    preview: preview(source),
                }
            }
        })
        .collect()
}

pub struct AnswerComposer {
    model: Arc<dyn ChatModel>,
}

impl AnswerComposer {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    pub async fn answer(
        &self,
        question: &str,
        selected: &[RetrievedRecord],
        history: &[ChatMessage],
    ) -> Result<AnswerPayload, LlmError> {
        if is_greeting(question) {
            return Ok(greeting_payload());
        }
        if selected.is_empty() {
            return Ok(not_found_payload());
        }

        let external = selected.iter().filter(|record| record.is_external()).count();
        info!(
            internal = selected.len() - external,
            external,
            "answering with selected context"
        );

        let messages = build_messages(question, selected, history);
        let answer = self
            .model
            .complete(&messages, ResponseFormat::Text)
            .await?
            .unwrap_or_default();

        Ok(AnswerPayload {
            answer,
            citations: citations(selected),
            used_chunks: selected.len(),
        })
    }
}
