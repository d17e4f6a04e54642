use serde::{Deserialize, Serialize};

/// A window of page text produced at ingestion time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub doc_name: String,
    pub page_num: u32,
    pub text: String,
    pub section_path: String,
}

/// A web-search hit. Lives for one request and is never indexed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalResult {
    pub id: String,
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    Internal,
    External,
}

/// Candidate passed between retrieval, reranking and answer composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source_type", rename_all = "lowercase")]
pub enum RetrievedRecord {
    Internal(Chunk),
    External(ExternalResult),
}

impl RetrievedRecord {
    pub fn id(&self) -> &str {
        match self {
            Self::Internal(chunk) => &chunk.id,
            Self::External(result) => &result.id,
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, Self::External(_))
    }
}

impl From<Chunk> for RetrievedRecord {
    fn from(value: Chunk) -> Self {
        Self::Internal(value)
    }
}

impl From<ExternalResult> for RetrievedRecord {
    fn from(value: ExternalResult) -> Self {
        Self::External(value)
    }
}

/// What one retrieval adapter produced. Adapters never raise past this type.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutcome<T> {
    Found(Vec<T>),
    Empty,
    /// The source is not configured (e.g. no API key).
    Disabled,
    /// The source was unreachable or answered with something unusable.
    Failed(String),
}

impl<T> SourceOutcome<T> {
    pub fn from_hits(hits: Vec<T>) -> Self {
        if hits.is_empty() {
            Self::Empty
        } else {
            Self::Found(hits)
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Found(hits) => hits.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Found(_) => "found",
            Self::Empty => "empty",
            Self::Disabled => "disabled",
            Self::Failed(_) => "failed",
        }
    }

    pub fn into_hits(self) -> Vec<T> {
        match self {
            Self::Found(hits) => hits,
            _ => Vec::new(),
        }
    }
}

/// The document the current session was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentDocument {
    pub filename: String,
    pub path: String,
    pub num_chunks: usize,
    pub pages: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Citation {
    Internal {
        id: String,
        doc_name: String,
        page_num: u32,
        preview: String,
    },
    External {
        id: String,
        title: String,
        url: String,
        preview: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerPayload {
    pub answer: String,
    pub citations: Vec<Citation>,
    pub used_chunks: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(flatten)]
    pub payload: AnswerPayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_document: Option<CurrentDocument>,
}

#[derive(Debug, Clone)]
pub struct IngestionOptions {
    pub chunk_words: usize,
    pub overlap_words: usize,
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            chunk_words: 800,
            overlap_words: 150,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_serialize_with_source_type_tag() {
        let record = RetrievedRecord::External(ExternalResult {
            id: "you_0".to_string(),
            title: "GDPR news".to_string(),
            url: "http://x".to_string(),
            snippet: "fine issued".to_string(),
            text: "GDPR news. fine issued".to_string(),
        });

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["source_type"], "external");
        assert_eq!(value["id"], "you_0");
    }

    #[test]
    fn chat_response_omits_missing_document() {
        let response = ChatResponse {
            payload: AnswerPayload {
                answer: "ok".to_string(),
                citations: Vec::new(),
                used_chunks: 0,
            },
            current_document: None,
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["answer"], "ok");
        assert!(value.get("current_document").is_none());
    }

    #[test]
    fn outcome_labels_and_hits() {
        let found = SourceOutcome::from_hits(vec![1, 2]);
        assert_eq!(found.label(), "found");
        assert_eq!(found.len(), 2);

        let empty: SourceOutcome<u8> = SourceOutcome::from_hits(Vec::new());
        assert_eq!(empty, SourceOutcome::Empty);

        let failed: SourceOutcome<u8> = SourceOutcome::Failed("timeout".to_string());
        assert!(failed.is_empty());
        assert!(failed.into_hits().is_empty());
    }
}
