use crate::llm::ResponseFormat;
use crate::{ChatMessage, Chunk, ExternalResult, LlmError, SearchError, SourceOutcome};
use async_trait::async_trait;

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Drops whatever the index held and stores exactly `chunks`.
    async fn rebuild(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<(), SearchError>;

    /// Nearest chunks first. An empty index yields an empty vector.
    async fn search_vector(&self, query_vector: &[f32], k: usize) -> Result<Vec<Chunk>, SearchError>;

    fn name(&self) -> &str;
}

#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str, num_results: usize) -> SourceOutcome<ExternalResult>;
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        format: ResponseFormat,
    ) -> Result<Option<String>, LlmError>;
}
