use clap::Args;
use legal_rag_core::llm::{DEFAULT_CHAT_MODEL, GROQ_BASE_URL};
use legal_rag_core::web_search::YOU_SEARCH_ENDPOINT;
use legal_rag_core::{
    CharacterNgramEmbedder, ChatCompletionsClient, ChunkLog, Embedder, HttpEmbedder, PipelineOptions,
    QdrantStore, RagOrchestrator, YouSearchClient, DEFAULT_EMBEDDING_DIMENSIONS,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

use crate::backend::IndexBackend;

pub const CHUNK_LOG_FILE: &str = "chunks.jsonl";

/// Options shared by every subcommand. Each one can also come from the environment.
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// API key for the chat completions service
    #[arg(long, env = "GROQ_API_KEY", default_value = "", hide_env_values = true)]
    pub groq_api_key: String,

    /// Chat model name
    #[arg(long, env = "GROQ_MODEL", default_value = DEFAULT_CHAT_MODEL)]
    pub groq_model: String,

    /// OpenAI-compatible base URL for chat completions
    #[arg(long, env = "LLM_BASE_URL", default_value = GROQ_BASE_URL)]
    pub llm_base_url: String,

    /// Generation temperature
    #[arg(long, env = "TEMPERATURE", default_value_t = 0.0)]
    pub temperature: f32,

    /// You.com API key; web search is off without it
    #[arg(long, env = "YOU_API_KEY", hide_env_values = true)]
    pub you_api_key: Option<String>,

    /// You.com search endpoint
    #[arg(long, env = "YOU_SEARCH_URL", default_value = YOU_SEARCH_ENDPOINT)]
    pub you_search_url: String,

    /// Chunks pulled from the document index per question
    #[arg(long, env = "TOP_K", default_value_t = 6)]
    pub top_k: usize,

    /// Web results pulled per question
    #[arg(long, env = "EXTERNAL_K", default_value_t = 4)]
    pub external_k: usize,

    /// Most records kept after reranking
    #[arg(long, env = "MAX_RERANKED", default_value_t = 6)]
    pub max_reranked: usize,

    /// Directory holding the chunk log
    #[arg(long, env = "STORAGE_DIR", default_value = "storage")]
    pub storage_dir: PathBuf,

    /// Directory uploaded PDFs are saved to
    #[arg(long, env = "UPLOADS_DIR", default_value = "uploads")]
    pub uploads_dir: PathBuf,

    /// Qdrant base URL; the index stays in process when unset
    #[arg(long, env = "QDRANT_URL")]
    pub qdrant_url: Option<String>,

    /// Qdrant collection
    #[arg(long, env = "QDRANT_COLLECTION", default_value = "legal_documents")]
    pub qdrant_collection: String,

    /// OpenAI-compatible embeddings base URL; hashed trigrams are used when unset
    #[arg(long, env = "EMBEDDING_URL")]
    pub embedding_url: Option<String>,

    /// Embedding model name
    #[arg(long, env = "EMBEDDING_MODEL", default_value = "all-MiniLM-L6-v2")]
    pub embedding_model: String,

    /// API key for the embeddings service
    #[arg(long, env = "EMBEDDING_API_KEY", hide_env_values = true)]
    pub embedding_api_key: Option<String>,

    /// Embedding vector size
    #[arg(long, env = "EMBEDDING_DIMENSIONS", default_value_t = DEFAULT_EMBEDDING_DIMENSIONS)]
    pub embedding_dimensions: usize,
}

impl Settings {
    pub fn chunk_log(&self) -> ChunkLog {
        ChunkLog::new(self.storage_dir.join(CHUNK_LOG_FILE))
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            k_internal: self.top_k,
            k_external: self.external_k,
            max_reranked: self.max_reranked,
        }
    }

    pub fn embedder(&self) -> Arc<dyn Embedder> {
        match self.embedding_url.as_deref().filter(|url| !url.trim().is_empty()) {
            Some(url) => Arc::new(HttpEmbedder::new(
                url,
                self.embedding_model.clone(),
                self.embedding_api_key.clone(),
                self.embedding_dimensions,
            )),
            None => Arc::new(CharacterNgramEmbedder {
                dimensions: self.embedding_dimensions,
            }),
        }
    }

    pub fn backend(&self, dimensions: usize) -> IndexBackend {
        match self.qdrant_url.as_deref().filter(|url| !url.trim().is_empty()) {
            Some(url) => IndexBackend::Qdrant(Arc::new(QdrantStore::new(
                url,
                self.qdrant_collection.clone(),
                dimensions,
            ))),
            None => IndexBackend::Memory,
        }
    }

    /// Wires the retrieval and answer pipeline from these settings.
    pub fn orchestrator(&self, embedder: Arc<dyn Embedder>) -> RagOrchestrator {
        let llm = ChatCompletionsClient::new(
            self.llm_base_url.clone(),
            self.groq_api_key.clone(),
            self.groq_model.clone(),
            self.temperature,
        );
        if !llm.has_api_key() {
            warn!("GROQ_API_KEY is not set; reranking will fall back and answers will fail");
        }

        let web = YouSearchClient::new(self.you_api_key.clone()).with_endpoint(self.you_search_url.clone());
        if !web.is_configured() {
            warn!("YOU_API_KEY is not set; answering from uploaded documents only");
        }

        RagOrchestrator::new(embedder, Arc::new(web), Arc::new(llm), self.pipeline_options())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        settings: Settings,
    }

    #[test]
    fn defaults_match_documented_values() {
        let settings = TestCli::try_parse_from(["legal-rag"]).unwrap().settings;

        assert_eq!(settings.groq_model, DEFAULT_CHAT_MODEL);
        assert_eq!(settings.top_k, 6);
        assert_eq!(settings.external_k, 4);
        assert_eq!(settings.max_reranked, 6);
        assert_eq!(settings.embedding_dimensions, DEFAULT_EMBEDDING_DIMENSIONS);
        assert_eq!(settings.chunk_log().path(), PathBuf::from("storage").join(CHUNK_LOG_FILE));
    }

    #[test]
    fn flags_override_defaults() {
        let settings = TestCli::try_parse_from([
            "legal-rag",
            "--top-k",
            "3",
            "--max-reranked",
            "2",
            "--qdrant-url",
            "http://localhost:6333",
        ])
        .unwrap()
        .settings;

        let options = settings.pipeline_options();
        assert_eq!(options.k_internal, 3);
        assert_eq!(options.max_reranked, 2);
        assert!(matches!(settings.backend(384), IndexBackend::Qdrant(_)));
    }

    #[test]
    fn local_embedder_uses_configured_dimensions() {
        let settings = TestCli::try_parse_from(["legal-rag", "--embedding-dimensions", "64"])
            .unwrap()
            .settings;

        assert_eq!(settings.embedder().dimensions(), 64);
        assert!(matches!(settings.backend(64), IndexBackend::Memory));
    }
}
