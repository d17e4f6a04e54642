pub mod answer;
pub mod chunking;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod orchestrator;
pub mod prompts;
pub mod rerank;
pub mod retriever;
pub mod session;
pub mod stores;
pub mod traits;
pub mod web_search;

pub use answer::AnswerComposer;
pub use chunking::{build_chunks, normalize_whitespace, word_windows, ChunkingConfig};
pub use embeddings::{CharacterNgramEmbedder, Embedder, HttpEmbedder, DEFAULT_EMBEDDING_DIMENSIONS};
pub use error::{ChatError, IngestError, LlmError, SearchError};
pub use extractor::{extract_page_texts, LopdfExtractor, PageText, PdfExtractor};
pub use ingest::{ingest_pdf, ingest_pdf_with, ChunkLog, IngestionReport};
pub use llm::{ChatCompletionsClient, ResponseFormat, DEFAULT_CHAT_MODEL, GROQ_BASE_URL};
pub use models::{
    AnswerPayload, ChatMessage, ChatResponse, Chunk, Citation, CurrentDocument, ExternalResult,
    IngestionOptions, RetrievedRecord, SourceOutcome, SourceType,
};
pub use orchestrator::{PipelineOptions, RagOrchestrator};
pub use rerank::{Reranked, Reranker, SelectionStrategy, DEFAULT_MAX_RERANKED};
pub use retriever::HybridRetriever;
pub use session::Session;
pub use stores::{InMemoryIndex, QdrantStore};
pub use traits::{ChatModel, VectorIndex, WebSearch};
pub use web_search::YouSearchClient;
