use crate::answer::{greeting_payload, is_greeting, AnswerComposer};
use crate::embeddings::Embedder;
use crate::rerank::{Reranker, DEFAULT_MAX_RERANKED};
use crate::retriever::HybridRetriever;
use crate::session::Session;
use crate::traits::{ChatModel, VectorIndex, WebSearch};
use crate::{ChatError, ChatMessage, ChatResponse, Chunk, CurrentDocument, IngestionReport, SearchError};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub k_internal: usize,
    pub k_external: usize,
    pub max_reranked: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            k_internal: 6,
            k_external: 4,
            max_reranked: DEFAULT_MAX_RERANKED,
        }
    }
}

/// Runs uploads into a fresh [`Session`] and questions through
/// retrieve, rerank and answer.
pub struct RagOrchestrator {
    retriever: HybridRetriever,
    reranker: Reranker,
    composer: AnswerComposer,
    options: PipelineOptions,
}

impl RagOrchestrator {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        web: Arc<dyn WebSearch>,
        model: Arc<dyn ChatModel>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            retriever: HybridRetriever::new(embedder, web),
            reranker: Reranker::new(model.clone(), options.max_reranked),
            composer: AnswerComposer::new(model),
            options,
        }
    }

    /// Embeds `chunks` and replaces the whole content of `index` with them.
    pub async fn rebuild_index(&self, index: &dyn VectorIndex, chunks: &[Chunk]) -> Result<(), SearchError> {
        let embedder = self.retriever.embedder();
        let mut embeddings = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            embeddings.push(embedder.embed(&chunk.text).await?);
        }

        index.rebuild(chunks, &embeddings).await?;
        info!(backend = index.name(), chunks = chunks.len(), "vector index rebuilt");
        Ok(())
    }

    /// Indexes an ingested document and returns the session that serves it.
    pub async fn ingest(
        &self,
        index: Arc<dyn VectorIndex>,
        report: &IngestionReport,
        filename: &str,
        path: &str,
    ) -> Result<Session, SearchError> {
        self.rebuild_index(index.as_ref(), &report.chunks).await?;

        let document = CurrentDocument {
            filename: filename.to_string(),
            path: path.to_string(),
            num_chunks: report.chunks.len(),
            pages: report.pages,
        };

        Ok(Session::empty().with_index(index).with_document(document))
    }

    pub async fn chat(
        &self,
        session: &Session,
        question: &str,
        history: &[ChatMessage],
    ) -> Result<ChatResponse, ChatError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ChatError::EmptyQuestion);
        }

        let payload = if is_greeting(question) {
            greeting_payload()
        } else {
            let candidates = self
                .retriever
                .hybrid_retrieve(
                    session.index(),
                    question,
                    self.options.k_internal,
                    self.options.k_external,
                )
                .await;
            let reranked = self.reranker.rerank(question, candidates).await;
            info!(strategy = ?reranked.strategy, selected = reranked.records.len(), "context selected");

            self.composer.answer(question, &reranked.records, history).await?
        };

        Ok(ChatResponse {
            payload,
            current_document: session.document().cloned(),
        })
    }
}
