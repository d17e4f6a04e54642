use crate::embeddings::Embedder;
use crate::traits::{VectorIndex, WebSearch};
use crate::{Chunk, RetrievedRecord, SearchError, SourceOutcome};
use std::sync::Arc;
use tracing::{info, warn};

/// Combines the session's vector index with live web search.
pub struct HybridRetriever {
    embedder: Arc<dyn Embedder>,
    web: Arc<dyn WebSearch>,
}

impl HybridRetriever {
    pub fn new(embedder: Arc<dyn Embedder>, web: Arc<dyn WebSearch>) -> Self {
        Self { embedder, web }
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Nearest chunks for `query`. A missing index is reported as disabled.
    pub async fn retrieve_internal(
        &self,
        index: Option<&dyn VectorIndex>,
        query: &str,
        k: usize,
    ) -> SourceOutcome<Chunk> {
        let Some(index) = index else {
            return SourceOutcome::Disabled;
        };

        match self.search_index(index, query, k).await {
            Ok(mut chunks) => {
                chunks.truncate(k);
                SourceOutcome::from_hits(chunks)
            }
            Err(error) => {
                warn!(backend = index.name(), error = %error, "internal retrieval failed");
                SourceOutcome::Failed(error.to_string())
            }
        }
    }

    async fn search_index(
        &self,
        index: &dyn VectorIndex,
        query: &str,
        k: usize,
    ) -> Result<Vec<Chunk>, SearchError> {
        let query_vector = self.embedder.embed(query).await?;
        index.search_vector(&query_vector, k).await
    }

    /// Internal hits first, then web hits. No deduplication across sources.
    pub async fn hybrid_retrieve(
        &self,
        index: Option<&dyn VectorIndex>,
        query: &str,
        k_internal: usize,
        k_external: usize,
    ) -> Vec<RetrievedRecord> {
        let (internal, external) = tokio::join!(
            self.retrieve_internal(index, query, k_internal),
            self.web.search(query, k_external)
        );

        info!(
            internal = internal.len(),
            internal_status = internal.label(),
            external = external.len(),
            external_status = external.label(),
            "hybrid retrieval"
        );

        let mut external = external.into_hits();
        external.truncate(k_external);

        internal
            .into_hits()
            .into_iter()
            .map(RetrievedRecord::from)
            .chain(external.into_iter().map(RetrievedRecord::from))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::stores::InMemoryIndex;
    use crate::{CharacterNgramEmbedder, ExternalResult};
    use async_trait::async_trait;

    /// Web search double returning a fixed outcome.
    pub(crate) struct FixedWeb(pub(crate) SourceOutcome<ExternalResult>);

    #[async_trait]
    impl WebSearch for FixedWeb {
        async fn search(&self, _query: &str, num_results: usize) -> SourceOutcome<ExternalResult> {
            match &self.0 {
                SourceOutcome::Found(hits) => {
                    SourceOutcome::Found(hits.iter().take(num_results).cloned().collect())
                }
                other => other.clone(),
            }
        }
    }

    struct BrokenIndex;

    #[async_trait]
    impl VectorIndex for BrokenIndex {
        async fn rebuild(&self, _chunks: &[Chunk], _embeddings: &[Vec<f32>]) -> Result<(), SearchError> {
            Ok(())
        }

        async fn search_vector(&self, _query_vector: &[f32], _k: usize) -> Result<Vec<Chunk>, SearchError> {
            Err(SearchError::Request("connection refused".to_string()))
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    pub(crate) fn web_hits(count: usize) -> Vec<ExternalResult> {
        (0..count)
            .map(|n| ExternalResult {
                id: format!("you_{n}"),
                title: format!("GDPR news {n}"),
                url: format!("https://news.test/{n}"),
                snippet: "Regulator issues fine".to_string(),
                text: format!("GDPR news {n}. Regulator issues fine"),
            })
            .collect()
    }

    pub(crate) fn page_chunk(id: &str, text: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            doc_name: "NDA".to_string(),
            page_num: 1,
            text: text.to_string(),
            section_path: "NDA - Page 1".to_string(),
        }
    }

    async fn seeded_index(embedder: &CharacterNgramEmbedder, chunks: &[Chunk]) -> InMemoryIndex {
        let index = InMemoryIndex::new();
        let embeddings: Vec<Vec<f32>> = chunks.iter().map(|chunk| embedder.vectorize(&chunk.text)).collect();
        index.rebuild(chunks, &embeddings).await.unwrap();
        index
    }

    fn retriever(web: SourceOutcome<ExternalResult>) -> HybridRetriever {
        HybridRetriever::new(Arc::new(CharacterNgramEmbedder::default()), Arc::new(FixedWeb(web)))
    }

    #[tokio::test]
    async fn internal_results_precede_external_and_respect_bounds() {
        let embedder = CharacterNgramEmbedder::default();
        let chunks: Vec<Chunk> = (0..10)
            .map(|n| page_chunk(&format!("c{n}"), &format!("confidentiality obligations clause {n}")))
            .collect();
        let index = seeded_index(&embedder, &chunks).await;
        let retriever = retriever(SourceOutcome::Found(web_hits(8)));

        let records = retriever
            .hybrid_retrieve(Some(&index as &dyn VectorIndex), "confidentiality clause", 6, 4)
            .await;

        assert_eq!(records.len(), 10);
        let first_external = records.iter().position(RetrievedRecord::is_external).unwrap();
        assert_eq!(first_external, 6);
        assert!(records[first_external..].iter().all(RetrievedRecord::is_external));
        assert_eq!(records[6].id(), "you_0");
    }

    #[tokio::test]
    async fn short_sources_shrink_the_result() {
        let embedder = CharacterNgramEmbedder::default();
        let index = seeded_index(&embedder, &[page_chunk("only", "termination notice")]).await;
        let retriever = retriever(SourceOutcome::Found(web_hits(1)));

        let records = retriever.hybrid_retrieve(Some(&index as &dyn VectorIndex), "termination", 6, 4).await;

        assert_eq!(records.iter().map(RetrievedRecord::id).collect::<Vec<_>>(), vec!["only", "you_0"]);
    }

    #[tokio::test]
    async fn missing_index_and_disabled_web_yield_nothing() {
        let retriever = retriever(SourceOutcome::Disabled);

        assert_eq!(
            retriever.retrieve_internal(None, "anything", 6).await,
            SourceOutcome::Disabled
        );
        assert!(retriever.hybrid_retrieve(None, "anything", 6, 4).await.is_empty());
    }

    #[tokio::test]
    async fn index_failure_degrades_to_web_only() {
        let retriever = retriever(SourceOutcome::Found(web_hits(2)));

        let outcome = retriever.retrieve_internal(Some(&BrokenIndex as &dyn VectorIndex), "q", 6).await;
        assert!(matches!(outcome, SourceOutcome::Failed(_)));

        let records = retriever.hybrid_retrieve(Some(&BrokenIndex as &dyn VectorIndex), "q", 6, 4).await;
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(RetrievedRecord::is_external));
    }
}
