//! In-process vector index ranked by cosine similarity.

use crate::traits::VectorIndex;
use crate::{Chunk, SearchError};
use async_trait::async_trait;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct InMemoryIndex {
    entries: RwLock<Vec<(Chunk, Vec<f32>)>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn rebuild(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<(), SearchError> {
        if chunks.len() != embeddings.len() {
            return Err(SearchError::Request(format!(
                "embedding count {} doesn't match chunk count {}",
                embeddings.len(),
                chunks.len()
            )));
        }

        let fresh = chunks
            .iter()
            .cloned()
            .zip(embeddings.iter().cloned())
            .collect::<Vec<_>>();

        *self.entries.write().await = fresh;
        Ok(())
    }

    async fn search_vector(&self, query_vector: &[f32], k: usize) -> Result<Vec<Chunk>, SearchError> {
        let entries = self.entries.read().await;

        let mut scored: Vec<(f32, &Chunk)> = entries
            .iter()
            .map(|(chunk, embedding)| (cosine_similarity(embedding, query_vector), chunk))
            .collect();

        scored.sort_by(|left, right| right.0.total_cmp(&left.0));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(_, chunk)| chunk.clone())
            .collect())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::CharacterNgramEmbedder;

    fn chunk(id: &str, text: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            doc_name: "NDA".to_string(),
            page_num: 1,
            text: text.to_string(),
            section_path: "NDA - Page 1".to_string(),
        }
    }

    async fn rebuild_with(index: &InMemoryIndex, chunks: &[Chunk]) {
        let embedder = CharacterNgramEmbedder::default();
        let embeddings: Vec<_> = chunks.iter().map(|c| embedder.vectorize(&c.text)).collect();
        index.rebuild(chunks, &embeddings).await.unwrap();
    }

    #[tokio::test]
    async fn empty_index_returns_no_hits() {
        let index = InMemoryIndex::new();
        let hits = index.search_vector(&[0.1, 0.2], 5).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn closest_chunk_ranks_first() {
        let index = InMemoryIndex::new();
        rebuild_with(
            &index,
            &[
                chunk("a1", "payment terms and invoices"),
                chunk("b2", "confidential information must not be disclosed"),
            ],
        )
        .await;

        let query = CharacterNgramEmbedder::default().vectorize("confidential information disclosure");
        let hits = index.search_vector(&query, 1).await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "b2");
    }

    #[tokio::test]
    async fn rebuild_replaces_previous_chunks() {
        let index = InMemoryIndex::new();
        rebuild_with(&index, &[chunk("old1", "lease agreement rent"), chunk("old2", "deposit")]).await;
        rebuild_with(&index, &[chunk("new1", "employment contract salary")]).await;

        let query = CharacterNgramEmbedder::default().vectorize("lease agreement rent");
        let hits = index.search_vector(&query, 10).await.unwrap();

        assert_eq!(index.len().await, 1);
        assert!(hits.iter().all(|hit| hit.id == "new1"));
    }

    #[tokio::test]
    async fn mismatched_embeddings_are_rejected() {
        let index = InMemoryIndex::new();
        let result = index.rebuild(&[chunk("a", "text")], &[]).await;
        assert!(matches!(result, Err(SearchError::Request(_))));
    }
}
