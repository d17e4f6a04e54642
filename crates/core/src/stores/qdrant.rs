use crate::traits::VectorIndex;
use crate::{Chunk, SearchError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

pub struct QdrantStore {
    endpoint: String,
    collection: String,
    client: Client,
    vector_size: usize,
}

impl QdrantStore {
    pub fn new(endpoint: impl Into<String>, collection: impl Into<String>, vector_size: usize) -> Self {
        let mut endpoint = endpoint.into();
        while endpoint.ends_with('/') {
            endpoint.pop();
        }
        Self {
            endpoint,
            collection: collection.into(),
            client: Client::new(),
            vector_size,
        }
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.endpoint, self.collection)
    }

    /// Deletes the collection. A collection that doesn't exist is not an error.
    pub async fn delete_collection(&self) -> Result<(), SearchError> {
        let response = self.client.delete(self.collection_url()).send().await?;

        if response.status().is_success() || response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }

        Err(SearchError::BackendResponse {
            backend: "qdrant".to_string(),
            details: format!("delete collection: {}", response.status()),
        })
    }

    pub async fn create_collection(&self) -> Result<(), SearchError> {
        let response = self
            .client
            .put(self.collection_url())
            .json(&json!({
                "vectors": {
                    "size": self.vector_size,
                    "distance": "Cosine",
                }
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SearchError::BackendResponse {
                backend: "qdrant".to_string(),
                details: format!("create collection: {}", response.status()),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl VectorIndex for QdrantStore {
    async fn rebuild(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<(), SearchError> {
        if chunks.len() != embeddings.len() {
            return Err(SearchError::Request(format!(
                "embedding count {} doesn't match chunk count {}",
                embeddings.len(),
                chunks.len()
            )));
        }

        let points = chunks
            .iter()
            .zip(embeddings.iter())
            .enumerate()
            .map(|(position, (chunk, embedding))| {
                if embedding.len() != self.vector_size {
                    return Err(SearchError::Request(format!(
                        "embedding dimension {} != {}",
                        embedding.len(),
                        self.vector_size
                    )));
                }

                Ok(json!({
                    "id": position as u64,
                    "vector": embedding,
                    "payload": chunk_payload(chunk),
                }))
            })
            .collect::<Result<Vec<_>, SearchError>>()?;

        self.delete_collection().await?;
        self.create_collection().await?;

        if points.is_empty() {
            return Ok(());
        }

        let response = self
            .client
            .put(format!("{}/points?wait=true", self.collection_url()))
            .json(&json!({ "points": points }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SearchError::BackendResponse {
                backend: "qdrant".to_string(),
                details: response.status().to_string(),
            });
        }

        Ok(())
    }

    async fn search_vector(&self, query_vector: &[f32], k: usize) -> Result<Vec<Chunk>, SearchError> {
        if query_vector.len() != self.vector_size {
            return Err(SearchError::Request(format!(
                "query vector dim {} is not {}",
                query_vector.len(),
                self.vector_size
            )));
        }

        let response = self
            .client
            .post(format!("{}/points/search", self.collection_url()))
            .json(&json!({
                "vector": query_vector,
                "limit": k,
                "with_payload": true,
            }))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        if !response.status().is_success() {
            return Err(SearchError::BackendResponse {
                backend: "qdrant".to_string(),
                details: response.status().to_string(),
            });
        }

        let parsed: Value = response.json().await?;
        Ok(chunks_from_search(&parsed))
    }

    fn name(&self) -> &str {
        "qdrant"
    }
}

fn chunk_payload(chunk: &Chunk) -> Value {
    json!({
        "chunk_id": chunk.id,
        "text": chunk.text,
        "section": chunk.section_path,
        "page_num": chunk.page_num,
        "doc_name": chunk.doc_name,
    })
}

fn chunks_from_search(parsed: &Value) -> Vec<Chunk> {
    parsed
        .pointer("/result")
        .and_then(Value::as_array)
        .map(|hits| hits.iter().map(chunk_from_hit).collect())
        .unwrap_or_default()
}

fn chunk_from_hit(hit: &Value) -> Chunk {
    let text_field = |pointer: &str, fallback: &str| {
        hit.pointer(pointer)
            .and_then(Value::as_str)
            .unwrap_or(fallback)
            .to_string()
    };

    let id = hit
        .pointer("/payload/chunk_id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| hit.pointer("/id").map(|id| id.to_string()))
        .unwrap_or_default();

    Chunk {
        id,
        doc_name: text_field("/payload/doc_name", "Unknown"),
        page_num: hit
            .pointer("/payload/page_num")
            .and_then(Value::as_u64)
            .and_then(|page| u32::try_from(page).ok())
            .unwrap_or(1),
        text: text_field("/payload/text", ""),
        section_path: text_field("/payload/section", "ROOT"),
    }
}
