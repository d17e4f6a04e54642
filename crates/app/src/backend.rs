use legal_rag_core::{ChunkLog, InMemoryIndex, QdrantStore, RagOrchestrator, Session, VectorIndex};
use std::sync::Arc;
use tracing::{info, warn};

/// Where the document index lives.
pub enum IndexBackend {
    /// A new in-process index per upload, rebuilt from the chunk log on start.
    Memory,
    /// One shared Qdrant collection, replaced on every upload.
    Qdrant(Arc<QdrantStore>),
}

impl IndexBackend {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Qdrant(_) => "qdrant",
        }
    }

    /// The index the next upload should be written into.
    pub fn fresh(&self) -> Arc<dyn VectorIndex> {
        match self {
            Self::Memory => Arc::new(InMemoryIndex::new()),
            Self::Qdrant(store) => store.clone(),
        }
    }

    /// Session for a process that just started. No document is current yet.
    ///
    /// A chunk log that cannot be read or re-embedded leaves retrieval empty
    /// until the next upload instead of stopping the process.
    pub async fn restore(&self, orchestrator: &RagOrchestrator, log: &ChunkLog) -> Session {
        match self.try_restore(orchestrator, log).await {
            Ok(session) => session,
            Err(err) => {
                warn!(error = %err, path = %log.path().display(), "chunk log restore failed; retrieval starts empty");
                Session::empty()
            }
        }
    }

    async fn try_restore(&self, orchestrator: &RagOrchestrator, log: &ChunkLog) -> anyhow::Result<Session> {
        match self {
            Self::Qdrant(store) => Ok(Session::empty().with_index(store.clone())),
            Self::Memory => {
                let chunks = log.load()?;
                if chunks.is_empty() {
                    return Ok(Session::empty());
                }

                let index = self.fresh();
                orchestrator.rebuild_index(index.as_ref(), &chunks).await?;
                info!(chunks = chunks.len(), path = %log.path().display(), "restored index from chunk log");
                Ok(Session::empty().with_index(index))
            }
        }
    }
}
