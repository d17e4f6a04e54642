use crate::traits::VectorIndex;
use crate::CurrentDocument;
use std::sync::Arc;

/// The index and document a chat request runs against.
///
/// An upload produces a new session; chat only ever reads one.
#[derive(Clone, Default)]
pub struct Session {
    index: Option<Arc<dyn VectorIndex>>,
    document: Option<CurrentDocument>,
}

impl Session {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_document(mut self, document: CurrentDocument) -> Self {
        self.document = Some(document);
        self
    }

    pub fn index(&self) -> Option<&dyn VectorIndex> {
        self.index.as_deref()
    }

    pub fn document(&self) -> Option<&CurrentDocument> {
        self.document.as_ref()
    }

    pub fn has_retriever(&self) -> bool {
        self.index.is_some()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("index", &self.index.as_ref().map(|index| index.name().to_string()))
            .field("document", &self.document)
            .finish()
    }
}
