use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),

    #[error("no extractable text in {0}")]
    NoText(String),

    #[error("chunk log serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("search request failed: {0}")]
    Request(String),
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("chat completion returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not parse model output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("model returned no content")]
    EmptyResponse,

    #[error("model selected unknown ids: {0:?}")]
    InvalidSelection(Vec<String>),
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("question is required")]
    EmptyQuestion,

    #[error("answer generation failed: {0}")]
    Llm(#[from] LlmError),
}
