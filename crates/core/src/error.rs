use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Fatal setup errors. Any of these aborts the whole run.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("input directory not found: {0}")]
    InputMissing(PathBuf),

    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown extraction strategy: {0}")]
    UnknownStrategy(String),

    #[error("invalid pattern {pattern:?} for document type {type_id}: {details}")]
    InvalidPattern {
        type_id: String,
        pattern: String,
        details: String,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("template error: {0}")]
    Template(#[from] regex::Error),

    #[error("pdf build error: {0}")]
    PdfBuild(String),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("document store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("file is not valid utf-8: {0}")]
    InvalidUtf8(PathBuf),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("CAD conversion failed: {0}")]
    CadFailed(String),

    #[error("extraction task aborted: {0}")]
    Join(String),
}

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding backend failed: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Everything that can go wrong while indexing a single document.
/// These never escape the document's own task.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("embedding has {actual} dimensions, schema requires {expected}")]
    EmbeddingDimensions { expected: usize, actual: usize },

    #[error("persist failed: {0}")]
    Store(#[from] StoreError),

    #[error("document timed out after {0:?}")]
    Timeout(Duration),
}

pub type Result<T, E = IndexError> = std::result::Result<T, E>;
