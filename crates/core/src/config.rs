use crate::catalog::{default_document_types, DocumentTypeSpec};
use crate::embeddings::DEFAULT_EMBEDDING_DIMENSIONS;
use crate::error::IndexError;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 100;
pub const DEFAULT_DOCUMENT_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_INDEX_NAME: &str = "knowledgegas-docs";
pub const DEFAULT_ELASTIC_HOST: &str = "http://localhost:9200";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrEndpointConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub enabled: bool,
    pub languages: Vec<String>,
    pub service: Option<OcrEndpointConfig>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            languages: vec!["rus".to_string(), "eng".to_string()],
            service: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub elastic_host: String,
    pub index_name: String,
    pub batch_size: usize,
    pub max_file_size_mb: u64,
    pub document_timeout: Duration,
    pub embedding_dimensions: usize,
    pub ocr: OcrConfig,
    pub cad_endpoint: Option<String>,
    pub document_types: Vec<DocumentTypeSpec>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("./data/documents"),
            output_dir: PathBuf::from("./data/index"),
            elastic_host: DEFAULT_ELASTIC_HOST.to_string(),
            index_name: DEFAULT_INDEX_NAME.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_file_size_mb: DEFAULT_MAX_FILE_SIZE_MB,
            document_timeout: DEFAULT_DOCUMENT_TIMEOUT,
            embedding_dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
            ocr: OcrConfig::default(),
            cad_endpoint: None,
            document_types: default_document_types(),
        }
    }
}

impl PipelineConfig {
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }

    pub fn documents_dir(&self) -> PathBuf {
        self.output_dir.join("documents")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir.join("index.json")
    }

    pub fn stats_path(&self) -> PathBuf {
        self.output_dir.join("stats.json")
    }

    pub fn validate(&self) -> Result<(), IndexError> {
        if self.batch_size == 0 {
            return Err(IndexError::InvalidConfig("batch size must be positive".to_string()));
        }
        if self.document_timeout.is_zero() {
            return Err(IndexError::InvalidConfig(
                "document timeout must be positive".to_string(),
            ));
        }
        if self.max_file_size_mb == 0 {
            return Err(IndexError::InvalidConfig(
                "max file size must be positive".to_string(),
            ));
        }
        if self.embedding_dimensions == 0 {
            return Err(IndexError::InvalidConfig(
                "embedding dimensions must be positive".to_string(),
            ));
        }
        if self.document_types.is_empty() {
            return Err(IndexError::InvalidConfig(
                "at least one document type is required".to_string(),
            ));
        }
        if self.index_name.trim().is_empty() {
            return Err(IndexError::InvalidConfig("index name is empty".to_string()));
        }

        Url::parse(&self.elastic_host)?;
        if let Some(service) = &self.ocr.service {
            Url::parse(&service.endpoint)?;
        }
        if let Some(endpoint) = &self.cad_endpoint {
            Url::parse(endpoint)?;
        }

        Ok(())
    }
}

/// Splits a comma separated language list such as `rus,eng`.
pub fn parse_languages(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|language| language.trim().to_string())
        .filter(|language| !language.is_empty())
        .collect()
}

/// Treats blank strings as absent, the way empty environment variables are.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}
