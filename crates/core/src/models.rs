use crate::catalog::DocumentTypeSpec;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_DOCUMENT_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    Active,
    Superseded,
}

impl DocumentStatus {
    /// Label used in the Russian-language corpus.
    pub fn label(&self) -> &'static str {
        match self {
            DocumentStatus::Active => "Действующий",
            DocumentStatus::Superseded => "Утратил силу",
        }
    }
}

/// A file found by the scanner together with the type it was classified as.
#[derive(Debug, Clone)]
pub struct ScannedFile<'a> {
    pub path: PathBuf,
    pub spec: &'a DocumentTypeSpec,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractedContent {
    pub text: String,
    pub title: Option<String>,
    pub tags: Vec<String>,
    pub version: Option<String>,
    pub status: Option<DocumentStatus>,
}

impl ExtractedContent {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|tag| tag.to_string()).collect();
        self
    }
}

/// The persisted record. Field names are the search-engine schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexedDocument {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub tags: Vec<String>,
    pub version: String,
    pub status: DocumentStatus,
    pub updated: DateTime<Utc>,
    pub file_path: String,
    pub file_size: u64,
    pub checksum: String,
    pub embedding: Vec<f32>,
}

/// File facts gathered before extraction.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

impl IndexedDocument {
    pub fn assemble(
        id: String,
        source: &SourceFile,
        doc_type: &str,
        content: ExtractedContent,
        embedding: Vec<f32>,
        checksum: String,
    ) -> Self {
        let title = content
            .title
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| {
                source
                    .path
                    .file_name()
                    .map(|name| name.to_string_lossy().to_string())
                    .unwrap_or_default()
            });

        Self {
            id,
            title,
            content: content.text,
            doc_type: doc_type.to_string(),
            tags: content.tags,
            version: content
                .version
                .unwrap_or_else(|| DEFAULT_DOCUMENT_VERSION.to_string()),
            status: content.status.unwrap_or_default(),
            updated: source.modified,
            file_path: source.path.to_string_lossy().to_string(),
            file_size: source.size,
            checksum,
            embedding,
        }
    }
}
