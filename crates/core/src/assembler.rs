use crate::config::PipelineConfig;
use crate::error::IndexError;
use crate::traits::DocumentStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

pub const SCHEMA_VERSION: &str = "1.0";

/// Field mappings the downstream search engine loads the records with.
pub fn field_mappings(embedding_dimensions: usize) -> Value {
    json!({
        "properties": {
            "title": {"type": "text", "analyzer": "russian"},
            "content": {"type": "text", "analyzer": "russian"},
            "type": {"type": "keyword"},
            "tags": {"type": "keyword"},
            "version": {"type": "keyword"},
            "status": {"type": "keyword"},
            "updated": {"type": "date"},
            "file_path": {"type": "keyword"},
            "file_size": {"type": "integer"},
            "checksum": {"type": "keyword"},
            "embedding": {"type": "dense_vector", "dims": embedding_dimensions}
        }
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexManifest {
    pub version: String,
    pub created: DateTime<Utc>,
    pub index: String,
    pub endpoint: String,
    pub documents_count: usize,
    pub embedding_dimensions: usize,
    pub mappings: Value,
}

#[derive(Debug, Clone)]
pub struct AssembledIndex {
    pub manifest: IndexManifest,
    pub document_ids: BTreeSet<String>,
}

/// Rebuilds the manifest from every stored record. Nothing from an earlier
/// manifest is carried over.
pub async fn assemble_index<S>(
    store: &S,
    config: &PipelineConfig,
) -> Result<AssembledIndex, IndexError>
where
    S: DocumentStore + ?Sized,
{
    let documents = store.load_all().await?;
    let document_ids: BTreeSet<String> = documents.iter().map(|doc| doc.id.clone()).collect();

    let manifest = IndexManifest {
        version: SCHEMA_VERSION.to_string(),
        created: Utc::now(),
        index: config.index_name.clone(),
        endpoint: config.elastic_host.clone(),
        documents_count: document_ids.len(),
        embedding_dimensions: config.embedding_dimensions,
        mappings: field_mappings(config.embedding_dimensions),
    };

    let manifest_path = config.manifest_path();
    write_manifest(&manifest, &manifest_path).await?;
    info!(
        path = %manifest_path.display(),
        documents = manifest.documents_count,
        "index manifest written"
    );

    Ok(AssembledIndex {
        manifest,
        document_ids,
    })
}

pub async fn write_manifest(manifest: &IndexManifest, path: &Path) -> Result<(), IndexError> {
    let body = serde_json::to_vec_pretty(manifest)?;
    tokio::fs::write(path, body).await?;
    Ok(())
}
