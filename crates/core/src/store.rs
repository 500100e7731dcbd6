use crate::error::StoreError;
use crate::models::IndexedDocument;
use crate::traits::DocumentStore;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::warn;

/// One pretty-printed JSON file per document: `<dir>/<id>.json`.
#[derive(Debug, Clone)]
pub struct JsonDirectoryStore {
    dir: PathBuf,
}

impl JsonDirectoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn record_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

#[async_trait]
impl DocumentStore for JsonDirectoryStore {
    async fn prepare(&self) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    async fn persist(&self, document: &IndexedDocument) -> Result<(), StoreError> {
        let body = serde_json::to_vec_pretty(document)?;
        tokio::fs::write(self.record_path(&document.id), body).await?;
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<IndexedDocument>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(error.into()),
        };

        let mut documents = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_record = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == "json");
            if !is_record {
                continue;
            }

            let parsed = tokio::fs::read(&path)
                .await
                .map_err(StoreError::from)
                .and_then(|bytes| {
                    serde_json::from_slice::<IndexedDocument>(&bytes).map_err(StoreError::from)
                });

            match parsed {
                Ok(document) => documents.push(document),
                Err(error) => {
                    warn!(path = %path.display(), error = %error, "ignoring unreadable record")
                }
            }
        }

        documents.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(documents)
    }
}
