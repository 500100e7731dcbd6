//! Stable document ids and content checksums.
//!
//! Ids are the first 16 hex characters (64 bits) of a SHA-256 over the
//! normalized path. Collisions are not detected: two paths whose digests
//! agree in those first 16 characters would overwrite each other's record.
//! At the corpus sizes this pipeline is built for (thousands of files) the
//! probability is negligible.

use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::AsyncReadExt;

pub const DOCUMENT_ID_LEN: usize = 16;

fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

pub fn derive_id(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_path(path).as_bytes());
    let mut digest = format!("{:x}", hasher.finalize());
    digest.truncate(DOCUMENT_ID_LEN);
    digest
}

/// SHA-256 over the whole file, streamed so large drawings are not buffered.
pub async fn compute_checksum(path: &Path) -> std::io::Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 64 * 1024];

    loop {
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
