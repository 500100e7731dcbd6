use super::{file_stem, ContentExtractor};
use crate::error::ExtractionError;
use crate::models::ExtractedContent;
use async_trait::async_trait;
use lopdf::Document;
use std::path::{Path, PathBuf};

/// Embedded text of every page, pages separated by a blank line.
pub fn extract_text_layer(path: &Path) -> Result<String, ExtractionError> {
    let document =
        Document::load(path).map_err(|error| ExtractionError::PdfParse(error.to_string()))?;

    let mut pages = Vec::new();
    for (page_no, _page_id) in document.get_pages() {
        let text = document
            .extract_text(&[page_no])
            .map_err(|error| ExtractionError::PdfParse(error.to_string()))?;

        let text = text.trim();
        if !text.is_empty() {
            pages.push(text.to_string());
        }
    }

    if pages.is_empty() {
        return Err(ExtractionError::PdfParse(format!(
            "pdf had no readable page text: {}",
            path.display()
        )));
    }

    Ok(pages.join("\n\n"))
}

/// Runs the lopdf parse on the blocking pool.
pub(crate) async fn read_text_layer(path: &Path) -> Result<String, ExtractionError> {
    let owned: PathBuf = path.to_path_buf();
    tokio::task::spawn_blocking(move || extract_text_layer(&owned))
        .await
        .map_err(|error| ExtractionError::Join(error.to_string()))?
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

#[async_trait]
impl ContentExtractor for PdfTextExtractor {
    async fn extract(&self, path: &Path) -> Result<ExtractedContent, ExtractionError> {
        let text = read_text_layer(path).await?;
        Ok(ExtractedContent::new(text)
            .with_title(file_stem(path))
            .with_tags(&["pdf", "text"]))
    }
}
