use super::{file_stem, ContentExtractor};
use crate::error::ExtractionError;
use crate::models::ExtractedContent;
use async_trait::async_trait;
use std::path::Path;

/// Text of the first line that opens with a level-1 heading marker.
pub fn markdown_title(content: &str) -> Option<String> {
    content
        .lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(|title| title.trim_end().to_string())
        .filter(|title| !title.is_empty())
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownExtractor;

#[async_trait]
impl ContentExtractor for MarkdownExtractor {
    async fn extract(&self, path: &Path) -> Result<ExtractedContent, ExtractionError> {
        let bytes = tokio::fs::read(path).await?;
        let content =
            String::from_utf8(bytes).map_err(|_| ExtractionError::InvalidUtf8(path.to_path_buf()))?;
        let title = markdown_title(&content).unwrap_or_else(|| file_stem(path));

        Ok(ExtractedContent::new(content)
            .with_title(title)
            .with_tags(&["markdown", "incident"]))
    }
}
