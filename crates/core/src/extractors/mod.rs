mod cad;
mod markdown;
mod ocr;
mod pdf;

pub use cad::{dwg_release, CadConversionExtractor};
pub use markdown::{markdown_title, MarkdownExtractor};
pub use ocr::OcrPdfExtractor;
pub use pdf::{extract_text_layer, PdfTextExtractor};

use crate::catalog::ExtractionStrategy;
use crate::config::PipelineConfig;
use crate::error::ExtractionError;
use crate::models::ExtractedContent;
use async_trait::async_trait;
use std::path::Path;

#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract(&self, path: &Path) -> Result<ExtractedContent, ExtractionError>;
}

/// One extractor per strategy. Dispatch is an exhaustive match, so a
/// catalog entry can never name a strategy without an implementation.
pub struct ExtractorSet {
    pdf_ocr: Box<dyn ContentExtractor>,
    pdf_text: Box<dyn ContentExtractor>,
    cad: Box<dyn ContentExtractor>,
    markdown: Box<dyn ContentExtractor>,
}

impl ExtractorSet {
    pub fn from_config(config: &PipelineConfig) -> Self {
        let client = reqwest::Client::new();
        Self {
            pdf_ocr: Box::new(OcrPdfExtractor::new(client.clone(), config.ocr.clone())),
            pdf_text: Box::new(PdfTextExtractor),
            cad: Box::new(CadConversionExtractor::new(client, config.cad_endpoint.clone())),
            markdown: Box::new(MarkdownExtractor),
        }
    }

    /// Swaps the implementation behind one strategy.
    pub fn with_extractor(
        mut self,
        strategy: ExtractionStrategy,
        extractor: Box<dyn ContentExtractor>,
    ) -> Self {
        match strategy {
            ExtractionStrategy::PdfOcr => self.pdf_ocr = extractor,
            ExtractionStrategy::PdfText => self.pdf_text = extractor,
            ExtractionStrategy::CadConversion => self.cad = extractor,
            ExtractionStrategy::Markdown => self.markdown = extractor,
        }
        self
    }

    pub fn get(&self, strategy: ExtractionStrategy) -> &dyn ContentExtractor {
        match strategy {
            ExtractionStrategy::PdfOcr => self.pdf_ocr.as_ref(),
            ExtractionStrategy::PdfText => self.pdf_text.as_ref(),
            ExtractionStrategy::CadConversion => self.cad.as_ref(),
            ExtractionStrategy::Markdown => self.markdown.as_ref(),
        }
    }

    pub async fn extract(
        &self,
        strategy: ExtractionStrategy,
        path: &Path,
    ) -> Result<ExtractedContent, ExtractionError> {
        self.get(strategy).extract(path).await
    }
}

impl Default for ExtractorSet {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default()
}

pub(crate) fn has_extension(path: &Path, expected: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    struct Fixed(&'static str);

    #[async_trait]
    impl ContentExtractor for Fixed {
        async fn extract(&self, _path: &Path) -> Result<ExtractedContent, ExtractionError> {
            Ok(ExtractedContent::new(self.0))
        }
    }

    #[tokio::test]
    async fn dispatch_routes_by_strategy() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("incident-1.md");
        fs::write(&path, "# Заголовок\nтекст")?;

        let set = ExtractorSet::default()
            .with_extractor(ExtractionStrategy::PdfOcr, Box::new(Fixed("ocr")));

        let ocr = set.extract(ExtractionStrategy::PdfOcr, &path).await?;
        assert_eq!(ocr.text, "ocr");

        let markdown = set.extract(ExtractionStrategy::Markdown, &path).await?;
        assert_eq!(markdown.title.as_deref(), Some("Заголовок"));
        Ok(())
    }
}
