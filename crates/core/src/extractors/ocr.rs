use super::pdf::read_text_layer;
use super::{file_stem, ContentExtractor};
use crate::config::{OcrConfig, OcrEndpointConfig};
use crate::error::ExtractionError;
use crate::models::{DocumentStatus, ExtractedContent, DEFAULT_DOCUMENT_VERSION};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
struct OcrRequest<'a> {
    pdf_base64: String,
    source_path: String,
    languages: &'a [String],
}

#[derive(Debug, Clone, Deserialize)]
struct OcrResponse {
    pages: Option<Vec<OcrPage>>,
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct OcrPage {
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    text: Option<String>,
}

/// Scanned-PDF extraction. Sends the file to the configured OCR service;
/// with OCR disabled or no service configured it reads the text layer.
pub struct OcrPdfExtractor {
    client: Client,
    config: OcrConfig,
}

impl OcrPdfExtractor {
    pub fn new(client: Client, config: OcrConfig) -> Self {
        Self { client, config }
    }

    fn service(&self) -> Option<&OcrEndpointConfig> {
        if self.config.enabled {
            self.config.service.as_ref()
        } else {
            None
        }
    }

    async fn recognize(
        &self,
        service: &OcrEndpointConfig,
        path: &Path,
    ) -> Result<String, ExtractionError> {
        let pdf = tokio::fs::read(path).await?;
        let payload = OcrRequest {
            pdf_base64: STANDARD.encode(pdf),
            source_path: path.to_string_lossy().to_string(),
            languages: &self.config.languages,
        };

        let mut request = self
            .client
            .post(&service.endpoint)
            .header("content-type", "application/json")
            .json(&payload);

        if let Some(api_key) = &service.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(ExtractionError::OcrFailed(format!(
                "OCR request to {} returned {}",
                service.endpoint,
                response.status()
            )));
        }

        let payload: OcrResponse = response.json().await?;
        let pages = payload_to_pages(&payload, path)?;
        Ok(pages.join("\n\n"))
    }
}

#[async_trait]
impl ContentExtractor for OcrPdfExtractor {
    async fn extract(&self, path: &Path) -> Result<ExtractedContent, ExtractionError> {
        let (text, tags): (String, &[&str]) = match self.service() {
            Some(service) => (self.recognize(service, path).await?, &["pdf", "ocr"][..]),
            None => {
                debug!(path = %path.display(), "OCR unavailable, reading text layer");
                (read_text_layer(path).await?, &["pdf", "text"][..])
            }
        };

        let mut content = ExtractedContent::new(text)
            .with_title(file_stem(path))
            .with_tags(tags);
        content.version = Some(DEFAULT_DOCUMENT_VERSION.to_string());
        content.status = Some(DocumentStatus::Active);
        Ok(content)
    }
}

fn payload_to_pages(payload: &OcrResponse, path: &Path) -> Result<Vec<String>, ExtractionError> {
    if let Some(listed) = &payload.pages {
        let mut listed = listed
            .iter()
            .filter_map(|page| {
                let text = page.text.as_deref().map(str::trim).unwrap_or_default();
                if text.is_empty() {
                    None
                } else {
                    Some((page.page.unwrap_or(1), text.to_string()))
                }
            })
            .collect::<Vec<_>>();

        if !listed.is_empty() {
            listed.sort_by_key(|(number, _)| *number);
            return Ok(listed.into_iter().map(|(_, text)| text).collect());
        }
    }

    if let Some(raw_text) = &payload.text {
        let pages = raw_text
            .split('\u{000c}')
            .map(str::trim)
            .filter(|chunk| !chunk.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();

        if !pages.is_empty() {
            return Ok(pages);
        }
    }

    Err(ExtractionError::OcrFailed(format!(
        "OCR response was empty for {}",
        path.display()
    )))
}
