use super::pdf::read_text_layer;
use super::{file_stem, has_extension, ContentExtractor};
use crate::error::ExtractionError;
use crate::models::ExtractedContent;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::io::AsyncReadExt;

const DRAWING_TAGS: [&str; 2] = ["dwg", "drawing"];

#[derive(Debug, Clone, Serialize)]
struct CadRequest {
    file_base64: String,
    source_path: String,
}

#[derive(Debug, Clone, Deserialize)]
struct CadResponse {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

/// AutoCAD release for a DWG version magic (first six bytes of the file).
pub fn dwg_release(magic: &[u8]) -> Option<&'static str> {
    let release = match magic.get(..6)? {
        b"AC1009" => "AutoCAD R11/R12",
        b"AC1012" => "AutoCAD R13",
        b"AC1014" => "AutoCAD R14",
        b"AC1015" => "AutoCAD 2000",
        b"AC1018" => "AutoCAD 2004",
        b"AC1021" => "AutoCAD 2007",
        b"AC1024" => "AutoCAD 2010",
        b"AC1027" => "AutoCAD 2013",
        b"AC1032" => "AutoCAD 2018",
        _ => return None,
    };
    Some(release)
}

/// Drawings: converted by an external CAD service when one is configured.
/// Offline, PDF previews are read from their text layer and DWG files are
/// described from the file header.
pub struct CadConversionExtractor {
    client: Client,
    endpoint: Option<String>,
}

impl CadConversionExtractor {
    pub fn new(client: Client, endpoint: Option<String>) -> Self {
        Self { client, endpoint }
    }

    async fn convert(&self, endpoint: &str, path: &Path) -> Result<ExtractedContent, ExtractionError> {
        let bytes = tokio::fs::read(path).await?;
        let payload = CadRequest {
            file_base64: STANDARD.encode(bytes),
            source_path: path.to_string_lossy().to_string(),
        };

        let response = self.client.post(endpoint).json(&payload).send().await?;
        if !response.status().is_success() {
            return Err(ExtractionError::CadFailed(format!(
                "conversion request to {} returned {}",
                endpoint,
                response.status()
            )));
        }

        let converted: CadResponse = response.json().await?;
        let text = converted
            .text
            .or(converted.description)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| {
                ExtractionError::CadFailed(format!(
                    "conversion returned no description for {}",
                    path.display()
                ))
            })?;

        let mut content = ExtractedContent::new(text)
            .with_title(converted.title.unwrap_or_else(|| file_stem(path)));
        content.tags = converted
            .tags
            .unwrap_or_else(|| DRAWING_TAGS.iter().map(|tag| tag.to_string()).collect());
        Ok(content)
    }

    async fn describe_offline(&self, path: &Path) -> Result<ExtractedContent, ExtractionError> {
        let stem = file_stem(path);

        let text = if has_extension(path, "pdf") {
            read_text_layer(path).await?
        } else {
            let mut magic = [0u8; 6];
            let mut file = tokio::fs::File::open(path).await?;
            let read = file.read(&mut magic).await?;
            let format = dwg_release(&magic[..read]).unwrap_or("неизвестный формат");
            format!("Чертёж {stem}. Формат: {format}.")
        };

        Ok(ExtractedContent::new(text)
            .with_title(stem)
            .with_tags(&DRAWING_TAGS))
    }
}

#[async_trait]
impl ContentExtractor for CadConversionExtractor {
    async fn extract(&self, path: &Path) -> Result<ExtractedContent, ExtractionError> {
        match &self.endpoint {
            Some(endpoint) => self.convert(endpoint, path).await,
            None => self.describe_offline(path).await,
        }
    }
}
