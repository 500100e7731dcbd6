use crate::error::IndexError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// File extensions the scanner looks at. Everything else is ignored.
pub const RECOGNIZED_EXTENSIONS: [&str; 4] = ["pdf", "dwg", "md", "docx"];

/// Share of `expected_count` below which a type is reported as under-populated.
pub const UNDER_POPULATION_RATIO: f64 = 0.5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ExtractionStrategy {
    #[serde(rename = "pdf_ocr")]
    PdfOcr,
    #[serde(rename = "pdf_text")]
    PdfText,
    #[serde(rename = "dwg_to_pdf")]
    CadConversion,
    #[serde(rename = "markdown")]
    Markdown,
}

impl ExtractionStrategy {
    pub const ALL: [ExtractionStrategy; 4] = [
        ExtractionStrategy::PdfOcr,
        ExtractionStrategy::PdfText,
        ExtractionStrategy::CadConversion,
        ExtractionStrategy::Markdown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionStrategy::PdfOcr => "pdf_ocr",
            ExtractionStrategy::PdfText => "pdf_text",
            ExtractionStrategy::CadConversion => "dwg_to_pdf",
            ExtractionStrategy::Markdown => "markdown",
        }
    }
}

impl fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractionStrategy {
    type Err = IndexError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == value)
            .ok_or_else(|| IndexError::UnknownStrategy(value.to_string()))
    }
}

/// One entry of the document type catalog. The catalog order is the
/// classification precedence: a file belongs to the first type that matches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentTypeSpec {
    pub id: String,
    pub label: String,
    pub patterns: Vec<String>,
    pub expected_count: usize,
    pub strategy: ExtractionStrategy,
}

impl DocumentTypeSpec {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        patterns: &[&str],
        expected_count: usize,
        strategy: ExtractionStrategy,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            patterns: patterns.iter().map(|pattern| pattern.to_string()).collect(),
            expected_count,
            strategy,
        }
    }

    /// Builds a spec from a strategy name as it appears in configuration files.
    pub fn with_strategy_name(
        id: impl Into<String>,
        label: impl Into<String>,
        patterns: &[&str],
        expected_count: usize,
        strategy: &str,
    ) -> Result<Self, IndexError> {
        Ok(Self::new(id, label, patterns, expected_count, strategy.parse()?))
    }

    pub fn is_under_populated(&self, found: usize) -> bool {
        (found as f64) < self.expected_count as f64 * UNDER_POPULATION_RATIO
    }
}

/// Reference catalog for the oil & gas engineering corpus.
///
/// `drawings` matches every PDF and DWG, so it sits last and only picks up
/// files no narrower type claimed.
pub fn default_document_types() -> Vec<DocumentTypeSpec> {
    vec![
        DocumentTypeSpec::new(
            "standards",
            "Нормативы (СП/ГОСТ)",
            &["**/*СП*.pdf", "**/*ГОСТ*.pdf", "**/SP*.pdf", "**/GOST*.pdf"],
            300,
            ExtractionStrategy::PdfOcr,
        ),
        DocumentTypeSpec::new(
            "regulations",
            "Тех. регламенты",
            &["**/регламент*.pdf", "**/regulation*.pdf", "**/*РТП*.pdf"],
            200,
            ExtractionStrategy::PdfText,
        ),
        DocumentTypeSpec::new(
            "maintenance",
            "Руководства по ТОиР",
            &["**/maintenance*.pdf", "**/то*.pdf", "**/repair*.pdf"],
            250,
            ExtractionStrategy::PdfOcr,
        ),
        DocumentTypeSpec::new(
            "incidents",
            "Инциденты/отчёты",
            &["**/incident*.md", "**/report*.md", "**/отчет*.md"],
            150,
            ExtractionStrategy::Markdown,
        ),
        DocumentTypeSpec::new(
            "drawings",
            "Чертежи",
            &["**/*.dwg", "**/*.pdf"],
            100,
            ExtractionStrategy::CadConversion,
        ),
    ]
}
