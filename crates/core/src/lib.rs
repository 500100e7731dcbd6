pub mod assembler;
pub mod catalog;
pub mod config;
pub mod demo;
pub mod embeddings;
pub mod error;
pub mod extractors;
pub mod identity;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod scanner;
pub mod store;
pub mod traits;

pub use assembler::{assemble_index, field_mappings, AssembledIndex, IndexManifest};
pub use catalog::{default_document_types, DocumentTypeSpec, ExtractionStrategy};
pub use config::{OcrConfig, OcrEndpointConfig, PipelineConfig};
pub use demo::{generate_demo_corpus, write_text_pdf, DemoConfig, DemoReport};
pub use embeddings::{CharacterNgramEmbedder, Embedder, DEFAULT_EMBEDDING_DIMENSIONS};
pub use error::{DocumentError, EmbeddingError, ExtractionError, IndexError, StoreError};
pub use extractors::{ContentExtractor, ExtractorSet};
pub use identity::{compute_checksum, derive_id};
pub use models::{DocumentStatus, ExtractedContent, IndexedDocument, ScannedFile, SourceFile};
pub use pipeline::{IndexPipeline, LogProgress, RunSummary};
pub use report::{DocumentOutcome, RunReport, RunStats};
pub use scanner::{scan_corpus, PopulationWarning, ScanReport};
pub use store::JsonDirectoryStore;
pub use traits::{BatchProgress, DocumentStore, ProgressSink};
