//! Batch driver: scan → extract → embed → persist → assemble → report.

use crate::assembler::{assemble_index, AssembledIndex};
use crate::config::PipelineConfig;
use crate::embeddings::Embedder;
use crate::error::{DocumentError, IndexError};
use crate::extractors::ExtractorSet;
use crate::identity::{compute_checksum, derive_id};
use crate::models::{IndexedDocument, ScannedFile, SourceFile};
use crate::report::{DocumentOutcome, RunReport, RunStats};
use crate::scanner::{scan_corpus, PopulationWarning};
use crate::traits::{BatchProgress, DocumentStore, ProgressSink};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Logs batch progress through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&self, progress: BatchProgress) {
        info!(
            batch = progress.batch,
            batches = progress.batches,
            documents = progress.documents,
            percent = progress.percent,
            "batch complete"
        );
    }
}

pub fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((completed as f64 / total as f64) * 100.0).round() as u8
}

#[derive(Debug)]
pub struct RunSummary {
    pub scanned: usize,
    pub warnings: Vec<PopulationWarning>,
    pub report: RunReport,
    /// `None` when the manifest could not be written.
    pub index: Option<AssembledIndex>,
}

pub struct IndexPipeline<E, S>
where
    E: Embedder,
    S: DocumentStore,
{
    config: PipelineConfig,
    extractors: ExtractorSet,
    embedder: E,
    store: S,
}

impl<E, S> IndexPipeline<E, S>
where
    E: Embedder,
    S: DocumentStore,
{
    pub fn new(config: PipelineConfig, extractors: ExtractorSet, embedder: E, store: S) -> Self {
        Self {
            config,
            extractors,
            embedder,
            store,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn run(&self, progress: &dyn ProgressSink) -> Result<RunSummary, IndexError> {
        let mut stats = RunStats::start();
        self.config.validate()?;
        if self.embedder.dimensions() != self.config.embedding_dimensions {
            return Err(IndexError::InvalidConfig(format!(
                "embedder produces {} dimensions, schema requires {}",
                self.embedder.dimensions(),
                self.config.embedding_dimensions
            )));
        }

        let input_root = resolve_input_root(&self.config.input_dir)?;
        info!(input = %input_root.display(), "input directory");
        prepare_output(&self.config.output_dir)?;
        self.store.prepare().await?;

        let scan = scan_corpus(&input_root, &self.config.document_types)?;
        info!(documents = scan.files.len(), "documents found for indexing");

        self.process_batches(&scan.files, &mut stats, progress).await;

        let index = match assemble_index(&self.store, &self.config).await {
            Ok(index) => Some(index),
            Err(error) => {
                warn!(error = %error, "index manifest not written");
                None
            }
        };

        let report = stats.finish();
        if let Err(error) = report.persist(&self.config.stats_path()).await {
            warn!(error = %error, "run stats not written");
        }
        info!(
            processed = report.processed,
            skipped = report.skipped,
            errors = report.errors,
            duration = %report.duration_human,
            documents_per_second = report.documents_per_second,
            "indexing finished"
        );

        Ok(RunSummary {
            scanned: scan.files.len(),
            warnings: scan.warnings,
            report,
            index,
        })
    }

    /// Sequential batches; every document of a batch runs concurrently and
    /// the next batch starts only after all of them resolved.
    pub async fn process_batches(
        &self,
        files: &[ScannedFile<'_>],
        stats: &mut RunStats,
        progress: &dyn ProgressSink,
    ) {
        let batches = files.len().div_ceil(self.config.batch_size);

        for (index, batch) in files.chunks(self.config.batch_size).enumerate() {
            debug!(batch = index + 1, batches, size = batch.len(), "starting batch");

            let outcomes = join_all(batch.iter().map(|file| self.run_document(file))).await;
            for outcome in &outcomes {
                stats.record(outcome);
            }

            progress.report(BatchProgress {
                batch: index + 1,
                batches,
                documents: batch.len(),
                percent: progress_percent(index + 1, batches),
            });
        }
    }

    /// The deadline covers stat, extraction, embedding and checksum. The
    /// store write runs after it, so a record on disk is always counted.
    async fn run_document(&self, file: &ScannedFile<'_>) -> DocumentOutcome {
        let deadline = self.config.document_timeout;
        let prepared = match tokio::time::timeout(deadline, self.prepare_document(file)).await {
            Ok(prepared) => prepared,
            Err(_) => Err(DocumentError::Timeout(deadline)),
        };

        let result = match prepared {
            Ok(Prepared::Skipped { size }) => Ok(DocumentOutcome::Skipped { size }),
            Ok(Prepared::Ready(document)) => {
                let persisted = self.store.persist(&document).await;
                persisted
                    .map(|()| DocumentOutcome::Indexed { id: document.id })
                    .map_err(DocumentError::from)
            }
            Err(document_error) => Err(document_error),
        };

        match result {
            Ok(outcome) => outcome,
            Err(document_error) => {
                error!(
                    path = %file.path.display(),
                    type_id = %file.spec.id,
                    strategy = %file.spec.strategy,
                    error = %document_error,
                    "document failed"
                );
                DocumentOutcome::Failed {
                    error: document_error.to_string(),
                }
            }
        }
    }

    async fn prepare_document(&self, file: &ScannedFile<'_>) -> Result<Prepared, DocumentError> {
        let metadata = tokio::fs::metadata(&file.path).await?;
        let size = metadata.len();
        if size > self.config.max_file_size_bytes() {
            debug!(path = %file.path.display(), size, "skipping oversized file");
            return Ok(Prepared::Skipped { size });
        }

        let modified: DateTime<Utc> = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        let source = SourceFile {
            path: file.path.clone(),
            size,
            modified,
        };

        let content = self.extractors.extract(file.spec.strategy, &file.path).await?;
        let embedding = self.embedder.embed(&content.text).await?;
        if embedding.len() != self.config.embedding_dimensions {
            return Err(DocumentError::EmbeddingDimensions {
                expected: self.config.embedding_dimensions,
                actual: embedding.len(),
            });
        }

        let checksum = compute_checksum(&file.path).await?;
        Ok(Prepared::Ready(IndexedDocument::assemble(
            derive_id(&file.path),
            &source,
            &file.spec.id,
            content,
            embedding,
            checksum,
        )))
    }
}

enum Prepared {
    Skipped { size: u64 },
    Ready(IndexedDocument),
}

/// Canonical input root; a missing directory aborts the run.
fn resolve_input_root(input_dir: &Path) -> Result<PathBuf, IndexError> {
    let root = std::fs::canonicalize(input_dir)
        .map_err(|_| IndexError::InputMissing(input_dir.to_path_buf()))?;
    if !root.is_dir() {
        return Err(IndexError::InputMissing(input_dir.to_path_buf()));
    }
    Ok(root)
}

fn prepare_output(output_dir: &Path) -> Result<(), IndexError> {
    std::fs::create_dir_all(output_dir).map_err(|source| IndexError::OutputDir {
        path: output_dir.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{default_document_types, DocumentTypeSpec, ExtractionStrategy};
    use crate::embeddings::CharacterNgramEmbedder;
    use crate::error::{EmbeddingError, ExtractionError};
    use crate::extractors::{ContentExtractor, MarkdownExtractor};
    use crate::models::ExtractedContent;
    use crate::store::JsonDirectoryStore;
    use async_trait::async_trait;
    use std::fs;
    use crate::error::StoreError;
    use crate::models::IndexedDocument;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};
    use tempfile::{tempdir, TempDir};

    #[derive(Default)]
    struct Recorder(Mutex<Vec<BatchProgress>>);

    impl ProgressSink for Recorder {
        fn report(&self, progress: BatchProgress) {
            self.0.lock().unwrap().push(progress);
        }
    }

    struct FailOn(&'static str);

    #[async_trait]
    impl ContentExtractor for FailOn {
        async fn extract(&self, path: &Path) -> Result<ExtractedContent, ExtractionError> {
            let name = path.file_name().unwrap_or_default().to_string_lossy();
            if name.contains(self.0) {
                return Err(ExtractionError::PdfParse("forced failure".to_string()));
            }
            MarkdownExtractor.extract(path).await
        }
    }

    struct Hang;

    #[async_trait]
    impl ContentExtractor for Hang {
        async fn extract(&self, _path: &Path) -> Result<ExtractedContent, ExtractionError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(ExtractedContent::new("late"))
        }
    }

    struct ShortEmbedder;

    #[async_trait]
    impl Embedder for ShortEmbedder {
        fn dimensions(&self) -> usize {
            8
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vec![0.0; 3])
        }
    }

    struct SlowStore(JsonDirectoryStore);

    #[async_trait]
    impl DocumentStore for SlowStore {
        async fn prepare(&self) -> Result<(), StoreError> {
            self.0.prepare().await
        }

        async fn persist(&self, document: &IndexedDocument) -> Result<(), StoreError> {
            tokio::time::sleep(Duration::from_millis(600)).await;
            self.0.persist(document).await
        }

        async fn load_all(&self) -> Result<Vec<IndexedDocument>, StoreError> {
            self.0.load_all().await
        }
    }

    struct Fixture {
        _dir: TempDir,
        input: PathBuf,
        output: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempdir().unwrap();
            let input = dir.path().join("corpus");
            let output = dir.path().join("index");
            fs::create_dir_all(&input).unwrap();
            Self {
                _dir: dir,
                input,
                output,
            }
        }

        fn write(&self, relative: &str, body: &[u8]) {
            let path = self.input.join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }

        fn config(&self) -> PipelineConfig {
            PipelineConfig {
                input_dir: self.input.clone(),
                output_dir: self.output.clone(),
                document_types: vec![DocumentTypeSpec::new(
                    "incidents",
                    "Инциденты/отчёты",
                    &["**/*.md"],
                    0,
                    ExtractionStrategy::Markdown,
                )],
                ..PipelineConfig::default()
            }
        }
    }

    fn pipeline(
        config: PipelineConfig,
        extractors: ExtractorSet,
    ) -> IndexPipeline<CharacterNgramEmbedder, JsonDirectoryStore> {
        let store = JsonDirectoryStore::new(config.documents_dir());
        IndexPipeline::new(config, extractors, CharacterNgramEmbedder::default(), store)
    }

    #[test]
    fn percent_is_rounded() {
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(3, 3), 100);
        assert_eq!(progress_percent(0, 0), 100);
    }

    #[tokio::test]
    async fn markdown_incident_becomes_indexed_document() -> Result<(), Box<dyn std::error::Error>> {
        let fixture = Fixture::new();
        fixture.write("incidents/incident-2026-001.md", "# Отчёт об инциденте\nbody text".as_bytes());

        let config = PipelineConfig {
            document_types: default_document_types(),
            ..fixture.config()
        };
        let pipeline = pipeline(config, ExtractorSet::default());
        let summary = pipeline.run(&LogProgress).await?;

        assert_eq!(summary.report.processed, 1);
        assert_eq!(summary.report.errors, 0);

        let documents = pipeline.store().load_all().await?;
        assert_eq!(documents.len(), 1);
        let document = &documents[0];
        assert_eq!(document.title, "Отчёт об инциденте");
        assert_eq!(document.content, "# Отчёт об инциденте\nbody text");
        assert_eq!(document.doc_type, "incidents");
        assert_eq!(document.embedding.len(), 384);
        assert!(!document.checksum.is_empty());

        let canonical = fs::canonicalize(fixture.input.join("incidents/incident-2026-001.md"))?;
        assert_eq!(document.id, derive_id(&canonical));

        let index = summary.index.expect("manifest should be written");
        assert_eq!(index.manifest.documents_count, 1);
        assert!(fixture.output.join("index.json").is_file());
        assert!(fixture.output.join("stats.json").is_file());
        Ok(())
    }

    #[tokio::test]
    async fn five_files_in_batches_of_two_report_three_times() -> Result<(), Box<dyn std::error::Error>> {
        let fixture = Fixture::new();
        for index in 0..5 {
            fixture.write(&format!("incident-{index}.md"), b"# t\nbody");
        }

        let config = PipelineConfig {
            batch_size: 2,
            ..fixture.config()
        };
        let recorder = Recorder::default();
        let summary = pipeline(config, ExtractorSet::default()).run(&recorder).await?;

        let reports = recorder.0.lock().unwrap().clone();
        let sizes: Vec<_> = reports.iter().map(|report| report.documents).collect();
        let percents: Vec<_> = reports.iter().map(|report| report.percent).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(percents, vec![33, 67, 100]);
        assert!(reports.iter().all(|report| report.batches == 3));
        assert_eq!(summary.report.processed, 5);
        Ok(())
    }

    #[tokio::test]
    async fn oversized_file_is_skipped_without_record() -> Result<(), Box<dyn std::error::Error>> {
        let fixture = Fixture::new();
        fixture.write("incident-big.md", &vec![b'a'; 1024 * 1024 + 1]);
        fixture.write("incident-small.md", b"# small\n");

        let config = PipelineConfig {
            max_file_size_mb: 1,
            ..fixture.config()
        };
        let pipeline = pipeline(config, ExtractorSet::default());
        let summary = pipeline.run(&LogProgress).await?;

        assert_eq!(summary.report.skipped, 1);
        assert_eq!(summary.report.processed, 1);
        assert_eq!(summary.report.errors, 0);
        let titles: Vec<_> = pipeline
            .store()
            .load_all()
            .await?
            .into_iter()
            .map(|doc| doc.title)
            .collect();
        assert_eq!(titles, vec!["small"]);
        Ok(())
    }

    #[tokio::test]
    async fn one_failing_document_does_not_stop_its_batch() -> Result<(), Box<dyn std::error::Error>> {
        let fixture = Fixture::new();
        for name in ["incident-a.md", "incident-bad.md", "incident-c.md", "incident-d.md"] {
            fixture.write(name, b"# ok\n");
        }

        let config = PipelineConfig {
            batch_size: 4,
            ..fixture.config()
        };
        let extractors =
            ExtractorSet::default().with_extractor(ExtractionStrategy::Markdown, Box::new(FailOn("bad")));
        let pipeline = pipeline(config, extractors);
        let summary = pipeline.run(&LogProgress).await?;

        assert_eq!(summary.report.processed, 3);
        assert_eq!(summary.report.errors, 1);
        assert_eq!(summary.report.skipped, 0);
        assert_eq!(pipeline.store().load_all().await?.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn rerun_yields_same_ids_and_count() -> Result<(), Box<dyn std::error::Error>> {
        let fixture = Fixture::new();
        fixture.write("a/incident-1.md", b"# one\n");
        fixture.write("b/incident-2.md", b"# two\n");

        let first = pipeline(fixture.config(), ExtractorSet::default())
            .run(&LogProgress)
            .await?
            .index
            .expect("first manifest");
        let second = pipeline(fixture.config(), ExtractorSet::default())
            .run(&LogProgress)
            .await?
            .index
            .expect("second manifest");

        assert_eq!(first.document_ids, second.document_ids);
        assert_eq!(first.manifest.documents_count, 2);
        assert_eq!(second.manifest.documents_count, 2);
        Ok(())
    }

    #[tokio::test]
    async fn hung_extraction_times_out_as_error() -> Result<(), Box<dyn std::error::Error>> {
        let fixture = Fixture::new();
        fixture.write("incident-1.md", b"# slow\n");

        let config = PipelineConfig {
            document_timeout: Duration::from_millis(50),
            ..fixture.config()
        };
        let extractors =
            ExtractorSet::default().with_extractor(ExtractionStrategy::Markdown, Box::new(Hang));
        let summary = pipeline(config, extractors).run(&LogProgress).await?;

        assert_eq!(summary.report.errors, 1);
        assert_eq!(summary.report.processed, 0);
        Ok(())
    }

    #[tokio::test]
    async fn wrong_embedding_length_is_a_document_error() -> Result<(), Box<dyn std::error::Error>> {
        let fixture = Fixture::new();
        fixture.write("incident-1.md", b"# one\n");

        let config = PipelineConfig {
            embedding_dimensions: 8,
            ..fixture.config()
        };
        let store = JsonDirectoryStore::new(config.documents_dir());
        let pipeline = IndexPipeline::new(config, ExtractorSet::default(), ShortEmbedder, store);
        let summary = pipeline.run(&LogProgress).await?;

        assert_eq!(summary.report.errors, 1);
        assert!(pipeline.store().load_all().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn missing_input_directory_is_fatal() {
        let fixture = Fixture::new();
        let config = PipelineConfig {
            input_dir: fixture.input.join("absent"),
            ..fixture.config()
        };

        let result = pipeline(config, ExtractorSet::default()).run(&LogProgress).await;
        assert!(matches!(result, Err(IndexError::InputMissing(_))));
        assert!(!fixture.output.exists());
    }

    #[tokio::test]
    async fn embedder_and_schema_dimensions_must_agree() {
        let fixture = Fixture::new();
        let store = JsonDirectoryStore::new(fixture.config().documents_dir());
        let pipeline = IndexPipeline::new(fixture.config(), ExtractorSet::default(), ShortEmbedder, store);

        let result = pipeline.run(&LogProgress).await;
        assert!(matches!(result, Err(IndexError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn large_document_embedding_does_not_outlive_deadline() -> Result<(), Box<dyn std::error::Error>> {
        let fixture = Fixture::new();
        let mut body = b"# big\n".to_vec();
        body.extend(b"pressure regulator station ".repeat(240_000));
        fixture.write("incident-big.md", &body);
        fixture.write("incident-small.md", b"# small\n");

        let config = PipelineConfig {
            document_timeout: Duration::from_millis(100),
            ..fixture.config()
        };
        let pipeline = pipeline(config, ExtractorSet::default());
        let started = Instant::now();
        let summary = pipeline.run(&LogProgress).await?;
        let elapsed = started.elapsed();

        assert_eq!(summary.report.processed, 1);
        assert_eq!(summary.report.errors, 1);
        assert!(elapsed < Duration::from_secs(2), "run took {elapsed:?}");
        Ok(())
    }

    #[tokio::test]
    async fn store_write_is_not_cut_off_by_deadline() -> Result<(), Box<dyn std::error::Error>> {
        let fixture = Fixture::new();
        fixture.write("incident-1.md", b"# one\n");

        let config = PipelineConfig {
            document_timeout: Duration::from_millis(300),
            ..fixture.config()
        };
        let store = SlowStore(JsonDirectoryStore::new(config.documents_dir()));
        let pipeline =
            IndexPipeline::new(config, ExtractorSet::default(), CharacterNgramEmbedder::default(), store);
        let summary = pipeline.run(&LogProgress).await?;

        assert_eq!(summary.report.processed, 1);
        assert_eq!(summary.report.errors, 0);
        assert_eq!(pipeline.store().load_all().await?.len(), 1);
        assert_eq!(summary.index.map(|index| index.manifest.documents_count), Some(1));
        Ok(())
    }

    #[tokio::test]
    async fn unwritable_manifest_and_stats_keep_run_alive() -> Result<(), Box<dyn std::error::Error>> {
        let fixture = Fixture::new();
        fixture.write("incident-1.md", b"# one\n");
        fixture.write("incident-2.md", b"# two\n");
        fs::create_dir_all(fixture.output.join("index.json"))?;
        fs::create_dir_all(fixture.output.join("stats.json"))?;

        let pipeline = pipeline(fixture.config(), ExtractorSet::default());
        let summary = pipeline.run(&LogProgress).await?;

        assert!(summary.index.is_none());
        assert_eq!(summary.report.processed, 2);
        assert_eq!(summary.report.errors, 0);
        assert_eq!(pipeline.store().load_all().await?.len(), 2);
        assert!(fixture.output.join("stats.json").is_dir());
        Ok(())
    }
}
