use chrono::Utc;
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args, Parser, Subcommand};
use corpus_index_core::config::{
    non_empty, parse_languages, DEFAULT_BATCH_SIZE, DEFAULT_ELASTIC_HOST, DEFAULT_INDEX_NAME,
    DEFAULT_MAX_FILE_SIZE_MB,
};
use corpus_index_core::{
    generate_demo_corpus, CharacterNgramEmbedder, DemoConfig, ExtractorSet, IndexPipeline,
    JsonDirectoryStore, LogProgress, OcrConfig, OcrEndpointConfig, PipelineConfig,
    DEFAULT_EMBEDDING_DIMENSIONS,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "corpus-index", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the document tree and write the offline index.
    Build(BuildArgs),
    /// Write a synthetic document tree for demos.
    Demo {
        /// Directory the typed subfolders are created in.
        #[arg(long, env = "DOCS_INPUT_DIR", default_value = "./data/documents")]
        output: PathBuf,
        /// Divides the per-type document counts.
        #[arg(long, default_value = "1")]
        scale: usize,
    },
}

#[derive(Args)]
struct BuildArgs {
    /// Root of the document tree.
    #[arg(long, env = "DOCS_INPUT_DIR", default_value = "./data/documents")]
    input_dir: PathBuf,

    /// Directory for per-document records, index.json and stats.json.
    #[arg(long, env = "INDEX_OUTPUT_DIR", default_value = "./data/index")]
    output_dir: PathBuf,

    /// Search engine endpoint recorded in the manifest.
    #[arg(long, env = "ELASTIC_HOST", default_value = DEFAULT_ELASTIC_HOST)]
    elastic_host: String,

    /// Index name recorded in the manifest.
    #[arg(long, env = "ELASTIC_INDEX", default_value = DEFAULT_INDEX_NAME)]
    index_name: String,

    #[arg(long, env = "INDEX_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    #[arg(long, env = "INDEX_MAX_FILE_SIZE_MB", default_value_t = DEFAULT_MAX_FILE_SIZE_MB)]
    max_file_size_mb: u64,

    /// Per-document deadline in seconds.
    #[arg(
        long,
        env = "INDEX_DOCUMENT_TIMEOUT_SECS",
        default_value = "120",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    document_timeout_secs: u64,

    #[arg(
        long,
        env = "OCR_ENABLED",
        default_value = "true",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    ocr_enabled: bool,

    /// Comma separated OCR language codes.
    #[arg(long, env = "OCR_LANGUAGES", default_value = "rus,eng")]
    ocr_languages: String,

    #[arg(long, env = "OCR_ENDPOINT")]
    ocr_endpoint: Option<String>,

    #[arg(long, env = "OCR_API_KEY", hide_env_values = true)]
    ocr_api_key: Option<String>,

    #[arg(long, env = "CAD_CONVERTER_ENDPOINT")]
    cad_endpoint: Option<String>,
}

impl BuildArgs {
    fn into_config(self) -> PipelineConfig {
        let service = non_empty(self.ocr_endpoint).map(|endpoint| OcrEndpointConfig {
            endpoint,
            api_key: non_empty(self.ocr_api_key),
        });

        PipelineConfig {
            input_dir: self.input_dir,
            output_dir: self.output_dir,
            elastic_host: self.elastic_host,
            index_name: self.index_name,
            batch_size: self.batch_size,
            max_file_size_mb: self.max_file_size_mb,
            document_timeout: Duration::from_secs(self.document_timeout_secs),
            embedding_dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
            ocr: OcrConfig {
                enabled: self.ocr_enabled,
                languages: parse_languages(&self.ocr_languages),
                service,
            },
            cad_endpoint: non_empty(self.cad_endpoint),
            ..PipelineConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "corpus-index boot"
    );

    match cli.command {
        Command::Build(args) => {
            let config = args.into_config();
            let extractors = ExtractorSet::from_config(&config);
            let store = JsonDirectoryStore::new(config.documents_dir());
            let pipeline =
                IndexPipeline::new(config, extractors, CharacterNgramEmbedder::default(), store);

            let summary = pipeline.run(&LogProgress).await?;
            for warning in &summary.warnings {
                println!(
                    "warning: {} has {} of {} expected documents",
                    warning.label, warning.found, warning.expected
                );
            }

            println!("{}", summary.report);
            match &summary.index {
                Some(index) => println!(
                    "index {} ready with {} documents",
                    index.manifest.index, index.manifest.documents_count
                ),
                None => println!("index manifest was not written"),
            }
        }
        Command::Demo { output, scale } => {
            let config = DemoConfig {
                output_dir: output,
                scale,
                ..DemoConfig::default()
            };
            let report = tokio::task::spawn_blocking(move || generate_demo_corpus(&config)).await??;
            for (type_id, count) in &report.by_type {
                println!("{type_id}: {count}");
            }
            println!("{} demo documents written", report.total_documents);
        }
    }

    Ok(())
}
