use clap::Args;
use colored::Colorize;
use indexerator_core::{ErrorPolicy, IndexingConfig, EXCEPTION_DATA_MARKER};
use indexerator_exceptions::ExceptionEventsIndexer;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Args)]
pub struct IndexCommand {
    /// Newline-delimited build event files to read
    #[arg(
        long = "input",
        short = 'i',
        required = true,
        num_args = 1..,
        env = "INDEXERATOR_INPUT",
        value_delimiter = ','
    )]
    pub inputs: Vec<PathBuf>,

    /// File receiving one flattened exception record per line
    #[arg(long, short = 'o', env = "INDEXERATOR_OUTPUT")]
    pub output: PathBuf,

    /// Substring identifying exception-bearing lines
    #[arg(long, env = "INDEXERATOR_EVENT_TYPE_MARKER", default_value = EXCEPTION_DATA_MARKER)]
    pub marker: String,

    /// Maximum number of files transformed at the same time
    #[arg(long, env = "INDEXERATOR_MAX_CONCURRENT_FILES")]
    pub max_concurrent_files: Option<usize>,

    /// What to do with an envelope that cannot be transformed: fail or skip
    #[arg(long, env = "INDEXERATOR_ON_ERROR", default_value = "fail")]
    pub on_error: ErrorPolicy,
}

impl IndexCommand {
    fn into_config(self) -> IndexingConfig {
        let mut config = IndexingConfig::new(self.inputs, self.output)
            .with_event_type_marker(self.marker)
            .with_error_policy(self.on_error);
        if let Some(max_concurrent_files) = self.max_concurrent_files {
            config = config.with_max_concurrent_files(max_concurrent_files);
        }
        config
    }

    pub fn execute(self) -> anyhow::Result<()> {
        let config = self.into_config();
        config.validate()?;

        info!(
            "Indexing {} files into {} (on error: {})",
            config.inputs.len(),
            config.output.display(),
            config.error_policy
        );
        debug!("Indexing config: {:?}", config);

        let rt = tokio::runtime::Runtime::new()?;
        let indexer = ExceptionEventsIndexer::from_config(&config);
        let report = rt.block_on(indexer.run(&config))?;

        println!(
            "{} {} records from {} envelopes ({} files)",
            "✅ Indexed".bright_green().bold(),
            report.records.to_string().bright_white().bold(),
            report.envelopes,
            report.files
        );
        if report.skipped_envelopes > 0 {
            println!(
                "{} {} envelopes could not be transformed and were skipped",
                "⚠️ ".bright_yellow(),
                report.skipped_envelopes.to_string().bright_yellow().bold()
            );
        }
        println!("{} {}", "Output:".bright_white().bold(), config.output.display());

        Ok(())
    }
}
