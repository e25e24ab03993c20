use clap::Args;
use indexerator_exceptions::exception_events_schema;
use std::path::PathBuf;
use tracing::info;

#[derive(Args)]
pub struct SchemaCommand {
    /// Write the schema to this file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

impl SchemaCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        // `bq load --schema` expects the bare field list
        let schema = serde_json::to_string_pretty(&exception_events_schema().fields)?;

        match self.output {
            Some(path) => {
                std::fs::write(&path, format!("{}\n", schema))?;
                info!("Wrote exception_events schema to {}", path.display());
            }
            None => println!("{}", schema),
        }

        Ok(())
    }
}
