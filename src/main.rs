//! songplays-etl CLI
//!
//! Single entry point: loads credentials from `dl.yaml`, runs the job against
//! the fixed locations and prints the run summary as one JSON line.

use clap::Parser;
use songplays_etl::config::{Credentials, JobConfig, CONFIG_FILE};
use songplays_etl::{Pipeline, Result};

/// Build the songplays star schema from song metadata and event logs
#[derive(Parser, Debug)]
#[command(name = "songplays-etl")]
#[command(author, version, about, long_about = None)]
struct Cli {}

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries the summary
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let _cli = Cli::parse();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let loaded = Credentials::from_file(CONFIG_FILE)?;
    let config = JobConfig::default_locations(loaded);
    let summary = Pipeline::new(config).run().await?;
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}
