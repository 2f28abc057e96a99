//! Prints aggregate statistics of a finished harvest
//!
//! Reads `<prefix>_Complete_Index.json` and prints counts per session,
//! field coverage and the most frequent institutions.

use clap::Parser;
use conference_harvester::config::{load_config, Config};
use conference_harvester::output::{load_index, print_statistics, IndexStatistics};
use conference_harvester::storage::OutputLayout;
use std::path::PathBuf;

/// Analyze the master index of a harvest
#[derive(Parser, Debug)]
#[command(name = "analyze-results")]
#[command(version)]
#[command(about = "Print statistics of a harvest's master index", long_about = None)]
struct Cli {
    /// Path to the master index JSON (overrides --config/--output-dir)
    #[arg(short, long, value_name = "FILE")]
    index: Option<PathBuf>,

    /// Configuration file of the run, used to locate its output
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Output directory of the run
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let index_path = match cli.index {
        Some(path) => path,
        None => {
            let mut config = match &cli.config {
                Some(path) => load_config(path)?,
                None => Config::default(),
            };
            if let Some(dir) = cli.output_dir {
                config.output.output_dir = dir;
            }
            OutputLayout::new(
                config.output.output_dir.clone(),
                config.output.resolved_prefix(),
            )
            .index_path()
        }
    };

    println!("Index: {}\n", index_path.display());

    let index = load_index(&index_path)?;
    let stats = IndexStatistics::from_index(&index);
    print_statistics(&stats);

    Ok(())
}
