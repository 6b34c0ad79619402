//! IMD ETL command line
//!
//! ```bash
//! imd-etl                 # IMD workbooks only
//! imd-etl imd             # IMD workbooks only
//! imd-etl lookup          # lookup files only
//! imd-etl all             # both pipelines
//! imd-etl --root ./data   # read Raw/ and write Processed/ under ./data
//! ```
//!
//! Log verbosity follows `RUST_LOG` and defaults to `info`.
use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use imd_etl::ImdConfig;
use imd_etl::ImdPipeline;
use imd_etl::LookupConfig;
use imd_etl::LookupPipeline;
use std::path::Path;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "imd-etl")]
#[command(about = "Reshape IMD workbooks and geographic lookups into database-ready CSV", long_about = None)]
struct Cli {
    /// Project root holding the Raw/ and Processed/ directories
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Reshape the IMD workbooks into EAV CSV files
    Imd,
    /// Build the master lookup and bridge tables
    Lookup,
    /// Run the IMD pipeline, then the lookup pipeline
    All,
}

fn main() -> Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Commands::Imd) {
        Commands::Imd => run_imd(&cli.root),
        Commands::Lookup => run_lookup(&cli.root),
        Commands::All => {
            run_imd(&cli.root)?;
            run_lookup(&cli.root)
        }
    }
}

fn run_imd(root: &Path) -> Result<()> {
    let pipeline = ImdPipeline::new(ImdConfig::with_root(root)).context("invalid IMD configuration")?;
    let written = pipeline
        .run()
        .with_context(|| format!("IMD pipeline failed for {}", pipeline.config().input_dir.display()))?;
    info!("IMD pipeline wrote {} files", written.len());
    Ok(())
}

fn run_lookup(root: &Path) -> Result<()> {
    let pipeline = LookupPipeline::new(LookupConfig::with_root(root)).context("invalid lookup configuration")?;
    let written = pipeline
        .run()
        .with_context(|| format!("lookup pipeline failed for {}", pipeline.config().input_dir.display()))?;
    info!("Lookup pipeline wrote {} files", written.len());
    Ok(())
}
