mod commands;

use clap::{Args, Parser, Subcommand};
use commands::route::route_command;
use commands::track::track_command;
use std::error::Error;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gpxstats", about = "Statistics for GPX routes and tracks")]
struct Cli {
    /// Log ingestion decisions to stderr (RUST_LOG overrides this)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Summarise the <rte> of a GPX document: lengths, height gain and gradients")]
    Route(DocumentArgs),

    #[command(
        about = "Summarise the <trk> of a GPX document: route statistics plus times and speeds"
    )]
    Track(DocumentArgs),
}

#[derive(Args)]
pub struct DocumentArgs {
    /// GPX file to read; stdin when omitted or "-"
    pub file: Option<PathBuf>,

    /// Distance in metres below which consecutive points are one stop
    #[arg(short, long, default_value_t = 5.0)]
    pub granularity: f64,

    /// Print the ingestion log before the statistics
    #[arg(long)]
    pub report: bool,

    /// Also print where the stop with this name is and how often it is visited
    #[arg(long, value_name = "NAME")]
    pub lookup: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Commands::Route(args) => route_command(&args),
        Commands::Track(args) => track_command(&args),
    }
}
