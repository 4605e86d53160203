//! A binary to clean monomeric protein mmCIF files for structure prediction
//! benchmarks.
//!
//! ```shell
//! cargo run --release --bin=clean-structures --features=binaries -- \
//!     --input_dir cif/ --output_dir cleaned/
//! ```
//!
//! Every `*.cif` (or `*.cif.gz`) file is either written to the output
//! directory with only its polymer chain or rejected. Each decision is
//! recorded in `clean_log.txt` within the output directory.

use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap_verbosity_flag::Verbosity;
use msabench::structure::clean;
use tracing::info;
use tracing_log::AsTrace as _;
use tracing_subscriber::EnvFilter;

/// Cleans monomeric protein mmCIFs for structure-prediction benchmarks.
#[derive(Parser)]
struct Args {
    /// The directory containing the `.cif` files.
    #[arg(short, long = "input_dir")]
    input_dir: PathBuf,

    /// The directory for the cleaned `.cif` files and the log.
    #[arg(short, long = "output_dir")]
    output_dir: PathBuf,

    /// The minimum fraction of the polymer sequence that must be modelled.
    #[arg(long, default_value_t = clean::DEFAULT_MIN_COVERAGE)]
    min_coverage: f64,

    /// The largest run of unmodelled residues allowed within the chain.
    #[arg(long, default_value_t = clean::DEFAULT_MAX_INTERNAL_GAP)]
    max_internal_gap: usize,

    #[command(flatten)]
    verbose: Verbosity,
}

fn main() -> Result<()> {
    let args = Args::parse();

    match std::env::var("RUST_LOG") {
        Ok(_) => tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .init(),
        Err(_) => tracing_subscriber::fmt()
            .with_max_level(args.verbose.log_level_filter().as_trace())
            .init(),
    };

    let config = clean::Config {
        input_dir: args.input_dir,
        output_dir: args.output_dir,
        thresholds: clean::Thresholds {
            min_coverage: args.min_coverage,
            max_internal_gap: args.max_internal_gap,
        },
    };

    let summary = clean::run(&config).context("cleaning structures")?;
    info!(
        "accepted {} structures, rejected {}",
        summary.accepted, summary.rejected
    );

    Ok(())
}
