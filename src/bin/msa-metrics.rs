//! A binary to compute quality metrics for a directory of A3M alignments.
//!
//! ```shell
//! cargo run --release --bin=msa-metrics --features=binaries -- \
//!     --input-dir a3m/ --output metrics.tsv
//! ```
//!
//! NEff is computed with [`hhfilter`] when it can be found and with a greedy
//! in-process approximation otherwise.
//!
//! [`hhfilter`]: https://github.com/soedinglab/hh-suite

use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use clap::ArgAction;
use clap::Parser;
use clap_verbosity_flag::Verbosity;
use msabench::metrics;
use tracing_log::AsTrace as _;
use tracing_subscriber::EnvFilter;

/// Computes NEff, mean entropy, gap fraction and identity to the query for
/// every `*.a3m` file in a directory.
#[derive(Parser)]
struct Args {
    /// The directory holding the `*.a3m` files.
    #[arg(short, long)]
    input_dir: PathBuf,

    /// The path of the output table.
    #[arg(short, long)]
    output: PathBuf,

    /// The identity threshold (in percent) for NEff.
    #[arg(
        long,
        default_value_t = metrics::DEFAULT_ID_PERCENT,
        value_parser = clap::value_parser!(u8).range(0..=100),
    )]
    id_percent: u8,

    /// Whether `.` counts as a gap.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    dot_is_gap: bool,

    /// The `hhfilter` program to run.
    #[arg(long, default_value = metrics::filter::HHFILTER)]
    hhfilter: String,

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

    let config = metrics::Config {
        input_dir: args.input_dir,
        output: args.output,
        id_percent: args.id_percent,
        dot_is_gap: args.dot_is_gap,
        hhfilter: args.hhfilter,
    };

    metrics::run(&config).context("computing alignment metrics")?;

    Ok(())
}
