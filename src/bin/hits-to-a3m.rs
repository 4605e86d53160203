//! A binary to convert tabular search hits into one A3M alignment per query.
//!
//! ```shell
//! cargo run --release --bin=hits-to-a3m --features=binaries -- \
//!     --fasta queries.fasta --hits hits.tsv --out a3m/
//! ```
//!
//! Each line of the hits file holds `query_id subject cigar q_start s_start
//! subject_header`, whitespace-separated, with any further fields ignored.

use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap_verbosity_flag::Verbosity;
use msabench::convert;
use tracing::info;
use tracing_log::AsTrace as _;
use tracing_subscriber::EnvFilter;

/// Converts CIGAR-encoded search hits into per-query A3M alignments.
#[derive(Parser)]
struct Args {
    /// The FASTA file holding the query sequences.
    #[arg(long)]
    fasta: PathBuf,

    /// The tabular hits file.
    #[arg(long)]
    hits: PathBuf,

    /// The directory to write the `<query>.a3m` files into.
    #[arg(long)]
    out: PathBuf,

    /// Whether to name outputs by the accession of `db|ACCESSION|NAME` query
    /// ids.
    #[arg(long, default_value_t = false)]
    uniprot_names: bool,

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

    let config = convert::Config {
        fasta: args.fasta,
        hits: args.hits,
        output_dir: args.out,
        uniprot_names: args.uniprot_names,
    };

    let summary = convert::run(&config).context("converting hits")?;

    info!(
        "wrote {} alignments ({} hits) to {}; skipped {} queries and {} hits",
        summary.queries_written,
        summary.hits_written,
        config.output_dir.display(),
        summary.queries_skipped,
        summary.hits_skipped
    );

    Ok(())
}
