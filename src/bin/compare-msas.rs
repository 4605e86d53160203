//! A binary to compare the hits of two alignment sets built for the same
//! targets.
//!
//! ```shell
//! cargo run --release --bin=compare-msas --features=binaries -- diamond/ mmseqs/
//! ```
//!
//! For each alignment in the first directory, the number of distinct hit
//! headers in each set and the number unique to each set are reported.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap_verbosity_flag::Verbosity;
use msabench::compare;
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing::info;
use tracing_log::AsTrace as _;
use tracing_subscriber::EnvFilter;

/// Compares the hit headers of same-named alignments in two directories.
#[derive(Parser)]
struct Args {
    /// The first directory of alignments.
    dir_a: PathBuf,

    /// The second directory of alignments.
    dir_b: PathBuf,

    /// If desired, a file to write the comparison to as a tab-separated table
    /// instead of printing it.
    #[arg(short, long)]
    output: Option<PathBuf>,

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

    let config = compare::Config {
        dir_a: args.dir_a,
        dir_b: args.dir_b,
    };

    let rows = compare::run(&config).context("comparing alignments")?;

    match args.output {
        Some(path) => {
            let file = File::create(&path)
                .with_context(|| format!("creating {}", path.display()))?;
            compare::write_tsv(BufWriter::new(file), &rows)
                .with_context(|| format!("writing {}", path.display()))?;
            info!("wrote {} rows to {}", rows.len(), path.display());
        }
        None => {
            let mut builder = Builder::default();
            builder.push_record(compare::COLUMNS);

            for row in &rows {
                builder.push_record(row.fields());
            }

            let mut table = builder.build();
            table.with(Style::modern());
            println!("{table}");
        }
    }

    Ok(())
}
