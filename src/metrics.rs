//! Quality metrics for directories of A3M alignments.
//!
//! For each alignment, the following are reported:
//!
//! - `NEff_id<pct>`: the number of sequences that survive redundancy
//!   filtering at `<pct>`% identity, divided by the query length (see
//!   [`filter`]).
//! - `MeanEntropy`: the mean Shannon entropy of the alignment's columns.
//! - `GapFraction`: the fraction of all cells that are gaps.
//! - `AvgIdentityToQuery`: the mean gap-masked identity of each hit to the
//!   query.
//!
//! Every metric except NEff is computed on the normalized [`Matrix`] built
//! from the file as-is. Filtering only contributes a count.

use std::fs::File;
use std::io;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Write as _;
use std::path::Path;
use std::path::PathBuf;

use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::a3m;
use crate::inputs;

pub mod filter;
pub mod matrix;
pub mod stats;

pub use filter::RedundancyFilter;
pub use matrix::Gaps;
pub use matrix::Matrix;

/// The suffix of alignment files picked up from the input directory.
pub const SUFFIX: &str = ".a3m";

/// The default identity threshold (in percent) for NEff.
pub const DEFAULT_ID_PERCENT: u8 = 62;

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to a metrics run.
#[derive(Debug)]
pub enum Error {
    /// The input directory could not be listed.
    ListInputs(PathBuf, io::Error),

    /// No alignment files were found in the input directory.
    NoInputs(PathBuf),

    /// The output table could not be written.
    Write(PathBuf, io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ListInputs(path, err) => {
                write!(f, "listing input directory {}: {err}", path.display())
            }
            Error::NoInputs(path) => {
                write!(f, "no {SUFFIX} files found in: {}", path.display())
            }
            Error::Write(path, err) => write!(f, "writing {}: {err}", path.display()),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Metrics
////////////////////////////////////////////////////////////////////////////////////////

/// A floating point value formatted to six decimals, or `nan`.
#[derive(Clone, Copy, Debug)]
struct Value(f64);

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_nan() {
            write!(f, "nan")
        } else {
            write!(f, "{:.6}", self.0)
        }
    }
}

/// Gets the header line of the output table.
///
/// # Examples
///
/// ```
/// assert_eq!(
///     msabench::metrics::header(62),
///     "target\tNEff_id62\tMeanEntropy\tGapFraction\tAvgIdentityToQuery"
/// );
/// ```
pub fn header(id_percent: u8) -> String {
    format!("target\tNEff_id{id_percent}\tMeanEntropy\tGapFraction\tAvgIdentityToQuery")
}

/// The metrics for a single alignment.
#[derive(Clone, Debug, PartialEq)]
pub struct Metrics {
    /// The target name.
    pub target: String,

    /// The number of non-redundant sequences per query residue.
    pub neff: f64,

    /// The mean column entropy.
    pub mean_entropy: f64,

    /// The fraction of gap cells.
    pub gap_fraction: f64,

    /// The mean identity of the hits to the query.
    pub avg_identity_to_query: f64,
}

impl Metrics {
    /// Computes the metrics of a normalized alignment given the number of
    /// non-redundant sequences in it.
    pub fn compute(matrix: &Matrix, n_hat: usize, gaps: &Gaps) -> Self {
        Self {
            target: matrix.target().to_string(),
            neff: n_hat as f64 / matrix.width() as f64,
            mean_entropy: stats::mean_entropy(matrix, gaps),
            gap_fraction: stats::gap_fraction(matrix, gaps),
            avg_identity_to_query: stats::average_identity_to_query(matrix, gaps),
        }
    }
}

impl std::fmt::Display for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.target,
            Value(self.neff),
            Value(self.mean_entropy),
            Value(self.gap_fraction),
            Value(self.avg_identity_to_query)
        )
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Batch computation
////////////////////////////////////////////////////////////////////////////////////////

/// The configuration for a metrics run.
#[derive(Clone, Debug)]
pub struct Config {
    /// The directory holding the `*.a3m` files.
    pub input_dir: PathBuf,

    /// The path of the output table.
    pub output: PathBuf,

    /// The identity threshold (in percent) for NEff.
    pub id_percent: u8,

    /// Whether `.` counts as a gap.
    pub dot_is_gap: bool,

    /// The `hhfilter` program to run.
    pub hhfilter: String,
}

impl Config {
    /// Creates a new [`Config`] with the default threshold, gap set and
    /// filter program.
    pub fn new(input_dir: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output: output.into(),
            id_percent: DEFAULT_ID_PERCENT,
            dot_is_gap: true,
            hhfilter: filter::HHFILTER.to_string(),
        }
    }

    /// Gets the gap set.
    pub fn gaps(&self) -> Gaps {
        Gaps::new(self.dot_is_gap)
    }

    /// Gets the identity threshold as a fraction.
    pub fn threshold(&self) -> f64 {
        f64::from(self.id_percent) / 100.0
    }
}

/// A summary of a metrics run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Summary {
    /// The number of rows written.
    pub rows_written: usize,

    /// The number of files skipped as empty or unreadable.
    pub files_skipped: usize,

    /// Whether `hhfilter` was available for the run.
    pub used_hhfilter: bool,
}

/// Reads and normalizes an alignment file.
///
/// Returns [`None`] if the file holds no records or the query has no columns.
pub fn read_matrix(path: &Path) -> io::Result<Option<Matrix>> {
    let mut reader = File::open(path).map(BufReader::new).map(a3m::Reader::new)?;
    Ok(reader.read_msa()?.as_ref().and_then(Matrix::from_msa))
}

/// Computes the metrics of every `*.a3m` file in the input directory and
/// writes them as a table.
pub fn run(config: &Config) -> Result<Summary> {
    let paths = inputs::list(&config.input_dir, &[SUFFIX])
        .map_err(|err| Error::ListInputs(config.input_dir.clone(), err))?;

    if paths.is_empty() {
        return Err(Error::NoInputs(config.input_dir.clone()));
    }

    info!("found {} alignments in {}", paths.len(), config.input_dir.display());

    let gaps = config.gaps();
    let hhfilter = filter::Hhfilter::new(config.hhfilter.as_str(), config.id_percent);
    let greedy = filter::Greedy::new(config.threshold(), gaps);

    let mut summary = Summary {
        used_hhfilter: hhfilter.available(),
        ..Default::default()
    };

    let write_err = |err| Error::Write(config.output.clone(), err);
    let file = File::create(&config.output).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "{}", header(config.id_percent)).map_err(write_err)?;

    for path in paths {
        let matrix = match read_matrix(&path) {
            Ok(Some(matrix)) => matrix,
            Ok(None) => {
                warn!("{}: empty alignment, skipping", path.display());
                summary.files_skipped += 1;
                continue;
            }
            Err(err) => {
                warn!("{}: {err}, skipping", path.display());
                summary.files_skipped += 1;
                continue;
            }
        };

        let input = filter::Input::new(&path, &matrix);

        // `Greedy` cannot fail, so this is only an error if both do.
        let n_hat = match filter::count_with_fallback(&hhfilter, &greedy, &input) {
            Ok(n) => n,
            Err(err) => {
                warn!("{}: {err}, skipping", path.display());
                summary.files_skipped += 1;
                continue;
            }
        };

        let metrics = Metrics::compute(&matrix, n_hat, &gaps);
        debug!("{}: {metrics}", path.display());

        writeln!(writer, "{metrics}").map_err(write_err)?;
        summary.rows_written += 1;
    }

    writer.flush().map_err(write_err)?;

    info!(
        "wrote {} rows to {}",
        summary.rows_written,
        config.output.display()
    );

    if summary.used_hhfilter {
        info!(
            "NEff_id{} used {} -id {}",
            config.id_percent,
            hhfilter.program(),
            config.id_percent
        );
    } else {
        info!(
            "{} not found: NEff_id{} used the greedy {}% identity approximation",
            hhfilter.program(),
            config.id_percent,
            config.id_percent
        );
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempdir::TempDir;

    use super::*;

    fn config(dir: &Path) -> Config {
        let mut config = Config::new(dir.join("in"), dir.join("metrics.tsv"));
        config.hhfilter = String::from("definitely-not-installed-hhfilter");
        config
    }

    #[test]
    fn test_value_formatting() {
        assert_eq!(Value(0.5).to_string(), "0.500000");
        assert_eq!(Value(1.0849625007211563).to_string(), "1.084963");
        assert_eq!(Value(f64::NAN).to_string(), "nan");
    }

    #[test]
    fn test_run() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new("metrics")?;
        let config = config(dir.path());
        fs::create_dir(&config.input_dir)?;

        fs::write(
            config.input_dir.join("a.a3m"),
            ">T1 query\nACDE\n>h1\nACdfgDF\n>h2\nKL\nMN\n",
        )?;
        fs::write(config.input_dir.join("b.a3m"), ">T2\nAC-.\n")?;
        fs::write(config.input_dir.join("c.a3m"), "")?;
        fs::write(config.input_dir.join("d.a3m"), ">empty query\n\n")?;
        fs::write(config.input_dir.join("ignored.txt"), ">T3\nACDE\n")?;

        let summary = run(&config)?;
        assert_eq!(
            summary,
            Summary {
                rows_written: 2,
                files_skipped: 2,
                used_hhfilter: false,
            }
        );

        let table = fs::read_to_string(&config.output)?;
        assert_eq!(
            table,
            "target\tNEff_id62\tMeanEntropy\tGapFraction\tAvgIdentityToQuery\n\
             T1\t0.500000\t1.084963\t0.000000\t0.375000\n\
             T2\t0.250000\t0.000000\t0.500000\tnan\n"
        );

        Ok(())
    }

    #[test]
    fn test_no_inputs() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new("metrics")?;
        let config = config(dir.path());
        fs::create_dir(&config.input_dir)?;

        let err = run(&config).unwrap_err();
        assert!(matches!(err, Error::NoInputs(_)));
        assert!(!config.output.exists());

        Ok(())
    }
}
