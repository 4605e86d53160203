//! Counting the sequences of an alignment that survive redundancy filtering.
//!
//! Two filters are provided:
//!
//! - [`Hhfilter`], which runs the external `hhfilter` program and counts the
//!   sequences it keeps.
//! - [`Greedy`], an in-process approximation that keeps a sequence only if it
//!   is below the identity threshold to every sequence kept before it.
//!
//! [`count_with_fallback()`] uses the first when it is available and succeeds
//! and the second otherwise.

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::ExitStatus;
use std::process::Stdio;

use tempdir::TempDir;
use tracing::debug;
use tracing::warn;

use crate::a3m::record::HEADER_PREFIX;
use crate::metrics::Gaps;
use crate::metrics::Matrix;
use crate::metrics::stats::pairwise_identity;

/// The default name of the `hhfilter` program.
pub const HHFILTER: &str = "hhfilter";

/// The name of the filtered alignment written inside the temporary directory.
const FILTERED_FILE_NAME: &str = "filtered.a3m";

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to redundancy filtering.
#[derive(Debug)]
pub enum Error {
    /// The filter program could not be found.
    Unavailable(String),

    /// The temporary output directory could not be created.
    TempDir(io::Error),

    /// The filter program could not be started.
    Spawn(io::Error),

    /// The filter program exited unsuccessfully.
    ExitStatus(ExitStatus, String),

    /// The filtered output could not be read.
    ReadOutput(PathBuf, io::Error),

    /// The filtered output was missing or empty.
    EmptyOutput(PathBuf),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Unavailable(program) => write!(f, "program not available: {program}"),
            Error::TempDir(err) => write!(f, "creating temporary directory: {err}"),
            Error::Spawn(err) => write!(f, "starting filter: {err}"),
            Error::ExitStatus(status, stderr) => {
                write!(f, "filter exited with {status}")?;

                if !stderr.is_empty() {
                    write!(f, ": {stderr}")?;
                }

                Ok(())
            }
            Error::ReadOutput(path, err) => {
                write!(f, "reading filtered output {}: {err}", path.display())
            }
            Error::EmptyOutput(path) => {
                write!(f, "filtered output is missing or empty: {}", path.display())
            }
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Capability
////////////////////////////////////////////////////////////////////////////////////////

/// An alignment to be filtered.
///
/// External filters read the file at `path`; in-process filters use the
/// normalized `matrix` built from it.
#[derive(Clone, Copy, Debug)]
pub struct Input<'a> {
    /// The path of the alignment on disk.
    path: &'a Path,

    /// The normalized alignment.
    matrix: &'a Matrix,
}

impl<'a> Input<'a> {
    /// Creates a new [`Input`].
    pub fn new(path: &'a Path, matrix: &'a Matrix) -> Self {
        Self { path, matrix }
    }

    /// Gets the path of the alignment on disk.
    pub fn path(&self) -> &Path {
        self.path
    }

    /// Gets the normalized alignment.
    pub fn matrix(&self) -> &Matrix {
        self.matrix
    }
}

/// A facility that counts the non-redundant sequences of an alignment at an
/// identity threshold.
pub trait RedundancyFilter {
    /// A short name for the filter used in log messages.
    fn name(&self) -> &str;

    /// Whether the filter can be used at all.
    fn available(&self) -> bool;

    /// Counts the sequences that remain after filtering.
    fn count(&self, input: &Input<'_>) -> Result<usize>;
}

/// Counts the non-redundant sequences with `filter`, falling back to
/// `fallback` when `filter` is unavailable or fails.
///
/// # Examples
///
/// ```
/// use std::path::Path;
///
/// use msabench::metrics::Gaps;
/// use msabench::metrics::Matrix;
/// use msabench::metrics::filter;
/// use msabench::metrics::filter::Greedy;
/// use msabench::metrics::filter::Hhfilter;
/// use msabench::metrics::filter::Input;
///
/// let matrix = Matrix::try_from_rows("q", vec![b"ACDE".to_vec(), b"ACDE".to_vec()]).unwrap();
/// let input = Input::new(Path::new("q.a3m"), &matrix);
///
/// let missing = Hhfilter::new("definitely-not-installed-hhfilter", 62);
/// let greedy = Greedy::new(0.62, Gaps::default());
///
/// assert_eq!(filter::count_with_fallback(&missing, &greedy, &input)?, 1);
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn count_with_fallback(
    filter: &impl RedundancyFilter,
    fallback: &impl RedundancyFilter,
    input: &Input<'_>,
) -> Result<usize> {
    if filter.available() {
        match filter.count(input) {
            Ok(n) => return Ok(n),
            Err(err) => warn!(
                "{}: {} failed, using {}: {err}",
                input.path().display(),
                filter.name(),
                fallback.name()
            ),
        }
    }

    fallback.count(input)
}

////////////////////////////////////////////////////////////////////////////////////////
// External filter
////////////////////////////////////////////////////////////////////////////////////////

/// The external `hhfilter` program.
#[derive(Clone, Debug)]
pub struct Hhfilter {
    /// The program to run.
    program: String,

    /// The maximum pairwise identity (in percent) kept by the filter.
    id_percent: u8,

    /// Whether the program could be started when the filter was created.
    available: bool,
}

impl Hhfilter {
    /// Creates a new [`Hhfilter`], probing once whether `program` can be
    /// started.
    pub fn new(program: impl Into<String>, id_percent: u8) -> Self {
        let program = program.into();

        let available = Command::new(&program)
            .arg("-h")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok();

        debug!("{program}: available = {available}");

        Self {
            program,
            id_percent,
            available,
        }
    }

    /// Gets the program to run.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Gets the identity threshold in percent.
    pub fn id_percent(&self) -> u8 {
        self.id_percent
    }
}

impl RedundancyFilter for Hhfilter {
    fn name(&self) -> &str {
        &self.program
    }

    fn available(&self) -> bool {
        self.available
    }

    fn count(&self, input: &Input<'_>) -> Result<usize> {
        if !self.available {
            return Err(Error::Unavailable(self.program.clone()));
        }

        // Removed when dropped, whichever way this function returns.
        let dir = TempDir::new("hhfilter").map_err(Error::TempDir)?;
        let output = dir.path().join(FILTERED_FILE_NAME);

        let result = Command::new(&self.program)
            .arg("-i")
            .arg(input.path())
            .arg("-o")
            .arg(&output)
            .arg("-id")
            .arg(self.id_percent.to_string())
            .stdin(Stdio::null())
            .output()
            .map_err(Error::Spawn)?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            return Err(Error::ExitStatus(result.status, stderr));
        }

        count_headers(&output)
    }
}

/// Counts the header lines of an alignment file.
///
/// A missing or empty file is an error.
fn count_headers(path: &Path) -> Result<usize> {
    let contents = match fs::read(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(Error::EmptyOutput(path.to_path_buf()));
        }
        Err(err) => return Err(Error::ReadOutput(path.to_path_buf(), err)),
    };

    if contents.is_empty() {
        return Err(Error::EmptyOutput(path.to_path_buf()));
    }

    Ok(contents
        .split(|b| *b == b'\n')
        .filter(|line| line.first() == Some(&(HEADER_PREFIX as u8)))
        .count())
}

////////////////////////////////////////////////////////////////////////////////////////
// In-process filter
////////////////////////////////////////////////////////////////////////////////////////

/// A greedy, single-pass approximation of identity filtering.
#[derive(Clone, Copy, Debug)]
pub struct Greedy {
    /// The identity (as a fraction) at or above which a sequence is redundant.
    threshold: f64,

    /// The gap characters ignored when computing identity.
    gaps: Gaps,
}

impl Greedy {
    /// Creates a new [`Greedy`] filter.
    pub fn new(threshold: f64, gaps: Gaps) -> Self {
        Self { threshold, gaps }
    }

    /// Gets the identity threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Counts the rows kept by the greedy pass.
    ///
    /// Rows are visited in order; a row is dropped if its gap-masked identity
    /// to any row already kept is at or above the threshold.
    pub fn count_rows(&self, rows: &[Vec<u8>]) -> usize {
        let mut kept: Vec<&[u8]> = Vec::new();

        for row in rows {
            let redundant = kept
                .iter()
                .any(|k| pairwise_identity(row, k, &self.gaps) >= self.threshold);

            if !redundant {
                kept.push(row);
            }
        }

        kept.len()
    }
}

impl RedundancyFilter for Greedy {
    fn name(&self) -> &str {
        "greedy approximation"
    }

    fn available(&self) -> bool {
        true
    }

    fn count(&self, input: &Input<'_>) -> Result<usize> {
        Ok(self.count_rows(input.matrix().rows()))
    }
}
