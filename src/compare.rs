//! Comparing the hits of two alignment sets built for the same targets.
//!
//! For every alignment in the first directory, the alignment with the same file
//! name is read from the second directory and the sets of hit headers (every
//! header except the query's) are compared.

use std::collections::BTreeSet;
use std::fs::File;
use std::io;
use std::io::BufReader;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use tracing::debug;
use tracing::warn;

use crate::a3m;
use crate::inputs;

/// The suffix of alignment files picked up from the first directory.
pub const SUFFIX: &str = ".a3m";

/// The column names of the report.
pub const COLUMNS: [&str; 5] = ["name", "a", "b", "a_only", "b_only"];

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to a comparison run.
#[derive(Debug)]
pub enum Error {
    /// A directory could not be listed.
    ListInputs(PathBuf, io::Error),

    /// No alignment files were found in the first directory.
    NoInputs(PathBuf),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ListInputs(path, err) => {
                write!(f, "listing directory {}: {err}", path.display())
            }
            Error::NoInputs(path) => write!(f, "no {SUFFIX} files found in: {}", path.display()),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Rows
////////////////////////////////////////////////////////////////////////////////////////

/// The comparison of one pair of alignments.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Row {
    /// The file stem shared by both alignments.
    pub name: String,

    /// The number of distinct hit headers in the first alignment.
    pub a: usize,

    /// The number of distinct hit headers in the second alignment.
    pub b: usize,

    /// The number of hit headers only in the first alignment.
    pub a_only: usize,

    /// The number of hit headers only in the second alignment.
    pub b_only: usize,
}

impl Row {
    /// Compares two sets of hit headers.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::BTreeSet;
    ///
    /// use msabench::compare::Row;
    ///
    /// let a = BTreeSet::from([String::from("h1"), String::from("h2")]);
    /// let b = BTreeSet::from([String::from("h2"), String::from("h3"), String::from("h4")]);
    ///
    /// let row = Row::new("T1024", &a, &b);
    /// assert_eq!(row.to_string(), "T1024\t2\t3\t1\t2");
    /// ```
    pub fn new(name: impl Into<String>, a: &BTreeSet<String>, b: &BTreeSet<String>) -> Self {
        Self {
            name: name.into(),
            a: a.len(),
            b: b.len(),
            a_only: a.difference(b).count(),
            b_only: b.difference(a).count(),
        }
    }

    /// Gets the values of the row as strings, in [`COLUMNS`] order.
    pub fn fields(&self) -> [String; 5] {
        [
            self.name.clone(),
            self.a.to_string(),
            self.b.to_string(),
            self.a_only.to_string(),
            self.b_only.to_string(),
        ]
    }
}

impl std::fmt::Display for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.fields().join("\t"))
    }
}

/// Reads the distinct hit headers of an alignment file.
pub fn hit_headers(path: &Path) -> io::Result<BTreeSet<String>> {
    let mut reader = File::open(path).map(BufReader::new).map(a3m::Reader::new)?;

    let headers = reader
        .records()
        .skip(1)
        .map(|result| result.map(|record| record.header().to_string()))
        .collect::<io::Result<BTreeSet<_>>>()?;

    Ok(headers)
}

/// Writes rows as a tab-separated table with a header line.
pub fn write_tsv<W: Write>(mut writer: W, rows: &[Row]) -> io::Result<()> {
    writeln!(writer, "{}", COLUMNS.join("\t"))?;

    for row in rows {
        writeln!(writer, "{row}")?;
    }

    writer.flush()
}

////////////////////////////////////////////////////////////////////////////////////////
// Batch comparison
////////////////////////////////////////////////////////////////////////////////////////

/// The configuration for a comparison run.
#[derive(Clone, Debug)]
pub struct Config {
    /// The first directory of alignments.
    pub dir_a: PathBuf,

    /// The second directory of alignments.
    pub dir_b: PathBuf,
}

/// Compares every alignment in the first directory with its namesake in the
/// second.
///
/// Alignments missing from or unreadable in either directory are skipped
/// with a warning.
pub fn run(config: &Config) -> Result<Vec<Row>> {
    let paths = inputs::list(&config.dir_a, &[SUFFIX])
        .map_err(|err| Error::ListInputs(config.dir_a.clone(), err))?;

    if paths.is_empty() {
        return Err(Error::NoInputs(config.dir_a.clone()));
    }

    let mut rows = Vec::with_capacity(paths.len());

    for path_a in paths {
        let file_name = inputs::file_name(&path_a);
        let path_b = config.dir_b.join(&file_name);

        if !path_b.is_file() {
            warn!("{file_name}: not found in {}, skipping", config.dir_b.display());
            continue;
        }

        let (a, b) = match (hit_headers(&path_a), hit_headers(&path_b)) {
            (Ok(a), Ok(b)) => (a, b),
            (Err(err), _) | (_, Err(err)) => {
                warn!("{file_name}: {err}, skipping");
                continue;
            }
        };

        let name = file_name
            .strip_suffix(SUFFIX)
            .unwrap_or(&file_name)
            .to_string();

        let row = Row::new(name, &a, &b);
        debug!("{row}");
        rows.push(row);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempdir::TempDir;

    use super::*;

    #[test]
    fn test_run() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new("compare")?;
        let dir_a = dir.path().join("a");
        let dir_b = dir.path().join("b");
        fs::create_dir(&dir_a)?;
        fs::create_dir(&dir_b)?;

        fs::write(
            dir_a.join("T1.a3m"),
            ">T1\nACDE\n>h1\nACDE\n>h2\nAC-E\n>h2\nACDE\n",
        )?;
        fs::write(
            dir_b.join("T1.a3m"),
            ">T1\nACDE\n\n>h2\nACdfDE\n>h3\nA--E\n>h4\nACDF\n",
        )?;
        fs::write(dir_a.join("T2.a3m"), ">T2\nKL\n>h9\nKL\n")?;

        let rows = run(&Config { dir_a, dir_b })?;

        assert_eq!(
            rows,
            vec![Row {
                name: String::from("T1"),
                a: 2,
                b: 3,
                a_only: 1,
                b_only: 2,
            }]
        );

        let mut tsv = Vec::new();
        write_tsv(&mut tsv, &rows)?;
        assert_eq!(
            String::from_utf8(tsv)?,
            "name\ta\tb\ta_only\tb_only\nT1\t2\t3\t1\t2\n"
        );

        Ok(())
    }

    #[test]
    fn test_query_header_is_excluded() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new("compare")?;
        let path = dir.path().join("x.a3m");
        fs::write(&path, ">query\nAC\n>query\nAC\n>hit\nA-\n")?;

        let headers = hit_headers(&path)?;
        assert_eq!(
            headers,
            BTreeSet::from([String::from("query"), String::from("hit")])
        );

        Ok(())
    }
}
