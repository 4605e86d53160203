//! Converting pairwise search hits into per-query A3M alignments.
//!
//! For each query, every hit is decoded into a row with exactly one column per
//! query residue:
//!
//! - the part of the query before the hit's start becomes leading gaps,
//! - the hit's CIGAR is decoded against the remaining query and the subject
//!   from its start (see [`Alignment::decode()`]),
//! - the row is padded with gaps (or truncated) to the query length.
//!
//! Subject residues that are not aligned to any query column are written as
//! lowercase insertions directly after the column they follow.
//!
//! ```
//! use msabench::convert;
//! use msabench::hits::Record;
//!
//! let hits = vec!["q1 ABCDE 3M2D2I 1 1 hit1".parse::<Record>()?];
//! let (msa, skipped) = convert::build_msa("q1", b"FGHIJ", &hits);
//!
//! assert_eq!(skipped, 0);
//! assert_eq!(msa.query().sequence(), "FGHIJ");
//! assert_eq!(msa.hits()[0].header(), "hit1");
//! assert_eq!(msa.hits()[0].sequence(), "ABCde--");
//!
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Write as _;
use std::path::Path;
use std::path::PathBuf;
use std::sync::LazyLock;

use noodles::fasta;
use regex::Regex;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::a3m;
use crate::a3m::Msa;
use crate::alignment::Alignment;
use crate::alignment::Column;
use crate::cigar;
use crate::hits;

/// The file extension for written alignments.
pub const EXTENSION: &str = "a3m";

/// Matches UniProt-style identifiers such as `sp|P69905|HBA_HUMAN`.
static UNIPROT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^|]+\|([^|]+)\|").expect("regex to compile"));

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to a conversion run.
#[derive(Debug)]
pub enum Error {
    /// The output path exists but is not a directory.
    OutputNotADirectory(PathBuf),

    /// The output directory could not be created.
    CreateOutputDirectory(PathBuf, io::Error),

    /// The query FASTA could not be read.
    ReadFasta(PathBuf, io::Error),

    /// The hits file could not be read.
    ReadHits(PathBuf, io::Error),

    /// An alignment could not be written.
    Write(PathBuf, io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::OutputNotADirectory(path) => write!(
                f,
                "output must be a directory path, found a file: {}",
                path.display()
            ),
            Error::CreateOutputDirectory(path, err) => {
                write!(f, "creating output directory {}: {err}", path.display())
            }
            Error::ReadFasta(path, err) => write!(f, "reading FASTA {}: {err}", path.display()),
            Error::ReadHits(path, err) => write!(f, "reading hits {}: {err}", path.display()),
            Error::Write(path, err) => write!(f, "writing {}: {err}", path.display()),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Rows
////////////////////////////////////////////////////////////////////////////////////////

/// Builds the full-length row for a single hit against a query.
///
/// The returned [`Alignment`] always has exactly `query.len()` columns.
///
/// # Examples
///
/// ```
/// use msabench::convert;
/// use msabench::hits::Record;
///
/// // The hit starts at the third query residue and the second subject residue.
/// let hit = "q1 XMKV 3M 3 2 hit".parse::<Record>()?;
/// let row = convert::row(b"AAMKVAA", &hit)?;
///
/// assert_eq!(row.aligned_subject(), "--MKV--");
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn row(query: &[u8], hit: &hits::Record) -> std::result::Result<Alignment, cigar::ParseError> {
    let cigar = hit.cigar().parse::<cigar::Cigar>()?;

    let offset = hit.query_offset().min(query.len());
    let (prefix, rest) = query.split_at(offset);
    let subject = hit
        .subject()
        .as_bytes()
        .get(hit.subject_offset()..)
        .unwrap_or_default();

    let mut columns = prefix
        .iter()
        .map(|residue| Column::gap(*residue))
        .collect::<Vec<_>>();
    columns.extend(Alignment::decode(&cigar, subject, rest).into_columns());

    if columns.len() < query.len() {
        let missing = query[columns.len()..]
            .iter()
            .map(|residue| Column::gap(*residue))
            .collect::<Vec<_>>();
        columns.extend(missing);
    } else {
        columns.truncate(query.len());
    }

    Ok(Alignment::from(columns))
}

/// Builds the alignment for one query and its hits.
///
/// The first record is the query itself (headed by `name`); each following
/// record is one hit, in input order, headed by the hit's subject header.
/// Hits with a malformed CIGAR are skipped with a warning, and the number of
/// skipped hits is returned alongside the alignment.
pub fn build_msa(name: &str, query: &[u8], hits: &[hits::Record]) -> (Msa, usize) {
    let mut records = Vec::with_capacity(hits.len());
    let mut skipped = 0usize;

    for hit in hits {
        match row(query, hit) {
            Ok(row) => records.push(a3m::Record::new(hit.subject_header(), row.to_string())),
            Err(err) => {
                warn!(
                    "{name}: skipping hit `{}`: invalid CIGAR `{}`: {err}",
                    hit.subject_header(),
                    hit.cigar()
                );
                skipped += 1;
            }
        }
    }

    let query = a3m::Record::new(name, String::from_utf8_lossy(query));
    (Msa::new(query, records), skipped)
}

/// Gets the name to use for a query's output file and header.
///
/// When `uniprot_names` is set, identifiers of the form `db|ACCESSION|NAME`
/// are shortened to `ACCESSION`. Any other identifier is returned unchanged.
///
/// # Examples
///
/// ```
/// use msabench::convert::output_name;
///
/// assert_eq!(output_name("sp|P69905|HBA_HUMAN", true), "P69905");
/// assert_eq!(output_name("sp|P69905|HBA_HUMAN", false), "sp|P69905|HBA_HUMAN");
/// assert_eq!(output_name("T1024", true), "T1024");
/// ```
pub fn output_name(query_id: &str, uniprot_names: bool) -> &str {
    if !uniprot_names {
        return query_id;
    }

    UNIPROT_ID
        .captures(query_id)
        .and_then(|groups| groups.get(1))
        .map(|accession| accession.as_str())
        .unwrap_or(query_id)
}

////////////////////////////////////////////////////////////////////////////////////////
// Batch conversion
////////////////////////////////////////////////////////////////////////////////////////

/// The configuration for a conversion run.
#[derive(Clone, Debug)]
pub struct Config {
    /// The FASTA file holding the query sequences.
    pub fasta: PathBuf,

    /// The tabular hits file.
    pub hits: PathBuf,

    /// The directory into which alignments are written.
    pub output_dir: PathBuf,

    /// Whether to name outputs by the accession of UniProt-style query ids.
    pub uniprot_names: bool,
}

/// A summary of a conversion run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Summary {
    /// The number of alignments written.
    pub queries_written: usize,

    /// The number of queries skipped because they were missing from the FASTA.
    pub queries_skipped: usize,

    /// The number of hit rows written.
    pub hits_written: usize,

    /// The number of hits skipped because their CIGAR was malformed.
    pub hits_skipped: usize,
}

/// Reads the query sequences from a FASTA file, keyed by record name.
///
/// Later records with the same name replace earlier ones.
pub fn read_queries(path: &Path) -> io::Result<HashMap<String, Vec<u8>>> {
    info!("reading FASTA: {}", path.display());

    let mut queries = HashMap::new();

    for result in fasta::reader::Builder.build_from_path(path)?.records() {
        let record = result?;
        let name = String::from_utf8_lossy(record.name()).to_string();
        let sequence = record.sequence().as_ref().trim_ascii().to_vec();
        queries.insert(name, sequence);
    }

    debug!("read {} query sequences", queries.len());
    Ok(queries)
}

/// Writes an alignment to `<output_dir>/<name>.a3m`.
fn write_msa(output_dir: &Path, name: &str, msa: &Msa) -> Result<PathBuf> {
    let path = output_dir.join(format!("{name}.{EXTENSION}"));
    info!("writing A3M: {}", path.display());

    let file = File::create(&path).map_err(|err| Error::Write(path.clone(), err))?;
    let mut writer = a3m::Writer::new(BufWriter::new(file));

    for record in msa.iter() {
        writer
            .write_record(record)
            .map_err(|err| Error::Write(path.clone(), err))?;
    }

    writer
        .inner_mut()
        .flush()
        .map_err(|err| Error::Write(path.clone(), err))?;

    Ok(path)
}

/// Converts every query in the hits file into an A3M alignment.
///
/// Queries that appear in the hits file but not in the FASTA are skipped with
/// a warning.
pub fn run(config: &Config) -> Result<Summary> {
    let output_dir = &config.output_dir;

    if output_dir.exists() && !output_dir.is_dir() {
        return Err(Error::OutputNotADirectory(output_dir.clone()));
    }

    std::fs::create_dir_all(output_dir)
        .map_err(|err| Error::CreateOutputDirectory(output_dir.clone(), err))?;

    let queries =
        read_queries(&config.fasta).map_err(|err| Error::ReadFasta(config.fasta.clone(), err))?;

    let groups = File::open(&config.hits)
        .map(BufReader::new)
        .and_then(hits::group_by_query)
        .map_err(|err| Error::ReadHits(config.hits.clone(), err))?;

    let mut summary = Summary::default();

    for group in groups {
        let query = match queries.get(group.query_id()) {
            Some(query) => query,
            None => {
                warn!("query {} not found in FASTA, skipping", group.query_id());
                summary.queries_skipped += 1;
                continue;
            }
        };

        let name = output_name(group.query_id(), config.uniprot_names);
        let (msa, skipped) = build_msa(name, query, group.hits());
        write_msa(output_dir, name, &msa)?;

        summary.queries_written += 1;
        summary.hits_written += msa.hits().len();
        summary.hits_skipped += skipped;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempdir::TempDir;

    use super::*;

    fn hit(line: &str) -> hits::Record {
        line.parse().unwrap()
    }

    #[test]
    fn test_row_has_query_length() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let query = b"ACDEFGHIKL";

        // Starts in the middle and runs past the end of the query.
        let row = super::row(query, &hit("q S-ACDEFGHIKLMN 8M 5 3 h"))?;
        assert_eq!(row.len(), query.len());
        assert_eq!(row.aligned_subject(), "----ACDEFG");

        // Covers a short stretch and is padded.
        let row = super::row(query, &hit("q CD 2M 2 1 h"))?;
        assert_eq!(row.aligned_subject(), "-CD-------");

        Ok(())
    }

    #[test]
    fn test_row_with_starts_past_the_end() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let row = super::row(b"ACD", &hit("q ACD 3M 9 1 h"))?;
        assert_eq!(row.aligned_subject(), "---");

        let row = super::row(b"ACD", &hit("q ACD 3M 1 9 h"))?;
        assert_eq!(row.aligned_subject(), "---");

        Ok(())
    }

    #[test]
    fn test_insertions_are_interleaved() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let row = super::row(b"MKTAY", &hit("q MRQWAEF 2M2D1I1M1D1M 1 1 h"))?;
        assert_eq!(row.to_string(), "MRqw-AeF");
        assert_eq!(row.aligned_subject().len(), 5);
        Ok(())
    }

    #[test]
    fn test_huge_run_is_truncated_at_the_query_end() {
        let hits = vec![hit("q ACD 99999999999999999999999M 1 1 h")];

        let (msa, skipped) = build_msa("q", b"ACD", &hits);

        assert_eq!(skipped, 0);
        assert_eq!(msa.len(), 2);
        assert_eq!(msa.hits()[0].sequence(), "ACD");
    }

    #[test]
    fn test_malformed_cigar_skips_only_that_hit() {
        let hits = vec![
            hit("q ACD 3M 1 1 good1"),
            hit("q ACD 3S 1 1 bad"),
            hit("q ACD 1M1I1M 1 1 good2"),
        ];

        let (msa, skipped) = build_msa("q", b"ACD", &hits);

        assert_eq!(skipped, 1);
        assert_eq!(msa.len(), 3);
        assert_eq!(msa.hits()[0].sequence(), "ACD");
        assert_eq!(msa.hits()[1].header(), "good2");
        assert_eq!(msa.hits()[1].sequence(), "A-C");
    }

    #[test]
    fn test_run() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new("convert")?;
        let fasta = dir.path().join("queries.fasta");
        let hits = dir.path().join("hits.tsv");
        let output_dir = dir.path().join("out");

        fs::write(
            &fasta,
            ">sp|P00001|FIRST some description\nFGHIJ\n>sp|P00002|SECOND\nMKTAY\n",
        )?;
        fs::write(
            &hits,
            "sp|P00001|FIRST ABCDE 3M2D2I 1 1 hitA 99.0\n\
             sp|P00003|MISSING ACD 3M 1 1 hitB\n\
             sp|P00002|SECOND MRQWAEF 2M2D1I1M1D1M 1 1 hitC\n\
             sp|P00001|FIRST GHI 3M 2 1 hitD\n",
        )?;

        let config = Config {
            fasta,
            hits,
            output_dir: output_dir.clone(),
            uniprot_names: true,
        };

        let summary = run(&config)?;
        assert_eq!(
            summary,
            Summary {
                queries_written: 2,
                queries_skipped: 1,
                hits_written: 3,
                hits_skipped: 0,
            }
        );

        let first = fs::read_to_string(output_dir.join("P00001.a3m"))?;
        assert_eq!(first, ">P00001\nFGHIJ\n>hitA\nABCde--\n>hitD\n-GHI-\n");

        let second = fs::read_to_string(output_dir.join("P00002.a3m"))?;
        assert_eq!(second, ">P00002\nMKTAY\n>hitC\nMRqw-AeF\n");

        assert!(!output_dir.join("P00003.a3m").exists());

        Ok(())
    }

    #[test]
    fn test_output_must_be_a_directory() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new("convert")?;
        let output = dir.path().join("file");
        fs::write(&output, "")?;

        let config = Config {
            fasta: dir.path().join("missing.fasta"),
            hits: dir.path().join("missing.tsv"),
            output_dir: output,
            uniprot_names: false,
        };

        let err = run(&config).unwrap_err();
        assert!(matches!(err, Error::OutputNotADirectory(_)));

        Ok(())
    }
}
