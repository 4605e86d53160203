//! Tabular search hits.
//!
//! Each non-blank line of a hit file describes one pairwise hit as
//! whitespace-separated fields:
//!
//! ```text
//! query_id  subject_sequence  cigar  q_start  s_start  subject_header  [...]
//! ```
//!
//! Start positions are 1-based. Any fields after the subject header are
//! ignored.

use std::io;
use std::io::BufRead;
use std::num::NonZeroUsize;
use std::num::ParseIntError;
use std::str::FromStr;

use tracing::warn;

/// The number of fields required in a hit line.
pub const NUM_REQUIRED_FIELDS: usize = 6;

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to the parsing of a hit record.
#[derive(Debug)]
pub enum ParseError {
    /// Too few fields in the hit line.
    IncorrectNumberOfFields(usize),

    /// An invalid query start position.
    InvalidQueryStart(ParseIntError),

    /// An invalid subject start position.
    InvalidSubjectStart(ParseIntError),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::IncorrectNumberOfFields(n) => write!(
                f,
                "invalid number of fields in hit: expected at least {NUM_REQUIRED_FIELDS} \
                 fields, found {n} fields"
            ),
            ParseError::InvalidQueryStart(err) => write!(f, "invalid query start: {err}"),
            ParseError::InvalidSubjectStart(err) => write!(f, "invalid subject start: {err}"),
        }
    }
}

impl std::error::Error for ParseError {}

/// An error related to reading hits.
#[derive(Debug)]
pub enum Error {
    /// An I/O error.
    Io(io::Error),

    /// A parse error on a given (1-based) line.
    Parse(usize, ParseError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err) => write!(f, "i/o error: {err}"),
            Error::Parse(line_no, err) => write!(f, "parse error: line {line_no}: {err}"),
        }
    }
}

impl std::error::Error for Error {}

////////////////////////////////////////////////////////////////////////////////////////
// Record
////////////////////////////////////////////////////////////////////////////////////////

/// A single hit of a subject sequence against a query.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    /// The query identifier.
    query_id: String,

    /// The full subject sequence.
    subject: String,

    /// The (unparsed) CIGAR string.
    cigar: String,

    /// The 1-based start of the hit in the query.
    query_start: NonZeroUsize,

    /// The 1-based start of the hit in the subject.
    subject_start: NonZeroUsize,

    /// The subject header.
    subject_header: String,
}

impl Record {
    /// Gets the query identifier.
    pub fn query_id(&self) -> &str {
        &self.query_id
    }

    /// Gets the full subject sequence.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Gets the CIGAR string.
    ///
    /// The CIGAR is kept as text so that a malformed CIGAR only fails the
    /// record when it is decoded.
    pub fn cigar(&self) -> &str {
        &self.cigar
    }

    /// Gets the 1-based start of the hit in the query.
    pub fn query_start(&self) -> NonZeroUsize {
        self.query_start
    }

    /// Gets the 1-based start of the hit in the subject.
    pub fn subject_start(&self) -> NonZeroUsize {
        self.subject_start
    }

    /// Gets the 0-based offset of the hit in the query.
    ///
    /// # Examples
    ///
    /// ```
    /// use msabench::hits::Record;
    ///
    /// let record = "q1 MKV 3M 4 1 sp|P1|X".parse::<Record>()?;
    /// assert_eq!(record.query_offset(), 3);
    /// assert_eq!(record.subject_offset(), 0);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn query_offset(&self) -> usize {
        self.query_start.get() - 1
    }

    /// Gets the 0-based offset of the hit in the subject.
    pub fn subject_offset(&self) -> usize {
        self.subject_start.get() - 1
    }

    /// Gets the subject header.
    pub fn subject_header(&self) -> &str {
        &self.subject_header
    }
}

impl FromStr for Record {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s.split_whitespace().collect::<Vec<_>>();

        if parts.len() < NUM_REQUIRED_FIELDS {
            return Err(ParseError::IncorrectNumberOfFields(parts.len()));
        }

        let query_start = parts[3].parse().map_err(ParseError::InvalidQueryStart)?;
        let subject_start = parts[4].parse().map_err(ParseError::InvalidSubjectStart)?;

        Ok(Self {
            query_id: parts[0].to_string(),
            subject: parts[1].to_string(),
            cigar: parts[2].to_string(),
            query_start,
            subject_start,
            subject_header: parts[5].to_string(),
        })
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Grouping
////////////////////////////////////////////////////////////////////////////////////////

/// All of the hits for a single query, in input order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Group {
    /// The query identifier.
    query_id: String,

    /// The hits.
    hits: Vec<Record>,
}

impl Group {
    /// Gets the query identifier.
    pub fn query_id(&self) -> &str {
        &self.query_id
    }

    /// Gets the hits.
    pub fn hits(&self) -> &[Record] {
        &self.hits
    }
}

/// Iterates over the parsed hit lines of a reader, skipping blank lines.
///
/// # Examples
///
/// ```
/// let data = b"q1 MKV 3M 1 1 h1\n\nq1 MKV 3M 1 1 h2\n";
/// let records = msabench::hits::records(&data[..]).collect::<Result<Vec<_>, _>>()?;
///
/// assert_eq!(records.len(), 2);
/// assert_eq!(records[1].subject_header(), "h2");
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn records<T>(reader: T) -> impl Iterator<Item = Result<Record, Error>>
where
    T: BufRead,
{
    reader
        .lines()
        .enumerate()
        .filter_map(|(i, result)| match result {
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => Some(
                line.parse::<Record>()
                    .map_err(|err| Error::Parse(i + 1, err)),
            ),
            Err(err) => Some(Err(Error::Io(err))),
        })
}

/// Groups the hits of a reader by query identifier.
///
/// Groups are returned in order of each query's first appearance. Lines that
/// fail to parse are skipped with a warning; I/O errors are returned.
///
/// # Examples
///
/// ```
/// let data = b"q1 MKV 3M 1 1 h1\nq2 MKV 3M 1 1 h2\nq1 MKV 3M 1 1 h3\n";
/// let groups = msabench::hits::group_by_query(&data[..])?;
///
/// assert_eq!(groups.len(), 2);
/// assert_eq!(groups[0].query_id(), "q1");
/// assert_eq!(groups[0].hits().len(), 2);
/// assert_eq!(groups[1].query_id(), "q2");
///
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn group_by_query<T>(reader: T) -> io::Result<Vec<Group>>
where
    T: BufRead,
{
    let mut groups: Vec<Group> = Vec::new();
    let mut index = std::collections::HashMap::<String, usize>::new();

    for result in records(reader) {
        let record = match result {
            Ok(record) => record,
            Err(Error::Io(err)) => return Err(err),
            Err(err) => {
                warn!("skipping hit: {err}");
                continue;
            }
        };

        match index.get(record.query_id()) {
            Some(i) => groups[*i].hits.push(record),
            None => {
                index.insert(record.query_id().to_string(), groups.len());
                groups.push(Group {
                    query_id: record.query_id().to_string(),
                    hits: vec![record],
                });
            }
        }
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_record() -> Result<(), Box<dyn std::error::Error>> {
        let record = "sp|P69905|HBA_HUMAN MVLSPADKTN 5M1D4M 2 3 UniRef90_A0A0 100.0 1e-50"
            .parse::<Record>()?;

        assert_eq!(record.query_id(), "sp|P69905|HBA_HUMAN");
        assert_eq!(record.subject(), "MVLSPADKTN");
        assert_eq!(record.cigar(), "5M1D4M");
        assert_eq!(record.query_start().get(), 2);
        assert_eq!(record.subject_offset(), 2);
        assert_eq!(record.subject_header(), "UniRef90_A0A0");

        Ok(())
    }

    #[test]
    fn test_too_few_fields() {
        let err = "q1 MKV 3M 1 1".parse::<Record>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid number of fields in hit: expected at least 6 fields, found 5 fields"
        );
    }

    #[test]
    fn test_invalid_starts() {
        let err = "q1 MKV 3M x 1 h".parse::<Record>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid query start: invalid digit found in string"
        );

        let err = "q1 MKV 3M 1 0 h".parse::<Record>().unwrap_err();
        assert!(matches!(err, ParseError::InvalidSubjectStart(_)));
    }

    #[test]
    fn test_malformed_lines_are_skipped() -> Result<(), Box<dyn std::error::Error>> {
        let data = b"q1 MKV 3M 1 1 h1\nq1 MKV\nq1 MKV 3M 1 1 h2\n";
        let groups = group_by_query(&data[..])?;

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].hits().len(), 2);

        Ok(())
    }

    #[test]
    fn test_parse_error_names_line() {
        let data = b"\nq1 MKV\n";
        let err = records(&data[..]).next().unwrap().unwrap_err();
        assert_eq!(
            err.to_string(),
            "parse error: line 2: invalid number of fields in hit: expected at least 6 fields, \
             found 2 fields"
        );
    }
}
