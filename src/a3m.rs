//! A3M alignment files.
//!
//! A3M is a FASTA-like format where the first record is the query and every
//! other record is aligned to it. Uppercase residues and `-` occupy the
//! query's columns; lowercase residues are insertions that do not.

use nonempty::NonEmpty;

pub mod reader;
pub mod record;
pub mod writer;

pub use reader::Reader;
pub use record::Record;
pub use writer::Writer;

/// A multiple sequence alignment: a query record followed by zero or more hit
/// records.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Msa(NonEmpty<Record>);

impl Msa {
    /// Creates a new [`Msa`] from a query record and its hits.
    ///
    /// # Examples
    ///
    /// ```
    /// use msabench::a3m::Msa;
    /// use msabench::a3m::Record;
    ///
    /// let msa = Msa::new(
    ///     Record::new("query", "ACDE"),
    ///     vec![Record::new("hit", "AC-E")],
    /// );
    ///
    /// assert_eq!(msa.query().header(), "query");
    /// assert_eq!(msa.hits().len(), 1);
    /// ```
    pub fn new(query: Record, hits: Vec<Record>) -> Self {
        Self(NonEmpty::from((query, hits)))
    }

    /// Attempts to create an [`Msa`] from records, the first being the query.
    ///
    /// Returns [`None`] if no records are provided.
    pub fn try_from_records(records: Vec<Record>) -> Option<Self> {
        NonEmpty::from_vec(records).map(Self)
    }

    /// Gets the query record.
    pub fn query(&self) -> &Record {
        self.0.first()
    }

    /// Gets the hit records (every record except the query).
    pub fn hits(&self) -> &[Record] {
        &self.0.tail
    }

    /// Gets the total number of records, including the query.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over all records, starting with the query.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.0.iter()
    }
}
