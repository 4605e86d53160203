//! A single A3M record.

/// The prefix for a header line.
pub const HEADER_PREFIX: char = '>';

/// The name used for a record whose header is empty.
pub const UNKNOWN_NAME: &str = "UNKNOWN";

/// A header line paired with its (possibly multi-line, joined) sequence.
///
/// In A3M, uppercase residues and `-` are aligned one-to-one with the query's
/// columns, while lowercase residues are insertions relative to the query and
/// do not occupy a column.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    /// The header (without the leading `>`).
    header: String,

    /// The sequence.
    sequence: String,
}

impl Record {
    /// Creates a new [`Record`].
    ///
    /// # Examples
    ///
    /// ```
    /// use msabench::a3m::Record;
    ///
    /// let record = Record::new("101M_1 mol:protein", "MVLSEGEWQLV");
    /// assert_eq!(record.header(), "101M_1 mol:protein");
    /// assert_eq!(record.sequence(), "MVLSEGEWQLV");
    /// assert_eq!(record.to_string(), ">101M_1 mol:protein\nMVLSEGEWQLV");
    /// ```
    pub fn new(header: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            sequence: sequence.into(),
        }
    }

    /// Gets the header (without the leading `>`).
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Gets the sequence.
    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    /// Gets the first whitespace-delimited token of the header.
    ///
    /// # Examples
    ///
    /// ```
    /// use msabench::a3m::Record;
    ///
    /// assert_eq!(Record::new("T1024 query", "A").name(), "T1024");
    /// assert_eq!(Record::new("", "A").name(), "UNKNOWN");
    /// ```
    pub fn name(&self) -> &str {
        self.header.split_whitespace().next().unwrap_or(UNKNOWN_NAME)
    }

    /// Gets the sequence with all lowercase insertion residues removed.
    ///
    /// # Examples
    ///
    /// ```
    /// use msabench::a3m::Record;
    ///
    /// let record = Record::new("hit", "ABCde--");
    /// assert_eq!(record.column_aligned(), "ABC--");
    /// ```
    pub fn column_aligned(&self) -> String {
        self.sequence
            .chars()
            .filter(|c| !c.is_lowercase())
            .collect()
    }

    /// Consumes `self` and returns the header and the sequence.
    pub fn into_parts(self) -> (String, String) {
        (self.header, self.sequence)
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{HEADER_PREFIX}{}\n{}", self.header, self.sequence)
    }
}
