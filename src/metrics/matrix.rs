//! Normalizing an alignment into a rectangular residue matrix.

use crate::a3m::Msa;

/// The gap character.
pub const GAP: u8 = b'-';

/// The alternative gap character some tools emit.
pub const DOT: u8 = b'.';

/// The residue standing in for any character outside ASCII.
pub const UNKNOWN_RESIDUE: u8 = b'X';

/// Gets the matrix cell for a residue character.
fn residue_byte(c: char) -> u8 {
    u8::try_from(c)
        .ok()
        .filter(u8::is_ascii)
        .unwrap_or(UNKNOWN_RESIDUE)
}

/// The set of characters treated as gaps.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Gaps {
    /// Whether `.` counts as a gap.
    dot: bool,
}

impl Gaps {
    /// Creates a new gap set. `-` is always a gap; `.` is a gap when `dot` is
    /// set.
    ///
    /// # Examples
    ///
    /// ```
    /// use msabench::metrics::Gaps;
    ///
    /// assert!(Gaps::new(true).is_gap(b'.'));
    /// assert!(!Gaps::new(false).is_gap(b'.'));
    /// assert!(Gaps::new(false).is_gap(b'-'));
    /// assert!(!Gaps::new(true).is_gap(b'A'));
    /// ```
    pub fn new(dot: bool) -> Self {
        Self { dot }
    }

    /// Whether a character is a gap.
    pub fn is_gap(&self, c: u8) -> bool {
        c == GAP || (self.dot && c == DOT)
    }
}

impl Default for Gaps {
    fn default() -> Self {
        Self::new(true)
    }
}

/// An alignment with insertions removed and every row padded or truncated to
/// the query length.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Matrix {
    /// The target name (the first token of the query header).
    target: String,

    /// The rows, the first being the query.
    rows: Vec<Vec<u8>>,
}

impl Matrix {
    /// Normalizes an [`Msa`] into a [`Matrix`].
    ///
    /// Lowercase insertion residues are removed from every record, then each
    /// record is padded with `-` or truncated to the length of the query.
    /// Lengths are counted in characters; a character outside ASCII takes one
    /// column and is stored as [`UNKNOWN_RESIDUE`]. Returns [`None`] if the
    /// query has no columns.
    ///
    /// # Examples
    ///
    /// ```
    /// use msabench::a3m::Msa;
    /// use msabench::a3m::Record;
    /// use msabench::metrics::Matrix;
    ///
    /// let msa = Msa::new(
    ///     Record::new("T1024 query", "ACDE"),
    ///     vec![Record::new("a", "ACxyDEFG"), Record::new("b", "AC")],
    /// );
    ///
    /// let matrix = Matrix::from_msa(&msa).unwrap();
    /// assert_eq!(matrix.target(), "T1024");
    /// assert_eq!(matrix.width(), 4);
    /// assert_eq!(matrix.rows()[1], b"ACDE");
    /// assert_eq!(matrix.rows()[2], b"AC--");
    /// ```
    pub fn from_msa(msa: &Msa) -> Option<Self> {
        let width = msa.query().column_aligned().chars().count();

        if width == 0 {
            return None;
        }

        let rows = msa
            .iter()
            .map(|record| {
                let mut row = record
                    .column_aligned()
                    .chars()
                    .map(residue_byte)
                    .collect::<Vec<_>>();
                row.resize(width, GAP);
                row
            })
            .collect();

        Some(Self {
            target: msa.query().name().to_string(),
            rows,
        })
    }

    /// Creates a [`Matrix`] directly from rows of equal length.
    ///
    /// Returns [`None`] if there are no rows, the rows have no columns, or the
    /// rows differ in length.
    pub fn try_from_rows(target: impl Into<String>, rows: Vec<Vec<u8>>) -> Option<Self> {
        let width = rows.first()?.len();

        if width == 0 || rows.iter().any(|row| row.len() != width) {
            return None;
        }

        Some(Self {
            target: target.into(),
            rows,
        })
    }

    /// Gets the target name.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Gets the rows, the first being the query.
    pub fn rows(&self) -> &[Vec<u8>] {
        &self.rows
    }

    /// Gets the query row.
    pub fn query(&self) -> &[u8] {
        &self.rows[0]
    }

    /// Gets the number of columns (the query length).
    pub fn width(&self) -> usize {
        self.rows[0].len()
    }

    /// Gets the number of rows.
    pub fn depth(&self) -> usize {
        self.rows.len()
    }

    /// Iterates over the residues of a single column.
    pub fn column(&self, i: usize) -> impl Iterator<Item = u8> + '_ {
        self.rows.iter().map(move |row| row[i])
    }
}
