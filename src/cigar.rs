//! CIGAR strings describing how a subject sequence aligns against a query.
//!
//! Only the three operators emitted by the upstream search tool are
//! supported:
//!
//! - `M`: a match or mismatch (consumes one query and one subject residue).
//! - `I`: an insertion in the query relative to the subject (consumes one
//!   query residue).
//! - `D`: a deletion in the query relative to the subject, i.e., residues
//!   present only in the subject (consumes one subject residue).

use std::str::FromStr;

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to the parsing of a CIGAR string.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseError {
    /// An operator outside of `M`, `I`, and `D`.
    InvalidOperator(char, usize),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::InvalidOperator(c, position) => {
                write!(f, "invalid operator `{c}` at position {position}")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// A [`Result`](std::result::Result) with a [`ParseError`].
type Result<T> = std::result::Result<T, ParseError>;

////////////////////////////////////////////////////////////////////////////////////////
// Operations
////////////////////////////////////////////////////////////////////////////////////////

/// The kind of a CIGAR operation.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Kind {
    /// A match or mismatch (`M`).
    Match,

    /// An insertion in the query relative to the subject (`I`).
    Insertion,

    /// A deletion in the query relative to the subject (`D`).
    Deletion,
}

impl Kind {
    /// Gets the character for this kind of operation.
    pub fn as_char(&self) -> char {
        match self {
            Kind::Match => 'M',
            Kind::Insertion => 'I',
            Kind::Deletion => 'D',
        }
    }

    /// Whether or not the operation consumes query residues.
    pub fn consumes_query(&self) -> bool {
        matches!(self, Kind::Match | Kind::Insertion)
    }

    /// Whether or not the operation consumes subject residues.
    pub fn consumes_subject(&self) -> bool {
        matches!(self, Kind::Match | Kind::Deletion)
    }
}

impl TryFrom<char> for Kind {
    type Error = char;

    fn try_from(value: char) -> std::result::Result<Self, Self::Error> {
        match value {
            'M' => Ok(Kind::Match),
            'I' => Ok(Kind::Insertion),
            'D' => Ok(Kind::Deletion),
            c => Err(c),
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A single CIGAR operation (a run length paired with a [`Kind`]).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Op {
    /// The run length.
    len: usize,

    /// The kind of operation.
    kind: Kind,
}

impl Op {
    /// Creates a new [`Op`].
    ///
    /// # Examples
    ///
    /// ```
    /// use msabench::cigar::Kind;
    /// use msabench::cigar::Op;
    ///
    /// let op = Op::new(3, Kind::Match);
    /// assert_eq!(op.len(), 3);
    /// assert_eq!(op.kind(), Kind::Match);
    /// assert_eq!(op.to_string(), "3M");
    /// ```
    pub fn new(len: usize, kind: Kind) -> Self {
        Self { len, kind }
    }

    /// Gets the run length.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Gets the kind of operation.
    pub fn kind(&self) -> Kind {
        self.kind
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.len, self.kind)
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Cigar
////////////////////////////////////////////////////////////////////////////////////////

/// A parsed CIGAR string.
///
/// Parsing follows the upstream tool's output leniently: a run length of zero
/// (or an operator with no preceding digits) is kept as an operation that
/// consumes nothing, and trailing digits without an operator are ignored. Any
/// operator other than `M`, `I`, or `D` is an error.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Cigar(Vec<Op>);

impl Cigar {
    /// Gets the operations by reference.
    ///
    /// # Examples
    ///
    /// ```
    /// use msabench::cigar::Cigar;
    /// use msabench::cigar::Kind;
    /// use msabench::cigar::Op;
    ///
    /// let cigar = "3M2D2I".parse::<Cigar>()?;
    /// assert_eq!(
    ///     cigar.ops(),
    ///     &[
    ///         Op::new(3, Kind::Match),
    ///         Op::new(2, Kind::Deletion),
    ///         Op::new(2, Kind::Insertion)
    ///     ]
    /// );
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn ops(&self) -> &[Op] {
        &self.0
    }

    /// Gets the number of query residues the operations consume.
    ///
    /// # Examples
    ///
    /// ```
    /// use msabench::cigar::Cigar;
    ///
    /// let cigar = "3M2D2I".parse::<Cigar>()?;
    /// assert_eq!(cigar.query_len(), 5);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn query_len(&self) -> usize {
        self.0
            .iter()
            .filter(|op| op.kind().consumes_query())
            .fold(0, |len, op| len.saturating_add(op.len()))
    }

    /// Gets the number of subject residues the operations consume.
    ///
    /// # Examples
    ///
    /// ```
    /// use msabench::cigar::Cigar;
    ///
    /// let cigar = "3M2D2I".parse::<Cigar>()?;
    /// assert_eq!(cigar.subject_len(), 5);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn subject_len(&self) -> usize {
        self.0
            .iter()
            .filter(|op| op.kind().consumes_subject())
            .fold(0, |len, op| len.saturating_add(op.len()))
    }
}

impl From<Vec<Op>> for Cigar {
    fn from(ops: Vec<Op>) -> Self {
        Self(ops)
    }
}

impl<'a> IntoIterator for &'a Cigar {
    type Item = &'a Op;
    type IntoIter = std::slice::Iter<'a, Op>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromStr for Cigar {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self> {
        let mut ops = Vec::new();
        let mut run = 0usize;

        for (i, c) in s.chars().enumerate() {
            // Runs longer than any slice are clamped; decoding stops at the
            // end of the slices anyway.
            if let Some(digit) = c.to_digit(10) {
                run = run.saturating_mul(10).saturating_add(digit as usize);
                continue;
            }

            let kind = Kind::try_from(c).map_err(|c| ParseError::InvalidOperator(c, i))?;
            ops.push(Op::new(run, kind));
            run = 0;
        }

        Ok(Self(ops))
    }
}

impl std::fmt::Display for Cigar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for op in &self.0 {
            write!(f, "{op}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_cigar() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let cigar = "10M1I12M3D4M".parse::<Cigar>()?;

        assert_eq!(cigar.ops().len(), 5);
        assert_eq!(cigar.ops()[0], Op::new(10, Kind::Match));
        assert_eq!(cigar.ops()[3], Op::new(3, Kind::Deletion));
        assert_eq!(cigar.query_len(), 27);
        assert_eq!(cigar.subject_len(), 29);
        assert_eq!(cigar.to_string(), "10M1I12M3D4M");

        Ok(())
    }

    #[test]
    fn test_empty_cigar() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let cigar = "".parse::<Cigar>()?;
        assert!(cigar.ops().is_empty());
        Ok(())
    }

    #[test]
    fn test_operator_without_run_length() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let cigar = "M3I".parse::<Cigar>()?;
        assert_eq!(
            cigar.ops(),
            &[Op::new(0, Kind::Match), Op::new(3, Kind::Insertion)]
        );
        Ok(())
    }

    #[test]
    fn test_trailing_digits_are_ignored() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let cigar = "4M12".parse::<Cigar>()?;
        assert_eq!(cigar.ops(), &[Op::new(4, Kind::Match)]);
        Ok(())
    }

    #[test]
    fn test_invalid_operator() {
        let err = "3M2S".parse::<Cigar>().unwrap_err();
        assert_eq!(err, ParseError::InvalidOperator('S', 3));
        assert_eq!(err.to_string(), "invalid operator `S` at position 3");

        let err = "3m".parse::<Cigar>().unwrap_err();
        assert_eq!(err, ParseError::InvalidOperator('m', 1));
    }

    #[test]
    fn test_huge_run_length_is_clamped() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let cigar = "99999999999999999999999M2D".parse::<Cigar>()?;
        assert_eq!(cigar.ops()[0].len(), usize::MAX);
        assert_eq!(cigar.ops()[1].len(), 2);
        assert_eq!(cigar.query_len(), usize::MAX);
        assert_eq!(cigar.subject_len(), usize::MAX);

        Ok(())
    }
}
