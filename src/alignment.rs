//! Decoding CIGAR strings into column-aligned subject rows.
//!
//! An [`Alignment`] always has exactly one [`Column`] per residue of the query
//! slice it was decoded against. Residues present only in the subject (`D`
//! operations) are attached to the preceding column as a lowercase insertion,
//! which is how they are represented in A3M.
//!
//! ```
//! use msabench::alignment::Alignment;
//!
//! let alignment = Alignment::decode_str("3M2D2I", b"ABCDE", b"FGHIJ")?;
//!
//! assert_eq!(alignment.aligned_query(), "FGHIJ");
//! assert_eq!(alignment.aligned_subject(), "ABC--");
//! assert_eq!(alignment.columns()[2].insertion(), b"de");
//! assert_eq!(alignment.to_string(), "ABCde--");
//!
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::cigar;
use crate::cigar::Cigar;
use crate::cigar::Kind;

pub mod column;

pub use column::Column;

/// A subject decoded against a query, one [`Column`] per query residue.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Alignment(Vec<Column>);

impl Alignment {
    /// Decodes a [`Cigar`] against a subject slice and a query slice.
    ///
    /// Both slices are expected to already start at the hit's respective start
    /// offsets. Decoding never fails:
    ///
    /// - An operation that would read past the end of either slice is
    ///   truncated at that point, and decoding continues with the next
    ///   operation.
    /// - Deleted subject residues that occur before any column has been
    ///   emitted have nowhere to attach and are dropped.
    /// - Query residues left over once the CIGAR is exhausted become columns
    ///   with a gapped subject.
    ///
    /// Callers that need strict validation should compare
    /// [`Cigar::query_len()`] and [`Cigar::subject_len()`] against the slice
    /// lengths themselves.
    ///
    /// # Examples
    ///
    /// ```
    /// use msabench::alignment::Alignment;
    /// use msabench::cigar::Cigar;
    ///
    /// let cigar = "2M".parse::<Cigar>()?;
    /// let alignment = Alignment::decode(&cigar, b"AC", b"ACGT");
    ///
    /// assert_eq!(alignment.len(), 4);
    /// assert_eq!(alignment.aligned_subject(), "AC--");
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn decode(cigar: &Cigar, subject: &[u8], query: &[u8]) -> Self {
        let mut columns: Vec<Column> = Vec::with_capacity(query.len());
        let mut q = 0usize;
        let mut s = 0usize;

        for op in cigar {
            match op.kind() {
                Kind::Match => {
                    for _ in 0..op.len() {
                        if q >= query.len() || s >= subject.len() {
                            break;
                        }

                        columns.push(Column::new(query[q], subject[s]));
                        q += 1;
                        s += 1;
                    }
                }
                Kind::Insertion => {
                    for _ in 0..op.len() {
                        if q >= query.len() {
                            break;
                        }

                        columns.push(Column::gap(query[q]));
                        q += 1;
                    }
                }
                Kind::Deletion => {
                    for _ in 0..op.len() {
                        if s >= subject.len() {
                            break;
                        }

                        // NOTE: a deletion before the first column is dropped.
                        if let Some(column) = columns.last_mut() {
                            column.push_insertion(subject[s]);
                        }

                        s += 1;
                    }
                }
            }
        }

        columns.extend(query[q..].iter().map(|residue| Column::gap(*residue)));

        Self(columns)
    }

    /// Parses a CIGAR string and decodes it (see [`Alignment::decode()`]).
    ///
    /// # Examples
    ///
    /// ```
    /// use msabench::alignment::Alignment;
    ///
    /// let err = Alignment::decode_str("3X", b"ABC", b"ABC").unwrap_err();
    /// assert_eq!(err.to_string(), "invalid operator `X` at position 1");
    /// ```
    pub fn decode_str(
        cigar: &str,
        subject: &[u8],
        query: &[u8],
    ) -> Result<Self, cigar::ParseError> {
        let cigar = cigar.parse::<Cigar>()?;
        Ok(Self::decode(&cigar, subject, query))
    }

    /// Gets the columns by reference.
    pub fn columns(&self) -> &[Column] {
        &self.0
    }

    /// Consumes `self` and returns the columns.
    pub fn into_columns(self) -> Vec<Column> {
        self.0
    }

    /// Gets the number of columns.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the alignment has no columns.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Gets the aligned query as a string.
    pub fn aligned_query(&self) -> String {
        self.0.iter().map(|column| column.query() as char).collect()
    }

    /// Gets the column-aligned subject (without insertions) as a string.
    pub fn aligned_subject(&self) -> String {
        self.0.iter().map(|column| column.subject() as char).collect()
    }

    /// Gets the insertion run for each column.
    ///
    /// # Examples
    ///
    /// ```
    /// use msabench::alignment::Alignment;
    ///
    /// let alignment = Alignment::decode_str("1M2D1M", b"ABCD", b"XY")?;
    /// assert_eq!(alignment.insertions(), vec!["bc", ""]);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn insertions(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|column| String::from_utf8_lossy(column.insertion()).into_owned())
            .collect()
    }
}

impl From<Vec<Column>> for Alignment {
    fn from(columns: Vec<Column>) -> Self {
        Self(columns)
    }
}

impl std::fmt::Display for Alignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for column in &self.0 {
            write!(f, "{column}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::cigar::Op;

    const RESIDUES: &[u8] = b"ACDEFGHIKLMNPQRSTVWY";

    fn random_sequence(rng: &mut StdRng, len: usize) -> Vec<u8> {
        (0..len)
            .map(|_| RESIDUES[rng.gen_range(0..RESIDUES.len())])
            .collect()
    }

    fn random_cigar(rng: &mut StdRng) -> Cigar {
        let n = rng.gen_range(1..8);
        (0..n)
            .map(|_| {
                let kind = match rng.gen_range(0..3) {
                    0 => Kind::Match,
                    1 => Kind::Insertion,
                    _ => Kind::Deletion,
                };
                Op::new(rng.gen_range(1..6), kind)
            })
            .collect::<Vec<_>>()
            .into()
    }

    /// Encodes an alignment back into the CIGAR that produced it.
    fn encode(alignment: &Alignment) -> Cigar {
        let mut ops: Vec<Op> = Vec::new();

        let mut push = |kind: Kind, len: usize| {
            if len == 0 {
                return;
            }

            match ops.last_mut() {
                Some(last) if last.kind() == kind => *last = Op::new(last.len() + len, kind),
                _ => ops.push(Op::new(len, kind)),
            }
        };

        for column in alignment.columns() {
            if column.is_gap() {
                push(Kind::Insertion, 1);
            } else {
                push(Kind::Match, 1);
            }

            push(Kind::Deletion, column.insertion().len());
        }

        ops.into()
    }

    #[test]
    fn test_worked_example() -> Result<(), Box<dyn std::error::Error>> {
        let alignment = Alignment::decode_str("3M2D2I", b"ABCDE", b"FGHIJ")?;

        assert_eq!(alignment.len(), 5);
        assert_eq!(alignment.aligned_query(), "FGHIJ");
        assert_eq!(alignment.aligned_subject(), "ABC--");
        assert_eq!(alignment.insertions(), vec!["", "", "de", "", ""]);
        assert_eq!(alignment.to_string(), "ABCde--");

        Ok(())
    }

    #[test]
    fn test_leading_deletion_is_dropped() -> Result<(), Box<dyn std::error::Error>> {
        let alignment = Alignment::decode_str("2D2M", b"XXAB", b"AB")?;

        assert_eq!(alignment.aligned_subject(), "AB");
        assert!(alignment.columns().iter().all(|c| c.insertion().is_empty()));

        Ok(())
    }

    #[test]
    fn test_match_past_end_of_subject_is_truncated() -> Result<(), Box<dyn std::error::Error>> {
        let alignment = Alignment::decode_str("5M2I", b"AB", b"ABCDEFG")?;

        // The `M` run stops after two residues, the `I` run then consumes two
        // more query residues, and the rest is gap-filled.
        assert_eq!(alignment.len(), 7);
        assert_eq!(alignment.aligned_subject(), "AB-----");

        Ok(())
    }

    #[test]
    fn test_run_past_end_of_query_is_truncated() -> Result<(), Box<dyn std::error::Error>> {
        let alignment = Alignment::decode_str("2M4I3M", b"ABCDE", b"ABC")?;

        assert_eq!(alignment.len(), 3);
        assert_eq!(alignment.aligned_subject(), "AB-");

        Ok(())
    }

    #[test]
    fn test_deletion_past_end_of_subject_is_truncated() -> Result<(), Box<dyn std::error::Error>>
    {
        let alignment = Alignment::decode_str("1M9D1I", b"AB", b"XY")?;

        assert_eq!(alignment.aligned_subject(), "A-");
        assert_eq!(alignment.insertions(), vec!["b", ""]);

        Ok(())
    }

    #[test]
    fn test_empty_cigar_gaps_the_whole_query() -> Result<(), Box<dyn std::error::Error>> {
        let alignment = Alignment::decode_str("", b"ABC", b"ABCD")?;
        assert_eq!(alignment.aligned_subject(), "----");
        Ok(())
    }

    #[test]
    fn test_invalid_operator() {
        let err = Alignment::decode_str("3M1N", b"ABCD", b"ABCD").unwrap_err();
        assert_eq!(err, cigar::ParseError::InvalidOperator('N', 3));
    }

    #[test]
    fn test_column_count_always_equals_query_length() {
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..500 {
            let cigar = random_cigar(&mut rng);
            let query_len = rng.gen_range(0..30);
            let subject_len = rng.gen_range(0..30);
            let query = random_sequence(&mut rng, query_len);
            let subject = random_sequence(&mut rng, subject_len);

            let alignment = Alignment::decode(&cigar, &subject, &query);

            assert_eq!(alignment.len(), query.len(), "cigar: {cigar}");
            assert_eq!(alignment.aligned_query().as_bytes(), &query[..]);
        }
    }

    #[test]
    fn test_operations_change_columns_as_expected() {
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..200 {
            let cigar = random_cigar(&mut rng);

            // Sequences long enough that nothing is truncated.
            let query = random_sequence(&mut rng, cigar.query_len());
            let subject = random_sequence(&mut rng, cigar.subject_len());

            let alignment = Alignment::decode(&cigar, &subject, &query);

            let matches = cigar
                .ops()
                .iter()
                .filter(|op| op.kind() == Kind::Match)
                .map(|op| op.len())
                .sum::<usize>();
            let insertions = cigar
                .ops()
                .iter()
                .filter(|op| op.kind() == Kind::Insertion)
                .map(|op| op.len())
                .sum::<usize>();

            let aligned = alignment.columns().iter().filter(|c| !c.is_gap()).count();
            let gapped = alignment.columns().iter().filter(|c| c.is_gap()).count();

            // `M` is 1:1 with aligned subject residues, `I` adds one gapped
            // column per unit, and `D` never adds a column.
            assert_eq!(aligned, matches, "cigar: {cigar}");
            assert_eq!(gapped, insertions, "cigar: {cigar}");
            assert_eq!(alignment.len(), matches + insertions, "cigar: {cigar}");
        }
    }

    #[test]
    fn test_round_trip() -> Result<(), Box<dyn std::error::Error>> {
        let mut columns = vec![
            Column::new(b'M', b'M'),
            Column::new(b'K', b'R'),
            Column::gap(b'T'),
            Column::new(b'A', b'A'),
            Column::new(b'Y', b'F'),
        ];
        columns[1].push_insertion(b'Q');
        columns[1].push_insertion(b'W');
        columns[3].push_insertion(b'E');

        let expected = Alignment::from(columns);
        let cigar = encode(&expected);
        assert_eq!(cigar.to_string(), "2M2D1I1M1D1M");

        let subject = b"MRQWAEF";
        let query = b"MKTAY";
        let actual = Alignment::decode(&cigar, subject, query);

        assert_eq!(actual, expected);
        assert_eq!(actual.aligned_subject(), "MR-AF");
        assert_eq!(actual.to_string(), "MRqw-AeF");

        Ok(())
    }
}
