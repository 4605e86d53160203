//! Raw alignment statistics computed over a [`Matrix`].

use std::collections::HashMap;

use crate::metrics::Gaps;
use crate::metrics::Matrix;

/// Computes the Shannon entropy (in bits) of the non-gap residues of a column.
///
/// Returns [`None`] if every residue in the column is a gap.
///
/// # Examples
///
/// ```
/// use msabench::metrics::Gaps;
/// use msabench::metrics::stats::column_entropy;
///
/// let gaps = Gaps::default();
///
/// assert_eq!(column_entropy(b"AAAA".iter().copied(), &gaps), Some(0.0));
/// assert_eq!(column_entropy(b"AC-.".iter().copied(), &gaps), Some(1.0));
/// assert_eq!(column_entropy(b"--..".iter().copied(), &gaps), None);
/// ```
pub fn column_entropy(column: impl Iterator<Item = u8>, gaps: &Gaps) -> Option<f64> {
    let mut counts = HashMap::<u8, usize>::new();

    for residue in column.filter(|c| !gaps.is_gap(*c)) {
        *counts.entry(residue).or_default() += 1;
    }

    let n = counts.values().sum::<usize>();

    if n == 0 {
        return None;
    }

    let entropy = counts
        .values()
        .map(|count| {
            let p = *count as f64 / n as f64;
            -p * p.log2()
        })
        .sum::<f64>();

    // Avoid reporting `-0.0` for invariant columns.
    Some(entropy.max(0.0))
}

/// Computes the mean column entropy over columns with at least one non-gap
/// residue.
///
/// All-gap columns are excluded from the mean rather than counted as zero.
/// Returns NaN if every column is all gaps.
pub fn mean_entropy(matrix: &Matrix, gaps: &Gaps) -> f64 {
    let entropies = (0..matrix.width())
        .filter_map(|i| column_entropy(matrix.column(i), gaps))
        .collect::<Vec<_>>();

    if entropies.is_empty() {
        return f64::NAN;
    }

    entropies.iter().sum::<f64>() / entropies.len() as f64
}

/// Computes the fraction of all cells in the matrix that are gaps.
pub fn gap_fraction(matrix: &Matrix, gaps: &Gaps) -> f64 {
    let total = matrix.depth() * matrix.width();

    let n = matrix
        .rows()
        .iter()
        .flat_map(|row| row.iter())
        .filter(|c| gaps.is_gap(**c))
        .count();

    n as f64 / total as f64
}

/// Counts the columns where neither sequence has a gap.
pub fn comparable_columns(a: &[u8], b: &[u8], gaps: &Gaps) -> usize {
    a.iter()
        .zip(b)
        .filter(|(x, y)| !gaps.is_gap(**x) && !gaps.is_gap(**y))
        .count()
}

/// Computes the identity of two sequences over the columns where neither has
/// a gap.
///
/// Returns `0.0` if there are no such columns.
///
/// # Examples
///
/// ```
/// use msabench::metrics::Gaps;
/// use msabench::metrics::stats::pairwise_identity;
///
/// let gaps = Gaps::default();
///
/// assert_eq!(pairwise_identity(b"ACDE", b"ACDF", &gaps), 0.75);
/// assert_eq!(pairwise_identity(b"AC--", b"ACDF", &gaps), 1.0);
/// assert_eq!(pairwise_identity(b"AC--", b"--DF", &gaps), 0.0);
/// ```
pub fn pairwise_identity(a: &[u8], b: &[u8], gaps: &Gaps) -> f64 {
    let mut matches = 0usize;
    let mut compared = 0usize;

    for (x, y) in a.iter().zip(b) {
        if gaps.is_gap(*x) || gaps.is_gap(*y) {
            continue;
        }

        compared += 1;

        if x == y {
            matches += 1;
        }
    }

    if compared == 0 {
        return 0.0;
    }

    matches as f64 / compared as f64
}

/// Computes the mean identity of every non-query row to the query.
///
/// Rows that share no comparable column with the query are left out. Returns
/// NaN when the matrix holds only the query or no row is comparable.
pub fn average_identity_to_query(matrix: &Matrix, gaps: &Gaps) -> f64 {
    let query = matrix.query();

    let identities = matrix.rows()[1..]
        .iter()
        .filter(|row| comparable_columns(query, row, gaps) > 0)
        .map(|row| pairwise_identity(query, row, gaps))
        .collect::<Vec<_>>();

    if identities.is_empty() {
        return f64::NAN;
    }

    identities.iter().sum::<f64>() / identities.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: &[&[u8]]) -> Matrix {
        Matrix::try_from_rows("test", rows.iter().map(|row| row.to_vec()).collect()).unwrap()
    }

    #[test]
    fn test_mean_entropy_excludes_all_gap_columns() {
        let gaps = Gaps::default();

        // Column 0 is invariant (0 bits), column 1 is split evenly (1 bit), and
        // column 2 is all gaps.
        let m = matrix(&[b"AA-", b"AC-", b"AA-", b"AC-"]);
        assert_eq!(mean_entropy(&m, &gaps), 0.5);

        let m = matrix(&[b"--", b".."]);
        assert!(mean_entropy(&m, &gaps).is_nan());

        // With `.` not treated as a gap, it counts as a residue.
        let m = matrix(&[b"A", b"."]);
        assert_eq!(mean_entropy(&m, &Gaps::new(false)), 1.0);
    }

    #[test]
    fn test_gap_fraction() {
        let m = matrix(&[b"ACDE", b"A--E", b"...."]);
        assert_eq!(gap_fraction(&m, &Gaps::default()), 0.5);
        assert_eq!(gap_fraction(&m, &Gaps::new(false)), 2.0 / 12.0);
    }

    #[test]
    fn test_average_identity_to_query() {
        let gaps = Gaps::default();

        let m = matrix(&[b"ACDE", b"ACDF", b"AC--", b"----"]);
        // The all-gap row is not comparable and is excluded.
        assert_eq!(average_identity_to_query(&m, &gaps), (0.75 + 1.0) / 2.0);

        let m = matrix(&[b"ACDE"]);
        assert!(average_identity_to_query(&m, &gaps).is_nan());

        let m = matrix(&[b"AC--", b"--DE"]);
        assert!(average_identity_to_query(&m, &gaps).is_nan());
    }
}
