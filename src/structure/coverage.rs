//! Coverage and internal gap scoring over residue positions.

use std::collections::BTreeSet;

/// Where the declared positions of a chain came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Method {
    /// The `_pdbx_poly_seq_scheme` category.
    Main,

    /// The span of the author residue numbers.
    Fallback,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Main => write!(f, "main"),
            Method::Fallback => write!(f, "fallback"),
        }
    }
}

/// The coverage of a set of declared positions by observed positions along
/// with the largest internal gap in the observed positions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coverage {
    /// The fraction of declared positions that were observed.
    fraction: f64,

    /// The largest run of consecutive positions missing strictly between the
    /// first and last observed position.
    max_gap: usize,
}

impl Coverage {
    /// Scores `observed` against `declared`.
    ///
    /// With nothing declared or nothing observed, both the fraction and the
    /// gap are zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::BTreeSet;
    ///
    /// use msabench::structure::coverage::Coverage;
    ///
    /// let declared = (1..=10).collect::<BTreeSet<i64>>();
    /// let observed = BTreeSet::from([1, 2, 3, 7, 8, 9, 10]);
    ///
    /// let coverage = Coverage::compute(&declared, &observed);
    /// assert_eq!(coverage.fraction(), 0.7);
    /// assert_eq!(coverage.max_gap(), 3);
    /// ```
    pub fn compute(declared: &BTreeSet<i64>, observed: &BTreeSet<i64>) -> Self {
        if declared.is_empty() || observed.is_empty() {
            return Self::empty();
        }

        Self {
            fraction: observed.len() as f64 / declared.len() as f64,
            max_gap: max_internal_gap(observed),
        }
    }

    /// Scores `observed` against every position between its minimum and
    /// maximum (inclusive).
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::BTreeSet;
    ///
    /// use msabench::structure::coverage::Coverage;
    ///
    /// let coverage = Coverage::from_span(&BTreeSet::from([5, 6, 8]));
    /// assert_eq!(coverage.fraction(), 0.75);
    /// assert_eq!(coverage.max_gap(), 1);
    /// ```
    pub fn from_span(observed: &BTreeSet<i64>) -> Self {
        let (Some(first), Some(last)) = (observed.first(), observed.last()) else {
            return Self::empty();
        };

        let span = last.abs_diff(*first) as f64 + 1.0;

        Self {
            fraction: observed.len() as f64 / span,
            max_gap: max_internal_gap(observed),
        }
    }

    /// A coverage of zero with no gap.
    fn empty() -> Self {
        Self {
            fraction: 0.0,
            max_gap: 0,
        }
    }

    /// Gets the fraction of declared positions that were observed.
    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    /// Gets the largest internal gap.
    pub fn max_gap(&self) -> usize {
        self.max_gap
    }
}

/// Finds the largest run of missing positions between consecutive observed
/// positions.
fn max_internal_gap(observed: &BTreeSet<i64>) -> usize {
    observed
        .iter()
        .zip(observed.iter().skip(1))
        .map(|(a, b)| usize::try_from(b.abs_diff(*a) - 1).unwrap_or(usize::MAX))
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contiguous() {
        let declared = (1..=10).collect::<BTreeSet<i64>>();
        let coverage = Coverage::compute(&declared, &declared);

        assert_eq!(coverage.fraction(), 1.0);
        assert_eq!(coverage.max_gap(), 0);
    }

    #[test]
    fn test_empty_and_single() {
        let declared = (1..=10).collect::<BTreeSet<i64>>();

        let coverage = Coverage::compute(&declared, &BTreeSet::new());
        assert_eq!(coverage.fraction(), 0.0);
        assert_eq!(coverage.max_gap(), 0);

        let coverage = Coverage::compute(&BTreeSet::new(), &declared);
        assert_eq!(coverage.fraction(), 0.0);

        let coverage = Coverage::compute(&declared, &BTreeSet::from([4]));
        assert_eq!(coverage.fraction(), 0.1);
        assert_eq!(coverage.max_gap(), 0);

        let coverage = Coverage::from_span(&BTreeSet::new());
        assert_eq!(coverage.fraction(), 0.0);
        assert_eq!(coverage.max_gap(), 0);
    }

    #[test]
    fn test_largest_gap_wins() {
        let observed = BTreeSet::from([-3, -2, 5, 6, 20]);
        assert_eq!(max_internal_gap(&observed), 13);
    }

    #[test]
    fn test_extreme_numbers() {
        let coverage = Coverage::from_span(&BTreeSet::from([i64::MIN, i64::MAX]));
        assert!(coverage.fraction() > 0.0);
        assert!(coverage.fraction() < 1e-18);
        assert!(coverage.max_gap() > 0);

        let declared = BTreeSet::from([i64::MIN, 0, i64::MAX]);
        let coverage = Coverage::compute(&declared, &declared);
        assert_eq!(coverage.fraction(), 1.0);
        assert_eq!(coverage.max_gap() as u64, i64::MAX as u64);
    }

    #[test]
    fn test_method_display() {
        assert_eq!(Method::Main.to_string(), "main");
        assert_eq!(Method::Fallback.to_string(), "fallback");
    }
}
