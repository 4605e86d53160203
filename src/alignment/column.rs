//! A single column of a decoded alignment.

/// The gap character.
pub const GAP: u8 = b'-';

/// A column aligned to one query position.
///
/// Each column holds the query residue, the subject residue aligned to it (or
/// [`GAP`]), and any subject residues that were inserted after this column.
/// Inserted residues are stored in lowercase and never occupy a column of
/// their own.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Column {
    /// The query residue.
    query: u8,

    /// The aligned subject residue.
    subject: u8,

    /// The lowercase residues inserted after this column.
    insertion: Vec<u8>,
}

impl Column {
    /// Creates a new [`Column`] with an empty insertion.
    ///
    /// # Examples
    ///
    /// ```
    /// use msabench::alignment::Column;
    ///
    /// let column = Column::new(b'F', b'A');
    /// assert_eq!(column.query(), b'F');
    /// assert_eq!(column.subject(), b'A');
    /// assert!(column.insertion().is_empty());
    /// ```
    pub fn new(query: u8, subject: u8) -> Self {
        Self {
            query,
            subject,
            insertion: Vec::new(),
        }
    }

    /// Creates a new [`Column`] where the subject is a gap.
    ///
    /// # Examples
    ///
    /// ```
    /// use msabench::alignment::Column;
    /// use msabench::alignment::column::GAP;
    ///
    /// let column = Column::gap(b'F');
    /// assert_eq!(column.subject(), GAP);
    /// assert!(column.is_gap());
    /// ```
    pub fn gap(query: u8) -> Self {
        Self::new(query, GAP)
    }

    /// Gets the query residue.
    pub fn query(&self) -> u8 {
        self.query
    }

    /// Gets the aligned subject residue.
    pub fn subject(&self) -> u8 {
        self.subject
    }

    /// Whether the subject is a gap in this column.
    pub fn is_gap(&self) -> bool {
        self.subject == GAP
    }

    /// Gets the lowercase residues inserted after this column.
    pub fn insertion(&self) -> &[u8] {
        &self.insertion
    }

    /// Appends a residue to the insertion run of this column.
    ///
    /// The residue is lowercased before it is stored.
    ///
    /// # Examples
    ///
    /// ```
    /// use msabench::alignment::Column;
    ///
    /// let mut column = Column::new(b'H', b'C');
    /// column.push_insertion(b'D');
    /// column.push_insertion(b'E');
    /// assert_eq!(column.insertion(), b"de");
    /// ```
    pub fn push_insertion(&mut self, residue: u8) {
        self.insertion.push(residue.to_ascii_lowercase());
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.subject as char)?;

        for residue in &self.insertion {
            write!(f, "{}", *residue as char)?;
        }

        Ok(())
    }
}
