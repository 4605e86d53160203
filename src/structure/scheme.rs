//! The polymer sequence scheme (`_pdbx_poly_seq_scheme`) of a chain.
//!
//! The scheme declares every position of the polymer sequence (`seq_id`) and,
//! for positions that were modelled, the author numbering those residues carry
//! in `_atom_site`. It is the authoritative source for which residues belong
//! to the polymer.
//!
//! Structures are read with [`pdbtbx`], which does not keep this category, so
//! the scheme is read from the raw mmCIF text. The reader here is limited to
//! that purpose: it only looks at the `_pdbx_poly_seq_scheme` category of the
//! first data block and never fails. Anything it cannot make sense of is
//! treated as an absent scheme.

use std::collections::BTreeSet;
use std::collections::HashMap;

/// The prefix shared by every item of the category.
const CATEGORY: &str = "_pdbx_poly_seq_scheme.";

/// The `seq_id` item.
const SEQ_ID: &str = "_pdbx_poly_seq_scheme.seq_id";

/// The `pdb_strand_id` item.
const STRAND_ID: &str = "_pdbx_poly_seq_scheme.pdb_strand_id";

/// The `auth_seq_num` item.
const AUTH_SEQ_NUM: &str = "_pdbx_poly_seq_scheme.auth_seq_num";

/// The `pdb_ins_code` item.
const INS_CODE: &str = "_pdbx_poly_seq_scheme.pdb_ins_code";

////////////////////////////////////////////////////////////////////////////////////////
// Residues
////////////////////////////////////////////////////////////////////////////////////////

/// Normalizes an insertion code, mapping the CIF null values to `""`.
///
/// # Examples
///
/// ```
/// use msabench::structure::scheme::normalize_icode;
///
/// assert_eq!(normalize_icode("?"), "");
/// assert_eq!(normalize_icode("."), "");
/// assert_eq!(normalize_icode(" A "), "A");
/// ```
pub fn normalize_icode(value: &str) -> &str {
    match value.trim() {
        "." | "?" => "",
        value => value,
    }
}

/// An author residue number paired with its insertion code.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ResidueId {
    /// The residue number.
    number: i64,

    /// The insertion code (empty when absent).
    icode: String,
}

impl ResidueId {
    /// Creates a new [`ResidueId`], normalizing the insertion code.
    pub fn new(number: i64, icode: &str) -> Self {
        Self {
            number,
            icode: normalize_icode(icode).to_string(),
        }
    }

    /// Gets the identifier of a residue read by [`pdbtbx`].
    pub fn from_residue(residue: &pdbtbx::Residue) -> Self {
        Self::new(
            residue.serial_number() as i64,
            residue.insertion_code().unwrap_or_default(),
        )
    }

    /// Gets the residue number.
    pub fn number(&self) -> i64 {
        self.number
    }

    /// Gets the insertion code.
    pub fn icode(&self) -> &str {
        &self.icode
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Reading the category
////////////////////////////////////////////////////////////////////////////////////////

/// A token of mmCIF text.
#[derive(Clone, Debug, Eq, PartialEq)]
enum Token<'a> {
    /// An unquoted word: a keyword, a tag or a bare value.
    Bare(&'a str),

    /// A quoted value or a text field.
    Quoted(String),
}

impl Token<'_> {
    /// Gets the value of the token.
    fn as_str(&self) -> &str {
        match self {
            Token::Bare(word) => word,
            Token::Quoted(value) => value,
        }
    }

    /// Whether the token ends a run of loop values.
    fn ends_values(&self) -> bool {
        match self {
            Token::Bare(word) => {
                word.starts_with('_') || is_keyword(word, "loop_") || is_keyword(word, "data_")
            }
            Token::Quoted(_) => false,
        }
    }
}

/// Whether `word` starts with the (case-insensitive) keyword `keyword`.
fn is_keyword(word: &str, keyword: &str) -> bool {
    word.get(..keyword.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(keyword))
}

/// Splits mmCIF text into tokens, dropping comments.
///
/// An unterminated quote runs to the end of its line and an unterminated
/// text field to the end of the text.
fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut lines = text.lines();

    while let Some(line) = lines.next() {
        let Some(first) = line.strip_prefix(';') else {
            tokenize_line(line, &mut tokens);
            continue;
        };

        let mut parts = vec![first];

        for line in lines.by_ref() {
            if line.starts_with(';') {
                break;
            }

            parts.push(line);
        }

        tokens.push(Token::Quoted(parts.join("\n").trim().to_string()));
    }

    tokens
}

/// Splits a line outside of any text field into tokens.
fn tokenize_line<'a>(line: &'a str, tokens: &mut Vec<Token<'a>>) {
    let bytes = line.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];

        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        if c == b'#' {
            return;
        }

        let start = i;

        if c == b'\'' || c == b'"' {
            // A quote only closes when followed by whitespace.
            let mut j = start + 1;

            while j < bytes.len()
                && !(bytes[j] == c && bytes.get(j + 1).map_or(true, u8::is_ascii_whitespace))
            {
                j += 1;
            }

            let end = j.min(bytes.len());
            tokens.push(Token::Quoted(line[start + 1..end].to_string()));
            i = end + 1;
            continue;
        }

        while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        tokens.push(Token::Bare(&line[start..i]));
    }
}

/// The items and values of `_pdbx_poly_seq_scheme` in the first data block.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
struct Category {
    /// The item names.
    items: Vec<String>,

    /// The values in row-major order.
    values: Vec<String>,
}

impl Category {
    /// Finds the category in mmCIF text, in either its `loop_` or its
    /// single-row `tag value` form.
    fn read(text: &str) -> Option<Self> {
        let tokens = tokenize(text);
        let mut category = Self::default();
        let mut blocks = 0;
        let mut i = 0;

        while i < tokens.len() {
            let Token::Bare(word) = &tokens[i] else {
                i += 1;
                continue;
            };

            if is_keyword(word, "data_") {
                blocks += 1;

                if blocks > 1 {
                    break;
                }

                i += 1;
            } else if is_keyword(word, "loop_") {
                let start = i + 1;
                let mut end = start;

                while matches!(tokens.get(end), Some(Token::Bare(tag)) if tag.starts_with('_')) {
                    end += 1;
                }

                let tags = &tokens[start..end];
                let values_end = tokens[end..]
                    .iter()
                    .position(Token::ends_values)
                    .map_or(tokens.len(), |n| end + n);

                if tags.first().is_some_and(|tag| tag.as_str().starts_with(CATEGORY)) {
                    return Some(Self {
                        items: tags.iter().map(|tag| tag.as_str().to_string()).collect(),
                        values: tokens[end..values_end]
                            .iter()
                            .map(|value| value.as_str().to_string())
                            .collect(),
                    });
                }

                i = values_end;
            } else if word.starts_with(CATEGORY) {
                let Some(value) = tokens.get(i + 1).filter(|value| !value.ends_values()) else {
                    i += 1;
                    continue;
                };

                category.items.push(word.to_string());
                category.values.push(value.as_str().to_string());
                i += 2;
            } else {
                i += 1;
            }
        }

        if category.items.is_empty() {
            return None;
        }

        Some(category)
    }

    /// Gets every value of an item, one per row.
    ///
    /// A single-row category yields a one-element sequence. An absent item, or
    /// a loop whose values do not fill whole rows, yields an empty one.
    fn column(&self, item: &str) -> Vec<&str> {
        let width = self.items.len();

        let Some(index) = self.items.iter().position(|name| name == item) else {
            return Vec::new();
        };

        if self.values.len() % width != 0 {
            return Vec::new();
        }

        self.values
            .iter()
            .skip(index)
            .step_by(width)
            .map(String::as_str)
            .collect()
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Schemes
////////////////////////////////////////////////////////////////////////////////////////

/// The polymer sequence scheme of a single chain.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PolySeqScheme {
    /// The declared polymer positions.
    seq_ids: BTreeSet<i64>,

    /// The polymer positions of each author-numbered residue.
    residues: HashMap<ResidueId, BTreeSet<i64>>,
}

impl PolySeqScheme {
    /// Reads the scheme of `chain` from mmCIF text.
    ///
    /// Only rows whose strand is `chain` and whose `seq_id` is an integer are
    /// used; of those, rows with an integer author number also map that
    /// residue to its position. Returns [`None`] if no usable row exists.
    ///
    /// # Examples
    ///
    /// ```
    /// use msabench::structure::scheme::PolySeqScheme;
    /// use msabench::structure::scheme::ResidueId;
    ///
    /// let text = "data_x
    /// loop_
    /// _pdbx_poly_seq_scheme.seq_id
    /// _pdbx_poly_seq_scheme.pdb_strand_id
    /// _pdbx_poly_seq_scheme.auth_seq_num
    /// _pdbx_poly_seq_scheme.pdb_ins_code
    /// 1 A ? .
    /// 2 A 5 .
    /// 3 A 5 A
    /// 1 B 1 .
    /// ";
    ///
    /// let scheme = PolySeqScheme::from_cif(text, "A").unwrap();
    /// assert_eq!(scheme.seq_ids().len(), 3);
    /// assert!(scheme.contains(&ResidueId::new(5, "A")));
    /// assert!(!scheme.contains(&ResidueId::new(1, "")));
    ///
    /// assert!(PolySeqScheme::from_cif(text, "C").is_none());
    /// ```
    pub fn from_cif(text: &str, chain: &str) -> Option<Self> {
        let category = Category::read(text)?;

        let seq_ids = category.column(SEQ_ID);
        let strands = category.column(STRAND_ID);
        let numbers = category.column(AUTH_SEQ_NUM);
        let icodes = category.column(INS_CODE);

        let mut scheme = Self::default();

        for (i, (seq_id, strand)) in seq_ids.iter().zip(&strands).enumerate() {
            if strand.trim() != chain {
                continue;
            }

            let Ok(seq_id) = seq_id.parse::<i64>() else {
                continue;
            };

            scheme.seq_ids.insert(seq_id);

            let Some(number) = numbers.get(i).and_then(|n| n.parse::<i64>().ok()) else {
                continue;
            };

            let icode = icodes.get(i).copied().unwrap_or_default();

            scheme
                .residues
                .entry(ResidueId::new(number, icode))
                .or_default()
                .insert(seq_id);
        }

        if scheme.seq_ids.is_empty() {
            return None;
        }

        Some(scheme)
    }

    /// Gets the declared polymer positions.
    pub fn seq_ids(&self) -> &BTreeSet<i64> {
        &self.seq_ids
    }

    /// Whether an author-numbered residue belongs to the polymer.
    pub fn contains(&self, residue: &ResidueId) -> bool {
        self.residues.contains_key(residue)
    }

    /// Gets the polymer positions covered by a set of residues.
    pub fn observed<'a>(&self, residues: impl IntoIterator<Item = &'a ResidueId>) -> BTreeSet<i64> {
        residues
            .into_iter()
            .filter_map(|residue| self.residues.get(residue))
            .flatten()
            .copied()
            .collect()
    }
}
