//! Preparing experimental protein structures for benchmarking.
//!
//! Structures are read from and written to PDBx/mmCIF files with [`pdbtbx`].
//! A chain is scored by how much of its declared polymer sequence was
//! modelled ([`coverage`]), preferably using the polymer sequence scheme
//! ([`scheme`]) and otherwise the span of its author residue numbers. The
//! [`clean`] module applies the acceptance thresholds and writes the cleaned
//! structures.

pub mod clean;
pub mod coverage;
pub mod scheme;
