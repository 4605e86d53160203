//! `msabench` is a crate for preparing the inputs of protein structure
//! prediction benchmarks and for scoring the multiple sequence alignments
//! (MSAs) fed to them.
//!
//! The crate provides four main points of entry, each backing one binary:
//!
//! - [`convert`]: turning tabular, CIGAR-encoded search hits into one A3M
//!   alignment per query (`hits-to-a3m`).
//! - [`metrics`]: scoring a directory of A3M alignments by NEff, column
//!   entropy, gap content and identity to the query (`msa-metrics`).
//! - [`structure::clean`]: filtering mmCIF structures by how completely their
//!   polymer was modelled and stripping everything but that polymer
//!   (`clean-structures`).
//! - [`compare`]: comparing the hits of two alignment sets built for the same
//!   targets (`compare-msas`).
//!
//! ## Building alignments from hits
//!
//! Each hit is decoded from its CIGAR string into one [`alignment::Column`]
//! per query residue. Subject residues that are not aligned to a query column
//! are kept as lowercase insertions after the column they follow, which is
//! exactly how A3M represents them.
//!
//! ```
//! use msabench::alignment::Alignment;
//!
//! let alignment = Alignment::decode_str("3M2D2I", b"ABCDE", b"FGHIJ")?;
//!
//! assert_eq!(alignment.aligned_query(), "FGHIJ");
//! assert_eq!(alignment.aligned_subject(), "ABC--");
//! assert_eq!(alignment.to_string(), "ABCde--");
//!
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Reading alignments
//!
//! A3M files are read with the [`a3m::Reader`] facility, which yields
//! [`a3m::Record`]s or a complete [`a3m::Msa`].
//!
//! ```
//! use msabench::metrics::Gaps;
//! use msabench::metrics::Matrix;
//! use msabench::metrics::stats;
//!
//! let data = b">T1024 query\nACDE\n>hit\nACxDF\n";
//! let mut reader = msabench::a3m::Reader::new(&data[..]);
//!
//! let msa = reader.read_msa()?.unwrap();
//! let matrix = Matrix::from_msa(&msa).unwrap();
//!
//! assert_eq!(matrix.target(), "T1024");
//! assert_eq!(stats::average_identity_to_query(&matrix, &Gaps::default()), 0.75);
//!
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]
#![warn(missing_debug_implementations)]
#![warn(clippy::missing_docs_in_private_items)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod a3m;
pub mod alignment;
pub mod cigar;
pub mod compare;
pub mod convert;
pub mod hits;
pub mod inputs;
pub mod metrics;
pub mod structure;
