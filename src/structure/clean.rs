//! Cleaning monomeric protein structures.
//!
//! Each mmCIF file is read with [`pdbtbx`], and the first model and the first
//! chain in it are chosen. The chain's polymer coverage and largest internal
//! gap are scored (see [`coverage`](crate::structure::coverage)) and entries
//! that fall outside the [`Thresholds`] are rejected. Accepted entries are
//! written with only the chosen model and chain, and only the residues of the
//! polymer.

use std::collections::BTreeSet;
use std::fs::File;
use std::io;
use std::io::BufWriter;
use std::io::Read as _;
use std::io::Write as _;
use std::path::Path;
use std::path::PathBuf;

use flate2::read::MultiGzDecoder;
use pdbtbx::PDBError;
use pdbtbx::StrictnessLevel;
use pdbtbx::PDB;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::inputs;
use crate::structure::coverage::Coverage;
use crate::structure::coverage::Method;
use crate::structure::scheme::PolySeqScheme;
use crate::structure::scheme::ResidueId;

/// The suffixes of the files picked up from the input directory.
pub const SUFFIXES: &[&str] = &[".cif", ".cif.gz"];

/// The name of the log written into the output directory.
pub const LOG_FILE_NAME: &str = "clean_log.txt";

/// The first line of the log.
pub const LOG_HEADER: &str = "# file_name\tSTATUS\treason_or_metrics";

/// The default minimum polymer coverage.
pub const DEFAULT_MIN_COVERAGE: f64 = 0.8;

/// The default maximum internal gap.
pub const DEFAULT_MAX_INTERNAL_GAP: usize = 15;

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to a cleaning run.
#[derive(Debug)]
pub enum Error {
    /// The input directory could not be listed.
    ListInputs(PathBuf, io::Error),

    /// No structure files were found in the input directory.
    NoInputs(PathBuf),

    /// The output path exists but is not a directory.
    OutputNotADirectory(PathBuf),

    /// The output directory could not be created.
    CreateOutputDirectory(PathBuf, io::Error),

    /// A file could not be written.
    Write(PathBuf, io::Error),

    /// A cleaned structure could not be saved.
    Save(PathBuf, String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ListInputs(path, err) => {
                write!(f, "listing input directory {}: {err}", path.display())
            }
            Error::NoInputs(path) => write!(f, "no .cif files found in: {}", path.display()),
            Error::OutputNotADirectory(path) => write!(
                f,
                "output must be a directory path, found a file: {}",
                path.display()
            ),
            Error::CreateOutputDirectory(path, err) => {
                write!(f, "creating output directory {}: {err}", path.display())
            }
            Error::Write(path, err) => write!(f, "writing {}: {err}", path.display()),
            Error::Save(path, reason) => write!(f, "saving {}: {reason}", path.display()),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Outcomes
////////////////////////////////////////////////////////////////////////////////////////

/// The acceptance thresholds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds {
    /// The minimum fraction of polymer positions that must be modelled.
    pub min_coverage: f64,

    /// The largest run of unmodelled positions allowed inside the chain.
    pub max_internal_gap: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_coverage: DEFAULT_MIN_COVERAGE,
            max_internal_gap: DEFAULT_MAX_INTERNAL_GAP,
        }
    }
}

/// The reason a structure was rejected.
#[derive(Clone, Debug, PartialEq)]
pub enum Reject {
    /// The file could not be read or parsed.
    Parse(String),

    /// The file holds no model.
    NoModel(String),

    /// The first model holds no chain with atoms.
    NoChains,

    /// The polymer coverage is below the threshold.
    LowCoverage(f64, Method),

    /// The largest internal gap is above the threshold.
    BigInternalGap(usize, Method),
}

impl std::fmt::Display for Reject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reject::Parse(reason) => write!(f, "parse_error:{reason}"),
            Reject::NoModel(reason) => write!(f, "no_model_0:{reason}"),
            Reject::NoChains => write!(f, "no_chains_found"),
            Reject::LowCoverage(coverage, method) => {
                write!(f, "low_coverage:{coverage:.3}\tmethod:{method}")
            }
            Reject::BigInternalGap(gap, method) => {
                write!(f, "big_internal_gap:{gap}\tmethod:{method}")
            }
        }
    }
}

/// A structure that passed the thresholds, reduced to its chosen chain.
#[derive(Clone, Debug)]
pub struct Cleaned {
    /// The cleaned structure.
    pub pdb: PDB,

    /// The chosen chain.
    pub chain: String,

    /// The coverage of the chosen chain.
    pub coverage: Coverage,

    /// How the coverage was computed.
    pub method: Method,
}

/// The outcome for one input file, as written to the log.
#[derive(Clone, Debug)]
pub struct Outcome {
    /// The input file name.
    pub file_name: String,

    /// The accepted chain or the reason for rejection.
    pub result: std::result::Result<Accepted, Reject>,
}

/// The metrics of an accepted structure.
#[derive(Clone, Debug, PartialEq)]
pub struct Accepted {
    /// The chosen chain.
    pub chain: String,

    /// The coverage of the chosen chain.
    pub coverage: Coverage,

    /// How the coverage was computed.
    pub method: Method,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.result {
            Ok(accepted) => write!(
                f,
                "{}\tACCEPT\tok\tchain:{}\tcoverage:{:.3}\tmax_gap:{}\tmethod:{}",
                self.file_name,
                accepted.chain,
                accepted.coverage.fraction(),
                accepted.coverage.max_gap(),
                accepted.method
            ),
            Err(reject) => write!(f, "{}\tREJECT\t{reject}", self.file_name),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Cleaning
////////////////////////////////////////////////////////////////////////////////////////

/// Scores and cleans a structure.
///
/// `text` is the mmCIF text the structure was read from; the polymer sequence
/// scheme is read from it (see [`PolySeqScheme::from_cif()`]). Without a
/// scheme for the chosen chain, the span of its residue numbers is scored
/// instead and every `HETATM` atom is dropped.
///
/// # Examples
///
/// ```
/// use msabench::structure::clean;
/// use pdbtbx::PDB;
///
/// let reject = clean::clean_structure(PDB::new(), "", &Default::default()).unwrap_err();
/// assert_eq!(reject.to_string(), "no_model_0:no models in structure");
/// ```
pub fn clean_structure(
    mut pdb: PDB,
    text: &str,
    thresholds: &Thresholds,
) -> std::result::Result<Cleaned, Reject> {
    let model = pdb
        .model(0)
        .ok_or_else(|| Reject::NoModel(String::from("no models in structure")))?;

    let chain = model
        .chains()
        .find(|chain| chain.atom_count() > 0)
        .ok_or(Reject::NoChains)?;

    let chain_id = chain.id().to_string();
    let residues = chain
        .residues()
        .map(ResidueId::from_residue)
        .collect::<BTreeSet<_>>();

    let scheme = PolySeqScheme::from_cif(text, &chain_id);

    let (coverage, method) = match &scheme {
        Some(scheme) => (
            Coverage::compute(scheme.seq_ids(), &scheme.observed(&residues)),
            Method::Main,
        ),
        None => {
            let numbers = residues.iter().map(ResidueId::number).collect();
            (Coverage::from_span(&numbers), Method::Fallback)
        }
    };

    if coverage.fraction() < thresholds.min_coverage {
        return Err(Reject::LowCoverage(coverage.fraction(), method));
    }

    if coverage.max_gap() > thresholds.max_internal_gap {
        return Err(Reject::BigInternalGap(coverage.max_gap(), method));
    }

    while pdb.model_count() > 1 {
        pdb.remove_model(1);
    }

    pdb.remove_chains_by(|chain| chain.id() != chain_id);

    match &scheme {
        Some(scheme) => {
            pdb.remove_residues_by(|residue| !scheme.contains(&ResidueId::from_residue(residue)))
        }
        None => pdb.remove_atoms_by(|atom| atom.hetero()),
    }

    pdb.remove_empty();

    Ok(Cleaned {
        pdb,
        chain: chain_id,
        coverage,
        method,
    })
}

/// Reads the text of a structure file, decompressing `.gz` files.
fn read_text(path: &Path) -> io::Result<String> {
    let file = File::open(path)?;
    let mut bytes = Vec::new();

    if path.extension().is_some_and(|ext| ext == "gz") {
        MultiGzDecoder::new(file).read_to_end(&mut bytes)?;
    } else {
        io::BufReader::new(file).read_to_end(&mut bytes)?;
    }

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Joins the descriptions of the errors reported by [`pdbtbx`].
fn describe(errors: &[PDBError]) -> String {
    if errors.is_empty() {
        return String::from("unreadable structure");
    }

    errors
        .iter()
        .map(PDBError::short_description)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Gets the output file name for an input file name (`.gz` removed).
///
/// # Examples
///
/// ```
/// use msabench::structure::clean::output_file_name;
///
/// assert_eq!(output_file_name("1abc.cif"), "1abc.cif");
/// assert_eq!(output_file_name("1abc.cif.gz"), "1abc.cif");
/// ```
pub fn output_file_name(file_name: &str) -> &str {
    file_name.strip_suffix(".gz").unwrap_or(file_name)
}

/// Cleans one file, writing the cleaned structure into `output_dir` when it is
/// accepted.
pub fn process_file(path: &Path, output_dir: &Path, thresholds: &Thresholds) -> Result<Outcome> {
    let file_name = inputs::file_name(path);

    let parsed = read_text(path)
        .map_err(|err| err.to_string())
        .and_then(|text| {
            pdbtbx::open_mmcif_raw(&text, StrictnessLevel::Loose)
                .map(|(pdb, warnings)| (pdb, warnings, text))
                .map_err(|errors| describe(&errors))
        });

    let (pdb, warnings, text) = match parsed {
        Ok(parsed) => parsed,
        Err(reason) => {
            return Ok(Outcome {
                file_name,
                result: Err(Reject::Parse(reason)),
            });
        }
    };

    if !warnings.is_empty() {
        debug!("{file_name}: {}", describe(&warnings));
    }

    let result = match clean_structure(pdb, &text, thresholds) {
        Ok(cleaned) => {
            let output = output_dir.join(output_file_name(&file_name));

            pdbtbx::save_mmcif(
                &cleaned.pdb,
                output.to_string_lossy(),
                StrictnessLevel::Loose,
            )
            .map_err(|errors| Error::Save(output.clone(), describe(&errors)))?;

            Ok(Accepted {
                chain: cleaned.chain,
                coverage: cleaned.coverage,
                method: cleaned.method,
            })
        }
        Err(reject) => Err(reject),
    };

    Ok(Outcome { file_name, result })
}

////////////////////////////////////////////////////////////////////////////////////////
// Batch cleaning
////////////////////////////////////////////////////////////////////////////////////////

/// The configuration for a cleaning run.
#[derive(Clone, Debug)]
pub struct Config {
    /// The directory holding the mmCIF files.
    pub input_dir: PathBuf,

    /// The directory into which cleaned files and the log are written.
    pub output_dir: PathBuf,

    /// The acceptance thresholds.
    pub thresholds: Thresholds,
}

impl Config {
    /// Creates a new [`Config`] with the default thresholds.
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            thresholds: Thresholds::default(),
        }
    }
}

/// A summary of a cleaning run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Summary {
    /// The number of accepted structures.
    pub accepted: usize,

    /// The number of rejected structures.
    pub rejected: usize,
}

/// Cleans every mmCIF file in the input directory.
pub fn run(config: &Config) -> Result<Summary> {
    let paths = inputs::list(&config.input_dir, SUFFIXES)
        .map_err(|err| Error::ListInputs(config.input_dir.clone(), err))?;

    if paths.is_empty() {
        return Err(Error::NoInputs(config.input_dir.clone()));
    }

    let output_dir = &config.output_dir;

    if output_dir.exists() && !output_dir.is_dir() {
        return Err(Error::OutputNotADirectory(output_dir.clone()));
    }

    std::fs::create_dir_all(output_dir)
        .map_err(|err| Error::CreateOutputDirectory(output_dir.clone(), err))?;

    let log_path = output_dir.join(LOG_FILE_NAME);
    let log_err = |err| Error::Write(log_path.clone(), err);
    let mut log = File::create(&log_path).map(BufWriter::new).map_err(log_err)?;
    writeln!(log, "{LOG_HEADER}").map_err(log_err)?;

    let mut summary = Summary::default();

    for path in paths {
        let outcome = process_file(&path, output_dir, &config.thresholds)?;

        if outcome.result.is_ok() {
            info!("{outcome}");
            summary.accepted += 1;
        } else {
            warn!("{outcome}");
            summary.rejected += 1;
        }

        writeln!(log, "{outcome}").map_err(log_err)?;
    }

    log.flush().map_err(log_err)?;
    info!("log written to: {}", log_path.display());

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Write as _;

    use flate2::write::GzEncoder;
    use flate2::Compression;
    use pdbtbx::Model;
    use tempdir::TempDir;

    use super::*;

    /// The `_atom_site` header written by the test structures.
    const ATOM_SITE: &str = "#
loop_
_atom_site.group_PDB
_atom_site.id
_atom_site.type_symbol
_atom_site.label_atom_id
_atom_site.label_alt_id
_atom_site.label_comp_id
_atom_site.label_asym_id
_atom_site.label_entity_id
_atom_site.label_seq_id
_atom_site.pdbx_PDB_ins_code
_atom_site.Cartn_x
_atom_site.Cartn_y
_atom_site.Cartn_z
_atom_site.occupancy
_atom_site.B_iso_or_equiv
_atom_site.pdbx_formal_charge
_atom_site.auth_seq_id
_atom_site.auth_asym_id
_atom_site.pdbx_PDB_model_num
";

    /// Formats one `_atom_site` row: an alanine CA, or a water O for `HETATM`.
    fn atom(group: &str, id: usize, chain: &str, number: i64, model: usize) -> String {
        let (element, name, residue) = match group {
            "HETATM" => ("O", "O", "HOH"),
            _ => ("C", "CA", "ALA"),
        };

        format!(
            "{group} {id} {element} {name} . {residue} {chain} 1 {number} ? {x}.000 0.000 \
             0.000 1.00 10.00 ? {number} {chain} {model}\n",
            x = id * 4,
        )
    }

    /// Builds a structure with a scheme declaring residues `1..=n` of chain
    /// `A` and, in each of two models, atoms for the `observed` residues of
    /// chain `A`, a water and a second chain.
    fn structure(n: i64, observed: &[i64]) -> String {
        let mut src = String::from(
            "data_TEST\n#\nloop_\n_pdbx_poly_seq_scheme.seq_id\n\
             _pdbx_poly_seq_scheme.pdb_strand_id\n_pdbx_poly_seq_scheme.auth_seq_num\n\
             _pdbx_poly_seq_scheme.pdb_ins_code\n",
        );

        for i in 1..=n {
            let auth = if observed.contains(&i) {
                i.to_string()
            } else {
                String::from("?")
            };
            src.push_str(&format!("{i} A {auth} .\n"));
        }

        src.push_str(ATOM_SITE);

        let mut id = 1;

        for model in [1, 2] {
            for i in observed {
                src.push_str(&atom("ATOM", id, "A", *i, model));
                id += 1;
            }

            src.push_str(&atom("HETATM", id, "A", 500, model));
            id += 1;
            src.push_str(&atom("ATOM", id, "B", 1, model));
            id += 1;
        }

        src
    }

    /// Reads and cleans a structure.
    fn clean(text: &str) -> std::result::Result<Cleaned, Reject> {
        let (pdb, _) = pdbtbx::open_mmcif_raw(text, StrictnessLevel::Loose)
            .map_err(|errors| Reject::Parse(describe(&errors)))?;
        clean_structure(pdb, text, &Thresholds::default())
    }

    #[test]
    fn test_accepts_and_cleans() {
        let cleaned = clean(&structure(10, &[1, 2, 3, 4, 5, 6, 7, 8, 10])).unwrap();

        assert_eq!(cleaned.chain, "A");
        assert_eq!(cleaned.method, Method::Main);
        assert_eq!(cleaned.coverage.fraction(), 0.9);
        assert_eq!(cleaned.coverage.max_gap(), 1);

        let pdb = &cleaned.pdb;
        assert_eq!(pdb.model_count(), 1);
        assert_eq!(pdb.atom_count(), 9);
        assert!(pdb.chains().all(|chain| chain.id() == "A"));
        assert!(!pdb.atoms().any(|atom| atom.hetero()));
    }

    #[test]
    fn test_rejects() {
        let reject = clean(&structure(10, &[1, 2, 3, 7, 8, 9, 10])).unwrap_err();
        assert_eq!(reject.to_string(), "low_coverage:0.700\tmethod:main");

        let observed = (1..=100).filter(|i| !(40..=55).contains(i)).collect::<Vec<_>>();
        let reject = clean(&structure(100, &observed)).unwrap_err();
        assert_eq!(reject.to_string(), "big_internal_gap:16\tmethod:main");

        let thresholds = Thresholds::default();

        let reject = clean_structure(PDB::new(), "", &thresholds).unwrap_err();
        assert_eq!(reject.to_string(), "no_model_0:no models in structure");

        let mut pdb = PDB::new();
        pdb.add_model(Model::new(1));
        let reject = clean_structure(pdb, "", &thresholds).unwrap_err();
        assert_eq!(reject, Reject::NoChains);
    }

    #[test]
    fn test_fallback_drops_het_atoms() {
        let mut text = String::from("data_x\n");
        text.push_str(ATOM_SITE);

        for (id, number) in [1, 2, 3, 4, 5].into_iter().enumerate() {
            let group = if number == 4 { "HETATM" } else { "ATOM" };
            text.push_str(&atom(group, id + 1, "A", number, 1));
        }

        let cleaned = clean(&text).unwrap();
        assert_eq!(cleaned.method, Method::Fallback);
        assert_eq!(cleaned.coverage.fraction(), 1.0);
        assert_eq!(cleaned.pdb.atom_count(), 4);
        assert!(!cleaned.pdb.atoms().any(|atom| atom.hetero()));
    }

    #[test]
    fn test_run() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new("clean")?;
        let input_dir = dir.path().join("in");
        let output_dir = dir.path().join("out");
        fs::create_dir(&input_dir)?;

        fs::write(
            input_dir.join("a.cif"),
            structure(10, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]),
        )?;
        fs::write(input_dir.join("b.cif"), structure(10, &[1, 2, 3]))?;
        fs::write(input_dir.join("c.cif"), "this is not a structure\n")?;

        let mut encoder = GzEncoder::new(
            File::create(input_dir.join("d.cif.gz"))?,
            Compression::default(),
        );
        encoder.write_all(structure(10, &[1, 2, 3, 4, 5, 6, 7, 8]).as_bytes())?;
        encoder.finish()?;

        fs::write(input_dir.join("notes.txt"), "ignored")?;

        let summary = run(&Config::new(&input_dir, &output_dir))?;
        assert_eq!(
            summary,
            Summary {
                accepted: 2,
                rejected: 2,
            }
        );

        let log = fs::read_to_string(output_dir.join(LOG_FILE_NAME))?;
        let lines = log.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "# file_name\tSTATUS\treason_or_metrics");
        assert_eq!(
            lines[1],
            "a.cif\tACCEPT\tok\tchain:A\tcoverage:1.000\tmax_gap:0\tmethod:main"
        );
        assert_eq!(lines[2], "b.cif\tREJECT\tlow_coverage:0.300\tmethod:main");
        assert!(lines[3].starts_with("c.cif\tREJECT\t"));
        assert_eq!(
            lines[4],
            "d.cif.gz\tACCEPT\tok\tchain:A\tcoverage:0.800\tmax_gap:0\tmethod:main"
        );

        assert!(output_dir.join("a.cif").exists());
        assert!(!output_dir.join("b.cif").exists());
        assert!(output_dir.join("d.cif").exists());

        let written = fs::read_to_string(output_dir.join("d.cif"))?;
        let (pdb, _) = pdbtbx::open_mmcif_raw(&written, StrictnessLevel::Loose)
            .map_err(|errors| describe(&errors))?;
        assert_eq!(pdb.model_count(), 1);
        assert_eq!(pdb.atom_count(), 8);

        Ok(())
    }

    #[test]
    fn test_no_inputs() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new("clean")?;
        let err = run(&Config::new(dir.path(), dir.path().join("out"))).unwrap_err();

        assert!(matches!(err, Error::NoInputs(_)));
        assert!(!dir.path().join("out").exists());

        Ok(())
    }
}
