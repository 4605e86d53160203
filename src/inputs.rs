//! Gathering the input files for a batch run.

use std::io;
use std::path::Path;
use std::path::PathBuf;

/// Lists the files directly within `dir` whose names end with one of
/// `suffixes`, sorted by path.
///
/// # Examples
///
/// ```
/// use std::fs;
///
/// let dir = tempdir::TempDir::new("inputs")?;
/// fs::write(dir.path().join("b.a3m"), "")?;
/// fs::write(dir.path().join("a.a3m"), "")?;
/// fs::write(dir.path().join("c.txt"), "")?;
///
/// let files = msabench::inputs::list(dir.path(), &[".a3m"])?;
/// let names = files
///     .iter()
///     .map(|path| path.file_name().unwrap().to_str().unwrap())
///     .collect::<Vec<_>>();
/// assert_eq!(names, vec!["a.a3m", "b.a3m"]);
///
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn list(dir: &Path, suffixes: &[&str]) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if !path.is_file() {
            continue;
        }

        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| suffixes.iter().any(|suffix| name.ends_with(suffix)))
            .unwrap_or(false);

        if matches {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Gets the file name of a path as a lossy string.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
