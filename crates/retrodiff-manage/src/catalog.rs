//! Time-ordered descriptions of the increments of one path.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use retrodiff_core::{FileRef, Increment, ManageError, SemanticType, TimeCodec};

use crate::classify::{file_type, increment_type};

/// One line of a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Time in epoch seconds.
    pub time: i64,
    /// What the path was at that time.
    pub kind: SemanticType,
    /// Increment file, or the mirror path for the current entry.
    pub path: PathBuf,
    /// Whether this entry is the current mirror rather than an increment.
    pub current: bool,
}

/// Sort increments oldest first, keeping input order among equal times.
pub fn sort_increments<F: FileRef>(mut increments: Vec<Increment<F>>) -> Vec<Increment<F>> {
    increments.sort_by_key(Increment::time);
    increments
}

fn ordered<F: FileRef>(increments: &[Increment<F>]) -> Vec<&Increment<F>> {
    let mut ordered: Vec<&Increment<F>> = increments.iter().collect();
    ordered.sort_by_key(|inc| inc.time());
    ordered
}

/// Find the increments stored in `dir` for the entity named `base_name`.
///
/// A missing directory simply holds no increments. Any increment whose
/// timestamp cannot be decoded aborts the search.
pub fn find_increments<F: FileRef>(
    dir: &F,
    base_name: &str,
    codec: &impl TimeCodec,
) -> Result<Vec<Increment<F>>, ManageError> {
    if !dir.is_dir()? {
        debug!(dir = %dir.path().display(), "No increment directory");
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for name in dir.list_dir()? {
        let file = dir.append(&name);
        let matches = file
            .increment_name()
            .is_some_and(|inc_name| inc_name.base() == base_name);
        if matches {
            found.push(Increment::new(file, codec)?);
        }
    }

    debug!(dir = %dir.path().display(), base_name, count = found.len(), "Found increments");
    Ok(sort_increments(found))
}

/// Ordered catalog entries: increments oldest first, then the current mirror.
pub fn catalog_entries<F: FileRef>(
    increments: &[Increment<F>],
    mirror_time: i64,
    mirror: &F,
) -> Result<Vec<CatalogEntry>, ManageError> {
    let mut entries = Vec::with_capacity(increments.len() + 1);
    for inc in ordered(increments) {
        entries.push(CatalogEntry {
            time: inc.time(),
            kind: increment_type(inc)?,
            path: inc.file().path().to_path_buf(),
            current: false,
        });
    }
    entries.push(CatalogEntry {
        time: mirror_time,
        kind: file_type(mirror)?,
        path: mirror.path().to_path_buf(),
        current: true,
    });
    Ok(entries)
}

/// Machine-readable catalog, one `<seconds> <type>` line per entry.
///
/// Lines run oldest to newest; the last line is always the current mirror:
///
/// ```text
/// 10000 regular
/// 20000 directory
/// 30000 missing
/// 40000 regular
/// ```
pub fn describe_parsable<F: FileRef>(
    increments: &[Increment<F>],
    mirror_time: i64,
    mirror: &F,
) -> Result<String, ManageError> {
    let lines: Vec<String> = catalog_entries(increments, mirror_time, mirror)?
        .iter()
        .map(|entry| format!("{} {}", entry.time, entry.kind))
        .collect();
    Ok(lines.join("\n"))
}

/// Human-readable catalog of the increments of `mirror`.
///
/// Nothing is classified, so the mirror is never probed.
pub fn describe_human<F: FileRef>(
    increments: &[Increment<F>],
    mirror_time: i64,
    mirror: &F,
    codec: &impl TimeCodec,
) -> String {
    debug!(mirror = %mirror.path().display(), count = increments.len(), "Describing increments");
    let mut lines = Vec::with_capacity(increments.len() + 2);
    lines.push(format!("Found {} increments:", increments.len()));
    for inc in ordered(increments) {
        let tail = inc
            .file()
            .path()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        lines.push(format!("    {}   {}", tail, inc.pretty_time(codec)));
    }
    lines.push(format!("Current mirror: {}", codec.pretty(mirror_time)));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use std::fs;

    use retrodiff_core::{LocalFile, W3Time};
    use tempfile::TempDir;

    use super::*;

    fn increment(temp: &TempDir, secs: i64, kind: &str) -> Increment<LocalFile> {
        let codec = W3Time::utc();
        let path = temp
            .path()
            .join(format!("file.{}.{kind}", codec.encode(secs)));
        Increment::new(LocalFile::new(path), &codec).unwrap()
    }

    #[test]
    fn test_sort_is_stable() {
        let temp = TempDir::new().unwrap();
        let sorted = sort_increments(vec![
            increment(&temp, 300, "diff"),
            increment(&temp, 100, "dir"),
            increment(&temp, 100, "missing"),
        ]);
        let kinds: Vec<&str> = sorted.iter().map(|i| i.encoded_type()).collect();
        assert_eq!(kinds, ["dir", "missing", "diff"]);
    }

    #[test]
    fn test_parsable_mirror_last() {
        let temp = TempDir::new().unwrap();
        let mirror = temp.path().join("file");
        fs::create_dir(&mirror).unwrap();

        let incs = vec![increment(&temp, 500, "diff"), increment(&temp, 200, "missing")];
        let text = describe_parsable(&incs, 100, &LocalFile::new(mirror)).unwrap();
        assert_eq!(text, "200 missing\n500 regular\n100 directory");
    }

    #[test]
    fn test_parsable_without_increments() {
        let temp = TempDir::new().unwrap();
        let mirror = LocalFile::new(temp.path().join("gone"));
        let text = describe_parsable::<LocalFile>(&[], 42, &mirror).unwrap();
        assert_eq!(text, "42 missing");
    }

    #[test]
    fn test_human() {
        let temp = TempDir::new().unwrap();
        let codec = W3Time::utc();
        let incs = vec![increment(&temp, 1015329600, "diff")];
        let mirror = LocalFile::new(temp.path().join("file"));
        let text = describe_human(&incs, 1015416000, &mirror, &codec);
        assert_eq!(
            text,
            "Found 1 increments:\n    file.2002-03-05T12:00:00Z.diff   Tue Mar  5 12:00:00 2002\nCurrent mirror: Wed Mar  6 12:00:00 2002"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_mirror_fails_catalog() {
        let temp = TempDir::new().unwrap();
        let link = temp.path().join("loop");
        std::os::unix::fs::symlink(&link, &link).unwrap();
        let mirror = LocalFile::new(link.join("file"));

        let err = describe_parsable::<LocalFile>(&[], 42, &mirror).unwrap_err();
        assert!(matches!(err, ManageError::Io { .. }));
        // the human form does not classify and still renders
        let text = describe_human::<LocalFile>(&[], 42, &mirror, &W3Time::utc());
        assert!(text.starts_with("Found 0 increments:"));
    }

    #[test]
    fn test_find_increments_filters_base() {
        let temp = TempDir::new().unwrap();
        let codec = W3Time::utc();
        for name in [
            format!("file.{}.diff", codec.encode(300)),
            format!("file.{}.dir", codec.encode(100)),
            format!("other.{}.diff", codec.encode(200)),
            "file".to_string(),
        ] {
            fs::write(temp.path().join(name), b"").unwrap();
        }

        let found = find_increments(&LocalFile::new(temp.path()), "file", &codec).unwrap();
        let times: Vec<i64> = found.iter().map(Increment::time).collect();
        assert_eq!(times, [100, 300]);
    }

    #[test]
    fn test_find_increments_missing_dir() {
        let temp = TempDir::new().unwrap();
        let dir = LocalFile::new(temp.path().join("none"));
        assert!(find_increments(&dir, "x", &W3Time::utc()).unwrap().is_empty());
    }
}
