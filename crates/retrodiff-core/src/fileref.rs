//! Filesystem handles and the increment naming convention.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use compact_str::{CompactString, format_compact};

use crate::error::ManageError;
use crate::time::looks_like_time_token;

const COMPRESSED_SUFFIX: &str = ".gz";

/// Parsed form of an increment file name: `<base>.<timestamp>.<type>[.gz]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IncrementName {
    base: CompactString,
    timestamp: CompactString,
    kind: CompactString,
    compressed: bool,
}

impl IncrementName {
    /// Parse a file name, returning `None` if it is not an increment name.
    ///
    /// The type suffix is kept verbatim; unrecognized suffixes are rejected
    /// later, when the increment is classified.
    pub fn parse(file_name: &str) -> Option<Self> {
        let (stem, compressed) = match file_name.strip_suffix(COMPRESSED_SUFFIX) {
            Some(stem) => (stem, true),
            None => (file_name, false),
        };

        let mut parts = stem.rsplitn(3, '.');
        let kind = parts.next()?;
        let timestamp = parts.next()?;
        let base = parts.next()?;

        if base.is_empty() || kind.is_empty() || !looks_like_time_token(timestamp) {
            return None;
        }

        Some(Self {
            base: base.into(),
            timestamp: timestamp.into(),
            kind: kind.into(),
            compressed,
        })
    }

    /// Build the name of a new increment.
    pub fn new(
        base: impl Into<CompactString>,
        timestamp: impl Into<CompactString>,
        kind: impl Into<CompactString>,
        compressed: bool,
    ) -> Self {
        Self {
            base: base.into(),
            timestamp: timestamp.into(),
            kind: kind.into(),
            compressed,
        }
    }

    /// Name of the entity this increment belongs to.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Raw timestamp token.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Raw type suffix.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Whether the increment body is gzip-compressed.
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Render back into a file name.
    pub fn to_file_name(&self) -> CompactString {
        let suffix = if self.compressed { COMPRESSED_SUFFIX } else { "" };
        format_compact!("{}.{}.{}{}", self.base, self.timestamp, self.kind, suffix)
    }
}

impl fmt::Display for IncrementName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_file_name())
    }
}

/// A handle on a path that can be probed, listed and deleted.
///
/// Probes never follow symlinks and never cache: every call reads the
/// current state of the filesystem. A path that is absent reads as `false`;
/// a path that cannot be inspected is an error.
pub trait FileRef: Clone + fmt::Debug {
    /// The path this handle refers to.
    fn path(&self) -> &Path;

    /// Whether anything exists at the path.
    fn exists(&self) -> Result<bool, ManageError>;

    /// Whether the path is a directory.
    fn is_dir(&self) -> Result<bool, ManageError>;

    /// Whether the path is an ordinary file.
    fn is_regular(&self) -> Result<bool, ManageError>;

    /// Names of the directory's entries, sorted.
    fn list_dir(&self) -> Result<Vec<OsString>, ManageError>;

    /// Handle on a child of this path.
    fn append(&self, name: &OsStr) -> Self;

    /// Handle on the containing directory.
    fn parent(&self) -> Option<Self>;

    /// Delete a file or an empty directory.
    fn delete(&self) -> io::Result<()>;

    /// Final path component, if it is valid UTF-8.
    fn file_name(&self) -> Option<&str> {
        self.path().file_name()?.to_str()
    }

    /// Parsed increment name, if the path follows the convention.
    fn increment_name(&self) -> Option<IncrementName> {
        IncrementName::parse(self.file_name()?)
    }

    /// Whether the path follows the increment naming convention.
    fn is_increment(&self) -> bool {
        self.increment_name().is_some()
    }

    /// Handle on the path this increment was derived from.
    fn increment_base(&self) -> Option<Self> {
        let name = self.increment_name()?;
        Some(self.parent()?.append(OsStr::new(name.base())))
    }
}

/// [`FileRef`] over the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalFile {
    path: PathBuf,
}

impl LocalFile {
    /// Create a handle on a local path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Consume the handle, returning its path.
    pub fn into_path(self) -> PathBuf {
        self.path
    }

    /// `None` when nothing is there, including a path whose parent is not a
    /// directory.
    fn lstat(&self) -> Result<Option<fs::Metadata>, ManageError> {
        match fs::symlink_metadata(&self.path) {
            Ok(metadata) => Ok(Some(metadata)),
            Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
                Ok(None)
            }
            Err(e) => Err(ManageError::io(&self.path, e)),
        }
    }
}

impl FileRef for LocalFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn exists(&self) -> Result<bool, ManageError> {
        Ok(self.lstat()?.is_some())
    }

    fn is_dir(&self) -> Result<bool, ManageError> {
        Ok(self.lstat()?.is_some_and(|m| m.is_dir()))
    }

    fn is_regular(&self) -> Result<bool, ManageError> {
        Ok(self.lstat()?.is_some_and(|m| m.is_file()))
    }

    fn list_dir(&self) -> Result<Vec<OsString>, ManageError> {
        let entries = fs::read_dir(&self.path).map_err(|e| ManageError::io(&self.path, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ManageError::io(&self.path, e))?;
            names.push(entry.file_name());
        }
        names.sort();
        Ok(names)
    }

    fn append(&self, name: &OsStr) -> Self {
        Self::new(self.path.join(name))
    }

    fn parent(&self) -> Option<Self> {
        self.path.parent().map(Self::new)
    }

    fn delete(&self) -> io::Result<()> {
        let metadata = fs::symlink_metadata(&self.path)?;
        if metadata.is_dir() {
            fs::remove_dir(&self.path)
        } else {
            fs::remove_file(&self.path)
        }
    }
}

impl From<PathBuf> for LocalFile {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

impl From<&Path> for LocalFile {
    fn from(path: &Path) -> Self {
        Self::new(path)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_parse_plain() {
        let name = IncrementName::parse("notes.txt.2002-03-05T12:00:00-07:00.diff").unwrap();
        assert_eq!(name.base(), "notes.txt");
        assert_eq!(name.timestamp(), "2002-03-05T12:00:00-07:00");
        assert_eq!(name.kind(), "diff");
        assert!(!name.is_compressed());
    }

    #[test]
    fn test_parse_compressed() {
        let name = IncrementName::parse("db.2002-03-05T12:00:00Z.snapshot.gz").unwrap();
        assert_eq!(name.base(), "db");
        assert_eq!(name.kind(), "snapshot");
        assert!(name.is_compressed());
        assert_eq!(name.to_file_name(), "db.2002-03-05T12:00:00Z.snapshot.gz");
    }

    #[test]
    fn test_parse_keeps_unknown_kind() {
        let name = IncrementName::parse("x.2002-03-05T12:00:00Z.weird").unwrap();
        assert_eq!(name.kind(), "weird");
    }

    #[test]
    fn test_parse_rejects_non_increments() {
        assert!(IncrementName::parse("notes.txt").is_none());
        assert!(IncrementName::parse("archive.tar.gz").is_none());
        assert!(IncrementName::parse(".2002-03-05T12:00:00Z.dir").is_none());
        assert!(IncrementName::parse("a.2002-03-05T12:00:00Z.").is_none());
        assert!(IncrementName::parse("plain").is_none());
    }

    #[test]
    fn test_local_probes() {
        let temp = TempDir::new().unwrap();
        let dir = LocalFile::new(temp.path());
        let file = dir.append(OsStr::new("a.txt"));
        let missing = dir.append(OsStr::new("nope"));
        fs::write(file.path(), b"x").unwrap();

        assert!(dir.is_dir().unwrap());
        assert!(file.is_regular().unwrap());
        assert!(!file.is_dir().unwrap());
        assert!(!missing.exists().unwrap());
        assert_eq!(dir.list_dir().unwrap(), vec![OsString::from("a.txt")]);
    }

    #[test]
    fn test_path_under_a_file_is_absent() {
        let temp = TempDir::new().unwrap();
        let file = LocalFile::new(temp.path().join("a.txt"));
        fs::write(file.path(), b"x").unwrap();

        let below = file.append(OsStr::new("child"));
        assert!(!below.exists().unwrap());
        assert!(!below.is_dir().unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_is_an_error() {
        let temp = TempDir::new().unwrap();
        let link = temp.path().join("loop");
        std::os::unix::fs::symlink(&link, &link).unwrap();

        // the link itself can be stat'ed, a path through it cannot
        assert!(LocalFile::new(&link).exists().unwrap());
        let through = LocalFile::new(link.join("x"));
        assert!(matches!(through.exists(), Err(ManageError::Io { .. })));
        assert!(through.is_dir().is_err());
        assert!(through.is_regular().is_err());
    }

    #[test]
    fn test_local_delete() {
        let temp = TempDir::new().unwrap();
        let root = LocalFile::new(temp.path());
        let sub = root.append(OsStr::new("sub"));
        fs::create_dir(sub.path()).unwrap();
        let file = sub.append(OsStr::new("f"));
        fs::write(file.path(), b"x").unwrap();

        // non-empty directories are never removed recursively
        assert!(sub.delete().is_err());
        file.delete().unwrap();
        sub.delete().unwrap();
        assert!(!sub.exists().unwrap());
        assert_eq!(file.delete().unwrap_err().kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_increment_base() {
        let inc = LocalFile::new("/backup/data/increments/docs/a.txt.2002-03-05T12:00:00Z.diff");
        let base = inc.increment_base().unwrap();
        assert_eq!(base.path(), Path::new("/backup/data/increments/docs/a.txt"));
        assert!(inc.is_increment());
        assert!(!base.is_increment());
    }
}
