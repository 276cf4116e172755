//! On-disk layout of a backup repository.

use std::ffi::OsStr;
use std::path::Path;

use tracing::{debug, warn};

use retrodiff_core::{FileRef, Increment, LocalFile, ManageConfig, ManageError, TimeCodec};

use crate::catalog::find_increments;
use crate::prune::{ExecutionContext, PruneReport, RetentionPruner};

/// Base name of the markers recording when the mirror was last updated.
pub const CURRENT_MIRROR_MARKER: &str = "current_mirror";

/// Type suffix of metadata files in the data directory.
pub const DATA_SUFFIX: &str = "data";

/// A repository: the mirror plus its data directory.
#[derive(Debug, Clone)]
pub struct BackupLayout {
    config: ManageConfig,
}

impl BackupLayout {
    /// Use the repository named by `config`.
    pub fn new(config: ManageConfig) -> Self {
        Self { config }
    }

    /// Find the repository enclosing `path`.
    ///
    /// Walks up from `path` to the first directory holding a data directory;
    /// `config.repository` is replaced by that directory.
    pub fn discover(path: &Path, mut config: ManageConfig) -> Result<Self, ManageError> {
        let root = path
            .ancestors()
            .find(|dir| dir.join(&config.data_dir_name).is_dir())
            .ok_or_else(|| ManageError::RepositoryNotFound {
                path: path.to_path_buf(),
            })?;
        debug!(repository = %root.display(), "Discovered repository");
        config.repository = root.to_path_buf();
        Ok(Self { config })
    }

    /// The configuration in use.
    pub fn config(&self) -> &ManageConfig {
        &self.config
    }

    /// The data directory.
    pub fn data_dir(&self) -> LocalFile {
        LocalFile::new(self.config.data_dir())
    }

    /// The increments directory.
    pub fn increments_dir(&self) -> LocalFile {
        LocalFile::new(self.config.increments_dir())
    }

    /// Time of the current mirror, from the newest `current_mirror` marker.
    pub fn mirror_time(&self) -> Result<i64, ManageError> {
        let data_dir = self.data_dir();
        let codec = self.config.codec();

        let mut newest: Option<i64> = None;
        for name in data_dir.list_dir()? {
            let Some(marker) = data_dir.append(&name).increment_name() else {
                continue;
            };
            if marker.base() != CURRENT_MIRROR_MARKER || marker.kind() != DATA_SUFFIX {
                continue;
            }
            let time = codec.decode(marker.timestamp())?;
            newest = Some(newest.map_or(time, |t| t.max(time)));
        }

        newest.ok_or_else(|| ManageError::MirrorMarkerMissing {
            path: data_dir.into_path(),
        })
    }

    /// The increments recorded for a mirrored path, oldest first, and a
    /// handle on the path itself.
    ///
    /// The repository root's own increments sit in the data directory,
    /// named after the increments directory.
    pub fn increments_for(
        &self,
        path: &Path,
    ) -> Result<(Vec<Increment<LocalFile>>, LocalFile), ManageError> {
        let relative = path
            .strip_prefix(&self.config.repository)
            .map_err(|_| ManageError::RepositoryNotFound {
                path: path.to_path_buf(),
            })?;
        let codec = self.config.codec();

        let increments = match relative.file_name() {
            None => find_increments(&self.data_dir(), &self.config.increments_dir_name, &codec)?,
            Some(name) => {
                let dir = self
                    .increments_dir()
                    .path()
                    .join(relative.parent().unwrap_or(Path::new("")));
                find_increments(&LocalFile::new(dir), &base_name(name), &codec)?
            }
        };

        Ok((increments, LocalFile::new(path)))
    }

    /// Prune the data directory.
    ///
    /// The cutoff is capped at the current mirror time so the marker of the
    /// current mirror always survives.
    pub fn prune_older_than(
        &self,
        cutoff: i64,
        context: ExecutionContext,
    ) -> Result<PruneReport, ManageError> {
        let mirror_time = self.mirror_time()?;
        let cutoff = if cutoff > mirror_time {
            warn!(cutoff, mirror_time, "Cutoff is newer than the current mirror, capping");
            mirror_time
        } else {
            cutoff
        };

        let codec = self.config.codec();
        RetentionPruner::new(&codec)
            .with_context(context)
            .dry_run(self.config.dry_run)
            .prune_older_than(&self.data_dir(), cutoff)
    }

    /// Path of the repository root.
    pub fn repository(&self) -> &Path {
        &self.config.repository
    }
}

fn base_name(name: &OsStr) -> String {
    name.to_string_lossy().into_owned()
}
