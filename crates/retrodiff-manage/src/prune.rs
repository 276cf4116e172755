//! Cutoff-based deletion of increments and reclamation of empty directories.

use std::collections::HashSet;
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use retrodiff_core::{FileRef, Increment, ManageError, TimeCodec};

/// Where a prune is being executed.
///
/// Pruning walks and deletes through the local filesystem only; callers
/// holding a remote connection must run it on the far side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExecutionContext {
    /// This process owns the tree.
    #[default]
    Local,
    /// The tree lives on another host.
    Remote { host: String },
}

/// What a prune pass removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneReport {
    /// Increments older than the cutoff.
    pub increments_removed: usize,
    /// Directories left empty.
    pub directories_removed: usize,
    /// Eligible paths that were already gone when deleted.
    pub vanished: usize,
    /// Removed paths, in deletion order.
    pub removed: Vec<PathBuf>,
    /// Whether nothing was actually deleted.
    pub dry_run: bool,
}

impl PruneReport {
    /// Number of removed paths.
    pub fn total(&self) -> usize {
        self.increments_removed + self.directories_removed
    }

    /// Whether the pass removed nothing.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Get a human-readable summary of the pass.
    pub fn summary(&self) -> String {
        let action = if self.dry_run { "Would delete" } else { "Deleted" };
        format!(
            "{} {} increments and {} empty directories",
            action, self.increments_removed, self.directories_removed
        )
    }
}

#[derive(Debug, Clone, Copy)]
enum Removal {
    StaleIncrement,
    EmptyDirectory,
}

/// Deletes increments older than a cutoff, then the directories they leave empty.
pub struct RetentionPruner<'a, C: TimeCodec> {
    codec: &'a C,
    context: ExecutionContext,
    dry_run: bool,
}

impl<'a, C: TimeCodec> RetentionPruner<'a, C> {
    /// Create a pruner for the local filesystem.
    pub fn new(codec: &'a C) -> Self {
        Self {
            codec,
            context: ExecutionContext::Local,
            dry_run: false,
        }
    }

    /// Set the execution context.
    pub fn with_context(mut self, context: ExecutionContext) -> Self {
        self.context = context;
        self
    }

    /// Only report what would be deleted.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Delete every increment under `root` strictly older than `cutoff`
    /// (epoch seconds), then every directory that is empty once examined.
    ///
    /// Children are always examined before their directory, so a directory
    /// holding only stale increments is reclaimed in the same pass. The
    /// first deletion failure aborts the pass; earlier deletions stand.
    pub fn prune_older_than<F: FileRef>(
        &self,
        root: &F,
        cutoff: i64,
    ) -> Result<PruneReport, ManageError> {
        if let ExecutionContext::Remote { host } = &self.context {
            return Err(ManageError::RemoteContext { host: host.clone() });
        }

        let paths = descendants_post_order(root)?;
        debug!(
            root = %root.path().display(),
            cutoff,
            paths = paths.len(),
            dry_run = self.dry_run,
            "Pruning"
        );

        let mut report = PruneReport {
            dry_run: self.dry_run,
            ..Default::default()
        };
        // only populated in dry runs, where nothing leaves the disk
        let mut would_remove: HashSet<PathBuf> = HashSet::new();

        for file in paths {
            let Some(removal) = self.removal(&file, cutoff, &would_remove)? else {
                continue;
            };
            if self.remove(&file, removal, &mut report)? && self.dry_run {
                would_remove.insert(file.path().to_path_buf());
            }
        }

        Ok(report)
    }

    fn removal<F: FileRef>(
        &self,
        file: &F,
        cutoff: i64,
        would_remove: &HashSet<PathBuf>,
    ) -> Result<Option<Removal>, ManageError> {
        if file.is_increment() {
            let inc = Increment::new(file.clone(), self.codec)?;
            if inc.time() < cutoff {
                return Ok(Some(Removal::StaleIncrement));
            }
        }

        if file.is_dir()? {
            let Some(names) = live_listing(file)? else {
                return Ok(None);
            };
            let empty = names
                .iter()
                .all(|name| would_remove.contains(file.append(name).path()));
            if empty {
                return Ok(Some(Removal::EmptyDirectory));
            }
        }

        Ok(None)
    }

    /// Returns whether the path counts as removed.
    fn remove<F: FileRef>(
        &self,
        file: &F,
        removal: Removal,
        report: &mut PruneReport,
    ) -> Result<bool, ManageError> {
        let path = file.path();

        if self.dry_run {
            info!(path = %path.display(), ?removal, "Would delete");
        } else {
            info!(path = %path.display(), ?removal, "Deleting");
            match file.delete() {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    warn!(path = %path.display(), "Already gone");
                    report.vanished += 1;
                    return Ok(false);
                }
                Err(source) => {
                    return Err(ManageError::Deletion {
                        path: path.to_path_buf(),
                        source,
                    });
                }
            }
        }

        match removal {
            Removal::StaleIncrement => report.increments_removed += 1,
            Removal::EmptyDirectory => report.directories_removed += 1,
        }
        report.removed.push(path.to_path_buf());
        Ok(true)
    }
}

/// Every path under `root`, `root` included, with children before their directory.
///
/// Symlinks are not followed.
pub fn descendants_post_order<F: FileRef>(root: &F) -> Result<Vec<F>, ManageError> {
    let mut out = Vec::new();
    collect_post_order(root, &mut out)?;
    Ok(out)
}

fn collect_post_order<F: FileRef>(file: &F, out: &mut Vec<F>) -> Result<(), ManageError> {
    if file.is_dir()? {
        let Some(names) = live_listing(file)? else {
            return Ok(());
        };
        for name in names {
            collect_post_order(&file.append(&name), out)?;
        }
    }
    out.push(file.clone());
    Ok(())
}

/// Directory listing, or `None` if the directory disappeared after it was probed.
fn live_listing<F: FileRef>(dir: &F) -> Result<Option<Vec<OsString>>, ManageError> {
    match dir.list_dir() {
        Ok(names) => Ok(Some(names)),
        Err(e) if e.is_not_found() => {
            debug!(path = %dir.path().display(), "Directory vanished before listing");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
