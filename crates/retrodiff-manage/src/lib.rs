//! Increment management for retrodiff.
//!
//! A reverse-incremental backup keeps a mirror of the current tree plus
//! increments recording how each path looked in the past. This crate:
//!
//! - **Classifies** paths and increments as `regular`, `directory`,
//!   `missing` or `special`
//! - **Catalogs** the increments of a path, oldest first, with the current
//!   mirror last
//! - **Prunes** increments older than a cutoff and reclaims the
//!   directories they leave empty
//!
//! # Listing increments
//!
//! ```rust,no_run
//! use retrodiff_core::ManageConfig;
//! use retrodiff_manage::{BackupLayout, describe_parsable};
//!
//! let layout = BackupLayout::discover(
//!     std::path::Path::new("/backup/docs/report.txt"),
//!     ManageConfig::new("/backup"),
//! )?;
//! let (increments, mirror) = layout.increments_for(std::path::Path::new("/backup/docs/report.txt"))?;
//! println!("{}", describe_parsable(&increments, layout.mirror_time()?, &mirror)?);
//! # Ok::<(), retrodiff_core::ManageError>(())
//! ```
//!
//! # Pruning
//!
//! ```rust,no_run
//! use retrodiff_core::{LocalFile, W3Time};
//! use retrodiff_manage::RetentionPruner;
//!
//! let codec = W3Time::local();
//! let report = RetentionPruner::new(&codec)
//!     .prune_older_than(&LocalFile::new("/backup/rdiff-backup-data"), 1_000_000_000)?;
//! println!("{}", report.summary());
//! # Ok::<(), retrodiff_core::ManageError>(())
//! ```

mod catalog;
pub mod classify;
mod layout;
mod prune;

pub use catalog::{
    CatalogEntry, catalog_entries, describe_human, describe_parsable, find_increments,
    sort_increments,
};
pub use classify::{file_type, increment_type};
pub use layout::{BackupLayout, CURRENT_MIRROR_MARKER, DATA_SUFFIX};
pub use prune::{ExecutionContext, PruneReport, RetentionPruner, descendants_post_order};

// Re-export core types
pub use retrodiff_core::{FileRef, Increment, LocalFile, ManageConfig, ManageError, SemanticType};
