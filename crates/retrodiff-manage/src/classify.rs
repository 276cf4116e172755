//! Semantic classification of live paths and increments.

use retrodiff_core::{FileRef, Increment, ManageError, SemanticType};

/// Classify a live path by its filesystem type.
///
/// A path that exists but cannot be inspected is an error, not `missing`.
pub fn file_type<F: FileRef>(file: &F) -> Result<SemanticType, ManageError> {
    let kind = if !file.exists()? {
        SemanticType::Missing
    } else if file.is_dir()? {
        SemanticType::Directory
    } else if file.is_regular()? {
        SemanticType::Regular
    } else {
        SemanticType::Special
    };
    Ok(kind)
}

/// Classify the entity an increment records.
///
/// Snapshots carry no type in their name, so the stored snapshot itself is
/// probed. An unrecognized suffix is an error, never a default.
pub fn increment_type<F: FileRef>(inc: &Increment<F>) -> Result<SemanticType, ManageError> {
    match inc.kind()?.implied_type() {
        Some(kind) => Ok(kind),
        None => file_type(inc.file()),
    }
}
