//! Semantic and encoded increment types.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// What kind of entity a path or increment represents.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumIter,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    /// Ordinary file.
    Regular,
    /// Directory.
    Directory,
    /// Path did not exist.
    Missing,
    /// Anything else (devices, sockets, symlinks, fifos).
    Special,
}

/// Type tag carried in an increment's file name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumString,
    EnumIter,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EncodedType {
    /// Directory marker.
    Dir,
    /// Reverse diff against the newer version.
    Diff,
    /// The base did not exist at that time.
    Missing,
    /// Full copy of the old content.
    Snapshot,
}

impl EncodedType {
    /// The semantic type implied by the tag alone, if any.
    ///
    /// Snapshots return `None`: their type is whatever their stored content is.
    pub fn implied_type(self) -> Option<SemanticType> {
        match self {
            Self::Dir => Some(SemanticType::Directory),
            Self::Diff => Some(SemanticType::Regular),
            Self::Missing => Some(SemanticType::Missing),
            Self::Snapshot => None,
        }
    }
}
