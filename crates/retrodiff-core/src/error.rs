//! Error types for increment management.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while classifying, cataloging or pruning increments.
#[derive(Debug, Error)]
pub enum ManageError {
    /// The path does not follow the increment naming convention.
    #[error("Not an increment file: {path}")]
    NotAnIncrement { path: PathBuf },

    /// The increment's type suffix is outside `dir`, `diff`, `missing`, `snapshot`.
    #[error("Unknown increment type {found:?} at {path}")]
    UnknownEncodedType { path: PathBuf, found: String },

    /// A timestamp token could not be decoded.
    #[error("Cannot decode timestamp {token:?}: {reason}")]
    TimestampDecode { token: String, reason: String },

    /// Deleting a path failed for a reason other than it being gone already.
    #[error("Failed to delete {path}: {source}")]
    Deletion {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A user-supplied time could not be understood.
    #[error("Invalid time specification: {spec:?}")]
    InvalidTimeSpec { spec: String },

    /// Pruning was asked to run against a non-local context.
    #[error("Pruning must run on the local host, not {host}")]
    RemoteContext { host: String },

    /// The data directory holds no `current_mirror` marker.
    #[error("No current mirror marker in {path}")]
    MirrorMarkerMissing { path: PathBuf },

    /// No backup repository encloses the path.
    #[error("No backup repository found above {path}")]
    RepositoryNotFound { path: PathBuf },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl ManageError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ => Self::Io { path, source },
        }
    }

    /// Whether this is an I/O error for a path that no longer exists.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }

    /// Create a timestamp decode error.
    pub fn timestamp(token: impl Into<String>, reason: impl ToString) -> Self {
        Self::TimestampDecode {
            token: token.into(),
            reason: reason.to_string(),
        }
    }
}
