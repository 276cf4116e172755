//! Stored increments.

use std::str::FromStr;

use crate::error::ManageError;
use crate::fileref::{FileRef, IncrementName};
use crate::kind::EncodedType;
use crate::time::TimeCodec;

/// A completed increment together with its decoded time.
#[derive(Debug, Clone)]
pub struct Increment<F: FileRef> {
    file: F,
    name: IncrementName,
    time: i64,
}

impl<F: FileRef> Increment<F> {
    /// Wrap an increment file.
    ///
    /// Fails if the path is not named like an increment or if its
    /// timestamp token cannot be decoded.
    pub fn new(file: F, codec: &impl TimeCodec) -> Result<Self, ManageError> {
        let name = file
            .increment_name()
            .ok_or_else(|| ManageError::NotAnIncrement {
                path: file.path().to_path_buf(),
            })?;
        let time = codec.decode(name.timestamp())?;
        Ok(Self { file, name, time })
    }

    /// The increment file itself.
    pub fn file(&self) -> &F {
        &self.file
    }

    /// Parsed file name.
    pub fn name(&self) -> &IncrementName {
        &self.name
    }

    /// Time of the increment, in epoch seconds.
    pub fn time(&self) -> i64 {
        self.time
    }

    /// Type suffix exactly as found on disk.
    pub fn encoded_type(&self) -> &str {
        self.name.kind()
    }

    /// Parsed type suffix.
    pub fn kind(&self) -> Result<EncodedType, ManageError> {
        EncodedType::from_str(self.name.kind()).map_err(|_| ManageError::UnknownEncodedType {
            path: self.file.path().to_path_buf(),
            found: self.name.kind().to_string(),
        })
    }

    /// Handle on the path this increment was derived from.
    pub fn base(&self) -> Option<F> {
        self.file.increment_base()
    }

    /// Name of the path this increment was derived from.
    pub fn base_name(&self) -> &str {
        self.name.base()
    }

    /// Whether the increment body is gzip-compressed.
    pub fn is_compressed(&self) -> bool {
        self.name.is_compressed()
    }

    /// Formatted time of the increment.
    pub fn pretty_time(&self, codec: &impl TimeCodec) -> String {
        codec.pretty(self.time)
    }

    /// Two-line description of the increment.
    pub fn full_description(&self, codec: &impl TimeCodec) -> String {
        format!(
            "Increment file {}\nDate: {}",
            self.file.path().display(),
            self.pretty_time(codec)
        )
    }
}
