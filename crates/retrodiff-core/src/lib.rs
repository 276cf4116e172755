//! Core types and traits for retrodiff.
//!
//! This crate provides the building blocks shared by the increment
//! management tools: semantic types, the increment naming convention,
//! filesystem handles, time codecs and configuration.

mod config;
mod error;
mod fileref;
mod increment;
mod kind;
mod time;

pub use config::{
    DEFAULT_DATA_DIR, DEFAULT_INCREMENTS_DIR, ManageConfig, ManageConfigBuilder,
};
pub use error::ManageError;
pub use fileref::{FileRef, IncrementName, LocalFile};
pub use increment::Increment;
pub use kind::{EncodedType, SemanticType};
pub use time::{TimeCodec, TimeZoneMode, W3Time, looks_like_time_token, parse_time_spec};
