//! # Error Types
//!
//! This module defines all error types for the vamp trainer.
//!
//! Most runtime trouble is absorbed locally: an empty selection falls back to
//! the full universe, a missing sample mutes one note, and out-of-range
//! settings are clamped. What remains here are the failures a caller has to
//! see.
//!
//! ## Error Types
//! - `ConfigError` - Invalid YAML configuration
//! - `UnknownRoot` / `UnknownQuality` - Names that don't resolve to theory tables
//! - `AudioUnavailable` - No audio output on this host, the session cannot start
//! - `SampleError` - A sample file could not be read or decoded
//!
//! ## Usage
//! ```rust
//! use vamp::{config::TrainerConfig, TrainerError};
//!
//! match TrainerConfig::from_yaml("roots: [H]") {
//!     Ok(_) => println!("Loaded"),
//!     Err(TrainerError::UnknownRoot(name)) => eprintln!("No such root: {}", name),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrainerError {
    /// Invalid configuration.
    ///
    /// Occurs when the YAML settings file is malformed or holds a value of the
    /// wrong shape.
    ///
    /// # Example
    /// ```
    /// # use vamp::TrainerError;
    /// let err = TrainerError::ConfigError("articulation must be block, arpeggio or both".to_string());
    /// assert_eq!(err.to_string(), "Invalid config: articulation must be block, arpeggio or both");
    /// ```
    #[error("Invalid config: {0}")]
    ConfigError(String),

    /// A root name that is not one of the twelve pitch classes.
    ///
    /// # Example
    /// ```
    /// # use vamp::TrainerError;
    /// let err = TrainerError::UnknownRoot("H".to_string());
    /// assert_eq!(err.to_string(), "Unknown root: H");
    /// ```
    #[error("Unknown root: {0}")]
    UnknownRoot(String),

    /// A quality name missing from the chord table.
    #[error("Unknown chord quality: {0}")]
    UnknownQuality(String),

    /// The host offers no audio output. Fatal for the session.
    ///
    /// # Example
    /// ```
    /// # use vamp::TrainerError;
    /// let err = TrainerError::AudioUnavailable("no output device".to_string());
    /// assert_eq!(err.to_string(), "Audio output unavailable: no output device");
    /// ```
    #[error("Audio output unavailable: {0}")]
    AudioUnavailable(String),

    /// A sample file exists but could not be decoded.
    #[error("Sample error in {path:?}: {message}")]
    SampleError { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
