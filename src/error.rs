//! Error types for the Nandboard logic simulator.
//!
//! This module provides a unified error type [`NandboardError`] for the
//! operations that can actually fail (file I/O, unparseable documents,
//! lookups by name, truth table limits) and [`BuildError`], the reason a
//! selection can't be packaged into a custom component.
//!
//! Simulation and routing never fail: a circuit that doesn't settle within
//! the iteration cap keeps its last values, and illegal connection requests
//! are ignored.

use thiserror::Error;

/// Result type alias using [`NandboardError`].
pub type Result<T> = std::result::Result<T, NandboardError>;

/// Unified error type for all Nandboard operations.
#[derive(Error, Debug)]
pub enum NandboardError {
    // ============ I/O Errors ============
    /// Error reading a circuit or library file
    #[error("Failed to read '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Error writing a circuit or library file
    #[error("Failed to write '{path}': {source}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // ============ Document Errors ============
    /// The document is not valid circuit JSON
    #[error("Invalid circuit document '{path}': {source}")]
    InvalidDocument {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Serializing a circuit failed
    #[error("Failed to encode circuit '{name}': {source}")]
    EncodeError {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    // ============ Lookup Errors ============
    /// No component with this id
    #[error("Component {id} not found")]
    ComponentNotFound { id: usize },

    /// No component with this title
    #[error("No component titled '{title}'")]
    TitleNotFound { title: String },

    /// No library definition with this name
    #[error("Custom component '{name}' is not in the library")]
    UnknownCustomComponent { name: String },

    /// A selection could not be packaged
    #[error(transparent)]
    Build(#[from] BuildError),

    // ============ Analysis Errors ============
    /// Truth table would be too large to enumerate
    #[error("Truth table needs {count} input bits, at most {max} are supported")]
    TooManyInputs { count: usize, max: usize },

    /// Invalid command-line or API parameter
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },
}

impl NandboardError {
    /// Create a file read error
    pub fn read(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::FileReadError {
            path: path.display().to_string(),
            source,
        }
    }

    /// Create a file write error
    pub fn write(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::FileWriteError {
            path: path.display().to_string(),
            source,
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }
}

/// Why a selection can't become a custom component.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildError {
    #[error("component name is empty")]
    EmptyName,

    #[error("component name cannot be used as a file name")]
    InvalidName,

    #[error("selection is empty")]
    EmptySelection,

    #[error("selection has no bus input marker")]
    MissingBusInput,

    #[error("selection has no bus output marker")]
    MissingBusOutput,
}

impl BuildError {
    /// Stable reason code for UI collaborators.
    pub fn code(&self) -> &'static str {
        match self {
            BuildError::EmptyName => "empty-name",
            BuildError::InvalidName => "invalid-name",
            BuildError::EmptySelection => "empty-selection",
            BuildError::MissingBusInput => "missing-bus-input",
            BuildError::MissingBusOutput => "missing-bus-output",
        }
    }
}
