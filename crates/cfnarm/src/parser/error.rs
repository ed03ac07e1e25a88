//! Parse error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::Location;

/// An error that occurred while parsing a template.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The input is not valid JSON.
    #[error("invalid JSON at {line}:{column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    /// A function-like key that is not a supported intrinsic.
    #[error("unknown function '{name}' at {location}")]
    UnknownFunction { name: String, location: Location },

    /// A supported intrinsic called with malformed arguments.
    #[error("invalid arguments to '{name}' at {location}: {message}")]
    InvalidFunction {
        name: String,
        location: Location,
        message: String,
    },

    /// Two resources declared under the same name.
    #[error("resource '{name}' is declared more than once")]
    DuplicateResource { name: String },

    /// A section or entry has the wrong shape.
    #[error("malformed template at {location}: {message}")]
    Malformed { location: Location, message: String },
}

/// Errors that occur while loading a template file.
#[derive(Debug, Error)]
pub enum LoadError {
    /// File I/O error when reading the template.
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file was read but could not be parsed.
    #[error("{path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}
