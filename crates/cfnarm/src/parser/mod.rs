//! Template parser for CloudFormation and Heat templates in JSON form.
//!
//! The parser validates structure and turns every recognised intrinsic
//! function call into a `Function` node. It does not resolve anything.

mod dialect;
pub mod error;
mod raw;
mod reader;

use std::fs;
use std::path::Path;

pub use dialect::Dialect;
pub use error::{LoadError, ParseError};
pub use reader::parse_template;

use crate::template::Template;

/// Read and parse a template file.
pub fn load_template(path: &Path, dialect: Dialect) -> Result<Template, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_template(&content, dialect).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
