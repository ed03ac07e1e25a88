//! Static translation of CloudFormation and Heat templates into Azure
//! Resource Manager (ARM) templates.
//!
//! A run parses a source template, evaluates its intrinsic functions against
//! the template's own parameters, mappings and resources, hands every
//! resource to the translator registered for its type, and assembles the
//! fragments into one ARM document.
//!
//! # Example
//!
//! ```
//! use cfnarm::{Dialect, Options, translate_str};
//!
//! let template = r#"{
//!     "Parameters": { "Env": { "Type": "String", "Default": "prod" } },
//!     "Resources": {
//!         "Firewall": {
//!             "Type": "AWS::EC2::SecurityGroup",
//!             "Properties": {
//!                 "GroupDescription": { "Fn::Join": ["-", ["web", { "Ref": "Env" }]] },
//!                 "SecurityGroupIngress": [
//!                     { "IpProtocol": "tcp", "FromPort": "22", "ToPort": "22", "CidrIp": "0.0.0.0/0" }
//!                 ]
//!             }
//!         }
//!     }
//! }"#;
//!
//! let document = translate_str(template, Dialect::Cfn, &Options::default()).unwrap();
//! assert_eq!(document.resources.len(), 1);
//! assert_eq!(document.variables["nsgName_Firewall"], "Firewall");
//! ```

pub mod arm;
pub mod interpreter;
mod options;
pub mod parser;
pub mod template;
pub mod translate;
pub mod translators;
pub mod types;

use thiserror::Error;

pub use interpreter::{EvalError, ResolutionContext, compute_suggestions};
pub use options::Options;
pub use parser::{Dialect, LoadError, ParseError, load_template, parse_template};
pub use template::Template;
pub use translate::{
    Fragment, OutputDocument, TranslateError, Translation, Translator, TranslatorRegistry,
    translate, translate_with_summary,
};
pub use types::{Location, Value};

/// Any error a translation run can end with.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Translate(#[from] TranslateError),
}

impl From<EvalError> for Error {
    fn from(error: EvalError) -> Self {
        Error::Translate(error.into())
    }
}

/// Parse and translate template text with the built-in translators.
///
/// # Errors
///
/// Returns the parse error, or the first translation error.
pub fn translate_str(input: &str, dialect: Dialect, options: &Options) -> Result<OutputDocument, Error> {
    let template = parse_template(input, dialect)?;
    let registry = TranslatorRegistry::with_builtins();
    Ok(translate(&template, &registry, options)?)
}
