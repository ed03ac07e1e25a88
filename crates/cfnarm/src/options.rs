//! Translation options.

use bon::Builder;
use indexmap::IndexMap;
use serde_json::Value as Json;

use crate::arm;

/// Settings for one translation run.
///
/// # Example
///
/// ```
/// use cfnarm::Options;
///
/// let options = Options::builder()
///     .api_version("2016-03-30")
///     .passthrough_parameters(true)
///     .build();
/// assert_eq!(options.api_version(), "2016-03-30");
/// ```
#[derive(Debug, Clone, Builder)]
#[builder(on(String, into))]
pub struct Options {
    /// API version stamped on generated resources.
    #[builder(default = arm::DEFAULT_API_VERSION.to_string())]
    api_version: String,

    /// Values for source parameters; these take precedence over defaults.
    #[builder(default)]
    parameter_overrides: IndexMap<String, Json>,

    /// Re-declare source parameters in the target document and reference
    /// them with `parameters('<name>')` instead of substituting values.
    #[builder(default)]
    passthrough_parameters: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options::builder().build()
    }
}

impl Options {
    /// Get the API version stamped on generated resources.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Get the supplied value for a parameter, if any.
    pub fn parameter_override(&self, name: &str) -> Option<&Json> {
        self.parameter_overrides.get(name)
    }

    /// Whether source parameters are passed through to the target.
    pub fn passthrough_parameters(&self) -> bool {
        self.passthrough_parameters
    }

    /// Supply a value for a source parameter.
    pub fn set_parameter(&mut self, name: impl Into<String>, value: Json) {
        self.parameter_overrides.insert(name.into(), value);
    }
}
