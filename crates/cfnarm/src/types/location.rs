use std::fmt::{Display, Formatter, Result as FmtResult};

/// A JSON-pointer style path to a node inside the source template.
///
/// Every function node carries the location it was parsed from. Locations
/// double as node identity for the evaluation memo, so two syntactically
/// identical calls at different paths are distinct entries.
///
/// # Example
///
/// ```
/// use cfnarm::Location;
///
/// let loc = Location::root().child("Resources").child("Web").child("Fn::Join");
/// assert_eq!(loc.to_string(), "/Resources/Web/Fn::Join");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location(String);

impl Location {
    /// The location of the document root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns the location of a child segment (object key or list index).
    pub fn child(&self, segment: impl Display) -> Self {
        let escaped = segment.to_string().replace('~', "~0").replace('/', "~1");
        Self(format!("{}/{escaped}", self.0))
    }

    /// Get the pointer as a string slice (empty for the root).
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if self.0.is_empty() {
            write!(f, "/")
        } else {
            write!(f, "{}", self.0)
        }
    }
}
