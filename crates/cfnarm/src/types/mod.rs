mod location;
mod value;

pub use location::Location;
pub use value::Value;
