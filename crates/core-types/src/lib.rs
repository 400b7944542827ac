pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::Direction;
pub use error::ConfigurationError;
pub use structs::{ParamValue, Pass};
