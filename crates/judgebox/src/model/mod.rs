pub mod config;
pub mod finding;
pub mod ids;
pub mod outcome;
pub mod request;

pub use config::*;
pub use finding::ValidationFinding;
pub use ids::{ExecutionId, TaskId, UserId};
pub use outcome::*;
pub use request::*;

/// Maximum accepted size of a submitted script, in bytes.
pub const MAX_SOURCE_BYTES: usize = 256 * 1024;
