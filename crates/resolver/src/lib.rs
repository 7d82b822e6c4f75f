pub mod engine;
pub mod error;
pub mod headers;
pub mod indirect;
pub mod parts;

pub use engine::{BusyIndicator, MediaDecisionEngine, NoBusyIndicator, ResolveState};
pub use error::ResolveError;
pub use parts::{FileProbe, LocalFs, PartSource, expand_stack};
