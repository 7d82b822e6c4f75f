pub mod backend;
pub mod error;
pub mod manager;
pub mod queue;
pub mod reconcile;

pub use backend::{QueueBackend, library_uri, select_backend};
pub use error::QueueError;
pub use manager::{PlayQueueManager, QueueEvent};
pub use queue::{PlayQueue, PlayQueueItem};
pub use reconcile::{EditableQueue, reconcile};
