pub mod cache;
pub mod jobs;
pub mod plan;
pub mod section;

use rustplex_core::SectionKind;

pub use cache::ContentCache;
pub use jobs::{Completion, JobId, JobScheduler, LoadJob, Priority, WorkerPool};
pub use section::SectionFanout;

/// Notifications for the display layer. Fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "type", content = "data")]
pub enum SectionEvent {
    /// Every tracked list of the section finished loading.
    #[serde(rename = "section_ready")]
    SectionReady { section: String, kind: SectionKind },
    /// The section's fanart list finished loading.
    #[serde(rename = "fanart_ready")]
    FanartReady { section: String },
}
