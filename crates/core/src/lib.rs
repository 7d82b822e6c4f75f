pub mod config;
pub mod error;
pub mod item;
pub mod server;
pub mod settings;
pub mod types;
pub mod url;

pub use error::{SettingsError, TransportError};
pub use item::{ContentItem, ContentList, MediaAlternative, MediaPart};
pub use server::{MediaServer, ServerRegistry};
pub use types::{ContentKind, MediaKind, SectionKind};
