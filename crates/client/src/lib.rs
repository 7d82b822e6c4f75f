pub mod context;

pub use context::ClientContext;
