pub mod http;
pub mod provider;
pub mod wire;

pub use http::HttpRemoteApi;
pub use provider::{RawResponse, RemoteApi};
