//! [`HttpClient`](super::HttpClient) wrappers that attach credentials.

mod api_key;
mod basic;

pub use api_key::ApiKey;
pub use basic::{BasicAuth, basic_auth_value};
