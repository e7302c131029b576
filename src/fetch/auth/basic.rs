use crate::fetch::client::HttpClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{AUTHORIZATION, HeaderValue};

/// An [`HttpClient`] wrapper that sends HTTP basic credentials.
pub struct BasicAuth<C> {
    inner: C,
    value: HeaderValue,
}

impl<C> BasicAuth<C> {
    pub fn new(inner: C, username: &str, password: &str) -> Result<Self> {
        let mut value = HeaderValue::from_str(&basic_auth_value(username, password))
            .context("credentials are not a valid header value")?;
        value.set_sensitive(true);
        Ok(Self { inner, value })
    }
}

/// `Basic <base64(username:password)>`.
pub fn basic_auth_value(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

#[async_trait]
impl<C: HttpClient> HttpClient for BasicAuth<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut().insert(AUTHORIZATION, self.value.clone());
        self.inner.execute(req).await
    }
}
