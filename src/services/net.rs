use std::time::Duration;

use reqwest::{blocking::Client, header::USER_AGENT};

const REQUEST_TIMEOUT_SEC: u64 = 30;

/// Blocking GET shared by every service handler
///
/// Failures of any kind come back as `None` after being logged
pub trait Fetch {
    fn request(&self, url: &str, useragent: &str) -> Option<String>;
}

pub struct HttpClient {
    inner: Client,
}

impl HttpClient {
    pub fn new() -> anyhow::Result<Self> {
        let inner = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SEC))
            .build()?;
        Ok(Self { inner })
    }
}

impl Fetch for HttpClient {
    fn request(&self, url: &str, useragent: &str) -> Option<String> {
        tracing::debug!(url, "Sending request");
        let result = self
            .inner
            .get(url)
            .header(USER_AGENT, useragent)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text());

        match result {
            Ok(body) => {
                tracing::debug!(url, len = body.len(), "Got response");
                Some(body)
            }
            Err(e) => {
                tracing::error!(url, %e, timeout = e.is_timeout(), "Request failed");
                None
            }
        }
    }
}
