use crate::config::Config;
use anyhow::{Context, Result};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("GET {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("GET {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// One GET per call; implementations never retry.
pub trait Fetcher {
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError>;

    /// Body decoded as text. Invalid UTF-8 is replaced unless the
    /// implementation knows the page's charset.
    fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let body = self.get(url)?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    credentials: Credentials,
}

impl HttpFetcher {
    pub fn new(cfg: &Config, credentials: Credentials) -> Result<Self> {
        let mut builder = reqwest::blocking::Client::builder().user_agent(&cfg.http.user_agent);
        if cfg.http.timeout_seconds > 0 {
            builder = builder.timeout(Duration::from_secs(cfg.http.timeout_seconds));
        }
        let client = builder.build().with_context(|| "building HTTP client")?;
        Ok(Self {
            client,
            credentials,
        })
    }

    fn send(&self, url: &str) -> Result<reqwest::blocking::Response, FetchError> {
        debug!("GET {url}");
        let resp = self
            .client
            .get(url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .send()
            .map_err(|source| transport(url, source))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(resp)
    }
}

impl Fetcher for HttpFetcher {
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let body = self
            .send(url)?
            .bytes()
            .map_err(|source| transport(url, source))?;
        Ok(body.to_vec())
    }

    /// Decodes with the charset from `Content-Type`, UTF-8 when absent.
    fn get_text(&self, url: &str) -> Result<String, FetchError> {
        self.send(url)?
            .text()
            .map_err(|source| transport(url, source))
    }
}

fn transport(url: &str, source: reqwest::Error) -> FetchError {
    FetchError::Transport {
        url: url.to_string(),
        source,
    }
}
