//! Remote fetch of baseline text files.
//!
//! The [`Fetcher`] trait decouples the runner from the network so tests can
//! serve canned bodies. The real implementation is a blocking reqwest client;
//! anything other than a 2xx response is a fatal NetworkFailure.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info};

/// Abstraction over HTTPS text fetches.
pub trait Fetcher {
    fn fetch_text(&self, url: &str) -> Result<String>;
}

/// Blocking HTTP client fetcher.
pub struct HttpFetcher {
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch_text(&self, url: &str) -> Result<String> {
        info!(url, "fetching remote file");
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .context("build http client")?;

        let response = client
            .get(url)
            .send()
            .with_context(|| format!("GET {url}"))?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP {} fetching {url}", response.status()));
        }

        response.text().with_context(|| format!("read body of {url}"))
    }
}

/// Fetch `url` and write the body verbatim to `dest`.
pub fn download_to(fetcher: &dyn Fetcher, url: &str, dest: &Path) -> Result<()> {
    let body = fetcher.fetch_text(url)?;
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    fs::write(dest, &body).with_context(|| format!("write {}", dest.display()))?;
    debug!(dest = %dest.display(), bytes = body.len(), "saved remote file");
    Ok(())
}
