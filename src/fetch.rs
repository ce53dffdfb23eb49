use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::{Client, StatusCode};

use crate::config::FetchConfig;

pub struct Fetcher {
    client: Client,
    require_success: bool,
}

#[derive(Debug)]
pub struct Download {
    pub path: PathBuf,
    pub status: StatusCode,
    pub bytes: usize,
}

impl Fetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mut builder = Client::builder().gzip(true);
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if !config.system_proxy {
            builder = builder.no_proxy();
        }

        Ok(Self {
            client: builder.build().context("Failed to build HTTP client")?,
            require_success: config.require_success,
        })
    }

    /// GETs `url` and writes the response body to `dest` byte for byte.
    ///
    /// A non-success status is only an error when `require_success` is set;
    /// otherwise the body (often an HTML error page) is written anyway and
    /// the caller sees the status in the returned [`Download`].
    pub async fn download(&self, url: &str, dest: &Path) -> Result<Download> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        let status = response.status();
        if self.require_success && !status.is_success() {
            bail!("Fetching {} returned {}", url, status);
        }

        let body = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))?;

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::write(dest, &body)
            .await
            .with_context(|| format!("Failed to write {}", dest.display()))?;

        Ok(Download {
            path: dest.to_path_buf(),
            status,
            bytes: body.len(),
        })
    }
}
