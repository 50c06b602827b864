use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use log::debug;

use crate::error::SourceError;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the submissions CSV comes from. No retries: a failed fetch is
/// reported once and the caller decides what to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Http(String),
    File(PathBuf),
}

impl DataSource {
    /// `http://` and `https://` locations are fetched over the network,
    /// anything else is read as a local path.
    pub fn parse(location: &str) -> Self {
        let trimmed = location.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            DataSource::Http(trimmed.to_string())
        } else {
            DataSource::File(PathBuf::from(trimmed))
        }
    }

    pub async fn fetch(&self) -> Result<String, SourceError> {
        match self {
            DataSource::Http(url) => fetch_http(url).await,
            DataSource::File(path) => {
                let text = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| SourceError::Io {
                        path: path.clone(),
                        source,
                    })?;
                debug!("read {} bytes from {}", text.len(), path.display());
                Ok(text)
            }
        }
    }
}

async fn fetch_http(url: &str) -> Result<String, SourceError> {
    let http_error = |source| SourceError::Http {
        url: url.to_string(),
        source,
    };

    let client = reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(http_error)?;

    let response = client.get(url).send().await.map_err(http_error)?;
    if !response.status().is_success() {
        return Err(SourceError::Status {
            url: url.to_string(),
            status: response.status(),
        });
    }

    let text = response.text().await.map_err(http_error)?;
    debug!("downloaded {} bytes from {url}", text.len());
    Ok(text)
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Http(url) => f.write_str(url),
            DataSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}
