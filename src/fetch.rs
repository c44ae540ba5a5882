use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::domain::{SourceKind, SourceLocation, SourceSpec};
use crate::error::KiraError;
use crate::fs_util;

/// Retrieves the raw bytes of a source.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, source: &SourceSpec) -> Result<Vec<u8>, KiraError>;
}

/// Reads local paths directly and downloads URLs into a cache directory,
/// reusing earlier downloads unless `force` is set.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    cache_dir: Utf8PathBuf,
    force: bool,
}

impl HttpFetcher {
    pub fn new(cache_dir: Utf8PathBuf, force: bool) -> Result<Self, KiraError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("kira-sl/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| KiraError::Filesystem(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(600))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| KiraError::Filesystem(format!("http client: {err}")))?;
        Ok(Self {
            client,
            cache_dir,
            force,
        })
    }

    pub fn default_cache_dir() -> Result<Utf8PathBuf, KiraError> {
        BaseDirs::new()
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(
                    dirs.home_dir().join(".cache").join("kira-semantic-layer"),
                )
                .ok()
            })
            .ok_or_else(|| KiraError::Filesystem("unable to resolve cache directory".to_string()))
    }

    pub fn cache_dir(&self) -> &Utf8Path {
        &self.cache_dir
    }

    /// Where a downloaded source is kept between runs.
    pub fn cache_path(&self, source: &SourceSpec) -> Utf8PathBuf {
        let file_name = source
            .location
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}.download", source.kind).to_lowercase());
        self.cache_dir
            .join(source.kind.to_string().to_lowercase())
            .join(file_name)
    }

    fn send_with_retries(
        &self,
        kind: SourceKind,
        url: &str,
    ) -> Result<reqwest::blocking::Response, KiraError> {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 500;
        let mut attempt = 0usize;
        loop {
            match self.client.get(url).send() {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        tracing::warn!(%kind, status, attempt, "retrying download");
                        backoff(BASE_DELAY_MS, attempt);
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        tracing::warn!(%kind, error = %err, attempt, "retrying download");
                        backoff(BASE_DELAY_MS, attempt);
                        attempt += 1;
                        continue;
                    }
                    return Err(KiraError::SourceHttp {
                        dataset: kind,
                        message: err.to_string(),
                    });
                }
            }
        }
    }

    fn handle_status(
        kind: SourceKind,
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, KiraError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| format!("{kind} request failed"));
        Err(KiraError::SourceStatus {
            dataset: kind,
            status,
            message,
        })
    }

    fn download(&self, source: &SourceSpec, url: &str) -> Result<Vec<u8>, KiraError> {
        let cache_path = self.cache_path(source);
        if !self.force && cache_path.as_std_path().is_file() {
            tracing::info!(kind = %source.kind, path = %cache_path, "using cached download");
            return read_file(&cache_path);
        }

        tracing::info!(kind = %source.kind, url, "downloading");
        let start = std::time::Instant::now();
        let response = self.send_with_retries(source.kind, url)?;
        let response = Self::handle_status(source.kind, response)?;
        let bytes = response.bytes().map_err(|err| KiraError::SourceHttp {
            dataset: source.kind,
            message: err.to_string(),
        })?;
        tracing::info!(
            kind = %source.kind,
            bytes = bytes.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "download complete"
        );

        fs_util::write_bytes_atomic(&cache_path, &bytes)?;
        Ok(bytes.to_vec())
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, source: &SourceSpec) -> Result<Vec<u8>, KiraError> {
        match &source.location {
            SourceLocation::Path(path) => {
                tracing::info!(kind = %source.kind, %path, "reading local source");
                read_file(path)
            }
            SourceLocation::Url(url) => self.download(source, url),
        }
    }
}

fn read_file(path: &Utf8Path) -> Result<Vec<u8>, KiraError> {
    std::fs::read(path.as_std_path())
        .map_err(|err| KiraError::Filesystem(format!("read {path}: {err}")))
}

fn backoff(base_ms: u64, attempt: usize) {
    std::thread::sleep(Duration::from_millis(base_ms * (attempt as u64 + 1)));
}

fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..=599).contains(&status)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_statuses() {
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(503));
        assert!(!is_retryable_status(404));
    }

    #[test]
    fn cache_path_uses_source_file_name() {
        let fetcher = HttpFetcher::new(Utf8PathBuf::from("/tmp/kira-cache"), false).unwrap();
        let spec = SourceSpec {
            kind: SourceKind::String,
            location: SourceLocation::Url(
                "https://example.org/download/links.txt.gz".to_string(),
            ),
        };
        assert_eq!(
            fetcher.cache_path(&spec),
            Utf8PathBuf::from("/tmp/kira-cache/string/links.txt.gz")
        );
    }
}
