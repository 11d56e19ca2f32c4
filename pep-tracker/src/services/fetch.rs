//! Spreadsheet fetch collaborators
//!
//! The cache only needs workbook bytes. How they are obtained (a shared
//! document link, a local file, a fake in tests) sits behind
//! [`SpreadsheetFetcher`].

use crate::error::FetchError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Payloads smaller than this are error pages, not workbooks
pub const MIN_PAYLOAD_BYTES: usize = 1000;

/// Bytes inspected when sniffing for an HTML page
const SNIFF_BYTES: usize = 100;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const ACCEPT_SPREADSHEET: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet, */*";

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Source of raw workbook bytes
#[async_trait]
pub trait SpreadsheetFetcher: Send + Sync {
    async fn fetch(&self) -> Result<Vec<u8>, FetchError>;

    /// Human-readable source, for logs
    fn describe(&self) -> String;
}

/// Reject payloads that cannot be a workbook
pub fn validate_payload(bytes: &[u8]) -> Result<(), FetchError> {
    if bytes.len() < MIN_PAYLOAD_BYTES {
        return Err(FetchError::PayloadTooSmall(bytes.len()));
    }
    let head = String::from_utf8_lossy(&bytes[..SNIFF_BYTES.min(bytes.len())]);
    if head.contains("<!DOCTYPE") || head.contains("<html") {
        return Err(FetchError::HtmlPayload);
    }
    Ok(())
}

/// Share links serve a preview page unless asked for the file itself
pub fn download_url(share_url: &str) -> String {
    if share_url.contains("download=1") {
        share_url.to_string()
    } else if share_url.contains('?') {
        format!("{}&download=1", share_url)
    } else {
        format!("{}?download=1", share_url)
    }
}

/// Downloads the workbook from a shared document link
pub struct HttpFetcher {
    http_client: reqwest::Client,
    url: String,
}

impl HttpFetcher {
    pub fn new(share_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http_client,
            url: download_url(share_url),
        })
    }
}

#[async_trait]
impl SpreadsheetFetcher for HttpFetcher {
    async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        info!("Downloading attendance workbook");
        let response = self
            .http_client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, ACCEPT_SPREADSHEET)
            .send()
            .await?;

        let status = response.status();
        debug!(
            status = status.as_u16(),
            content_type = ?response.headers().get(reqwest::header::CONTENT_TYPE),
            "Download response"
        );
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let bytes = response.bytes().await?.to_vec();
        info!("Downloaded {} bytes", bytes.len());
        validate_payload(&bytes)?;
        Ok(bytes)
    }

    fn describe(&self) -> String {
        format!("url {}", self.url)
    }
}

/// Reads the workbook from a local path
pub struct FileFetcher {
    path: PathBuf,
}

impl FileFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SpreadsheetFetcher for FileFetcher {
    async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        let bytes = tokio::fs::read(&self.path).await?;
        debug!("Read {} bytes from {}", bytes.len(), self.path.display());
        validate_payload(&bytes)?;
        Ok(bytes)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Used when no source is configured; every fetch fails
pub struct UnconfiguredFetcher;

#[async_trait]
impl SpreadsheetFetcher for UnconfiguredFetcher {
    async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        Err(FetchError::NotConfigured)
    }

    fn describe(&self) -> String {
        "no source".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_download_url_appends_flag_once() {
        assert_eq!(
            download_url("https://share.example/x?e=abc"),
            "https://share.example/x?e=abc&download=1"
        );
        assert_eq!(download_url("https://share.example/x"), "https://share.example/x?download=1");
        assert_eq!(
            download_url("https://share.example/x?download=1"),
            "https://share.example/x?download=1"
        );
    }

    #[test]
    fn test_validate_payload() {
        assert!(matches!(
            validate_payload(&[0u8; 10]),
            Err(FetchError::PayloadTooSmall(10))
        ));

        let mut page = b"<!DOCTYPE html><html><body>Sign in</body></html>".to_vec();
        page.resize(2000, b' ');
        assert!(matches!(validate_payload(&page), Err(FetchError::HtmlPayload)));

        let mut zip = b"PK\x03\x04".to_vec();
        zip.resize(2000, 0);
        assert!(validate_payload(&zip).is_ok());
    }

    #[tokio::test]
    async fn test_file_fetcher_reads_and_validates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let mut payload = b"PK\x03\x04".to_vec();
        payload.resize(1500, 7);
        file.write_all(&payload).unwrap();

        let fetcher = FileFetcher::new(file.path());
        assert_eq!(fetcher.fetch().await.unwrap(), payload);

        let missing = FileFetcher::new(file.path().with_extension("missing"));
        assert!(matches!(missing.fetch().await, Err(FetchError::Io(_))));
    }

    #[tokio::test]
    async fn test_unconfigured_fetcher_fails() {
        assert!(matches!(
            UnconfiguredFetcher.fetch().await,
            Err(FetchError::NotConfigured)
        ));
    }
}
