//! Cover art: fetch the image, stage it in a temporary file next to the song.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::NetworkConfig;
use crate::{FipError, Result};

pub const TEMP_COVER_STEM: &str = "_tmp_fip_album_picture";

#[allow(async_fn_in_trait)]
pub trait ImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Plain GET for cover images.
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new(connect_timeout: Option<Duration>, timeout: Option<Duration>) -> Result<Self> {
        Self::from_builder(client_builder(connect_timeout, timeout))
    }

    fn from_builder(builder: reqwest::ClientBuilder) -> Result<Self> {
        let client = builder
            .build()
            .map_err(|e| FipError::tool_failure("http client", e.to_string()))?;
        Ok(Self { client })
    }

    pub fn from_config(network: &NetworkConfig) -> Result<Self> {
        Self::new(network.connect_timeout(), network.read_timeout())
    }
}

fn client_builder(connect_timeout: Option<Duration>, timeout: Option<Duration>) -> reqwest::ClientBuilder {
    let mut builder = reqwest::Client::builder();
    if let Some(t) = connect_timeout {
        builder = builder.connect_timeout(t);
    }
    if let Some(t) = timeout {
        builder = builder.timeout(t);
    }
    builder
}

impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await.map_err(|e| FipError::Connection {
            addr: url.to_string(),
            source: std::io::Error::other(e),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FipError::HttpStatus {
                addr: url.to_string(),
                status: status.as_u16(),
            });
        }

        let data = response.bytes().await.map_err(|e| FipError::Transfer {
            addr: url.to_string(),
            source: std::io::Error::other(e),
        })?;
        debug!("[acquire] fetched {} bytes of cover art", data.len());
        Ok(data.to_vec())
    }
}

/// Extension of the last path segment of `url`, `jpg` when there is none.
pub fn cover_extension(url: &str) -> String {
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url);
    // drop scheme and host
    let path = match path.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map_or("", |(_, p)| p),
        None => path,
    };
    let segment = path.rsplit('/').next().unwrap_or("");

    match segment.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            ext.to_ascii_lowercase()
        }
        _ => "jpg".to_string(),
    }
}

/// Temporary cover file removed when dropped, whatever happened in between.
#[derive(Debug)]
pub struct TempCoverFile {
    path: PathBuf,
}

impl TempCoverFile {
    pub async fn create(dir: &Path, ext: &str, data: &[u8]) -> Result<Self> {
        let path = dir.join(format!("{TEMP_COVER_STEM}.{ext}"));
        // guard first so a partial write is cleaned up too
        let guard = Self { path };
        tokio::fs::write(&guard.path, data)
            .await
            .map_err(|e| FipError::io(format!("writing {}", guard.path.display()), e))?;
        Ok(guard)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempCoverFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("[acquire] removed {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("[acquire] could not remove {}: {}", self.path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const JPEG_REPLY: &[u8] =
        b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\nConnection: close\r\n\r\n\xFF\xD8\xFF\xE0";
    const NOT_FOUND_REPLY: &[u8] =
        b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";

    /// Accepts one connection, waits for the end of the request head, then
    /// either answers with `reply` or holds the socket open without a word.
    async fn image_server(reply: Option<&'static [u8]>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/cover.jpg", listener.local_addr().unwrap());
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut seen: Vec<u8> = Vec::new();
            let mut buf = [0u8; 512];
            while !seen.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = sock.read(&mut buf).await.unwrap();
                if n == 0 {
                    return;
                }
                seen.extend_from_slice(&buf[..n]);
            }
            match reply {
                Some(bytes) => sock.write_all(bytes).await.unwrap(),
                None => tokio::time::sleep(Duration::from_secs(10)).await,
            }
        });
        url
    }

    /// Same client settings as production, minus any proxy from the environment.
    fn local_fetcher(connect_timeout: Option<Duration>, timeout: Option<Duration>) -> HttpImageFetcher {
        HttpImageFetcher::from_builder(client_builder(connect_timeout, timeout).no_proxy()).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_with_both_timeouts_configured() {
        let url = image_server(Some(JPEG_REPLY)).await;
        let network = NetworkConfig {
            connect_timeout_secs: Some(2),
            read_timeout_secs: Some(5),
        };
        let fetcher = local_fetcher(network.connect_timeout(), network.read_timeout());
        assert_eq!(fetcher.fetch(&url).await.unwrap(), b"\xFF\xD8\xFF\xE0");
    }

    #[tokio::test]
    async fn test_non_success_status_is_rejected() {
        let url = image_server(Some(NOT_FOUND_REPLY)).await;
        let fetcher = local_fetcher(None, None);
        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(matches!(err, FipError::HttpStatus { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_silent_image_server_times_out() {
        let url = image_server(None).await;
        let fetcher = local_fetcher(Some(Duration::from_secs(2)), Some(Duration::from_millis(200)));
        let started = std::time::Instant::now();
        assert!(fetcher.fetch(&url).await.is_err());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_cover_extension() {
        assert_eq!(cover_extension("http://img.example/a/b/cover.JPG"), "jpg");
        assert_eq!(cover_extension("https://img.example/cover.png?w=400#x"), "png");
        assert_eq!(cover_extension("https://img.example/cover"), "jpg");
        assert_eq!(cover_extension("https://img.example/"), "jpg");
        assert_eq!(cover_extension("https://img.example.com"), "jpg");
        assert_eq!(cover_extension(""), "jpg");
    }

    #[tokio::test]
    async fn test_temp_cover_removed_on_drop() {
        let dir = TempDir::new().unwrap();
        let path = {
            let tmp = TempCoverFile::create(dir.path(), "png", b"\x89PNG").await.unwrap();
            assert_eq!(tmp.path(), dir.path().join("_tmp_fip_album_picture.png"));
            assert!(tmp.path().exists());
            tmp.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_temp_cover_in_missing_dir_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = TempCoverFile::create(&dir.path().join("nope"), "jpg", b"x")
            .await
            .unwrap_err();
        assert!(matches!(err, FipError::Io { .. }));
    }
}
