//! Minimal HTTP/1.1 over a plain TCP socket.
//!
//! The request always carries `Connection: close`, so the whole response is
//! whatever arrives before the server closes the connection. There is no
//! Content-Length handling, no redirects and no TLS.

use rand::seq::SliceRandom;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::{FipError, Result};

pub const READ_CHUNK: usize = 4096;

/// Browser identities rotated across requests.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_2 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Mobile/15E148 Safari/604.1",
];

/// Picks one entry of [`USER_AGENTS`].
pub type AgentPicker = fn(&'static [&'static str]) -> &'static str;

pub fn random_user_agent(pool: &'static [&'static str]) -> &'static str {
    pool.choose(&mut rand::thread_rng()).copied().unwrap_or("Mozilla/5.0")
}

/// `GET {path}` with exactly `Host`, `User-Agent`, `Accept` and `Connection`.
pub fn build_get_request(host: &str, path: &str, pick_agent: AgentPicker) -> String {
    format!(
        "GET {path} HTTP/1.1\r\n\
         Host: {host}\r\n\
         User-Agent: {agent}\r\n\
         Accept: */*\r\n\
         Connection: close\r\n\
         \r\n",
        agent = pick_agent(USER_AGENTS),
    )
}

/// Everything read from the socket until the peer closed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawHttpResponse {
    bytes: Vec<u8>,
}

impl RawHttpResponse {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    /// Byte offsets of the header block end and body start.
    fn boundary(&self) -> Option<(usize, usize)> {
        if let Some(pos) = find(&self.bytes, b"\r\n\r\n") {
            return Some((pos, pos + 4));
        }
        find(&self.bytes, b"\n\n").map(|pos| (pos, pos + 2))
    }

    /// Status line and headers, without the blank separator line.
    pub fn head(&self) -> Option<String> {
        self.boundary()
            .map(|(end, _)| String::from_utf8_lossy(&self.bytes[..end]).into_owned())
    }

    /// Numeric code from `HTTP/1.x NNN reason`.
    pub fn status(&self) -> Option<u16> {
        let head = self.head()?;
        let line = head.lines().next()?;
        let mut parts = line.split_whitespace();
        if !parts.next()?.starts_with("HTTP/") {
            return None;
        }
        parts.next()?.parse().ok()
    }

    pub fn header(&self, name: &str) -> Option<String> {
        let head = self.head()?;
        head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    }

    /// Body bytes, de-chunked when the server used chunked transfer coding.
    pub fn body(&self) -> Result<Vec<u8>> {
        let (_, start) = self
            .boundary()
            .ok_or_else(|| FipError::Parse("response has no header/body boundary".to_string()))?;
        let raw = &self.bytes[start..];

        let chunked = self
            .header("transfer-encoding")
            .is_some_and(|v| v.to_ascii_lowercase().contains("chunked"));
        if chunked {
            dechunk(raw)
        } else {
            Ok(raw.to_vec())
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn dechunk(mut raw: &[u8]) -> Result<Vec<u8>> {
    let bad = |what: &str| FipError::Parse(format!("bad chunked body: {what}"));
    let mut out = Vec::with_capacity(raw.len());

    loop {
        let line_end = find(raw, b"\r\n").ok_or_else(|| bad("missing size line"))?;
        let size_line = std::str::from_utf8(&raw[..line_end]).map_err(|_| bad("size line"))?;
        let size_hex = size_line.split(';').next().unwrap_or("").trim();
        let size = usize::from_str_radix(size_hex, 16).map_err(|_| bad(size_hex))?;
        raw = &raw[line_end + 2..];

        if size == 0 {
            return Ok(out);
        }
        if raw.len() < size {
            return Err(bad("truncated chunk"));
        }
        out.extend_from_slice(&raw[..size]);
        raw = raw.get(size + 2..).unwrap_or_default();
    }
}

/// Read fixed-size chunks until a zero-length read. `read_timeout` bounds
/// each single read, not the whole transfer.
pub async fn read_to_close<R>(
    reader: &mut R,
    chunk_size: usize,
    read_timeout: Option<Duration>,
) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut out = Vec::new();
    let mut buf = vec![0u8; chunk_size.max(1)];
    loop {
        let read = reader.read(&mut buf);
        let n = match read_timeout {
            Some(limit) => tokio::time::timeout(limit, read)
                .await
                .unwrap_or_else(|_| Err(timed_out("read")))?,
            None => read.await?,
        };
        if n == 0 {
            return Ok(out);
        }
        out.extend_from_slice(&buf[..n]);
    }
}

/// One socket per call, no retries.
#[derive(Debug, Clone, Default)]
pub struct RawHttpClient {
    pub connect_timeout: Option<Duration>,
    pub read_timeout: Option<Duration>,
}

impl RawHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeouts(connect_timeout: Option<Duration>, read_timeout: Option<Duration>) -> Self {
        Self {
            connect_timeout,
            read_timeout,
        }
    }

    pub async fn fetch(&self, host: &str, port: u16, request: &str) -> Result<RawHttpResponse> {
        let addr = format!("{host}:{port}");
        info!("[http] GET {} ({} request bytes)", addr, request.len());

        let connect = TcpStream::connect(&addr);
        let connected = match self.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, connect)
                .await
                .unwrap_or_else(|_| Err(timed_out("connect"))),
            None => connect.await,
        };
        let mut stream = connected.map_err(|source| FipError::Connection {
            addr: addr.clone(),
            source,
        })?;

        let transfer = |source: std::io::Error| FipError::Transfer {
            addr: addr.clone(),
            source,
        };

        stream.write_all(request.as_bytes()).await.map_err(transfer)?;
        // half-close: the request is complete
        stream.shutdown().await.map_err(transfer)?;

        let bytes = read_to_close(&mut stream, READ_CHUNK, self.read_timeout)
            .await
            .map_err(transfer)?;

        debug!("[http] {} closed after {} bytes", addr, bytes.len());
        Ok(RawHttpResponse::new(bytes))
    }
}

fn timed_out(what: &str) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::TimedOut, format!("{what} timed out"))
}
