#![allow(dead_code)]

use fip_core::acquire::cover::ImageFetcher;
use fip_core::acquire::download::{with_extension, AudioExtractor};
use fip_core::acquire::metadata::{TagSet, TagWriter};
use fip_core::{FipError, Result};
use std::path::Path;
use std::sync::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

/// Serve `response` once on a local port, then close. Returns the port and a
/// handle yielding the raw request bytes.
pub async fn serve_once(response: Vec<u8>) -> (u16, tokio::task::JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let request = fip_core::http::read_to_close(&mut sock, 256, None).await.unwrap();
        // dribble the response out in small pieces
        for piece in response.chunks(97) {
            sock.write_all(piece).await.unwrap();
            sock.flush().await.unwrap();
        }
        request
    });
    (port, handle)
}

pub fn http_ok(body: &str) -> Vec<u8> {
    format!("HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nConnection: close\r\n\r\n{body}")
        .into_bytes()
}

pub const SCHEDULE: &str = r#"{
  "levels": [
    { "items": ["s1", "s2", "s3", "s4"], "position": 2 }
  ],
  "steps": {
    "s1": { "title": "Intro", "performers": "Nobody", "start": 1704160800, "end": 1704161040 },
    "s2": { "title": "  One More Time ", "performers": "DAFT PUNK", "titreAlbum": "Discovery",
            "lienYoutube": "https://www.youtube.com/watch?v=FGBhQbmPwH8",
            "visual": "https://img.example/discovery.jpg",
            "anneeEditionMusique": 2001,
            "start": 1704161040, "end": 1704161360 },
    "s3": { "title": "Aerodynamic", "performers": "Daft Punk", "start": 1704161400, "end": 1704161610 },
    "s4": { "title": "Digital Love", "performers": "Daft Punk", "start": 1704161610, "end": 1704161910 }
  }
}"#;

#[derive(Default)]
pub struct Calls(Mutex<Vec<String>>);

impl Calls {
    pub fn push(&self, s: String) {
        self.0.lock().unwrap().push(s);
    }

    pub fn all(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

pub struct FakeExtractor<'a>(pub &'a Calls);

impl AudioExtractor for FakeExtractor<'_> {
    fn audio_format(&self) -> &str {
        "mp3"
    }

    async fn extract(&self, source_url: &str, output_stem: &Path) -> Result<()> {
        self.0.push(format!("extract {source_url}"));
        tokio::fs::write(with_extension(output_stem, "mp3"), b"ID3")
            .await
            .map_err(|e| FipError::Io {
                context: "fake".into(),
                source: e,
            })
    }
}

pub struct FakeTagger<'a> {
    pub calls: &'a Calls,
    pub fail: bool,
}

impl TagWriter for FakeTagger<'_> {
    async fn write_tags(&self, file: &Path, tags: &TagSet) -> Result<()> {
        self.calls.push(format!(
            "tags {} artist={:?} album={:?} year={:?}",
            file.file_name().unwrap().to_string_lossy(),
            tags.artist,
            tags.album,
            tags.year
        ));
        Ok(())
    }

    async fn embed_front_cover(&self, _file: &Path, image: &Path) -> Result<()> {
        self.calls.push(format!("cover {}", image.file_name().unwrap().to_string_lossy()));
        if self.fail {
            return Err(FipError::ToolFailure {
                tool: "eyeD3".into(),
                detail: "exited with status 2".into(),
            });
        }
        Ok(())
    }
}

pub struct FakeImages;

impl ImageFetcher for FakeImages {
    async fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
        Ok(vec![0xFF, 0xD8, 0xFF, 0xE0])
    }
}
