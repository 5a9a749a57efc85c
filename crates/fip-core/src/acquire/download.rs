//! yt-dlp wrapper for downloading audio

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::config::ToolsConfig;
use crate::platform;
use crate::tools::run_tool;
use crate::Result;

/// Turns a source link into an audio file at `<stem>.<ext>`.
#[allow(async_fn_in_trait)]
pub trait AudioExtractor {
    /// Extension of the produced file, without the dot.
    fn audio_format(&self) -> &str;

    async fn extract(&self, source_url: &str, output_stem: &Path) -> Result<()>;
}

pub struct YtDlpExtractor {
    program: PathBuf,
    audio_format: String,
    timeout: Option<Duration>,
}

impl YtDlpExtractor {
    pub fn new(program: PathBuf, audio_format: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            program,
            audio_format: audio_format.into(),
            timeout,
        }
    }

    pub fn from_config(tools: &ToolsConfig) -> Self {
        let program = platform::resolve_tool(
            tools.yt_dlp.as_ref(),
            platform::find_yt_dlp_binary(),
            "yt-dlp",
        );
        Self::new(program, &tools.audio_format, tools.timeout())
    }

    pub fn args(&self, source_url: &str, output_stem: &Path) -> Vec<String> {
        vec![
            "--extract-audio".to_string(),
            "--audio-format".to_string(),
            self.audio_format.clone(),
            "-o".to_string(),
            output_template(output_stem),
            source_url.to_string(),
        ]
    }
}

impl AudioExtractor for YtDlpExtractor {
    fn audio_format(&self) -> &str {
        &self.audio_format
    }

    async fn extract(&self, source_url: &str, output_stem: &Path) -> Result<()> {
        info!("Starting download from {} to {}", source_url, output_stem.display());
        run_tool(&self.program, self.args(source_url, output_stem), self.timeout).await
    }
}

/// yt-dlp `-o` value. `%` in the stem is literal, so it is doubled.
fn output_template(output_stem: &Path) -> String {
    let stem = output_stem.display().to_string().replace('%', "%%");
    format!("{stem}.%(ext)s")
}

/// `<stem>.<ext>` without touching dots already in the stem.
pub fn with_extension(stem: &Path, ext: &str) -> PathBuf {
    let mut s = stem.as_os_str().to_os_string();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

/// Find the downloaded file: the expected extension first, then any file in
/// the same directory carrying the same base name.
pub async fn find_downloaded_file(output_stem: &Path, ext: &str) -> Option<PathBuf> {
    let expected = with_extension(output_stem, ext);
    if tokio::fs::metadata(&expected).await.is_ok() {
        return Some(expected);
    }

    let dir = output_stem.parent()?;
    let base = output_stem.file_name()?;
    let mut entries = tokio::fs::read_dir(dir).await.ok()?;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if path.file_stem() == Some(base) && path.is_file() {
            return Some(path);
        }
    }
    None
}
