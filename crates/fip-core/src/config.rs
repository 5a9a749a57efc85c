use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Where the live schedule document is served.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_path")]
    pub path: String,
}

/// Socket timeouts. Unset means wait forever.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
    #[serde(default)]
    pub read_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaggerKind {
    /// External `eyeD3` program.
    #[default]
    Eyed3,
    /// In-process tag writer.
    Builtin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Explicit yt-dlp binary; looked up on PATH when unset.
    #[serde(default)]
    pub yt_dlp: Option<PathBuf>,
    /// Explicit eyeD3 binary; looked up on PATH when unset.
    #[serde(default)]
    pub eyed3: Option<PathBuf>,
    #[serde(default)]
    pub tagger: TaggerKind,
    #[serde(default = "default_audio_format")]
    pub audio_format: String,
    /// Kill an external tool after this many seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// User-configurable paths for downloaded songs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Defaults to `~/Music/FIP`. A leading `~` is expanded.
    #[serde(default = "default_music_dir")]
    pub music_dir: PathBuf,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            path: default_path(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            yt_dlp: None,
            eyed3: None,
            tagger: TaggerKind::default(),
            audio_format: default_audio_format(),
            timeout_secs: None,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            music_dir: default_music_dir(),
        }
    }
}

impl NetworkConfig {
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_secs.map(Duration::from_secs)
    }
}

impl ToolsConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl PathsConfig {
    pub fn music_dir(&self) -> PathBuf {
        expand_home(&self.music_dir)
    }
}

fn default_host() -> String {
    "www.fipradio.fr".to_string()
}

fn default_port() -> u16 {
    80
}

fn default_path() -> String {
    "/livemeta/7".to_string()
}

fn default_audio_format() -> String {
    "mp3".to_string()
}

fn default_music_dir() -> PathBuf {
    PathBuf::from("~").join("Music").join("FIP")
}

/// Replace a leading `~` component with the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest),
        Err(_) => path.to_path_buf(),
    }
}

impl Config {
    /// Config from disk, or defaults when no file exists yet. Never writes.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> anyhow::Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(config_path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Write a default config file unless one exists. Returns whether it wrote.
    pub fn write_default_if_missing() -> anyhow::Result<bool> {
        Self::write_default_to(&Self::config_path())
    }

    pub fn write_default_to(config_path: &Path) -> anyhow::Result<bool> {
        if config_path.exists() {
            return Ok(false);
        }
        Self::default().save_to(config_path)?;
        Ok(true)
    }

    pub fn save_to(&self, config_path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}
