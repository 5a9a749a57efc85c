//! Tag writing: external eyeD3 or in-process lofty.

use lofty::config::WriteOptions;
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::{ItemKey, Tag, TagType};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::config::{TaggerKind, ToolsConfig};
use crate::platform;
use crate::song::Song;
use crate::tools::run_tool;
use crate::{FipError, Result};

const BUILTIN: &str = "builtin tagger";

/// Values written into the audio file. Absent values are not written at all.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagSet {
    pub artist: Option<String>,
    pub album: Option<String>,
    pub title: Option<String>,
    pub album_artist: Option<String>,
    pub year: Option<i32>,
}

impl TagSet {
    pub fn from_song(song: &Song) -> Self {
        Self {
            artist: song.artist.clone(),
            album: song.album_title.clone(),
            title: song.title.clone(),
            album_artist: song.artist.clone(),
            year: song.year,
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait TagWriter {
    async fn write_tags(&self, file: &Path, tags: &TagSet) -> Result<()>;

    async fn embed_front_cover(&self, file: &Path, image: &Path) -> Result<()>;
}

pub struct Eyed3Tagger {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl Eyed3Tagger {
    pub fn new(program: PathBuf, timeout: Option<Duration>) -> Self {
        Self { program, timeout }
    }

    pub fn from_config(tools: &ToolsConfig) -> Self {
        let program =
            platform::resolve_tool(tools.eyed3.as_ref(), platform::find_eyed3_binary(), "eyeD3");
        Self::new(program, tools.timeout())
    }

    pub fn tag_args(file: &Path, tags: &TagSet) -> Vec<String> {
        let mut args = Vec::new();
        let mut push = |flag: &str, value: Option<String>| {
            if let Some(v) = value {
                args.push(flag.to_string());
                args.push(v);
            }
        };
        push("--artist", tags.artist.clone());
        push("--album", tags.album.clone());
        push("--title", tags.title.clone());
        push("--album-artist", tags.album_artist.clone());
        push("--release-year", tags.year.map(|y| y.to_string()));
        args.push(file.display().to_string());
        args
    }

    pub fn cover_args(file: &Path, image: &Path) -> Vec<String> {
        vec![
            "--add-image".to_string(),
            format!("{}:FRONT_COVER", image.display()),
            file.display().to_string(),
        ]
    }
}

impl TagWriter for Eyed3Tagger {
    async fn write_tags(&self, file: &Path, tags: &TagSet) -> Result<()> {
        run_tool(&self.program, Self::tag_args(file, tags), self.timeout).await
    }

    async fn embed_front_cover(&self, file: &Path, image: &Path) -> Result<()> {
        run_tool(&self.program, Self::cover_args(file, image), self.timeout).await
    }
}

/// Writes tags with lofty on a blocking thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTagger;

impl TagWriter for BuiltinTagger {
    async fn write_tags(&self, file: &Path, tags: &TagSet) -> Result<()> {
        let path = file.to_path_buf();
        let tags = tags.clone();
        blocking(move || write_tags_blocking(&path, &tags)).await
    }

    async fn embed_front_cover(&self, file: &Path, image: &Path) -> Result<()> {
        let path = file.to_path_buf();
        let image = image.to_path_buf();
        blocking(move || embed_cover_blocking(&path, &image)).await
    }
}

async fn blocking<F>(f: F) -> Result<()>
where
    F: FnOnce() -> anyhow::Result<()> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| FipError::tool_failure(BUILTIN, e.to_string()))?
        .map_err(|e| FipError::tool_failure(BUILTIN, format!("{e:#}")))
}

fn open_tag(file_path: &Path) -> anyhow::Result<Tag> {
    let tagged_file = Probe::open(file_path)?.read()?;
    let tag_type = guess_tag_type(file_path)?;
    Ok(tagged_file
        .primary_tag()
        .cloned()
        .unwrap_or_else(|| Tag::new(tag_type)))
}

fn write_tags_blocking(file_path: &Path, tags: &TagSet) -> anyhow::Result<()> {
    let mut tag = open_tag(file_path)?;

    let fields = [
        (ItemKey::TrackArtist, tags.artist.clone()),
        (ItemKey::AlbumTitle, tags.album.clone()),
        (ItemKey::TrackTitle, tags.title.clone()),
        (ItemKey::AlbumArtist, tags.album_artist.clone()),
        // TDRC in ID3v2, ©day in MP4, DATE in Vorbis comments
        (ItemKey::RecordingDate, tags.year.map(|y| y.to_string())),
    ];
    for (key, value) in fields {
        if let Some(v) = value {
            tag.insert_text(key, v);
        }
    }

    tag.save_to_path(file_path, WriteOptions::default())?;
    info!("[acquire] tags written to {}", file_path.display());
    Ok(())
}

fn embed_cover_blocking(file_path: &Path, image_path: &Path) -> anyhow::Result<()> {
    let mut tag = open_tag(file_path)?;
    let data = std::fs::read(image_path)?;

    tag.remove_picture_type(PictureType::CoverFront);
    tag.push_picture(Picture::new_unchecked(
        PictureType::CoverFront,
        Some(guess_mime_type(image_path)),
        None,
        data,
    ));

    tag.save_to_path(file_path, WriteOptions::default())?;
    Ok(())
}

/// Guess the appropriate tag type for file extension
fn guess_tag_type(file_path: &Path) -> anyhow::Result<TagType> {
    let ext = file_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "mp3" => Ok(TagType::Id3v2),
        "m4a" | "mp4" | "aac" => Ok(TagType::Mp4Ilst),
        "flac" | "ogg" | "opus" => Ok(TagType::VorbisComments),
        _ => anyhow::bail!("Unsupported audio format: {}", ext),
    }
}

fn guess_mime_type(image_path: &Path) -> MimeType {
    let ext = image_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "png" => MimeType::Png,
        "gif" => MimeType::Gif,
        "bmp" => MimeType::Bmp,
        "tif" | "tiff" => MimeType::Tiff,
        _ => MimeType::Jpeg,
    }
}

/// Tag writer picked in the `[tools]` config section.
pub enum ConfiguredTagger {
    Eyed3(Eyed3Tagger),
    Builtin(BuiltinTagger),
}

impl ConfiguredTagger {
    pub fn from_config(tools: &ToolsConfig) -> Self {
        match tools.tagger {
            TaggerKind::Eyed3 => Self::Eyed3(Eyed3Tagger::from_config(tools)),
            TaggerKind::Builtin => Self::Builtin(BuiltinTagger),
        }
    }
}

impl TagWriter for ConfiguredTagger {
    async fn write_tags(&self, file: &Path, tags: &TagSet) -> Result<()> {
        match self {
            Self::Eyed3(t) => t.write_tags(file, tags).await,
            Self::Builtin(t) => t.write_tags(file, tags).await,
        }
    }

    async fn embed_front_cover(&self, file: &Path, image: &Path) -> Result<()> {
        match self {
            Self::Eyed3(t) => t.embed_front_cover(file, image).await,
            Self::Builtin(t) => t.embed_front_cover(file, image).await,
        }
    }
}
