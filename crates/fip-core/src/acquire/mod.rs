//! Song acquisition: download the audio, tag it, embed the cover.
//!
//! Each step is logged and recorded in an [`AcquisitionReport`]. A failing
//! step only stops the steps that need its output: nothing can be tagged
//! without a downloaded file, but a tagging failure still lets the cover be
//! embedded.

use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

pub mod cover;
pub mod download;
pub mod metadata;

use crate::song::Song;
use crate::{FipError, Result};
use cover::{cover_extension, ImageFetcher, TempCoverFile};
use download::{find_downloaded_file, AudioExtractor};
use metadata::{TagSet, TagWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoSourceLink,
    NoCoverArt,
    NoAudioFile,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoSourceLink => "no source link provided",
            Self::NoCoverArt => "no cover art provided",
            Self::NoAudioFile => "no audio file to work on",
        })
    }
}

#[derive(Debug)]
pub enum StepOutcome {
    Done,
    Skipped(SkipReason),
    Failed(FipError),
}

impl StepOutcome {
    fn from_result(step: &str, res: Result<()>) -> Self {
        match res {
            Ok(()) => {
                info!("[acquire] {} done", step);
                Self::Done
            }
            Err(e) => {
                error!("[acquire] {} failed: {}", step, e);
                Self::Failed(e)
            }
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Done => f.write_str("done"),
            Self::Skipped(reason) => write!(f, "skipped ({reason})"),
            Self::Failed(e) if e.is_missing_tool() => write!(f, "failed: {e}, please install it"),
            Self::Failed(e) => write!(f, "failed: {e}"),
        }
    }
}

/// Per-step outcome of an attempted acquisition.
#[derive(Debug)]
pub struct AcquisitionReport {
    pub file: Option<PathBuf>,
    pub download: StepOutcome,
    pub tagging: StepOutcome,
    pub cover_art: StepOutcome,
}

impl AcquisitionReport {
    fn download_failed(outcome: StepOutcome) -> Self {
        Self {
            file: None,
            download: outcome,
            tagging: StepOutcome::Skipped(SkipReason::NoAudioFile),
            cover_art: StepOutcome::Skipped(SkipReason::NoAudioFile),
        }
    }

    pub fn has_failures(&self) -> bool {
        [&self.download, &self.tagging, &self.cover_art]
            .iter()
            .any(|s| s.is_failed())
    }
}

#[derive(Debug)]
pub enum AcquisitionResult {
    /// Precondition not met; nothing was touched.
    Skipped(SkipReason),
    Attempted(AcquisitionReport),
}

impl AcquisitionResult {
    pub fn report(&self) -> Option<&AcquisitionReport> {
        match self {
            Self::Attempted(r) => Some(r),
            Self::Skipped(_) => None,
        }
    }

    /// Downloaded, tagged and, when art was available, covered.
    pub fn is_complete(&self) -> bool {
        self.report().is_some_and(|r| {
            r.download.is_done() && r.tagging.is_done() && !r.cover_art.is_failed()
        })
    }

    /// Single human-readable summary of the run.
    pub fn summary(&self) -> String {
        match self {
            Self::Skipped(reason) => format!("Nothing downloaded: {reason}."),
            Self::Attempted(r) => {
                let file = r
                    .file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(none)".to_string());
                format!(
                    "File: {file}\n  download:  {}\n  tags:      {}\n  cover art: {}",
                    r.download, r.tagging, r.cover_art
                )
            }
        }
    }
}

pub struct AcquisitionPipeline<A, T, I> {
    extractor: A,
    tagger: T,
    images: I,
}

impl<A, T, I> AcquisitionPipeline<A, T, I>
where
    A: AudioExtractor,
    T: TagWriter,
    I: ImageFetcher,
{
    pub fn new(extractor: A, tagger: T, images: I) -> Self {
        Self {
            extractor,
            tagger,
            images,
        }
    }

    pub async fn acquire(&self, song: &Song, target_dir: &Path) -> AcquisitionResult {
        let link = match song.source_link() {
            Ok(link) => link,
            Err(_) => {
                warn!("[acquire] {} has no source link", song.display_title());
                return AcquisitionResult::Skipped(SkipReason::NoSourceLink);
            }
        };

        let stem = target_dir.join(song.file_base_name());
        info!(
            "[acquire] downloading {} into {}",
            song.display_title(),
            stem.display()
        );

        let file = match self.download(link, target_dir, &stem).await {
            Ok(file) => file,
            Err(e) => {
                error!("[acquire] download failed: {}", e);
                return AcquisitionResult::Attempted(AcquisitionReport::download_failed(
                    StepOutcome::Failed(e),
                ));
            }
        };

        let tagging = StepOutcome::from_result(
            "tagging",
            self.tagger.write_tags(&file, &TagSet::from_song(song)).await,
        );

        let cover_art = match song.visual.as_deref() {
            None => StepOutcome::Skipped(SkipReason::NoCoverArt),
            Some(url) => {
                StepOutcome::from_result("cover art", self.embed_cover(url, target_dir, &file).await)
            }
        };

        AcquisitionResult::Attempted(AcquisitionReport {
            file: Some(file),
            download: StepOutcome::Done,
            tagging,
            cover_art,
        })
    }

    async fn download(&self, link: &str, target_dir: &Path, stem: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(target_dir)
            .await
            .map_err(|e| FipError::io(format!("creating {}", target_dir.display()), e))?;

        self.extractor.extract(link, stem).await?;

        let file = find_downloaded_file(stem, self.extractor.audio_format())
            .await
            .ok_or_else(|| {
                FipError::tool_failure(
                    "audio extraction",
                    format!("no output file for {}", stem.display()),
                )
            })?;
        info!("Download complete: {}", file.display());
        Ok(file)
    }

    async fn embed_cover(&self, url: &str, dir: &Path, file: &Path) -> Result<()> {
        let data = self.images.fetch(url).await?;
        let tmp = TempCoverFile::create(dir, &cover_extension(url), &data).await?;
        let res = self.tagger.embed_front_cover(file, tmp.path()).await;
        drop(tmp);
        res
    }
}
