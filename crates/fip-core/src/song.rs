use chrono::{DateTime, Local, TimeZone};
use std::fmt;

use crate::schedule::StepRecord;
use crate::text::{filename_fragment, normalize};
use crate::{FipError, Result};

/// One entry of the live schedule.
///
/// Text fields are normalized once here; filenames and tag values reuse
/// them as-is. Absent fields stay `None` all the way to the consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub authors: Option<String>,
    pub label: Option<String>,
    pub album_title: Option<String>,
    pub youtube_link: Option<String>,
    pub visual: Option<String>,
    pub year: Option<i32>,
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
}

impl Song {
    pub fn from_step(id: &str, step: &StepRecord) -> Result<Self> {
        let start = local_time(id, "start", step.start)?;
        let end = local_time(id, "end", step.end)?;
        if end < start {
            return Err(FipError::Parse(format!("step {id} ends before it starts")));
        }

        Ok(Self {
            title: step.title.as_deref().map(normalize),
            artist: step.performers.as_deref().map(normalize),
            authors: step.authors.as_deref().map(normalize),
            label: step.label.as_deref().map(normalize),
            album_title: step.album_title.as_deref().map(normalize),
            youtube_link: step.youtube_link.clone(),
            visual: step.visual.clone(),
            year: step.year.as_ref().and_then(|y| y.value()),
            start,
            end,
        })
    }

    /// Half-open `[start, end)`.
    pub fn is_airing_at(&self, now: DateTime<Local>) -> bool {
        self.start <= now && now < self.end
    }

    pub fn source_link(&self) -> Result<&str> {
        self.youtube_link.as_deref().ok_or(FipError::MissingSource)
    }

    /// `YYYYMMDDHHMM-artist-title`, spaces as underscores, no colons.
    pub fn file_base_name(&self) -> String {
        let artist = self.artist.as_deref().unwrap_or("unknown");
        let title = self.title.as_deref().unwrap_or("unknown");
        filename_fragment(&format!(
            "{}-{}-{}",
            self.start.format("%Y%m%d%H%M"),
            artist,
            title
        ))
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("?")
    }
}

fn local_time(id: &str, field: &str, secs: Option<i64>) -> Result<DateTime<Local>> {
    let secs = secs.ok_or_else(|| FipError::Parse(format!("step {id} has no {field}")))?;
    Local
        .timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| FipError::Parse(format!("step {id} has an invalid {field}: {secs}")))
}

/// `HH:MM - HH:MM | title - artist[ - [link]]`
impl fmt::Display for Song {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} | {} - {}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M"),
            self.display_title(),
            self.artist.as_deref().unwrap_or("?")
        )?;
        if let Some(link) = &self.youtube_link {
            write!(f, " - [{}]", link)?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn song_at(title: &str, start: DateTime<Local>, end: DateTime<Local>) -> Song {
    Song {
        title: Some(title.to_string()),
        artist: Some("someone".to_string()),
        authors: None,
        label: None,
        album_title: None,
        youtube_link: None,
        visual: None,
        year: None,
        start,
        end,
    }
}
