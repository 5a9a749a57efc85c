//! Ordered schedule and "what is playing right now" resolution.

use chrono::{DateTime, Local};
use tracing::{debug, warn};

use crate::schedule::ScheduleDocument;
use crate::song::Song;
use crate::{FipError, Result};

/// Songs in the order of `levels[0].items`. That order is canonical even when
/// it is not chronological.
#[derive(Debug, Clone)]
pub struct ScheduleTimeline {
    songs: Vec<Song>,
    official_position: Option<usize>,
}

/// How [`ScheduleTimeline::resolve`] picked its song.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The song's `[start, end)` window contains the instant.
    Window,
    /// No window matched; the second-to-last entry (or the only one) was used.
    Fallback,
}

#[derive(Debug, Clone, Copy)]
pub struct Resolved<'a> {
    pub song: &'a Song,
    pub how: Resolution,
}

impl ScheduleTimeline {
    pub fn build_from_document(doc: &ScheduleDocument) -> Result<Self> {
        let level = doc
            .levels
            .first()
            .ok_or_else(|| FipError::Parse("document has no levels".to_string()))?;

        let songs = level
            .items
            .iter()
            .map(|id| {
                let step = doc
                    .steps
                    .get(id)
                    .ok_or_else(|| FipError::Parse(format!("no step record for id {id}")))?;
                Song::from_step(id, step)
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "[schedule] built timeline: {} songs, official position {:?}",
            songs.len(),
            level.position
        );

        Ok(Self {
            songs,
            official_position: level.position,
        })
    }

    pub fn from_songs(songs: Vec<Song>) -> Self {
        Self {
            songs,
            official_position: None,
        }
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    /// Entry the API itself marks as current. Informational only.
    pub fn official_current(&self) -> Option<&Song> {
        self.official_position.and_then(|i| self.songs.get(i))
    }

    /// Last song whose window contains `now`, else the second-to-last song.
    ///
    /// The fallback keeps the observed upstream behaviour: near a boundary
    /// the entry before the last one is usually the track still on air. A
    /// single-entry timeline falls back to its only entry.
    pub fn resolve(&self, now: DateTime<Local>) -> Result<Resolved<'_>> {
        if self.songs.is_empty() {
            return Err(FipError::EmptyTimeline);
        }

        if let Some(song) = self.songs.iter().rev().find(|s| s.is_airing_at(now)) {
            return Ok(Resolved {
                song,
                how: Resolution::Window,
            });
        }

        let idx = self.songs.len().saturating_sub(2);
        warn!(
            "[schedule] no entry airs at {}, falling back to entry {} of {}",
            now.format("%H:%M:%S"),
            idx,
            self.songs.len()
        );
        Ok(Resolved {
            song: &self.songs[idx],
            how: Resolution::Fallback,
        })
    }

    pub fn current_song(&self, now: DateTime<Local>) -> Result<&Song> {
        self.resolve(now).map(|r| r.song)
    }

    /// One display line per song, `" -> "` marking the entries airing at `now`.
    pub fn render(&self, now: DateTime<Local>) -> impl Iterator<Item = String> + '_ {
        self.songs.iter().map(move |s| {
            let marker = if s.is_airing_at(now) { " -> " } else { "    " };
            format!("{marker}{s}")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::song::song_at;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 10, h, m, 0).single().unwrap()
    }

    fn timeline() -> ScheduleTimeline {
        ScheduleTimeline::from_songs(vec![
            song_at("first", at(10, 0), at(10, 4)),
            song_at("second", at(10, 4), at(10, 8)),
            song_at("third", at(10, 10), at(10, 14)),
            song_at("fourth", at(10, 14), at(10, 18)),
        ])
    }

    #[test]
    fn test_build_keeps_item_order() {
        let doc = ScheduleDocument::from_json(
            r#"{
                "levels": [{ "items": ["c", "a", "b"], "position": 1 }],
                "steps": {
                    "a": { "title": "A", "start": 100, "end": 200 },
                    "b": { "title": "B", "start": 200, "end": 300 },
                    "c": { "title": "C", "start": 300, "end": 400 },
                    "unused": { "title": "U", "start": 0, "end": 1 }
                }
            }"#,
        )
        .unwrap();
        let tl = ScheduleTimeline::build_from_document(&doc).unwrap();
        let titles: Vec<_> = tl.songs().iter().map(|s| s.display_title()).collect();
        assert_eq!(titles, ["c", "a", "b"]);
        assert_eq!(tl.official_current().unwrap().display_title(), "a");
    }

    #[test]
    fn test_build_rejects_dangling_id() {
        let doc = ScheduleDocument::from_json(
            r#"{ "levels": [{ "items": ["x"], "position": 0 }], "steps": {} }"#,
        )
        .unwrap();
        assert!(matches!(
            ScheduleTimeline::build_from_document(&doc),
            Err(FipError::Parse(_))
        ));
    }

    #[test]
    fn test_build_rejects_missing_levels() {
        let doc = ScheduleDocument::from_json(r#"{ "steps": {} }"#).unwrap();
        assert!(ScheduleTimeline::build_from_document(&doc).is_err());
    }

    #[test]
    fn test_current_song_in_window() {
        let tl = timeline();
        assert_eq!(tl.current_song(at(10, 5)).unwrap().display_title(), "second");
        assert_eq!(tl.current_song(at(10, 14)).unwrap().display_title(), "fourth");

        let r = tl.resolve(at(10, 0)).unwrap();
        assert_eq!(r.song.display_title(), "first");
        assert_eq!(r.how, Resolution::Window);
    }

    #[test]
    fn test_current_song_prefers_last_match() {
        let tl = ScheduleTimeline::from_songs(vec![
            song_at("long", at(10, 0), at(11, 0)),
            song_at("inner", at(10, 20), at(10, 25)),
        ]);
        assert_eq!(tl.current_song(at(10, 22)).unwrap().display_title(), "inner");
        assert_eq!(tl.current_song(at(10, 30)).unwrap().display_title(), "long");
    }

    #[test]
    fn test_gap_falls_back_to_second_to_last() {
        let tl = timeline();
        // 10:09 sits in the gap between "second" and "third"
        let r = tl.resolve(at(10, 9)).unwrap();
        assert_eq!(r.song.display_title(), "third");
        assert_eq!(r.how, Resolution::Fallback);

        assert_eq!(tl.current_song(at(23, 0)).unwrap().display_title(), "third");
    }

    #[test]
    fn test_single_entry_fallback() {
        let tl = ScheduleTimeline::from_songs(vec![song_at("only", at(10, 0), at(10, 4))]);
        let r = tl.resolve(at(12, 0)).unwrap();
        assert_eq!(r.song.display_title(), "only");
        assert_eq!(r.how, Resolution::Fallback);
    }

    #[test]
    fn test_empty_timeline() {
        let tl = ScheduleTimeline::from_songs(Vec::new());
        assert!(matches!(
            tl.current_song(at(10, 0)),
            Err(FipError::EmptyTimeline)
        ));
    }

    #[test]
    fn test_render_marks_current_entry() {
        let tl = timeline();
        let lines: Vec<String> = tl.render(at(10, 5)).collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "    10:00 - 10:04 | first - someone");
        assert_eq!(lines[1], " -> 10:04 - 10:08 | second - someone");
        assert!(lines[2].starts_with("    "));
    }
}
