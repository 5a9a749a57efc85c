//! Wire types for the live schedule document.
//!
//! ```text
//! { levels: [ { items: [id...], position: int }, ... ],
//!   steps:  { id: { title, performers, ..., start, end }, ... } }
//! ```
//!
//! Every step field is optional: an absent key and a JSON `null` both come
//! out as `None`, while an empty string stays `Some("")`.

use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleDocument {
    #[serde(default)]
    pub levels: Vec<Level>,
    #[serde(default)]
    pub steps: HashMap<String, StepRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Level {
    #[serde(default)]
    pub items: Vec<String>,
    pub position: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StepRecord {
    pub title: Option<String>,
    pub performers: Option<String>,
    pub authors: Option<String>,
    pub label: Option<String>,
    #[serde(rename = "titreAlbum")]
    pub album_title: Option<String>,
    #[serde(rename = "lienYoutube")]
    pub youtube_link: Option<String>,
    pub visual: Option<String>,
    #[serde(rename = "anneeEditionMusique")]
    pub year: Option<YearField>,
    pub start: Option<i64>,
    pub end: Option<i64>,
}

/// The API has sent the release year both as a number and as a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum YearField {
    Number(i32),
    Text(String),
}

impl YearField {
    pub fn value(&self) -> Option<i32> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl ScheduleDocument {
    pub fn from_json(body: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(body)?)
    }
}
