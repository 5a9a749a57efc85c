use std::io;
use thiserror::Error;

/// Everything that can go wrong during one fetch-resolve-acquire cycle.
///
/// Fetch and parse errors abort the run. Acquisition errors are recorded
/// per step in an [`AcquisitionReport`](crate::acquire::AcquisitionReport).
#[derive(Debug, Error)]
pub enum FipError {
    #[error("could not connect to {addr}: {source}")]
    Connection {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("transfer from {addr} failed: {source}")]
    Transfer {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("{addr} answered with HTTP status {status}")]
    HttpStatus { addr: String, status: u16 },

    #[error("malformed schedule: {0}")]
    Parse(String),

    #[error("schedule has no entries")]
    EmptyTimeline,

    #[error("{tool} is not installed (or not on PATH)")]
    MissingTool { tool: String },

    #[error("{tool} failed: {detail}")]
    ToolFailure { tool: String, detail: String },

    #[error("no source link for this song")]
    MissingSource,

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl FipError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn tool_failure(tool: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::ToolFailure {
            tool: tool.into(),
            detail: detail.into(),
        }
    }

    /// True when the operator can fix the problem by installing something.
    pub fn is_missing_tool(&self) -> bool {
        matches!(self, Self::MissingTool { .. })
    }
}

impl From<serde_json::Error> for FipError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FipError>;
