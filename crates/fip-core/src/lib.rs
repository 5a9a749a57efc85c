//! Live "now playing" schedule of a radio station, and acquisition of the
//! track on air as a tagged audio file.

pub mod acquire;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod platform;
pub mod schedule;
pub mod song;
pub mod text;
pub mod timeline;
pub mod tools;

pub use error::{FipError, Result};
