//! Text normalization shared by filenames, tags and display.

/// Characters stripped from both ends of every text field at ingestion.
pub const TRIM_SET: &[char] = &[
    ' ', '\t', '\r', '\n', '"', '\'', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', ',', ';',
    '-', '_', '*',
];

/// Lowercase and trim [`TRIM_SET`] from both ends.
///
/// Applied exactly once when a [`Song`](crate::song::Song) is built. Running
/// it again is a no-op.
pub fn normalize(raw: &str) -> String {
    raw.to_lowercase().trim_matches(TRIM_SET).to_string()
}

/// Make a normalized fragment usable inside a file name: spaces become
/// underscores, colons disappear and path separators become dashes.
pub fn filename_fragment(s: &str) -> String {
    s.replace(' ', "_").replace(':', "").replace(['/', '\\'], "-")
}
