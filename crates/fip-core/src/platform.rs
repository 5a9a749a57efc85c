use std::path::PathBuf;

pub fn data_dir() -> PathBuf {
    // On macOS and Linux, use ~/.local/share/fip/ (XDG standard)
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".local")
            .join("share")
            .join("fip")
    }
    #[cfg(windows)]
    {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fip")
    }
}

pub fn config_dir() -> PathBuf {
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("fip")
    }

    #[cfg(windows)]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fip")
    }
}

#[cfg(unix)]
fn yt_dlp_binary_names() -> &'static [&'static str] {
    &["yt-dlp"]
}

#[cfg(windows)]
fn yt_dlp_binary_names() -> &'static [&'static str] {
    &["yt-dlp.exe", "yt-dlp"]
}

#[cfg(unix)]
fn eyed3_binary_names() -> &'static [&'static str] {
    &["eyeD3"]
}

#[cfg(windows)]
fn eyed3_binary_names() -> &'static [&'static str] {
    &["eyeD3.exe", "eyeD3"]
}

fn find_beside_exe(names: &[&str]) -> Option<PathBuf> {
    let current_exe = std::env::current_exe().ok()?;
    let dir = current_exe.parent()?;
    for name in names {
        let p = dir.join(name);
        if p.exists() {
            return Some(p);
        }
    }
    None
}

fn find_on_path(names: &[&str]) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path) {
        for name in names {
            let p = dir.join(name);
            if p.is_file() {
                return Some(p);
            }
        }
    }
    None
}

fn find_binary(env_var: &str, names: &[&str]) -> Option<PathBuf> {
    if let Some(p) = std::env::var_os(env_var).map(PathBuf::from) {
        if p.exists() {
            return Some(p);
        }
    }
    find_beside_exe(names).or_else(|| find_on_path(names))
}

/// Find yt-dlp binary for audio extraction.
///
/// Searches in order:
/// 1. YT_DLP_PATH environment variable
/// 2. Beside current executable
/// 3. PATH
pub fn find_yt_dlp_binary() -> Option<PathBuf> {
    find_binary("YT_DLP_PATH", yt_dlp_binary_names())
}

/// Find eyeD3 binary for tag writing. Same order as [`find_yt_dlp_binary`],
/// with EYED3_PATH as the override.
pub fn find_eyed3_binary() -> Option<PathBuf> {
    find_binary("EYED3_PATH", eyed3_binary_names())
}

/// Explicit path if given, else discovery, else the bare name so that a
/// spawn failure reports the tool as missing.
pub fn resolve_tool(explicit: Option<&PathBuf>, found: Option<PathBuf>, name: &str) -> PathBuf {
    explicit
        .cloned()
        .or(found)
        .unwrap_or_else(|| PathBuf::from(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_tool_precedence() {
        let explicit = PathBuf::from("/opt/yt-dlp");
        assert_eq!(
            resolve_tool(Some(&explicit), Some(PathBuf::from("/usr/bin/yt-dlp")), "yt-dlp"),
            explicit
        );
        assert_eq!(
            resolve_tool(None, Some(PathBuf::from("/usr/bin/yt-dlp")), "yt-dlp"),
            PathBuf::from("/usr/bin/yt-dlp")
        );
        assert_eq!(resolve_tool(None, None, "yt-dlp"), PathBuf::from("yt-dlp"));
    }

    #[test]
    fn test_missing_binary_is_not_found() {
        assert!(find_on_path(&["definitely-not-a-real-tool-7f3a"]).is_none());
    }
}
