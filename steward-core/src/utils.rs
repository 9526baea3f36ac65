// steward-core/src/utils.rs
//! General utility functions.

use std::path::PathBuf;

/// Keeps the first `max_chars` characters and appends `...` when anything was
/// cut off. Counts characters, not bytes.
pub fn truncate_string(input: &str, max_chars: usize) -> String {
    match input.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}...", &input[..byte_index]),
        None => input.to_string(),
    }
}

/// Expands a leading `~` to the home directory. Other paths pass through.
pub fn expand_tilde(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return PathBuf::from(path),
    };
    match dirs::home_dir() {
        Some(home) if rest.is_empty() => home,
        Some(home) => home.join(rest),
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_no_truncation() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("hello", 5), "hello");
        assert_eq!(truncate_string("", 0), "");
    }

    #[test]
    fn test_truncate_with_truncation() {
        assert_eq!(truncate_string("hello world", 5), "hello...");
        assert_eq!(truncate_string("hello world", 0), "...");
    }

    #[test]
    fn test_truncate_unicode() {
        assert_eq!(truncate_string("你好世界", 4), "你好世界");
        assert_eq!(truncate_string("你好世界", 2), "你好...");
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("/etc/hosts"), PathBuf::from("/etc/hosts"));
        assert_eq!(expand_tilde("~user/notes"), PathBuf::from("~user/notes"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~"), home);
            assert_eq!(expand_tilde("~/notes.txt"), home.join("notes.txt"));
        }
    }
}
