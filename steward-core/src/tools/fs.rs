// steward-core/src/tools/fs.rs

use anyhow::{anyhow, Context, Result};
use tracing::info;

use crate::utils::{expand_tilde, truncate_string};

/// Reads a UTF-8 text file. A leading `~` is expanded to the home directory.
pub async fn read_file(path: &str) -> Result<String> {
    let resolved = expand_tilde(path);
    let path_display = truncate_string(&resolved.to_string_lossy(), 60);

    if !resolved.is_file() {
        return Err(anyhow!("File not found: {}", resolved.display()));
    }

    info!("Reading file: {}", path_display);
    let content = tokio::fs::read_to_string(&resolved)
        .await
        .with_context(|| format!("Failed to read file: {}", resolved.display()))?;
    info!("Read {} bytes from file {}", content.len(), path_display);
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_read_file_success() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "line one\nline two").unwrap();

        let content = read_file(path.to_str().unwrap()).await.unwrap();
        assert_eq!(content, "line one\nline two");
    }

    #[tokio::test]
    async fn test_read_file_missing_and_directory() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        let err = read_file(missing.to_str().unwrap()).await.unwrap_err();
        assert_eq!(err.to_string(), format!("File not found: {}", missing.display()));

        let err = read_file(dir.path().to_str().unwrap()).await.unwrap_err();
        assert!(err.to_string().starts_with("File not found"));
    }
}
