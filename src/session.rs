use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

use crate::ui::StegoCamApp;

impl StegoCamApp {
    /// Save an encrypt response under the download directory. The session
    /// folder is created lazily on the first save of this run; the filename
    /// matches the download name the backend advertises.
    pub fn save_stego_download(&mut self, bytes: &[u8]) -> Result<PathBuf> {
        let folder = self
            .session_folder
            .get_or_insert_with(|| format!("session_{}", Local::now().format("%Y%m%d_%H%M%S")));

        let session_dir = self.config.paths.download_dir.join(&*folder);
        write_stego_download(&session_dir, bytes)
    }
}

pub(crate) fn write_stego_download(dir: &Path, bytes: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create download directory {}", dir.display()))?;

    let save_path = dir.join("stego_encrypted.png");
    std::fs::write(&save_path, bytes)
        .with_context(|| format!("Failed to write {}", save_path.display()))?;

    Ok(save_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_download_with_fixed_name() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("session_test");

        let path = write_stego_download(&dir, b"stego bytes").unwrap();

        assert_eq!(path.file_name().unwrap(), "stego_encrypted.png");
        assert_eq!(std::fs::read(&path).unwrap(), b"stego bytes");
    }

    #[test]
    fn repeat_saves_overwrite_in_place() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("session_test");

        write_stego_download(&dir, b"first").unwrap();
        let path = write_stego_download(&dir, b"second").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"second");
    }
}
