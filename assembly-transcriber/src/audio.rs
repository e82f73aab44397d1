use std::path::Path;

use tokio::fs::File;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Open an audio file for streaming upload. Returns the handle and its size.
///
/// The bytes are sent as-is; the service does its own decoding, so no format
/// check is made here beyond rejecting a missing or empty file.
pub async fn open_audio(path: &Path) -> Result<(File, u64)> {
    info!(path = %path.display(), "opening audio");

    let not_found = || Error::AudioNotFound {
        path: path.to_path_buf(),
    };
    let metadata = tokio::fs::metadata(path).await.map_err(|_| not_found())?;
    if !metadata.is_file() {
        return Err(not_found());
    }
    if metadata.len() == 0 {
        return Err(Error::EmptyAudio {
            path: path.to_path_buf(),
        });
    }

    let file = File::open(path).await?;
    debug!(bytes = metadata.len(), "audio opened");
    Ok((file, metadata.len()))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tokio::io::AsyncReadExt;

    use super::*;

    #[tokio::test]
    async fn test_open_audio_reports_size_and_reads_exact_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp3");
        std::fs::write(&path, [0x49, 0x44, 0x33, 0x04, 0x00]).unwrap();

        let (mut file, len) = open_audio(&path).await.unwrap();
        assert_eq!(len, 5);

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).await.unwrap();
        assert_eq!(bytes, vec![0x49, 0x44, 0x33, 0x04, 0x00]);
    }

    #[tokio::test]
    async fn test_open_audio_nonexistent_file() {
        let result = open_audio(&PathBuf::from("/nonexistent/clip.mp3")).await;
        assert!(matches!(result.unwrap_err(), Error::AudioNotFound { .. }));
    }

    #[tokio::test]
    async fn test_open_audio_rejects_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = open_audio(dir.path()).await;
        assert!(matches!(result.unwrap_err(), Error::AudioNotFound { .. }));
    }

    #[tokio::test]
    async fn test_open_audio_rejects_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        std::fs::write(&path, b"").unwrap();

        let result = open_audio(&path).await;
        assert!(matches!(result.unwrap_err(), Error::EmptyAudio { .. }));
    }
}
