use std::path::{Path, PathBuf};

use tracing::info;
use uuid::Uuid;

use crate::error::Result;

/// `{base_dir}/{input stem}_transcript_{random_id}.txt`
pub fn transcript_path(base_dir: &Path, input_file: &Path, random_id: Uuid) -> PathBuf {
    let stem = input_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio".into());
    base_dir.join(format!("{stem}_transcript_{random_id}.txt"))
}

/// Write `text` to a fresh transcript file next to the other outputs.
/// Returns the path written.
pub async fn write_transcript(base_dir: &Path, input_file: &Path, text: &str) -> Result<PathBuf> {
    let path = transcript_path(base_dir, input_file, Uuid::new_v4());
    tokio::fs::write(&path, text).await?;
    info!(path = %path.display(), bytes = text.len(), "transcript saved");
    Ok(path)
}
