//! Hosted transcription client: audio file in, transcript text file out.
//!
//! **assembly-transcriber** uploads a local audio file to the AssemblyAI API,
//! requests a transcription job, polls it with capped exponential backoff
//! (5s, 10s, 20s, 30s, 30s, ...), and writes the text into the configured
//! base directory as `{name}_transcript_{uuid}.txt`.
//!
//! # Quick start
//!
//! ```rust,no_run
//! # #[tokio::main]
//! # async fn main() -> assembly_transcriber::Result<()> {
//! use assembly_transcriber::Config;
//!
//! let config = Config::new("my-api-key", "/data/audio", "interview.mp3")
//!     .language("en")?
//!     .validate()?;
//!
//! let saved = assembly_transcriber::transcribe_file(&config).await?;
//! println!("{}", saved.path.display());
//! # Ok(())
//! # }
//! ```

pub(crate) mod audio;
pub mod client;
pub mod config;
pub mod error;
pub mod output;
pub mod poll;
pub mod types;

pub use client::Client;
pub use config::{ApiKey, Config, Language, Settings};
pub use error::{Error, Result, Stage};
pub use poll::{poll_until_complete, Backoff, PollPolicy, PollStatus};
pub use types::{JobStatus, SavedTranscript};

use tracing::info;

/// Upload, transcribe and save the file named by `config`.
///
/// `config` should already have been through [`Config::validate`].
pub async fn transcribe_file(config: &Config) -> Result<SavedTranscript> {
    let client = Client::new(config)?;
    transcribe_file_with_client(&client, config).await
}

/// Same as [`transcribe_file`] with a caller-provided client.
pub async fn transcribe_file_with_client(
    client: &Client,
    config: &Config,
) -> Result<SavedTranscript> {
    info!(path = %config.input_file.display(), "uploading audio file");
    let audio_url = client.upload(&config.input_file).await?;

    let transcript_id = client
        .request_transcript(&audio_url, &config.language)
        .await?;

    info!(transcript_id = %transcript_id, "waiting for transcription to finish");
    let text = client
        .wait_for_transcript(&transcript_id, &config.poll)
        .await?;

    let path = output::write_transcript(&config.base_dir, &config.input_file, &text).await?;

    Ok(SavedTranscript {
        transcript_id,
        text,
        path,
    })
}
