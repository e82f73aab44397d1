use std::path::Path;

use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use crate::audio;
use crate::config::{Config, Language};
use crate::error::{Error, Result, Stage};
use crate::poll::{self, PollPolicy, PollStatus};
use crate::types::{JobStatus, TranscriptCreated, TranscriptRequest, TranscriptResponse, UploadResponse};

/// Read buffer size for the streamed upload body.
const UPLOAD_CHUNK_SIZE: usize = 256 * 1024;

/// Error bodies are truncated to this many characters.
const MAX_ERROR_BODY_CHARS: usize = 1000;

/// Client for the three transcription endpoints.
///
/// Holds one connection pool; every request carries the API key in the
/// `Authorization` header.
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    show_progress: bool,
}

impl Client {
    pub fn new(config: &Config) -> Result<Self> {
        let mut auth = HeaderValue::from_str(config.api_key.expose()).map_err(|_| {
            Error::Config("ApiKey contains characters not allowed in an HTTP header".into())
        })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            show_progress: config.show_progress,
        })
    }

    /// Upload a local audio file. Returns the private URL the service
    /// assigned to it.
    pub async fn upload(&self, path: &Path) -> Result<String> {
        let (file, total) = audio::open_audio(path).await?;

        let pb = self.upload_progress(total, path);
        let stream = ReaderStream::with_capacity(file, UPLOAD_CHUNK_SIZE).inspect({
            let pb = pb.clone();
            move |chunk| {
                if let Ok(chunk) = chunk {
                    pb.inc(chunk.len() as u64);
                }
            }
        });

        let url = format!("{}/v2/upload", self.base_url);
        debug!(%url, bytes = total, "uploading audio");
        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(CONTENT_LENGTH, total)
            .body(reqwest::Body::wrap_stream(stream))
            .send()
            .await;
        pb.finish_and_clear();

        let uploaded: UploadResponse = decode(check(Stage::Upload, response?).await?).await?;
        if uploaded.upload_url.trim().is_empty() {
            return Err(Error::InvalidResponse {
                stage: Stage::Upload,
                message: "empty upload_url".into(),
            });
        }

        info!(bytes = total, "audio uploaded");
        Ok(uploaded.upload_url)
    }

    /// Create a transcription job for previously uploaded audio. Returns the
    /// job id.
    pub async fn request_transcript(&self, audio_url: &str, language: &Language) -> Result<String> {
        let url = format!("{}/v2/transcript", self.base_url);
        let body = TranscriptRequest {
            audio_url,
            language_code: language.code(),
        };

        let response = self.http.post(&url).json(&body).send().await?;
        let created: TranscriptCreated = decode(check(Stage::Submit, response).await?).await?;
        if created.id.trim().is_empty() {
            return Err(Error::InvalidResponse {
                stage: Stage::Submit,
                message: "empty transcript id".into(),
            });
        }

        info!(transcript_id = %created.id, language = %language, "transcription requested");
        Ok(created.id)
    }

    /// Fetch the current state of a transcription job once.
    pub async fn fetch_transcript(&self, id: &str) -> Result<TranscriptResponse> {
        let url = format!("{}/v2/transcript/{id}", self.base_url);
        let response = self.http.get(&url).send().await?;
        let transcript: TranscriptResponse = decode(check(Stage::Poll, response).await?).await?;
        debug!(transcript_id = id, status = %transcript.status, "polled transcript");
        Ok(transcript)
    }

    /// Poll a job until it finishes and return its text.
    ///
    /// A completed job without text is reported as [`Error::MissingText`].
    pub async fn wait_for_transcript(&self, id: &str, policy: &PollPolicy) -> Result<String> {
        let text = poll::poll_until_complete(id, policy, move || async move {
            let transcript = self.fetch_transcript(id).await?;
            if !transcript.status.is_terminal() {
                if let JobStatus::Other(raw) = &transcript.status {
                    warn!(transcript_id = id, status = %raw, "unrecognised job status, polling again");
                }
                return Ok(PollStatus::Pending(transcript.status.to_string()));
            }
            Ok(match transcript.status {
                JobStatus::Failed => PollStatus::Failed(transcript.error),
                _ => PollStatus::Completed(transcript.text),
            })
        })
        .await?;

        text.filter(|t| !t.is_empty())
            .ok_or_else(|| Error::MissingText { id: id.to_string() })
    }

    fn upload_progress(&self, total: u64, path: &Path) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_message(format!(
            "Uploading {}",
            path.file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_default()
        ));
        pb
    }
}

/// Turn a non-success response into a [`Error::Transport`] for `stage`.
async fn check(stage: Stage, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let body: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    warn!(%stage, status = status.as_u16(), "request rejected");
    Err(Error::Transport {
        stage,
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}
