use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Remote job status as reported by `GET /v2/transcript/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    /// The live API reports `"error"`; `"failed"` is accepted too.
    #[serde(alias = "error")]
    Failed,
    /// Any status string this client does not know, kept verbatim.
    /// Treated as non-terminal.
    #[serde(untagged)]
    Other(String),
}

impl JobStatus {
    /// Whether no further transition can occur from this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Other(raw) => raw.as_str(),
        };
        f.write_str(s)
    }
}

/// Body of a successful `POST /v2/upload`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub upload_url: String,
}

/// Body sent to `POST /v2/transcript`.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptRequest<'a> {
    pub audio_url: &'a str,
    pub language_code: &'a str,
}

/// Body of a successful `POST /v2/transcript`. Only the job id is needed.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptCreated {
    pub id: String,
}

/// Transcript resource returned by `GET /v2/transcript/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptResponse {
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A finished transcription written to disk.
#[derive(Debug, Clone)]
pub struct SavedTranscript {
    pub transcript_id: String,
    pub text: String,
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_decodes_known_values() {
        let s: JobStatus = serde_json::from_str("\"queued\"").unwrap();
        assert_eq!(s, JobStatus::Queued);
        let s: JobStatus = serde_json::from_str("\"processing\"").unwrap();
        assert_eq!(s, JobStatus::Processing);
        let s: JobStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(s, JobStatus::Completed);
    }

    #[test]
    fn test_status_failed_and_error_alias() {
        let s: JobStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(s, JobStatus::Failed);
        let s: JobStatus = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(s, JobStatus::Failed);
    }

    #[test]
    fn test_status_unknown_is_not_terminal() {
        let s: JobStatus = serde_json::from_str("\"throttled\"").unwrap();
        assert_eq!(s, JobStatus::Other("throttled".into()));
        assert_eq!(s.to_string(), "throttled");
        assert!(!s.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
    }

    #[test]
    fn test_transcript_response_optional_fields() {
        let r: TranscriptResponse =
            serde_json::from_str(r#"{"id": "t1", "status": "queued", "text": null}"#).unwrap();
        assert_eq!(r.id, "t1");
        assert!(r.text.is_none());
        assert!(r.error.is_none());
    }

    #[test]
    fn test_transcript_response_missing_id_reports_field() {
        let err = serde_json::from_str::<TranscriptResponse>(r#"{"status": "queued"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("missing field `id`"));
    }

    #[test]
    fn test_upload_response_mismatched_type() {
        let err = serde_json::from_str::<UploadResponse>(r#"{"upload_url": 42}"#).unwrap_err();
        assert!(err.to_string().contains("invalid type"));
    }

    #[test]
    fn test_transcript_request_shape() {
        let body = TranscriptRequest {
            audio_url: "https://cdn.example/a",
            language_code: "es",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"audio_url": "https://cdn.example/a", "language_code": "es"})
        );
    }
}
