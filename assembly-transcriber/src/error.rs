use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Which of the three API calls an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Upload,
    Submit,
    Poll,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Upload => write!(f, "upload"),
            Stage::Submit => write!(f, "submit"),
            Stage::Poll => write!(f, "poll"),
        }
    }
}

/// All errors that can occur in assembly-transcriber.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("audio file not found: {path}")]
    AudioNotFound { path: PathBuf },

    #[error("audio file is empty: {path}")]
    EmptyAudio { path: PathBuf },

    #[error("unsupported language code: \"{0}\"; expected e.g. \"es\" or \"en_us\"")]
    UnsupportedLanguage(String),

    #[error("{stage} request failed with HTTP {status}: {body}")]
    Transport {
        stage: Stage,
        status: u16,
        body: String,
    },

    #[error("invalid {stage} response: {message}")]
    InvalidResponse { stage: Stage, message: String },

    #[error("transcription job {id} failed: {}", .reason.as_deref().unwrap_or("no reason given"))]
    JobFailed { id: String, reason: Option<String> },

    #[error("transcription job {id} completed without text")]
    MissingText { id: String },

    #[error("gave up waiting for job {id} after {polls} polls ({}s)", .elapsed.as_secs())]
    PollTimeout {
        id: String,
        polls: u32,
        elapsed: Duration,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Process exit code for this failure class.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_)
            | Error::AudioNotFound { .. }
            | Error::EmptyAudio { .. }
            | Error::UnsupportedLanguage(_) => 2,
            Error::Transport { stage, .. } | Error::InvalidResponse { stage, .. } => match stage {
                Stage::Upload => 3,
                Stage::Submit => 4,
                Stage::Poll => 5,
            },
            Error::MissingText { .. } | Error::PollTimeout { .. } => 5,
            Error::JobFailed { .. } => 6,
            Error::Io(_) | Error::Http(_) | Error::Json(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
