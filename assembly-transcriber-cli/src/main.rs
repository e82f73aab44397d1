mod logging;

use std::path::PathBuf;

use assembly_transcriber::{Config, SavedTranscript, Settings};
use clap::Parser;
use tracing::{error, info};

/// Polling gives up after this long unless `--max-wait` or `PollTimeoutSecs` says otherwise.
const DEFAULT_MAX_WAIT_SECS: u64 = 2 * 60 * 60;

#[derive(Parser)]
#[command(
    name = "assembly-transcriber",
    about = "Upload an audio file to AssemblyAI and save its transcript"
)]
struct Cli {
    /// Audio file to transcribe, relative to the base directory or a full path.
    /// Overrides InputFileName.
    input: Option<PathBuf>,

    /// Settings file (default: appsettings.json next to the executable,
    /// in the working directory, or in the user config directory).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API key. Overrides ApiKey.
    #[arg(long, env = "ASSEMBLYAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Directory for the transcript and log.txt. Overrides BaseDirectory.
    #[arg(short, long)]
    base_dir: Option<PathBuf>,

    /// Language code (e.g. "es", "en_us"). Overrides LanguageCode.
    #[arg(short, long)]
    language: Option<String>,

    /// Append log lines to <base-dir>/log.txt.
    #[arg(long, conflicts_with = "no_log")]
    log: bool,

    /// Never write <base-dir>/log.txt, even if EnableLogging is set.
    #[arg(long)]
    no_log: bool,

    /// Stop polling after this many seconds (0 = wait until the job finishes).
    /// [default: 7200]
    #[arg(long)]
    max_wait: Option<u64>,

    /// Stop polling after this many status checks.
    #[arg(long)]
    max_polls: Option<u32>,

    /// API base URL.
    #[arg(long, hide = true)]
    base_url: Option<String>,

    /// Disable the upload progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Also print the transcript to stdout.
    #[arg(long)]
    print: bool,
}

impl Cli {
    /// Layer command-line values over the settings file.
    fn apply_to(&self, mut settings: Settings) -> Settings {
        if let Some(key) = &self.api_key {
            settings.api_key = Some(key.clone());
        }
        if let Some(dir) = &self.base_dir {
            settings.base_directory = Some(dir.clone());
        }
        if let Some(input) = &self.input {
            settings.input_file_name = Some(input.clone());
        }
        if let Some(lang) = &self.language {
            settings.language_code = Some(lang.clone());
        }
        if let Some(url) = &self.base_url {
            settings.base_url = Some(url.clone());
        }
        if self.log {
            settings.enable_logging = Some(true);
        }
        if self.no_log {
            settings.enable_logging = Some(false);
        }
        if let Some(polls) = self.max_polls {
            settings.poll_max_attempts = Some(polls);
        }
        settings.poll_timeout_secs = self
            .max_wait
            .or(settings.poll_timeout_secs)
            .or(Some(DEFAULT_MAX_WAIT_SECS));
        settings
    }

    fn load_config(&self) -> assembly_transcriber::Result<Config> {
        let settings = match Settings::locate(self.config.as_deref()) {
            Some(path) => Settings::load(&path)?,
            None => Settings::default(),
        };
        let config = self
            .apply_to(settings)
            .into_config()?
            .show_progress(!self.no_progress);
        config.validate()
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = cli.load_config();
    let log_file = match &config {
        Ok(c) if c.enable_logging => Some(c.log_file_path()),
        _ => None,
    };
    logging::init(log_file.as_deref());

    let config = match config {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    };

    info!(input = %config.input_file.display(), "run started");

    let code = report(assembly_transcriber::transcribe_file(&config).await, cli.print);

    info!(exit_code = code, "run finished");
    std::process::exit(code);
}

/// Report the run's outcome and pick the exit code. Failures go to stderr
/// once, through the log.
fn report(result: assembly_transcriber::Result<SavedTranscript>, print: bool) -> i32 {
    match result {
        Ok(saved) => {
            eprintln!("Transcript saved to {}", saved.path.display());
            if print {
                println!("{}", saved.text);
            }
            0
        }
        Err(e) => {
            error!(error = %e, "transcription failed");
            e.exit_code()
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("assembly-transcriber").chain(args.iter().copied()))
            .unwrap()
    }

    fn file_settings() -> Settings {
        Settings {
            api_key: Some("from-file".into()),
            base_directory: Some("/data/audio".into()),
            input_file_name: Some("file.mp3".into()),
            enable_logging: Some(true),
            ..Settings::default()
        }
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_settings_file() {
        let cli = parse(&[
            "clip.wav",
            "--api-key",
            "from-flag",
            "--base-dir",
            "/tmp/out",
            "--language",
            "en",
            "--no-log",
        ]);
        let s = cli.apply_to(file_settings());
        assert_eq!(s.api_key.as_deref(), Some("from-flag"));
        assert_eq!(s.base_directory, Some(PathBuf::from("/tmp/out")));
        assert_eq!(s.input_file_name, Some(PathBuf::from("clip.wav")));
        assert_eq!(s.language_code.as_deref(), Some("en"));
        assert_eq!(s.enable_logging, Some(false));
    }

    #[test]
    fn test_settings_file_values_kept_without_flags() {
        let cli = parse(&["--api-key", "k"]);
        let s = cli.apply_to(file_settings());
        assert_eq!(s.base_directory, Some(PathBuf::from("/data/audio")));
        assert_eq!(s.input_file_name, Some(PathBuf::from("file.mp3")));
        assert_eq!(s.enable_logging, Some(true));
    }

    #[test]
    fn test_max_wait_precedence() {
        let cli = parse(&["--api-key", "k"]);
        assert_eq!(
            cli.apply_to(Settings::default()).poll_timeout_secs,
            Some(DEFAULT_MAX_WAIT_SECS)
        );

        let from_file = Settings {
            poll_timeout_secs: Some(600),
            ..Settings::default()
        };
        assert_eq!(cli.apply_to(from_file).poll_timeout_secs, Some(600));

        let cli = parse(&["--api-key", "k", "--max-wait", "0"]);
        let s = cli.apply_to(Settings {
            poll_timeout_secs: Some(600),
            ..Settings::default()
        });
        assert_eq!(s.poll_timeout_secs, Some(0));
    }

    #[test]
    fn test_max_wait_zero_means_unbounded() {
        let cli = parse(&["--api-key", "k", "--max-wait", "0", "--max-polls", "12"]);
        let config = cli.apply_to(file_settings()).into_config().unwrap();
        assert_eq!(config.poll.timeout, None);
        assert_eq!(config.poll.max_polls, Some(12));
    }

    #[test]
    fn test_log_flags_conflict() {
        let result = Cli::try_parse_from(["assembly-transcriber", "--log", "--no-log"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_settings_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("appsettings.json");
        let cli = parse(&["--config", missing.to_str().unwrap()]);
        let err = cli.load_config().unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_load_config_from_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("entrevista.mp3"), b"ID3").unwrap();
        let settings = dir.path().join("appsettings.json");
        let body = settings_body(dir.path());
        std::fs::write(&settings, body).unwrap();

        let cli = parse(&["--config", settings.to_str().unwrap(), "--api-key", "k"]);
        let config = cli.load_config().unwrap();

        assert_eq!(config.input_file, dir.path().join("entrevista.mp3"));
        assert!(config.enable_logging);
        assert_eq!(config.log_file_path(), dir.path().join("log.txt"));
    }

    #[test]
    fn test_report_logs_failure_once_with_exit_code() {
        use tracing_subscriber::prelude::*;

        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("log.txt");
        let subscriber = tracing_subscriber::registry().with(logging::file_layer(&log).unwrap());

        let failure = assembly_transcriber::Error::MissingText {
            id: "tr_42".into(),
        };
        let message = failure.to_string();
        let code = tracing::subscriber::with_default(subscriber, || report(Err(failure), false));

        assert_eq!(code, 5);
        let content = std::fs::read_to_string(&log).unwrap();
        assert_eq!(content.matches(message.as_str()).count(), 1);
        assert!(content.contains("ERROR"));
    }

    #[test]
    fn test_report_success_is_zero() {
        let saved = SavedTranscript {
            transcript_id: "tr_1".into(),
            text: "hola".into(),
            path: PathBuf::from("/tmp/clip_transcript_x.txt"),
        };
        assert_eq!(report(Ok(saved), false), 0);
    }

    fn settings_body(base_dir: &std::path::Path) -> String {
        format!(
            r#"{{"AssemblyAI": {{"ApiKey": "file-key", "BaseDirectory": {:?}, "InputFileName": "entrevista.mp3", "EnableLogging": "true"}}}}"#,
            base_dir.to_str().unwrap()
        )
    }
}
