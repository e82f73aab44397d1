use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{de, Deserialize, Deserializer};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::poll::PollPolicy;

/// Production API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.assemblyai.com";

/// Settings file name, looked up next to the executable and in the config dir.
pub const SETTINGS_FILE_NAME: &str = "appsettings.json";

/// Name of the log file created inside the base directory.
pub const LOG_FILE_NAME: &str = "log.txt";

const APP_DIR: &str = "assembly-transcriber";

/// Per-request HTTP timeout. Uploads of long recordings are slow.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// API key sent verbatim in the `Authorization` header.
///
/// `Debug` never prints the key.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(****)")
    }
}

/// A transcription language code such as `"es"` or `"en_us"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language(String);

impl Language {
    /// Validate and normalize a language code.
    ///
    /// Accepts a 2–3 letter primary code with an optional `_region` suffix.
    /// Hyphens are normalized to underscores and the code is lowercased.
    pub fn new(code: &str) -> Result<Self> {
        let normalized = code.trim().to_ascii_lowercase().replace('-', "_");
        let mut parts = normalized.split('_');

        let primary = parts.next().unwrap_or_default();
        let region = parts.next();
        let valid = (2..=3).contains(&primary.len())
            && primary.chars().all(|c| c.is_ascii_alphabetic())
            && region.is_none_or(|r| {
                (2..=3).contains(&r.len()) && r.chars().all(|c| c.is_ascii_alphanumeric())
            })
            && parts.next().is_none();

        if valid {
            Ok(Language(normalized))
        } else {
            Err(Error::UnsupportedLanguage(code.to_string()))
        }
    }

    pub fn code(&self) -> &str {
        &self.0
    }
}

impl Default for Language {
    fn default() -> Self {
        Language("es".into())
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Contents of `appsettings.json`.
///
/// ```json
/// { "AssemblyAI": { "ApiKey": "...", "BaseDirectory": "/data/audio",
///                   "InputFileName": "interview.mp3", "EnableLogging": true } }
/// ```
#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    #[serde(rename = "AssemblyAI", default)]
    assembly_ai: Settings,
}

/// The `AssemblyAI` section of the settings file. Every key is optional so
/// command-line flags can fill the gaps before [`Settings::into_config`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Settings {
    pub api_key: Option<String>,
    pub base_directory: Option<PathBuf>,
    pub input_file_name: Option<PathBuf>,
    #[serde(default, deserialize_with = "bool_or_string")]
    pub enable_logging: Option<bool>,
    pub language_code: Option<String>,
    pub base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub poll_initial_delay_ms: Option<u64>,
    pub poll_max_delay_ms: Option<u64>,
    pub poll_max_attempts: Option<u32>,
    pub poll_timeout_secs: Option<u64>,
}

/// `EnableLogging` is written both as a JSON boolean and as a string.
fn bool_or_string<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Option::<Flag>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Flag::Bool(b)) => Ok(Some(b)),
        Some(Flag::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            _ => Err(de::Error::custom(format!(
                "expected \"true\" or \"false\", got \"{s}\""
            ))),
        },
    }
}

impl Settings {
    /// Parse a settings file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read settings file {}: {e}", path.display()))
        })?;
        let file: SettingsFile = serde_json::from_str(&raw).map_err(|e| {
            Error::Config(format!("invalid settings file {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "settings loaded");
        Ok(file.assembly_ai)
    }

    /// Pick the settings file to load.
    ///
    /// An explicit path always wins. Otherwise the first existing file among:
    /// next to the executable, the working directory, and the user config dir
    /// (`~/.config/assembly-transcriber/` on Linux).
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        Self::locate_from(explicit, Path::new(""))
    }

    fn locate_from(explicit: Option<&Path>, working_dir: &Path) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }

        let beside_exe = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(SETTINGS_FILE_NAME)));
        let in_working_dir = Some(working_dir.join(SETTINGS_FILE_NAME));
        let in_config_dir = dirs::config_dir().map(|d| d.join(APP_DIR).join(SETTINGS_FILE_NAME));

        [beside_exe, in_working_dir, in_config_dir]
            .into_iter()
            .flatten()
            .find(|p| p.is_file())
    }

    /// Build a [`Config`] from these settings. Missing required keys are a
    /// configuration error. Call [`Config::validate`] on the result before use.
    pub fn into_config(self) -> Result<Config> {
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Config("ApiKey is not set".into()))?;
        let base_dir = self
            .base_directory
            .filter(|d| !d.as_os_str().is_empty())
            .ok_or_else(|| Error::Config("BaseDirectory is not set".into()))?;
        let input_file = self
            .input_file_name
            .filter(|f| !f.as_os_str().is_empty())
            .ok_or_else(|| Error::Config("InputFileName is not set".into()))?;

        let defaults = PollPolicy::default();
        let poll = PollPolicy::new()
            .initial_delay(
                self.poll_initial_delay_ms
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.initial_delay),
            )
            .max_delay(
                self.poll_max_delay_ms
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.max_delay),
            )
            .max_polls(self.poll_max_attempts.filter(|&n| n > 0))
            .timeout(
                self.poll_timeout_secs
                    .filter(|&s| s > 0)
                    .map(Duration::from_secs),
            );

        let mut config = Config::new(api_key, base_dir, input_file)
            .enable_logging(self.enable_logging.unwrap_or(false))
            .poll(poll);

        if let Some(code) = &self.language_code {
            config = config.language(code)?;
        }
        if let Some(url) = self.base_url {
            config = config.base_url(url);
        }
        if let Some(secs) = self.request_timeout_secs {
            config = config.request_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }
}

/// Everything one run needs. Built once, never mutated during the run.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: ApiKey,
    pub base_dir: PathBuf,
    /// Input audio; relative paths are resolved against `base_dir`.
    pub input_file: PathBuf,
    pub enable_logging: bool,
    pub language: Language,
    pub base_url: String,
    pub request_timeout: Duration,
    pub poll: PollPolicy,
    /// Draw an upload progress bar on stderr.
    pub show_progress: bool,
}

impl Config {
    pub fn new(
        api_key: impl Into<String>,
        base_dir: impl Into<PathBuf>,
        input_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            api_key: ApiKey::new(api_key),
            base_dir: base_dir.into(),
            input_file: input_file.into(),
            enable_logging: false,
            language: Language::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            poll: PollPolicy::default(),
            show_progress: true,
        }
    }

    /// Config for a single input file, with the transcript and log written to
    /// the file's own directory. `input_file` may be relative to the working
    /// directory.
    pub fn for_input(api_key: impl Into<String>, input_file: impl AsRef<Path>) -> Result<Self> {
        let input_file = std::path::absolute(input_file.as_ref())?;
        let base_dir = input_file
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::Config(format!("{} has no parent directory", input_file.display())))?;
        Ok(Self::new(api_key, base_dir, input_file))
    }

    pub fn enable_logging(mut self, enabled: bool) -> Self {
        self.enable_logging = enabled;
        self
    }

    /// Set the language code. Validates the code's shape.
    pub fn language(mut self, code: &str) -> Result<Self> {
        self.language = Language::new(code)?;
        Ok(self)
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn poll(mut self, policy: PollPolicy) -> Self {
        self.poll = policy;
        self
    }

    pub fn show_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    /// `{base_dir}/log.txt`
    pub fn log_file_path(&self) -> PathBuf {
        self.base_dir.join(LOG_FILE_NAME)
    }

    /// Check required values, normalize paths, and make sure the base
    /// directory exists. Runs before any network activity.
    pub fn validate(mut self) -> Result<Self> {
        if self.api_key.expose().trim().is_empty() {
            return Err(Error::Config("ApiKey is not set".into()));
        }
        if self.base_dir.as_os_str().is_empty() {
            return Err(Error::Config("BaseDirectory is not set".into()));
        }
        if self.input_file.as_os_str().is_empty() {
            return Err(Error::Config("InputFileName is not set".into()));
        }
        if self.poll.initial_delay.is_zero() || self.poll.max_delay < self.poll.initial_delay {
            return Err(Error::Config(format!(
                "poll delays must satisfy 0 < initial ({}ms) <= max ({}ms)",
                self.poll.initial_delay.as_millis(),
                self.poll.max_delay.as_millis()
            )));
        }

        validate_url(&self.base_url)?;
        self.base_url = self.base_url.trim().trim_end_matches('/').to_string();

        self.base_dir = std::path::absolute(&self.base_dir)?;
        self.input_file = std::path::absolute(self.base_dir.join(&self.input_file))?;

        if !self.base_dir.exists() {
            std::fs::create_dir_all(&self.base_dir)?;
            info!(path = %self.base_dir.display(), "created base directory");
        }

        if !self.input_file.is_file() {
            return Err(Error::AudioNotFound {
                path: self.input_file.clone(),
            });
        }

        Ok(self)
    }
}

/// Validate that a string looks like an HTTP(S) URL.
fn validate_url(url: &str) -> Result<()> {
    let trimmed = url.trim();
    if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "invalid base URL (must start with http:// or https://): {trimmed}"
        )))
    }
}
