use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/chat";
pub const DEFAULT_LOCALE: &str = "en-US";

/// The out-of-the-box quick-reply prompts shown as chips under the feed.
pub const DEFAULT_QUICK_REPLIES: [&str; 4] = [
    "Plan a Mars trip",
    "Best time to visit Saturn",
    "How long to reach Neptune?",
    "Cost of lunar tourism",
];

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Relay endpoint the responder posts to.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Locale passed to the transcriber command for voice capture.
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Speech-to-text command. Invoked as `<transcriber> <locale>`; must
    /// print the final transcript as one line on stdout. Voice capture is
    /// unavailable when unset.
    #[serde(default)]
    pub transcriber: Option<String>,

    /// Text-to-speech command override. When unset, a synthesizer is probed
    /// for on PATH at startup.
    #[serde(default)]
    pub synthesizer: Option<String>,

    /// Custom quick-reply prompts; falls back to the built-in set.
    #[serde(default)]
    pub quick_replies: Option<Vec<String>>,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            locale: default_locale(),
            transcriber: None,
            synthesizer: None,
            quick_replies: None,
        }
    }
}

/// Errors that can occur when loading configuration from disk.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML.
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "Failed to read config at {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "Failed to parse config at {}: {}", path.display(), source)
            }
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}

impl Config {
    /// Load the config file from the platform config directory, falling back
    /// to defaults when no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(path),
            _ => Ok(Self::default()),
        }
    }

    fn load_from(path: PathBuf) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "astroguide").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Quick-reply prompts, custom or built-in.
    pub fn quick_replies(&self) -> Vec<String> {
        match &self.quick_replies {
            Some(custom) => custom.clone(),
            None => DEFAULT_QUICK_REPLIES.iter().map(|s| s.to_string()).collect(),
        }
    }
}
