/// Process-level runtime options for players and the session registry
use crate::error::{PlaybackError, Result};
use crate::shuffle::DEFAULT_MAX_ATTEMPTS;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = "chorus.toml";

/// Environment variable prefix (`CHORUS_INACTIVITY_TIMEOUT_SECS=...`)
pub const ENV_PREFIX: &str = "CHORUS";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PlayerOptions {
    /// Idle time before a connected session with nothing left to play is reset
    #[serde(default = "default_inactivity_timeout_secs")]
    pub inactivity_timeout_secs: u64,

    /// Lifetime of short-lived notices (forced-stop "finished", removals, resumes)
    #[serde(default = "default_finished_notice_ttl_secs")]
    pub finished_notice_ttl_secs: u64,

    #[serde(default = "default_shuffle_max_attempts")]
    pub shuffle_max_attempts: usize,

    /// Whether autoplay may extend the queue while `repeat=all` is set
    ///
    /// When disabled, reaching the last track under `repeat=all` wraps to
    /// the start instead.
    #[serde(default = "default_autoplay_under_repeat_all")]
    pub autoplay_under_repeat_all: bool,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            inactivity_timeout_secs: default_inactivity_timeout_secs(),
            finished_notice_ttl_secs: default_finished_notice_ttl_secs(),
            shuffle_max_attempts: default_shuffle_max_attempts(),
            autoplay_under_repeat_all: default_autoplay_under_repeat_all(),
        }
    }
}

impl PlayerOptions {
    /// Load options from `chorus.toml` (if present) and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Load options from a specific file (if present) and the environment
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut settings = config::Config::builder();

        if path.exists() {
            settings = settings.add_source(config::File::from(path.to_path_buf()));
        }

        // Override with environment variables (prefixed with CHORUS_)
        settings = settings.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .try_parsing(true),
        );

        let options: Self = settings
            .build()
            .map_err(|e| PlaybackError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| PlaybackError::Config(e.to_string()))?;

        options.validate()?;
        Ok(options)
    }

    /// Validate option values
    pub fn validate(&self) -> Result<()> {
        if self.inactivity_timeout_secs == 0 {
            return Err(PlaybackError::Config(
                "inactivity_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.shuffle_max_attempts == 0 {
            return Err(PlaybackError::Config(
                "shuffle_max_attempts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_secs(self.inactivity_timeout_secs)
    }

    pub fn finished_notice_ttl(&self) -> Duration {
        Duration::from_secs(self.finished_notice_ttl_secs)
    }
}

fn default_inactivity_timeout_secs() -> u64 {
    600
}

fn default_finished_notice_ttl_secs() -> u64 {
    5
}

fn default_shuffle_max_attempts() -> usize {
    DEFAULT_MAX_ATTEMPTS
}

fn default_autoplay_under_repeat_all() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let options = PlayerOptions::default();
        assert_eq!(options.inactivity_timeout(), Duration::from_secs(600));
        assert_eq!(options.finished_notice_ttl(), Duration::from_secs(5));
        assert_eq!(options.shuffle_max_attempts, 5);
        assert!(options.autoplay_under_repeat_all);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let options = PlayerOptions::load_from(Path::new("/nonexistent/chorus.toml")).unwrap();
        assert_eq!(options, PlayerOptions::default());
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chorus.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "inactivity_timeout_secs = 30").unwrap();
        writeln!(file, "autoplay_under_repeat_all = false").unwrap();

        let options = PlayerOptions::load_from(&path).unwrap();
        assert_eq!(options.inactivity_timeout_secs, 30);
        assert!(!options.autoplay_under_repeat_all);
        assert_eq!(options.finished_notice_ttl_secs, 5);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let options = PlayerOptions {
            inactivity_timeout_secs: 0,
            ..PlayerOptions::default()
        };
        assert!(matches!(options.validate(), Err(PlaybackError::Config(_))));
    }
}
