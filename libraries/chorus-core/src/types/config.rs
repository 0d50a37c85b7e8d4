/// Per-session playback configuration
use crate::error::{ChorusError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Playback volume in percent, always within 1..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Volume(u8);

impl Volume {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 100;

    /// Validate a volume level
    pub fn new(level: u8) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&level) {
            Ok(Self(level))
        } else {
            Err(ChorusError::invalid_input(format!(
                "volume must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                level
            )))
        }
    }

    pub fn level(self) -> u8 {
        self.0
    }

    /// Linear gain handed to the transport (level / 100)
    pub fn gain(self) -> f32 {
        f32::from(self.0) / 100.0
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self(Self::MAX)
    }
}

impl TryFrom<u8> for Volume {
    type Error = ChorusError;

    fn try_from(level: u8) -> Result<Self> {
        Self::new(level)
    }
}

impl From<Volume> for u8 {
    fn from(volume: Volume) -> Self {
        volume.0
    }
}

impl FromStr for Volume {
    type Err = ChorusError;

    fn from_str(s: &str) -> Result<Self> {
        let level = s
            .trim()
            .trim_end_matches('%')
            .parse::<u8>()
            .map_err(|_| ChorusError::invalid_input(format!("invalid volume: {s}")))?;
        Self::new(level)
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Repeat mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop when the queue ends
    #[default]
    Off,

    /// Loop the current track
    Single,

    /// Loop the entire queue
    All,
}

impl RepeatMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Single => "single",
            Self::All => "all",
        }
    }
}

impl FromStr for RepeatMode {
    type Err = ChorusError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "single" => Ok(Self::Single),
            "all" => Ok(Self::All),
            other => Err(ChorusError::invalid_input(format!(
                "repeat must be one of off, single, all; got {other}"
            ))),
        }
    }
}

impl fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strongly typed session configuration mirrored from the session store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    pub volume: Volume,
    pub repeat: RepeatMode,
    pub shuffle: bool,
    pub autoplay: bool,
}

impl SessionConfig {
    /// Apply a single-key update
    pub fn apply(&mut self, update: ConfigUpdate) {
        match update {
            ConfigUpdate::Volume(volume) => self.volume = volume,
            ConfigUpdate::Repeat(mode) => self.repeat = mode,
            ConfigUpdate::Shuffle(on) => self.shuffle = on,
            ConfigUpdate::Autoplay(on) => self.autoplay = on,
        }
    }
}

/// A single config key with its new value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "key", content = "value", rename_all = "lowercase")]
pub enum ConfigUpdate {
    Volume(Volume),
    Repeat(RepeatMode),
    Shuffle(bool),
    Autoplay(bool),
}
