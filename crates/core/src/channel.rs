//! Logical tracking channels.
//!
//! A channel names *what kind* of task is being tracked ("transcription",
//! "model-install:nllb", ...). At most one task id is persisted per
//! channel, under the key returned by [`Channel::storage_key`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Prefix of the persisted key for a channel (`task_<channel>`).
pub const STORAGE_KEY_PREFIX: &str = "task_";

/// Longest accepted channel name, in bytes.
pub const MAX_CHANNEL_LEN: usize = 128;

pub const TRANSCRIPTION: &str = "transcription";
pub const DIARIZATION: &str = "diarization";
pub const MODEL_INSTALL_PREFIX: &str = "model-install";
pub const TRANSLATION_DOWNLOAD_PREFIX: &str = "translation-download";

/// A validated channel name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Channel(String);

impl Channel {
    /// Validate and wrap a channel name.
    ///
    /// Names are non-empty, at most [`MAX_CHANNEL_LEN`] bytes, and limited
    /// to ASCII alphanumerics plus `-`, `_`, `.` and `:`.
    pub fn new(name: impl Into<String>) -> Result<Self, CoreError> {
        let name = name.into();
        if name.is_empty() {
            return Err(CoreError::InvalidChannel {
                name,
                reason: "must not be empty",
            });
        }
        if name.len() > MAX_CHANNEL_LEN {
            return Err(CoreError::InvalidChannel {
                name,
                reason: "is longer than 128 bytes",
            });
        }
        if !name.chars().all(is_channel_char) {
            return Err(CoreError::InvalidChannel {
                name,
                reason: "may only contain ASCII letters, digits, '-', '_', '.' and ':'",
            });
        }
        Ok(Self(name))
    }

    pub fn transcription() -> Self {
        Self(TRANSCRIPTION.to_string())
    }

    pub fn diarization() -> Self {
        Self(DIARIZATION.to_string())
    }

    /// Channel tracking the installation of the named model.
    pub fn model_install(model: &str) -> Result<Self, CoreError> {
        Self::new(format!("{MODEL_INSTALL_PREFIX}:{model}"))
    }

    /// Channel tracking the download of the named translation model.
    pub fn translation_download(model: &str) -> Result<Self, CoreError> {
        Self::new(format!("{TRANSLATION_DOWNLOAD_PREFIX}:{model}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Durable key under which this channel's task id is persisted.
    pub fn storage_key(&self) -> String {
        format!("{STORAGE_KEY_PREFIX}{}", self.0)
    }

    /// Recover a channel from a persisted key, if it is one of ours.
    pub fn from_storage_key(key: &str) -> Option<Self> {
        key.strip_prefix(STORAGE_KEY_PREFIX)
            .and_then(|name| Self::new(name).ok())
    }
}

fn is_channel_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':')
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Channel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Channel {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Channel> for String {
    fn from(channel: Channel) -> Self {
        channel.0
    }
}
