//! External patches applied to a build tree before compilation.

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// How many leading path components `patch` strips when applying.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StripLevel {
    /// Apply with `-p0`.
    P0,
    /// Apply with `-p1`, the conventional default for release tarballs.
    #[default]
    P1,
}

impl StripLevel {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            StripLevel::P0 => "p0",
            StripLevel::P1 => "p1",
        }
    }
}

impl std::fmt::Display for StripLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for StripLevel {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "p0" => Ok(StripLevel::P0),
            "p1" => Ok(StripLevel::P1),
            other => Err(ConfigurationError::InvalidStripLevel(other.to_string())),
        }
    }
}

/// A patch fetched from a url, with an optional checksum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(default)]
    pub strip: StripLevel,
}

impl Patch {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            sha256: None,
            strip: StripLevel::default(),
        }
    }

    #[must_use]
    pub fn with_sha256(mut self, digest: impl Into<String>) -> Self {
        self.sha256 = Some(digest.into());
        self
    }

    #[must_use]
    pub fn with_strip(mut self, strip: StripLevel) -> Self {
        self.strip = strip;
        self
    }
}

impl From<&str> for Patch {
    fn from(url: &str) -> Self {
        Patch::new(url)
    }
}

impl From<String> for Patch {
    fn from(url: String) -> Self {
        Patch::new(url)
    }
}
