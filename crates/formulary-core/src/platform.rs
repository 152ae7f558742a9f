//! Platform facts consulted during formula resolution.
//!
//! The engine never inspects the host by itself. Callers build a
//! [`PlatformContext`] once (from [`PlatformContext::current`] or from
//! explicit values) and pass it to the resolver, so the same formula can be
//! resolved for any platform from any platform.

use crate::error::{ConfigurationError, PredicateEvaluationError};
use crate::version::{MacVersion, VersionThreshold};

/// Operating system family a directive block can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsFamily {
    Macos,
    Linux,
}

impl OsFamily {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            OsFamily::Macos => "macos",
            OsFamily::Linux => "linux",
        }
    }
}

impl std::fmt::Display for OsFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OsFamily {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "macos" => Ok(OsFamily::Macos),
            "linux" => Ok(OsFamily::Linux),
            other => Err(ConfigurationError::UnknownFamily(other.to_string())),
        }
    }
}

/// The platform a formula is being resolved for.
///
/// A context with no family (an unrecognized host) satisfies no platform
/// block at all. A macOS context may carry no version; resolution only fails
/// on that when a formula actually asks a version question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformContext {
    family: Option<OsFamily>,
    version: Option<MacVersion>,
}

impl PlatformContext {
    /// A macOS context at a known version.
    #[must_use]
    pub const fn macos(version: MacVersion) -> Self {
        Self {
            family: Some(OsFamily::Macos),
            version: Some(version),
        }
    }

    /// A macOS context whose version is not known.
    #[must_use]
    pub const fn macos_unversioned() -> Self {
        Self {
            family: Some(OsFamily::Macos),
            version: None,
        }
    }

    /// A Linux context.
    #[must_use]
    pub const fn linux() -> Self {
        Self {
            family: Some(OsFamily::Linux),
            version: None,
        }
    }

    /// A context for a platform the engine has no directives for.
    #[must_use]
    pub const fn unknown() -> Self {
        Self {
            family: None,
            version: None,
        }
    }

    /// The family of the build target this library was compiled for.
    ///
    /// On macOS the version is left unset; querying it requires a syscall
    /// the engine deliberately avoids, so callers supply it through
    /// [`PlatformContext::with_version`] when they have one.
    #[must_use]
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::macos_unversioned()
        } else if cfg!(target_os = "linux") {
            Self::linux()
        } else {
            Self::unknown()
        }
    }

    /// Returns the same context with the macOS version filled in.
    #[must_use]
    pub const fn with_version(mut self, version: MacVersion) -> Self {
        self.version = Some(version);
        self
    }

    #[must_use]
    pub const fn family(&self) -> Option<OsFamily> {
        self.family
    }

    #[must_use]
    pub const fn version(&self) -> Option<MacVersion> {
        self.version
    }

    /// Whether a directive block targeting `family` applies to this context.
    #[must_use]
    pub fn satisfies(&self, family: OsFamily) -> bool {
        self.family == Some(family)
    }

    /// Whether this platform ships `name` out of the box, given an optional
    /// minimum macOS version.
    ///
    /// Only macOS provides anything. With no threshold, every macOS context
    /// provides the item; with one, the context must carry a version at or
    /// above it. Asking a versioned question of an unversioned macOS context
    /// is an error rather than a silent guess.
    pub fn provides(
        &self,
        name: &str,
        since: Option<VersionThreshold>,
    ) -> Result<bool, PredicateEvaluationError> {
        if self.family != Some(OsFamily::Macos) {
            return Ok(false);
        }
        let Some(threshold) = since else {
            return Ok(true);
        };
        let version = self
            .version
            .ok_or_else(|| PredicateEvaluationError::VersionUnavailable {
                name: name.to_string(),
            })?;
        Ok(version >= threshold.version())
    }
}

impl std::fmt::Display for PlatformContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.family, self.version) {
            (Some(family), Some(version)) => write!(f, "{family} {version}"),
            (Some(family), None) => write!(f, "{family}"),
            (None, _) => write!(f, "unknown"),
        }
    }
}
