//! macOS version numbers and milestone names.
//!
//! Formulas refer to macOS releases either by milestone name (`sierra`,
//! `big_sur`) or by numeric version (`10.12`, `11`). Both forms normalize to
//! a [`MacVersion`], which orders chronologically so threshold comparisons
//! work across the 10.x and 11+ numbering schemes.

use crate::error::ConfigurationError;

/// An ordered macOS version, truncated to `major.minor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MacVersion {
    major: u32,
    minor: u32,
}

impl MacVersion {
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    #[must_use]
    pub const fn major(&self) -> u32 {
        self.major
    }

    #[must_use]
    pub const fn minor(&self) -> u32 {
        self.minor
    }
}

impl std::fmt::Display for MacVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Releases from Big Sur on are conventionally written without the
        // .0 minor component.
        if self.major >= 11 && self.minor == 0 {
            write!(f, "{}", self.major)
        } else {
            write!(f, "{}.{}", self.major, self.minor)
        }
    }
}

impl std::str::FromStr for MacVersion {
    type Err = ConfigurationError;

    /// Parses `major`, `major.minor`, or `major.minor.patch` (the patch
    /// component is ignored).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigurationError::InvalidVersion(s.to_string());
        let mut parts = s.split('.');

        let major = parts
            .next()
            .filter(|p| !p.is_empty())
            .and_then(|p| p.parse::<u32>().ok())
            .ok_or_else(invalid)?;
        let minor = match parts.next() {
            Some(p) => p.parse::<u32>().map_err(|_| invalid())?,
            None => 0,
        };
        if let Some(patch) = parts.next() {
            patch.parse::<u32>().map_err(|_| invalid())?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Self { major, minor })
    }
}

/// A named macOS release.
///
/// Milestones the engine predates are rejected rather than guessed at, so a
/// formula using a newer name fails loudly instead of resolving wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Milestone {
    Mavericks,
    Yosemite,
    ElCapitan,
    Sierra,
    HighSierra,
    Mojave,
    Catalina,
    BigSur,
    Monterey,
    Ventura,
    Sonoma,
    Sequoia,
}

impl Milestone {
    /// All known milestones, oldest first.
    pub const ALL: [Milestone; 12] = [
        Milestone::Mavericks,
        Milestone::Yosemite,
        Milestone::ElCapitan,
        Milestone::Sierra,
        Milestone::HighSierra,
        Milestone::Mojave,
        Milestone::Catalina,
        Milestone::BigSur,
        Milestone::Monterey,
        Milestone::Ventura,
        Milestone::Sonoma,
        Milestone::Sequoia,
    ];

    /// The numeric version this milestone shipped as.
    #[must_use]
    pub const fn version(&self) -> MacVersion {
        match self {
            Milestone::Mavericks => MacVersion::new(10, 9),
            Milestone::Yosemite => MacVersion::new(10, 10),
            Milestone::ElCapitan => MacVersion::new(10, 11),
            Milestone::Sierra => MacVersion::new(10, 12),
            Milestone::HighSierra => MacVersion::new(10, 13),
            Milestone::Mojave => MacVersion::new(10, 14),
            Milestone::Catalina => MacVersion::new(10, 15),
            Milestone::BigSur => MacVersion::new(11, 0),
            Milestone::Monterey => MacVersion::new(12, 0),
            Milestone::Ventura => MacVersion::new(13, 0),
            Milestone::Sonoma => MacVersion::new(14, 0),
            Milestone::Sequoia => MacVersion::new(15, 0),
        }
    }

    /// Snake-case name as written in formula files.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Milestone::Mavericks => "mavericks",
            Milestone::Yosemite => "yosemite",
            Milestone::ElCapitan => "el_capitan",
            Milestone::Sierra => "sierra",
            Milestone::HighSierra => "high_sierra",
            Milestone::Mojave => "mojave",
            Milestone::Catalina => "catalina",
            Milestone::BigSur => "big_sur",
            Milestone::Monterey => "monterey",
            Milestone::Ventura => "ventura",
            Milestone::Sonoma => "sonoma",
            Milestone::Sequoia => "sequoia",
        }
    }
}

impl std::fmt::Display for Milestone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Milestone {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Milestone::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| ConfigurationError::UnknownMilestone(s.to_string()))
    }
}

impl From<Milestone> for MacVersion {
    fn from(milestone: Milestone) -> Self {
        milestone.version()
    }
}

/// The `since` threshold of a platform-provided dependency: a milestone name
/// or an explicit version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionThreshold {
    Milestone(Milestone),
    Version(MacVersion),
}

impl VersionThreshold {
    /// The minimum macOS version that satisfies this threshold.
    #[must_use]
    pub const fn version(&self) -> MacVersion {
        match self {
            VersionThreshold::Milestone(m) => m.version(),
            VersionThreshold::Version(v) => *v,
        }
    }
}

impl std::fmt::Display for VersionThreshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersionThreshold::Milestone(m) => write!(f, "{m}"),
            VersionThreshold::Version(v) => write!(f, "{v}"),
        }
    }
}

impl std::str::FromStr for VersionThreshold {
    type Err = ConfigurationError;

    /// Parses a milestone name or, when the string starts with a digit, a
    /// numeric version.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with(|c: char| c.is_ascii_digit()) {
            s.parse().map(VersionThreshold::Version)
        } else {
            s.parse().map(VersionThreshold::Milestone)
        }
    }
}

impl From<Milestone> for VersionThreshold {
    fn from(milestone: Milestone) -> Self {
        VersionThreshold::Milestone(milestone)
    }
}

impl From<MacVersion> for VersionThreshold {
    fn from(version: MacVersion) -> Self {
        VersionThreshold::Version(version)
    }
}
