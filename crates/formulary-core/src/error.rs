//! Error types reported while resolving formula definitions.
//!
//! Resolution distinguishes authoring mistakes ([`ConfigurationError`]) from
//! questions the platform context cannot answer ([`PredicateEvaluationError`]).
//! Both surface through [`ResolveError`], which names the offending formula.

use thiserror::Error;

use crate::variant::ReleaseTrack;

/// A mistake in the formula definition itself.
///
/// These errors do not depend on which platform the formula is resolved for;
/// the definition is malformed and needs to be fixed by its author.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A `since` threshold named a macOS release the engine does not know.
    #[error("unknown macOS milestone '{0}'")]
    UnknownMilestone(String),

    /// A version string could not be parsed as `major` or `major.minor`.
    #[error("invalid macOS version '{0}'")]
    InvalidVersion(String),

    /// A platform block named a family other than `macos` or `linux`.
    #[error("unknown platform family '{0}' (expected 'macos' or 'linux')")]
    UnknownFamily(String),

    /// A release track name other than `stable`, `devel`, or `head`.
    #[error("unknown release track '{0}' (expected 'stable', 'devel', or 'head')")]
    UnknownTrack(String),

    /// A patch strip level other than `p0` or `p1`.
    #[error("invalid patch strip level '{0}' (expected 'p0' or 'p1')")]
    InvalidStripLevel(String),

    /// Two sibling declarations tried to set the same track's url.
    #[error("conflicting urls for the {track} track: '{existing}' is already set, cannot set '{replacement}'")]
    ConflictingUrl {
        track: ReleaseTrack,
        existing: String,
        replacement: String,
    },

    /// Two sibling declarations tried to set the same track's checksum.
    #[error("conflicting sha256 declarations for the {track} track")]
    ConflictingChecksum { track: ReleaseTrack },

    /// A sha256 declaration with no url to pair it with.
    #[error("sha256 declared without a url in scope")]
    ChecksumWithoutUrl,

    /// Two resources in the same formula share a name.
    #[error("resource '{0}' is already defined")]
    DuplicateResource(String),

    /// The same name was declared provided-by-macOS more than once.
    #[error("'{0}' is already declared as provided by macOS")]
    DuplicateSystemDependency(String),

    /// A name ended up both in the dependency list and the provided set.
    #[error("'{name}' is both an ordinary dependency and provided by the platform on the {track} track")]
    DependencyAlsoProvided { track: ReleaseTrack, name: String },
}

/// A question the platform context could not answer during resolution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PredicateEvaluationError {
    /// A `since` threshold needed the macOS version, but the context has none.
    #[error("cannot evaluate the 'since' threshold for '{name}': the platform context has no macOS version")]
    VersionUnavailable { name: String },
}

/// Failure to resolve one formula, carrying the formula's name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The formula definition is malformed.
    #[error("formula '{formula}': {source}")]
    Configuration {
        formula: String,
        source: ConfigurationError,
    },

    /// The platform context is missing a fact the formula relies on.
    #[error("formula '{formula}': {source}")]
    Predicate {
        formula: String,
        source: PredicateEvaluationError,
    },
}

impl ResolveError {
    /// Name of the formula that failed to resolve.
    #[must_use]
    pub fn formula(&self) -> &str {
        match self {
            Self::Configuration { formula, .. } | Self::Predicate { formula, .. } => formula,
        }
    }
}
