//! Formula definitions and platform-conditional resolution for Formulary.
//!
//! A formula describes how to obtain and build one package. Its body may
//! carry platform directives (`on_macos`, `on_linux` blocks, `uses_from_macos`
//! items with version thresholds) and release-track blocks; this crate turns
//! such a definition plus an explicit [`PlatformContext`] into one frozen
//! [`VariantSpec`] per release track.
//!
//! This crate provides:
//! - The authoring surface: [`Formula::define`] with closure builders, or a
//!   hand-built [`Instruction`] script
//! - A TOML front-end ([`Manifest`]) lowering formula files to the same
//!   scripts
//! - The resolution engine ([`Resolver`]) and its error taxonomy
//! - macOS version and milestone primitives ([`MacVersion`], [`Milestone`])
//!
//! Resolution is pure: no I/O, no environment queries, no host detection.
//! Everything platform-specific enters through the [`PlatformContext`] the
//! caller constructs.

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod dependency;
mod dsl;
mod error;
mod manifest;
mod patch;
mod platform;
mod resolve;
mod resource;
mod variant;
mod version;

pub use dependency::{Dependency, DependencyTag};
pub use dsl::{
    Formula, FormulaBuilder, Instruction, ResourceBuilder, ResourceInstruction, SystemDependency,
};
pub use error::{ConfigurationError, PredicateEvaluationError, ResolveError};
pub use manifest::{
    DependencyEntry, FormulaSection, Manifest, ManifestError, PatchEntry, PlatformBlock,
    ResourceEntry, ResourcePlatformBlock, SystemDependencyEntry, TrackBlock, TrackBlocks,
};
pub use patch::{Patch, StripLevel};
pub use platform::{OsFamily, PlatformContext};
pub use resolve::{ResolvedFormula, Resolver};
pub use resource::Resource;
pub use variant::{ReleaseTrack, VariantSpec};
pub use version::{MacVersion, Milestone, VersionThreshold};
