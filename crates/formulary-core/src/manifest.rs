//! TOML formula files and their lowering to instruction scripts.
//!
//! A formula file is declarative TOML: a `[formula]` section for shared
//! metadata and download fields, arrays of tables for dependencies, patches,
//! and resources, `[[on]]` blocks scoped to one platform family, and
//! `[track.*]` blocks scoped to one release track.
//!
//! TOML has no statement order across sections, so lowering emits
//! instructions in a fixed, documented order: formula metadata and download
//! fields first, then dependencies, `uses-from-macos` items, patches,
//! resources, `[[on]]` blocks, and finally track blocks (stable, devel,
//! head). Within every block the download fields lower before the lists, so
//! a checksum always follows the url it pairs with.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::dependency::{Dependency, DependencyTag};
use crate::dsl::{Formula, Instruction, ResourceInstruction, SystemDependency};
use crate::error::ConfigurationError;
use crate::patch::Patch;
use crate::platform::OsFamily;
use crate::variant::ReleaseTrack;

/// Errors that can occur when reading formula files.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("failed to read formula file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse formula file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid formula definition: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("'{0}' is not a valid formula name")]
    InvalidName(String),

    #[error("dependency name cannot be empty")]
    EmptyDependencyName,

    #[error("resource name cannot be empty")]
    EmptyResourceName,
}

/// A parsed formula file, before lowering to an instruction script.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub formula: FormulaSection,
    #[serde(default)]
    pub dependencies: Vec<DependencyEntry>,
    #[serde(default, rename = "uses-from-macos")]
    pub uses_from_macos: Vec<SystemDependencyEntry>,
    #[serde(default)]
    pub patches: Vec<PatchEntry>,
    #[serde(default)]
    pub resources: Vec<ResourceEntry>,
    #[serde(default)]
    pub on: Vec<PlatformBlock>,
    #[serde(default)]
    pub track: TrackBlocks,
}

/// The `[formula]` section: name, metadata, and the shared download.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormulaSection {
    pub name: String,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub license: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub mirrors: Vec<String>,
    pub sha256: Option<String>,
    pub version: Option<String>,
}

/// One `[[dependencies]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependencyEntry {
    pub name: String,
    #[serde(default)]
    pub tags: BTreeSet<DependencyTag>,
}

impl DependencyEntry {
    fn into_dependency(self) -> Dependency {
        Dependency {
            name: self.name,
            tags: self.tags,
        }
    }
}

/// One `[[uses-from-macos]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SystemDependencyEntry {
    pub name: String,
    /// Milestone name or numeric version, e.g. `"big_sur"` or `"10.12"`.
    pub since: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<DependencyTag>,
}

impl SystemDependencyEntry {
    fn into_system_dependency(self) -> Result<SystemDependency, ConfigurationError> {
        let since = self.since.as_deref().map(str::parse).transpose()?;
        Ok(SystemDependency {
            name: self.name,
            since,
            tags: self.tags,
        })
    }
}

/// One `[[patches]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatchEntry {
    pub url: String,
    pub sha256: Option<String>,
    /// `"p0"` or `"p1"`; defaults to `"p1"`.
    pub strip: Option<String>,
}

impl PatchEntry {
    fn into_patch(self) -> Result<Patch, ConfigurationError> {
        let strip = self.strip.as_deref().map(str::parse).transpose()?;
        Ok(Patch {
            url: self.url,
            sha256: self.sha256,
            strip: strip.unwrap_or_default(),
        })
    }
}

/// One `[[resources]]` entry with optional `[[resources.on]]` blocks.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceEntry {
    pub name: String,
    pub url: Option<String>,
    #[serde(default)]
    pub mirrors: Vec<String>,
    pub sha256: Option<String>,
    pub version: Option<String>,
    #[serde(default)]
    pub on: Vec<ResourcePlatformBlock>,
}

impl ResourceEntry {
    fn into_instruction(self) -> Result<Instruction, ConfigurationError> {
        let mut body = Vec::new();
        if let Some(url) = self.url {
            body.push(ResourceInstruction::Url(url));
        }
        for mirror in self.mirrors {
            body.push(ResourceInstruction::Mirror(mirror));
        }
        if let Some(digest) = self.sha256 {
            body.push(ResourceInstruction::Sha256(digest));
        }
        if let Some(version) = self.version {
            body.push(ResourceInstruction::Version(version));
        }
        for block in self.on {
            body.push(block.into_instruction()?);
        }
        Ok(Instruction::Resource {
            name: self.name,
            body,
        })
    }
}

/// One `[[resources.on]]` block: platform-scoped resource fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourcePlatformBlock {
    pub family: String,
    pub url: Option<String>,
    #[serde(default)]
    pub mirrors: Vec<String>,
    pub sha256: Option<String>,
    pub version: Option<String>,
}

impl ResourcePlatformBlock {
    fn into_instruction(self) -> Result<ResourceInstruction, ConfigurationError> {
        let family: OsFamily = self.family.parse()?;
        let mut body = Vec::new();
        if let Some(url) = self.url {
            body.push(ResourceInstruction::Url(url));
        }
        for mirror in self.mirrors {
            body.push(ResourceInstruction::Mirror(mirror));
        }
        if let Some(digest) = self.sha256 {
            body.push(ResourceInstruction::Sha256(digest));
        }
        if let Some(version) = self.version {
            body.push(ResourceInstruction::Version(version));
        }
        Ok(ResourceInstruction::OnPlatform { family, body })
    }
}

/// One `[[on]]` block: declarations scoped to a platform family.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformBlock {
    pub family: String,
    pub url: Option<String>,
    #[serde(default)]
    pub mirrors: Vec<String>,
    pub sha256: Option<String>,
    pub version: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<DependencyEntry>,
    #[serde(default, rename = "uses-from-macos")]
    pub uses_from_macos: Vec<SystemDependencyEntry>,
    #[serde(default)]
    pub patches: Vec<PatchEntry>,
}

impl PlatformBlock {
    fn into_instruction(self) -> Result<Instruction, ConfigurationError> {
        let family: OsFamily = self.family.parse()?;
        let mut body = Vec::new();
        if let Some(url) = self.url {
            body.push(Instruction::Url(url));
        }
        for mirror in self.mirrors {
            body.push(Instruction::Mirror(mirror));
        }
        if let Some(digest) = self.sha256 {
            body.push(Instruction::Sha256(digest));
        }
        if let Some(version) = self.version {
            body.push(Instruction::Version(version));
        }
        for entry in self.dependencies {
            body.push(Instruction::DependsOn(entry.into_dependency()));
        }
        for entry in self.uses_from_macos {
            body.push(Instruction::UsesFromMacos(entry.into_system_dependency()?));
        }
        for entry in self.patches {
            body.push(Instruction::Patch(entry.into_patch()?));
        }
        Ok(Instruction::OnPlatform { family, body })
    }
}

/// The `[track.stable]`, `[track.devel]`, and `[track.head]` blocks.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackBlocks {
    pub stable: Option<TrackBlock>,
    pub devel: Option<TrackBlock>,
    pub head: Option<TrackBlock>,
}

impl TrackBlocks {
    fn into_pairs(self) -> impl Iterator<Item = (ReleaseTrack, TrackBlock)> {
        [
            (ReleaseTrack::Stable, self.stable),
            (ReleaseTrack::Devel, self.devel),
            (ReleaseTrack::Head, self.head),
        ]
        .into_iter()
        .filter_map(|(track, block)| block.map(|b| (track, b)))
    }
}

/// Declarations scoped to one release track.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackBlock {
    pub url: Option<String>,
    #[serde(default)]
    pub mirrors: Vec<String>,
    pub sha256: Option<String>,
    pub version: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<DependencyEntry>,
    #[serde(default)]
    pub patches: Vec<PatchEntry>,
}

impl TrackBlock {
    fn into_instruction(self, track: ReleaseTrack) -> Result<Instruction, ConfigurationError> {
        let mut body = Vec::new();
        if let Some(url) = self.url {
            body.push(Instruction::Url(url));
        }
        for mirror in self.mirrors {
            body.push(Instruction::Mirror(mirror));
        }
        if let Some(digest) = self.sha256 {
            body.push(Instruction::Sha256(digest));
        }
        if let Some(version) = self.version {
            body.push(Instruction::Version(version));
        }
        for entry in self.dependencies {
            body.push(Instruction::DependsOn(entry.into_dependency()));
        }
        for entry in self.patches {
            body.push(Instruction::Patch(entry.into_patch()?));
        }
        Ok(Instruction::OnTrack { track, body })
    }
}

impl Manifest {
    /// Parse a formula file from a string.
    pub fn parse(content: &str) -> Result<Self, ManifestError> {
        let manifest: Manifest = toml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Parse a formula file from disk.
    pub fn from_path(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Lower this file to a formula instruction script.
    pub fn into_formula(self) -> Result<Formula, ManifestError> {
        let name = self.formula.name.clone();
        let mut instructions = Vec::new();

        if let Some(text) = self.formula.description {
            instructions.push(Instruction::Description(text));
        }
        if let Some(url) = self.formula.homepage {
            instructions.push(Instruction::Homepage(url));
        }
        if let Some(expression) = self.formula.license {
            instructions.push(Instruction::License(expression));
        }
        if let Some(url) = self.formula.url {
            instructions.push(Instruction::Url(url));
        }
        for mirror in self.formula.mirrors {
            instructions.push(Instruction::Mirror(mirror));
        }
        if let Some(digest) = self.formula.sha256 {
            instructions.push(Instruction::Sha256(digest));
        }
        if let Some(version) = self.formula.version {
            instructions.push(Instruction::Version(version));
        }

        for entry in self.dependencies {
            instructions.push(Instruction::DependsOn(entry.into_dependency()));
        }
        for entry in self.uses_from_macos {
            instructions.push(Instruction::UsesFromMacos(entry.into_system_dependency()?));
        }
        for entry in self.patches {
            instructions.push(Instruction::Patch(entry.into_patch()?));
        }
        for entry in self.resources {
            instructions.push(entry.into_instruction()?);
        }
        for block in self.on {
            instructions.push(block.into_instruction()?);
        }
        for (track, block) in self.track.into_pairs() {
            instructions.push(block.into_instruction(track)?);
        }

        Ok(Formula::new(name, instructions))
    }

    fn validate(&self) -> Result<(), ManifestError> {
        self.validate_name()?;

        for entry in &self.dependencies {
            Self::check_dependency_name(&entry.name)?;
        }
        for entry in &self.uses_from_macos {
            Self::check_dependency_name(&entry.name)?;
        }
        for block in &self.on {
            for entry in &block.dependencies {
                Self::check_dependency_name(&entry.name)?;
            }
            for entry in &block.uses_from_macos {
                Self::check_dependency_name(&entry.name)?;
            }
        }
        for block in [&self.track.stable, &self.track.devel, &self.track.head]
            .into_iter()
            .flatten()
        {
            for entry in &block.dependencies {
                Self::check_dependency_name(&entry.name)?;
            }
        }
        for resource in &self.resources {
            if resource.name.is_empty() {
                return Err(ManifestError::EmptyResourceName);
            }
        }
        Ok(())
    }

    fn validate_name(&self) -> Result<(), ManifestError> {
        let name = &self.formula.name;
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '+' | '_' | '-'));
        if valid {
            Ok(())
        } else {
            Err(ManifestError::InvalidName(name.clone()))
        }
    }

    fn check_dependency_name(name: &str) -> Result<(), ManifestError> {
        if name.is_empty() {
            Err(ManifestError::EmptyDependencyName)
        } else {
            Ok(())
        }
    }
}
