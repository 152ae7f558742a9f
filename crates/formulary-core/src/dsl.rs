//! The formula authoring surface.
//!
//! A formula body is not evaluated as it is written. Authoring captures every
//! declaration as an [`Instruction`] in source order, and the resolution
//! engine replays that script against a platform context. Capturing first
//! keeps authoring free of platform queries, so one definition can resolve
//! for any platform.
//!
//! Directive blocks nest: `on_macos` inside a resource scopes that resource's
//! url, and a platform block inside a track block applies both restrictions
//! at once. The instruction tree mirrors that nesting directly.

use std::collections::BTreeSet;

use crate::dependency::{Dependency, DependencyTag};
use crate::error::ResolveError;
use crate::patch::Patch;
use crate::platform::{OsFamily, PlatformContext};
use crate::resolve::{ResolvedFormula, Resolver};
use crate::variant::ReleaseTrack;
use crate::version::VersionThreshold;

/// A named formula definition: the instruction script its body captured.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    name: String,
    instructions: Vec<Instruction>,
}

impl Formula {
    #[must_use]
    pub fn new(name: impl Into<String>, instructions: Vec<Instruction>) -> Self {
        Self {
            name: name.into(),
            instructions,
        }
    }

    /// Author a formula through the builder closure style.
    ///
    /// ```
    /// use formulary_core::{Formula, Milestone, SystemDependency};
    ///
    /// let formula = Formula::define("wget", |f| {
    ///     f.url("https://ftp.gnu.org/gnu/wget/wget-1.24.tar.gz");
    ///     f.uses_from_macos(SystemDependency::new("zlib").since(Milestone::Sierra));
    ///     f.on_linux(|f| {
    ///         f.depends_on("openssl");
    ///     });
    /// });
    /// assert_eq!(formula.name(), "wget");
    /// ```
    pub fn define(name: impl Into<String>, build: impl FnOnce(&mut FormulaBuilder)) -> Self {
        let mut builder = FormulaBuilder::default();
        build(&mut builder);
        Self {
            name: name.into(),
            instructions: builder.into_instructions(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Resolve this formula against a platform context.
    pub fn resolve(&self, context: &PlatformContext) -> Result<ResolvedFormula, ResolveError> {
        Resolver::new(context).resolve(self)
    }
}

/// One captured authoring step of a formula body.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Set the formula description.
    Description(String),
    /// Set the formula homepage.
    Homepage(String),
    /// Set the formula license expression.
    License(String),
    /// Set the download url of the targeted tracks.
    Url(String),
    /// Add a fallback mirror for the download url.
    Mirror(String),
    /// Set the expected checksum of the targeted tracks' download.
    Sha256(String),
    /// Pin the version string of the targeted tracks.
    Version(String),
    /// Append an ordinary dependency.
    DependsOn(Dependency),
    /// Record a dependency newer macOS releases provide out of the box.
    UsesFromMacos(SystemDependency),
    /// Append a patch.
    Patch(Patch),
    /// Define an auxiliary resource with its own scoped body.
    Resource {
        name: String,
        body: Vec<ResourceInstruction>,
    },
    /// Replay the body only when the context matches the family.
    OnPlatform {
        family: OsFamily,
        body: Vec<Instruction>,
    },
    /// Replay the body against a single release track.
    OnTrack {
        track: ReleaseTrack,
        body: Vec<Instruction>,
    },
}

/// One captured authoring step inside a resource body.
///
/// Resource bodies are deliberately narrower than formula bodies: a resource
/// owns a download, not dependencies or patches, and the type makes the
/// difference unrepresentable.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceInstruction {
    Url(String),
    Mirror(String),
    Sha256(String),
    Version(String),
    /// Platform-scoped overrides of the resource's own fields.
    OnPlatform {
        family: OsFamily,
        body: Vec<ResourceInstruction>,
    },
}

/// A dependency that macOS provides out of the box, from `since` onwards.
///
/// On a new enough macOS the name lands in the provided set instead of the
/// dependency list; everywhere else it falls back to an ordinary dependency
/// carrying `tags`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemDependency {
    pub name: String,
    pub since: Option<VersionThreshold>,
    pub tags: BTreeSet<DependencyTag>,
}

impl SystemDependency {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            since: None,
            tags: BTreeSet::new(),
        }
    }

    /// Provided by macOS at or above this milestone or version.
    #[must_use]
    pub fn since(mut self, threshold: impl Into<VersionThreshold>) -> Self {
        self.since = Some(threshold.into());
        self
    }

    /// Tag applied when the item falls back to an ordinary dependency.
    #[must_use]
    pub fn with_tag(mut self, tag: DependencyTag) -> Self {
        self.tags.insert(tag);
        self
    }

    /// The ordinary dependency this item becomes when the platform does not
    /// provide it.
    #[must_use]
    pub fn as_dependency(&self) -> Dependency {
        Dependency {
            name: self.name.clone(),
            tags: self.tags.clone(),
        }
    }
}

impl From<&str> for SystemDependency {
    fn from(name: &str) -> Self {
        SystemDependency::new(name)
    }
}

impl From<String> for SystemDependency {
    fn from(name: String) -> Self {
        SystemDependency::new(name)
    }
}

/// Records formula authoring calls into an instruction script.
#[derive(Debug, Default)]
pub struct FormulaBuilder {
    instructions: Vec<Instruction>,
}

impl FormulaBuilder {
    pub fn description(&mut self, text: impl Into<String>) -> &mut Self {
        self.push(Instruction::Description(text.into()))
    }

    pub fn homepage(&mut self, url: impl Into<String>) -> &mut Self {
        self.push(Instruction::Homepage(url.into()))
    }

    pub fn license(&mut self, expression: impl Into<String>) -> &mut Self {
        self.push(Instruction::License(expression.into()))
    }

    pub fn url(&mut self, url: impl Into<String>) -> &mut Self {
        self.push(Instruction::Url(url.into()))
    }

    pub fn mirror(&mut self, url: impl Into<String>) -> &mut Self {
        self.push(Instruction::Mirror(url.into()))
    }

    pub fn sha256(&mut self, digest: impl Into<String>) -> &mut Self {
        self.push(Instruction::Sha256(digest.into()))
    }

    pub fn version(&mut self, version: impl Into<String>) -> &mut Self {
        self.push(Instruction::Version(version.into()))
    }

    pub fn depends_on(&mut self, dependency: impl Into<Dependency>) -> &mut Self {
        self.push(Instruction::DependsOn(dependency.into()))
    }

    pub fn uses_from_macos(&mut self, item: impl Into<SystemDependency>) -> &mut Self {
        self.push(Instruction::UsesFromMacos(item.into()))
    }

    pub fn patch(&mut self, patch: impl Into<Patch>) -> &mut Self {
        self.push(Instruction::Patch(patch.into()))
    }

    /// Define a resource with its own scoped body.
    pub fn resource(
        &mut self,
        name: impl Into<String>,
        build: impl FnOnce(&mut ResourceBuilder),
    ) -> &mut Self {
        let mut builder = ResourceBuilder::default();
        build(&mut builder);
        self.push(Instruction::Resource {
            name: name.into(),
            body: builder.instructions,
        })
    }

    /// Scope the body to macOS contexts.
    pub fn on_macos(&mut self, build: impl FnOnce(&mut FormulaBuilder)) -> &mut Self {
        self.on_platform(OsFamily::Macos, build)
    }

    /// Scope the body to Linux contexts.
    pub fn on_linux(&mut self, build: impl FnOnce(&mut FormulaBuilder)) -> &mut Self {
        self.on_platform(OsFamily::Linux, build)
    }

    pub fn on_platform(
        &mut self,
        family: OsFamily,
        build: impl FnOnce(&mut FormulaBuilder),
    ) -> &mut Self {
        let mut builder = FormulaBuilder::default();
        build(&mut builder);
        self.push(Instruction::OnPlatform {
            family,
            body: builder.instructions,
        })
    }

    /// Narrow the body to the stable track.
    pub fn stable(&mut self, build: impl FnOnce(&mut FormulaBuilder)) -> &mut Self {
        self.on_track(ReleaseTrack::Stable, build)
    }

    /// Narrow the body to the devel track.
    pub fn devel(&mut self, build: impl FnOnce(&mut FormulaBuilder)) -> &mut Self {
        self.on_track(ReleaseTrack::Devel, build)
    }

    /// Narrow the body to the head track.
    pub fn head(&mut self, build: impl FnOnce(&mut FormulaBuilder)) -> &mut Self {
        self.on_track(ReleaseTrack::Head, build)
    }

    pub fn on_track(
        &mut self,
        track: ReleaseTrack,
        build: impl FnOnce(&mut FormulaBuilder),
    ) -> &mut Self {
        let mut builder = FormulaBuilder::default();
        build(&mut builder);
        self.push(Instruction::OnTrack {
            track,
            body: builder.instructions,
        })
    }

    /// The captured script, in authored order.
    #[must_use]
    pub fn into_instructions(self) -> Vec<Instruction> {
        self.instructions
    }

    fn push(&mut self, instruction: Instruction) -> &mut Self {
        self.instructions.push(instruction);
        self
    }
}

/// Records resource authoring calls into a resource-scoped script.
#[derive(Debug, Default)]
pub struct ResourceBuilder {
    instructions: Vec<ResourceInstruction>,
}

impl ResourceBuilder {
    pub fn url(&mut self, url: impl Into<String>) -> &mut Self {
        self.push(ResourceInstruction::Url(url.into()))
    }

    pub fn mirror(&mut self, url: impl Into<String>) -> &mut Self {
        self.push(ResourceInstruction::Mirror(url.into()))
    }

    pub fn sha256(&mut self, digest: impl Into<String>) -> &mut Self {
        self.push(ResourceInstruction::Sha256(digest.into()))
    }

    pub fn version(&mut self, version: impl Into<String>) -> &mut Self {
        self.push(ResourceInstruction::Version(version.into()))
    }

    pub fn on_macos(&mut self, build: impl FnOnce(&mut ResourceBuilder)) -> &mut Self {
        self.on_platform(OsFamily::Macos, build)
    }

    pub fn on_linux(&mut self, build: impl FnOnce(&mut ResourceBuilder)) -> &mut Self {
        self.on_platform(OsFamily::Linux, build)
    }

    pub fn on_platform(
        &mut self,
        family: OsFamily,
        build: impl FnOnce(&mut ResourceBuilder),
    ) -> &mut Self {
        let mut builder = ResourceBuilder::default();
        build(&mut builder);
        self.push(ResourceInstruction::OnPlatform {
            family,
            body: builder.instructions,
        })
    }

    fn push(&mut self, instruction: ResourceInstruction) -> &mut Self {
        self.instructions.push(instruction);
        self
    }
}
