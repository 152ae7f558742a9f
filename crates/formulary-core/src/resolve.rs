//! Platform-conditional resolution of formula scripts.
//!
//! The resolver replays a formula's instruction script once against a
//! [`PlatformContext`]:
//!
//! - Declarations outside any block broadcast to all three release tracks.
//! - Platform blocks replay their body only when the context matches their
//!   family; sibling blocks for the same family concatenate in authored
//!   order.
//! - Track blocks narrow which tracks the body reaches.
//! - `uses_from_macos` items land in the provided set when the context
//!   provides them and fall back to ordinary dependencies otherwise.
//!
//! Unsatisfied blocks contribute nothing, but their bodies are still walked
//! read-only, so authoring mistakes such as a sha256 with no url before it
//! are reported on every platform rather than only on the one the block
//! targets. Resolution never mutates the formula; resolving the same formula
//! twice against the same context yields identical results.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::dsl::{Formula, Instruction, ResourceInstruction, SystemDependency};
use crate::error::{ConfigurationError, PredicateEvaluationError, ResolveError};
use crate::platform::PlatformContext;
use crate::resource::Resource;
use crate::variant::{ReleaseTrack, VariantSpec};

/// Resolves formula definitions against one platform context.
pub struct Resolver<'a> {
    context: &'a PlatformContext,
}

impl<'a> Resolver<'a> {
    #[must_use]
    pub fn new(context: &'a PlatformContext) -> Self {
        Self { context }
    }

    /// Replay `formula` against this resolver's context.
    pub fn resolve(&self, formula: &Formula) -> Result<ResolvedFormula, ResolveError> {
        let mut pass = ResolutionPass::new(self.context);
        match pass.run(formula.instructions()) {
            Ok(()) => Ok(pass.into_resolved(formula.name())),
            Err(PassError::Configuration(source)) => Err(ResolveError::Configuration {
                formula: formula.name().to_string(),
                source,
            }),
            Err(PassError::Predicate(source)) => Err(ResolveError::Predicate {
                formula: formula.name().to_string(),
                source,
            }),
        }
    }
}

/// A formula after resolution: metadata plus one frozen [`VariantSpec`] per
/// release track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedFormula {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    homepage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    license: Option<String>,
    stable: VariantSpec,
    devel: VariantSpec,
    head: VariantSpec,
}

impl ResolvedFormula {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn homepage(&self) -> Option<&str> {
        self.homepage.as_deref()
    }

    #[must_use]
    pub fn license(&self) -> Option<&str> {
        self.license.as_deref()
    }

    #[must_use]
    pub fn stable(&self) -> &VariantSpec {
        &self.stable
    }

    #[must_use]
    pub fn devel(&self) -> &VariantSpec {
        &self.devel
    }

    #[must_use]
    pub fn head(&self) -> &VariantSpec {
        &self.head
    }

    #[must_use]
    pub fn track(&self, track: ReleaseTrack) -> &VariantSpec {
        match track {
            ReleaseTrack::Stable => &self.stable,
            ReleaseTrack::Devel => &self.devel,
            ReleaseTrack::Head => &self.head,
        }
    }

    /// All tracks paired with their specs, stable first.
    pub fn tracks(&self) -> impl Iterator<Item = (ReleaseTrack, &VariantSpec)> {
        [
            (ReleaseTrack::Stable, &self.stable),
            (ReleaseTrack::Devel, &self.devel),
            (ReleaseTrack::Head, &self.head),
        ]
        .into_iter()
    }
}

/// Which tracks an instruction currently reaches.
#[derive(Debug, Clone, Copy)]
struct Targets {
    stable: bool,
    devel: bool,
    head: bool,
}

impl Targets {
    const fn all() -> Self {
        Self {
            stable: true,
            devel: true,
            head: true,
        }
    }

    fn narrow(self, track: ReleaseTrack) -> Self {
        Self {
            stable: self.stable && track == ReleaseTrack::Stable,
            devel: self.devel && track == ReleaseTrack::Devel,
            head: self.head && track == ReleaseTrack::Head,
        }
    }

    fn contains(self, track: ReleaseTrack) -> bool {
        match track {
            ReleaseTrack::Stable => self.stable,
            ReleaseTrack::Devel => self.devel,
            ReleaseTrack::Head => self.head,
        }
    }

    fn iter(self) -> impl Iterator<Item = ReleaseTrack> {
        ReleaseTrack::ALL.into_iter().filter(move |t| self.contains(*t))
    }
}

enum PassError {
    Configuration(ConfigurationError),
    Predicate(PredicateEvaluationError),
}

impl From<ConfigurationError> for PassError {
    fn from(error: ConfigurationError) -> Self {
        PassError::Configuration(error)
    }
}

impl From<PredicateEvaluationError> for PassError {
    fn from(error: PredicateEvaluationError) -> Self {
        PassError::Predicate(error)
    }
}

/// Working state of one resolution replay.
struct ResolutionPass<'a> {
    context: &'a PlatformContext,
    description: Option<String>,
    homepage: Option<String>,
    license: Option<String>,
    stable: VariantSpec,
    devel: VariantSpec,
    head: VariantSpec,
    /// Names already claimed by a `uses_from_macos` item this pass.
    claimed_system_items: BTreeSet<String>,
}

impl<'a> ResolutionPass<'a> {
    fn new(context: &'a PlatformContext) -> Self {
        Self {
            context,
            description: None,
            homepage: None,
            license: None,
            stable: VariantSpec::default(),
            devel: VariantSpec::default(),
            head: VariantSpec::default(),
            claimed_system_items: BTreeSet::new(),
        }
    }

    fn run(&mut self, instructions: &[Instruction]) -> Result<(), PassError> {
        let mut url_seen = false;
        self.walk(instructions, Targets::all(), true, false, &mut url_seen)?;

        for track in ReleaseTrack::ALL {
            let spec = self.spec(track);
            if spec.has_orphan_checksum() {
                return Err(ConfigurationError::ChecksumWithoutUrl.into());
            }
            spec.verify_disjoint(track)?;
        }
        Ok(())
    }

    fn into_resolved(self, name: &str) -> ResolvedFormula {
        ResolvedFormula {
            name: name.to_string(),
            description: self.description,
            homepage: self.homepage,
            license: self.license,
            stable: self.stable,
            devel: self.devel,
            head: self.head,
        }
    }

    fn spec(&self, track: ReleaseTrack) -> &VariantSpec {
        match track {
            ReleaseTrack::Stable => &self.stable,
            ReleaseTrack::Devel => &self.devel,
            ReleaseTrack::Head => &self.head,
        }
    }

    fn spec_mut(&mut self, track: ReleaseTrack) -> &mut VariantSpec {
        match track {
            ReleaseTrack::Stable => &mut self.stable,
            ReleaseTrack::Devel => &mut self.devel,
            ReleaseTrack::Head => &mut self.head,
        }
    }

    /// Apply one mutation to every targeted track.
    fn apply<F>(&mut self, targets: Targets, mut mutate: F) -> Result<(), ConfigurationError>
    where
        F: FnMut(&mut VariantSpec, ReleaseTrack) -> Result<(), ConfigurationError>,
    {
        for track in targets.iter() {
            mutate(self.spec_mut(track), track)?;
        }
        Ok(())
    }

    /// Replay one instruction body.
    ///
    /// `active` is false inside unsatisfied platform blocks: the body is
    /// still validated (the `url_seen` scan keeps running) but nothing is
    /// recorded. `scoped` marks bodies inside any block, which affects how
    /// url and checksum declarations combine with shared defaults.
    fn walk(
        &mut self,
        body: &[Instruction],
        targets: Targets,
        active: bool,
        scoped: bool,
        url_seen: &mut bool,
    ) -> Result<(), PassError> {
        for instruction in body {
            match instruction {
                Instruction::Description(text) => {
                    if active {
                        self.description = Some(text.clone());
                    }
                }
                Instruction::Homepage(url) => {
                    if active {
                        self.homepage = Some(url.clone());
                    }
                }
                Instruction::License(expression) => {
                    if active {
                        self.license = Some(expression.clone());
                    }
                }
                Instruction::Url(url) => {
                    *url_seen = true;
                    if active {
                        self.apply(targets, |spec, track| {
                            spec.set_url(url.clone(), scoped, track)
                        })?;
                    }
                }
                Instruction::Mirror(url) => {
                    if active {
                        self.apply(targets, |spec, _| {
                            spec.add_mirror(url.clone());
                            Ok(())
                        })?;
                    }
                }
                Instruction::Sha256(digest) => {
                    if !*url_seen {
                        return Err(ConfigurationError::ChecksumWithoutUrl.into());
                    }
                    if active {
                        self.apply(targets, |spec, track| {
                            spec.set_sha256(digest.clone(), scoped, track)
                        })?;
                    }
                }
                Instruction::Version(version) => {
                    if active {
                        self.apply(targets, |spec, _| {
                            spec.set_version(version.clone());
                            Ok(())
                        })?;
                    }
                }
                Instruction::DependsOn(dependency) => {
                    if active {
                        self.apply(targets, |spec, _| {
                            spec.push_dependency(dependency.clone());
                            Ok(())
                        })?;
                    }
                }
                Instruction::UsesFromMacos(item) => {
                    if active {
                        self.apply_system_dependency(item, targets)?;
                    }
                }
                Instruction::Patch(patch) => {
                    if active {
                        self.apply(targets, |spec, _| {
                            spec.push_patch(patch.clone());
                            Ok(())
                        })?;
                    }
                }
                Instruction::Resource { name, body } => {
                    let mut resource = Resource::new(name.clone());
                    let mut resource_url_seen = false;
                    self.walk_resource(&mut resource, body, active, &mut resource_url_seen)?;
                    if active {
                        if resource.sha256().is_some() && resource.url().is_none() {
                            return Err(ConfigurationError::ChecksumWithoutUrl.into());
                        }
                        self.apply(targets, |spec, _| spec.insert_resource(resource.clone()))?;
                    }
                }
                Instruction::OnPlatform { family, body } => {
                    let satisfied = self.context.satisfies(*family);
                    self.walk(body, targets, active && satisfied, true, url_seen)?;
                }
                Instruction::OnTrack { track, body } => {
                    self.walk(body, targets.narrow(*track), active, true, url_seen)?;
                }
            }
        }
        Ok(())
    }

    /// Replay a resource body into a scratch resource.
    ///
    /// Within a resource the last executed declaration wins; resources carry
    /// no shared/scoped distinction because they own exactly one download.
    fn walk_resource(
        &self,
        resource: &mut Resource,
        body: &[ResourceInstruction],
        active: bool,
        url_seen: &mut bool,
    ) -> Result<(), PassError> {
        for instruction in body {
            match instruction {
                ResourceInstruction::Url(url) => {
                    *url_seen = true;
                    if active {
                        resource.set_url(url.clone());
                    }
                }
                ResourceInstruction::Mirror(url) => {
                    if active {
                        resource.add_mirror(url.clone());
                    }
                }
                ResourceInstruction::Sha256(digest) => {
                    if !*url_seen {
                        return Err(ConfigurationError::ChecksumWithoutUrl.into());
                    }
                    if active {
                        resource.set_sha256(digest.clone());
                    }
                }
                ResourceInstruction::Version(version) => {
                    if active {
                        resource.set_version(version.clone());
                    }
                }
                ResourceInstruction::OnPlatform { family, body } => {
                    let satisfied = self.context.satisfies(*family);
                    self.walk_resource(resource, body, active && satisfied, url_seen)?;
                }
            }
        }
        Ok(())
    }

    /// Decide a `uses_from_macos` item against the context and record it.
    fn apply_system_dependency(
        &mut self,
        item: &SystemDependency,
        targets: Targets,
    ) -> Result<(), PassError> {
        if !self.claimed_system_items.insert(item.name.clone()) {
            return Err(ConfigurationError::DuplicateSystemDependency(item.name.clone()).into());
        }

        if self.context.provides(&item.name, item.since)? {
            self.apply(targets, |spec, _| {
                spec.push_provided(item.name.clone());
                Ok(())
            })?;
        } else {
            let dependency = item.as_dependency();
            self.apply(targets, |spec, _| {
                spec.push_dependency(dependency.clone());
                Ok(())
            })?;
        }
        Ok(())
    }
}
