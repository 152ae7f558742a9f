//! Per-track accumulated state of a resolved formula.
//!
//! Every formula resolves into three [`VariantSpec`]s, one per release
//! track. Directives outside any track block broadcast to all three;
//! track blocks narrow to one. The spec records where its url and checksum
//! came from so later declarations either refine, lose to, or collide with
//! earlier ones by a fixed rule instead of silently clobbering.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::dependency::Dependency;
use crate::error::ConfigurationError;
use crate::patch::Patch;
use crate::resource::Resource;

/// Release track of a formula: the audience a download targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReleaseTrack {
    /// The released version most users install.
    Stable,
    /// A pre-release or beta version.
    Devel,
    /// The tip of the upstream development branch.
    Head,
}

impl ReleaseTrack {
    /// All tracks, in broadcast order.
    pub const ALL: [ReleaseTrack; 3] = [ReleaseTrack::Stable, ReleaseTrack::Devel, ReleaseTrack::Head];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ReleaseTrack::Stable => "stable",
            ReleaseTrack::Devel => "devel",
            ReleaseTrack::Head => "head",
        }
    }
}

impl std::fmt::Display for ReleaseTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ReleaseTrack {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stable" => Ok(ReleaseTrack::Stable),
            "devel" => Ok(ReleaseTrack::Devel),
            "head" => Ok(ReleaseTrack::Head),
            other => Err(ConfigurationError::UnknownTrack(other.to_string())),
        }
    }
}

/// Where a url or checksum value came from.
///
/// Scoped declarations (platform or track blocks) refine shared defaults and
/// outrank later ones; two declarations of the same kind collide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum FieldOrigin {
    #[default]
    Unset,
    /// Declared at the top level of the formula body.
    Shared,
    /// Declared inside a platform or track block.
    Scoped,
}

/// One release track's accumulated download, dependency, patch, and resource
/// state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VariantSpec {
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha256: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    mirrors: Vec<String>,
    dependencies: Vec<Dependency>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    patches: Vec<Patch>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    resources: BTreeMap<String, Resource>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    provided_by_platform: Vec<String>,
    #[serde(skip)]
    url_origin: FieldOrigin,
    #[serde(skip)]
    sha256_origin: FieldOrigin,
}

impl VariantSpec {
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    #[must_use]
    pub fn sha256(&self) -> Option<&str> {
        self.sha256.as_deref()
    }

    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    #[must_use]
    pub fn mirrors(&self) -> &[String] {
        &self.mirrors
    }

    /// Declared dependencies, in authored order.
    #[must_use]
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Dependencies needed at runtime (everything not tagged build or test).
    pub fn runtime_dependencies(&self) -> impl Iterator<Item = &Dependency> {
        self.dependencies.iter().filter(|d| d.is_runtime())
    }

    /// Declared patches, in authored order.
    #[must_use]
    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    /// Resources keyed by name.
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    #[must_use]
    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.get(name)
    }

    /// Names this track expects the platform to provide, in authored order.
    #[must_use]
    pub fn provided_by_platform(&self) -> &[String] {
        &self.provided_by_platform
    }

    #[must_use]
    pub fn is_provided_by_platform(&self, name: &str) -> bool {
        self.provided_by_platform.iter().any(|n| n == name)
    }

    pub(crate) fn set_url(
        &mut self,
        url: String,
        scoped: bool,
        track: ReleaseTrack,
    ) -> Result<(), ConfigurationError> {
        match (self.url_origin, scoped) {
            (FieldOrigin::Unset, _) | (FieldOrigin::Shared, true) => {
                self.url = Some(url);
                self.url_origin = if scoped {
                    FieldOrigin::Scoped
                } else {
                    FieldOrigin::Shared
                };
                Ok(())
            }
            // A scoped choice outranks a later shared default.
            (FieldOrigin::Scoped, false) => Ok(()),
            (FieldOrigin::Shared, false) | (FieldOrigin::Scoped, true) => {
                Err(ConfigurationError::ConflictingUrl {
                    track,
                    existing: self.url.clone().unwrap_or_default(),
                    replacement: url,
                })
            }
        }
    }

    pub(crate) fn set_sha256(
        &mut self,
        digest: String,
        scoped: bool,
        track: ReleaseTrack,
    ) -> Result<(), ConfigurationError> {
        match (self.sha256_origin, scoped) {
            (FieldOrigin::Unset, _) | (FieldOrigin::Shared, true) => {
                self.sha256 = Some(digest);
                self.sha256_origin = if scoped {
                    FieldOrigin::Scoped
                } else {
                    FieldOrigin::Shared
                };
                Ok(())
            }
            (FieldOrigin::Scoped, false) => Ok(()),
            (FieldOrigin::Shared, false) | (FieldOrigin::Scoped, true) => {
                Err(ConfigurationError::ConflictingChecksum { track })
            }
        }
    }

    pub(crate) fn set_version(&mut self, version: String) {
        self.version = Some(version);
    }

    pub(crate) fn add_mirror(&mut self, url: String) {
        self.mirrors.push(url);
    }

    pub(crate) fn push_dependency(&mut self, dependency: Dependency) {
        self.dependencies.push(dependency);
    }

    pub(crate) fn push_patch(&mut self, patch: Patch) {
        self.patches.push(patch);
    }

    pub(crate) fn insert_resource(&mut self, resource: Resource) -> Result<(), ConfigurationError> {
        let name = resource.name().to_string();
        if self.resources.contains_key(&name) {
            return Err(ConfigurationError::DuplicateResource(name));
        }
        self.resources.insert(name, resource);
        Ok(())
    }

    pub(crate) fn push_provided(&mut self, name: String) {
        self.provided_by_platform.push(name);
    }

    /// A name must not be both an ordinary dependency and platform-provided.
    pub(crate) fn verify_disjoint(&self, track: ReleaseTrack) -> Result<(), ConfigurationError> {
        for name in &self.provided_by_platform {
            if self.dependencies.iter().any(|d| &d.name == name) {
                return Err(ConfigurationError::DependencyAlsoProvided {
                    track,
                    name: name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Whether a checksum was recorded with no url to pair it with.
    pub(crate) fn has_orphan_checksum(&self) -> bool {
        self.sha256.is_some() && self.url.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::DependencyTag;

    #[test]
    fn scoped_url_refines_shared_default() {
        let mut spec = VariantSpec::default();
        spec.set_url("https://shared".to_string(), false, ReleaseTrack::Stable)
            .unwrap();
        spec.set_url("https://scoped".to_string(), true, ReleaseTrack::Stable)
            .unwrap();
        assert_eq!(spec.url(), Some("https://scoped"));
    }

    #[test]
    fn scoped_url_outranks_later_shared_default() {
        let mut spec = VariantSpec::default();
        spec.set_url("https://scoped".to_string(), true, ReleaseTrack::Stable)
            .unwrap();
        spec.set_url("https://shared".to_string(), false, ReleaseTrack::Stable)
            .unwrap();
        assert_eq!(spec.url(), Some("https://scoped"));
    }

    #[test]
    fn two_shared_urls_collide() {
        let mut spec = VariantSpec::default();
        spec.set_url("https://one".to_string(), false, ReleaseTrack::Stable)
            .unwrap();
        let err = spec
            .set_url("https://two".to_string(), false, ReleaseTrack::Stable)
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::ConflictingUrl {
                track: ReleaseTrack::Stable,
                existing: "https://one".to_string(),
                replacement: "https://two".to_string(),
            }
        );
    }

    #[test]
    fn two_scoped_urls_collide() {
        let mut spec = VariantSpec::default();
        spec.set_url("https://one".to_string(), true, ReleaseTrack::Devel)
            .unwrap();
        let err = spec
            .set_url("https://two".to_string(), true, ReleaseTrack::Devel)
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::ConflictingUrl {
                track: ReleaseTrack::Devel,
                ..
            }
        ));
    }

    #[test]
    fn two_scoped_checksums_collide() {
        let mut spec = VariantSpec::default();
        spec.set_sha256("aaa".to_string(), true, ReleaseTrack::Stable)
            .unwrap();
        let err = spec
            .set_sha256("bbb".to_string(), true, ReleaseTrack::Stable)
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::ConflictingChecksum {
                track: ReleaseTrack::Stable
            }
        );
    }

    #[test]
    fn duplicate_resource_is_rejected() {
        let mut spec = VariantSpec::default();
        spec.insert_resource(Resource::new("docs")).unwrap();
        let err = spec.insert_resource(Resource::new("docs")).unwrap_err();
        assert_eq!(err, ConfigurationError::DuplicateResource("docs".to_string()));
    }

    #[test]
    fn disjointness_check_catches_overlap() {
        let mut spec = VariantSpec::default();
        spec.push_dependency(Dependency::new("zlib"));
        spec.push_provided("zlib".to_string());
        let err = spec.verify_disjoint(ReleaseTrack::Stable).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::DependencyAlsoProvided {
                track: ReleaseTrack::Stable,
                name: "zlib".to_string(),
            }
        );
    }

    #[test]
    fn runtime_dependencies_skip_build_and_test() {
        let mut spec = VariantSpec::default();
        spec.push_dependency(Dependency::new("openssl"));
        spec.push_dependency(Dependency::new("pkg-config").with_tag(DependencyTag::Build));
        spec.push_dependency(Dependency::new("check").with_tag(DependencyTag::Test));
        let runtime: Vec<&str> = spec
            .runtime_dependencies()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(runtime, vec!["openssl"]);
    }

    #[test]
    fn track_parse_round_trip() {
        for track in ReleaseTrack::ALL {
            assert_eq!(track.as_str().parse::<ReleaseTrack>().unwrap(), track);
        }
        assert!(matches!(
            "nightly".parse::<ReleaseTrack>(),
            Err(ConfigurationError::UnknownTrack(_))
        ));
    }
}
