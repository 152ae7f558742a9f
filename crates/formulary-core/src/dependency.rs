//! Dependency declarations and their modifier tags.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Modifier attached to a dependency declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyTag {
    /// Needed while building, not at runtime.
    Build,
    /// Needed only to run the package's test suite.
    Test,
    /// Installed only when explicitly requested.
    Optional,
    /// Installed by default but removable.
    Recommended,
}

impl DependencyTag {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            DependencyTag::Build => "build",
            DependencyTag::Test => "test",
            DependencyTag::Optional => "optional",
            DependencyTag::Recommended => "recommended",
        }
    }
}

impl std::fmt::Display for DependencyTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single declared dependency of a formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<DependencyTag>,
}

impl Dependency {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_tag(mut self, tag: DependencyTag) -> Self {
        self.tags.insert(tag);
        self
    }

    /// Whether this dependency is needed by the installed package at
    /// runtime, as opposed to only while building or testing it.
    #[must_use]
    pub fn is_runtime(&self) -> bool {
        !self.tags.contains(&DependencyTag::Build) && !self.tags.contains(&DependencyTag::Test)
    }

    #[must_use]
    pub fn is_build(&self) -> bool {
        self.tags.contains(&DependencyTag::Build)
    }

    #[must_use]
    pub fn is_test(&self) -> bool {
        self.tags.contains(&DependencyTag::Test)
    }

    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.tags.contains(&DependencyTag::Optional)
    }
}

impl From<&str> for Dependency {
    fn from(name: &str) -> Self {
        Dependency::new(name)
    }
}

impl From<String> for Dependency {
    fn from(name: String) -> Self {
        Dependency::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_dependency_is_runtime() {
        let dep = Dependency::new("openssl");
        assert!(dep.is_runtime());
        assert!(!dep.is_build());
    }

    #[test]
    fn build_tag_excludes_runtime() {
        let dep = Dependency::new("pkg-config").with_tag(DependencyTag::Build);
        assert!(dep.is_build());
        assert!(!dep.is_runtime());
    }

    #[test]
    fn test_tag_excludes_runtime() {
        let dep = Dependency::new("check").with_tag(DependencyTag::Test);
        assert!(dep.is_test());
        assert!(!dep.is_runtime());
    }

    #[test]
    fn optional_runtime_dependency() {
        let dep = Dependency::new("libidn2").with_tag(DependencyTag::Optional);
        assert!(dep.is_optional());
        assert!(dep.is_runtime());
    }

    #[test]
    fn tags_deduplicate() {
        let dep = Dependency::new("cmake")
            .with_tag(DependencyTag::Build)
            .with_tag(DependencyTag::Build);
        assert_eq!(dep.tags.len(), 1);
    }
}
