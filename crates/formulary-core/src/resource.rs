//! Auxiliary downloads attached to a formula.

use serde::Serialize;

/// An extra download (vendored sources, completions, documentation) with its
/// own url and checksum, scoped to the formula that declares it.
///
/// Resource fields are written by the resolution engine while it replays the
/// resource's directive body; afterwards the resource is read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    name: String,
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha256: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    mirrors: Vec<String>,
}

impl Resource {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
            sha256: None,
            version: None,
            mirrors: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

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

    pub(crate) fn set_url(&mut self, url: String) {
        self.url = Some(url);
    }

    pub(crate) fn set_sha256(&mut self, digest: String) {
        self.sha256 = Some(digest);
    }

    pub(crate) fn set_version(&mut self, version: String) {
        self.version = Some(version);
    }

    pub(crate) fn add_mirror(&mut self, url: String) {
        self.mirrors.push(url);
    }
}
