use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

/// Host tokens starting with a letter name a Docker-managed volume.
static NAMED_VOLUME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]").expect("named volume pattern is valid"));

/// How the host side of a `host:guest` mapping is backed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeKind {
    /// Docker-managed volume, declared in the top-level `volumes:` section
    Named,
    /// Host filesystem path; never declared at the top level
    BindMount,
}

/// Classify the host side of a volume mapping.
///
/// Anything that does not start with an ASCII letter, including the
/// empty string, is treated as a bind mount.
///
/// # Examples
///
/// ```
/// use stowage_build::volume::{classify, VolumeKind};
///
/// assert_eq!(classify("pgdata"), VolumeKind::Named);
/// assert_eq!(classify("/var/discourse/shared/x"), VolumeKind::BindMount);
/// ```
pub fn classify(host: &str) -> VolumeKind {
    if NAMED_VOLUME.is_match(host) {
        VolumeKind::Named
    } else {
        VolumeKind::BindMount
    }
}

/// Named volumes collected across every service of a compose run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamedVolumes(BTreeSet<String>);

impl NamedVolumes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `host` and remember it if it is a named volume.
    ///
    /// Returns the classification. Registering a name twice is a no-op.
    pub fn register(&mut self, host: &str) -> VolumeKind {
        let kind = classify(host);
        if kind == VolumeKind::Named && self.0.insert(host.to_owned()) {
            tracing::debug!(volume = %host, "registered named volume");
        }
        kind
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Volume names in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}
