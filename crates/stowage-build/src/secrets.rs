use std::collections::{BTreeSet, HashMap};

use stowage_core::SecretsConfig;

/// Decides which env keys may be baked into an image.
///
/// Only build-time surfaces (compose `build.args`, Dockerfile `ARG`/`ENV`,
/// Concourse build params, `print env`) go through this filter. The
/// runtime `environment` of a compose service always keeps every key,
/// secrets included.
#[derive(Debug, Clone, Default)]
pub struct SecretFilter {
    denylist: BTreeSet<String>,
}

impl SecretFilter {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            denylist: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &SecretsConfig) -> Self {
        Self {
            denylist: config.denylist(),
        }
    }

    pub fn is_secret(&self, key: &str) -> bool {
        self.denylist.contains(key)
    }

    /// Non-secret keys of `env`, sorted ascending.
    pub fn build_args(&self, env: &HashMap<String, String>) -> Vec<String> {
        let mut args: Vec<String> = env
            .keys()
            .filter(|key| !self.is_secret(key))
            .cloned()
            .collect();
        args.sort();
        args
    }
}
