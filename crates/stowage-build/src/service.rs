use std::collections::BTreeMap;

use serde::Serialize;
use stowage_core::{ComposeConfig, Configuration};

use crate::secrets::SecretFilter;
use crate::volume::NamedVolumes;

/// Boot flags every service gets unless its config sets them.
pub const BOOT_FLAGS: &[&str] = &["CREATE_DB_ON_BOOT", "MIGRATE_ON_BOOT", "PRECOMPILE_ON_BOOT"];

/// One entry under `services:` in docker-compose.yaml.
///
/// Field order is the serialized key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComposeService {
    pub image: String,
    pub build: ComposeBuild,
    pub volumes: Vec<String>,
    pub links: Vec<String>,
    pub environment: BTreeMap<String, String>,
    pub ports: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComposeBuild {
    pub dockerfile: String,
    pub labels: BTreeMap<String, String>,
    pub shm_size: String,
    pub args: Vec<String>,
    pub no_cache: bool,
}

/// Maps a [`Configuration`] to its [`ComposeService`].
#[derive(Debug, Clone)]
pub struct ServiceBuilder {
    namespace: String,
    shm_size: String,
    no_cache: bool,
    secrets: SecretFilter,
}

impl ServiceBuilder {
    /// A builder with the `stowage.toml` defaults.
    pub fn new(secrets: SecretFilter) -> Self {
        Self::from_config(&ComposeConfig::default(), secrets)
    }

    pub fn from_config(config: &ComposeConfig, secrets: SecretFilter) -> Self {
        Self {
            namespace: config.namespace.clone(),
            shm_size: config.shm_size.clone(),
            no_cache: config.no_cache,
            secrets,
        }
    }

    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn secrets(&self) -> &SecretFilter {
        &self.secrets
    }

    /// Build the service for `config`, registering its named volumes.
    ///
    /// Every list is sorted as plain strings, so the same config always
    /// yields the same service regardless of map iteration order.
    pub fn build(&self, config: &Configuration, named_volumes: &mut NamedVolumes) -> ComposeService {
        let mut environment: BTreeMap<String, String> = BOOT_FLAGS
            .iter()
            .map(|flag| ((*flag).to_owned(), "1".to_owned()))
            .collect();
        environment.extend(config.env.iter().map(|(k, v)| (k.clone(), v.clone())));

        let mut links: Vec<String> = config
            .links
            .iter()
            .map(|link| format!("{}:{}", link.name, link.alias))
            .collect();
        links.sort();

        let mut volumes: Vec<String> = config
            .volumes
            .iter()
            .map(|volume| {
                named_volumes.register(&volume.host);
                format!("{}:{}", volume.host, volume.guest)
            })
            .collect();
        volumes.sort();

        let mut ports = config.expose.clone();
        ports.sort();

        let args = self.secrets.build_args(&config.env);
        tracing::debug!(
            service = %config.name,
            args = args.len(),
            withheld = config.env.len() - args.len(),
            "built compose service"
        );

        ComposeService {
            image: format!("{}/{}", self.namespace, config.name),
            build: ComposeBuild {
                dockerfile: format!("./{}.dockerfile", config.name),
                labels: config
                    .labels
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
                shm_size: self.shm_size.clone(),
                args,
                no_cache: self.no_cache,
            },
            volumes,
            links,
            environment,
            ports,
        }
    }
}
