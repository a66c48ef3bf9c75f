use std::collections::BTreeMap;

use stowage_core::Configuration;

use crate::envrc;
use crate::service::{ComposeService, ServiceBuilder};
use crate::volume::NamedVolumes;

/// Everything a compose run derives from its configs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    /// Service name → service, in ascending name order
    pub services: BTreeMap<String, ComposeService>,
    pub named_volumes: NamedVolumes,
    /// `.envrc` contents
    pub env_document: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("at least one config is required")]
    NoConfigurations,
}

/// Combine `configs` into services, named volumes, and the `.envrc` text.
///
/// `configs[0]` is the primary config: its env values win in the `.envrc`.
/// When two configs share a name the later one replaces the earlier
/// service.
///
/// # Errors
///
/// [`AggregateError::NoConfigurations`] if `configs` is empty.
pub fn aggregate(
    configs: &[Configuration],
    builder: &ServiceBuilder,
) -> Result<Aggregate, AggregateError> {
    if configs.is_empty() {
        return Err(AggregateError::NoConfigurations);
    }

    let mut named_volumes = NamedVolumes::new();
    let mut services = BTreeMap::new();
    for config in configs {
        let service = builder.build(config, &mut named_volumes);
        if services.insert(config.name.clone(), service).is_some() {
            tracing::warn!(
                service = %config.name,
                "duplicate config name; keeping the last one"
            );
        }
    }

    let env_document = envrc::env_document(configs);

    tracing::debug!(
        primary = %configs[0].name,
        services = services.len(),
        named_volumes = named_volumes.len(),
        "aggregated configs"
    );

    Ok(Aggregate {
        services,
        named_volumes,
        env_document,
    })
}
