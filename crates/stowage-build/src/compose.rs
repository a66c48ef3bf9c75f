use std::collections::BTreeMap;

use serde::Serialize;

use crate::aggregate::Aggregate;
use crate::service::ComposeService;

/// Name of the compose file inside the output directory.
pub const COMPOSE_FILE_NAME: &str = "docker-compose.yaml";

/// The docker-compose.yaml document.
///
/// Named volumes serialize as `name: null` entries, which compose reads
/// as "create with defaults".
#[derive(Debug, Clone, Serialize)]
pub struct ComposeDocument<'a> {
    services: &'a BTreeMap<String, ComposeService>,
    volumes: BTreeMap<&'a str, ()>,
}

impl<'a> ComposeDocument<'a> {
    pub fn new(aggregate: &'a Aggregate) -> Self {
        Self {
            services: &aggregate.services,
            volumes: aggregate.named_volumes.iter().map(|name| (name, ())).collect(),
        }
    }

    /// Render as YAML.
    ///
    /// Mappings nest by two spaces; block sequences sit at the same
    /// indentation as their key (`ports:\n- '443'`).
    pub fn to_yaml(&self) -> Result<String, ComposeError> {
        serde_yaml::to_string(self).map_err(|e| ComposeError::Serialize { source: e })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("failed to serialize {COMPOSE_FILE_NAME}")]
    Serialize { source: serde_yaml::Error },
}
