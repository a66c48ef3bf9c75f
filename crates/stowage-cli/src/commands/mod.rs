mod completions;
mod compose;
mod concourse;
mod print;

use std::path::{Path, PathBuf};

use stowage_build::SecretFilter;
use stowage_core::{Configuration, StowageConfig};

pub use completions::completions;
pub use compose::compose;
pub use concourse::concourse;
pub use print::{PrintKind, print};

/// Settings shared by every command: `stowage.toml` plus CLI overrides.
pub struct Context {
    pub config: StowageConfig,
}

impl Context {
    pub fn load(conf_dir: Option<PathBuf>, templates_dir: Option<PathBuf>) -> anyhow::Result<Self> {
        let mut config = StowageConfig::load(Path::new("."))?;
        if let Some(dir) = conf_dir {
            config.paths.conf_dir = dir;
        }
        if let Some(dir) = templates_dir {
            config.paths.templates_dir = dir;
        }
        tracing::debug!(
            conf_dir = %config.paths.conf_dir.display(),
            templates_dir = %config.paths.templates_dir.display(),
            "resolved paths"
        );
        Ok(Self { config })
    }

    pub fn secrets(&self) -> SecretFilter {
        SecretFilter::from_config(&self.config.secrets)
    }

    /// Load every named config, failing on the first error.
    pub fn load_configs(&self, names: &[String]) -> anyhow::Result<Vec<Configuration>> {
        names
            .iter()
            .map(|name| {
                Configuration::load(
                    &self.config.paths.conf_dir,
                    name,
                    &self.config.paths.templates_dir,
                )
                .map_err(anyhow::Error::from)
            })
            .collect()
    }
}
