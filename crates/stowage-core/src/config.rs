use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Environment keys that never become build args or baked `ENV` lines.
pub const KNOWN_SECRETS: &[&str] = &[
    "DISCOURSE_DB_PASSWORD",
    "DISCOURSE_DB_REPLICA_PASSWORD",
    "DISCOURSE_REDIS_PASSWORD",
    "DISCOURSE_REDIS_REPLICA_PASSWORD",
    "DISCOURSE_SMTP_PASSWORD",
    "DISCOURSE_SECRET_KEY_BASE",
    "DISCOURSE_MAXMIND_LICENSE_KEY",
    "DISCOURSE_S3_ACCESS_KEY_ID",
    "DISCOURSE_S3_SECRET_ACCESS_KEY",
    "DISCOURSE_BACKUP_S3_SECRET_ACCESS_KEY",
    "DB_PASSWORD",
    "POSTGRES_PASSWORD",
    "REDIS_PASSWORD",
];

/// Image namespace used when `stowage.toml` does not set one.
pub const DEFAULT_NAMESPACE: &str = "local_discourse";

/// Shared memory given to each image build.
pub const DEFAULT_SHM_SIZE: &str = "512m";

/// Tag-skipping arguments handed to pups during image build; the skipped
/// steps run on container boot instead.
pub const DEFAULT_PUPS_ARGS: &str = "--skip-tags=precompile,migrate,db";

/// stowage.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StowageConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub compose: ComposeConfig,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub secrets: SecretsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding `{name}.yml` container configs
    #[serde(default = "default_conf_dir")]
    pub conf_dir: PathBuf,
    /// Root that template paths inside a config are resolved against
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeConfig {
    /// Parent of the generated `{config}/` bundle directory
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Image name prefix: `{namespace}/{config}`
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Shared memory size for every build
    #[serde(default = "default_shm_size")]
    pub shm_size: String,
    #[serde(default = "default_no_cache")]
    pub no_cache: bool,
    #[serde(default = "default_pups_args")]
    pub pups_args: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Base image for configs that do not declare `base_image`
    #[serde(default = "default_base_image")]
    pub base_image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretsConfig {
    /// Replaces the built-in secret list when set
    #[serde(default = "default_known_secrets")]
    pub known: Vec<String>,
    /// Appended to `known`
    #[serde(default)]
    pub extra: Vec<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            conf_dir: default_conf_dir(),
            templates_dir: default_templates_dir(),
        }
    }
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            namespace: default_namespace(),
            shm_size: default_shm_size(),
            no_cache: default_no_cache(),
            pups_args: default_pups_args(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            base_image: default_base_image(),
        }
    }
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            known: default_known_secrets(),
            extra: Vec::new(),
        }
    }
}

impl SecretsConfig {
    /// The effective denylist: `known` plus `extra`, deduplicated.
    pub fn denylist(&self) -> BTreeSet<String> {
        self.known.iter().chain(&self.extra).cloned().collect()
    }
}

impl StowageConfig {
    /// Load from stowage.toml at the given path, or return defaults if not found.
    pub fn load(project_dir: &std::path::Path) -> crate::Result<Self> {
        let config_path = project_dir.join("stowage.toml");
        if config_path.exists() {
            tracing::debug!(path = %config_path.display(), "loading settings");
            let content =
                std::fs::read_to_string(&config_path).map_err(|e| crate::Error::ConfigLoad {
                    path: config_path.clone(),
                    source: e,
                })?;
            toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
                path: config_path,
                source: e,
            })
        } else {
            Ok(Self::default())
        }
    }
}

fn default_conf_dir() -> PathBuf {
    PathBuf::from("./containers")
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./compose")
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_owned()
}

fn default_shm_size() -> String {
    DEFAULT_SHM_SIZE.to_owned()
}

fn default_no_cache() -> bool {
    true
}

fn default_pups_args() -> String {
    DEFAULT_PUPS_ARGS.to_owned()
}

fn default_base_image() -> String {
    "discourse/base:2.0.20240825-0027".to_owned()
}

fn default_known_secrets() -> Vec<String> {
    KNOWN_SECRETS.iter().map(|s| (*s).to_owned()).collect()
}
