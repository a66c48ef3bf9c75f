use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load settings from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse settings at {path}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    // ── Container configuration loading ──
    #[error(
        "config '{name}' not found in {conf_dir}; available: {}",
        format_names(available)
    )]
    ContainerNotFound {
        name: String,
        conf_dir: PathBuf,
        available: Vec<String>,
    },

    #[error("failed to read config {path}")]
    ContainerRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("YAML syntax error in {path}; check your containers/*.yml config files")]
    ContainerParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("failed to read template {path}")]
    TemplateRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("YAML syntax error in template {path}")]
    TemplateParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("{section}.{key} in {path} must be a string, number, or boolean")]
    InvalidScalar {
        path: PathBuf,
        section: &'static str,
        key: String,
    },
}

fn format_names(names: &[String]) -> String {
    if names.is_empty() {
        "(none)".to_owned()
    } else {
        names.join(", ")
    }
}
