//! Container configuration loading.
//!
//! A container config is a pups YAML document at `{conf_dir}/{name}.yml`
//! that may pull in template documents:
//!
//! ```yaml
//! templates:
//!   - "templates/postgres.template.yml"
//! env:
//!   LANG: en_US.UTF-8
//! volumes:
//!   - volume:
//!       host: /var/discourse/shared/standalone
//!       guest: /shared
//! ```
//!
//! Templates are applied in listed order, then the config itself:
//!
//! - `env` and `labels` merge, later documents win per key
//! - `links`, `volumes`, `expose` append in document order
//! - `base_image`, `update_pups`, `boot_command`, `no_boot_command` take
//!   the last value set
//!
//! Every other key (`params`, `run`, `hooks`, ...) belongs to pups and is
//! kept only as raw text for [`Configuration::yaml()`].

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// Separator pups expects between concatenated YAML documents on stdin.
pub const DOCUMENT_SEPARATOR: &str = "_FILE_SEPERATOR_";

/// Boot command used unless a config overrides or disables it.
pub const DEFAULT_BOOT_COMMAND: &str = "/sbin/boot";

/// A `link` entry: another service this container talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub name: String,
    pub alias: String,
}

/// A `volume` entry mapping a host path or volume name into the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub host: String,
    pub guest: String,
}

/// A fully merged container configuration.
///
/// # Examples
///
/// ```
/// use stowage_core::Configuration;
///
/// let mut config = Configuration::new("web");
/// config.expose.push("8080:80".to_owned());
/// assert_eq!(config.container_ports(), vec!["80"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    /// Config name; also the compose service key and output file stem
    pub name: String,
    pub base_image: Option<String>,
    /// Run `git pull` in `/pups` before applying the config
    pub update_pups: bool,
    pub boot_command: Option<String>,
    pub no_boot_command: bool,
    pub env: HashMap<String, String>,
    pub labels: HashMap<String, String>,
    pub links: Vec<Link>,
    pub volumes: Vec<Volume>,
    /// `"host:container"` or bare port entries
    pub expose: Vec<String>,
    /// Raw source text of each applied document, templates first
    pub documents: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDocument {
    templates: Vec<String>,
    base_image: Option<String>,
    update_pups: Option<bool>,
    boot_command: Option<String>,
    no_boot_command: Option<bool>,
    env: BTreeMap<String, Value>,
    labels: BTreeMap<String, Value>,
    links: Vec<LinkEntry>,
    volumes: Vec<VolumeEntry>,
    expose: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct LinkEntry {
    link: Link,
}

#[derive(Debug, Deserialize)]
struct VolumeEntry {
    volume: Volume,
}

impl Configuration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Load `{conf_dir}/{name}.yml` and the templates it lists.
    ///
    /// # Errors
    ///
    /// - [`Error::ContainerNotFound`](crate::Error::ContainerNotFound) if the config file does not exist
    /// - [`Error::ContainerRead`](crate::Error::ContainerRead) / [`Error::TemplateRead`](crate::Error::TemplateRead) on I/O failure
    /// - [`Error::ContainerParse`](crate::Error::ContainerParse) / [`Error::TemplateParse`](crate::Error::TemplateParse) on YAML syntax errors
    /// - [`Error::InvalidScalar`](crate::Error::InvalidScalar) if an env, label, or expose value is a list or mapping
    pub fn load(conf_dir: &Path, name: &str, templates_dir: &Path) -> crate::Result<Self> {
        let path = conf_dir.join(format!("{name}.yml"));
        if !path.is_file() {
            return Err(crate::Error::ContainerNotFound {
                name: name.to_owned(),
                conf_dir: conf_dir.to_path_buf(),
                available: find_config_names(conf_dir),
            });
        }

        tracing::debug!(path = %path.display(), "loading container config");
        let text = std::fs::read_to_string(&path).map_err(|e| crate::Error::ContainerRead {
            path: path.clone(),
            source: e,
        })?;
        let document = parse_document(&text).map_err(|e| crate::Error::ContainerParse {
            path: path.clone(),
            source: e,
        })?;

        let mut config = Self::new(name);
        for template in &document.templates {
            let template_path = templates_dir.join(template);
            tracing::debug!(path = %template_path.display(), "applying template");
            let template_text = std::fs::read_to_string(&template_path).map_err(|e| {
                crate::Error::TemplateRead {
                    path: template_path.clone(),
                    source: e,
                }
            })?;
            let template_doc =
                parse_document(&template_text).map_err(|e| crate::Error::TemplateParse {
                    path: template_path.clone(),
                    source: e,
                })?;
            config.apply(template_doc, template_text, &template_path)?;
        }
        config.apply(document, text, &path)?;

        tracing::debug!(
            name = %config.name,
            env = config.env.len(),
            volumes = config.volumes.len(),
            links = config.links.len(),
            documents = config.documents.len(),
            "container config loaded"
        );
        Ok(config)
    }

    fn apply(&mut self, doc: RawDocument, text: String, path: &Path) -> crate::Result<()> {
        if doc.base_image.is_some() {
            self.base_image = doc.base_image;
        }
        if let Some(update) = doc.update_pups {
            self.update_pups = update;
        }
        if doc.boot_command.is_some() {
            self.boot_command = doc.boot_command;
        }
        if let Some(disabled) = doc.no_boot_command {
            self.no_boot_command = disabled;
        }
        for (key, value) in doc.env {
            let value = scalar_to_string(value, path, "env", &key)?;
            self.env.insert(key, value);
        }
        for (key, value) in doc.labels {
            let value = scalar_to_string(value, path, "labels", &key)?;
            self.labels.insert(key, value);
        }
        self.links.extend(doc.links.into_iter().map(|e| e.link));
        self.volumes.extend(doc.volumes.into_iter().map(|e| e.volume));
        for (index, value) in doc.expose.into_iter().enumerate() {
            let port = scalar_to_string(value, path, "expose", &index.to_string())?;
            self.expose.push(port);
        }
        self.documents.push(text);
        Ok(())
    }

    /// The pups input for this config: every source document, templates
    /// first, joined with [`DOCUMENT_SEPARATOR`].
    pub fn yaml(&self) -> String {
        let separator = format!("\n{DOCUMENT_SEPARATOR}\n");
        self.documents.join(separator.as_str())
    }

    /// Container-side port of each `expose` entry, in declaration order.
    pub fn container_ports(&self) -> Vec<&str> {
        self.expose.iter().map(|e| container_port(e)).collect()
    }

    /// The `CMD` to run, or `None` when `no_boot_command` is set.
    pub fn boot_command(&self) -> Option<&str> {
        if self.no_boot_command {
            None
        } else {
            Some(self.boot_command.as_deref().unwrap_or(DEFAULT_BOOT_COMMAND))
        }
    }
}

/// Names of every `*.yml` config in `conf_dir`, sorted.
///
/// An unreadable directory yields an empty list.
pub fn find_config_names(conf_dir: &Path) -> Vec<String> {
    let entries = match std::fs::read_dir(conf_dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(
                path = %conf_dir.display(),
                error = %e,
                "config directory unreadable; no configs listed"
            );
            return Vec::new();
        }
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|path| path.extension().is_some_and(|ext| ext == "yml"))
        .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .collect();
    names.sort();
    names
}

fn container_port(entry: &str) -> &str {
    entry.rsplit(':').next().unwrap_or(entry)
}

fn parse_document(text: &str) -> Result<RawDocument, serde_yaml::Error> {
    let value: Value = serde_yaml::from_str(text)?;
    if value.is_null() {
        return Ok(RawDocument::default());
    }
    serde_yaml::from_value(value)
}

fn scalar_to_string(
    value: Value,
    path: &Path,
    section: &'static str,
    key: &str,
) -> crate::Result<String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        Value::Tagged(tagged) => scalar_to_string(tagged.value, path, section, key),
        Value::Sequence(_) | Value::Mapping(_) => Err(crate::Error::InvalidScalar {
            path: PathBuf::from(path),
            section,
            key: key.to_owned(),
        }),
    }
}
