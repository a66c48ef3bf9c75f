use stowage_core::{Configuration, DEFAULT_PUPS_ARGS};

use crate::secrets::SecretFilter;

/// Base image for configs that neither declare one nor get a default
/// from `stowage.toml`.
pub const FALLBACK_BASE_IMAGE: &str = "discourse/base:2.0.20240825-0027";

/// Generates a Dockerfile that bootstraps an image by running pups over
/// the rendered config.
pub struct DockerfileGenerator<'a> {
    config: &'a Configuration,
    secrets: &'a SecretFilter,
    pups_args: &'a str,
    config_file: &'a str,
    default_base_image: &'a str,
    bake_env: bool,
}

impl<'a> DockerfileGenerator<'a> {
    pub fn new(config: &'a Configuration, secrets: &'a SecretFilter) -> Self {
        Self {
            config,
            secrets,
            pups_args: DEFAULT_PUPS_ARGS,
            config_file: "config.yaml",
            default_base_image: FALLBACK_BASE_IMAGE,
            bake_env: false,
        }
    }

    #[must_use]
    pub fn pups_args(mut self, pups_args: &'a str) -> Self {
        self.pups_args = pups_args;
        self
    }

    /// File name of the rendered config, relative to the build context.
    #[must_use]
    pub fn config_file(mut self, config_file: &'a str) -> Self {
        self.config_file = config_file;
        self
    }

    #[must_use]
    pub fn default_base_image(mut self, image: &'a str) -> Self {
        self.default_base_image = image;
        self
    }

    /// Persist build args as `ENV` so the image carries them after build.
    #[must_use]
    pub fn bake_env(mut self, enabled: bool) -> Self {
        self.bake_env = enabled;
        self
    }

    pub fn render(&self) -> String {
        let base = self
            .config
            .base_image
            .as_deref()
            .unwrap_or(self.default_base_image);
        let keys = self.secrets.build_args(&self.config.env);

        let args: String = keys.iter().map(|k| format!("ARG {k}\n")).collect();
        let envs: String = if self.bake_env {
            keys.iter().map(|k| format!("ENV {k}=${{{k}}}\n")).collect()
        } else {
            String::new()
        };
        let expose: String = self
            .config
            .container_ports()
            .iter()
            .map(|p| format!("EXPOSE {p}\n"))
            .collect();
        let update_pups = if self.config.update_pups {
            "cd /pups && git pull && "
        } else {
            ""
        };
        let cmd = match self.config.boot_command() {
            Some(command) => format!("CMD [\"{command}\"]\n"),
            None => String::new(),
        };

        format!(
            r#"ARG dockerfile_from_image={base}
FROM ${{dockerfile_from_image}}
{args}{envs}{expose}COPY {config_file} /temp-config.yaml
RUN {update_pups}cat /temp-config.yaml | /usr/local/bin/pups {pups_args} --stdin && rm /temp-config.yaml
{cmd}"#,
            config_file = self.config_file,
            pups_args = self.pups_args,
        )
    }
}
