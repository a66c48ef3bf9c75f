use std::path::{Path, PathBuf};

use stowage_core::Configuration;

use crate::aggregate::Aggregate;
use crate::compose::{COMPOSE_FILE_NAME, ComposeDocument, ComposeError};
use crate::dockerfile::DockerfileGenerator;
use crate::secrets::SecretFilter;

/// Name of the shell env file inside the output directory.
pub const ENVRC_FILE_NAME: &str = ".envrc";

/// Filesystem operations the writer needs, abstracted for testability.
///
/// Production code uses [`FsSink`], tests use mockall-generated mocks.
pub trait ArtifactSink {
    /// Create `path` and its parents; an existing directory is not an error.
    fn create_dir_all(&self, path: &Path) -> std::io::Result<()>;

    /// Replace the contents of `path`.
    fn write(&self, path: &Path, contents: &str) -> std::io::Result<()>;
}

/// Writes straight to the local filesystem.
pub struct FsSink;

impl ArtifactSink for FsSink {
    fn create_dir_all(&self, path: &Path) -> std::io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn write(&self, path: &Path, contents: &str) -> std::io::Result<()> {
        std::fs::write(path, contents)
    }
}

/// Inputs for one compose bundle.
pub struct Bundle<'a> {
    pub configs: &'a [Configuration],
    pub aggregate: &'a Aggregate,
    pub secrets: &'a SecretFilter,
    pub pups_args: &'a str,
    pub default_base_image: &'a str,
    /// Add `ENV` lines for build args to every Dockerfile
    pub bake_env: bool,
}

/// Writes a compose bundle, parameterized over the sink for testability.
pub struct ArtifactWriter<S: ArtifactSink = FsSink> {
    sink: S,
}

impl ArtifactWriter<FsSink> {
    pub fn new() -> Self {
        Self { sink: FsSink }
    }
}

impl Default for ArtifactWriter<FsSink> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ArtifactSink> ArtifactWriter<S> {
    pub fn with_sink(sink: S) -> Self {
        Self { sink }
    }

    /// Write the bundle into `dir`, creating it if needed.
    ///
    /// Layout:
    ///
    /// ```text
    /// {dir}/.envrc
    /// {dir}/{name}.yaml         one per config
    /// {dir}/{name}.dockerfile   one per config
    /// {dir}/docker-compose.yaml
    /// ```
    ///
    /// Every file is overwritten in full. The first failure stops the run;
    /// files already written stay in place. Returns the written paths in
    /// write order.
    pub fn write_bundle(&self, dir: &Path, bundle: &Bundle<'_>) -> Result<Vec<PathBuf>, WriteError> {
        // Serialize up front so an encoding failure leaves no partial output.
        let compose_yaml = ComposeDocument::new(bundle.aggregate).to_yaml()?;

        self.sink
            .create_dir_all(dir)
            .map_err(|e| WriteError::CreateDir {
                path: dir.to_path_buf(),
                source: e,
            })?;

        let mut written = Vec::with_capacity(bundle.configs.len() * 2 + 2);

        written.push(self.write_file(dir, ENVRC_FILE_NAME, &bundle.aggregate.env_document)?);

        for config in bundle.configs {
            let config_file = format!("{}.yaml", config.name);
            written.push(self.write_file(dir, &config_file, &config.yaml())?);

            let dockerfile = DockerfileGenerator::new(config, bundle.secrets)
                .pups_args(bundle.pups_args)
                .config_file(&config_file)
                .default_base_image(bundle.default_base_image)
                .bake_env(bundle.bake_env)
                .render();
            let dockerfile_name = format!("{}.dockerfile", config.name);
            written.push(self.write_file(dir, &dockerfile_name, &dockerfile)?);
        }

        written.push(self.write_file(dir, COMPOSE_FILE_NAME, &compose_yaml)?);

        Ok(written)
    }

    fn write_file(&self, dir: &Path, name: &str, contents: &str) -> Result<PathBuf, WriteError> {
        let path = dir.join(name);
        self.sink
            .write(&path, contents)
            .map_err(|e| WriteError::Write {
                path: path.clone(),
                source: e,
            })?;
        tracing::info!(path = %path.display(), bytes = contents.len(), "wrote artifact");
        Ok(path)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error(transparent)]
    Compose(#[from] ComposeError),
    #[error("failed to create output directory {path}")]
    CreateDir {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}")]
    Write {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}
