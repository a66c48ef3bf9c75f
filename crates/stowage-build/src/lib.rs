//! Dockerfile, `.envrc`, and docker-compose generation for stowage.
//!
//! # Compose pipeline
//!
//! ```text
//! stowage compose web data
//!   1. Load       ── Configuration::load() for every name, before any write
//!   2. Aggregate  ── ServiceBuilder::build() per config → services
//!                    volume::classify() per host → named volumes
//!                    envrc::env_document() → .envrc text
//!   3. Emit       ── ComposeDocument::to_yaml()
//!   4. Write      ── ArtifactWriter::write_bundle() → {output}/{web}/
//! ```
//!
//! # Secret hygiene
//!
//! Keys on the secret denylist never become build args, `ARG`/`ENV` lines,
//! or Concourse build params, so they cannot end up in cached image layers.
//! They still appear in the service's runtime `environment` and in
//! `.envrc`, which are only read when the container starts.
//!
//! # Env precedence
//!
//! The first config named on the command line wins: its `.envrc` block
//! is written last. See [`envrc`].

pub mod aggregate;
pub mod compose;
pub mod concourse;
pub mod dockerfile;
pub mod envrc;
pub mod secrets;
pub mod service;
pub mod volume;
pub mod writer;

pub use aggregate::{Aggregate, AggregateError, aggregate};
pub use compose::{ComposeDocument, ComposeError};
pub use concourse::{ConcourseConfig, ConcourseError};
pub use dockerfile::DockerfileGenerator;
pub use secrets::SecretFilter;
pub use service::{ComposeBuild, ComposeService, ServiceBuilder};
pub use volume::{NamedVolumes, VolumeKind};
pub use writer::{ArtifactSink, ArtifactWriter, Bundle, FsSink, WriteError};
