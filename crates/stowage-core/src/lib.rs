//! Core types and configuration for stowage.
//!
//! This crate defines the pups container configuration entity
//! ([`Configuration`]) and its loader, the `stowage.toml` schema
//! ([`StowageConfig`]), and shared error types.

pub mod config;
pub mod container;
pub mod error;

pub use config::{
    BuildConfig, ComposeConfig, DEFAULT_NAMESPACE, DEFAULT_PUPS_ARGS, DEFAULT_SHM_SIZE,
    KNOWN_SECRETS, PathsConfig, SecretsConfig, StowageConfig,
};
pub use container::{Configuration, Link, Volume, find_config_names};
pub use error::{Error, Result};
