// src/config/mod.rs

//! Configuration loading and validation for recoverd.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate naming conventions and limits (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, resolve};
pub use model::{
    BackupSection, BroadcastSection, ConfigFile, PathsSection, RawConfigFile, RecoverySection,
    ServerSection, StagingSection,
};
