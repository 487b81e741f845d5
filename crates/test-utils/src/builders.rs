#![allow(dead_code)]

use std::path::Path;

use recoverd::config::{ConfigFile, RawConfigFile};

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the defaults; recovery commands are usually given as inline
/// shell scripts via [`ConfigFileBuilder::with_script`].
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_staging_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.paths.staging_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_backup_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.paths.backup_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_working_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.paths.working_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_command(mut self, command: &str, args: &[&str]) -> Self {
        self.config.recovery.command = command.to_string();
        self.config.recovery.args = args.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Run `script` through `/bin/sh -c`.
    pub fn with_script(self, script: &str) -> Self {
        self.with_command("/bin/sh", &["-c", script])
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.config.broadcast.capacity = capacity;
        self
    }

    pub fn with_backup_naming(mut self, prefix: &str, suffix: &str) -> Self {
        self.config.backup.prefix = prefix.to_string();
        self.config.backup.suffix = suffix.to_string();
        self
    }

    pub fn with_max_upload_mb(mut self, mb: usize) -> Self {
        self.config.server.max_upload_mb = mb;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
