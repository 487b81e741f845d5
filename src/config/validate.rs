// src/config/validate.rs

use std::path::Path;

use regex::Regex;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{RecoverdError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::RecoverdError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_server(cfg)?;
    validate_recovery(cfg)?;
    validate_staging(cfg)?;
    validate_backup(cfg)?;
    validate_broadcast(cfg)?;
    Ok(())
}

fn validate_server(cfg: &RawConfigFile) -> Result<()> {
    if cfg.server.max_upload_mb == 0 {
        return Err(RecoverdError::ConfigError(
            "[server].max_upload_mb must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_recovery(cfg: &RawConfigFile) -> Result<()> {
    if cfg.recovery.command.trim().is_empty() {
        return Err(RecoverdError::ConfigError(
            "[recovery].command must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_staging(cfg: &RawConfigFile) -> Result<()> {
    let name = &cfg.staging.definition_name;
    if !is_plain_file_name(name) {
        return Err(RecoverdError::ConfigError(format!(
            "[staging].definition_name must be a plain file name (got '{}')",
            name
        )));
    }

    let ext = &cfg.staging.data_extension;
    if ext.is_empty() || ext.starts_with('.') || ext.contains(['/', '\\']) {
        return Err(RecoverdError::ConfigError(format!(
            "[staging].data_extension must be a bare extension like \"ibd\" (got '{}')",
            ext
        )));
    }
    Ok(())
}

fn validate_backup(cfg: &RawConfigFile) -> Result<()> {
    if cfg.backup.prefix.is_empty() && cfg.backup.suffix.is_empty() {
        return Err(RecoverdError::ConfigError(
            "[backup] needs a non-empty prefix or suffix to recognise artifacts".to_string(),
        ));
    }

    Regex::new(&cfg.backup.stamp_pattern).map_err(|e| {
        RecoverdError::ConfigError(format!(
            "[backup].stamp_pattern is not a valid regex: {}",
            e
        ))
    })?;
    Ok(())
}

fn validate_broadcast(cfg: &RawConfigFile) -> Result<()> {
    if cfg.broadcast.capacity == 0 {
        return Err(RecoverdError::ConfigError(
            "[broadcast].capacity must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name)
}
