// src/config/model.rs

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [server]
/// host = "0.0.0.0"
/// port = 5000
///
/// [paths]
/// staging_dir = "IBD_FILES"
/// backup_dir = "/app/backup"
///
/// [recovery]
/// command = "./recovery.sh"
///
/// [backup]
/// prefix = "backup_"
/// suffix = ".sql"
/// ```
///
/// All sections are optional and have defaults matching a stock deployment.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub paths: PathsSection,

    #[serde(default)]
    pub recovery: RecoverySection,

    #[serde(default)]
    pub staging: StagingSection,

    #[serde(default)]
    pub backup: BackupSection,

    #[serde(default)]
    pub broadcast: BroadcastSection,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`
/// (see `validate.rs`) or the loader.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigFile {
    pub server: ServerSection,
    pub paths: PathsSection,
    pub recovery: RecoverySection,
    pub staging: StagingSection,
    pub backup: BackupSection,
    pub broadcast: BroadcastSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            server: raw.server,
            paths: raw.paths,
            recovery: raw.recovery,
            staging: raw.staging,
            backup: raw.backup,
            broadcast: raw.broadcast,
        }
    }

    /// Built-in defaults, used when no config file is given.
    pub fn defaults() -> Self {
        Self::new_unchecked(RawConfigFile::default())
    }
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound on one upload request body, in MiB.
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_max_upload_mb() -> usize {
    4096
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_mb: default_max_upload_mb(),
        }
    }
}

/// `[paths]` section: the fixed filesystem layout.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsSection {
    /// Single-slot directory holding the current input set.
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,

    /// Directory scanned for backup artifacts written by the recovery command.
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,

    /// Working directory of the recovery process.
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from("IBD_FILES")
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("/app/backup")
}

fn default_working_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            staging_dir: default_staging_dir(),
            backup_dir: default_backup_dir(),
            working_dir: default_working_dir(),
        }
    }
}

/// `[recovery]` section: the opaque executable to supervise.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecoverySection {
    #[serde(default = "default_command")]
    pub command: String,

    /// Extra arguments. Empty for the stock recovery script, which takes none.
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_command() -> String {
    "./recovery.sh".to_string()
}

impl Default for RecoverySection {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: Vec::new(),
        }
    }
}

/// `[staging]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StagingSection {
    /// File name the uploaded definition (schema) file is stored under.
    #[serde(default = "default_definition_name")]
    pub definition_name: String,

    /// Extension (without the dot) a data file must carry to be kept.
    #[serde(default = "default_data_extension")]
    pub data_extension: String,
}

fn default_definition_name() -> String {
    "create.sql".to_string()
}

fn default_data_extension() -> String {
    "ibd".to_string()
}

impl Default for StagingSection {
    fn default() -> Self {
        Self {
            definition_name: default_definition_name(),
            data_extension: default_data_extension(),
        }
    }
}

/// `[backup]` section: artifact naming convention `<prefix><stamp><suffix>`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackupSection {
    #[serde(default = "default_prefix")]
    pub prefix: String,

    #[serde(default = "default_suffix")]
    pub suffix: String,

    /// Regex the `<stamp>` part must match for the name to take part in
    /// selection. Selection is by name, so stamps must sort chronologically.
    #[serde(default = "default_stamp_pattern")]
    pub stamp_pattern: String,
}

fn default_prefix() -> String {
    "backup_".to_string()
}

fn default_suffix() -> String {
    ".sql".to_string()
}

fn default_stamp_pattern() -> String {
    "^[0-9][0-9_-]*$".to_string()
}

impl Default for BackupSection {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            suffix: default_suffix(),
            stamp_pattern: default_stamp_pattern(),
        }
    }
}

/// `[broadcast]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BroadcastSection {
    /// Per-subscriber ring size. Subscribers further behind than this skip
    /// the oldest events.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    1024
}

impl Default for BroadcastSection {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}
