// src/backup/naming.rs

use regex::Regex;

use crate::config::BackupSection;
use crate::errors::{RecoverdError, Result};

/// Naming convention for backup artifacts: `<prefix><stamp><suffix>`.
///
/// Artifacts are ranked by plain string order, which is only chronological
/// when every stamp is zero-padded to the same width. The stamp regex keeps
/// obviously unrelated names (`backup_old.sql`) out of the ranking.
#[derive(Debug, Clone)]
pub struct BackupNaming {
    prefix: String,
    suffix: String,
    stamp: Regex,
}

/// Result of checking a single file name against the convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMatch<'a> {
    /// Not a backup name at all.
    Unrelated,
    /// Has the prefix and suffix, but the stamp does not validate.
    BadStamp(&'a str),
    Valid(&'a str),
}

impl BackupNaming {
    pub fn new(
        prefix: impl Into<String>,
        suffix: impl Into<String>,
        stamp_pattern: &str,
    ) -> std::result::Result<Self, regex::Error> {
        Ok(Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
            stamp: Regex::new(stamp_pattern)?,
        })
    }

    pub fn from_config(section: &BackupSection) -> Result<Self> {
        Self::new(&section.prefix, &section.suffix, &section.stamp_pattern).map_err(|e| {
            RecoverdError::ConfigError(format!("invalid backup stamp pattern: {e}"))
        })
    }

    pub fn classify<'a>(&self, name: &'a str) -> NameMatch<'a> {
        if name.len() < self.prefix.len() + self.suffix.len() {
            return NameMatch::Unrelated;
        }
        let stamp = match name
            .strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_suffix(self.suffix.as_str()))
        {
            Some(stamp) => stamp,
            None => return NameMatch::Unrelated,
        };

        if self.stamp.is_match(stamp) {
            NameMatch::Valid(stamp)
        } else {
            NameMatch::BadStamp(stamp)
        }
    }

    pub fn stamp_pattern(&self) -> &str {
        self.stamp.as_str()
    }

    pub fn matches(&self, name: &str) -> bool {
        matches!(self.classify(name), NameMatch::Valid(_))
    }
}
