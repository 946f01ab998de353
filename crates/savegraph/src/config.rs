// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codec and archive settings.
//!
//! Settings are plain data with builder-style setters. With the
//! `settings-loaders` feature (default) they can also be loaded from YAML:
//!
//! ```yaml
//! path: saves/slot1.sav
//! type_checking: true
//! depth_limit: 64
//! skip_unknown_type_tags: false
//! backup_on_sync: true
//! auto_sync: false
//! ```

use crate::error::{CodecError, Result};
use std::path::{Path, PathBuf};

/// Default archive file name.
pub const DEFAULT_ARCHIVE_PATH: &str = "savegraph.sav";

/// Default nesting limit for one codec pass.
pub const DEFAULT_DEPTH_LIMIT: usize = 64;

/// Settings shared by codec passes and archives.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "settings-loaders",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct Settings {
    /// Archive file location.
    pub path: PathBuf,
    /// Reject loads whose stored type tag differs from the requested type.
    pub type_checking: bool,
    /// Maximum nesting depth before a pass is aborted.
    pub depth_limit: usize,
    /// Skip subtrees whose polymorphism tag cannot be resolved (yields null).
    pub skip_unknown_type_tags: bool,
    /// Keep the previous archive file as `<path>.bak` on every sync.
    pub backup_on_sync: bool,
    /// Persist the archive after every mutation.
    pub auto_sync: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_ARCHIVE_PATH),
            type_checking: true,
            depth_limit: DEFAULT_DEPTH_LIMIT,
            skip_unknown_type_tags: false,
            backup_on_sync: true,
            auto_sync: false,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_type_checking(mut self, enabled: bool) -> Self {
        self.type_checking = enabled;
        self
    }

    pub fn with_depth_limit(mut self, limit: usize) -> Self {
        self.depth_limit = limit;
        self
    }

    pub fn with_skip_unknown_type_tags(mut self, enabled: bool) -> Self {
        self.skip_unknown_type_tags = enabled;
        self
    }

    pub fn with_backup_on_sync(mut self, enabled: bool) -> Self {
        self.backup_on_sync = enabled;
        self
    }

    pub fn with_auto_sync(mut self, enabled: bool) -> Self {
        self.auto_sync = enabled;
        self
    }

    /// Path of the backup kept next to the archive.
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".bak");
        PathBuf::from(name)
    }

    /// Path of the temporary file written before an atomic rename.
    pub fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.depth_limit == 0 {
            return Err(CodecError::Config("depth_limit must be at least 1".into()));
        }
        if self.path.as_os_str().is_empty() {
            return Err(CodecError::Config("archive path cannot be empty".into()));
        }
        Ok(())
    }

    /// Parse settings from a YAML document. Missing keys keep their defaults.
    #[cfg(feature = "settings-loaders")]
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(yaml)
            .map_err(|e| CodecError::Config(format!("invalid settings YAML: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a YAML file.
    #[cfg(feature = "settings-loaders")]
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            CodecError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&text)
    }

    /// Relative paths are resolved against `root`.
    pub fn rooted_at(mut self, root: impl AsRef<Path>) -> Self {
        if self.path.is_relative() {
            self.path = root.as_ref().join(&self.path);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert!(s.type_checking);
        assert_eq!(s.depth_limit, 64);
        assert!(!s.skip_unknown_type_tags);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_backup_and_temp_paths() {
        let s = Settings::new().with_path("saves/slot1.sav");
        assert_eq!(s.backup_path(), PathBuf::from("saves/slot1.sav.bak"));
        assert_eq!(s.temp_path(), PathBuf::from("saves/slot1.sav.tmp"));
    }

    #[test]
    fn test_rooted_at_keeps_absolute_paths() {
        let abs = std::env::temp_dir().join("a.sav");
        let s = Settings::new().with_path(&abs).rooted_at("/elsewhere");
        assert_eq!(s.path, abs);

        let s = Settings::new().with_path("b.sav").rooted_at("/root/dir");
        assert_eq!(s.path, PathBuf::from("/root/dir/b.sav"));
    }

    #[test]
    fn test_zero_depth_limit_rejected() {
        let s = Settings::new().with_depth_limit(0);
        assert!(matches!(s.validate(), Err(CodecError::Config(_))));
    }

    #[cfg(feature = "settings-loaders")]
    #[test]
    fn test_yaml_partial_document() {
        let s = Settings::from_yaml_str("depth_limit: 16\nskip_unknown_type_tags: true\n")
            .expect("parse");
        assert_eq!(s.depth_limit, 16);
        assert!(s.skip_unknown_type_tags);
        assert!(s.type_checking);
        assert_eq!(s.path, PathBuf::from(DEFAULT_ARCHIVE_PATH));
    }

    #[cfg(feature = "settings-loaders")]
    #[test]
    fn test_yaml_invalid_values() {
        assert!(matches!(
            Settings::from_yaml_str("depth_limit: -3"),
            Err(CodecError::Config(_))
        ));
        assert!(matches!(
            Settings::from_yaml_str("depth_limit: 0"),
            Err(CodecError::Config(_))
        ));
    }
}
