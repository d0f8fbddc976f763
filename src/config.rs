//! Project configuration loaded from `.keel/config.toml`.
//!
//! ```toml
//! [scan]
//! max_file_size = 1048576
//! include_hidden = false
//!
//! [builtins]
//! allow = ["Result"]            # never treat these as builtins
//!
//! [builtins.extra]
//! rust = ["anyhow", "tracing"]  # additional names to filter per language
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{KeelError, Result};

/// Directory (relative to the project root) holding Keel state.
pub const KEEL_DIR: &str = ".keel";

/// Config file name inside [`KEEL_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeelConfig {
    pub scan: ScanConfig,
    pub builtins: BuiltinOverrides,
}

/// Directory scanning options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Files larger than this many bytes are skipped.
    pub max_file_size: u64,
    /// Walk hidden files and directories too.
    pub include_hidden: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_file_size: 1024 * 1024,
            include_hidden: false,
        }
    }
}

/// Adjustments to the per-language builtin tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuiltinOverrides {
    /// Extra builtin names keyed by language name (`rust`, `go`, `java`,
    /// `python`, `javascript`, `typescript`).
    pub extra: HashMap<String, Vec<String>>,
    /// Names removed from every language's default table.
    pub allow: Vec<String>,
}

impl BuiltinOverrides {
    /// Extra names configured for `language` (case-insensitive key).
    pub fn extra_for<'a>(&'a self, language: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.extra
            .iter()
            .filter(move |(lang, _)| lang.eq_ignore_ascii_case(language))
            .flat_map(|(_, names)| names.iter().map(String::as_str))
    }
}

impl KeelConfig {
    /// Load config from `path`, falling back to defaults.
    ///
    /// A missing file is normal. An unreadable or malformed file is logged
    /// and ignored so a bad config never blocks analysis.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Self::default();
        }

        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read config, using defaults");
                return Self::default();
            }
        };

        match Self::from_toml_str(&text) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "invalid config, using defaults");
                Self::default()
            }
        }
    }

    /// Parse config text strictly.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| KeelError::Config(e.to_string()))
    }

    /// Load `<root>/.keel/config.toml`.
    pub fn load_for_root(root: &Path) -> Self {
        Self::load(&Self::default_path(root))
    }

    /// Location of the config file for a project root.
    pub fn default_path(root: &Path) -> PathBuf {
        root.join(KEEL_DIR).join(CONFIG_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = KeelConfig::load(&dir.path().join("nope.toml"));
        assert_eq!(config, KeelConfig::default());
        assert_eq!(config.scan.max_file_size, 1024 * 1024);
        assert!(!config.scan.include_hidden);
    }

    #[test]
    fn test_parse_full_config() {
        let text = r#"
[scan]
max_file_size = 2048
include_hidden = true

[builtins]
allow = ["Result"]

[builtins.extra]
rust = ["anyhow"]
Go = ["zap"]
"#;
        let config = KeelConfig::from_toml_str(text).unwrap();
        assert_eq!(config.scan.max_file_size, 2048);
        assert!(config.scan.include_hidden);
        assert_eq!(config.builtins.allow, vec!["Result".to_string()]);

        let rust: Vec<&str> = config.builtins.extra_for("rust").collect();
        assert_eq!(rust, vec!["anyhow"]);
        let go: Vec<&str> = config.builtins.extra_for("go").collect();
        assert_eq!(go, vec!["zap"]);
        assert_eq!(config.builtins.extra_for("java").count(), 0);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config = KeelConfig::from_toml_str("[scan]\ninclude_hidden = true\n").unwrap();
        assert!(config.scan.include_hidden);
        assert_eq!(config.scan.max_file_size, 1024 * 1024);
        assert!(config.builtins.allow.is_empty());
    }

    #[test]
    fn test_invalid_config() {
        let err = KeelConfig::from_toml_str("[scan\nmax_file_size = ").unwrap_err();
        assert!(matches!(err, KeelError::Config(_)));

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "scan = 12").unwrap();
        assert_eq!(KeelConfig::load(&path), KeelConfig::default());
    }

    #[test]
    fn test_load_for_root() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(KEEL_DIR)).unwrap();
        std::fs::write(
            KeelConfig::default_path(dir.path()),
            "[builtins]\nallow = [\"Vec\"]\n",
        )
        .unwrap();
        let config = KeelConfig::load_for_root(dir.path());
        assert_eq!(config.builtins.allow, vec!["Vec".to_string()]);
    }
}
