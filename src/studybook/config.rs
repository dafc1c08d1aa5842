//! # Configuration
//!
//! Stored as `config.json` in the data directory. A missing file means defaults.
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `max_tree_depth` | `500` | Hop/recursion bound for tree walks |
//! | `copy_suffix` | `" (copy)"` | Appended to a copy pasted next to its original |
//! | `hover_expand_ms` | `500` | Drag hover time before a folder auto-expands |
//! | `long_press_ms` | `600` | Press time before the context menu opens |
//! | `store_quota_bytes` | unset | Largest collection the file store will write |
//! | `default_subject` | `"General"` | Name of the subject created for legacy mistakes |

use crate::error::{Result, StudyError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

const CONFIG_FILENAME: &str = "config.json";

pub const KEYS: &[&str] = &[
    "max_tree_depth",
    "copy_suffix",
    "hover_expand_ms",
    "long_press_ms",
    "store_quota_bytes",
    "default_subject",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudyConfig {
    #[serde(default = "default_max_tree_depth")]
    pub max_tree_depth: usize,

    #[serde(default = "default_copy_suffix")]
    pub copy_suffix: String,

    #[serde(default = "default_hover_expand_ms")]
    pub hover_expand_ms: u64,

    #[serde(default = "default_long_press_ms")]
    pub long_press_ms: u64,

    #[serde(default)]
    pub store_quota_bytes: Option<u64>,

    #[serde(default = "default_subject")]
    pub default_subject: String,
}

fn default_max_tree_depth() -> usize {
    500
}

fn default_copy_suffix() -> String {
    " (copy)".to_string()
}

fn default_hover_expand_ms() -> u64 {
    500
}

fn default_long_press_ms() -> u64 {
    600
}

fn default_subject() -> String {
    "General".to_string()
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            max_tree_depth: default_max_tree_depth(),
            copy_suffix: default_copy_suffix(),
            hover_expand_ms: default_hover_expand_ms(),
            long_press_ms: default_long_press_ms(),
            store_quota_bytes: None,
            default_subject: default_subject(),
        }
    }
}

impl StudyConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: StudyConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();
        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_dir.join(CONFIG_FILENAME), content)?;
        Ok(())
    }

    pub fn hover_expand_delay(&self) -> Duration {
        Duration::from_millis(self.hover_expand_ms)
    }

    pub fn long_press_delay(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "max_tree_depth" => Some(self.max_tree_depth.to_string()),
            "copy_suffix" => Some(format!("{:?}", self.copy_suffix)),
            "hover_expand_ms" => Some(self.hover_expand_ms.to_string()),
            "long_press_ms" => Some(self.long_press_ms.to_string()),
            "store_quota_bytes" => Some(
                self.store_quota_bytes
                    .map(|b| b.to_string())
                    .unwrap_or_else(|| "unlimited".to_string()),
            ),
            "default_subject" => Some(self.default_subject.clone()),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "max_tree_depth" => {
                let depth = parse_number(key, value)?;
                if depth == 0 {
                    return Err(StudyError::Validation(
                        "max_tree_depth must be at least 1".to_string(),
                    ));
                }
                self.max_tree_depth = depth as usize;
            }
            "copy_suffix" => self.copy_suffix = value.to_string(),
            "hover_expand_ms" => self.hover_expand_ms = parse_number(key, value)?,
            "long_press_ms" => self.long_press_ms = parse_number(key, value)?,
            "store_quota_bytes" => {
                self.store_quota_bytes = match value {
                    "" | "unlimited" | "none" => None,
                    v => Some(parse_number(key, v)?),
                }
            }
            "default_subject" => {
                let name = value.trim();
                if name.is_empty() {
                    return Err(StudyError::Validation(
                        "default_subject cannot be empty".to_string(),
                    ));
                }
                self.default_subject = name.to_string();
            }
            _ => {
                return Err(StudyError::Validation(format!(
                    "Unknown config key: {} (known keys: {})",
                    key,
                    KEYS.join(", ")
                )))
            }
        }
        Ok(())
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| StudyError::Validation(format!("{} expects a number, got '{}'", key, value)))
}
