//! @acp:module "Configuration"
//! @acp:summary "Project configuration loading and defaults"
//! @acp:domain cli
//! @acp:layer config

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::score::{default_bands, ReportFormat, ScoreAccumulator, ScoreBand, BASELINE};
use crate::session::{FileStore, ONBOARDING_STORAGE_KEY};

/// Default config file name
pub const CONFIG_FILE: &str = ".thrive.config.json";

fn default_config_schema() -> String {
    "https://thrive.care/schemas/v1/config.schema.json".to_string()
}

fn default_version() -> String {
    "1.0.0".to_string()
}

/// @acp:summary "Main onboarding configuration structure"
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(rename = "$schema", default = "default_config_schema")]
    pub schema: String,

    #[serde(default = "default_version")]
    pub version: String,

    /// Directory holding one JSON file per storage key
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    /// Storage key of the onboarding session
    #[serde(default = "default_session_key")]
    pub session_key: String,

    /// Custom flow file (JSON or YAML); built-in flow when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<PathBuf>,

    /// Score before deductions (at most 100)
    #[serde(default = "default_baseline")]
    pub baseline: u32,

    /// Score bands, highest threshold wins
    #[serde(default = "default_bands")]
    pub bands: Vec<ScoreBand>,

    /// Default report format for `thrive score`
    #[serde(default = "default_report_format")]
    pub report_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema: default_config_schema(),
            version: default_version(),
            storage_dir: default_storage_dir(),
            session_key: default_session_key(),
            flow: None,
            baseline: default_baseline(),
            bands: default_bands(),
            report_format: default_report_format(),
        }
    }
}

impl Config {
    /// @acp:summary "Load config from .thrive.config.json file"
    pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// @acp:summary "Save config to a file"
    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Storage directory with a leading `~` expanded
    pub fn storage_path(&self) -> PathBuf {
        expand_home(&self.storage_dir)
    }

    pub fn file_store(&self) -> FileStore {
        FileStore::new(self.storage_path())
    }

    pub fn flow_path(&self) -> Option<PathBuf> {
        self.flow.as_deref().map(expand_home)
    }

    pub fn accumulator(&self) -> ScoreAccumulator {
        if self.baseline > BASELINE {
            tracing::warn!(baseline = self.baseline, "Baseline above 100 is clamped");
        }
        ScoreAccumulator::new(self.baseline)
    }

    pub fn report_format(&self) -> ReportFormat {
        self.report_format.parse().unwrap_or_else(|_| {
            tracing::warn!("Unknown report format '{}', using text", self.report_format);
            ReportFormat::Text
        })
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from(".thrive")
}

fn default_session_key() -> String {
    ONBOARDING_STORAGE_KEY.to_string()
}

fn default_baseline() -> u32 {
    BASELINE
}

fn default_report_format() -> String {
    "text".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_takes_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.session_key, "onboarding-storage");
        assert_eq!(config.baseline, 100);
        assert_eq!(config.bands.len(), 4);
        assert_eq!(config.storage_dir, PathBuf::from(".thrive"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let config = Config {
            baseline: 90,
            flow: Some(PathBuf::from("flows/custom.yaml")),
            ..Default::default()
        };
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.baseline, 90);
        assert_eq!(loaded.flow, Some(PathBuf::from("flows/custom.yaml")));

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw.get("storageDir").is_some());
        assert!(raw.get("sessionKey").is_some());
    }

    #[test]
    fn test_home_expansion() {
        let config = Config {
            storage_dir: PathBuf::from("~/.thrive"),
            ..Default::default()
        };
        if let Some(home) = dirs::home_dir() {
            assert_eq!(config.storage_path(), home.join(".thrive"));
        }
    }

    #[test]
    fn test_unknown_report_format_falls_back() {
        let config = Config {
            report_format: "pdf".to_string(),
            ..Default::default()
        };
        assert_eq!(config.report_format(), ReportFormat::Text);
    }
}
