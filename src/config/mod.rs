use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::import::{ImportSource, DEFAULT_ENDPOINT};

fn default_separator() -> String {
    "-".to_string()
}

fn default_endpoint() -> Option<String> {
    Some(DEFAULT_ENDPOINT.to_string())
}

fn default_timeout() -> u64 {
    10
}

/// Hex colors overriding the built-in theme (`#RRGGBB` or `#RGB`)
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ThemeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub danger: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_dim: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inactive: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// String placed between selected values
    #[serde(default = "default_separator")]
    pub separator: String,

    /// Upload endpoint for CSV imports (empty = parse locally)
    #[serde(default = "default_endpoint", skip_serializing_if = "Option::is_none")]
    pub upload_endpoint: Option<String>,

    /// Seconds before an upload is abandoned
    #[serde(default = "default_timeout")]
    pub upload_timeout_secs: u64,

    /// Active translation table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Desktop notification when an import finishes
    #[serde(default)]
    pub notifications: bool,

    /// Translation tables keyed by language, then by English text
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub translations: BTreeMap<String, BTreeMap<String, String>>,

    #[serde(default)]
    pub theme: ThemeConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            separator: default_separator(),
            upload_endpoint: default_endpoint(),
            upload_timeout_secs: default_timeout(),
            language: None,
            translations: BTreeMap::new(),
            notifications: false,
            theme: ThemeConfig::default(),
        }
    }
}

impl AppConfig {
    /// Directory holding config.toml and the log file
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("nomenclator");

        if let Err(e) = std::fs::create_dir_all(&config_dir) {
            tracing::warn!("Could not create config directory: {}", e);
        }

        Ok(config_dir)
    }

    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let path = match Self::config_path() {
            Ok(p) => p,
            Err(_) => return Ok(AppConfig::default()),
        };

        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return Ok(config),
                    Err(e) => tracing::warn!("Failed to parse config: {}", e),
                },
                Err(e) => tracing::warn!("Failed to read config: {}", e),
            }
            // Leave a broken file alone so the user can fix it
            return Ok(AppConfig::default());
        }

        let config = AppConfig::default();
        if let Err(e) = config.save() {
            tracing::warn!("Could not write default config: {}", e);
        }
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        // A missing key would come back as the default endpoint, so local
        // parsing is written out as an empty string
        let mut clean_config = self.clone();
        if clean_config.upload_endpoint.is_none() {
            clean_config.upload_endpoint = Some(String::new());
        }

        let content = toml::to_string_pretty(&clean_config)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// How CSV imports are carried out
    pub fn import_source(&self) -> ImportSource {
        match self.upload_endpoint.as_deref().map(str::trim) {
            Some(endpoint) if !endpoint.is_empty() => ImportSource::Upload {
                endpoint: endpoint.to_string(),
                timeout: Duration::from_secs(self.upload_timeout_secs.max(1)),
            },
            _ => ImportSource::Local,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let mut fr = BTreeMap::new();
        fr.insert("Copy".to_string(), "Copier".to_string());

        let mut config = AppConfig {
            separator: "_".to_string(),
            upload_endpoint: Some("https://forms.example.com/upload".to_string()),
            upload_timeout_secs: 30,
            language: Some("fr".to_string()),
            notifications: true,
            ..AppConfig::default()
        };
        config.translations.insert("fr".to_string(), fr);
        config.theme.accent = Some("#FFC107".to_string());

        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&serialized).unwrap();

        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_defaults_for_missing_keys() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.separator, "-");
        assert_eq!(config.upload_endpoint.as_deref(), Some(DEFAULT_ENDPOINT));
    }

    #[test]
    fn test_empty_separator_is_kept() {
        let config: AppConfig = toml::from_str("separator = \"\"").unwrap();
        assert_eq!(config.separator, "");
    }

    #[test]
    fn test_import_source() {
        let mut config = AppConfig::default();
        assert_eq!(
            config.import_source(),
            ImportSource::Upload {
                endpoint: DEFAULT_ENDPOINT.to_string(),
                timeout: Duration::from_secs(10),
            }
        );

        config.upload_endpoint = Some("  ".to_string());
        assert_eq!(config.import_source(), ImportSource::Local);

        config.upload_endpoint = None;
        assert_eq!(config.import_source(), ImportSource::Local);
    }
}
