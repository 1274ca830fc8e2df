use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Template presets for generated filenames.
pub const TEMPLATE_PRESETS: &[(&str, &str)] = &[
    ("standard", "{author} - {title} ({year})"),
    ("journal", "{author} - {title} - {journal} ({year})"),
    ("year_first", "{year} - {author} - {title}"),
    ("compact", "{author}_{year}_{title}"),
];

/// Application configuration, layered from defaults, an optional TOML file,
/// and `PDF_SHELF_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub providers: ProviderConfig,
    pub zotero: ZoteroConfig,
    pub rename: RenameConfig,
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Per-provider request timeout in seconds
    pub timeout_secs: u64,
    /// User agent sent to all lookup services
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoteroConfig {
    /// Zotero API key; empty disables the Zotero provider and sync
    pub api_key: String,
    /// Numeric library identifier
    pub library_id: String,
    /// "user" or "group"
    pub library_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenameConfig {
    /// Preset name from `TEMPLATE_PRESETS`, or "custom"
    pub template: String,
    /// Template string used when `template` is "custom"
    pub custom_template: String,
    /// Directory holding the rename journal; defaults to the platform
    /// data directory
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Maximum number of documents resolved concurrently during a scan
    pub max_concurrent: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            providers: ProviderConfig::default(),
            zotero: ZoteroConfig::default(),
            rename: RenameConfig::default(),
            scan: ScanConfig::default(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: format!(
                "pdf-shelf/{} (https://github.com/Ladvien/pdf_shelf)",
                env!("CARGO_PKG_VERSION")
            ),
        }
    }
}

impl Default for ZoteroConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            library_id: String::new(),
            library_type: "user".to_string(),
        }
    }
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            template: "standard".to_string(),
            custom_template: String::new(),
            data_dir: None,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self { max_concurrent: 4 }
    }
}

impl Config {
    /// Load configuration from an optional file path, the default config
    /// location, and environment variables (in increasing precedence).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        match path {
            Some(explicit) => {
                builder = builder.add_source(config::File::from(explicit));
            }
            None => {
                if let Some(default_path) = Self::default_config_path() {
                    builder =
                        builder.add_source(config::File::from(default_path).required(false));
                }
            }
        }

        builder = builder.add_source(
            config::Environment::with_prefix("PDF_SHELF")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        debug!("Loaded configuration: template={}", config.rename.template);
        Ok(config)
    }

    /// Default config file location (`<config dir>/pdf-shelf/config.toml`).
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pdf-shelf").join("config.toml"))
    }

    /// Directory holding mutable state (the rename journal).
    pub fn data_dir(&self) -> PathBuf {
        self.rename.data_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("pdf-shelf")
        })
    }

    /// Path of the rename journal file.
    pub fn journal_path(&self) -> PathBuf {
        self.data_dir().join("rename_log.json")
    }

    /// Resolve the active filename template: an explicit argument wins,
    /// then the configured preset or custom string, then "standard".
    pub fn resolve_template(&self, explicit: Option<&str>) -> String {
        if let Some(t) = explicit {
            return Self::preset(t).unwrap_or(t).to_string();
        }
        if self.rename.template == "custom" && !self.rename.custom_template.is_empty() {
            return self.rename.custom_template.clone();
        }
        Self::preset(&self.rename.template)
            .unwrap_or(TEMPLATE_PRESETS[0].1)
            .to_string()
    }

    fn preset(name: &str) -> Option<&'static str> {
        TEMPLATE_PRESETS
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, template)| *template)
    }

    /// Per-provider lookup timeout.
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.providers.timeout_secs)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.providers.timeout_secs == 0 || self.providers.timeout_secs > 300 {
            return Err(Error::InvalidInput {
                field: "providers.timeout_secs".to_string(),
                reason: "must be between 1 and 300 seconds".to_string(),
            });
        }

        if self.scan.max_concurrent == 0 || self.scan.max_concurrent > 16 {
            return Err(Error::InvalidInput {
                field: "scan.max_concurrent".to_string(),
                reason: "must be between 1 and 16".to_string(),
            });
        }

        if self.zotero.library_type != "user" && self.zotero.library_type != "group" {
            return Err(Error::InvalidInput {
                field: "zotero.library_type".to_string(),
                reason: "must be 'user' or 'group'".to_string(),
            });
        }

        let known_preset = Self::preset(&self.rename.template).is_some();
        if !known_preset && self.rename.template != "custom" {
            return Err(Error::InvalidInput {
                field: "rename.template".to_string(),
                reason: format!("unknown template preset '{}'", self.rename.template),
            });
        }
        if self.rename.template == "custom" && self.rename.custom_template.is_empty() {
            return Err(Error::InvalidInput {
                field: "rename.custom_template".to_string(),
                reason: "custom template selected but no template string set".to_string(),
            });
        }

        Ok(())
    }
}

impl ZoteroConfig {
    /// Whether enough credentials are present to talk to the Zotero API.
    /// Missing credentials are a normal state, not an error: the Zotero
    /// provider and attachment sync simply become unavailable.
    pub fn configured(&self) -> bool {
        !self.api_key.is_empty() && !self.library_id.is_empty()
    }
}
