use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::catalog::{PlanName, RenewalType, Sku};
use crate::wizard::WizardDefaults;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub provisioning: ProvisioningConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Root of the provisioning API. Paths for the individual services
    /// (reseller, site verification, directory, licensing) hang off this.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Environment variable holding the bearer token. Token refresh is
    /// the transport operator's concern, not ours.
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

fn default_base_url() -> String {
    "https://www.googleapis.com".to_string()
}

fn default_token_env() -> String {
    "ONBOARDER_API_TOKEN".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token_env: default_token_env(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisioningConfig {
    /// Seats on the primary subscription when the caller does not say.
    #[serde(default = "default_seats")]
    pub default_seats: u32,
    #[serde(default = "default_purchase_order_id")]
    pub purchase_order_id: String,
    /// Storage add-on SKU by catalog id.
    #[serde(default = "default_storage_sku_id")]
    pub storage_sku_id: String,
    #[serde(default = "default_seats")]
    pub storage_seats: u32,
    #[serde(default = "default_storage_purchase_order_id")]
    pub storage_purchase_order_id: String,
}

fn default_seats() -> u32 {
    5
}

fn default_purchase_order_id() -> String {
    "G00gl39001".to_string()
}

fn default_storage_sku_id() -> String {
    Sku::DriveStorage20Gb.as_str().to_string()
}

fn default_storage_purchase_order_id() -> String {
    "G00gl39001-d20".to_string()
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            default_seats: default_seats(),
            purchase_order_id: default_purchase_order_id(),
            storage_sku_id: default_storage_sku_id(),
            storage_seats: default_seats(),
            storage_purchase_order_id: default_storage_purchase_order_id(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub to_file: bool,
    #[serde(default = "default_log_dir")]
    pub dir: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: false,
            dir: default_log_dir(),
        }
    }
}

impl Config {
    /// Load configuration: built-in defaults, then the user config file
    /// (`~/.config/onboarder/config.json`), then an explicit file, then
    /// `ONBOARDER_*` environment overrides. Later sources win.
    pub fn load(explicit_path: Option<&str>) -> Result<Self> {
        let defaults = serde_json::to_string(&Config::default())
            .context("Failed to encode built-in defaults")?;
        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults,
            config::FileFormat::Json,
        ));

        if let Some(user_config) = Self::user_config_path() {
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config));
            }
        }

        if let Some(path) = explicit_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("ONBOARDER")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .context("Failed to assemble configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("onboarder").join("config.json"))
    }

    /// Bearer token for the provisioning API, if the configured
    /// environment variable is set and non-empty.
    pub fn api_token(&self) -> Option<String> {
        std::env::var(&self.api.token_env)
            .ok()
            .filter(|token| !token.is_empty())
    }

    pub fn logs_path(&self) -> PathBuf {
        PathBuf::from(&self.logging.dir)
    }

    /// Catalog choices for the wizard. An unrecognized storage SKU id
    /// falls back to the smallest add-on rather than failing the run.
    pub fn wizard_defaults(&self) -> WizardDefaults {
        let storage_sku = Sku::from_id(&self.provisioning.storage_sku_id)
            .filter(|sku| sku.is_storage_addon())
            .unwrap_or_else(|| {
                tracing::warn!(
                    sku = %self.provisioning.storage_sku_id,
                    "not a storage add-on SKU; using the 20GB tier"
                );
                Sku::DriveStorage20Gb
            });
        WizardDefaults {
            primary_sku: Sku::GoogleApps,
            plan: PlanName::Flexible,
            renewal: RenewalType::PayAsYouGo,
            purchase_order_id: self.provisioning.purchase_order_id.clone(),
            storage_sku,
            storage_seats: self.provisioning.storage_seats,
            storage_purchase_order_id: self.provisioning.storage_purchase_order_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "https://www.googleapis.com");
        assert_eq!(config.provisioning.default_seats, 5);
        assert_eq!(config.provisioning.storage_sku_id, "Google-Drive-storage-20GB");
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.to_file);
    }

    #[test]
    fn test_wizard_defaults_mapping() {
        let mut config = Config::default();
        config.provisioning.storage_sku_id = "Google-Drive-storage-1TB".to_string();
        config.provisioning.storage_seats = 12;

        let defaults = config.wizard_defaults();
        assert_eq!(defaults.storage_sku, Sku::DriveStorage1Tb);
        assert_eq!(defaults.storage_seats, 12);
        assert_eq!(defaults.purchase_order_id, "G00gl39001");
    }

    #[test]
    fn test_unknown_storage_sku_falls_back() {
        let mut config = Config::default();
        config.provisioning.storage_sku_id = "Google-Floppy-storage-1MB".to_string();
        assert_eq!(config.wizard_defaults().storage_sku, Sku::DriveStorage20Gb);
    }

    #[test]
    fn test_non_addon_sku_falls_back() {
        let mut config = Config::default();
        // The suite SKU is not license-assignable storage.
        config.provisioning.storage_sku_id = Sku::GoogleApps.as_str().to_string();
        assert_eq!(config.wizard_defaults().storage_sku, Sku::DriveStorage20Gb);
    }
}
