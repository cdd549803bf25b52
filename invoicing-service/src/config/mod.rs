use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct InvoicingConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub storage: StorageConfig,
    pub invoices: InvoiceSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Mongodb,
    /// Process-local maps; data is lost on restart.
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mongodb" | "mongo" => Ok(StorageBackend::Mongodb),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "Unknown STORAGE_BACKEND '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub mongodb: MongoConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: Secret<String>,
    pub database: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceSettings {
    /// Report an empty invoice list as `NOT_FOUND` instead of `[]`.
    #[serde(default)]
    pub empty_list_not_found: bool,
}

impl InvoicingConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        Self::from_vars(common_config, |key| env::var(key).ok())
    }

    /// Resolve the service settings from `var`, a lookup over environment
    /// variables.
    fn from_vars(
        common: core_config::Config,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let is_prod = var("ENVIRONMENT").unwrap_or_else(|| "dev".to_string()) == "prod";
        let setting = |key: &str, default: Option<&str>| get_env(&var, key, default, is_prod);

        let backend: StorageBackend = setting("STORAGE_BACKEND", Some("mongodb"))?.parse()?;
        let mongodb = match backend {
            // Mongo settings are not consulted by the memory backend.
            StorageBackend::Memory => MongoConfig {
                uri: Secret::new(String::new()),
                database: var("MONGODB_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            },
            StorageBackend::Mongodb => MongoConfig {
                uri: Secret::new(setting("MONGODB_URI", None)?),
                database: setting("MONGODB_DATABASE", Some(DEFAULT_DATABASE))?,
            },
        };

        let empty_list_not_found = match var(EMPTY_LIST_NOT_FOUND) {
            Some(value) => parse_flag(EMPTY_LIST_NOT_FOUND, &value)?,
            None => false,
        };

        Ok(InvoicingConfig {
            common,
            storage: StorageConfig { backend, mongodb },
            invoices: InvoiceSettings {
                empty_list_not_found,
            },
        })
    }
}

const DEFAULT_DATABASE: &str = "invoicing_db";
const EMPTY_LIST_NOT_FOUND: &str = "INVOICES_EMPTY_LIST_NOT_FOUND";

fn parse_flag(key: &str, value: &str) -> Result<bool, AppError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(AppError::ConfigError(anyhow::anyhow!(
            "{} must be true or false, got '{}'",
            key,
            value
        ))),
    }
}

fn get_env(
    var: impl Fn(&str) -> Option<String>,
    key: &str,
    default: Option<&str>,
    is_prod: bool,
) -> Result<String, AppError> {
    match var(key) {
        Some(val) => Ok(val),
        None => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
