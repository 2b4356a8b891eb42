//! Storage config: connection string, namespace, pool and deadline settings. Loaded from env.

use std::collections::HashSet;
use std::env;
use std::time::Duration;

use anyhow::Result;

use crate::error::StorageError;
use crate::multi_tenant::StoreOptions;
use crate::tenant::{validate_identifier, Tenant};

/// Storage settings for [`crate::MultiTenantDocumentStore::from_config`].
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// MAILSTORE_URI: `sqlite:` URL or file path
    pub uri: String,
    /// MAILSTORE_DATABASE
    pub database: String,
    /// MAILSTORE_COLLECTION: collection whose index is ensured at startup
    pub collection: String,
    /// MAILSTORE_MAX_CONNECTIONS
    pub max_connections: u32,
    /// MAILSTORE_TIMEOUT_SECS: deadline for every storage call
    pub timeout_secs: u64,
    /// MAILSTORE_ALLOWED_TENANTS: comma-separated; unset allows any valid tenant
    pub allowed_tenants: Option<Vec<String>>,
}

impl StorageConfig {
    /// Load from environment variables.
    pub fn load() -> Result<Self> {
        let uri = env::var("MAILSTORE_URI").unwrap_or_else(|_| "sqlite://./mailstore.db".to_string());
        let database = env::var("MAILSTORE_DATABASE").unwrap_or_else(|_| "mailhog".to_string());
        let collection =
            env::var("MAILSTORE_COLLECTION").unwrap_or_else(|_| "messages".to_string());
        let max_connections = env::var("MAILSTORE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);
        let timeout_secs = env::var("MAILSTORE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);
        let allowed_tenants = env::var("MAILSTORE_ALLOWED_TENANTS").ok().map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect()
        });

        Ok(Self {
            uri,
            database,
            collection,
            max_connections,
            timeout_secs,
            allowed_tenants,
        })
    }

    /// Loads `.env` (if present) into the environment, then [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::load()
    }

    pub fn validate(&self) -> Result<()> {
        if self.uri.trim().is_empty() {
            anyhow::bail!("MAILSTORE_URI is empty");
        }
        validate_identifier(&self.database)
            .map_err(|e| anyhow::anyhow!("MAILSTORE_DATABASE is invalid: {}", e))?;
        validate_identifier(&self.collection)
            .map_err(|e| anyhow::anyhow!("MAILSTORE_COLLECTION is invalid: {}", e))?;
        if self.max_connections == 0 {
            anyhow::bail!("MAILSTORE_MAX_CONNECTIONS must be at least 1");
        }
        if self.timeout_secs == 0 {
            anyhow::bail!("MAILSTORE_TIMEOUT_SECS must be at least 1");
        }
        self.store_options()
            .map_err(|e| anyhow::anyhow!("MAILSTORE_ALLOWED_TENANTS is invalid: {}", e))?;
        Ok(())
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Adapter options; fails if an allow-list entry is not a valid tenant.
    pub fn store_options(&self) -> std::result::Result<StoreOptions, StorageError> {
        let allowed_tenants = match &self.allowed_tenants {
            Some(names) => Some(
                names
                    .iter()
                    .map(|name| Tenant::new(name.as_str()))
                    .collect::<std::result::Result<HashSet<_>, _>>()?,
            ),
            None => None,
        };
        Ok(StoreOptions {
            max_connections: self.max_connections,
            operation_timeout: self.operation_timeout(),
            allowed_tenants,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 6] = [
        "MAILSTORE_URI",
        "MAILSTORE_DATABASE",
        "MAILSTORE_COLLECTION",
        "MAILSTORE_MAX_CONNECTIONS",
        "MAILSTORE_TIMEOUT_SECS",
        "MAILSTORE_ALLOWED_TENANTS",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_load_config_with_defaults() {
        clear_env();

        let config = StorageConfig::load().unwrap();

        assert_eq!(config.uri, "sqlite://./mailstore.db");
        assert_eq!(config.database, "mailhog");
        assert_eq!(config.collection, "messages");
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.timeout_secs, 30);
        assert!(config.allowed_tenants.is_none());
        assert!(config.validate().is_ok());
        assert_eq!(config.operation_timeout(), Duration::from_secs(30));
    }

    #[test]
    #[serial]
    fn test_load_config_with_custom_values() {
        clear_env();
        env::set_var("MAILSTORE_URI", "/tmp/custom.db");
        env::set_var("MAILSTORE_DATABASE", "capture");
        env::set_var("MAILSTORE_COLLECTION", "inbox");
        env::set_var("MAILSTORE_MAX_CONNECTIONS", "2");
        env::set_var("MAILSTORE_TIMEOUT_SECS", "7");
        env::set_var("MAILSTORE_ALLOWED_TENANTS", "acme, globex,,");

        let config = StorageConfig::load().unwrap();
        clear_env();

        assert_eq!(config.uri, "/tmp/custom.db");
        assert_eq!(config.database, "capture");
        assert_eq!(config.collection, "inbox");
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.timeout_secs, 7);
        assert_eq!(
            config.allowed_tenants,
            Some(vec!["acme".to_string(), "globex".to_string()])
        );

        let options = config.store_options().unwrap();
        let allowed = options.allowed_tenants.unwrap();
        assert!(allowed.contains(&Tenant::new("acme").unwrap()));
        assert!(allowed.contains(&Tenant::new("globex").unwrap()));
        assert_eq!(options.operation_timeout, Duration::from_secs(7));
    }

    #[test]
    #[serial]
    fn test_unparseable_numbers_fall_back_to_defaults() {
        clear_env();
        env::set_var("MAILSTORE_MAX_CONNECTIONS", "many");
        env::set_var("MAILSTORE_TIMEOUT_SECS", "-1");

        let config = StorageConfig::load().unwrap();
        clear_env();

        assert_eq!(config.max_connections, 5);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    #[serial]
    fn test_validate_rejects_bad_values() {
        clear_env();
        let base = StorageConfig::load().unwrap();

        let mut config = base.clone();
        config.uri = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = base.clone();
        config.database = "mail.hog".to_string();
        assert!(config.validate().is_err());

        let mut config = base.clone();
        config.max_connections = 0;
        assert!(config.validate().is_err());

        let mut config = base.clone();
        config.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = base;
        config.allowed_tenants = Some(vec!["ok".to_string(), "not ok".to_string()]);
        assert!(config.validate().is_err());
        assert!(matches!(
            config.store_options(),
            Err(StorageError::InvalidTenant(_))
        ));
    }
}
