//! Document-database adapter for [`MultiTenantStorage`].
//!
//! Every tenant gets its own collection, named exactly like the tenant, inside one shared
//! database. Each call selects the collection and issues one or two queries against it.
//! All calls run under the configured operation timeout.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info};

use crate::config::StorageConfig;
use crate::document_db::{Collection, ConnectOptions, DocumentDatabase, Filter, FindOptions};
use crate::error::{Result, StorageError};
use crate::models::{search_regex, Message, Messages, SearchKind};
use crate::storage::MultiTenantStorage;
use crate::tenant::{validate_identifier, Tenant};

/// Tuning for [`MultiTenantDocumentStore`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub max_connections: u32,
    /// Deadline for construction and for every storage call.
    pub operation_timeout: Duration,
    /// When set, only these tenants may be used.
    pub allowed_tenants: Option<HashSet<Tenant>>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            max_connections: 5,
            operation_timeout: Duration::from_secs(30),
            allowed_tenants: None,
        }
    }
}

/// Multi-tenant message storage backed by a document database.
#[derive(Clone, Debug)]
pub struct MultiTenantDocumentStore {
    database: DocumentDatabase,
    operation_timeout: Duration,
    allowed_tenants: Option<Arc<HashSet<Tenant>>>,
}

impl MultiTenantDocumentStore {
    /// Connects with default options and ensures the `created` index on `default_collection`.
    pub async fn create(uri: &str, database: &str, default_collection: &str) -> Result<Self> {
        Self::with_options(uri, database, default_collection, StoreOptions::default()).await
    }

    pub async fn from_config(config: &StorageConfig) -> Result<Self> {
        Self::with_options(
            &config.uri,
            &config.database,
            &config.collection,
            config.store_options()?,
        )
        .await
    }

    /// Connects and prepares the default collection. Failures are [`StorageError::Connection`].
    pub async fn with_options(
        uri: &str,
        database: &str,
        default_collection: &str,
        options: StoreOptions,
    ) -> Result<Self> {
        info!(uri = %uri, database = %database, "Connecting to document database");

        for name in [database, default_collection] {
            validate_identifier(name).map_err(|e| {
                error!(error = %e, "Invalid database or collection name");
                StorageError::Connection(e)
            })?;
        }

        let connect_options = ConnectOptions {
            max_connections: options.max_connections,
            acquire_timeout: options.operation_timeout,
        };
        let connect = async {
            let db = DocumentDatabase::connect(uri, database, &connect_options)
                .await
                .map_err(|e| {
                    error!(error = %e, "Error connecting to document database");
                    StorageError::Connection(e.to_string())
                })?;
            db.collection(default_collection)
                .ensure_index_created()
                .await
                .map_err(|e| {
                    error!(error = %e, collection = %default_collection, "Failed creating index");
                    StorageError::Connection(e.to_string())
                })?;
            Ok::<_, StorageError>(db)
        };

        let database = match tokio::time::timeout(options.operation_timeout, connect).await {
            Ok(result) => result?,
            Err(_) => {
                error!(uri = %uri, "Timed out connecting to document database");
                return Err(StorageError::Connection(format!(
                    "timed out after {:?}",
                    options.operation_timeout
                )));
            }
        };

        info!(database = %database.name(), "Document database ready");
        Ok(Self {
            database,
            operation_timeout: options.operation_timeout,
            allowed_tenants: options.allowed_tenants.map(Arc::new),
        })
    }

    /// Tenants that currently have a collection, sorted. The default collection is
    /// created at startup and is listed like any other.
    pub async fn tenants(&self) -> Result<Vec<Tenant>> {
        let names = self
            .with_timeout("tenants", self.database.collection_names())
            .await?;
        Ok(names
            .into_iter()
            .filter_map(|name| Tenant::new(name).ok())
            .collect())
    }

    fn collection(&self, tenant: &Tenant) -> Result<Collection<'_>> {
        if let Some(allowed) = &self.allowed_tenants {
            if !allowed.contains(tenant) {
                error!(tenant = %tenant, "Tenant is not in the allow-list");
                return Err(StorageError::TenantNotAllowed(tenant.to_string()));
            }
        }
        Ok(self.database.collection(tenant.as_str()))
    }

    async fn with_timeout<T, F>(&self, operation: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.operation_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                error!(operation, timeout = ?self.operation_timeout, "Storage operation timed out");
                Err(StorageError::Timeout { operation })
            }
        }
    }

    async fn find_page(
        &self,
        filter: &Filter,
        start: usize,
        limit: usize,
        tenant: &Tenant,
    ) -> Result<Messages> {
        let options = FindOptions {
            skip: start,
            limit,
            projected: true,
        };
        self.collection(tenant)?
            .find(filter, options)
            .await
            .map_err(|e| {
                error!(error = %e, tenant = %tenant, "Error loading messages");
                e
            })
    }
}

#[async_trait]
impl MultiTenantStorage for MultiTenantDocumentStore {
    async fn store(&self, message: &Message, tenant: &Tenant) -> Result<String> {
        self.with_timeout("store", async {
            self.collection(tenant)?
                .insert(message)
                .await
                .map_err(|e| {
                    error!(error = %e, tenant = %tenant, id = %message.id, "Error inserting message");
                    e
                })?;
            info!(tenant = %tenant, id = %message.id, "Stored message");
            Ok(message.id.clone())
        })
        .await
    }

    async fn list(&self, start: usize, limit: usize, tenant: &Tenant) -> Result<Messages> {
        self.with_timeout("list", self.find_page(&Filter::All, start, limit, tenant))
            .await
    }

    async fn search(
        &self,
        kind: SearchKind,
        query: &str,
        start: usize,
        limit: usize,
        tenant: &Tenant,
    ) -> Result<(Messages, u64)> {
        self.with_timeout("search", async {
            search_regex(query).map_err(|e| {
                error!(error = %e, tenant = %tenant, "Rejected search pattern");
                e
            })?;
            let filter = Filter::Matches {
                kind,
                query: query.to_string(),
            };
            let messages = self.find_page(&filter, start, limit, tenant).await?;
            // Separate query: the total may observe writes the page did not.
            let count = self
                .collection(tenant)?
                .count(&filter)
                .await
                .map_err(|e| {
                    error!(error = %e, tenant = %tenant, "Error counting search matches");
                    e
                })?;
            info!(
                tenant = %tenant,
                kind = %kind,
                query = %query,
                returned = messages.len(),
                count,
                "Searched messages"
            );
            Ok((messages, count))
        })
        .await
    }

    async fn count(&self, tenant: &Tenant) -> Result<u64> {
        self.with_timeout("count", async {
            self.collection(tenant)?
                .count(&Filter::All)
                .await
                .map_err(|e| {
                    error!(error = %e, tenant = %tenant, "Error counting messages");
                    e
                })
        })
        .await
    }

    async fn delete_one(&self, id: &str, tenant: &Tenant) -> Result<u64> {
        self.with_timeout("delete_one", async {
            let removed = self
                .collection(tenant)?
                .remove_all(&Filter::Id(id.to_string()))
                .await
                .map_err(|e| {
                    error!(error = %e, tenant = %tenant, id = %id, "Error deleting message");
                    e
                })?;
            info!(tenant = %tenant, id = %id, removed, "Deleted message");
            Ok(removed)
        })
        .await
    }

    async fn delete_all(&self, tenant: &Tenant) -> Result<u64> {
        self.with_timeout("delete_all", async {
            let removed = self
                .collection(tenant)?
                .remove_all(&Filter::All)
                .await
                .map_err(|e| {
                    error!(error = %e, tenant = %tenant, "Error deleting messages");
                    e
                })?;
            info!(tenant = %tenant, removed, "Deleted all messages");
            Ok(removed)
        })
        .await
    }

    async fn load(&self, id: &str, tenant: &Tenant) -> Result<Message> {
        self.with_timeout("load", async {
            let found = self
                .collection(tenant)?
                .find_one(&Filter::Id(id.to_string()))
                .await
                .map_err(|e| {
                    error!(error = %e, tenant = %tenant, id = %id, "Error loading message");
                    e
                })?;
            found.ok_or_else(|| {
                error!(tenant = %tenant, id = %id, "Error loading message: not found");
                StorageError::NotFound(format!("message {} in tenant {}", id, tenant))
            })
        })
        .await
    }
}
