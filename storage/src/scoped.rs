//! Tenant-scoped view of a [`MultiTenantStorage`]: every call is pinned to one tenant.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Message, Messages, SearchKind};
use crate::storage::{MultiTenantStorage, Storage};
use crate::tenant::Tenant;

/// Wrapper around a [`MultiTenantStorage`] that forwards every operation with a fixed tenant.
/// Callers holding it cannot reach another tenant's messages.
#[derive(Clone)]
pub struct TenantScopedStorage {
    inner: Arc<dyn MultiTenantStorage>,
    tenant: Tenant,
}

impl TenantScopedStorage {
    pub fn new(inner: Arc<dyn MultiTenantStorage>, tenant: Tenant) -> Self {
        Self { inner, tenant }
    }

    pub fn tenant(&self) -> &Tenant {
        &self.tenant
    }
}

#[async_trait]
impl Storage for TenantScopedStorage {
    async fn store(&self, message: &Message) -> Result<String> {
        self.inner.store(message, &self.tenant).await
    }

    async fn list(&self, start: usize, limit: usize) -> Result<Messages> {
        self.inner.list(start, limit, &self.tenant).await
    }

    async fn search(
        &self,
        kind: SearchKind,
        query: &str,
        start: usize,
        limit: usize,
    ) -> Result<(Messages, u64)> {
        self.inner
            .search(kind, query, start, limit, &self.tenant)
            .await
    }

    async fn count(&self) -> Result<u64> {
        self.inner.count(&self.tenant).await
    }

    async fn delete_one(&self, id: &str) -> Result<u64> {
        self.inner.delete_one(id, &self.tenant).await
    }

    async fn delete_all(&self) -> Result<u64> {
        self.inner.delete_all(&self.tenant).await
    }

    async fn load(&self, id: &str) -> Result<Message> {
        self.inner.load(id, &self.tenant).await
    }
}

/// Returns a [`Storage`] restricted to `tenant`.
pub fn scoped_storage(inner: Arc<dyn MultiTenantStorage>, tenant: Tenant) -> Arc<dyn Storage> {
    Arc::new(TenantScopedStorage::new(inner, tenant))
}
