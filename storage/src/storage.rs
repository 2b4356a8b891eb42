//! Storage traits implemented by message backends.
//!
//! [`MultiTenantStorage`] threads a [`Tenant`] through every call; [`Storage`] is the
//! same contract bound to a single partition (see [`crate::scoped`]).

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Message, Messages, SearchKind};
use crate::tenant::Tenant;

/// Single-tenant storage backend.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Persists one message and returns its storage ID (the message's own id).
    async fn store(&self, message: &Message) -> Result<String>;
    /// Up to `limit` messages, newest first, skipping the first `start`. `limit == 0` is unbounded.
    async fn list(&self, start: usize, limit: usize) -> Result<Messages>;
    /// One page of matches plus the total match count across all pages.
    async fn search(
        &self,
        kind: SearchKind,
        query: &str,
        start: usize,
        limit: usize,
    ) -> Result<(Messages, u64)>;
    async fn count(&self) -> Result<u64>;
    /// Removes every message whose id equals `id`; returns how many were removed.
    async fn delete_one(&self, id: &str) -> Result<u64>;
    async fn delete_all(&self) -> Result<u64>;
    /// First message whose id equals `id`, or [`crate::StorageError::NotFound`].
    async fn load(&self, id: &str) -> Result<Message>;
}

/// Storage backend partitioned by tenant.
#[async_trait]
pub trait MultiTenantStorage: Send + Sync {
    async fn store(&self, message: &Message, tenant: &Tenant) -> Result<String>;
    async fn list(&self, start: usize, limit: usize, tenant: &Tenant) -> Result<Messages>;
    async fn search(
        &self,
        kind: SearchKind,
        query: &str,
        start: usize,
        limit: usize,
        tenant: &Tenant,
    ) -> Result<(Messages, u64)>;
    async fn count(&self, tenant: &Tenant) -> Result<u64>;
    async fn delete_one(&self, id: &str, tenant: &Tenant) -> Result<u64>;
    async fn delete_all(&self, tenant: &Tenant) -> Result<u64>;
    async fn load(&self, id: &str, tenant: &Tenant) -> Result<Message>;
}
