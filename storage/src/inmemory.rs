//! # In-memory message storage
//!
//! [`MultiTenantStorage`] kept in a `HashMap<Tenant, Vec<Message>>`. Intended for tests
//! and local development; data is lost on restart. Ordering, projection, search and
//! delete semantics are the same as [`crate::MultiTenantDocumentStore`].
//!
//! The map sits behind `Arc<RwLock<>>`, so clones share the same messages.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::error::{Result, StorageError};
use crate::models::{search_regex, Message, Messages, SearchKind};
use crate::storage::MultiTenantStorage;
use crate::tenant::Tenant;

#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    tenants: Arc<RwLock<HashMap<Tenant, Vec<Message>>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tenants holding at least one message, sorted.
    pub async fn tenants(&self) -> Vec<Tenant> {
        let tenants = self.tenants.read().await;
        let mut names: Vec<Tenant> = tenants
            .iter()
            .filter(|(_, messages)| !messages.is_empty())
            .map(|(tenant, _)| tenant.clone())
            .collect();
        names.sort();
        names
    }

    fn page<'a>(
        messages: impl Iterator<Item = &'a Message>,
        start: usize,
        limit: usize,
    ) -> Messages {
        let limit = if limit == 0 { usize::MAX } else { limit };
        messages
            .skip(start)
            .take(limit)
            .cloned()
            .map(Message::projected)
            .collect()
    }

    /// Newest first; among equal timestamps the later insert comes first.
    fn newest_first(messages: &[Message]) -> Vec<&Message> {
        let mut sorted: Vec<&Message> = messages.iter().rev().collect();
        sorted.sort_by(|a, b| b.created.cmp(&a.created));
        sorted
    }
}

fn matches(message: &Message, kind: SearchKind, pattern: &Regex) -> bool {
    let Some(raw) = &message.raw else {
        return false;
    };
    match kind {
        SearchKind::To => raw.to.iter().any(|to| pattern.is_match(to)),
        SearchKind::From => pattern.is_match(&raw.from),
        SearchKind::Containing => pattern.is_match(&raw.data),
    }
}

#[async_trait]
impl MultiTenantStorage for InMemoryStorage {
    async fn store(&self, message: &Message, tenant: &Tenant) -> Result<String> {
        let mut tenants = self.tenants.write().await;
        tenants
            .entry(tenant.clone())
            .or_default()
            .push(message.clone());
        info!(tenant = %tenant, id = %message.id, "Stored message in memory");
        Ok(message.id.clone())
    }

    async fn list(&self, start: usize, limit: usize, tenant: &Tenant) -> Result<Messages> {
        let tenants = self.tenants.read().await;
        let Some(messages) = tenants.get(tenant) else {
            return Ok(Messages::new());
        };
        Ok(Self::page(
            Self::newest_first(messages).into_iter(),
            start,
            limit,
        ))
    }

    async fn search(
        &self,
        kind: SearchKind,
        query: &str,
        start: usize,
        limit: usize,
        tenant: &Tenant,
    ) -> Result<(Messages, u64)> {
        let pattern = search_regex(query).map_err(|e| {
            error!(error = %e, tenant = %tenant, "Rejected search pattern");
            e
        })?;
        let tenants = self.tenants.read().await;
        let Some(messages) = tenants.get(tenant) else {
            return Ok((Messages::new(), 0));
        };
        let hits: Vec<&Message> = Self::newest_first(messages)
            .into_iter()
            .filter(|m| matches(m, kind, &pattern))
            .collect();
        let count = hits.len() as u64;
        Ok((Self::page(hits.into_iter(), start, limit), count))
    }

    async fn count(&self, tenant: &Tenant) -> Result<u64> {
        let tenants = self.tenants.read().await;
        Ok(tenants.get(tenant).map_or(0, |m| m.len() as u64))
    }

    async fn delete_one(&self, id: &str, tenant: &Tenant) -> Result<u64> {
        let mut tenants = self.tenants.write().await;
        let Some(messages) = tenants.get_mut(tenant) else {
            return Ok(0);
        };
        let before = messages.len();
        messages.retain(|m| m.id != id);
        let removed = (before - messages.len()) as u64;
        info!(tenant = %tenant, id = %id, removed, "Deleted message from memory");
        Ok(removed)
    }

    async fn delete_all(&self, tenant: &Tenant) -> Result<u64> {
        let mut tenants = self.tenants.write().await;
        let removed = tenants.remove(tenant).map_or(0, |m| m.len() as u64);
        info!(tenant = %tenant, removed, "Deleted all messages from memory");
        Ok(removed)
    }

    async fn load(&self, id: &str, tenant: &Tenant) -> Result<Message> {
        let tenants = self.tenants.read().await;
        tenants
            .get(tenant)
            .and_then(|messages| messages.iter().find(|m| m.id == id))
            .cloned()
            .ok_or_else(|| {
                error!(tenant = %tenant, id = %id, "Error loading message: not found");
                StorageError::NotFound(format!("message {} in tenant {}", id, tenant))
            })
    }
}
