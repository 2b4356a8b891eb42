//! Tenant identifier.
//!
//! A tenant selects the collection its messages live in, so the name is validated
//! before it can reach a query: 1-64 ASCII alphanumerics, `_` or `-`, and never a
//! `sqlite_` prefix.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Longest accepted tenant name.
pub const MAX_TENANT_LEN: usize = 64;

const RESERVED_PREFIX: &str = "sqlite_";

/// Validated tenant name. One collection per tenant, named exactly like it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tenant(String);

impl Tenant {
    /// Validates `name` and wraps it.
    pub fn new(name: impl Into<String>) -> Result<Self, StorageError> {
        let name = name.into();
        validate_identifier(&name).map_err(StorageError::InvalidTenant)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Checks that `name` is safe to embed in a quoted collection name.
///
/// Shared by tenants and by the configured database/collection names.
pub(crate) fn validate_identifier(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name is empty".to_string());
    }
    if name.len() > MAX_TENANT_LEN {
        return Err(format!(
            "'{}' is longer than {} characters",
            name, MAX_TENANT_LEN
        ));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(format!("'{}' contains invalid character {:?}", name, c));
    }
    if name.to_ascii_lowercase().starts_with(RESERVED_PREFIX) {
        return Err(format!("'{}' uses the reserved prefix '{}'", name, RESERVED_PREFIX));
    }
    Ok(())
}

impl fmt::Display for Tenant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Tenant {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Tenant {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Tenant {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Tenant {
    type Error = StorageError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Tenant> for String {
    fn from(tenant: Tenant) -> Self {
        tenant.0
    }
}
