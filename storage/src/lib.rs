//! Multi-tenant persistence for captured email messages.
//!
//! Messages are stored as documents, one collection per tenant. Backends implement
//! [`MultiTenantStorage`]; [`scoped_storage`] turns one into a single-tenant [`Storage`].
//!
//! ## Modules
//!
//! - [`error`] – Storage error types
//! - [`tenant`] – Validated tenant identifier
//! - [`models`] – Message document, SearchKind
//! - [`storage`] – Storage and MultiTenantStorage traits
//! - [`document_db`] – Document collections on SQLite
//! - [`multi_tenant`] – MultiTenantDocumentStore (document database)
//! - [`inmemory`] – InMemoryStorage
//! - [`scoped`] – TenantScopedStorage
//! - [`config`] – StorageConfig from env

pub mod config;
pub mod document_db;
pub mod error;
pub mod inmemory;
pub mod models;
pub mod multi_tenant;
pub mod scoped;
pub mod storage;
pub mod tenant;


pub use config::StorageConfig;
pub use error::{Result, StorageError};
pub use inmemory::InMemoryStorage;
pub use models::{
    search_regex, Content, Message, Messages, MimeBody, Path, SearchKind, SmtpMessage,
};
pub use multi_tenant::{MultiTenantDocumentStore, StoreOptions};
pub use scoped::{scoped_storage, TenantScopedStorage};
pub use storage::{MultiTenantStorage, Storage};
pub use tenant::Tenant;
