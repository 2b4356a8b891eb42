//! Shared helpers for storage integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use mail_storage::{
    Content, InMemoryStorage, Message, MultiTenantDocumentStore, MultiTenantStorage, Path,
    SmtpMessage, Tenant,
};
use tempfile::TempDir;

/// Returns a document store on a fresh SQLite file; keep the `TempDir` alive for the test.
pub async fn document_store() -> (TempDir, MultiTenantDocumentStore) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("mail.db");
    let store = MultiTenantDocumentStore::create(&path.to_string_lossy(), "mailhog", "messages")
        .await
        .expect("Failed to create document store");
    (dir, store)
}

/// Both backends, boxed behind the trait. The `TempDir` backs the document store.
pub async fn backends() -> (TempDir, Vec<(&'static str, Arc<dyn MultiTenantStorage>)>) {
    let (dir, store) = document_store().await;
    let backends: Vec<(&'static str, Arc<dyn MultiTenantStorage>)> = vec![
        ("document", Arc::new(store)),
        ("inmemory", Arc::new(InMemoryStorage::new())),
    ];
    (dir, backends)
}

pub fn tenant(name: &str) -> Tenant {
    Tenant::new(name).expect("valid tenant")
}

/// Message from `sender@example.com` to `to`, created `minute` minutes into 2024.
pub fn message_to(to: &str, minute: i64) -> Message {
    let data = format!("To: {}\r\nSubject: test {}\r\n\r\nbody {}", to, minute, minute);
    let mut headers = BTreeMap::new();
    headers.insert("To".to_string(), vec![to.to_string()]);
    let mut message = Message::new(
        Path::parse("sender@example.com"),
        vec![Path::parse(to)],
        Content::new(headers, format!("body {}", minute)),
        SmtpMessage {
            from: "sender@example.com".to_string(),
            to: vec![to.to_string()],
            data,
            helo: "mx.example.com".to_string(),
        },
    );
    message.created =
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() + Duration::minutes(minute);
    message
}
