//! Behavior shared by every [`MultiTenantStorage`] backend.
//!
//! Each test runs against the document store (SQLite file in a temp dir) and the
//! in-memory store.

mod common;

use common::{backends, message_to, tenant};
use mail_storage::{SearchKind, StorageError};

/// **Setup:** Store one message per backend.
/// **Expected:** `load` by its id returns an equal message.
#[tokio::test]
async fn test_store_then_load_round_trips() {
    let (_dir, backends) = backends().await;
    let acme = tenant("acme");

    for (name, storage) in backends {
        let message = message_to("someone@example.com", 1);
        let id = storage.store(&message, &acme).await.expect("store");
        assert_eq!(id, message.id, "{}", name);
        let loaded = storage.load(&id, &acme).await.expect("load");
        assert_eq!(loaded, message, "{}", name);
    }
}

/// **Setup:** Store N messages, then delete all.
/// **Expected:** count is N, then 0.
#[tokio::test]
async fn test_count_matches_stored_then_zero_after_delete_all() {
    let (_dir, backends) = backends().await;
    let acme = tenant("acme");

    for (name, storage) in backends {
        for minute in 0..4 {
            storage
                .store(&message_to("x@example.com", minute), &acme)
                .await
                .unwrap();
        }
        assert_eq!(storage.count(&acme).await.unwrap(), 4, "{}", name);
        assert_eq!(storage.delete_all(&acme).await.unwrap(), 4, "{}", name);
        assert_eq!(storage.count(&acme).await.unwrap(), 0, "{}", name);
    }
}

/// **Setup:** Store messages with shuffled creation times.
/// **Expected:** `list(0, limit)` is ordered by non-increasing `created`.
#[tokio::test]
async fn test_list_orders_by_created_descending() {
    let (_dir, backends) = backends().await;
    let acme = tenant("acme");

    for (name, storage) in backends {
        for minute in [4, 0, 8, 2, 6, 6] {
            storage
                .store(&message_to("x@example.com", minute), &acme)
                .await
                .unwrap();
        }
        let listed = storage.list(0, 4, &acme).await.unwrap();
        assert_eq!(listed.len(), 4, "{}", name);
        for pair in listed.windows(2) {
            assert!(pair[0].created >= pair[1].created, "{}", name);
        }
        assert!(listed.iter().all(|m| m.content.body.is_empty()), "{}", name);
    }
}

/// **Setup:** Tenant "acme" holds to-fields "a@x.com", "b@x.com", "a@y.com".
/// **Action:** `search(To, "a@", 0, 10)`.
/// **Expected:** The two "a@..." messages, count 2; `count` is 3.
#[tokio::test]
async fn test_search_to_scenario() {
    let (_dir, backends) = backends().await;
    let acme = tenant("acme");

    for (name, storage) in backends {
        let mut expected = Vec::new();
        for (minute, to) in ["a@x.com", "b@x.com", "a@y.com"].into_iter().enumerate() {
            let message = message_to(to, minute as i64);
            if to.starts_with("a@") {
                expected.push(message.id.clone());
            }
            storage.store(&message, &acme).await.unwrap();
        }

        let (found, count) = storage
            .search(SearchKind::To, "a@", 0, 10, &acme)
            .await
            .unwrap();
        assert_eq!(count, 2, "{}", name);
        let mut ids: Vec<_> = found.iter().map(|m| m.id.clone()).collect();
        ids.sort();
        expected.sort();
        assert_eq!(ids, expected, "{}", name);
        for message in &found {
            let raw = message.raw.as_ref().unwrap();
            assert!(raw.to.iter().any(|to| to.to_lowercase().contains("a@")), "{}", name);
        }

        assert_eq!(storage.count(&acme).await.unwrap(), 3, "{}", name);
    }
}

/// **Expected:** Search count is the total across pages regardless of `limit`.
#[tokio::test]
async fn test_search_count_ignores_limit() {
    let (_dir, backends) = backends().await;
    let acme = tenant("acme");

    for (name, storage) in backends {
        for minute in 0..5 {
            storage
                .store(&message_to("Ops@Example.com", minute), &acme)
                .await
                .unwrap();
        }
        for limit in [1, 2, 5, 50] {
            let (page, count) = storage
                .search(SearchKind::To, "ops@example", 0, limit, &acme)
                .await
                .unwrap();
            assert_eq!(count, 5, "{} limit {}", name, limit);
            assert_eq!(page.len(), limit.min(5), "{} limit {}", name, limit);
        }
    }
}

/// **Setup:** The same message id exists under "acme" and "globex".
/// **Action:** `delete_one(id, acme)`.
/// **Expected:** Gone from acme, untouched in globex.
#[tokio::test]
async fn test_delete_one_is_tenant_isolated() {
    let (_dir, backends) = backends().await;
    let acme = tenant("acme");
    let globex = tenant("globex");

    for (name, storage) in backends {
        let message = message_to("x@example.com", 1);
        storage.store(&message, &acme).await.unwrap();
        storage.store(&message, &globex).await.unwrap();

        assert_eq!(storage.delete_one(&message.id, &acme).await.unwrap(), 1, "{}", name);
        assert!(
            matches!(
                storage.load(&message.id, &acme).await,
                Err(StorageError::NotFound(_))
            ),
            "{}",
            name
        );
        assert_eq!(storage.load(&message.id, &globex).await.unwrap(), message, "{}", name);
        assert_eq!(storage.count(&globex).await.unwrap(), 1, "{}", name);
    }
}

/// **Setup:** Recipients "élodie@x.com" and "bob@y.org".
/// **Action:** Search `To` with non-ASCII case differences and regex syntax.
/// **Expected:** Every backend folds Unicode case and honors the pattern the same way.
#[tokio::test]
async fn test_search_folds_unicode_case_and_honors_regex() {
    let (_dir, backends) = backends().await;
    let acme = tenant("acme");

    for (name, storage) in backends {
        let elodie = message_to("élodie@x.com", 1);
        storage.store(&elodie, &acme).await.unwrap();
        storage.store(&message_to("bob@y.org", 2), &acme).await.unwrap();

        for query in ["ÉLODIE", "^élodie", "ÉLO.*@X\\.COM", "e.*x"] {
            let (found, count) = storage
                .search(SearchKind::To, query, 0, 10, &acme)
                .await
                .unwrap();
            assert_eq!(count, 1, "{} {}", name, query);
            assert_eq!(found[0].id, elodie.id, "{} {}", name, query);
        }

        for query in ["a.*x", "^x", "élodie$"] {
            let (_, count) = storage
                .search(SearchKind::To, query, 0, 10, &acme)
                .await
                .unwrap();
            assert_eq!(count, 0, "{} {}", name, query);
        }

        assert!(
            matches!(
                storage.search(SearchKind::To, "[", 0, 10, &acme).await,
                Err(StorageError::Query(_))
            ),
            "{}",
            name
        );
    }
}
