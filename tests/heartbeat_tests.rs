//! Integration tests for heartbeat recording, deduplication and queries.

use beatlog::config::SecurityConfig;
use beatlog::models::{GroupBy, HeartbeatBatch, HeartbeatFilter, NewHeartbeat, PasswordDigest};
use beatlog::services::{HeartbeatError, HeartbeatService, SeaOrmHeartbeatService};
use beatlog::{Store, User};
use chrono::{Duration, TimeZone, Utc};
use uuid::Uuid;

async fn spawn_store() -> (Store, User) {
    let store = Store::new("sqlite::memory:")
        .await
        .expect("Failed to open in-memory store");

    let security = SecurityConfig {
        argon2_memory_cost_kib: 1024,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
    };
    let digest = PasswordDigest::hash("password123", &security).unwrap();
    let user = store.create_user("alice", digest).await.unwrap();

    (store, user)
}

fn beat(hash: &str) -> NewHeartbeat {
    NewHeartbeat {
        entity: "app1".to_string(),
        kind: "visit".to_string(),
        category: "browsing".to_string(),
        browser: "firefox".to_string(),
        domain: "example.com".to_string(),
        path: "/".to_string(),
        user_agent: "Mozilla/5.0 (X11; Linux x86_64)".to_string(),
        time: Some(Utc::now()),
        hash: hash.to_string(),
    }
}

fn on_domain(hash: &str, domain: &str) -> NewHeartbeat {
    NewHeartbeat {
        domain: domain.to_string(),
        ..beat(hash)
    }
}

#[tokio::test]
async fn test_record_assigns_id_and_created_at() {
    let (store, user) = spawn_store().await;
    let service = SeaOrmHeartbeatService::new(store);

    let before = Utc::now();
    let first = service.record(user.id, beat("h1")).await.unwrap();
    let second = service.record(user.id, beat("h2")).await.unwrap();

    assert_eq!(first.user_id, user.id);
    assert_eq!(first.entity, "app1");
    assert_eq!(first.id.len(), 32);
    assert_ne!(first.id, second.id);
    assert!(first.created_at >= before - Duration::seconds(1));
}

#[tokio::test]
async fn test_created_at_is_independent_of_event_time() {
    let (store, user) = spawn_store().await;
    let service = SeaOrmHeartbeatService::new(store);

    let reported = Utc.with_ymd_and_hms(2020, 1, 1, 12, 0, 0).unwrap();
    let stored = service
        .record(
            user.id,
            NewHeartbeat {
                time: Some(reported),
                ..beat("h1")
            },
        )
        .await
        .unwrap();

    assert_eq!(stored.time, Some(reported));
    assert!(stored.created_at > reported);

    let untimed = service
        .record(
            user.id,
            NewHeartbeat {
                time: None,
                ..beat("h2")
            },
        )
        .await
        .unwrap();
    assert_eq!(untimed.time, None);
}

#[tokio::test]
async fn test_duplicate_hash_conflicts() {
    let (store, user) = spawn_store().await;
    let service = SeaOrmHeartbeatService::new(store.clone());

    service.record(user.id, beat("h1")).await.unwrap();

    let err = service.record(user.id, beat("h1")).await.unwrap_err();
    assert!(matches!(err, HeartbeatError::Conflict(ref h) if h == "h1"), "got {err:?}");

    let filter = HeartbeatFilter::for_user(user.id);
    assert_eq!(service.count(&filter).await.unwrap(), 1);
    assert!(service.find_by_hash("h1").await.unwrap().is_some());
}

#[tokio::test]
async fn test_concurrent_duplicates_commit_once() {
    let (store, user) = spawn_store().await;
    let service = SeaOrmHeartbeatService::new(store);

    let (a, b) = tokio::join!(
        service.record(user.id, beat("race")),
        service.record(user.id, beat("race")),
    );

    assert_eq!(usize::from(a.is_ok()) + usize::from(b.is_ok()), 1);
    assert!(matches!(
        a.err().or(b.err()),
        Some(HeartbeatError::Conflict(_))
    ));
    assert_eq!(service.count(&HeartbeatFilter::default()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_unknown_user_is_foreign_key_error() {
    let (store, _) = spawn_store().await;
    let service = SeaOrmHeartbeatService::new(store);

    let stranger = Uuid::new_v4();
    let err = service.record(stranger, beat("h1")).await.unwrap_err();
    assert!(matches!(err, HeartbeatError::ForeignKey(id) if id == stranger), "got {err:?}");

    assert_eq!(service.count(&HeartbeatFilter::default()).await.unwrap(), 0);
    assert!(service.find_by_hash("h1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_blank_hash_is_rejected() {
    let (store, user) = spawn_store().await;
    let service = SeaOrmHeartbeatService::new(store);

    let err = service.record(user.id, beat("")).await.unwrap_err();
    assert!(matches!(err, HeartbeatError::Validation(_)));
}

#[tokio::test]
async fn test_alice_scenario() {
    let (store, user) = spawn_store().await;
    let service = SeaOrmHeartbeatService::new(store);

    let stored = service.record(user.id, beat("h1")).await.unwrap();
    assert_eq!(stored.hash, "h1");

    assert!(matches!(
        service.record(user.id, beat("h1")).await,
        Err(HeartbeatError::Conflict(_))
    ));

    let page = service
        .list(&HeartbeatFilter::default(), 1, 50)
        .await
        .unwrap();
    assert_eq!(page.items.iter().filter(|b| b.hash == "h1").count(), 1);
}

#[tokio::test]
async fn test_batch_skips_duplicates() {
    let (store, user) = spawn_store().await;
    let service = SeaOrmHeartbeatService::new(store);

    service.record(user.id, beat("h1")).await.unwrap();

    let outcome = service
        .record_batch(HeartbeatBatch {
            trace_id: Uuid::new_v4(),
            user_id: user.id,
            list: vec![beat("h1"), beat("h2"), beat("h2"), beat("h3")],
        })
        .await
        .unwrap();

    assert_eq!(outcome.inserted, 2);
    assert_eq!(outcome.duplicates, 2);
    assert_eq!(service.count(&HeartbeatFilter::default()).await.unwrap(), 3);
}

#[tokio::test]
async fn test_batch_for_unknown_user_inserts_nothing() {
    let (store, _) = spawn_store().await;
    let service = SeaOrmHeartbeatService::new(store);

    let stranger = Uuid::new_v4();
    let err = service
        .record_batch(HeartbeatBatch {
            trace_id: Uuid::new_v4(),
            user_id: stranger,
            list: vec![beat("h1"), beat("h2")],
        })
        .await
        .unwrap_err();

    assert!(matches!(err, HeartbeatError::ForeignKey(id) if id == stranger));
    assert_eq!(service.count(&HeartbeatFilter::default()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_batch_for_unknown_user_with_stored_hashes_is_foreign_key_error() {
    let (store, user) = spawn_store().await;
    let service = SeaOrmHeartbeatService::new(store);

    service.record(user.id, beat("h1")).await.unwrap();

    let stranger = Uuid::new_v4();
    let err = service
        .record_batch(HeartbeatBatch {
            trace_id: Uuid::new_v4(),
            user_id: stranger,
            list: vec![beat("h1")],
        })
        .await
        .unwrap_err();

    assert!(matches!(err, HeartbeatError::ForeignKey(id) if id == stranger));
    assert_eq!(service.count(&HeartbeatFilter::default()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_large_batch_is_split_across_statements() {
    let (store, user) = spawn_store().await;
    let service = SeaOrmHeartbeatService::new(store);

    service.record(user.id, beat("h0")).await.unwrap();

    let list = (0..3000).map(|i| beat(&format!("h{i}"))).collect();
    let outcome = service
        .record_batch(HeartbeatBatch {
            trace_id: Uuid::new_v4(),
            user_id: user.id,
            list,
        })
        .await
        .unwrap();

    assert_eq!(outcome.inserted, 2999);
    assert_eq!(outcome.duplicates, 1);
    assert_eq!(
        service.count(&HeartbeatFilter::default()).await.unwrap(),
        3000
    );
    assert!(service.find_by_hash("h2999").await.unwrap().is_some());
}

#[tokio::test]
async fn test_empty_batch_is_noop() {
    let (store, user) = spawn_store().await;
    let service = SeaOrmHeartbeatService::new(store);

    let outcome = service
        .record_batch(HeartbeatBatch {
            trace_id: Uuid::new_v4(),
            user_id: user.id,
            list: vec![],
        })
        .await
        .unwrap();

    assert_eq!(outcome.inserted, 0);
    assert_eq!(outcome.duplicates, 0);
}

#[tokio::test]
async fn test_list_filters_and_paginates() {
    let (store, user) = spawn_store().await;
    let service = SeaOrmHeartbeatService::new(store);

    let base = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
    for i in 0..5 {
        let domain = if i % 2 == 0 { "a.com" } else { "b.com" };
        service
            .record(
                user.id,
                NewHeartbeat {
                    time: Some(base + Duration::minutes(i)),
                    ..on_domain(&format!("h{i}"), domain)
                },
            )
            .await
            .unwrap();
    }

    let all = HeartbeatFilter::for_user(user.id);
    let first = service.list(&all, 1, 2).await.unwrap();
    assert_eq!(first.total_pages, 3);
    assert_eq!(first.items.len(), 2);
    assert_eq!(first.items[0].hash, "h4");
    assert_eq!(first.items[1].hash, "h3");

    let last = service.list(&all, 3, 2).await.unwrap();
    assert_eq!(last.items.len(), 1);
    assert_eq!(last.items[0].hash, "h0");

    let by_domain = HeartbeatFilter {
        domain: Some("a.com".to_string()),
        ..HeartbeatFilter::for_user(user.id)
    };
    assert_eq!(service.count(&by_domain).await.unwrap(), 3);

    let window = HeartbeatFilter {
        since: Some(base + Duration::minutes(1)),
        until: Some(base + Duration::minutes(3)),
        ..HeartbeatFilter::for_user(user.id)
    };
    let page = service.list(&window, 1, 10).await.unwrap();
    let hashes: Vec<&str> = page.items.iter().map(|b| b.hash.as_str()).collect();
    assert_eq!(hashes, vec!["h3", "h2", "h1"]);

    assert!(matches!(
        service.list(&all, 1, 0).await,
        Err(HeartbeatError::Validation(_))
    ));
}

#[tokio::test]
async fn test_count_by_domain() {
    let (store, user) = spawn_store().await;
    let service = SeaOrmHeartbeatService::new(store);

    for (hash, domain) in [("h1", "a.com"), ("h2", "b.com"), ("h3", "a.com"), ("h4", "a.com")] {
        service.record(user.id, on_domain(hash, domain)).await.unwrap();
    }

    let counts = service.count_by(user.id, GroupBy::Domain).await.unwrap();
    assert_eq!(
        counts,
        vec![("a.com".to_string(), 3), ("b.com".to_string(), 1)]
    );

    let by_browser = service.count_by(user.id, GroupBy::Browser).await.unwrap();
    assert_eq!(by_browser, vec![("firefox".to_string(), 4)]);
}

#[tokio::test]
async fn test_deleting_user_cascades_to_heartbeats() {
    let (store, user) = spawn_store().await;
    let service = SeaOrmHeartbeatService::new(store.clone());

    service.record(user.id, beat("h1")).await.unwrap();
    store.delete_user(user.id).await.unwrap();

    assert!(service.find_by_hash("h1").await.unwrap().is_none());
}
