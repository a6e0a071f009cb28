//! Periodic purge of expired token blacklist entries

mod common;

use std::sync::Arc;
use std::time::Duration;

use blog_service::db::TokenBlacklist;
use blog_service::jobs::run_blacklist_purge;
use chrono::Utc;
use common::InMemoryStore;
use uuid::Uuid;

#[actix_web::test]
async fn purge_runs_on_every_tick_until_shutdown() {
    let store = InMemoryStore::new();
    let live = Uuid::new_v4();
    store
        .blacklist(Uuid::new_v4(), 1, Utc::now() - chrono::Duration::hours(1))
        .await
        .unwrap();
    store
        .blacklist(live, 1, Utc::now() + chrono::Duration::hours(1))
        .await
        .unwrap();

    let (shutdown, _) = tokio::sync::broadcast::channel(1);
    let handle = tokio::spawn(run_blacklist_purge(
        Arc::new(store.clone()),
        Duration::from_millis(10),
        shutdown.subscribe(),
    ));

    // first tick fires immediately
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.blacklist_len(), 1);
    assert!(store.is_blacklisted(live).await.unwrap());

    // entries that expire while the server runs are picked up later
    store
        .blacklist(Uuid::new_v4(), 2, Utc::now() - chrono::Duration::seconds(1))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.blacklist_len(), 1);

    shutdown.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("purge loop stops on shutdown")
        .unwrap();
}
