use std::sync::atomic::Ordering;
use std::time::Duration;

use super::*;
use crate::fakes::{status_error, FakeMarketplace, MemoryStore};

fn settings() -> TokenSettings {
    TokenSettings {
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        scopes: vec!["https://api.ebay.com/oauth/api_scope/sell.inventory".to_string()],
        safety_margin: chrono::Duration::seconds(60),
    }
}

fn manager() -> (
    TokenManager<FakeMarketplace, MemoryStore>,
    Arc<FakeMarketplace>,
    MemoryStore,
) {
    let exchange = Arc::new(FakeMarketplace::default());
    let store = MemoryStore::default();
    let manager = TokenManager::new(
        Arc::clone(&exchange),
        store.clone(),
        settings(),
        RetryPolicy::new(3, Duration::ZERO),
    );
    (manager, exchange, store)
}

#[tokio::test]
async fn starts_without_a_token() {
    let (manager, _, _) = manager();
    assert!(manager.needs_token().await);
}

#[tokio::test]
async fn access_token_exchanges_once_and_caches() {
    let (manager, exchange, _) = manager();

    assert_eq!(manager.access_token().await.unwrap(), "tok-1");
    assert_eq!(manager.access_token().await.unwrap(), "tok-1");

    assert_eq!(exchange.token_requests.load(Ordering::SeqCst), 1);
    assert!(!manager.needs_token().await);
}

#[tokio::test]
async fn obtained_token_is_persisted() {
    let (manager, _, store) = manager();
    let token = manager.obtain_token(&settings().scopes).await.unwrap();

    let stored = store.stored_token().expect("token should be persisted");
    assert_eq!(stored, token);
    assert!(stored.expires_at > Utc::now() + chrono::Duration::seconds(7000));
}

#[tokio::test]
async fn token_inside_safety_margin_is_refreshed() {
    let (manager, exchange, _) = manager();
    exchange.token_expires_in.store(30, Ordering::SeqCst);

    assert_eq!(manager.access_token().await.unwrap(), "tok-1");
    assert!(manager.needs_token().await);

    exchange.token_expires_in.store(7200, Ordering::SeqCst);
    assert_eq!(manager.access_token().await.unwrap(), "tok-2");
    assert!(!manager.needs_token().await);
}

#[tokio::test]
async fn restore_reuses_a_valid_persisted_token() {
    let (manager, exchange, store) = manager();
    store.set_token(AuthToken::issued_at("persisted".to_string(), Utc::now(), 3600).unwrap());

    assert!(manager.restore().await.unwrap());
    assert_eq!(manager.access_token().await.unwrap(), "persisted");
    assert_eq!(exchange.token_requests.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn restore_ignores_an_expiring_persisted_token() {
    let (manager, _, store) = manager();
    store.set_token(AuthToken::issued_at("stale".to_string(), Utc::now(), 30).unwrap());

    assert!(!manager.restore().await.unwrap());
    assert!(manager.needs_token().await);
}

#[tokio::test]
async fn invalidate_forces_a_new_exchange() {
    let (manager, exchange, _) = manager();
    manager.access_token().await.unwrap();
    manager.invalidate().await;

    assert!(manager.needs_token().await);
    assert_eq!(manager.access_token().await.unwrap(), "tok-2");
    assert_eq!(exchange.token_requests.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn rejected_credentials_fail_after_one_attempt() {
    let (manager, exchange, _) = manager();
    exchange.fail_next("token", status_error(401));

    let err = manager.access_token().await.unwrap_err();
    assert!(
        matches!(err, SyncError::Auth { attempts: 1, .. }),
        "got: {err:?}"
    );
    assert!(manager.needs_token().await);
}

#[tokio::test]
async fn transient_exchange_failures_are_retried() {
    let (manager, exchange, _) = manager();
    exchange.fail_next("token", status_error(503));
    exchange.fail_next("token", status_error(503));

    assert_eq!(manager.access_token().await.unwrap(), "tok-3");
    assert_eq!(exchange.token_requests.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn persistence_failure_does_not_fail_the_exchange() {
    let (manager, _, store) = manager();
    store.fail_writes();

    assert_eq!(manager.access_token().await.unwrap(), "tok-1");
    assert!(store.stored_token().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_share_one_exchange() {
    let (manager, exchange, _) = manager();
    let manager = Arc::new(manager);

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.access_token().await })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), "tok-1");
    }

    assert_eq!(exchange.token_requests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn out_of_range_expiry_is_an_auth_error() {
    let (manager, exchange, store) = manager();
    exchange.token_expires_in.store(i64::MAX, Ordering::SeqCst);

    let err = manager.access_token().await.unwrap_err();
    assert!(
        matches!(
            err,
            SyncError::Auth {
                source: MarketplaceError::InvalidField { field: "expires_in", .. },
                ..
            }
        ),
        "expected Auth(InvalidField), got: {err:?}"
    );
    assert!(store.stored_token().is_none());
    assert!(manager.needs_token().await);

    exchange.token_expires_in.store(7200, Ordering::SeqCst);
    assert_eq!(manager.access_token().await.unwrap(), "tok-2");
}

#[test]
fn oversized_safety_margin_is_clamped() {
    assert_eq!(safety_margin(60), TimeDelta::seconds(60));
    assert_eq!(safety_margin(u64::MAX), TimeDelta::seconds(86_400));
}
