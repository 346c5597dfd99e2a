//! Live integration tests for dropship-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/dropship-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use chrono::{DateTime, Duration, DurationRound, Utc};
use dropship_core::{AuthToken, SyncRecord};
use dropship_db::{
    get_sync_record, list_sync_records, load_token, save_token, update_sync_quantity,
    upsert_sync_record, DbError, MARKETPLACE_TOKEN_PROVIDER,
};
use rust_decimal::Decimal;

fn make_record(id: &str, price_cents: i64, quantity: i32) -> SyncRecord {
    SyncRecord {
        supplier_product_id: id.to_string(),
        sku: format!("ALI-{id}"),
        title: format!("Sim Product {id}"),
        marketplace_listing_id: Some(format!("offer-{id}")),
        price: Decimal::new(price_cents, 2),
        quantity,
        last_synced_at: now_micros(),
        raw_snapshot: serde_json::json!({"canonical": {"id": id}, "raw": {}}),
    }
}

/// Postgres keeps microseconds; truncate so round-trips compare equal.
fn now_micros() -> DateTime<Utc> {
    let now = Utc::now();
    now.duration_trunc(Duration::microseconds(1)).unwrap_or(now)
}

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_then_get_returns_record(pool: sqlx::PgPool) {
    let record = make_record("123456", 1299, 50);
    upsert_sync_record(&pool, &record).await.unwrap();

    let stored = get_sync_record(&pool, "123456")
        .await
        .unwrap()
        .expect("record should exist");
    assert_eq!(stored, record);
}

#[sqlx::test(migrations = "../../migrations")]
async fn second_upsert_overwrites_first(pool: sqlx::PgPool) {
    upsert_sync_record(&pool, &make_record("1", 1000, 5))
        .await
        .unwrap();
    let newer = make_record("1", 1299, 9);
    upsert_sync_record(&pool, &newer).await.unwrap();

    let all = list_sync_records(&pool).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].price, Decimal::new(1299, 2));
    assert_eq!(all[0].quantity, 9);
}

#[sqlx::test(migrations = "../../migrations")]
async fn get_missing_record_is_none(pool: sqlx::PgPool) {
    assert!(get_sync_record(&pool, "nope").await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_is_ordered_by_product_id(pool: sqlx::PgPool) {
    for id in ["300", "100", "200"] {
        upsert_sync_record(&pool, &make_record(id, 100, 1))
            .await
            .unwrap();
    }
    let ids: Vec<String> = list_sync_records(&pool)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.supplier_product_id)
        .collect();
    assert_eq!(ids, vec!["100", "200", "300"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_quantity_touches_only_quantity_and_timestamp(pool: sqlx::PgPool) {
    let record = make_record("1", 1299, 50);
    upsert_sync_record(&pool, &record).await.unwrap();

    let later = record.last_synced_at + Duration::hours(6);
    update_sync_quantity(&pool, "1", 3, later).await.unwrap();

    let stored = get_sync_record(&pool, "1").await.unwrap().unwrap();
    assert_eq!(stored.quantity, 3);
    assert_eq!(stored.last_synced_at, later);
    assert_eq!(stored.price, record.price);
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_quantity_of_missing_record_is_not_found(pool: sqlx::PgPool) {
    let err = update_sync_quantity(&pool, "missing", 1, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound), "got: {err:?}");
}

#[sqlx::test(migrations = "../../migrations")]
async fn token_round_trips_and_is_replaced(pool: sqlx::PgPool) {
    assert!(load_token(&pool, MARKETPLACE_TOKEN_PROVIDER)
        .await
        .unwrap()
        .is_none());

    let now = now_micros();
    let first = AuthToken::issued_at("first".to_string(), now, 7200).unwrap();
    save_token(&pool, MARKETPLACE_TOKEN_PROVIDER, &first)
        .await
        .unwrap();
    let second = AuthToken::issued_at("second".to_string(), now, 3600).unwrap();
    save_token(&pool, MARKETPLACE_TOKEN_PROVIDER, &second)
        .await
        .unwrap();

    let loaded = load_token(&pool, MARKETPLACE_TOKEN_PROVIDER)
        .await
        .unwrap()
        .expect("token should be stored");
    assert_eq!(loaded, second);
}
