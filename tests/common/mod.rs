#![allow(dead_code)]

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use std::sync::Arc;
use stocklot::{
    db::{self, DbPool},
    entities::product::{self, ProductType},
    events::{self, EventSender},
    services::{inventory_ledger::ReceiveLot, AppServices},
};
use tokio::sync::{mpsc, OnceCell};
use uuid::Uuid;

static POOL: OnceCell<Arc<DbPool>> = OnceCell::const_new();

/// Shared in-memory SQLite pool for one test binary, migrated once.
/// Tests isolate themselves by operating on distinct tenant ids.
pub async fn test_pool() -> Arc<DbPool> {
    POOL.get_or_init(|| async {
        std::env::set_var("APP__DATABASE_URL", "sqlite::memory:?cache=shared");
        // A single connection serializes writers; SQLite's shared-cache mode
        // returns "table is locked" under concurrent writes otherwise.
        std::env::set_var("APP__DB_MAX_CONNECTIONS", "1");
        std::env::set_var("APP__DB_MIN_CONNECTIONS", "1");
        let pool = Arc::new(
            db::create_db_pool()
                .await
                .expect("failed to create test database"),
        );
        db::run_migrations(pool.as_ref())
            .await
            .expect("failed to run migrations in tests");
        pool
    })
    .await
    .clone()
}

/// Engine services over the shared pool plus the receiver of the
/// notification channel the orchestrator publishes to.
pub async fn test_services() -> (AppServices, mpsc::Receiver<events::Event>, Arc<DbPool>) {
    let pool = test_pool().await;
    let (event_sender, rx) = events::event_channel(64);
    let services = AppServices::build(pool.clone(), Arc::new(event_sender));
    (services, rx, pool)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub async fn create_product(
    pool: &DbPool,
    tenant_id: Uuid,
    sku: &str,
    name: &str,
    product_type: ProductType,
) -> product::Model {
    let now = Utc::now();
    let model = product::ActiveModel {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(tenant_id),
        sku: Set(sku.to_string()),
        name: Set(name.to_string()),
        product_type: Set(product_type.to_string()),
        unit_of_measure: Set(None),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };
    model.insert(pool).await.expect("failed to create product")
}

/// Receives one lot for a product, creating the inventory on first call.
pub async fn receive_lot(
    services: &AppServices,
    tenant_id: Uuid,
    product: &product::Model,
    lot_number: &str,
    quantity: Decimal,
    received: NaiveDate,
    expiration: Option<NaiveDate>,
) {
    services
        .ledger
        .receive_lot(
            tenant_id,
            product.id,
            &product.sku,
            ReceiveLot {
                lot_number: lot_number.to_string(),
                quantity,
                received_date: received,
                expiration_date: expiration,
                cost_price: dec!(2.50),
            },
        )
        .await
        .expect("failed to receive lot");
}

/// An EventSender wired to a drained dummy channel, for tests that do not
/// inspect notifications.
pub fn discard_events() -> Arc<EventSender> {
    let (sender, mut rx) = events::event_channel(64);
    tokio::spawn(async move { while rx.recv().await.is_some() {} });
    Arc::new(sender)
}
