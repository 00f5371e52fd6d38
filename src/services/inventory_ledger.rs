use crate::{
    db::DbPool,
    entities::{
        inventory::{self, Entity as Inventory},
        inventory_lot::{self, Entity as InventoryLot},
        inventory_movement::{self, Entity as InventoryMovement, MovementType},
    },
    errors::ServiceError,
};
use chrono::{NaiveDate, Utc};
use lazy_static::lazy_static;
use prometheus::{IntCounter, IntCounterVec, Opts};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

lazy_static! {
    static ref CONSUMABLE_DEDUCTIONS: IntCounter = IntCounter::new(
        "inventory_consumable_deductions_total",
        "Total number of consumable lot deductions"
    )
    .expect("metric can be created");
    static ref DEDUCTION_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "inventory_deduction_failures_total",
            "Total number of deduction anomalies"
        ),
        &["kind"]
    )
    .expect("metric can be created");
    static ref CONSUMABLE_RESTORATIONS: IntCounter = IntCounter::new(
        "inventory_consumable_restorations_total",
        "Total number of consumable lot restorations"
    )
    .expect("metric can be created");
}

/// One lot touched by an allocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationLine {
    pub lot_number: String,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub movement_id: Uuid,
}

/// Outcome of one allocation request. A shortfall is reported, never
/// raised: deduction is advisory and must not block the business
/// transaction that triggered it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationReport {
    pub requested: Decimal,
    pub allocated: Decimal,
    pub shortfall: Decimal,
    pub lines: Vec<AllocationLine>,
}

impl AllocationReport {
    fn skipped(requested: Decimal) -> Self {
        Self {
            requested,
            allocated: Decimal::ZERO,
            shortfall: requested,
            lines: Vec::new(),
        }
    }

    pub fn fully_allocated(&self) -> bool {
        self.shortfall.is_zero()
    }
}

/// Outcome of replaying an order's deduction movements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestorationReport {
    pub movements_found: usize,
    pub movements_restored: usize,
    /// Lot numbers that could not be restored because the lot no longer
    /// exists under its recorded number.
    pub skipped_lots: Vec<String>,
}

/// A lot entering the ledger through receiving.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiveLot {
    pub lot_number: String,
    pub quantity: Decimal,
    pub received_date: NaiveDate,
    pub expiration_date: Option<NaiveDate>,
    pub cost_price: Decimal,
}

/// Current state of one inventory document and its lots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventorySnapshot {
    pub inventory: inventory::Model,
    pub lots: Vec<inventory_lot::Model>,
}

/// Lot-based stock ledger with First-Expired-First-Out allocation.
#[derive(Clone)]
pub struct InventoryLedgerService {
    db_pool: Arc<DbPool>,
}

impl InventoryLedgerService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Deducts `quantity` of a product from its lots in FEFO order.
    ///
    /// Missing inventory and insufficient stock are warnings, not errors;
    /// lots are never driven negative. Each touched lot gets exactly one
    /// `consumable_deduction` movement tagged with the order and reason.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, product_id = %product_id, order_id = %order_id))]
    pub async fn allocate(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
        quantity: Decimal,
        order_id: Uuid,
        reason: &str,
        created_by: Option<Uuid>,
    ) -> Result<AllocationReport, ServiceError> {
        if quantity <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(format!(
                "Allocation quantity must be positive, got {}",
                quantity
            )));
        }

        let db = self.db_pool.as_ref();

        let Some(inventory) = Inventory::find()
            .filter(inventory::Column::TenantId.eq(tenant_id))
            .filter(inventory::Column::ProductId.eq(product_id))
            .one(db)
            .await?
        else {
            warn!(
                %tenant_id,
                %product_id,
                "No inventory found for consumable, skipping deduction"
            );
            DEDUCTION_FAILURES
                .with_label_values(&["inventory_missing"])
                .inc();
            return Ok(AllocationReport::skipped(quantity));
        };

        if inventory.total_quantity < quantity {
            warn!(
                %product_id,
                required = %quantity,
                available = %inventory.total_quantity,
                "Insufficient inventory for consumable"
            );
        }

        let mut lots = InventoryLot::find()
            .filter(inventory_lot::Column::InventoryId.eq(inventory.id))
            .filter(inventory_lot::Column::AvailableQuantity.gt(Decimal::ZERO))
            .all(db)
            .await?;
        sort_lots_fefo(&mut lots);

        let mut remaining = quantity;
        let mut lines = Vec::new();

        for lot in &lots {
            if remaining <= Decimal::ZERO {
                break;
            }

            if let Some(line) = self
                .deduct_from_lot(&inventory, lot, remaining, order_id, reason, created_by)
                .await?
            {
                remaining -= line.quantity;
                lines.push(line);
            }
        }

        if remaining > Decimal::ZERO {
            warn!(
                %product_id,
                %order_id,
                unmet = %remaining,
                "Insufficient inventory: deduction left an unmet remainder"
            );
            DEDUCTION_FAILURES
                .with_label_values(&["insufficient_stock"])
                .inc();
        }

        let allocated = quantity - remaining;
        info!(
            %order_id,
            requested = %quantity,
            allocated = %allocated,
            lots_touched = lines.len(),
            "Consumable deduction completed"
        );

        Ok(AllocationReport {
            requested: quantity,
            allocated,
            shortfall: remaining,
            lines,
        })
    }

    /// Deducts as much as possible (up to `remaining`) from one lot with an
    /// atomic conditional decrement, retrying against a re-read quantity
    /// when a concurrent allocation drained the lot first.
    ///
    /// The lot decrement and the aggregate `total_quantity` decrement commit
    /// in one transaction; the movement row is appended after commit.
    async fn deduct_from_lot(
        &self,
        inv: &inventory::Model,
        lot: &inventory_lot::Model,
        remaining: Decimal,
        order_id: Uuid,
        reason: &str,
        created_by: Option<Uuid>,
    ) -> Result<Option<AllocationLine>, ServiceError> {
        let db = self.db_pool.as_ref();
        let mut lot_available = lot.available_quantity;

        loop {
            let take = lot_available.min(remaining);
            if take <= Decimal::ZERO {
                return Ok(None);
            }

            let txn = db.begin().await?;

            let updated = InventoryLot::update_many()
                .col_expr(
                    inventory_lot::Column::AvailableQuantity,
                    Expr::col(inventory_lot::Column::AvailableQuantity).sub(take),
                )
                .col_expr(inventory_lot::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(inventory_lot::Column::Id.eq(lot.id))
                .filter(inventory_lot::Column::AvailableQuantity.gte(take))
                .exec(&txn)
                .await?;

            if updated.rows_affected == 0 {
                // Lost the race against a concurrent allocation; re-read and
                // retry with whatever is left.
                txn.rollback().await?;
                let fresh = InventoryLot::find_by_id(lot.id).one(db).await?;
                match fresh {
                    Some(f) if f.available_quantity > Decimal::ZERO => {
                        debug!(
                            lot_number = %lot.lot_number,
                            available = %f.available_quantity,
                            "Retrying lot deduction after concurrent update"
                        );
                        lot_available = f.available_quantity;
                        continue;
                    }
                    _ => return Ok(None),
                }
            }

            Inventory::update_many()
                .col_expr(
                    inventory::Column::TotalQuantity,
                    Expr::col(inventory::Column::TotalQuantity).sub(take),
                )
                .col_expr(inventory::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(inventory::Column::Id.eq(inv.id))
                .exec(&txn)
                .await?;

            txn.commit().await?;

            let total_cost = take * lot.cost_price;
            let movement = inventory_movement::ActiveModel {
                id: Set(Uuid::new_v4()),
                tenant_id: Set(inv.tenant_id),
                inventory_id: Set(inv.id),
                product_id: Set(inv.product_id),
                product_sku: Set(inv.product_sku.clone()),
                lot_number: Set(lot.lot_number.clone()),
                movement_type: Set(MovementType::ConsumableDeduction.to_string()),
                quantity: Set(take),
                unit_cost: Set(lot.cost_price),
                total_cost: Set(-total_cost),
                reason: Set(reason.to_string()),
                reference: Set(format!("Auto-deducted consumable for order {}", order_id)),
                order_id: Set(Some(order_id)),
                created_by: Set(created_by),
                created_at: Set(Utc::now()),
            };
            let movement = movement.insert(db).await?;

            CONSUMABLE_DEDUCTIONS.inc();
            debug!(
                lot_number = %lot.lot_number,
                deducted = %take,
                "Deducted from lot"
            );

            return Ok(Some(AllocationLine {
                lot_number: lot.lot_number.clone(),
                quantity: take,
                unit_cost: lot.cost_price,
                movement_id: movement.id,
            }));
        }
    }

    /// Replays an order's deduction movements in reverse.
    ///
    /// Restoration never re-runs FEFO: the exact lots recorded at deduction
    /// time are the exact lots credited, regardless of how lot ordering has
    /// changed since. Zero recorded movements is a no-op.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, order_id = %order_id))]
    pub async fn restore(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
        reason: &str,
        created_by: Option<Uuid>,
    ) -> Result<RestorationReport, ServiceError> {
        let db = self.db_pool.as_ref();

        let movements = InventoryMovement::find()
            .filter(inventory_movement::Column::TenantId.eq(tenant_id))
            .filter(inventory_movement::Column::OrderId.eq(order_id))
            .filter(
                inventory_movement::Column::MovementType
                    .eq(MovementType::ConsumableDeduction.as_str()),
            )
            .order_by_asc(inventory_movement::Column::CreatedAt)
            .all(db)
            .await?;

        if movements.is_empty() {
            debug!(%order_id, "No consumable movements found for order, nothing to restore");
            return Ok(RestorationReport {
                movements_found: 0,
                movements_restored: 0,
                skipped_lots: Vec::new(),
            });
        }

        let mut restored = 0;
        let mut skipped_lots = Vec::new();

        for movement in &movements {
            let Some(lot) = InventoryLot::find()
                .filter(inventory_lot::Column::InventoryId.eq(movement.inventory_id))
                .filter(inventory_lot::Column::LotNumber.eq(movement.lot_number.clone()))
                .one(db)
                .await?
            else {
                // The lot may have been renumbered or merged by an external
                // receiving process since the deduction was recorded.
                warn!(
                    lot_number = %movement.lot_number,
                    movement_id = %movement.id,
                    "Recorded lot no longer exists, skipping restoration of this movement"
                );
                skipped_lots.push(movement.lot_number.clone());
                continue;
            };

            let restore_qty = movement.quantity.abs();

            let txn = db.begin().await?;
            InventoryLot::update_many()
                .col_expr(
                    inventory_lot::Column::AvailableQuantity,
                    Expr::col(inventory_lot::Column::AvailableQuantity).add(restore_qty),
                )
                .col_expr(inventory_lot::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(inventory_lot::Column::Id.eq(lot.id))
                .exec(&txn)
                .await?;
            Inventory::update_many()
                .col_expr(
                    inventory::Column::TotalQuantity,
                    Expr::col(inventory::Column::TotalQuantity).add(restore_qty),
                )
                .col_expr(inventory::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(inventory::Column::Id.eq(movement.inventory_id))
                .exec(&txn)
                .await?;
            txn.commit().await?;

            let adjustment = inventory_movement::ActiveModel {
                id: Set(Uuid::new_v4()),
                tenant_id: Set(movement.tenant_id),
                inventory_id: Set(movement.inventory_id),
                product_id: Set(movement.product_id),
                product_sku: Set(movement.product_sku.clone()),
                lot_number: Set(movement.lot_number.clone()),
                movement_type: Set(MovementType::Adjustment.to_string()),
                quantity: Set(restore_qty),
                unit_cost: Set(movement.unit_cost),
                total_cost: Set(movement.total_cost.abs()),
                reason: Set(reason.to_string()),
                reference: Set(format!(
                    "Restoring consumable for cancelled order {}",
                    order_id
                )),
                order_id: Set(Some(order_id)),
                created_by: Set(created_by),
                created_at: Set(Utc::now()),
            };
            adjustment.insert(db).await?;

            CONSUMABLE_RESTORATIONS.inc();
            restored += 1;
        }

        info!(
            %order_id,
            movements_found = movements.len(),
            movements_restored = restored,
            "Consumable restoration completed"
        );

        Ok(RestorationReport {
            movements_found: movements.len(),
            movements_restored: restored,
            skipped_lots,
        })
    }

    /// Adds a received lot, creating the inventory document on first
    /// receipt. The lot insert and the aggregate increment commit together.
    #[instrument(skip(self, input), fields(tenant_id = %tenant_id, product_id = %product_id))]
    pub async fn receive_lot(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
        product_sku: &str,
        input: ReceiveLot,
    ) -> Result<InventorySnapshot, ServiceError> {
        if input.quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(format!(
                "Received quantity must be positive, got {}",
                input.quantity
            )));
        }
        if input.lot_number.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Lot number must not be empty".to_string(),
            ));
        }

        let db = self.db_pool.as_ref();
        let now = Utc::now();

        let inventory = match Inventory::find()
            .filter(inventory::Column::TenantId.eq(tenant_id))
            .filter(inventory::Column::ProductId.eq(product_id))
            .one(db)
            .await?
        {
            Some(inv) => inv,
            None => {
                let model = inventory::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    tenant_id: Set(tenant_id),
                    product_id: Set(product_id),
                    product_sku: Set(product_sku.to_string()),
                    total_quantity: Set(Decimal::ZERO),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                model.insert(db).await?
            }
        };

        let duplicate = InventoryLot::find()
            .filter(inventory_lot::Column::InventoryId.eq(inventory.id))
            .filter(inventory_lot::Column::LotNumber.eq(input.lot_number.clone()))
            .one(db)
            .await?;
        if duplicate.is_some() {
            return Err(ServiceError::ValidationError(format!(
                "Lot \"{}\" already exists for this inventory",
                input.lot_number
            )));
        }

        let txn = db.begin().await?;
        let lot = inventory_lot::ActiveModel {
            id: Set(Uuid::new_v4()),
            inventory_id: Set(inventory.id),
            lot_number: Set(input.lot_number.clone()),
            available_quantity: Set(input.quantity),
            received_date: Set(input.received_date),
            expiration_date: Set(input.expiration_date),
            cost_price: Set(input.cost_price),
            created_at: Set(now),
            updated_at: Set(now),
        };
        lot.insert(&txn).await?;
        Inventory::update_many()
            .col_expr(
                inventory::Column::TotalQuantity,
                Expr::col(inventory::Column::TotalQuantity).add(input.quantity),
            )
            .col_expr(inventory::Column::UpdatedAt, Expr::value(now))
            .filter(inventory::Column::Id.eq(inventory.id))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        info!(
            lot_number = %input.lot_number,
            quantity = %input.quantity,
            "Received lot into inventory"
        );

        self.snapshot(tenant_id, product_id).await?.ok_or_else(|| {
            ServiceError::InternalError("Inventory vanished after receiving".to_string())
        })
    }

    /// Current inventory state with lots, FEFO-ordered.
    pub async fn snapshot(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<InventorySnapshot>, ServiceError> {
        let db = self.db_pool.as_ref();

        let Some(inventory) = Inventory::find()
            .filter(inventory::Column::TenantId.eq(tenant_id))
            .filter(inventory::Column::ProductId.eq(product_id))
            .one(db)
            .await?
        else {
            return Ok(None);
        };

        let mut lots = InventoryLot::find()
            .filter(inventory_lot::Column::InventoryId.eq(inventory.id))
            .all(db)
            .await?;
        sort_lots_fefo(&mut lots);

        Ok(Some(InventorySnapshot { inventory, lots }))
    }

    /// All movements recorded for one order, oldest first.
    pub async fn movements_for_order(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<Vec<inventory_movement::Model>, ServiceError> {
        let movements = InventoryMovement::find()
            .filter(inventory_movement::Column::TenantId.eq(tenant_id))
            .filter(inventory_movement::Column::OrderId.eq(order_id))
            .order_by_asc(inventory_movement::Column::CreatedAt)
            .all(self.db_pool.as_ref())
            .await?;
        Ok(movements)
    }
}

/// FEFO ordering: lots with an expiration date come first, soonest first;
/// undated lots are treated as never expiring and consumed afterwards,
/// oldest received first.
fn sort_lots_fefo(lots: &mut [inventory_lot::Model]) {
    lots.sort_by(|a, b| match (a.expiration_date, b.expiration_date) {
        (Some(x), Some(y)) => x.cmp(&y).then(a.received_date.cmp(&b.received_date)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.received_date.cmp(&b.received_date),
    });
}
