use crate::{
    db::DbPool,
    entities::product_consumable_relation::{self, Entity as ProductConsumableRelation},
    errors::ServiceError,
    events::{Event, EventSender, OrderCancelledEvent, OrderCreatedEvent, OrderEventItem},
    services::inventory_ledger::InventoryLedgerService,
};
use async_trait::async_trait;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

/// Reason recorded on every automatic deduction movement. Restoration
/// replays movements written under it.
pub const DEDUCTION_REASON: &str = "Auto-deducted consumable for order";
/// Reason recorded on every restoration adjustment.
pub const RESTORATION_REASON: &str = "Order cancelled - restore auto-deducted consumable";

const DEFAULT_CONTEXT: &str = "always";

/// Reacts to order lifecycle events by resolving product→consumable
/// relations and driving the inventory ledger.
///
/// Consumable accounting is a secondary effect of the order workflow: every
/// failure in here is caught, logged and swallowed so it can never fail the
/// business transaction that triggered it.
#[derive(Clone)]
pub struct ConsumptionOrchestrator {
    db_pool: Arc<DbPool>,
    ledger: InventoryLedgerService,
    event_sender: Arc<EventSender>,
}

impl ConsumptionOrchestrator {
    pub fn new(
        db_pool: Arc<DbPool>,
        ledger: InventoryLedgerService,
        event_sender: Arc<EventSender>,
    ) -> Self {
        Self {
            db_pool,
            ledger,
            event_sender,
        }
    }

    /// Consumes order events until the channel closes. The loop itself
    /// never fails; individual handler errors are logged and dropped.
    pub async fn run(self, mut rx: mpsc::Receiver<Event>) {
        info!("Consumption orchestrator listening for order events");
        while let Some(event) = rx.recv().await {
            self.dispatch(event).await;
        }
        info!("Order event channel closed, consumption orchestrator stopping");
    }

    async fn dispatch(&self, event: Event) {
        match event {
            Event::OrderCreated(e) => self.handle_order_created(&e).await,
            Event::OrderCancelled(e) => self.handle_order_cancelled(&e).await,
            _ => {}
        }
    }

    /// Deducts auto-deducted consumables for every item of a new order.
    #[instrument(skip(self, event), fields(order_id = %event.order_id, tenant_id = %event.tenant_id))]
    pub async fn handle_order_created(&self, event: &OrderCreatedEvent) {
        info!(items = event.items.len(), "Processing order.created event");

        let order_type = event
            .order_type
            .clone()
            .unwrap_or_else(|| DEFAULT_CONTEXT.to_string());

        for item in &event.items {
            if let Err(e) = self
                .deduct_consumables_for_product(event, item, &order_type)
                .await
            {
                error!(
                    product_id = %item.product_id,
                    error = %e,
                    "Error processing consumables for order item"
                );
            }
        }

        info!("Finished processing consumables for order");
    }

    /// Restores the consumables deducted for a cancelled order by replaying
    /// the order's recorded movements.
    #[instrument(skip(self, event), fields(order_id = %event.order_id, tenant_id = %event.tenant_id))]
    pub async fn handle_order_cancelled(&self, event: &OrderCancelledEvent) {
        info!("Processing order.cancelled event");

        match self
            .ledger
            .restore(
                event.tenant_id,
                event.order_id,
                RESTORATION_REASON,
                event.user_id,
            )
            .await
        {
            Ok(report) => {
                if report.movements_restored > 0 {
                    self.notify(Event::ConsumableRestored {
                        order_id: event.order_id,
                        movements_restored: report.movements_restored,
                    })
                    .await;
                }
                info!(
                    movements_restored = report.movements_restored,
                    "Restored consumables for cancelled order"
                );
            }
            Err(e) => {
                error!(error = %e, "Error restoring consumables for cancelled order");
            }
        }
    }

    async fn deduct_consumables_for_product(
        &self,
        event: &OrderCreatedEvent,
        item: &OrderEventItem,
        order_type: &str,
    ) -> Result<(), ServiceError> {
        let relations = self
            .active_relations_for_product(event.tenant_id, item.product_id)
            .await?;

        if relations.is_empty() {
            debug!(
                product_id = %item.product_id,
                "No auto-deducted consumables configured for product"
            );
            return Ok(());
        }

        debug!(
            product_id = %item.product_id,
            relations = relations.len(),
            "Found consumable relations for product"
        );

        for relation in &relations {
            if relation.applicable_context != DEFAULT_CONTEXT
                && relation.applicable_context != order_type
            {
                debug!(
                    consumable_id = %relation.consumable_id,
                    context = %relation.applicable_context,
                    order_type,
                    "Skipping consumable, not applicable for this order type"
                );
                continue;
            }

            let consumable_quantity = relation.quantity_required * item.quantity;

            // One relation failing must not prevent the siblings from
            // being deducted.
            match self
                .ledger
                .allocate(
                    event.tenant_id,
                    relation.consumable_id,
                    consumable_quantity,
                    event.order_id,
                    DEDUCTION_REASON,
                    event.user_id,
                )
                .await
            {
                Ok(report) => {
                    info!(
                        consumable_id = %relation.consumable_id,
                        deducted = %report.allocated,
                        "Deducted consumable for order"
                    );
                    self.notify(Event::ConsumableDeducted {
                        order_id: event.order_id,
                        consumable_id: relation.consumable_id,
                        requested: report.requested,
                        allocated: report.allocated,
                    })
                    .await;
                    if !report.fully_allocated() {
                        self.notify(Event::PartialDeductionWarning {
                            order_id: event.order_id,
                            consumable_id: relation.consumable_id,
                            requested: report.requested,
                            allocated: report.allocated,
                        })
                        .await;
                    }
                }
                Err(e) => {
                    error!(
                        consumable_id = %relation.consumable_id,
                        error = %e,
                        "Failed to deduct consumable"
                    );
                }
            }
        }

        Ok(())
    }

    async fn active_relations_for_product(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
    ) -> Result<Vec<product_consumable_relation::Model>, ServiceError> {
        let relations = ProductConsumableRelation::find()
            .filter(product_consumable_relation::Column::TenantId.eq(tenant_id))
            .filter(product_consumable_relation::Column::ProductId.eq(product_id))
            .filter(product_consumable_relation::Column::IsActive.eq(true))
            .filter(product_consumable_relation::Column::IsAutoDeducted.eq(true))
            .order_by_asc(product_consumable_relation::Column::Priority)
            .all(self.db_pool.as_ref())
            .await?;
        Ok(relations)
    }

    /// Best-effort outbound notification; a full channel must not fail
    /// order processing.
    async fn notify(&self, event: Event) {
        if let Err(e) = self.event_sender.send(event).await {
            error!(error = %e, "Failed to publish consumption notification event");
        }
    }
}

#[async_trait]
impl crate::events::EventHandler for ConsumptionOrchestrator {
    async fn handle_event(&self, event: Event) -> Result<(), String> {
        self.dispatch(event).await;
        Ok(())
    }
}
