use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

pub mod consumables;
pub mod consumption_orchestrator;
pub mod inventory_ledger;
pub mod supplies;
pub mod unit_types;

pub use consumables::ConsumableService;
pub use consumption_orchestrator::ConsumptionOrchestrator;
pub use inventory_ledger::InventoryLedgerService;
pub use supplies::SupplyService;
pub use unit_types::UnitTypeService;

/// All engine services wired over one connection pool.
#[derive(Clone)]
pub struct AppServices {
    pub unit_types: UnitTypeService,
    pub consumables: ConsumableService,
    pub supplies: SupplyService,
    pub ledger: InventoryLedgerService,
    pub orchestrator: ConsumptionOrchestrator,
}

impl AppServices {
    pub fn build(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        let unit_types = UnitTypeService::new(db_pool.clone());
        let consumables = ConsumableService::new(db_pool.clone(), unit_types.clone());
        let supplies = SupplyService::new(db_pool.clone(), unit_types.clone());
        let ledger = InventoryLedgerService::new(db_pool.clone());
        let orchestrator =
            ConsumptionOrchestrator::new(db_pool, ledger.clone(), event_sender);

        Self {
            unit_types,
            consumables,
            supplies,
            ledger,
            orchestrator,
        }
    }
}
