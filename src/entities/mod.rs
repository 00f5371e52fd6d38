pub mod consumable_config;
pub mod inventory;
pub mod inventory_lot;
pub mod inventory_movement;
pub mod product;
pub mod product_consumable_relation;
pub mod supply_config;
pub mod supply_consumption_log;
pub mod unit_type;
