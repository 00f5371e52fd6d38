use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only record of internal-use supply consumption. Feeds cost
/// reporting only; writing one never decrements lot stock.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "supply_consumption_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub supply_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity_consumed: Decimal,
    pub unit_of_measure: String,
    pub consumption_type: String,
    pub department: Option<String>,
    pub consumed_by: Option<Uuid>,
    pub related_order_id: Option<Uuid>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub cost_info: Option<Json>,
    pub consumed_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::SupplyId",
        to = "super::product::Column::Id"
    )]
    Supply,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supply.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Cost snapshot captured at consumption time. Serialized field names are
/// the persisted document shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostInfo {
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsumptionType {
    OrderRelated,
    Cleaning,
    Maintenance,
    KitchenPrep,
    General,
    Waste,
    Other,
}

impl ConsumptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsumptionType::OrderRelated => "order_related",
            ConsumptionType::Cleaning => "cleaning",
            ConsumptionType::Maintenance => "maintenance",
            ConsumptionType::KitchenPrep => "kitchen_prep",
            ConsumptionType::General => "general",
            ConsumptionType::Waste => "waste",
            ConsumptionType::Other => "other",
        }
    }
}

impl ToString for ConsumptionType {
    fn to_string(&self) -> String {
        self.as_str().to_string()
    }
}
