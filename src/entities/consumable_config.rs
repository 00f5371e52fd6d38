use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-product configuration marking a product as consumed automatically
/// when related sellable products are ordered. One config per
/// (tenant, product).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "consumable_configs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub product_id: Uuid,
    pub consumable_type: String,
    pub is_reusable: bool,
    pub is_auto_deducted: bool,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub default_quantity_per_use: Decimal,
    pub unit_type_id: Option<Uuid>,
    pub default_unit: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub custom_conversions: Option<Json>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::unit_type::Entity",
        from = "Column::UnitTypeId",
        to = "super::unit_type::Column::Id"
    )]
    UnitType,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::unit_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UnitType.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Product-specific conversion override, applied before falling back to the
/// linked UnitType. Serialized field names are the persisted document shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomConversionRule {
    pub from_unit: String,
    pub to_unit: String,
    pub factor: f64,
}
