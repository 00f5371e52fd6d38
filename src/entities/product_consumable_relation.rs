use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Many-to-many edge from a sellable product to a consumable product.
/// `quantity_required` is consumable units per one sellable unit. Unique
/// per (tenant, product, consumable).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_consumable_relations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub product_id: Uuid,
    pub consumable_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity_required: Decimal,
    pub is_required: bool,
    pub is_auto_deducted: bool,
    pub priority: i32,
    pub applicable_context: String,
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
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Order contexts a relation can be limited to. `Always` matches any
/// order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicableContext {
    Always,
    Takeaway,
    DineIn,
    Delivery,
}

impl ApplicableContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicableContext::Always => "always",
            ApplicableContext::Takeaway => "takeaway",
            ApplicableContext::DineIn => "dine_in",
            ApplicableContext::Delivery => "delivery",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "always" => Some(ApplicableContext::Always),
            "takeaway" => Some(ApplicableContext::Takeaway),
            "dine_in" => Some(ApplicableContext::DineIn),
            "delivery" => Some(ApplicableContext::Delivery),
            _ => None,
        }
    }
}

impl ToString for ApplicableContext {
    fn to_string(&self) -> String {
        self.as_str().to_string()
    }
}
