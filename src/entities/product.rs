use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimal catalog row the engine validates configuration against.
/// The full product catalog lives with an external collaborator; only the
/// fields the consumption engine touches are modeled here.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub sku: String,
    pub name: String,
    pub product_type: String,
    pub unit_of_measure: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product_consumable_relation::Entity")]
    ConsumableRelations,
}

impl Related<super::product_consumable_relation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConsumableRelations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductType {
    Sellable,
    Consumable,
    Supply,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Sellable => "sellable",
            ProductType::Consumable => "consumable",
            ProductType::Supply => "supply",
        }
    }
}

impl ToString for ProductType {
    fn to_string(&self) -> String {
        self.as_str().to_string()
    }
}
