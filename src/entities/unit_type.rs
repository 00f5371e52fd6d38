use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named family of mutually convertible measurement units sharing one
/// base unit. Rows with a null `tenant_id` are global; system-defined rows
/// are immutable by policy.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "unit_types")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub base_unit: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub conversions: Json,
    pub is_system_defined: bool,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// The designated base unit of a UnitType. Serialized field names are the
/// persisted document shape and must not change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseUnit {
    pub name: String,
    pub abbreviation: String,
}

/// One convertible unit within a UnitType. `factor` is linear relative to
/// the base unit (base has factor 1.0).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitConversion {
    pub unit: String,
    pub abbreviation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plural_name: Option<String>,
    pub factor: f64,
    pub is_base: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

impl Model {
    pub fn decode_base_unit(&self) -> Result<BaseUnit, serde_json::Error> {
        serde_json::from_value(self.base_unit.clone())
    }

    pub fn decode_conversions(&self) -> Result<Vec<UnitConversion>, serde_json::Error> {
        serde_json::from_value(self.conversions.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitCategory {
    Weight,
    Volume,
    Length,
    Unit,
    Time,
    Area,
    Temperature,
    Other,
}

impl UnitCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitCategory::Weight => "weight",
            UnitCategory::Volume => "volume",
            UnitCategory::Length => "length",
            UnitCategory::Unit => "unit",
            UnitCategory::Time => "time",
            UnitCategory::Area => "area",
            UnitCategory::Temperature => "temperature",
            UnitCategory::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "weight" => Some(UnitCategory::Weight),
            "volume" => Some(UnitCategory::Volume),
            "length" => Some(UnitCategory::Length),
            "unit" => Some(UnitCategory::Unit),
            "time" => Some(UnitCategory::Time),
            "area" => Some(UnitCategory::Area),
            "temperature" => Some(UnitCategory::Temperature),
            "other" => Some(UnitCategory::Other),
            _ => None,
        }
    }
}

impl ToString for UnitCategory {
    fn to_string(&self) -> String {
        self.as_str().to_string()
    }
}
