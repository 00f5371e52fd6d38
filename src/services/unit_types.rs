use crate::{
    db::DbPool,
    entities::unit_type::{self, BaseUnit, Entity as UnitType, UnitCategory, UnitConversion},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Abbreviations of the non-linear temperature scales the conversion table
/// cannot represent. Conversions here are strictly linear (factor relative
/// to a base unit), so these are rejected at configuration time rather than
/// silently approximated.
const NON_LINEAR_TEMPERATURE_UNITS: &[&str] = &["F", "°F", "K", "°K", "R", "°R"];

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUnitType {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub description: Option<String>,
    pub category: UnitCategory,
    pub base_unit: BaseUnit,
    #[validate(length(min = 1))]
    pub conversions: Vec<UnitConversion>,
    #[serde(default)]
    pub is_system_defined: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUnitType {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<UnitCategory>,
    pub base_unit: Option<BaseUnit>,
    pub conversions: Option<Vec<UnitConversion>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct UnitTypeFilter {
    pub category: Option<UnitCategory>,
    pub is_active: Option<bool>,
    pub is_system_defined: Option<bool>,
    /// When false, only global (tenant-less) types are returned.
    pub include_custom: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertedQuantity {
    pub quantity: f64,
    pub unit: String,
}

/// Result of a unit conversion query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitConversionOutcome {
    pub original: ConvertedQuantity,
    pub converted: ConvertedQuantity,
    pub factor: f64,
    pub unit_type_name: String,
}

/// Service managing UnitType conversion tables.
#[derive(Clone)]
pub struct UnitTypeService {
    db_pool: Arc<DbPool>,
}

/// Rounds to 5 decimal places, the fixed precision of the conversion
/// contract.
fn round5(value: f64) -> f64 {
    (value * 100_000.0).round() / 100_000.0
}

impl UnitTypeService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Creates a UnitType after validating the conversion-table invariants.
    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        tenant_id: Option<Uuid>,
        input: CreateUnitType,
        created_by: Option<Uuid>,
    ) -> Result<unit_type::Model, ServiceError> {
        input.validate()?;
        validate_conversion_table(input.category, &input.base_unit, &input.conversions)?;

        let db = self.db_pool.as_ref();

        let mut scope = Condition::all().add(unit_type::Column::Name.eq(input.name.clone()));
        scope = match tenant_id {
            Some(tid) => scope.add(unit_type::Column::TenantId.eq(tid)),
            None => scope.add(unit_type::Column::TenantId.is_null()),
        };
        let existing = UnitType::find().filter(scope).one(db).await?;
        if existing.is_some() {
            return Err(ServiceError::ValidationError(format!(
                "A unit type named \"{}\" already exists in this scope",
                input.name
            )));
        }

        let now = Utc::now();
        let model = unit_type::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            name: Set(input.name),
            description: Set(input.description),
            category: Set(input.category.to_string()),
            base_unit: Set(serde_json::to_value(&input.base_unit)?),
            conversions: Set(serde_json::to_value(&input.conversions)?),
            is_system_defined: Set(input.is_system_defined),
            is_active: Set(true),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = model.insert(db).await?;
        info!(unit_type_id = %created.id, name = %created.name, "Created unit type");
        Ok(created)
    }

    /// Fetches one UnitType by id.
    pub async fn get(&self, id: Uuid) -> Result<unit_type::Model, ServiceError> {
        UnitType::find_by_id(id)
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Unit type {} not found", id)))
    }

    /// Finds a UnitType by name within the tenant's scope (tenant rows plus
    /// global rows).
    pub async fn find_by_name(
        &self,
        name: &str,
        tenant_id: Option<Uuid>,
    ) -> Result<Option<unit_type::Model>, ServiceError> {
        let mut scope = Condition::any().add(unit_type::Column::TenantId.is_null());
        if let Some(tid) = tenant_id {
            scope = scope.add(unit_type::Column::TenantId.eq(tid));
        }

        let found = UnitType::find()
            .filter(unit_type::Column::Name.eq(name))
            .filter(scope)
            .one(self.db_pool.as_ref())
            .await?;
        Ok(found)
    }

    /// Lists UnitTypes visible to a tenant, system-defined rows first.
    pub async fn list(
        &self,
        tenant_id: Option<Uuid>,
        filter: UnitTypeFilter,
    ) -> Result<Vec<unit_type::Model>, ServiceError> {
        let mut query = UnitType::find();

        let mut scope = Condition::any().add(unit_type::Column::TenantId.is_null());
        if filter.include_custom {
            if let Some(tid) = tenant_id {
                scope = scope.add(unit_type::Column::TenantId.eq(tid));
            }
        }
        query = query.filter(scope);

        if let Some(category) = filter.category {
            query = query.filter(unit_type::Column::Category.eq(category.to_string()));
        }
        if let Some(active) = filter.is_active {
            query = query.filter(unit_type::Column::IsActive.eq(active));
        }
        if let Some(system) = filter.is_system_defined {
            query = query.filter(unit_type::Column::IsSystemDefined.eq(system));
        }

        let rows = query
            .order_by_desc(unit_type::Column::IsSystemDefined)
            .order_by_asc(unit_type::Column::Name)
            .all(self.db_pool.as_ref())
            .await?;
        Ok(rows)
    }

    /// Updates a non-system UnitType, re-validating the conversion table.
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateUnitType,
    ) -> Result<unit_type::Model, ServiceError> {
        let existing = self.get(id).await?;

        if existing.is_system_defined {
            return Err(ServiceError::InvalidOperation(
                "System-defined unit types cannot be modified".to_string(),
            ));
        }

        let category = input
            .category
            .or_else(|| UnitCategory::parse(&existing.category))
            .unwrap_or(UnitCategory::Other);
        let base_unit = match &input.base_unit {
            Some(b) => b.clone(),
            None => existing.decode_base_unit()?,
        };
        let conversions = match &input.conversions {
            Some(c) => c.clone(),
            None => existing.decode_conversions()?,
        };
        validate_conversion_table(category, &base_unit, &conversions)?;

        let mut model: unit_type::ActiveModel = existing.clone().into();
        if let Some(name) = input.name {
            if name != existing.name {
                let mut scope = Condition::all().add(unit_type::Column::Name.eq(name.clone()));
                scope = match existing.tenant_id {
                    Some(tid) => scope.add(unit_type::Column::TenantId.eq(tid)),
                    None => scope.add(unit_type::Column::TenantId.is_null()),
                };
                if UnitType::find()
                    .filter(scope)
                    .one(self.db_pool.as_ref())
                    .await?
                    .is_some()
                {
                    return Err(ServiceError::ValidationError(format!(
                        "A unit type named \"{}\" already exists in this scope",
                        name
                    )));
                }
            }
            model.name = Set(name);
        }
        if let Some(description) = input.description {
            model.description = Set(Some(description));
        }
        model.category = Set(category.to_string());
        model.base_unit = Set(serde_json::to_value(&base_unit)?);
        model.conversions = Set(serde_json::to_value(&conversions)?);
        if let Some(active) = input.is_active {
            model.is_active = Set(active);
        }
        model.updated_at = Set(Utc::now());

        let updated = model.update(self.db_pool.as_ref()).await?;
        info!(unit_type_id = %updated.id, name = %updated.name, "Updated unit type");
        Ok(updated)
    }

    /// Soft-deactivates a non-system UnitType. Rows are never hard-deleted
    /// while configuration may reference them.
    #[instrument(skip(self))]
    pub async fn deactivate(&self, id: Uuid) -> Result<unit_type::Model, ServiceError> {
        let existing = self.get(id).await?;

        if existing.is_system_defined {
            return Err(ServiceError::InvalidOperation(
                "System-defined unit types cannot be deactivated".to_string(),
            ));
        }

        let mut model: unit_type::ActiveModel = existing.into();
        model.is_active = Set(false);
        model.updated_at = Set(Utc::now());
        let updated = model.update(self.db_pool.as_ref()).await?;
        info!(unit_type_id = %updated.id, name = %updated.name, "Deactivated unit type");
        Ok(updated)
    }

    /// Converts a quantity between two units of the same UnitType.
    ///
    /// The quantity is first scaled into the base unit, then into the target
    /// unit, and rounded to 5 decimal places.
    #[instrument(skip(self))]
    pub async fn convert(
        &self,
        unit_type_id: Uuid,
        from_unit: &str,
        to_unit: &str,
        quantity: f64,
    ) -> Result<UnitConversionOutcome, ServiceError> {
        let unit_type = self.get(unit_type_id).await?;
        let conversions = unit_type.decode_conversions()?;

        let from = find_unit(&conversions, from_unit, &unit_type.name)?;
        let to = find_unit(&conversions, to_unit, &unit_type.name)?;

        let base_quantity = quantity * from.factor;
        let converted_quantity = round5(base_quantity / to.factor);

        Ok(UnitConversionOutcome {
            original: ConvertedQuantity {
                quantity,
                unit: from_unit.to_string(),
            },
            converted: ConvertedQuantity {
                quantity: converted_quantity,
                unit: to_unit.to_string(),
            },
            factor: to.factor / from.factor,
            unit_type_name: unit_type.name,
        })
    }

    /// Returns only the ratio between two units of the same UnitType.
    pub async fn conversion_factor(
        &self,
        unit_type_id: Uuid,
        from_unit: &str,
        to_unit: &str,
    ) -> Result<f64, ServiceError> {
        let unit_type = self.get(unit_type_id).await?;
        let conversions = unit_type.decode_conversions()?;

        let from = find_unit(&conversions, from_unit, &unit_type.name)?;
        let to = find_unit(&conversions, to_unit, &unit_type.name)?;

        Ok(to.factor / from.factor)
    }

    /// Existence check for a unit abbreviation within a UnitType. Used by
    /// consumable/supply configuration validation.
    pub async fn validate_unit(
        &self,
        unit_type_id: Uuid,
        abbreviation: &str,
    ) -> Result<Option<UnitConversion>, ServiceError> {
        let unit_type = self.get(unit_type_id).await?;
        let conversions = unit_type.decode_conversions()?;
        Ok(conversions
            .into_iter()
            .find(|c| c.abbreviation == abbreviation))
    }

    /// Seeds the system-defined conversion tables if none exist. Idempotent.
    #[instrument(skip(self))]
    pub async fn seed_system_unit_types(&self) -> Result<usize, ServiceError> {
        let db = self.db_pool.as_ref();

        let existing = UnitType::find()
            .filter(unit_type::Column::IsSystemDefined.eq(true))
            .count(db)
            .await?;
        if existing > 0 {
            info!(count = existing, "System unit types already seeded, skipping");
            return Ok(0);
        }

        let definitions = system_unit_type_definitions();
        let count = definitions.len();
        let now = Utc::now();
        for def in definitions {
            let model = unit_type::ActiveModel {
                id: Set(Uuid::new_v4()),
                tenant_id: Set(None),
                name: Set(def.name.clone()),
                description: Set(def.description.clone()),
                category: Set(def.category.to_string()),
                base_unit: Set(serde_json::to_value(&def.base_unit)?),
                conversions: Set(serde_json::to_value(&def.conversions)?),
                is_system_defined: Set(true),
                is_active: Set(true),
                created_by: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
            };
            model.insert(db).await?;
        }

        info!(count, "Seeded system unit types");
        Ok(count)
    }
}

fn find_unit<'a>(
    conversions: &'a [UnitConversion],
    abbreviation: &str,
    unit_type_name: &str,
) -> Result<&'a UnitConversion, ServiceError> {
    conversions
        .iter()
        .find(|c| c.abbreviation == abbreviation)
        .ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "Unit \"{}\" not found in unit type \"{}\"",
                abbreviation, unit_type_name
            ))
        })
}

/// Validates the invariants of a conversion table: exactly one base entry
/// with factor 1.0, the declared base unit present among the conversions,
/// unique abbreviations, and (for temperature) linear units only.
fn validate_conversion_table(
    category: UnitCategory,
    base_unit: &BaseUnit,
    conversions: &[UnitConversion],
) -> Result<(), ServiceError> {
    let base_entries: Vec<&UnitConversion> = conversions.iter().filter(|c| c.is_base).collect();
    if base_entries.is_empty() {
        return Err(ServiceError::ValidationError(
            "Exactly one conversion must be marked as the base unit".to_string(),
        ));
    }
    if base_entries.len() > 1 {
        return Err(ServiceError::ValidationError(
            "Only one conversion may be marked as the base unit".to_string(),
        ));
    }

    let base = base_entries[0];
    if base.factor != 1.0 {
        return Err(ServiceError::ValidationError(
            "The base unit must have a conversion factor of 1.0".to_string(),
        ));
    }

    if base.abbreviation != base_unit.abbreviation {
        return Err(ServiceError::ValidationError(format!(
            "The declared base unit \"{}\" must match the base conversion entry \"{}\"",
            base_unit.abbreviation, base.abbreviation
        )));
    }

    let mut seen = HashSet::new();
    for conversion in conversions {
        if !seen.insert(conversion.abbreviation.as_str()) {
            return Err(ServiceError::ValidationError(format!(
                "Duplicate unit abbreviation \"{}\"",
                conversion.abbreviation
            )));
        }
    }

    if category == UnitCategory::Temperature {
        for conversion in conversions {
            if NON_LINEAR_TEMPERATURE_UNITS.contains(&conversion.abbreviation.as_str()) {
                return Err(ServiceError::ValidationError(format!(
                    "Temperature unit \"{}\" uses a non-linear scale; only linear Celsius-based units are supported",
                    conversion.abbreviation
                )));
            }
        }
    }

    Ok(())
}

struct SystemUnitType {
    name: String,
    description: Option<String>,
    category: UnitCategory,
    base_unit: BaseUnit,
    conversions: Vec<UnitConversion>,
}

fn unit(name: &str, abbr: &str, plural: &str, factor: f64, is_base: bool) -> UnitConversion {
    UnitConversion {
        unit: name.to_string(),
        abbreviation: abbr.to_string(),
        plural_name: Some(plural.to_string()),
        factor,
        is_base,
        symbol: None,
    }
}

/// The system-defined conversion tables shipped with the engine.
fn system_unit_type_definitions() -> Vec<SystemUnitType> {
    vec![
        SystemUnitType {
            name: "Weight".to_string(),
            description: Some("Weight measurement units".to_string()),
            category: UnitCategory::Weight,
            base_unit: BaseUnit {
                name: "kilogram".to_string(),
                abbreviation: "kg".to_string(),
            },
            conversions: vec![
                unit("kilogram", "kg", "kilograms", 1.0, true),
                unit("gram", "g", "grams", 0.001, false),
                unit("milligram", "mg", "milligrams", 0.000001, false),
                unit("metric ton", "ton", "metric tons", 1000.0, false),
                unit("pound", "lb", "pounds", 0.453592, false),
                unit("ounce", "oz", "ounces", 0.0283495, false),
            ],
        },
        SystemUnitType {
            name: "Volume".to_string(),
            description: Some("Volume measurement units".to_string()),
            category: UnitCategory::Volume,
            base_unit: BaseUnit {
                name: "liter".to_string(),
                abbreviation: "L".to_string(),
            },
            conversions: vec![
                unit("liter", "L", "liters", 1.0, true),
                unit("milliliter", "ml", "milliliters", 0.001, false),
                unit("centiliter", "cl", "centiliters", 0.01, false),
                unit("gallon", "gal", "gallons", 3.78541, false),
                unit("fluid ounce", "fl oz", "fluid ounces", 0.0295735, false),
                unit("cup", "cup", "cups", 0.236588, false),
                unit("tablespoon", "tbsp", "tablespoons", 0.0147868, false),
                unit("teaspoon", "tsp", "teaspoons", 0.00492892, false),
            ],
        },
        SystemUnitType {
            name: "Length".to_string(),
            description: Some("Length measurement units".to_string()),
            category: UnitCategory::Length,
            base_unit: BaseUnit {
                name: "meter".to_string(),
                abbreviation: "m".to_string(),
            },
            conversions: vec![
                unit("meter", "m", "meters", 1.0, true),
                unit("centimeter", "cm", "centimeters", 0.01, false),
                unit("millimeter", "mm", "millimeters", 0.001, false),
                unit("kilometer", "km", "kilometers", 1000.0, false),
                unit("inch", "in", "inches", 0.0254, false),
                unit("foot", "ft", "feet", 0.3048, false),
                unit("yard", "yd", "yards", 0.9144, false),
            ],
        },
        SystemUnitType {
            name: "Count".to_string(),
            description: Some("Discrete counting units".to_string()),
            category: UnitCategory::Unit,
            base_unit: BaseUnit {
                name: "each".to_string(),
                abbreviation: "ea".to_string(),
            },
            conversions: vec![
                unit("each", "ea", "each", 1.0, true),
                unit("pair", "pr", "pairs", 2.0, false),
                unit("dozen", "dz", "dozens", 12.0, false),
                unit("gross", "gr", "gross", 144.0, false),
            ],
        },
        SystemUnitType {
            name: "Time".to_string(),
            description: Some("Time measurement units".to_string()),
            category: UnitCategory::Time,
            base_unit: BaseUnit {
                name: "hour".to_string(),
                abbreviation: "hr".to_string(),
            },
            conversions: vec![
                unit("hour", "hr", "hours", 1.0, true),
                unit("minute", "min", "minutes", 1.0 / 60.0, false),
                unit("second", "s", "seconds", 1.0 / 3600.0, false),
                unit("day", "d", "days", 24.0, false),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weight_conversions() -> Vec<UnitConversion> {
        vec![
            unit("kilogram", "kg", "kilograms", 1.0, true),
            unit("gram", "g", "grams", 0.001, false),
        ]
    }

    fn kg_base() -> BaseUnit {
        BaseUnit {
            name: "kilogram".to_string(),
            abbreviation: "kg".to_string(),
        }
    }

    #[test]
    fn round5_truncates_drift() {
        assert_eq!(round5(5500.000000001), 5500.0);
        assert_eq!(round5(0.123456789), 0.12346);
    }

    #[test]
    fn valid_table_passes() {
        let result =
            validate_conversion_table(UnitCategory::Weight, &kg_base(), &weight_conversions());
        assert!(result.is_ok());
    }

    #[test]
    fn rejects_zero_base_units() {
        let mut conversions = weight_conversions();
        conversions[0].is_base = false;
        let err = validate_conversion_table(UnitCategory::Weight, &kg_base(), &conversions)
            .unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    #[test]
    fn rejects_multiple_base_units() {
        let mut conversions = weight_conversions();
        conversions[1].is_base = true;
        conversions[1].factor = 1.0;
        let err = validate_conversion_table(UnitCategory::Weight, &kg_base(), &conversions)
            .unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    #[test]
    fn rejects_base_factor_not_one() {
        let mut conversions = weight_conversions();
        conversions[0].factor = 2.0;
        let err = validate_conversion_table(UnitCategory::Weight, &kg_base(), &conversions)
            .unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    #[test]
    fn rejects_base_unit_missing_from_conversions() {
        let base = BaseUnit {
            name: "pound".to_string(),
            abbreviation: "lb".to_string(),
        };
        let err = validate_conversion_table(UnitCategory::Weight, &base, &weight_conversions())
            .unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    #[test]
    fn rejects_duplicate_abbreviations() {
        let mut conversions = weight_conversions();
        conversions.push(unit("gram again", "g", "grams", 0.001, false));
        let err = validate_conversion_table(UnitCategory::Weight, &kg_base(), &conversions)
            .unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    #[test]
    fn rejects_non_linear_temperature_scales() {
        let base = BaseUnit {
            name: "celsius".to_string(),
            abbreviation: "°C".to_string(),
        };
        let conversions = vec![
            unit("celsius", "°C", "degrees celsius", 1.0, true),
            unit("fahrenheit", "°F", "degrees fahrenheit", 1.8, false),
        ];
        let err =
            validate_conversion_table(UnitCategory::Temperature, &base, &conversions).unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    #[test]
    fn system_definitions_all_validate() {
        for def in system_unit_type_definitions() {
            validate_conversion_table(def.category, &def.base_unit, &def.conversions)
                .expect("system definition must satisfy the table invariants");
        }
    }

    mod properties {
        use super::super::round5;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn round5_is_idempotent(value in -1.0e9f64..1.0e9) {
                let once = round5(value);
                prop_assert_eq!(round5(once), once);
            }

            #[test]
            fn round5_stays_within_half_a_unit_in_the_last_place(value in -1.0e6f64..1.0e6) {
                prop_assert!((round5(value) - value).abs() <= 5.000001e-6);
            }
        }
    }
}
