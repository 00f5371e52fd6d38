use crate::{
    db::DbPool,
    entities::{
        consumable_config::CustomConversionRule,
        product::{self, Entity as Product, ProductType},
        supply_config::{self, Entity as SupplyConfig},
        supply_consumption_log::{self, ConsumptionType, CostInfo, Entity as SupplyConsumptionLog},
    },
    errors::ServiceError,
    services::unit_types::UnitTypeService,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSupplyConfig {
    #[validate(length(min = 1, max = 50))]
    pub supply_type: String,
    pub unit_type_id: Option<Uuid>,
    pub default_unit: Option<String>,
    pub purchase_unit: Option<String>,
    pub stock_unit: Option<String>,
    pub consumption_unit: Option<String>,
    pub custom_conversions: Option<Vec<CustomConversionRule>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSupplyConfig {
    pub supply_type: Option<String>,
    pub unit_type_id: Option<Uuid>,
    pub default_unit: Option<String>,
    pub purchase_unit: Option<String>,
    pub stock_unit: Option<String>,
    pub consumption_unit: Option<String>,
    pub custom_conversions: Option<Vec<CustomConversionRule>>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConsumption {
    pub supply_id: Uuid,
    pub quantity_consumed: Decimal,
    pub unit_of_measure: String,
    pub consumption_type: ConsumptionType,
    pub department: Option<String>,
    pub consumed_by: Option<Uuid>,
    pub related_order_id: Option<Uuid>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub cost_info: Option<CostInfo>,
}

#[derive(Debug, Clone, Default)]
pub struct ConsumptionLogFilter {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub department: Option<String>,
    pub consumed_by: Option<Uuid>,
}

/// Rollup of one (department, supply) pair over a date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentConsumption {
    pub department: Option<String>,
    pub supply_id: Uuid,
    pub total_quantity: Decimal,
    pub total_cost: Decimal,
    pub consumption_count: usize,
}

/// Rollup of one supply over a date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplyConsumption {
    pub supply_id: Uuid,
    pub total_quantity: Decimal,
    pub total_cost: Decimal,
    pub consumption_count: usize,
    pub departments: Vec<String>,
}

/// Manages supply configurations and the append-only consumption log.
///
/// Supplies are tracked in aggregate only: logging consumption feeds
/// reporting, it never decrements lot stock.
#[derive(Clone)]
pub struct SupplyService {
    db_pool: Arc<DbPool>,
    unit_types: UnitTypeService,
}

impl SupplyService {
    pub fn new(db_pool: Arc<DbPool>, unit_types: UnitTypeService) -> Self {
        Self {
            db_pool,
            unit_types,
        }
    }

    /// Creates a supply configuration for a product. One per
    /// (tenant, product); the product's type is flipped to supply.
    #[instrument(skip(self, input), fields(tenant_id = %tenant_id, product_id = %product_id))]
    pub async fn create_config(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
        input: CreateSupplyConfig,
        created_by: Option<Uuid>,
    ) -> Result<supply_config::Model, ServiceError> {
        input.validate()?;

        let db = self.db_pool.as_ref();

        let supply_product = Product::find()
            .filter(product::Column::Id.eq(product_id))
            .filter(product::Column::TenantId.eq(tenant_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;

        let existing = SupplyConfig::find()
            .filter(supply_config::Column::TenantId.eq(tenant_id))
            .filter(supply_config::Column::ProductId.eq(product_id))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::ValidationError(
                "Product already has a supply configuration".to_string(),
            ));
        }

        if let Some(unit_type_id) = input.unit_type_id {
            self.validate_unit_fields(
                unit_type_id,
                &[
                    ("defaultUnit", input.default_unit.as_deref()),
                    ("purchaseUnit", input.purchase_unit.as_deref()),
                    ("stockUnit", input.stock_unit.as_deref()),
                    ("consumptionUnit", input.consumption_unit.as_deref()),
                ],
            )
            .await?;
        }

        let now = Utc::now();
        let model = supply_config::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            product_id: Set(product_id),
            supply_type: Set(input.supply_type),
            unit_type_id: Set(input.unit_type_id),
            default_unit: Set(input.default_unit),
            purchase_unit: Set(input.purchase_unit),
            stock_unit: Set(input.stock_unit),
            consumption_unit: Set(input.consumption_unit),
            custom_conversions: Set(match &input.custom_conversions {
                Some(rules) => Some(serde_json::to_value(rules)?),
                None => None,
            }),
            notes: Set(input.notes),
            is_active: Set(true),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let config = model.insert(db).await?;

        if supply_product.product_type != ProductType::Supply.as_str() {
            let mut product_model: product::ActiveModel = supply_product.into();
            product_model.product_type = Set(ProductType::Supply.to_string());
            product_model.updated_at = Set(now);
            product_model.update(db).await?;
        }

        info!(config_id = %config.id, "Created supply config for product");
        Ok(config)
    }

    #[instrument(skip(self, input), fields(tenant_id = %tenant_id, config_id = %config_id))]
    pub async fn update_config(
        &self,
        tenant_id: Uuid,
        config_id: Uuid,
        input: UpdateSupplyConfig,
    ) -> Result<supply_config::Model, ServiceError> {
        let db = self.db_pool.as_ref();

        let current = SupplyConfig::find()
            .filter(supply_config::Column::Id.eq(config_id))
            .filter(supply_config::Column::TenantId.eq(tenant_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Supply configuration not found".to_string()))?;

        let effective_unit_type = input.unit_type_id.or(current.unit_type_id);
        if let Some(unit_type_id) = effective_unit_type {
            let default_unit = input
                .default_unit
                .clone()
                .or_else(|| current.default_unit.clone());
            let purchase_unit = input
                .purchase_unit
                .clone()
                .or_else(|| current.purchase_unit.clone());
            let stock_unit = input.stock_unit.clone().or_else(|| current.stock_unit.clone());
            let consumption_unit = input
                .consumption_unit
                .clone()
                .or_else(|| current.consumption_unit.clone());
            self.validate_unit_fields(
                unit_type_id,
                &[
                    ("defaultUnit", default_unit.as_deref()),
                    ("purchaseUnit", purchase_unit.as_deref()),
                    ("stockUnit", stock_unit.as_deref()),
                    ("consumptionUnit", consumption_unit.as_deref()),
                ],
            )
            .await?;
        }

        let mut model: supply_config::ActiveModel = current.into();
        if let Some(supply_type) = input.supply_type {
            model.supply_type = Set(supply_type);
        }
        if let Some(unit_type_id) = input.unit_type_id {
            model.unit_type_id = Set(Some(unit_type_id));
        }
        if let Some(default_unit) = input.default_unit {
            model.default_unit = Set(Some(default_unit));
        }
        if let Some(purchase_unit) = input.purchase_unit {
            model.purchase_unit = Set(Some(purchase_unit));
        }
        if let Some(stock_unit) = input.stock_unit {
            model.stock_unit = Set(Some(stock_unit));
        }
        if let Some(consumption_unit) = input.consumption_unit {
            model.consumption_unit = Set(Some(consumption_unit));
        }
        if let Some(rules) = input.custom_conversions {
            model.custom_conversions = Set(Some(serde_json::to_value(&rules)?));
        }
        if let Some(notes) = input.notes {
            model.notes = Set(Some(notes));
        }
        if let Some(is_active) = input.is_active {
            model.is_active = Set(is_active);
        }
        model.updated_at = Set(Utc::now());

        let updated = model.update(db).await?;
        info!(config_id = %updated.id, "Updated supply config");
        Ok(updated)
    }

    pub async fn get_config_by_product(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<supply_config::Model>, ServiceError> {
        let config = SupplyConfig::find()
            .filter(supply_config::Column::TenantId.eq(tenant_id))
            .filter(supply_config::Column::ProductId.eq(product_id))
            .one(self.db_pool.as_ref())
            .await?;
        Ok(config)
    }

    pub async fn list_configs(
        &self,
        tenant_id: Uuid,
        is_active: Option<bool>,
    ) -> Result<Vec<supply_config::Model>, ServiceError> {
        let mut query = SupplyConfig::find().filter(supply_config::Column::TenantId.eq(tenant_id));
        if let Some(active) = is_active {
            query = query.filter(supply_config::Column::IsActive.eq(active));
        }
        let configs = query
            .order_by_desc(supply_config::Column::CreatedAt)
            .all(self.db_pool.as_ref())
            .await?;
        Ok(configs)
    }

    /// Writes one immutable consumption log record.
    ///
    /// Rejects non-positive quantities and unconfigured supplies. No lot
    /// allocation happens here.
    #[instrument(skip(self, input), fields(tenant_id = %tenant_id, supply_id = %input.supply_id))]
    pub async fn log_consumption(
        &self,
        tenant_id: Uuid,
        input: LogConsumption,
        created_by: Option<Uuid>,
    ) -> Result<supply_consumption_log::Model, ServiceError> {
        if input.quantity_consumed <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(format!(
                "quantityConsumed must be positive, got {}",
                input.quantity_consumed
            )));
        }

        let db = self.db_pool.as_ref();

        let supply_product = Product::find()
            .filter(product::Column::Id.eq(input.supply_id))
            .filter(product::Column::TenantId.eq(tenant_id))
            .one(db)
            .await?;
        if supply_product.is_none() {
            return Err(ServiceError::NotFound(
                "Supply product not found".to_string(),
            ));
        }

        let config = SupplyConfig::find()
            .filter(supply_config::Column::TenantId.eq(tenant_id))
            .filter(supply_config::Column::ProductId.eq(input.supply_id))
            .one(db)
            .await?;
        if config.is_none() {
            return Err(ServiceError::ValidationError(
                "Supply product must have a supply configuration".to_string(),
            ));
        }

        let now = Utc::now();
        let model = supply_consumption_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            supply_id: Set(input.supply_id),
            quantity_consumed: Set(input.quantity_consumed),
            unit_of_measure: Set(input.unit_of_measure.clone()),
            consumption_type: Set(input.consumption_type.to_string()),
            department: Set(input.department),
            consumed_by: Set(input.consumed_by),
            related_order_id: Set(input.related_order_id),
            reason: Set(input.reason),
            notes: Set(input.notes),
            cost_info: Set(match &input.cost_info {
                Some(cost) => Some(serde_json::to_value(cost)?),
                None => None,
            }),
            consumed_at: Set(now),
            created_by: Set(created_by),
            created_at: Set(now),
        };
        let log = model.insert(db).await?;

        info!(
            quantity = %log.quantity_consumed,
            unit = %log.unit_of_measure,
            "Logged supply consumption"
        );
        Ok(log)
    }

    /// Consumption logs for one supply, newest first.
    pub async fn list_consumption_logs(
        &self,
        tenant_id: Uuid,
        supply_id: Uuid,
        filter: ConsumptionLogFilter,
    ) -> Result<Vec<supply_consumption_log::Model>, ServiceError> {
        let mut query = SupplyConsumptionLog::find()
            .filter(supply_consumption_log::Column::TenantId.eq(tenant_id))
            .filter(supply_consumption_log::Column::SupplyId.eq(supply_id));

        if let Some(start) = filter.start {
            query = query.filter(supply_consumption_log::Column::ConsumedAt.gte(start));
        }
        if let Some(end) = filter.end {
            query = query.filter(supply_consumption_log::Column::ConsumedAt.lte(end));
        }
        if let Some(department) = filter.department {
            query = query.filter(supply_consumption_log::Column::Department.eq(department));
        }
        if let Some(consumed_by) = filter.consumed_by {
            query = query.filter(supply_consumption_log::Column::ConsumedBy.eq(consumed_by));
        }

        let logs = query
            .order_by_desc(supply_consumption_log::Column::ConsumedAt)
            .all(self.db_pool.as_ref())
            .await?;
        Ok(logs)
    }

    /// Totals per (department, supply) over a date range. Pure read-side
    /// rollup over the immutable log.
    pub async fn consumption_by_department(
        &self,
        tenant_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DepartmentConsumption>, ServiceError> {
        let logs = self.logs_in_range(tenant_id, start, end).await?;

        let mut groups: BTreeMap<(Option<String>, Uuid), DepartmentConsumption> = BTreeMap::new();
        for log in &logs {
            let key = (log.department.clone(), log.supply_id);
            let entry = groups.entry(key).or_insert_with(|| DepartmentConsumption {
                department: log.department.clone(),
                supply_id: log.supply_id,
                total_quantity: Decimal::ZERO,
                total_cost: Decimal::ZERO,
                consumption_count: 0,
            });
            entry.total_quantity += log.quantity_consumed;
            entry.total_cost += decode_total_cost(log)?;
            entry.consumption_count += 1;
        }

        let mut summaries: Vec<DepartmentConsumption> = groups.into_values().collect();
        summaries.sort_by(|a, b| {
            a.department
                .cmp(&b.department)
                .then(b.total_cost.cmp(&a.total_cost))
        });
        Ok(summaries)
    }

    /// Totals per supply over a date range, highest spend first.
    pub async fn consumption_by_supply(
        &self,
        tenant_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SupplyConsumption>, ServiceError> {
        let logs = self.logs_in_range(tenant_id, start, end).await?;

        let mut groups: BTreeMap<Uuid, SupplyConsumption> = BTreeMap::new();
        for log in &logs {
            let entry = groups.entry(log.supply_id).or_insert_with(|| SupplyConsumption {
                supply_id: log.supply_id,
                total_quantity: Decimal::ZERO,
                total_cost: Decimal::ZERO,
                consumption_count: 0,
                departments: Vec::new(),
            });
            entry.total_quantity += log.quantity_consumed;
            entry.total_cost += decode_total_cost(log)?;
            entry.consumption_count += 1;
            if let Some(department) = &log.department {
                if !entry.departments.contains(department) {
                    entry.departments.push(department.clone());
                }
            }
        }

        let mut summaries: Vec<SupplyConsumption> = groups.into_values().collect();
        summaries.sort_by(|a, b| b.total_cost.cmp(&a.total_cost));
        Ok(summaries)
    }

    async fn logs_in_range(
        &self,
        tenant_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<supply_consumption_log::Model>, ServiceError> {
        let logs = SupplyConsumptionLog::find()
            .filter(supply_consumption_log::Column::TenantId.eq(tenant_id))
            .filter(supply_consumption_log::Column::ConsumedAt.gte(start))
            .filter(supply_consumption_log::Column::ConsumedAt.lte(end))
            .all(self.db_pool.as_ref())
            .await?;
        Ok(logs)
    }

    async fn validate_unit_fields(
        &self,
        unit_type_id: Uuid,
        fields: &[(&str, Option<&str>)],
    ) -> Result<(), ServiceError> {
        let unit_type = self.unit_types.get(unit_type_id).await.map_err(|e| match e {
            ServiceError::NotFound(_) => {
                ServiceError::ValidationError(format!("UnitType {} not found", unit_type_id))
            }
            other => other,
        })?;

        for (field, unit) in fields {
            if let Some(unit) = unit {
                if self
                    .unit_types
                    .validate_unit(unit_type_id, unit)
                    .await?
                    .is_none()
                {
                    return Err(ServiceError::ValidationError(format!(
                        "Unit \"{}\" in field \"{}\" is not valid for UnitType \"{}\"",
                        unit, field, unit_type.name
                    )));
                }
            }
        }

        Ok(())
    }
}

fn decode_total_cost(log: &supply_consumption_log::Model) -> Result<Decimal, ServiceError> {
    match &log.cost_info {
        Some(value) => {
            let cost: CostInfo = serde_json::from_value(value.clone())?;
            Ok(cost.total_cost)
        }
        None => Ok(Decimal::ZERO),
    }
}
