use crate::{
    db::DbPool,
    entities::{
        consumable_config::{self, CustomConversionRule, Entity as ConsumableConfig},
        product::{self, Entity as Product, ProductType},
        product_consumable_relation::{self, ApplicableContext, Entity as ProductConsumableRelation},
    },
    errors::ServiceError,
    services::unit_types::UnitTypeService,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateConsumableConfig {
    #[validate(length(min = 1, max = 50))]
    pub consumable_type: String,
    #[serde(default)]
    pub is_reusable: bool,
    #[serde(default = "default_true")]
    pub is_auto_deducted: bool,
    pub default_quantity_per_use: Option<Decimal>,
    pub unit_type_id: Option<Uuid>,
    pub default_unit: Option<String>,
    pub custom_conversions: Option<Vec<CustomConversionRule>>,
    pub notes: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateConsumableConfig {
    pub consumable_type: Option<String>,
    pub is_reusable: Option<bool>,
    pub is_auto_deducted: Option<bool>,
    pub default_quantity_per_use: Option<Decimal>,
    pub unit_type_id: Option<Uuid>,
    pub default_unit: Option<String>,
    pub custom_conversions: Option<Vec<CustomConversionRule>>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct ConsumableConfigFilter {
    pub consumable_type: Option<String>,
    pub is_active: Option<bool>,
    pub is_auto_deducted: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateRelation {
    pub product_id: Uuid,
    pub consumable_id: Uuid,
    pub quantity_required: Decimal,
    #[serde(default = "default_true")]
    pub is_required: bool,
    #[serde(default = "default_true")]
    pub is_auto_deducted: bool,
    #[serde(default)]
    pub priority: i32,
    pub applicable_context: Option<ApplicableContext>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRelation {
    pub quantity_required: Option<Decimal>,
    pub is_required: Option<bool>,
    pub is_auto_deducted: Option<bool>,
    pub priority: Option<i32>,
    pub applicable_context: Option<ApplicableContext>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
}

/// Manages consumable configurations and product→consumable relations.
#[derive(Clone)]
pub struct ConsumableService {
    db_pool: Arc<DbPool>,
    unit_types: UnitTypeService,
}

impl ConsumableService {
    pub fn new(db_pool: Arc<DbPool>, unit_types: UnitTypeService) -> Self {
        Self {
            db_pool,
            unit_types,
        }
    }

    /// Creates a consumable configuration for a product. Exactly one config
    /// is allowed per (tenant, product); the product's type is flipped to
    /// consumable on first configuration.
    #[instrument(skip(self, input), fields(tenant_id = %tenant_id, product_id = %product_id))]
    pub async fn create_config(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
        input: CreateConsumableConfig,
        created_by: Option<Uuid>,
    ) -> Result<consumable_config::Model, ServiceError> {
        input.validate()?;

        let db = self.db_pool.as_ref();

        let product = Product::find()
            .filter(product::Column::Id.eq(product_id))
            .filter(product::Column::TenantId.eq(tenant_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;

        let existing = ConsumableConfig::find()
            .filter(consumable_config::Column::TenantId.eq(tenant_id))
            .filter(consumable_config::Column::ProductId.eq(product_id))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::ValidationError(
                "Product already has a consumable configuration".to_string(),
            ));
        }

        if let Some(unit_type_id) = input.unit_type_id {
            self.validate_unit_field(unit_type_id, "defaultUnit", input.default_unit.as_deref())
                .await?;
        }

        let now = Utc::now();
        let model = consumable_config::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            product_id: Set(product_id),
            consumable_type: Set(input.consumable_type),
            is_reusable: Set(input.is_reusable),
            is_auto_deducted: Set(input.is_auto_deducted),
            default_quantity_per_use: Set(input.default_quantity_per_use.unwrap_or(Decimal::ONE)),
            unit_type_id: Set(input.unit_type_id),
            default_unit: Set(input.default_unit),
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

        if product.product_type != ProductType::Consumable.as_str() {
            let mut product_model: product::ActiveModel = product.into();
            product_model.product_type = Set(ProductType::Consumable.to_string());
            product_model.updated_at = Set(now);
            product_model.update(db).await?;
        }

        info!(config_id = %config.id, "Created consumable config for product");
        Ok(config)
    }

    /// Updates a consumable configuration, re-validating unit fields against
    /// the (possibly changed) UnitType.
    #[instrument(skip(self, input), fields(tenant_id = %tenant_id, config_id = %config_id))]
    pub async fn update_config(
        &self,
        tenant_id: Uuid,
        config_id: Uuid,
        input: UpdateConsumableConfig,
    ) -> Result<consumable_config::Model, ServiceError> {
        let db = self.db_pool.as_ref();

        let current = ConsumableConfig::find()
            .filter(consumable_config::Column::Id.eq(config_id))
            .filter(consumable_config::Column::TenantId.eq(tenant_id))
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound("Consumable configuration not found".to_string())
            })?;

        let effective_unit_type = input.unit_type_id.or(current.unit_type_id);
        let effective_default_unit = input
            .default_unit
            .clone()
            .or_else(|| current.default_unit.clone());
        if let Some(unit_type_id) = effective_unit_type {
            self.validate_unit_field(unit_type_id, "defaultUnit", effective_default_unit.as_deref())
                .await?;
        }

        let mut model: consumable_config::ActiveModel = current.into();
        if let Some(consumable_type) = input.consumable_type {
            model.consumable_type = Set(consumable_type);
        }
        if let Some(is_reusable) = input.is_reusable {
            model.is_reusable = Set(is_reusable);
        }
        if let Some(is_auto_deducted) = input.is_auto_deducted {
            model.is_auto_deducted = Set(is_auto_deducted);
        }
        if let Some(quantity) = input.default_quantity_per_use {
            model.default_quantity_per_use = Set(quantity);
        }
        if let Some(unit_type_id) = input.unit_type_id {
            model.unit_type_id = Set(Some(unit_type_id));
        }
        if let Some(default_unit) = input.default_unit {
            model.default_unit = Set(Some(default_unit));
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
        info!(config_id = %updated.id, "Updated consumable config");
        Ok(updated)
    }

    pub async fn get_config_by_product(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<consumable_config::Model>, ServiceError> {
        let config = ConsumableConfig::find()
            .filter(consumable_config::Column::TenantId.eq(tenant_id))
            .filter(consumable_config::Column::ProductId.eq(product_id))
            .one(self.db_pool.as_ref())
            .await?;
        Ok(config)
    }

    pub async fn list_configs(
        &self,
        tenant_id: Uuid,
        filter: ConsumableConfigFilter,
    ) -> Result<Vec<consumable_config::Model>, ServiceError> {
        let mut query = ConsumableConfig::find()
            .filter(consumable_config::Column::TenantId.eq(tenant_id));

        if let Some(consumable_type) = filter.consumable_type {
            query = query.filter(consumable_config::Column::ConsumableType.eq(consumable_type));
        }
        if let Some(is_active) = filter.is_active {
            query = query.filter(consumable_config::Column::IsActive.eq(is_active));
        }
        if let Some(is_auto_deducted) = filter.is_auto_deducted {
            query =
                query.filter(consumable_config::Column::IsAutoDeducted.eq(is_auto_deducted));
        }

        let configs = query
            .order_by_desc(consumable_config::Column::CreatedAt)
            .all(self.db_pool.as_ref())
            .await?;
        Ok(configs)
    }

    /// Creates a product→consumable relation. Both products must exist, the
    /// consumable must be configured, and the edge is unique per
    /// (tenant, product, consumable).
    #[instrument(skip(self, input), fields(tenant_id = %tenant_id))]
    pub async fn create_relation(
        &self,
        tenant_id: Uuid,
        input: CreateRelation,
        created_by: Option<Uuid>,
    ) -> Result<product_consumable_relation::Model, ServiceError> {
        if input.quantity_required <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(format!(
                "quantityRequired must be positive, got {}",
                input.quantity_required
            )));
        }

        let db = self.db_pool.as_ref();

        let product = Product::find()
            .filter(product::Column::Id.eq(input.product_id))
            .filter(product::Column::TenantId.eq(tenant_id))
            .one(db)
            .await?;
        if product.is_none() {
            return Err(ServiceError::NotFound("Product not found".to_string()));
        }

        let consumable = Product::find()
            .filter(product::Column::Id.eq(input.consumable_id))
            .filter(product::Column::TenantId.eq(tenant_id))
            .one(db)
            .await?;
        if consumable.is_none() {
            return Err(ServiceError::NotFound(
                "Consumable product not found".to_string(),
            ));
        }

        let consumable_config = ConsumableConfig::find()
            .filter(consumable_config::Column::TenantId.eq(tenant_id))
            .filter(consumable_config::Column::ProductId.eq(input.consumable_id))
            .one(db)
            .await?;
        if consumable_config.is_none() {
            return Err(ServiceError::ValidationError(
                "Consumable product must have a consumable configuration".to_string(),
            ));
        }

        let existing = ProductConsumableRelation::find()
            .filter(product_consumable_relation::Column::TenantId.eq(tenant_id))
            .filter(product_consumable_relation::Column::ProductId.eq(input.product_id))
            .filter(product_consumable_relation::Column::ConsumableId.eq(input.consumable_id))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::ValidationError(
                "Relation between product and consumable already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let context = input.applicable_context.unwrap_or(ApplicableContext::Always);
        let model = product_consumable_relation::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            product_id: Set(input.product_id),
            consumable_id: Set(input.consumable_id),
            quantity_required: Set(input.quantity_required),
            is_required: Set(input.is_required),
            is_auto_deducted: Set(input.is_auto_deducted),
            priority: Set(input.priority),
            applicable_context: Set(context.to_string()),
            notes: Set(input.notes),
            is_active: Set(true),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let relation = model.insert(db).await?;

        info!(
            relation_id = %relation.id,
            product_id = %relation.product_id,
            consumable_id = %relation.consumable_id,
            quantity_required = %relation.quantity_required,
            "Created product-consumable relation"
        );
        Ok(relation)
    }

    #[instrument(skip(self, input), fields(tenant_id = %tenant_id, relation_id = %relation_id))]
    pub async fn update_relation(
        &self,
        tenant_id: Uuid,
        relation_id: Uuid,
        input: UpdateRelation,
    ) -> Result<product_consumable_relation::Model, ServiceError> {
        let db = self.db_pool.as_ref();

        let current = ProductConsumableRelation::find()
            .filter(product_consumable_relation::Column::Id.eq(relation_id))
            .filter(product_consumable_relation::Column::TenantId.eq(tenant_id))
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound("Product-consumable relation not found".to_string())
            })?;

        if let Some(quantity) = input.quantity_required {
            if quantity <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(format!(
                    "quantityRequired must be positive, got {}",
                    quantity
                )));
            }
        }

        let mut model: product_consumable_relation::ActiveModel = current.into();
        if let Some(quantity) = input.quantity_required {
            model.quantity_required = Set(quantity);
        }
        if let Some(is_required) = input.is_required {
            model.is_required = Set(is_required);
        }
        if let Some(is_auto_deducted) = input.is_auto_deducted {
            model.is_auto_deducted = Set(is_auto_deducted);
        }
        if let Some(priority) = input.priority {
            model.priority = Set(priority);
        }
        if let Some(context) = input.applicable_context {
            model.applicable_context = Set(context.to_string());
        }
        if let Some(notes) = input.notes {
            model.notes = Set(Some(notes));
        }
        if let Some(is_active) = input.is_active {
            model.is_active = Set(is_active);
        }
        model.updated_at = Set(Utc::now());

        let updated = model.update(db).await?;
        info!(relation_id = %updated.id, "Updated product-consumable relation");
        Ok(updated)
    }

    /// Removes a relation edge. Relations are plain configuration, not
    /// history, so hard deletion is allowed here.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, relation_id = %relation_id))]
    pub async fn delete_relation(
        &self,
        tenant_id: Uuid,
        relation_id: Uuid,
    ) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();

        let relation = ProductConsumableRelation::find()
            .filter(product_consumable_relation::Column::Id.eq(relation_id))
            .filter(product_consumable_relation::Column::TenantId.eq(tenant_id))
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound("Product-consumable relation not found".to_string())
            })?;

        relation.delete(db).await?;
        info!(%relation_id, "Deleted product-consumable relation");
        Ok(())
    }

    /// Active consumable relations for a product, by priority.
    pub async fn get_product_consumables(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
    ) -> Result<Vec<product_consumable_relation::Model>, ServiceError> {
        let relations = ProductConsumableRelation::find()
            .filter(product_consumable_relation::Column::TenantId.eq(tenant_id))
            .filter(product_consumable_relation::Column::ProductId.eq(product_id))
            .filter(product_consumable_relation::Column::IsActive.eq(true))
            .order_by_asc(product_consumable_relation::Column::Priority)
            .all(self.db_pool.as_ref())
            .await?;
        Ok(relations)
    }

    /// All products that consume a given consumable.
    pub async fn get_products_using_consumable(
        &self,
        tenant_id: Uuid,
        consumable_id: Uuid,
    ) -> Result<Vec<product_consumable_relation::Model>, ServiceError> {
        let relations = ProductConsumableRelation::find()
            .filter(product_consumable_relation::Column::TenantId.eq(tenant_id))
            .filter(product_consumable_relation::Column::ConsumableId.eq(consumable_id))
            .filter(product_consumable_relation::Column::IsActive.eq(true))
            .all(self.db_pool.as_ref())
            .await?;
        Ok(relations)
    }

    async fn validate_unit_field(
        &self,
        unit_type_id: Uuid,
        field: &str,
        unit: Option<&str>,
    ) -> Result<(), ServiceError> {
        let unit_type = self.unit_types.get(unit_type_id).await.map_err(|e| match e {
            ServiceError::NotFound(_) => ServiceError::ValidationError(format!(
                "UnitType {} not found",
                unit_type_id
            )),
            other => other,
        })?;

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

        Ok(())
    }
}
