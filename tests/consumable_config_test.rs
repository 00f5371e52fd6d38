mod common;

use common::{create_product, test_services};
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;
use stocklot::{
    entities::product::{self, ProductType},
    entities::unit_type::{BaseUnit, UnitCategory, UnitConversion},
    errors::ServiceError,
    services::consumables::{
        ConsumableConfigFilter, CreateConsumableConfig, CreateRelation, UpdateRelation,
    },
    services::supplies::CreateSupplyConfig,
    services::unit_types::CreateUnitType,
    services::AppServices,
};
use uuid::Uuid;

fn base_config() -> CreateConsumableConfig {
    CreateConsumableConfig {
        consumable_type: "packaging".to_string(),
        is_reusable: false,
        is_auto_deducted: true,
        default_quantity_per_use: Some(dec!(1)),
        unit_type_id: None,
        default_unit: None,
        custom_conversions: None,
        notes: None,
    }
}

async fn create_volume_unit_type(
    services: &AppServices,
    tenant_id: Uuid,
    name: &str,
) -> stocklot::entities::unit_type::Model {
    services
        .unit_types
        .create(
            Some(tenant_id),
            CreateUnitType {
                name: name.to_string(),
                description: None,
                category: UnitCategory::Volume,
                base_unit: BaseUnit {
                    name: "liter".to_string(),
                    abbreviation: "L".to_string(),
                },
                conversions: vec![
                    UnitConversion {
                        unit: "liter".to_string(),
                        abbreviation: "L".to_string(),
                        plural_name: None,
                        factor: 1.0,
                        is_base: true,
                        symbol: None,
                    },
                    UnitConversion {
                        unit: "milliliter".to_string(),
                        abbreviation: "ml".to_string(),
                        plural_name: None,
                        factor: 0.001,
                        is_base: false,
                        symbol: None,
                    },
                ],
                is_system_defined: false,
            },
            None,
        )
        .await
        .expect("failed to create unit type")
}

#[tokio::test]
async fn config_requires_an_existing_product() {
    let (services, _rx, _pool) = test_services().await;

    let err = services
        .consumables
        .create_config(Uuid::new_v4(), Uuid::new_v4(), base_config(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn one_consumable_config_per_product() {
    let (services, _rx, pool) = test_services().await;
    let tenant_id = Uuid::new_v4();

    let sleeve =
        create_product(&pool, tenant_id, "SLEEVE-01", "Sleeve", ProductType::Sellable).await;
    services
        .consumables
        .create_config(tenant_id, sleeve.id, base_config(), None)
        .await
        .unwrap();

    let err = services
        .consumables
        .create_config(tenant_id, sleeve.id, base_config(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn configuring_flips_the_product_type_to_consumable() {
    let (services, _rx, pool) = test_services().await;
    let tenant_id = Uuid::new_v4();

    let ribbon =
        create_product(&pool, tenant_id, "RIBBON-01", "Ribbon", ProductType::Sellable).await;
    services
        .consumables
        .create_config(tenant_id, ribbon.id, base_config(), None)
        .await
        .unwrap();

    let reloaded = product::Entity::find_by_id(ribbon.id)
        .one(pool.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.product_type, ProductType::Consumable.as_str());
}

#[tokio::test]
async fn config_units_are_validated_against_the_unit_type() {
    let (services, _rx, pool) = test_services().await;
    let tenant_id = Uuid::new_v4();

    let unit_type = create_volume_unit_type(&services, tenant_id, "Volume Cfg A").await;
    let syrup = create_product(&pool, tenant_id, "SYRUP-01", "Syrup", ProductType::Sellable).await;

    let mut invalid = base_config();
    invalid.unit_type_id = Some(unit_type.id);
    invalid.default_unit = Some("kg".to_string());
    let err = services
        .consumables
        .create_config(tenant_id, syrup.id, invalid, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let mut valid = base_config();
    valid.unit_type_id = Some(unit_type.id);
    valid.default_unit = Some("ml".to_string());
    services
        .consumables
        .create_config(tenant_id, syrup.id, valid, None)
        .await
        .expect("valid unit must be accepted");
}

#[tokio::test]
async fn supply_config_validates_all_unit_fields() {
    let (services, _rx, pool) = test_services().await;
    let tenant_id = Uuid::new_v4();

    let unit_type = create_volume_unit_type(&services, tenant_id, "Volume Cfg B").await;
    let oil = create_product(&pool, tenant_id, "OIL-01", "Oil", ProductType::Supply).await;

    let err = services
        .supplies
        .create_config(
            tenant_id,
            oil.id,
            CreateSupplyConfig {
                supply_type: "kitchen".to_string(),
                unit_type_id: Some(unit_type.id),
                default_unit: Some("L".to_string()),
                purchase_unit: Some("gal".to_string()),
                stock_unit: Some("L".to_string()),
                consumption_unit: Some("ml".to_string()),
                custom_conversions: None,
                notes: None,
            },
            None,
        )
        .await
        .unwrap_err();
    // "gal" is not part of this custom volume table.
    match err {
        ServiceError::ValidationError(msg) => assert!(msg.contains("purchaseUnit")),
        other => panic!("expected validation error, got {:?}", other),
    }

    services
        .supplies
        .create_config(
            tenant_id,
            oil.id,
            CreateSupplyConfig {
                supply_type: "kitchen".to_string(),
                unit_type_id: Some(unit_type.id),
                default_unit: Some("L".to_string()),
                purchase_unit: Some("L".to_string()),
                stock_unit: Some("L".to_string()),
                consumption_unit: Some("ml".to_string()),
                custom_conversions: None,
                notes: None,
            },
            None,
        )
        .await
        .expect("all-valid units must be accepted");
}

#[tokio::test]
async fn relation_requires_configured_consumable_and_positive_quantity() {
    let (services, _rx, pool) = test_services().await;
    let tenant_id = Uuid::new_v4();

    let sandwich =
        create_product(&pool, tenant_id, "SAND-01", "Sandwich", ProductType::Sellable).await;
    let pick = create_product(&pool, tenant_id, "PICK-01", "Pick", ProductType::Sellable).await;

    let err = services
        .consumables
        .create_relation(
            tenant_id,
            CreateRelation {
                product_id: sandwich.id,
                consumable_id: pick.id,
                quantity_required: dec!(0),
                is_required: true,
                is_auto_deducted: true,
                priority: 0,
                applicable_context: None,
                notes: None,
            },
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    // Positive quantity but the consumable has no configuration yet.
    let err = services
        .consumables
        .create_relation(
            tenant_id,
            CreateRelation {
                product_id: sandwich.id,
                consumable_id: pick.id,
                quantity_required: dec!(1),
                is_required: true,
                is_auto_deducted: true,
                priority: 0,
                applicable_context: None,
                notes: None,
            },
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn duplicate_relations_are_rejected() {
    let (services, _rx, pool) = test_services().await;
    let tenant_id = Uuid::new_v4();

    let bowl = create_product(&pool, tenant_id, "BOWL-01", "Bowl", ProductType::Sellable).await;
    let lid = create_product(&pool, tenant_id, "LID-A", "Lid", ProductType::Consumable).await;
    services
        .consumables
        .create_config(tenant_id, lid.id, base_config(), None)
        .await
        .unwrap();

    let relation = CreateRelation {
        product_id: bowl.id,
        consumable_id: lid.id,
        quantity_required: dec!(1),
        is_required: true,
        is_auto_deducted: true,
        priority: 0,
        applicable_context: None,
        notes: None,
    };
    services
        .consumables
        .create_relation(tenant_id, relation.clone(), None)
        .await
        .unwrap();
    let err = services
        .consumables
        .create_relation(tenant_id, relation, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn relations_can_be_updated_and_deleted() {
    let (services, _rx, pool) = test_services().await;
    let tenant_id = Uuid::new_v4();

    let wrap = create_product(&pool, tenant_id, "WRAP-B", "Wrap", ProductType::Sellable).await;
    let foil = create_product(&pool, tenant_id, "FOIL-B", "Foil", ProductType::Consumable).await;
    services
        .consumables
        .create_config(tenant_id, foil.id, base_config(), None)
        .await
        .unwrap();
    let relation = services
        .consumables
        .create_relation(
            tenant_id,
            CreateRelation {
                product_id: wrap.id,
                consumable_id: foil.id,
                quantity_required: dec!(1),
                is_required: true,
                is_auto_deducted: true,
                priority: 5,
                applicable_context: None,
                notes: None,
            },
            None,
        )
        .await
        .unwrap();

    let updated = services
        .consumables
        .update_relation(
            tenant_id,
            relation.id,
            UpdateRelation {
                quantity_required: Some(dec!(2.5)),
                priority: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.quantity_required, dec!(2.5));
    assert_eq!(updated.priority, 1);

    services
        .consumables
        .delete_relation(tenant_id, relation.id)
        .await
        .unwrap();
    let remaining = services
        .consumables
        .get_product_consumables(tenant_id, wrap.id)
        .await
        .unwrap();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn config_listing_honors_filters() {
    let (services, _rx, pool) = test_services().await;
    let tenant_id = Uuid::new_v4();

    let doily = create_product(&pool, tenant_id, "DOILY-01", "Doily", ProductType::Sellable).await;
    let mut config = base_config();
    config.consumable_type = "decoration".to_string();
    config.is_auto_deducted = false;
    services
        .consumables
        .create_config(tenant_id, doily.id, config, None)
        .await
        .unwrap();

    let matching = services
        .consumables
        .list_configs(
            tenant_id,
            ConsumableConfigFilter {
                consumable_type: Some("decoration".to_string()),
                is_auto_deducted: Some(false),
                is_active: Some(true),
            },
        )
        .await
        .unwrap();
    assert_eq!(matching.len(), 1);

    let none = services
        .consumables
        .list_configs(
            tenant_id,
            ConsumableConfigFilter {
                consumable_type: Some("packaging".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(none.is_empty());
}
