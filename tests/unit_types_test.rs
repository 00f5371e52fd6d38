mod common;

use common::test_services;
use stocklot::{
    entities::unit_type::{BaseUnit, UnitCategory, UnitConversion},
    errors::ServiceError,
    services::unit_types::{CreateUnitType, UnitTypeFilter, UpdateUnitType},
};
use uuid::Uuid;

fn conversion(unit: &str, abbr: &str, factor: f64, is_base: bool) -> UnitConversion {
    UnitConversion {
        unit: unit.to_string(),
        abbreviation: abbr.to_string(),
        plural_name: None,
        factor,
        is_base,
        symbol: None,
    }
}

fn weight_definition(name: &str) -> CreateUnitType {
    CreateUnitType {
        name: name.to_string(),
        description: None,
        category: UnitCategory::Weight,
        base_unit: BaseUnit {
            name: "kilogram".to_string(),
            abbreviation: "kg".to_string(),
        },
        conversions: vec![
            conversion("kilogram", "kg", 1.0, true),
            conversion("gram", "g", 0.001, false),
            conversion("pound", "lb", 0.453592, false),
        ],
        is_system_defined: false,
    }
}

#[tokio::test]
async fn converts_between_units_with_fixed_precision() {
    let (services, _rx, _pool) = test_services().await;
    let tenant_id = Uuid::new_v4();

    let unit_type = services
        .unit_types
        .create(Some(tenant_id), weight_definition("Weight A"), None)
        .await
        .expect("create failed");

    let outcome = services
        .unit_types
        .convert(unit_type.id, "kg", "g", 5.5)
        .await
        .expect("conversion failed");

    assert_eq!(outcome.converted.quantity, 5500.0);
    assert_eq!(outcome.converted.unit, "g");
    assert_eq!(outcome.factor, 0.001);
    assert_eq!(outcome.unit_type_name, "Weight A");
    assert_eq!(outcome.original.quantity, 5.5);
}

#[tokio::test]
async fn conversion_round_trip_is_stable_within_tolerance() {
    let (services, _rx, _pool) = test_services().await;
    let tenant_id = Uuid::new_v4();

    let unit_type = services
        .unit_types
        .create(Some(tenant_id), weight_definition("Weight B"), None)
        .await
        .expect("create failed");

    let quantities = [0.5, 1.0, 5.5, 42.0, 9_999.25];
    // Pairs whose scale gap the 5-decimal precision can absorb; a round
    // trip like g -> lb amplifies the last-place rounding of the tiny
    // intermediate value far beyond the contract and is not claimed.
    let pairs = [("kg", "g"), ("g", "kg"), ("kg", "lb"), ("lb", "kg")];
    for &quantity in &quantities {
        for (from, to) in &pairs {
            let there = services
                .unit_types
                .convert(unit_type.id, from, to, quantity)
                .await
                .unwrap();
            let back = services
                .unit_types
                .convert(unit_type.id, to, from, there.converted.quantity)
                .await
                .unwrap();
            assert!(
                (back.converted.quantity - quantity).abs() <= 1e-5 + 1e-9,
                "{} {} -> {} -> {} drifted: {}",
                quantity,
                from,
                to,
                from,
                back.converted.quantity
            );
        }
    }
}

#[tokio::test]
async fn unknown_units_are_rejected_by_name() {
    let (services, _rx, _pool) = test_services().await;
    let tenant_id = Uuid::new_v4();

    let unit_type = services
        .unit_types
        .create(Some(tenant_id), weight_definition("Weight C"), None)
        .await
        .unwrap();

    let err = services
        .unit_types
        .convert(unit_type.id, "kg", "stone", 1.0)
        .await
        .unwrap_err();
    match err {
        ServiceError::ValidationError(msg) => assert!(msg.contains("stone")),
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn conversion_factor_returns_only_the_ratio() {
    let (services, _rx, _pool) = test_services().await;
    let tenant_id = Uuid::new_v4();

    let unit_type = services
        .unit_types
        .create(Some(tenant_id), weight_definition("Weight D"), None)
        .await
        .unwrap();

    let factor = services
        .unit_types
        .conversion_factor(unit_type.id, "kg", "g")
        .await
        .unwrap();
    assert_eq!(factor, 0.001);
}

#[tokio::test]
async fn duplicate_names_are_rejected_within_scope() {
    let (services, _rx, _pool) = test_services().await;
    let tenant_id = Uuid::new_v4();

    services
        .unit_types
        .create(Some(tenant_id), weight_definition("Weight E"), None)
        .await
        .unwrap();
    let err = services
        .unit_types
        .create(Some(tenant_id), weight_definition("Weight E"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    // A different tenant may reuse the name.
    services
        .unit_types
        .create(Some(Uuid::new_v4()), weight_definition("Weight E"), None)
        .await
        .expect("same name in another tenant scope must be allowed");
}

#[tokio::test]
async fn system_defined_types_are_immutable() {
    let (services, _rx, _pool) = test_services().await;

    let mut definition = weight_definition("System Weight X");
    definition.is_system_defined = true;
    let unit_type = services
        .unit_types
        .create(None, definition, None)
        .await
        .unwrap();

    let update_err = services
        .unit_types
        .update(
            unit_type.id,
            UpdateUnitType {
                name: Some("Renamed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(update_err, ServiceError::InvalidOperation(_)));

    let delete_err = services.unit_types.deactivate(unit_type.id).await.unwrap_err();
    assert!(matches!(delete_err, ServiceError::InvalidOperation(_)));
}

#[tokio::test]
async fn non_system_types_can_be_updated_and_deactivated() {
    let (services, _rx, _pool) = test_services().await;
    let tenant_id = Uuid::new_v4();

    let unit_type = services
        .unit_types
        .create(Some(tenant_id), weight_definition("Weight F"), None)
        .await
        .unwrap();

    let updated = services
        .unit_types
        .update(
            unit_type.id,
            UpdateUnitType {
                description: Some("updated".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.description.as_deref(), Some("updated"));

    let deactivated = services.unit_types.deactivate(unit_type.id).await.unwrap();
    assert!(!deactivated.is_active);
}

#[tokio::test]
async fn update_revalidates_conversion_invariants() {
    let (services, _rx, _pool) = test_services().await;
    let tenant_id = Uuid::new_v4();

    let unit_type = services
        .unit_types
        .create(Some(tenant_id), weight_definition("Weight G"), None)
        .await
        .unwrap();

    let err = services
        .unit_types
        .update(
            unit_type.id,
            UpdateUnitType {
                conversions: Some(vec![
                    conversion("kilogram", "kg", 1.0, true),
                    conversion("gram", "g", 0.001, true),
                ]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn validate_unit_reports_membership() {
    let (services, _rx, _pool) = test_services().await;
    let tenant_id = Uuid::new_v4();

    let unit_type = services
        .unit_types
        .create(Some(tenant_id), weight_definition("Weight H"), None)
        .await
        .unwrap();

    let found = services
        .unit_types
        .validate_unit(unit_type.id, "g")
        .await
        .unwrap();
    assert!(found.is_some());

    let missing = services
        .unit_types
        .validate_unit(unit_type.id, "t")
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn seeding_system_types_is_idempotent() {
    let (services, _rx, _pool) = test_services().await;

    let first = services.unit_types.seed_system_unit_types().await.unwrap();
    let second = services.unit_types.seed_system_unit_types().await.unwrap();
    assert_eq!(second, 0);
    // Either this call seeded the tables or an earlier test already did.
    let listed = services
        .unit_types
        .list(
            None,
            UnitTypeFilter {
                is_system_defined: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(listed.len() >= first.max(5));
}

#[tokio::test]
async fn tenant_listing_includes_global_types() {
    let (services, _rx, _pool) = test_services().await;
    let tenant_id = Uuid::new_v4();

    services.unit_types.seed_system_unit_types().await.unwrap();
    services
        .unit_types
        .create(Some(tenant_id), weight_definition("Tenant Weight"), None)
        .await
        .unwrap();

    let listed = services
        .unit_types
        .list(
            Some(tenant_id),
            UnitTypeFilter {
                include_custom: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(listed.iter().any(|u| u.tenant_id == Some(tenant_id)));
    assert!(listed.iter().any(|u| u.tenant_id.is_none()));

    let by_name = services
        .unit_types
        .find_by_name("Tenant Weight", Some(tenant_id))
        .await
        .unwrap();
    assert!(by_name.is_some());
}
