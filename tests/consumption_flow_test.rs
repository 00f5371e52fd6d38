mod common;

use common::{create_product, date, receive_lot, test_services};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use stocklot::{
    entities::product::{self, ProductType},
    entities::product_consumable_relation::ApplicableContext,
    events::{Event, OrderCancelledEvent, OrderCreatedEvent, OrderEventItem},
    services::consumables::CreateRelation,
    services::consumables::CreateConsumableConfig,
    services::AppServices,
};
use uuid::Uuid;

async fn configure_consumable(
    services: &AppServices,
    tenant_id: Uuid,
    consumable: &product::Model,
) {
    services
        .consumables
        .create_config(
            tenant_id,
            consumable.id,
            CreateConsumableConfig {
                consumable_type: "packaging".to_string(),
                is_reusable: false,
                is_auto_deducted: true,
                default_quantity_per_use: Some(dec!(1)),
                unit_type_id: None,
                default_unit: None,
                custom_conversions: None,
                notes: None,
            },
            None,
        )
        .await
        .expect("failed to create consumable config");
}

async fn relate(
    services: &AppServices,
    tenant_id: Uuid,
    product: &product::Model,
    consumable: &product::Model,
    quantity_required: Decimal,
    context: ApplicableContext,
) {
    services
        .consumables
        .create_relation(
            tenant_id,
            CreateRelation {
                product_id: product.id,
                consumable_id: consumable.id,
                quantity_required,
                is_required: true,
                is_auto_deducted: true,
                priority: 0,
                applicable_context: Some(context),
                notes: None,
            },
            None,
        )
        .await
        .expect("failed to create relation");
}

#[tokio::test]
async fn order_created_deducts_related_consumables() {
    let (services, _rx, pool) = test_services().await;
    let tenant_id = Uuid::new_v4();
    let order_id = Uuid::new_v4();

    let burger =
        create_product(&pool, tenant_id, "BURGER-01", "Burger", ProductType::Sellable).await;
    let wrapper =
        create_product(&pool, tenant_id, "WRAP-A", "Wrapper", ProductType::Consumable).await;
    configure_consumable(&services, tenant_id, &wrapper).await;
    relate(
        &services,
        tenant_id,
        &burger,
        &wrapper,
        dec!(2),
        ApplicableContext::Always,
    )
    .await;
    receive_lot(
        &services,
        tenant_id,
        &wrapper,
        "W1",
        dec!(100),
        date(2025, 1, 1),
        Some(date(2025, 12, 1)),
    )
    .await;

    services
        .orchestrator
        .handle_order_created(&OrderCreatedEvent {
            order_id,
            tenant_id,
            items: vec![OrderEventItem {
                product_id: burger.id,
                quantity: dec!(3),
            }],
            order_type: None,
            user_id: None,
        })
        .await;

    // 3 burgers x 2 wrappers each.
    let snapshot = services
        .ledger
        .snapshot(tenant_id, wrapper.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.inventory.total_quantity, dec!(94));
}

#[tokio::test]
async fn relations_outside_the_order_context_are_skipped() {
    let (services, _rx, pool) = test_services().await;
    let tenant_id = Uuid::new_v4();

    let coffee =
        create_product(&pool, tenant_id, "COFFEE-01", "Coffee", ProductType::Sellable).await;
    let to_go_cup =
        create_product(&pool, tenant_id, "TOGO-A", "To-go cup", ProductType::Consumable).await;
    let ceramic_saucer =
        create_product(&pool, tenant_id, "SAUCER-A", "Saucer", ProductType::Consumable).await;
    configure_consumable(&services, tenant_id, &to_go_cup).await;
    configure_consumable(&services, tenant_id, &ceramic_saucer).await;
    relate(
        &services,
        tenant_id,
        &coffee,
        &to_go_cup,
        dec!(1),
        ApplicableContext::Takeaway,
    )
    .await;
    relate(
        &services,
        tenant_id,
        &coffee,
        &ceramic_saucer,
        dec!(1),
        ApplicableContext::DineIn,
    )
    .await;
    receive_lot(
        &services,
        tenant_id,
        &to_go_cup,
        "T1",
        dec!(20),
        date(2025, 1, 1),
        None,
    )
    .await;
    receive_lot(
        &services,
        tenant_id,
        &ceramic_saucer,
        "S1",
        dec!(20),
        date(2025, 1, 1),
        None,
    )
    .await;

    services
        .orchestrator
        .handle_order_created(&OrderCreatedEvent {
            order_id: Uuid::new_v4(),
            tenant_id,
            items: vec![OrderEventItem {
                product_id: coffee.id,
                quantity: dec!(2),
            }],
            order_type: Some("takeaway".to_string()),
            user_id: None,
        })
        .await;

    let cups = services
        .ledger
        .snapshot(tenant_id, to_go_cup.id)
        .await
        .unwrap()
        .unwrap();
    let saucers = services
        .ledger
        .snapshot(tenant_id, ceramic_saucer.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cups.inventory.total_quantity, dec!(18));
    assert_eq!(saucers.inventory.total_quantity, dec!(20));
}

#[tokio::test]
async fn one_failing_relation_does_not_block_the_others() {
    let (services, _rx, pool) = test_services().await;
    let tenant_id = Uuid::new_v4();

    let salad = create_product(&pool, tenant_id, "SALAD-01", "Salad", ProductType::Sellable).await;
    // This consumable never receives stock, so its deduction is skipped
    // with a warning.
    let missing =
        create_product(&pool, tenant_id, "MISSING-A", "Missing", ProductType::Consumable).await;
    let fork = create_product(&pool, tenant_id, "FORK-A", "Fork", ProductType::Consumable).await;
    configure_consumable(&services, tenant_id, &missing).await;
    configure_consumable(&services, tenant_id, &fork).await;
    relate(
        &services,
        tenant_id,
        &salad,
        &missing,
        dec!(1),
        ApplicableContext::Always,
    )
    .await;
    relate(
        &services,
        tenant_id,
        &salad,
        &fork,
        dec!(1),
        ApplicableContext::Always,
    )
    .await;
    receive_lot(
        &services,
        tenant_id,
        &fork,
        "F1",
        dec!(10),
        date(2025, 1, 1),
        None,
    )
    .await;

    services
        .orchestrator
        .handle_order_created(&OrderCreatedEvent {
            order_id: Uuid::new_v4(),
            tenant_id,
            items: vec![OrderEventItem {
                product_id: salad.id,
                quantity: dec!(1),
            }],
            order_type: None,
            user_id: None,
        })
        .await;

    let forks = services
        .ledger
        .snapshot(tenant_id, fork.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(forks.inventory.total_quantity, dec!(9));
}

#[tokio::test]
async fn cancelling_an_order_restores_its_deductions() {
    let (services, _rx, pool) = test_services().await;
    let tenant_id = Uuid::new_v4();
    let order_id = Uuid::new_v4();

    let soup = create_product(&pool, tenant_id, "SOUP-01", "Soup", ProductType::Sellable).await;
    let spoon = create_product(&pool, tenant_id, "SPOON-A", "Spoon", ProductType::Consumable).await;
    configure_consumable(&services, tenant_id, &spoon).await;
    relate(
        &services,
        tenant_id,
        &soup,
        &spoon,
        dec!(1),
        ApplicableContext::Always,
    )
    .await;
    receive_lot(
        &services,
        tenant_id,
        &spoon,
        "SP1",
        dec!(30),
        date(2025, 1, 1),
        Some(date(2025, 8, 1)),
    )
    .await;

    let items = vec![OrderEventItem {
        product_id: soup.id,
        quantity: dec!(4),
    }];

    services
        .orchestrator
        .handle_order_created(&OrderCreatedEvent {
            order_id,
            tenant_id,
            items: items.clone(),
            order_type: None,
            user_id: None,
        })
        .await;

    let after_deduction = services
        .ledger
        .snapshot(tenant_id, spoon.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after_deduction.inventory.total_quantity, dec!(26));

    services
        .orchestrator
        .handle_order_cancelled(&OrderCancelledEvent {
            order_id,
            tenant_id,
            items,
            user_id: None,
        })
        .await;

    let after_restore = services
        .ledger
        .snapshot(tenant_id, spoon.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after_restore.inventory.total_quantity, dec!(30));
}

#[tokio::test]
async fn orchestrator_emits_notifications_for_deductions() {
    let (services, mut rx, pool) = test_services().await;
    let tenant_id = Uuid::new_v4();
    let order_id = Uuid::new_v4();

    let tea = create_product(&pool, tenant_id, "TEA-01", "Tea", ProductType::Sellable).await;
    let bag = create_product(&pool, tenant_id, "TEABAG-A", "Tea bag", ProductType::Consumable).await;
    configure_consumable(&services, tenant_id, &bag).await;
    relate(
        &services,
        tenant_id,
        &tea,
        &bag,
        dec!(1),
        ApplicableContext::Always,
    )
    .await;
    // Only 2 in stock for a 5-unit request: expect a partial warning too.
    receive_lot(
        &services,
        tenant_id,
        &bag,
        "TB1",
        dec!(2),
        date(2025, 1, 1),
        None,
    )
    .await;

    services
        .orchestrator
        .handle_order_created(&OrderCreatedEvent {
            order_id,
            tenant_id,
            items: vec![OrderEventItem {
                product_id: tea.id,
                quantity: dec!(5),
            }],
            order_type: None,
            user_id: None,
        })
        .await;

    let mut saw_deduction = false;
    let mut saw_partial_warning = false;
    while let Ok(event) = rx.try_recv() {
        match event {
            Event::ConsumableDeducted {
                order_id: seen,
                allocated,
                ..
            } if seen == order_id => {
                saw_deduction = true;
                assert_eq!(allocated, dec!(2));
            }
            Event::PartialDeductionWarning {
                order_id: seen,
                requested,
                allocated,
                ..
            } if seen == order_id => {
                saw_partial_warning = true;
                assert_eq!(requested, dec!(5));
                assert_eq!(allocated, dec!(2));
            }
            _ => {}
        }
    }
    assert!(saw_deduction);
    assert!(saw_partial_warning);
}

#[tokio::test]
async fn events_for_unconfigured_products_are_harmless() {
    let (services, _rx, _pool) = test_services().await;
    let tenant_id = Uuid::new_v4();

    // Unknown product, no relations, no inventory: the handler must simply
    // log and move on.
    services
        .orchestrator
        .handle_order_created(&OrderCreatedEvent {
            order_id: Uuid::new_v4(),
            tenant_id,
            items: vec![OrderEventItem {
                product_id: Uuid::new_v4(),
                quantity: dec!(1),
            }],
            order_type: None,
            user_id: None,
        })
        .await;

    services
        .orchestrator
        .handle_order_cancelled(&OrderCancelledEvent {
            order_id: Uuid::new_v4(),
            tenant_id,
            items: vec![],
            user_id: None,
        })
        .await;
}

#[tokio::test]
async fn run_loop_processes_events_from_the_channel() {
    let (services, _rx, pool) = test_services().await;
    let tenant_id = Uuid::new_v4();
    let order_id = Uuid::new_v4();

    let cake = create_product(&pool, tenant_id, "CAKE-01", "Cake", ProductType::Sellable).await;
    let candle =
        create_product(&pool, tenant_id, "CANDLE-A", "Candle", ProductType::Consumable).await;
    configure_consumable(&services, tenant_id, &candle).await;
    relate(
        &services,
        tenant_id,
        &cake,
        &candle,
        dec!(1),
        ApplicableContext::Always,
    )
    .await;
    receive_lot(
        &services,
        tenant_id,
        &candle,
        "C1",
        dec!(12),
        date(2025, 1, 1),
        None,
    )
    .await;

    let (order_tx, order_rx) = tokio::sync::mpsc::channel(8);
    let orchestrator = services.orchestrator.clone();
    let worker = tokio::spawn(orchestrator.run(order_rx));

    order_tx
        .send(Event::OrderCreated(OrderCreatedEvent {
            order_id,
            tenant_id,
            items: vec![OrderEventItem {
                product_id: cake.id,
                quantity: dec!(1),
            }],
            order_type: None,
            user_id: None,
        }))
        .await
        .unwrap();
    drop(order_tx);
    worker.await.unwrap();

    let snapshot = services
        .ledger
        .snapshot(tenant_id, candle.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.inventory.total_quantity, dec!(11));
}
