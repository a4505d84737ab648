//! End-to-end order workflow over the in-memory store.

use std::sync::Arc;

use vantage_core::{
    CoreError, Customer, LoyaltyTier, Money, OrderStatus, PaymentMethod, PaymentStatus, Principal,
    Product, Role, TaxRate,
};
use vantage_orders::{
    CreateOrderRequest, MemoryStore, OrderItemRequest, OrderService, Settlement,
};

struct Fixture {
    store: Arc<MemoryStore>,
    service: OrderService<MemoryStore>,
    cashier: Principal,
    manager: Principal,
}

async fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    store
        .seed_product(Product::new("p-mug", "Mug", Money::from_cents(1000), 10))
        .await;
    store
        .seed_product(Product::new("p-tea", "Tea", Money::from_cents(500), 1))
        .await;
    store
        .seed_customer(Customer::new("c-1", "Ada", "Lovelace", "ada@example.com"))
        .await;

    Fixture {
        service: OrderService::new(store.clone(), TaxRate::from_bps(1000)),
        store,
        cashier: Principal::new("u-cashier", Role::Employee),
        manager: Principal::new("u-manager", Role::Manager),
    }
}

async fn three_mugs(fx: &Fixture) -> String {
    fx.service
        .create_order(
            CreateOrderRequest::new("c-1", vec![OrderItemRequest::new("p-mug", 3)]),
            &fx.cashier,
        )
        .await
        .unwrap()
        .order
        .id
}

async fn pay_cash(fx: &Fixture, order_id: &str, cents: i64) -> vantage_orders::PaymentOutcome {
    fx.service
        .payments()
        .collect_payment(
            order_id,
            Money::from_cents(cents),
            PaymentMethod::Cash,
            Settlement::Cash {
                tendered_cents: cents,
            },
            &fx.cashier,
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn split_tender_completes_order_and_accrues_loyalty() {
    let fx = fixture().await;
    let order_id = three_mugs(&fx).await;

    let view = fx.service.get_order(&order_id).await.unwrap();
    assert_eq!(view.order.total_cents, 3300);

    let first = pay_cash(&fx, &order_id, 2000).await;
    assert_eq!(first.remaining_balance.cents(), 1300);
    assert_eq!(first.order.status, OrderStatus::Pending);

    let second = pay_cash(&fx, &order_id, 1300).await;
    assert!(second.remaining_balance.is_zero());
    assert_eq!(second.order.status, OrderStatus::Completed);
    assert_eq!(second.order.loyalty_points_earned, 33);
    assert!(second.order.completed_at.is_some());

    let customer = fx.store.customer_snapshot("c-1").await.unwrap();
    assert_eq!(customer.loyalty.points_balance, 33);
    assert_eq!(customer.loyalty.lifetime_spend_cents, 3300);
    assert_eq!(customer.loyalty.tier, LoyaltyTier::Bronze);

    let err = fx
        .service
        .payments()
        .record_payment(&order_id, Money::from_cents(1), PaymentMethod::Cash, &fx.cashier)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::OrderClosed { .. }));
}

#[tokio::test]
async fn overpayment_is_rejected_without_a_record() {
    let fx = fixture().await;
    let order_id = three_mugs(&fx).await;
    pay_cash(&fx, &order_id, 3000).await;

    let err = fx
        .service
        .payments()
        .record_payment(&order_id, Money::from_cents(301), PaymentMethod::Cash, &fx.cashier)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CoreError::ExceedsOrderTotal { remaining, .. } if remaining.cents() == 300
    ));
    assert_eq!(fx.store.payment_count(&order_id).await, 1);
}

#[tokio::test]
async fn refund_is_capped_by_completed_payments() {
    let fx = fixture().await;
    let order_id = fx
        .service
        .create_order(
            CreateOrderRequest::new("c-1", vec![OrderItemRequest::new("p-tea", 1)])
                .with_payment_method(PaymentMethod::Cash),
            &fx.cashier,
        )
        .await
        .unwrap()
        .order
        .id;

    // 500 + 50 tax = 550; settle the intent recorded at creation.
    let intent = fx.service.payments().payments(&order_id).await.unwrap().remove(0);
    fx.service
        .payments()
        .complete_payment(&intent.id, Settlement::Cash { tendered_cents: 600 })
        .await
        .unwrap();

    let ledger = fx.service.payments();
    let err = ledger
        .record_refund(&order_id, Money::from_cents(600), "customer return", &fx.manager)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ExceedsPaidAmount { .. }));

    let outcome = ledger
        .record_refund(&order_id, Money::from_cents(550), "customer return", &fx.manager)
        .await
        .unwrap();
    assert_eq!(outcome.order.status, OrderStatus::Refunded);
    assert_eq!(outcome.records[0].status, PaymentStatus::Refunded);
    assert_eq!(outcome.records[0].amount_cents, -550);

    let err = ledger
        .record_refund(&order_id, Money::from_cents(1), "again", &fx.manager)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ExceedsPaidAmount { .. }));
}

#[tokio::test]
async fn short_second_line_releases_the_first() {
    let fx = fixture().await;

    let err = fx
        .service
        .create_order(
            CreateOrderRequest::new(
                "c-1",
                vec![OrderItemRequest::new("p-mug", 4), OrderItemRequest::new("p-tea", 2)],
            ),
            &fx.cashier,
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CoreError::InsufficientStock { available: 1, requested: 2, .. }
    ));
    assert_eq!(fx.store.product_snapshot("p-mug").await.unwrap().stock_quantity, 10);
    assert_eq!(fx.store.product_snapshot("p-tea").await.unwrap().stock_quantity, 1);
    assert_eq!(fx.store.order_count().await, 0);
}

#[tokio::test]
async fn cancel_restores_stock_exactly_once() {
    let fx = fixture().await;
    let order_id = three_mugs(&fx).await;
    assert_eq!(fx.store.product_snapshot("p-mug").await.unwrap().stock_quantity, 7);

    let view = fx
        .service
        .transition_status(&order_id, "cancelled", &fx.cashier)
        .await
        .unwrap();
    assert_eq!(view.order.status, OrderStatus::Cancelled);
    assert_eq!(fx.store.product_snapshot("p-mug").await.unwrap().stock_quantity, 10);

    let err = fx
        .service
        .transition_status(&order_id, "CANCELLED", &fx.cashier)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::InvalidTransition { from: OrderStatus::Cancelled, to: OrderStatus::Cancelled, .. }
    ));
    assert_eq!(fx.store.product_snapshot("p-mug").await.unwrap().stock_quantity, 10);
}

#[tokio::test]
async fn cancel_fails_pending_payments_and_returns_redeemed_points() {
    let fx = fixture().await;
    let mut customer = fx.store.customer_snapshot("c-1").await.unwrap();
    customer.loyalty.points_balance = 200;
    fx.store.seed_customer(customer).await;

    let view = fx
        .service
        .create_order(
            CreateOrderRequest::new("c-1", vec![OrderItemRequest::new("p-mug", 1)])
                .with_discount(vantage_core::DiscountKind::LoyaltyPoints, 200)
                .with_payment_method(PaymentMethod::CreditCard),
            &fx.cashier,
        )
        .await
        .unwrap();
    assert_eq!(view.order.loyalty_points_redeemed, 200);
    assert_eq!(fx.store.customer_snapshot("c-1").await.unwrap().loyalty.points_balance, 0);

    fx.service
        .transition_status(&view.order.id, "CANCELLED", &fx.cashier)
        .await
        .unwrap();

    let payments = fx.service.payments().payments(&view.order.id).await.unwrap();
    assert!(payments.iter().all(|p| p.status == PaymentStatus::Failed));
    assert_eq!(fx.store.customer_snapshot("c-1").await.unwrap().loyalty.points_balance, 200);
}

#[tokio::test]
async fn refund_before_fulfilment_restocks_and_ends_the_order() {
    let fx = fixture().await;
    let order_id = three_mugs(&fx).await;
    pay_cash(&fx, &order_id, 1000).await;

    let err = fx
        .service
        .transition_status(&order_id, "CANCELLED", &fx.cashier)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidTransition { .. }));

    fx.service
        .payments()
        .record_refund(&order_id, Money::from_cents(1000), "changed mind", &fx.manager)
        .await
        .unwrap();

    // Fully refunded the paid part, so the order itself is now REFUNDED.
    let view = fx.service.get_order(&order_id).await.unwrap();
    assert_eq!(view.order.status, OrderStatus::Refunded);

    // The order was never fulfilled, so its mugs go back on the shelf.
    assert_eq!(
        fx.store.product_snapshot("p-mug").await.unwrap().stock_quantity,
        10
    );
    assert!(matches!(
        fx.service.transition_status(&order_id, "CANCELLED", &fx.cashier).await,
        Err(CoreError::InvalidTransition { .. })
    ));
    assert_eq!(
        fx.store.product_snapshot("p-mug").await.unwrap().stock_quantity,
        10
    );
}

#[tokio::test]
async fn manual_transitions_follow_the_table() {
    let fx = fixture().await;
    let order_id = three_mugs(&fx).await;

    let view = fx
        .service
        .transition_status(&order_id, "processing", &fx.cashier)
        .await
        .unwrap();
    assert_eq!(view.order.status, OrderStatus::Processing);

    assert!(matches!(
        fx.service.transition_status(&order_id, "COMPLETED", &fx.cashier).await,
        Err(CoreError::InvalidTransition { .. })
    ));
    assert!(matches!(
        fx.service.transition_status(&order_id, "REFUNDED", &fx.cashier).await,
        Err(CoreError::InvalidTransition { .. })
    ));
    assert!(matches!(
        fx.service.transition_status(&order_id, "SHIPPED", &fx.cashier).await,
        Err(CoreError::InvalidStatus(_))
    ));

    pay_cash(&fx, &order_id, 3300).await;
    let view = fx.service.get_order(&order_id).await.unwrap();
    assert_eq!(view.order.status, OrderStatus::Completed);
    assert!(view.is_fully_paid);
}

#[tokio::test]
async fn concurrent_orders_never_oversell() {
    let fx = fixture().await;

    let mut handles = Vec::new();
    for _ in 0..4 {
        let service = fx.service.clone();
        let cashier = fx.cashier.clone();
        handles.push(tokio::spawn(async move {
            service
                .create_order(
                    CreateOrderRequest::new("c-1", vec![OrderItemRequest::new("p-mug", 3)]),
                    &cashier,
                )
                .await
        }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(err) => assert!(matches!(err, CoreError::InsufficientStock { .. })),
        }
    }

    assert_eq!(created, 3);
    assert_eq!(fx.store.product_snapshot("p-mug").await.unwrap().stock_quantity, 1);
}
