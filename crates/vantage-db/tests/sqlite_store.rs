//! Order workflow over SQLite, in memory and on a pooled database file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use vantage_core::ports::{Store, UnitOfWork};
use vantage_core::{
    CoreError, Customer, DiscountKind, LoyaltyTier, Money, OrderStatus, PaymentMethod,
    PaymentStatus, Principal, Product, Role, TaxRate,
};
use vantage_db::{Database, DbConfig};
use vantage_orders::{CreateOrderRequest, OrderItemRequest, OrderService, Settlement};

async fn setup() -> (Arc<Database>, OrderService<Database>) {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    db.insert_product(&Product::new("p-mug", "Mug", Money::from_cents(1000), 10))
        .await
        .unwrap();
    db.insert_product(&Product::new("p-tea", "Tea", Money::from_cents(500), 1))
        .await
        .unwrap();
    let mut customer = Customer::new("c-1", "Ada", "Lovelace", "ada@example.com");
    customer.loyalty.points_balance = 300;
    db.insert_customer(&customer).await.unwrap();

    let db = Arc::new(db);
    (db.clone(), OrderService::new(db, TaxRate::from_bps(1000)))
}

fn cashier() -> Principal {
    Principal::new("u-1", Role::Employee)
}

async fn stock(db: &Database, id: &str) -> i64 {
    let mut tx = db.begin().await.unwrap();
    tx.product(id).await.unwrap().unwrap().stock_quantity
}

#[tokio::test]
async fn order_round_trips_through_sqlite() {
    let (db, service) = setup().await;

    let created = service
        .create_order(
            CreateOrderRequest::new(
                "c-1",
                vec![OrderItemRequest::new("p-mug", 3), OrderItemRequest::new("p-tea", 1)],
            )
            .with_discount(DiscountKind::Fixed, 500)
            .with_payment_method(PaymentMethod::CreditCard),
            &cashier(),
        )
        .await
        .unwrap();

    let loaded = service.get_order(&created.order.id).await.unwrap();
    assert_eq!(loaded.order.id, created.order.id);
    assert_eq!(loaded.order.lines, created.order.lines);
    assert_eq!(loaded.order.discount_kind, Some(DiscountKind::Fixed));
    assert_eq!(loaded.order.lines.len(), 2);
    assert_eq!(loaded.order.lines[0].position, 0);
    // 3500 − 500 = 3000, + 300 tax
    assert_eq!(loaded.order.total_cents, 3300);
    assert_eq!(loaded.payments.len(), 1);
    assert_eq!(loaded.payments[0].status, PaymentStatus::Pending);

    assert_eq!(stock(&db, "p-mug").await, 7);
    assert_eq!(stock(&db, "p-tea").await, 0);
}

#[tokio::test]
async fn short_stock_rolls_back_the_whole_order() {
    let (db, service) = setup().await;

    let err = service
        .create_order(
            CreateOrderRequest::new(
                "c-1",
                vec![OrderItemRequest::new("p-mug", 2), OrderItemRequest::new("p-tea", 2)],
            ),
            &cashier(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::InsufficientStock { available: 1, .. }));
    assert_eq!(stock(&db, "p-mug").await, 10);
}

#[tokio::test]
async fn settlement_refund_and_loyalty_persist() {
    let (db, service) = setup().await;
    let order_id = service
        .create_order(
            CreateOrderRequest::new("c-1", vec![OrderItemRequest::new("p-mug", 1)]),
            &cashier(),
        )
        .await
        .unwrap()
        .order
        .id;
    let ledger = service.payments();

    let points = ledger
        .collect_payment(
            &order_id,
            Money::from_cents(300),
            PaymentMethod::LoyaltyPoints,
            Settlement::LoyaltyPoints,
            &cashier(),
        )
        .await
        .unwrap();
    assert_eq!(points.remaining_balance.cents(), 800);

    let card = ledger
        .collect_payment(
            &order_id,
            Money::from_cents(800),
            PaymentMethod::DebitCard,
            Settlement::Card {
                card_last4: "1234".into(),
                card_brand: "MASTERCARD".into(),
            },
            &cashier(),
        )
        .await
        .unwrap();
    assert_eq!(card.order.status, OrderStatus::Completed);
    // Points-funded 300 does not earn: (1100 − 300) / 100
    assert_eq!(card.order.loyalty_points_earned, 8);

    let customer = service.loyalty().customer("c-1").await.unwrap();
    assert_eq!(customer.loyalty.points_balance, 8);
    assert_eq!(customer.loyalty.lifetime_spend_cents, 800);
    assert_eq!(customer.loyalty.tier, LoyaltyTier::Bronze);

    let refund = ledger
        .record_refund(&order_id, Money::from_cents(1100), "wrong item", &Principal::new("m-1", Role::Manager))
        .await
        .unwrap();
    assert_eq!(refund.records.len(), 2);
    assert_eq!(refund.order.status, OrderStatus::Refunded);

    let view = service.get_order(&order_id).await.unwrap();
    assert_eq!(view.payments.len(), 4);
    let refund_rows: Vec<_> = view.payments.iter().filter(|p| p.refund.is_some()).collect();
    assert_eq!(refund_rows.len(), 2);
    assert_eq!(
        refund_rows[0].refund.as_ref().unwrap().source_payment_id,
        points.payment.id
    );
    assert_eq!(view.order.version, refund.order.version);

    // The order completed before the refund, so nothing is restocked.
    assert_eq!(stock(&db, "p-mug").await, 9);
}

#[tokio::test]
async fn cancel_releases_stock_once() {
    let (db, service) = setup().await;
    let order_id = service
        .create_order(
            CreateOrderRequest::new("c-1", vec![OrderItemRequest::new("p-mug", 4)]),
            &cashier(),
        )
        .await
        .unwrap()
        .order
        .id;

    service
        .transition_status(&order_id, "CANCELLED", &cashier())
        .await
        .unwrap();
    assert_eq!(stock(&db, "p-mug").await, 10);

    assert!(matches!(
        service.transition_status(&order_id, "CANCELLED", &cashier()).await,
        Err(CoreError::InvalidTransition { .. })
    ));
    assert_eq!(stock(&db, "p-mug").await, 10);
}

#[tokio::test]
async fn stale_order_version_is_a_conflict() {
    let (db, service) = setup().await;
    let view = service
        .create_order(
            CreateOrderRequest::new("c-1", vec![OrderItemRequest::new("p-mug", 1)]),
            &cashier(),
        )
        .await
        .unwrap();

    let mut stale = view.order.clone();
    let mut tx = db.begin().await.unwrap();
    let mut fresh = tx.order(&view.order.id).await.unwrap().unwrap();
    fresh.status = OrderStatus::Processing;
    tx.update_order(&mut fresh).await.unwrap();
    assert_eq!(fresh.version, 1);

    stale.status = OrderStatus::Cancelled;
    assert!(matches!(
        tx.update_order(&mut stale).await,
        Err(CoreError::Conflict(_))
    ));
}

#[tokio::test]
async fn low_stock_reads_from_sqlite() {
    let (_, service) = setup().await;

    let low = service.inventory().low_stock().await.unwrap();

    // Tea (1) and Mug (10) are both at or under the default threshold of 10.
    assert_eq!(low.len(), 2);
    assert_eq!(low[0].id, "p-tea");
}

/// File-backed database with a real connection pool, removed on drop.
struct FileDb {
    path: PathBuf,
}

impl FileDb {
    fn new() -> Self {
        FileDb {
            path: std::env::temp_dir().join(format!("vantage-race-{}.db", Uuid::new_v4())),
        }
    }

    async fn open(&self) -> (Arc<Database>, Arc<OrderService<Database>>) {
        let db = Database::new(
            DbConfig::new(self.path.clone())
                .max_connections(4)
                .busy_timeout(Duration::from_secs(5)),
        )
        .await
        .unwrap();
        db.insert_product(&Product::new("p-mug", "Mug", Money::from_cents(1000), 10))
            .await
            .unwrap();
        db.insert_product(&Product::new("p-tea", "Tea", Money::from_cents(500), 3))
            .await
            .unwrap();
        db.insert_customer(&Customer::new("c-1", "Ada", "Lovelace", "ada@example.com"))
            .await
            .unwrap();

        let db = Arc::new(db);
        let service = Arc::new(OrderService::new(db.clone(), TaxRate::from_bps(1000)));
        (db, service)
    }
}

impl Drop for FileDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_orders_never_oversell_on_a_pooled_file_database() {
    let file = FileDb::new();
    let (db, service) = file.open().await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .create_order(
                    CreateOrderRequest::new("c-1", vec![OrderItemRequest::new("p-tea", 1)]),
                    &cashier(),
                )
                .await
        }));
    }

    let mut sold = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => sold += 1,
            Err(CoreError::InsufficientStock { .. }) | Err(CoreError::Conflict(_)) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    let left = stock(&db, "p-tea").await;
    assert!(sold <= 3, "sold {sold} of 3");
    assert!(left >= 0);
    assert_eq!(left, 3 - sold);

    db.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_payments_never_exceed_the_total_on_a_pooled_file_database() {
    let file = FileDb::new();
    let (db, service) = file.open().await;

    let order_id = service
        .create_order(
            CreateOrderRequest::new("c-1", vec![OrderItemRequest::new("p-mug", 3)]),
            &cashier(),
        )
        .await
        .unwrap()
        .order
        .id;

    // 3300 due; any two of these together would overpay.
    let mut handles = Vec::new();
    for _ in 0..6 {
        let service = service.clone();
        let order_id = order_id.clone();
        handles.push(tokio::spawn(async move {
            service
                .payments()
                .collect_payment(
                    &order_id,
                    Money::from_cents(2000),
                    PaymentMethod::Cash,
                    Settlement::Cash {
                        tendered_cents: 2000,
                    },
                    &cashier(),
                )
                .await
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(CoreError::ExceedsOrderTotal { .. }) | Err(CoreError::Conflict(_)) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert!(accepted <= 1);

    let view = service.get_order(&order_id).await.unwrap();
    let completed: i64 = view
        .payments
        .iter()
        .filter(|p| p.status == PaymentStatus::Completed)
        .map(|p| p.amount_cents)
        .sum();
    assert_eq!(completed, 2000 * accepted);
    assert!(completed <= view.order.total_cents);

    db.close().await;
}
