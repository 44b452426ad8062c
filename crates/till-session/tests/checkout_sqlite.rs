//! Commit protocol end to end against SQLite.

use chrono::Utc;
use till_core::{
    CashSaleOutcome, Cashier, CheckoutRequest, CoreError, CustomerInput, DiscountRate, Money,
    MovementKind, PaymentMethod, Product, ProductInput, ReportPeriod, SaleStatus,
};
use till_db::{Database, DbConfig};
use till_session::{sales_report, CashierSession, SaleCommitter, SessionConfig, SessionError};

fn input(name: &str, sku: &str, price_cents: i64, stock: i64) -> ProductInput {
    ProductInput {
        name: name.to_string(),
        description: None,
        sku: Some(sku.to_string()),
        barcode: None,
        price_cents,
        stock,
        category: "Mercearia".to_string(),
    }
}

async fn setup() -> (Database, Product, Product) {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let a = db.products().insert(&input("Arroz 1kg", "ARROZ-1", 1000, 5)).await.unwrap();
    let b = db.products().insert(&input("Feijão 1kg", "FEIJAO-1", 500, 3)).await.unwrap();
    (db, a, b)
}

async fn stock(db: &Database, id: &str) -> i64 {
    db.products().get_by_id(id).await.unwrap().unwrap().stock
}

#[tokio::test]
async fn test_cash_checkout_persists_everything() {
    let (db, a, b) = setup().await;
    let committer = SaleCommitter::new(db.products(), db.sales());
    let customer = db
        .customers()
        .create(&CustomerInput {
            name: "Maria".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let mut session = CashierSession::new(Cashier::new("u-1", "Ana"));
    session.open_register(Money::from_cents(10000)).unwrap();
    session.add_product(&a).unwrap();
    session.add_product(&a).unwrap();
    session.add_product(&b).unwrap();

    let request = CheckoutRequest::new(PaymentMethod::Cash)
        .with_discount(DiscountRate::from_bps(1000).unwrap())
        .with_customer(customer.to_ref());
    let receipt = committer.commit(&mut session, &request).await.unwrap();
    session.save_register(&db.state()).await.unwrap();

    assert_eq!(receipt.sale.total_cents, 2250);
    assert!(matches!(receipt.cash, CashSaleOutcome::Recorded { .. }));
    assert_eq!(stock(&db, &a.id).await, 3);
    assert_eq!(stock(&db, &b.id).await, 2);

    let stored = db.sales().get_by_id(&receipt.sale.id).await.unwrap().unwrap();
    assert_eq!(stored, receipt.sale);
    assert_eq!(stored.customer_name.as_deref(), Some("Maria"));
    let payments = db.sales().get_payments(&stored.id).await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].amount_cents, 2250);

    // A new session on the same database sees the same register
    let reloaded = CashierSession::load(Cashier::new("u-1", "Ana"), &db.state())
        .await
        .unwrap();
    assert_eq!(reloaded.register_state().current_amount.cents(), 12250);
    assert!(matches!(
        reloaded.ledger().movements().last().map(|m| &m.kind),
        Some(MovementKind::Sale { .. })
    ));
}

#[tokio::test]
async fn test_stock_race_leaves_database_unchanged() {
    let (db, a, b) = setup().await;
    let committer = SaleCommitter::new(db.products(), db.sales());

    let mut session = CashierSession::new(Cashier::new("u-1", "Ana"));
    session.add_product(&a).unwrap();
    session.add_product(&b).unwrap();
    session.add_product(&b).unwrap();

    // Another till sells two units of B after they went into this cart
    db.products().take_stock(&b.id, 2).await.unwrap();

    let err = committer
        .commit(&mut session, &CheckoutRequest::new(PaymentMethod::Pix))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SessionError::Core(CoreError::InsufficientStock {
            requested: 2,
            available: 1,
            ..
        })
    ));
    assert_eq!(stock(&db, &a.id).await, 5);
    assert_eq!(stock(&db, &b.id).await, 1);
    assert_eq!(session.cart().total_quantity(), 3);

    let now = Utc::now();
    let sales = db
        .sales()
        .list_between(now - chrono::Duration::days(1), now + chrono::Duration::days(1))
        .await
        .unwrap();
    assert!(sales.is_empty());
}

#[tokio::test]
async fn test_cancel_then_report() {
    let (db, a, b) = setup().await;
    let committer = SaleCommitter::new(db.products(), db.sales());
    let mut session = CashierSession::new(Cashier::new("u-1", "Ana"));

    session.add_product(&a).unwrap();
    let first = committer
        .commit(&mut session, &CheckoutRequest::new(PaymentMethod::Card))
        .await
        .unwrap();

    session.add_product(&b).unwrap();
    committer
        .commit(&mut session, &CheckoutRequest::new(PaymentMethod::Pix))
        .await
        .unwrap();

    let cancelled = committer.cancel_sale(&first.sale.id).await.unwrap();
    assert_eq!(cancelled.status, SaleStatus::Cancelled);
    assert_eq!(stock(&db, &a.id).await, 5);

    let config = SessionConfig::default();
    let today = config.local_date(Utc::now());
    let period = ReportPeriod::new(today, today);
    let report = sales_report(&db.sales(), period, config.utc_offset())
        .await
        .unwrap();

    assert_eq!(report.resumo.total_vendas, 1);
    assert_eq!(report.resumo.faturamento.cents(), 500);
    assert_eq!(report.produtos_mais_vendidos[0].id, b.id);
    assert_eq!(report.formas_pagamento.get("pix"), Some(&1));
    assert_eq!(report.formas_pagamento.get("card"), None);
}
