//! Stock service tests against Postgres
//!
//! Each test gets a fresh database with the migrations applied. They need a
//! server reachable through `DATABASE_URL` and are run with
//! `cargo test -p workshop-stock-backend -- --ignored`.

use axum::{http::StatusCode, response::IntoResponse};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;
use workshop_stock_backend::error::AppError;
use workshop_stock_backend::models::{
    AdjustmentDirection, MovementDirection, NewSparePart, NewWarehouse, TransactionRequest,
    TransactionType,
};
use workshop_stock_backend::services::{SparePartService, StockService, WarehouseService};

const LOCK_TIMEOUT_MS: u64 = 5000;

struct Seeded {
    stock: StockService,
    part: Uuid,
    a: Uuid,
    b: Uuid,
}

async fn seed(pool: &PgPool) -> Seeded {
    let part = SparePartService::new(pool.clone())
        .create_spare_part(NewSparePart {
            part_number: "FF-7310".to_string(),
            name: "Fuel filter".to_string(),
            description: None,
            unit_of_measure: "pcs".to_string(),
            price: Decimal::new(3100, 2),
            variant: None,
            compatibility: Some(vec!["Isuzu NPR".to_string()]),
        })
        .await
        .unwrap();

    let warehouses = WarehouseService::new(pool.clone());
    let a = warehouses
        .create_warehouse(NewWarehouse {
            name: "Central store".to_string(),
            location: None,
            is_main_warehouse: Some(true),
        })
        .await
        .unwrap();
    let b = warehouses
        .create_warehouse(NewWarehouse {
            name: "Depot North".to_string(),
            location: Some("Bay 3".to_string()),
            is_main_warehouse: None,
        })
        .await
        .unwrap();

    Seeded {
        stock: StockService::new(pool.clone(), LOCK_TIMEOUT_MS),
        part: part.id,
        a: a.id,
        b: b.id,
    }
}

fn request(part: Uuid, transaction_type: TransactionType, source: Uuid, quantity: i64) -> TransactionRequest {
    TransactionRequest {
        spare_part_id: part,
        quantity,
        transaction_type,
        source_warehouse_id: source,
        target_warehouse_id: None,
        adjustment_direction: None,
        transaction_date: None,
        remark: None,
    }
}

fn transfer(part: Uuid, source: Uuid, target: Uuid, quantity: i64) -> TransactionRequest {
    TransactionRequest {
        target_warehouse_id: Some(target),
        ..request(part, TransactionType::Transfer, source, quantity)
    }
}

async fn balance(s: &Seeded, warehouse: Uuid) -> i64 {
    s.stock.get_balance(s.part, warehouse).await.unwrap().current_stock
}

async fn entry_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM stock_transactions")
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs Postgres at DATABASE_URL"]
async fn test_receive_issue_transfer_walkthrough(pool: PgPool) {
    let s = seed(&pool).await;
    assert_eq!(balance(&s, s.a).await, 0);

    s.stock
        .apply_transaction(request(s.part, TransactionType::In, s.a, 10))
        .await
        .unwrap();
    assert_eq!(balance(&s, s.a).await, 10);

    s.stock
        .apply_transaction(request(s.part, TransactionType::Out, s.a, 4))
        .await
        .unwrap();
    assert_eq!(balance(&s, s.a).await, 6);

    let applied = s
        .stock
        .apply_transaction(transfer(s.part, s.a, s.b, 6))
        .await
        .unwrap();
    assert_eq!(applied.updated_balances.len(), 2);
    assert_eq!(balance(&s, s.a).await, 0);
    assert_eq!(balance(&s, s.b).await, 6);

    let err = s
        .stock
        .apply_transaction(request(s.part, TransactionType::Out, s.a, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock(_)));
    assert_eq!(balance(&s, s.a).await, 0);

    let err = s
        .stock
        .apply_transaction(transfer(s.part, s.a, s.a, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InconsistentTransfer(_)));

    assert_eq!(entry_count(&pool).await, 3);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs Postgres at DATABASE_URL"]
async fn test_rejected_transfer_leaves_no_trace(pool: PgPool) {
    let s = seed(&pool).await;
    s.stock
        .apply_transaction(request(s.part, TransactionType::In, s.a, 2))
        .await
        .unwrap();

    let err = s
        .stock
        .apply_transaction(transfer(s.part, s.a, s.b, 5))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock(_)));

    // The target's balance row was created inside the rolled back transaction
    let target_rows: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM warehouse_stock WHERE spare_part_id = $1 AND warehouse_id = $2",
    )
    .bind(s.part)
    .bind(s.b)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(target_rows, 0);
    assert_eq!(balance(&s, s.a).await, 2);
    assert_eq!(entry_count(&pool).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs Postgres at DATABASE_URL"]
async fn test_unknown_target_rejected(pool: PgPool) {
    let s = seed(&pool).await;
    s.stock
        .apply_transaction(request(s.part, TransactionType::In, s.a, 2))
        .await
        .unwrap();

    let err = s
        .stock
        .apply_transaction(transfer(s.part, s.a, Uuid::new_v4(), 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(balance(&s, s.a).await, 2);
    assert_eq!(entry_count(&pool).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs Postgres at DATABASE_URL"]
async fn test_adjustment_directions(pool: PgPool) {
    let s = seed(&pool).await;
    let adjust = |direction, quantity| TransactionRequest {
        adjustment_direction: Some(direction),
        ..request(s.part, TransactionType::Adjustment, s.b, quantity)
    };

    s.stock
        .apply_transaction(adjust(AdjustmentDirection::Increase, 8))
        .await
        .unwrap();
    s.stock
        .apply_transaction(adjust(AdjustmentDirection::Decrease, 3))
        .await
        .unwrap();
    assert_eq!(balance(&s, s.b).await, 5);

    let err = s
        .stock
        .apply_transaction(adjust(AdjustmentDirection::Decrease, 6))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock(_)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs Postgres at DATABASE_URL"]
async fn test_history_keeps_recorded_order_within_a_day(pool: PgPool) {
    let s = seed(&pool).await;
    let day = |d: u32| NaiveDate::from_ymd_opt(2024, 6, d).unwrap();
    let dated = |req: TransactionRequest, date: NaiveDate| TransactionRequest {
        transaction_date: Some(date),
        ..req
    };

    let mut recorded = Vec::new();
    for req in [
        dated(request(s.part, TransactionType::In, s.a, 10), day(1)),
        dated(transfer(s.part, s.a, s.b, 3), day(4)),
        dated(request(s.part, TransactionType::Out, s.a, 1), day(4)),
        dated(request(s.part, TransactionType::Return, s.a, 1), day(4)),
        dated(request(s.part, TransactionType::Out, s.a, 2), day(2)),
    ] {
        recorded.push(s.stock.apply_transaction(req).await.unwrap().transaction.id);
    }

    let history = s.stock.get_history(s.a).await.unwrap();
    let ids: Vec<Uuid> = history.iter().map(|h| h.transaction.id).collect();
    assert_eq!(
        ids,
        vec![recorded[1], recorded[2], recorded[3], recorded[4], recorded[0]]
    );
    assert_eq!(history[0].direction, MovementDirection::Out);
    assert_eq!(history[0].signed_quantity, -3);

    let history_b = s.stock.get_history(s.b).await.unwrap();
    assert_eq!(history_b.len(), 1);
    assert_eq!(history_b[0].direction, MovementDirection::In);

    let listed: Vec<Uuid> = s
        .stock
        .list_transactions()
        .await
        .unwrap()
        .iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(listed, ids);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs Postgres at DATABASE_URL"]
async fn test_balance_lookup_rules(pool: PgPool) {
    let s = seed(&pool).await;

    assert_eq!(balance(&s, s.b).await, 0);

    let err = s.stock.get_balance(Uuid::new_v4(), s.a).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    let err = s.stock.get_balance(s.part, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = s.stock.get_history(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs Postgres at DATABASE_URL"]
async fn test_opposite_transfers_do_not_deadlock(pool: PgPool) {
    let s = seed(&pool).await;
    for warehouse in [s.a, s.b] {
        s.stock
            .apply_transaction(request(s.part, TransactionType::In, warehouse, 50))
            .await
            .unwrap();
    }

    let mut handles = Vec::new();
    for i in 0..20 {
        let stock = s.stock.clone();
        let (from, to) = if i % 2 == 0 { (s.a, s.b) } else { (s.b, s.a) };
        let req = transfer(s.part, from, to, 1);
        handles.push(tokio::spawn(async move { stock.apply_transaction(req).await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(balance(&s, s.a).await, 50);
    assert_eq!(balance(&s, s.b).await, 50);
    assert_eq!(entry_count(&pool).await, 22);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs Postgres at DATABASE_URL"]
async fn test_negative_balance_check_is_persistence_failure(pool: PgPool) {
    let s = seed(&pool).await;
    s.stock
        .apply_transaction(request(s.part, TransactionType::In, s.a, 1))
        .await
        .unwrap();

    let err = sqlx::query(
        "UPDATE warehouse_stock SET current_stock = current_stock - 2 WHERE spare_part_id = $1",
    )
    .bind(s.part)
    .execute(&pool)
    .await
    .unwrap_err();
    assert_eq!(
        err.as_database_error().and_then(|e| e.code()).as_deref(),
        Some("23514")
    );

    let response = AppError::from(err).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(balance(&s, s.a).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs Postgres at DATABASE_URL"]
async fn test_catalog_rules(pool: PgPool) {
    let s = seed(&pool).await;

    let duplicate = SparePartService::new(pool.clone())
        .create_spare_part(NewSparePart {
            part_number: "FF-7310".to_string(),
            name: "Fuel filter (copy)".to_string(),
            description: None,
            unit_of_measure: "pcs".to_string(),
            price: Decimal::ZERO,
            variant: None,
            compatibility: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(duplicate, AppError::Conflict { .. }));

    let warehouses = WarehouseService::new(pool.clone());
    assert_eq!(warehouses.get_main_warehouse().await.unwrap().id, s.a);

    let replacement = warehouses
        .create_warehouse(NewWarehouse {
            name: "New central store".to_string(),
            location: None,
            is_main_warehouse: Some(true),
        })
        .await
        .unwrap();
    assert_eq!(warehouses.get_main_warehouse().await.unwrap().id, replacement.id);
    assert!(!warehouses.get_warehouse(s.a).await.unwrap().is_main_warehouse);

    let stock = s.stock.list_warehouse_stock(s.a).await.unwrap();
    assert!(stock.is_empty());
}
