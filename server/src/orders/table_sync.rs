//! Table occupancy rule
//!
//! A table is `OCUPADA` while at least one order attached to it is active
//! (not `ENTREGUE`, `CANCELADO` or `FINALIZADO`), and then belongs to the
//! customer of the most recently created active order. With no active
//! orders it is `LIVRE` with no assignee.
//!
//! [`recompute`] must run on the same connection, inside the same
//! transaction, as the order change that triggered it.

use shared::models::{DiningTable, TableStatus};
use sqlx::SqliteConnection;

use crate::db::repository::{RepoResult, dining_table};

/// Re-derive status and assignee of `table_id` from its active orders
pub async fn recompute(conn: &mut SqliteConnection, table_id: i64) -> RepoResult<DiningTable> {
    let active = dining_table::count_active_orders(conn, table_id).await?;
    let (status, assigned_to) = if active == 0 {
        (TableStatus::Livre, None)
    } else {
        (
            TableStatus::Ocupada,
            dining_table::latest_active_customer(conn, table_id).await?,
        )
    };

    dining_table::set_status(conn, table_id, status, assigned_to).await?;
    tracing::debug!(table_id, active, %status, ?assigned_to, "Table recomputed");

    dining_table::find_by_id(&mut *conn, table_id)
        .await?
        .ok_or_else(|| dining_table::not_found(table_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{order, testing};
    use shared::models::{DiningTableCreate, Order, UserRole};
    use shared::order::OrderStatus;

    async fn insert_order(
        conn: &mut SqliteConnection,
        user_id: i64,
        table_id: i64,
        status: OrderStatus,
        created_at: i64,
    ) -> i64 {
        let id = shared::util::snowflake_id();
        order::insert(
            conn,
            &Order {
                id,
                order_number: format!("T-{id}"),
                user_id,
                table_id: Some(table_id),
                status,
                total: 10.0,
                notes: None,
                received_by: None,
                cancel_reason: None,
                created_at,
                updated_at: created_at,
            },
        )
        .await
        .unwrap();
        id
    }

    #[tokio::test]
    async fn test_rule() {
        let pool = testing::pool().await;
        let ana = testing::user(&pool, "ana@example.com", UserRole::Customer).await;
        let rui = testing::user(&pool, "rui@example.com", UserRole::Customer).await;
        let table = dining_table::create(
            &pool,
            DiningTableCreate {
                number: 5,
                name: None,
                capacity: None,
            },
        )
        .await
        .unwrap();
        let mut conn = pool.acquire().await.unwrap();

        // no orders
        let t = recompute(&mut conn, table.id).await.unwrap();
        assert_eq!(t.status, TableStatus::Livre);
        assert_eq!(t.assigned_to, None);

        // finished orders don't hold the table
        insert_order(&mut conn, ana.id, table.id, OrderStatus::Entregue, 1_000).await;
        insert_order(&mut conn, ana.id, table.id, OrderStatus::Cancelado, 2_000).await;
        insert_order(&mut conn, ana.id, table.id, OrderStatus::Finalizado, 3_000).await;
        let t = recompute(&mut conn, table.id).await.unwrap();
        assert_eq!(t.status, TableStatus::Livre);

        // the latest active order owns the table
        let first = insert_order(&mut conn, ana.id, table.id, OrderStatus::Preparando, 4_000).await;
        insert_order(&mut conn, rui.id, table.id, OrderStatus::Pendente, 5_000).await;
        let t = recompute(&mut conn, table.id).await.unwrap();
        assert_eq!(t.status, TableStatus::Ocupada);
        assert_eq!(t.assigned_to, Some(rui.id));

        // ownership follows the latest remaining active order
        sqlx::query("UPDATE orders SET status = 'CANCELADO' WHERE table_id = ? AND user_id = ?")
            .bind(table.id)
            .bind(rui.id)
            .execute(&mut *conn)
            .await
            .unwrap();
        let t = recompute(&mut conn, table.id).await.unwrap();
        assert_eq!(t.assigned_to, Some(ana.id));

        order::transition(&mut conn, first, OrderStatus::Preparando, OrderStatus::Pronto)
            .await
            .unwrap();
        order::transition(&mut conn, first, OrderStatus::Pronto, OrderStatus::Entregue)
            .await
            .unwrap();
        let t = recompute(&mut conn, table.id).await.unwrap();
        assert_eq!(t.status, TableStatus::Livre);
        assert_eq!(t.assigned_to, None);
    }

    #[tokio::test]
    async fn test_missing_table() {
        let pool = testing::pool().await;
        let mut conn = pool.acquire().await.unwrap();
        assert!(recompute(&mut conn, 404).await.is_err());
    }
}
