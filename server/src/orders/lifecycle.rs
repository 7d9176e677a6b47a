//! Order lifecycle coordinator
//!
//! Every operation that creates an order, changes its status or moves it
//! between tables follows the same sequence:
//!
//! 1. lock every table it touches ([`TableLocks`], ascending id order)
//! 2. open one transaction
//! 3. mutate orders, items and stock
//! 4. [`table_sync::recompute`] every touched table inside that transaction
//! 5. commit, release the locks, then publish events and notifications
//!
//! Nothing is published for a transaction that rolled back.

use std::sync::Arc;

use shared::error::{AppError, ErrorCode};
use shared::message::resource;
use shared::models::notification::kind;
use shared::models::setting::keys;
use shared::models::{
    DiningTable, MovementType, NotificationAudience, Order, OrderCreate, OrderDetail, OrderItem,
    OrderItemInput, StockMovement, TableStatus, UserRole,
};
use shared::order::OrderStatus;
use sqlx::{Sqlite, SqlitePool, Transaction};

use super::locks::{TableGuards, TableLocks};
use super::{money, table_sync};
use crate::auth::CurrentUser;
use crate::db;
use crate::db::repository::{
    RepoError, cart, dining_table, order, product, setting, stock, user,
};
use crate::inventory::{self, InventoryService, MovementRequest};
use crate::message::EventBus;
use crate::notifications::{NewNotification, NotificationService};
use crate::utils::AppResult;
use crate::utils::validation::{
    MAX_NOTE_LEN, MAX_ORDER_LINES, validate_optional_text, validate_quantity,
};

/// Attempts at locking an order whose table keeps changing underneath
const LOCK_ATTEMPTS: usize = 3;

/// An order read inside its transaction, with its table locked
struct Locked {
    guards: TableGuards,
    tx: Transaction<'static, Sqlite>,
    order: Order,
}

#[derive(Clone)]
pub struct OrderLifecycle {
    pool: SqlitePool,
    locks: Arc<TableLocks>,
    bus: EventBus,
    notifier: NotificationService,
    inventory: InventoryService,
}

impl OrderLifecycle {
    pub fn new(
        pool: SqlitePool,
        bus: EventBus,
        notifier: NotificationService,
        inventory: InventoryService,
    ) -> Self {
        Self {
            pool,
            locks: Arc::new(TableLocks::new()),
            bus,
            notifier,
            inventory,
        }
    }

    pub fn locks(&self) -> &TableLocks {
        &self.locks
    }

    // ========== Placing ==========

    /// Create an order from `data.items`, or from the caller's cart when absent
    pub async fn place_order(
        &self,
        user: &CurrentUser,
        data: OrderCreate,
    ) -> AppResult<OrderDetail> {
        validate_optional_text(&data.notes, "notes", MAX_NOTE_LEN)?;
        if let Some(items) = &data.items {
            validate_lines(items)?;
        }
        let from_cart = data.items.is_none();

        let guards = self.locks.acquire([data.table_id]).await;
        let mut tx = db::begin_write(&self.pool).await?;

        let requested = match data.items {
            Some(items) => items,
            None => cart::find_lines(&mut *tx, user.id)
                .await?
                .into_iter()
                .map(|line| OrderItemInput {
                    product_id: line.product_id,
                    quantity: line.quantity,
                    notes: line.notes,
                })
                .collect(),
        };
        if requested.is_empty() {
            return Err(AppError::new(ErrorCode::OrderEmpty));
        }
        if requested.len() > MAX_ORDER_LINES {
            return Err(too_many_lines(requested.len()));
        }

        if let Some(table_id) = data.table_id {
            let table = dining_table::find_by_id(&mut *tx, table_id)
                .await?
                .ok_or_else(|| dining_table::not_found(table_id))?;
            if !table.is_active {
                return Err(AppError::with_message(
                    ErrorCode::TableInactive,
                    format!("Table {} is not in service", table.number),
                ));
            }
        }

        let now = shared::util::now_millis();
        let order_id = shared::util::snowflake_id();
        // unique because the write lock is held since BEGIN
        let seq = order::next_daily_sequence(&mut tx, &shared::util::order_day(now)).await?;
        let order_number = shared::util::order_number(now, seq);

        let mut items = Vec::with_capacity(requested.len());
        let mut line_totals = Vec::with_capacity(requested.len());
        let mut tracked = Vec::new();
        for line in requested {
            let found = product::find_by_id(&mut *tx, line.product_id)
                .await?
                .ok_or_else(|| {
                    AppError::with_message(
                        ErrorCode::ProductNotFound,
                        format!("Product {} not found", line.product_id),
                    )
                })?;
            if !found.is_available {
                return Err(AppError::with_message(
                    ErrorCode::ProductUnavailable,
                    format!("'{}' is not available", found.name),
                )
                .with_detail("product_id", found.id));
            }

            let line_total = money::line_total(found.price, line.quantity);
            line_totals.push(line_total);
            if found.track_stock {
                tracked.push((found.id, line.quantity));
            }
            items.push(OrderItem {
                id: shared::util::snowflake_id(),
                order_id,
                product_id: found.id,
                product_name: found.name,
                unit_price: found.price,
                quantity: line.quantity,
                line_total: money::to_f64(line_total),
                notes: line.notes,
            });
        }

        let created = Order {
            id: order_id,
            order_number,
            user_id: user.id,
            table_id: data.table_id,
            status: OrderStatus::Pendente,
            total: money::to_f64(money::order_total(line_totals)),
            notes: data.notes,
            received_by: None,
            cancel_reason: None,
            created_at: now,
            updated_at: now,
        };
        order::insert(&mut tx, &created).await?;
        for item in &items {
            order::insert_item(&mut tx, item).await?;
        }

        let mut movements = Vec::with_capacity(tracked.len());
        for (product_id, quantity) in tracked {
            let movement = inventory::apply_movement(
                &mut tx,
                MovementRequest {
                    product_id,
                    movement_type: MovementType::Saida,
                    quantity,
                    reason: Some(format!("Pedido {}", created.order_number)),
                    order_id: Some(order_id),
                    user_id: Some(user.id),
                },
            )
            .await?;
            movements.push(movement);
        }

        if from_cart {
            cart::clear(&mut tx, user.id).await?;
        }
        let table = match created.table_id {
            Some(table_id) => Some(table_sync::recompute(&mut tx, table_id).await?),
            None => None,
        };

        tx.commit().await.map_err(RepoError::from)?;
        drop(guards);

        tracing::info!(
            order_id,
            order_number = %created.order_number,
            user_id = user.id,
            table_id = ?created.table_id,
            items = items.len(),
            total = created.total,
            from_cart,
            "Order placed"
        );

        let detail = OrderDetail {
            order: created,
            items,
        };
        self.bus.created(resource::ORDER, order_id, &detail);
        self.publish_tables(table.iter());
        self.inventory.after_commit(&movements).await;
        self.notifier
            .send(
                None,
                NotificationAudience::Staff,
                NewNotification {
                    kind: kind::NEW_ORDER,
                    title: "Novo pedido".into(),
                    message: new_order_message(&detail.order, table.as_ref()),
                    order_id: Some(order_id),
                },
            )
            .await;
        Ok(detail)
    }

    // ========== Status ==========

    /// Staff takes a pending order: `PENDENTE -> CONFIRMADO`
    pub async fn receive(&self, staff: &CurrentUser, order_id: i64) -> AppResult<OrderDetail> {
        self.update_status(staff, order_id, OrderStatus::Confirmado, None)
            .await
    }

    /// Move the order one preparation step forward
    pub async fn advance(&self, staff: &CurrentUser, order_id: i64) -> AppResult<OrderDetail> {
        let current = order::find_by_id(&self.pool, order_id)
            .await?
            .ok_or_else(|| order::not_found(order_id))?;
        let next = current
            .status
            .next_stage()
            .ok_or_else(|| terminal_error(&current))?;
        self.update_status(staff, order_id, next, None).await
    }

    pub async fn update_status(
        &self,
        staff: &CurrentUser,
        order_id: i64,
        next: OrderStatus,
        reason: Option<String>,
    ) -> AppResult<OrderDetail> {
        staff.require(UserRole::Staff)?;
        if next == OrderStatus::Cancelado {
            return self.cancel(staff, order_id, reason).await;
        }

        let Locked {
            guards,
            mut tx,
            order: current,
        } = self.lock_order(order_id, None).await?;
        check_transition(&current, next)?;

        order::transition(&mut tx, order_id, current.status, next).await?;
        if next == OrderStatus::Confirmado && current.received_by.is_none() {
            order::set_received_by(&mut tx, order_id, staff.id).await?;
        }
        let table = match current.table_id {
            Some(table_id) => Some(table_sync::recompute(&mut tx, table_id).await?),
            None => None,
        };

        tx.commit().await.map_err(RepoError::from)?;
        drop(guards);

        tracing::info!(
            order_id,
            from = %current.status,
            to = %next,
            staff_id = staff.id,
            "Order status changed"
        );

        let detail = load_detail(&self.pool, order_id).await?;
        self.bus.updated(resource::ORDER, order_id, &detail);
        self.publish_tables(table.iter());

        self.notifier
            .send(
                Some(detail.order.user_id),
                NotificationAudience::User,
                NewNotification {
                    kind: kind::ORDER_STATUS,
                    title: format!("Pedido {}", detail.order.order_number),
                    message: format!("Seu pedido esta {}", status_label(next)),
                    order_id: Some(order_id),
                },
            )
            .await;
        if next == OrderStatus::Pronto {
            self.notifier
                .send(
                    None,
                    NotificationAudience::Staff,
                    NewNotification {
                        kind: kind::ORDER_READY,
                        title: "Pedido pronto".into(),
                        message: ready_message(&detail.order, table.as_ref()),
                        order_id: Some(order_id),
                    },
                )
                .await;
        }
        Ok(detail)
    }

    /// Cancel an order and put its tracked stock back.
    ///
    /// Customers may only cancel their own `PENDENTE` orders, and only while
    /// `allow_customer_cancel` is on. Staff may cancel anything not yet
    /// `PRONTO`.
    pub async fn cancel(
        &self,
        operator: &CurrentUser,
        order_id: i64,
        reason: Option<String>,
    ) -> AppResult<OrderDetail> {
        validate_optional_text(&reason, "reason", MAX_NOTE_LEN)?;
        let by_staff = operator.is_staff();
        // read before locking, the pool may have a single connection
        let customers_may_cancel =
            by_staff || setting::get_bool(&self.pool, keys::ALLOW_CUSTOMER_CANCEL, true).await?;

        let Locked {
            guards,
            mut tx,
            order: current,
        } = self.lock_order(order_id, None).await?;

        if !by_staff {
            if current.user_id != operator.id {
                // other customers' orders don't exist as far as the caller is concerned
                return Err(order::not_found(order_id).into());
            }
            if !customers_may_cancel {
                return Err(AppError::with_message(
                    ErrorCode::CancelNotAllowed,
                    "Cancellation by customers is disabled",
                ));
            }
            if current.status != OrderStatus::Pendente && !current.status.is_terminal() {
                return Err(AppError::with_message(
                    ErrorCode::CancelNotAllowed,
                    format!(
                        "Order {} is already {}, ask the staff to cancel it",
                        current.order_number, current.status
                    ),
                )
                .with_detail("status", current.status.as_str()));
            }
        }
        check_transition(&current, OrderStatus::Cancelado)?;

        order::transition(&mut tx, order_id, current.status, OrderStatus::Cancelado).await?;
        order::set_cancel_reason(&mut tx, order_id, reason.as_deref()).await?;

        let mut restored = Vec::new();
        for taken in stock::find_by_order(&mut *tx, order_id).await? {
            if taken.movement_type != MovementType::Saida {
                continue;
            }
            let result = inventory::apply_movement(
                &mut tx,
                MovementRequest {
                    product_id: taken.product_id,
                    movement_type: MovementType::Entrada,
                    quantity: taken.quantity,
                    reason: Some(format!("Cancelamento do pedido {}", current.order_number)),
                    order_id: Some(order_id),
                    user_id: Some(operator.id),
                },
            )
            .await;
            match result {
                Ok(movement) => restored.push(movement),
                Err(e) if e.code == ErrorCode::StockNotTracked => {
                    tracing::warn!(
                        order_id,
                        product_id = taken.product_id,
                        "Product no longer tracks stock, not restoring"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        let table = match current.table_id {
            Some(table_id) => Some(table_sync::recompute(&mut tx, table_id).await?),
            None => None,
        };

        tx.commit().await.map_err(RepoError::from)?;
        drop(guards);

        tracing::info!(
            order_id,
            from = %current.status,
            operator_id = operator.id,
            by_staff,
            restored = restored.len(),
            reason = ?reason,
            "Order cancelled"
        );

        let detail = load_detail(&self.pool, order_id).await?;
        self.bus.updated(resource::ORDER, order_id, &detail);
        self.publish_tables(table.iter());
        self.publish_restocked(&restored).await;

        let note = NewNotification {
            kind: kind::ORDER_CANCELLED,
            title: format!("Pedido {} cancelado", detail.order.order_number),
            message: reason.unwrap_or_else(|| "Pedido cancelado".into()),
            order_id: Some(order_id),
        };
        if by_staff {
            self.notifier
                .send(Some(detail.order.user_id), NotificationAudience::User, note)
                .await;
        } else {
            self.notifier
                .send(None, NotificationAudience::Staff, note)
                .await;
        }
        Ok(detail)
    }

    // ========== Tables ==========

    /// Move an active order to another table, or detach it with `None`
    pub async fn move_table(
        &self,
        staff: &CurrentUser,
        order_id: i64,
        target: Option<i64>,
    ) -> AppResult<OrderDetail> {
        staff.require(UserRole::Staff)?;
        let Locked {
            guards,
            mut tx,
            order: current,
        } = self.lock_order(order_id, target).await?;

        if !current.status.is_active() {
            return Err(AppError::with_message(
                ErrorCode::OrderNotActive,
                format!(
                    "Order {} is {} and no longer holds a table",
                    current.order_number, current.status
                ),
            ));
        }
        if current.table_id == target {
            drop(tx);
            return load_detail(&self.pool, order_id).await;
        }
        if let Some(table_id) = target {
            let table = dining_table::find_by_id(&mut *tx, table_id)
                .await?
                .ok_or_else(|| dining_table::not_found(table_id))?;
            if !table.is_active {
                return Err(AppError::with_message(
                    ErrorCode::TableInactive,
                    format!("Table {} is not in service", table.number),
                ));
            }
        }

        order::set_table(&mut tx, order_id, target).await?;
        let mut tables = Vec::with_capacity(2);
        for table_id in [current.table_id, target].into_iter().flatten() {
            tables.push(table_sync::recompute(&mut tx, table_id).await?);
        }

        tx.commit().await.map_err(RepoError::from)?;
        drop(guards);

        tracing::info!(
            order_id,
            from = ?current.table_id,
            to = ?target,
            staff_id = staff.id,
            "Order moved"
        );

        let detail = load_detail(&self.pool, order_id).await?;
        self.bus.updated(resource::ORDER, order_id, &detail);
        self.publish_tables(tables.iter());
        Ok(detail)
    }

    /// Re-derive a table's status from its orders
    pub async fn recompute_table(&self, table_id: i64) -> AppResult<DiningTable> {
        let guards = self.locks.acquire([Some(table_id)]).await;
        let mut tx = db::begin_write(&self.pool).await?;
        let table = table_sync::recompute(&mut tx, table_id).await?;
        tx.commit().await.map_err(RepoError::from)?;
        drop(guards);

        self.publish_tables([&table]);
        Ok(table)
    }

    /// Manual status override by staff.
    ///
    /// `LIVRE` is refused while orders still hold the table. `OCUPADA`
    /// takes the given assignee, or keeps the current one.
    pub async fn set_table_status(
        &self,
        staff: &CurrentUser,
        table_id: i64,
        status: TableStatus,
        assigned_to: Option<i64>,
    ) -> AppResult<DiningTable> {
        staff.require(UserRole::Staff)?;
        let guards = self.locks.acquire([Some(table_id)]).await;
        let mut tx = db::begin_write(&self.pool).await?;

        let table = dining_table::find_by_id(&mut *tx, table_id)
            .await?
            .ok_or_else(|| dining_table::not_found(table_id))?;

        match status {
            TableStatus::Livre => {
                let active = dining_table::count_active_orders(&mut tx, table_id).await?;
                if active > 0 {
                    return Err(AppError::with_message(
                        ErrorCode::TableHasOrders,
                        format!("Table {} has {active} active orders", table.number),
                    )
                    .with_detail("active_orders", active));
                }
                dining_table::set_status(&mut tx, table_id, TableStatus::Livre, None).await?;
            }
            TableStatus::Ocupada => {
                if !table.is_active {
                    return Err(AppError::with_message(
                        ErrorCode::TableInactive,
                        format!("Table {} is not in service", table.number),
                    ));
                }
                let assignee = match assigned_to {
                    Some(user_id) => {
                        user::find_by_id(&mut *tx, user_id).await?.ok_or_else(|| {
                            AppError::with_message(
                                ErrorCode::UserNotFound,
                                format!("User {user_id} not found"),
                            )
                        })?;
                        Some(user_id)
                    }
                    None => table.assigned_to,
                };
                dining_table::set_status(&mut tx, table_id, TableStatus::Ocupada, assignee).await?;
            }
        }

        let updated = dining_table::find_by_id(&mut *tx, table_id)
            .await?
            .ok_or_else(|| dining_table::not_found(table_id))?;
        tx.commit().await.map_err(RepoError::from)?;
        drop(guards);

        tracing::info!(
            table_id,
            number = updated.number,
            status = %updated.status,
            assigned_to = ?updated.assigned_to,
            staff_id = staff.id,
            "Table status set"
        );
        self.publish_tables([&updated]);
        Ok(updated)
    }

    // ========== Internals ==========

    /// Lock the order's table (plus `also`), then read the order in a fresh
    /// transaction. Retries when the order was moved to another table
    /// between the unlocked read and the locked one.
    async fn lock_order(&self, order_id: i64, also: Option<i64>) -> AppResult<Locked> {
        for _ in 0..LOCK_ATTEMPTS {
            let seen = order::find_by_id(&self.pool, order_id)
                .await?
                .ok_or_else(|| order::not_found(order_id))?;
            let guards = self.locks.acquire([seen.table_id, also]).await;
            let mut tx = db::begin_write(&self.pool).await?;
            let current = order::find_by_id(&mut *tx, order_id)
                .await?
                .ok_or_else(|| order::not_found(order_id))?;
            if current.table_id == seen.table_id {
                return Ok(Locked {
                    guards,
                    tx,
                    order: current,
                });
            }
            tracing::debug!(order_id, "Order changed table while locking, retrying");
        }
        Err(AppError::with_message(
            ErrorCode::SystemBusy,
            format!("Order {order_id} keeps changing, try again"),
        ))
    }

    fn publish_tables<'a>(&self, tables: impl IntoIterator<Item = &'a DiningTable>) {
        for table in tables {
            self.bus.updated(resource::TABLE, table.id, table);
        }
    }

    async fn publish_restocked(&self, movements: &[StockMovement]) {
        if !movements.is_empty() {
            self.inventory.after_commit(movements).await;
        }
    }
}

/// Order with its lines
pub async fn load_detail(pool: &SqlitePool, order_id: i64) -> AppResult<OrderDetail> {
    let found = order::find_by_id(pool, order_id)
        .await?
        .ok_or_else(|| order::not_found(order_id))?;
    let items = order::find_items(pool, order_id).await?;
    Ok(OrderDetail {
        order: found,
        items,
    })
}

fn validate_lines(items: &[OrderItemInput]) -> AppResult<()> {
    if items.len() > MAX_ORDER_LINES {
        return Err(too_many_lines(items.len()));
    }
    for item in items {
        validate_quantity(item.quantity)?;
        validate_optional_text(&item.notes, "notes", MAX_NOTE_LEN)?;
    }
    Ok(())
}

fn too_many_lines(count: usize) -> AppError {
    AppError::validation(format!(
        "order has {count} lines, max {MAX_ORDER_LINES}"
    ))
}

fn check_transition(current: &Order, next: OrderStatus) -> AppResult<()> {
    if current.status.can_transition_to(next) {
        return Ok(());
    }
    if current.status.is_terminal() {
        return Err(terminal_error(current));
    }
    Err(AppError::with_message(
        ErrorCode::InvalidStatusTransition,
        format!(
            "Order {} cannot go from {} to {next}",
            current.order_number, current.status
        ),
    )
    .with_detail("from", current.status.as_str())
    .with_detail("to", next.as_str()))
}

fn terminal_error(current: &Order) -> AppError {
    match current.status {
        OrderStatus::Cancelado => AppError::with_message(
            ErrorCode::OrderAlreadyCancelled,
            format!("Order {} is cancelled", current.order_number),
        ),
        OrderStatus::Finalizado => AppError::with_message(
            ErrorCode::OrderAlreadyCompleted,
            format!("Order {} is already closed", current.order_number),
        ),
        status => AppError::with_message(
            ErrorCode::InvalidStatusTransition,
            format!("Order {} cannot leave {status}", current.order_number),
        ),
    }
}

fn status_label(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pendente => "pendente",
        OrderStatus::Confirmado => "confirmado",
        OrderStatus::Preparando => "em preparo",
        OrderStatus::Pronto => "pronto",
        OrderStatus::Entregue => "entregue",
        OrderStatus::Cancelado => "cancelado",
        OrderStatus::Finalizado => "finalizado",
    }
}

fn table_suffix(table: Option<&DiningTable>) -> String {
    table
        .map(|t| format!(" - mesa {}", t.number))
        .unwrap_or_default()
}

fn new_order_message(order: &Order, table: Option<&DiningTable>) -> String {
    format!(
        "Pedido {} (R$ {:.2}){}",
        order.order_number,
        order.total,
        table_suffix(table)
    )
}

fn ready_message(order: &Order, table: Option<&DiningTable>) -> String {
    format!("Pedido {} pronto{}", order.order_number, table_suffix(table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{notification, testing};
    use shared::models::{
        DiningTableCreate, DiningTableUpdate, OrderQuery, Product, ProductUpdate,
        StockMovementQuery,
    };

    struct Fixture {
        pool: SqlitePool,
        lifecycle: OrderLifecycle,
        customer: CurrentUser,
        other: CurrentUser,
        staff: CurrentUser,
        table: DiningTable,
        burger: Product,
        soda: Product,
    }

    async fn fixture() -> Fixture {
        fixture_on(testing::pool().await).await
    }

    async fn fixture_on(pool: SqlitePool) -> Fixture {
        let bus = EventBus::new(256);
        let notifier = NotificationService::new(pool.clone(), bus.clone());
        let inventory = InventoryService::new(pool.clone(), bus.clone(), notifier.clone());
        let lifecycle = OrderLifecycle::new(pool.clone(), bus, notifier, inventory);

        let customer = testing::user(&pool, "ana@example.com", UserRole::Customer).await;
        let other = testing::user(&pool, "rui@example.com", UserRole::Customer).await;
        let staff = testing::user(&pool, "staff@example.com", UserRole::Staff).await;
        let table = table(&pool, 1).await;
        let lanches = testing::category(&pool, "Lanches").await;
        let burger = testing::product(&pool, lanches.id, "X-Burger", 18.5, None).await;
        let soda = testing::product(&pool, lanches.id, "Refrigerante", 6.0, Some(5)).await;

        Fixture {
            pool,
            lifecycle,
            customer: customer.into(),
            other: other.into(),
            staff: staff.into(),
            table,
            burger,
            soda,
        }
    }

    async fn table(pool: &SqlitePool, number: i32) -> DiningTable {
        dining_table::create(
            pool,
            DiningTableCreate {
                number,
                name: None,
                capacity: None,
            },
        )
        .await
        .unwrap()
    }

    fn line(product_id: i64, quantity: i64) -> OrderItemInput {
        OrderItemInput {
            product_id,
            quantity,
            notes: None,
        }
    }

    fn takeaway(items: Vec<OrderItemInput>) -> OrderCreate {
        OrderCreate {
            table_id: None,
            notes: None,
            items: Some(items),
        }
    }

    fn at_table(table_id: i64, items: Vec<OrderItemInput>) -> OrderCreate {
        OrderCreate {
            table_id: Some(table_id),
            notes: None,
            items: Some(items),
        }
    }

    async fn reload_table(pool: &SqlitePool, id: i64) -> DiningTable {
        dining_table::find_by_id(pool, id).await.unwrap().unwrap()
    }

    async fn stock_of(pool: &SqlitePool, id: i64) -> i64 {
        product::find_by_id(pool, id).await.unwrap().unwrap().stock_quantity
    }

    #[tokio::test]
    async fn test_place_order_occupies_table_and_takes_stock() {
        let f = fixture().await;
        let placed = f
            .lifecycle
            .place_order(
                &f.customer,
                at_table(f.table.id, vec![line(f.burger.id, 2), line(f.soda.id, 3)]),
            )
            .await
            .unwrap();

        assert_eq!(placed.order.status, OrderStatus::Pendente);
        assert_eq!(placed.order.total, 55.0);
        assert_eq!(placed.items.len(), 2);
        assert_eq!(placed.items[0].product_name, "X-Burger");
        assert_eq!(placed.items[0].line_total, 37.0);

        let table = reload_table(&f.pool, f.table.id).await;
        assert_eq!(table.status, TableStatus::Ocupada);
        assert_eq!(table.assigned_to, Some(f.customer.id));

        assert_eq!(stock_of(&f.pool, f.soda.id).await, 2);
        let movements = stock::find_by_order(&f.pool, placed.order.id).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].movement_type, MovementType::Saida);
        assert_eq!((movements[0].previous_quantity, movements[0].new_quantity), (5, 2));

        let staff_unread = notification::count_unread(&f.pool, f.staff.id, UserRole::Staff)
            .await
            .unwrap();
        assert_eq!(staff_unread, 1);
    }

    #[tokio::test]
    async fn test_price_is_snapshotted() {
        let f = fixture().await;
        let placed = f
            .lifecycle
            .place_order(&f.customer, at_table(f.table.id, vec![line(f.burger.id, 1)]))
            .await
            .unwrap();

        product::update(
            &f.pool,
            f.burger.id,
            ProductUpdate {
                price: Some(25.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let detail = load_detail(&f.pool, placed.order.id).await.unwrap();
        assert_eq!(detail.items[0].unit_price, 18.5);
        assert_eq!(detail.order.total, 18.5);
    }

    #[tokio::test]
    async fn test_place_order_from_cart() {
        let f = fixture().await;
        let err = f
            .lifecycle
            .place_order(&f.customer, OrderCreate::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderEmpty);

        cart::add(&f.pool, f.customer.id, f.burger.id, 1, Some("sem cebola"))
            .await
            .unwrap();
        cart::add(&f.pool, f.customer.id, f.soda.id, 2, None).await.unwrap();

        let placed = f
            .lifecycle
            .place_order(
                &f.customer,
                OrderCreate {
                    table_id: None,
                    notes: Some("para viagem".into()),
                    items: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(placed.items.len(), 2);
        assert_eq!(placed.order.total, 30.5);
        assert_eq!(placed.order.table_id, None);
        assert!(
            placed
                .items
                .iter()
                .any(|i| i.notes.as_deref() == Some("sem cebola"))
        );
        assert!(cart::find_lines(&f.pool, f.customer.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_everything_back() {
        let f = fixture().await;
        cart::add(&f.pool, f.customer.id, f.soda.id, 6, None).await.unwrap();

        let err = f
            .lifecycle
            .place_order(
                &f.customer,
                OrderCreate {
                    table_id: Some(f.table.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductOutOfStock);

        assert_eq!(stock_of(&f.pool, f.soda.id).await, 5);
        assert_eq!(reload_table(&f.pool, f.table.id).await.status, TableStatus::Livre);
        assert!(order::find_all(&f.pool, &OrderQuery::default()).await.unwrap().is_empty());
        // the cart survives a failed checkout
        assert_eq!(cart::find_lines(&f.pool, f.customer.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_place_order_rejections() {
        let f = fixture().await;

        product::update(
            &f.pool,
            f.burger.id,
            ProductUpdate {
                is_available: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let err = f
            .lifecycle
            .place_order(&f.customer, at_table(f.table.id, vec![line(f.burger.id, 1)]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductUnavailable);

        let err = f
            .lifecycle
            .place_order(&f.customer, at_table(f.table.id, vec![line(404, 1)]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductNotFound);

        let err = f
            .lifecycle
            .place_order(&f.customer, at_table(404, vec![line(f.soda.id, 1)]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::TableNotFound);

        dining_table::update(
            &f.pool,
            f.table.id,
            DiningTableUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let err = f
            .lifecycle
            .place_order(&f.customer, at_table(f.table.id, vec![line(f.soda.id, 1)]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::TableInactive);

        let err = f
            .lifecycle
            .place_order(&f.customer, at_table(f.table.id, vec![line(f.soda.id, 0)]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        let err = f
            .lifecycle
            .place_order(&f.customer, at_table(f.table.id, Vec::new()))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderEmpty);
    }

    #[tokio::test]
    async fn test_full_progression_frees_table_on_delivery() {
        let f = fixture().await;
        let placed = f
            .lifecycle
            .place_order(&f.customer, at_table(f.table.id, vec![line(f.burger.id, 1)]))
            .await
            .unwrap();
        let id = placed.order.id;

        let received = f.lifecycle.receive(&f.staff, id).await.unwrap();
        assert_eq!(received.order.status, OrderStatus::Confirmado);
        assert_eq!(received.order.received_by, Some(f.staff.id));

        assert_eq!(
            f.lifecycle.advance(&f.staff, id).await.unwrap().order.status,
            OrderStatus::Preparando
        );
        assert_eq!(
            f.lifecycle.advance(&f.staff, id).await.unwrap().order.status,
            OrderStatus::Pronto
        );
        assert_eq!(
            reload_table(&f.pool, f.table.id).await.status,
            TableStatus::Ocupada
        );

        assert_eq!(
            f.lifecycle.advance(&f.staff, id).await.unwrap().order.status,
            OrderStatus::Entregue
        );
        let table = reload_table(&f.pool, f.table.id).await;
        assert_eq!(table.status, TableStatus::Livre);
        assert_eq!(table.assigned_to, None);

        assert_eq!(
            f.lifecycle.advance(&f.staff, id).await.unwrap().order.status,
            OrderStatus::Finalizado
        );
        let err = f.lifecycle.advance(&f.staff, id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderAlreadyCompleted);

        // customer heard about every step, staff about the new order and PRONTO
        let customer_unread =
            notification::count_unread(&f.pool, f.customer.id, UserRole::Customer)
                .await
                .unwrap();
        assert_eq!(customer_unread, 5);
        let staff_unread = notification::count_unread(&f.pool, f.staff.id, UserRole::Staff)
            .await
            .unwrap();
        assert_eq!(staff_unread, 2);
    }

    #[tokio::test]
    async fn test_invalid_transition_and_role() {
        let f = fixture().await;
        let placed = f
            .lifecycle
            .place_order(&f.customer, at_table(f.table.id, vec![line(f.burger.id, 1)]))
            .await
            .unwrap();

        let err = f
            .lifecycle
            .update_status(&f.staff, placed.order.id, OrderStatus::Pronto, None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStatusTransition);
        assert!(err.details.unwrap().contains_key("from"));

        let err = f
            .lifecycle
            .update_status(&f.customer, placed.order.id, OrderStatus::Confirmado, None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::StaffRequired);

        let err = f.lifecycle.receive(&f.staff, 404).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderNotFound);
    }

    #[tokio::test]
    async fn test_staff_cancel_restores_stock_and_frees_table() {
        let f = fixture().await;
        let placed = f
            .lifecycle
            .place_order(&f.customer, at_table(f.table.id, vec![line(f.soda.id, 4)]))
            .await
            .unwrap();
        let id = placed.order.id;
        f.lifecycle.receive(&f.staff, id).await.unwrap();
        f.lifecycle.advance(&f.staff, id).await.unwrap();
        assert_eq!(stock_of(&f.pool, f.soda.id).await, 1);

        let cancelled = f
            .lifecycle
            .update_status(&f.staff, id, OrderStatus::Cancelado, Some("cliente desistiu".into()))
            .await
            .unwrap();
        assert_eq!(cancelled.order.status, OrderStatus::Cancelado);
        assert_eq!(cancelled.order.cancel_reason.as_deref(), Some("cliente desistiu"));
        assert_eq!(stock_of(&f.pool, f.soda.id).await, 5);
        assert_eq!(reload_table(&f.pool, f.table.id).await.status, TableStatus::Livre);

        let ledger = stock::find_by_order(&f.pool, id).await.unwrap();
        assert_eq!(ledger.len(), 2);
        assert!(ledger.iter().any(|m| m.movement_type == MovementType::Entrada));

        let err = f.lifecycle.cancel(&f.staff, id, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderAlreadyCancelled);
        assert_eq!(stock_of(&f.pool, f.soda.id).await, 5);
    }

    #[tokio::test]
    async fn test_staff_cannot_cancel_ready_order() {
        let f = fixture().await;
        let id = f
            .lifecycle
            .place_order(&f.customer, at_table(f.table.id, vec![line(f.burger.id, 1)]))
            .await
            .unwrap()
            .order
            .id;
        for _ in 0..3 {
            f.lifecycle.advance(&f.staff, id).await.unwrap();
        }
        let err = f.lifecycle.cancel(&f.staff, id, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStatusTransition);
    }

    #[tokio::test]
    async fn test_customer_cancel_rules() {
        let f = fixture().await;
        let order = |items| at_table(f.table.id, items);

        let own = f
            .lifecycle
            .place_order(&f.customer, order(vec![line(f.soda.id, 1)]))
            .await
            .unwrap();

        let err = f.lifecycle.cancel(&f.other, own.order.id, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderNotFound);

        let cancelled = f.lifecycle.cancel(&f.customer, own.order.id, None).await.unwrap();
        assert_eq!(cancelled.order.status, OrderStatus::Cancelado);
        assert_eq!(stock_of(&f.pool, f.soda.id).await, 5);

        let confirmed = f
            .lifecycle
            .place_order(&f.customer, order(vec![line(f.burger.id, 1)]))
            .await
            .unwrap();
        f.lifecycle.receive(&f.staff, confirmed.order.id).await.unwrap();
        let err = f
            .lifecycle
            .cancel(&f.customer, confirmed.order.id, None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::CancelNotAllowed);

        setting::update(&f.pool, keys::ALLOW_CUSTOMER_CANCEL, "false")
            .await
            .unwrap();
        let pending = f
            .lifecycle
            .place_order(&f.customer, order(vec![line(f.burger.id, 1)]))
            .await
            .unwrap();
        let err = f
            .lifecycle
            .cancel(&f.customer, pending.order.id, None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::CancelNotAllowed);

        // with the setting off, someone else's order is still hidden
        let err = f
            .lifecycle
            .cancel(&f.other, pending.order.id, None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderNotFound);
    }

    #[tokio::test]
    async fn test_table_follows_latest_active_order() {
        let f = fixture().await;
        let first = f
            .lifecycle
            .place_order(&f.customer, at_table(f.table.id, vec![line(f.burger.id, 1)]))
            .await
            .unwrap();
        let second = f
            .lifecycle
            .place_order(&f.other, at_table(f.table.id, vec![line(f.burger.id, 1)]))
            .await
            .unwrap();
        assert_eq!(
            reload_table(&f.pool, f.table.id).await.assigned_to,
            Some(f.other.id)
        );

        f.lifecycle.cancel(&f.staff, second.order.id, None).await.unwrap();
        let table = reload_table(&f.pool, f.table.id).await;
        assert_eq!(table.status, TableStatus::Ocupada);
        assert_eq!(table.assigned_to, Some(f.customer.id));

        f.lifecycle.cancel(&f.staff, first.order.id, None).await.unwrap();
        assert_eq!(reload_table(&f.pool, f.table.id).await.status, TableStatus::Livre);
    }

    #[tokio::test]
    async fn test_move_table() {
        let f = fixture().await;
        let other_table = table(&f.pool, 2).await;
        let placed = f
            .lifecycle
            .place_order(&f.customer, at_table(f.table.id, vec![line(f.burger.id, 1)]))
            .await
            .unwrap();

        let moved = f
            .lifecycle
            .move_table(&f.staff, placed.order.id, Some(other_table.id))
            .await
            .unwrap();
        assert_eq!(moved.order.table_id, Some(other_table.id));
        assert_eq!(reload_table(&f.pool, f.table.id).await.status, TableStatus::Livre);
        let target = reload_table(&f.pool, other_table.id).await;
        assert_eq!(target.status, TableStatus::Ocupada);
        assert_eq!(target.assigned_to, Some(f.customer.id));

        // same table is a no-op
        let same = f
            .lifecycle
            .move_table(&f.staff, placed.order.id, Some(other_table.id))
            .await
            .unwrap();
        assert_eq!(same.order.table_id, Some(other_table.id));

        let detached = f
            .lifecycle
            .move_table(&f.staff, placed.order.id, None)
            .await
            .unwrap();
        assert_eq!(detached.order.table_id, None);
        assert_eq!(reload_table(&f.pool, other_table.id).await.status, TableStatus::Livre);

        let err = f
            .lifecycle
            .move_table(&f.staff, placed.order.id, Some(404))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::TableNotFound);

        f.lifecycle.cancel(&f.staff, placed.order.id, None).await.unwrap();
        let err = f
            .lifecycle
            .move_table(&f.staff, placed.order.id, Some(f.table.id))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderNotActive);
    }

    #[tokio::test]
    async fn test_set_table_status() {
        let f = fixture().await;

        let occupied = f
            .lifecycle
            .set_table_status(&f.staff, f.table.id, TableStatus::Ocupada, Some(f.other.id))
            .await
            .unwrap();
        assert_eq!(occupied.status, TableStatus::Ocupada);
        assert_eq!(occupied.assigned_to, Some(f.other.id));

        // keeps the current assignee
        let kept = f
            .lifecycle
            .set_table_status(&f.staff, f.table.id, TableStatus::Ocupada, None)
            .await
            .unwrap();
        assert_eq!(kept.assigned_to, Some(f.other.id));

        let freed = f
            .lifecycle
            .set_table_status(&f.staff, f.table.id, TableStatus::Livre, None)
            .await
            .unwrap();
        assert_eq!(freed.status, TableStatus::Livre);
        assert_eq!(freed.assigned_to, None);

        f.lifecycle
            .place_order(&f.customer, at_table(f.table.id, vec![line(f.burger.id, 1)]))
            .await
            .unwrap();
        let err = f
            .lifecycle
            .set_table_status(&f.staff, f.table.id, TableStatus::Livre, None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::TableHasOrders);

        let err = f
            .lifecycle
            .set_table_status(&f.staff, f.table.id, TableStatus::Ocupada, Some(404))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UserNotFound);

        let err = f
            .lifecycle
            .set_table_status(&f.customer, f.table.id, TableStatus::Livre, None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::StaffRequired);
    }

    #[tokio::test]
    async fn test_recompute_repairs_manual_override() {
        let f = fixture().await;
        f.lifecycle
            .set_table_status(&f.staff, f.table.id, TableStatus::Ocupada, Some(f.other.id))
            .await
            .unwrap();
        let table = f.lifecycle.recompute_table(f.table.id).await.unwrap();
        assert_eq!(table.status, TableStatus::Livre);
        assert_eq!(table.assigned_to, None);

        let err = f.lifecycle.recompute_table(404).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::TableNotFound);
    }

    #[tokio::test]
    async fn test_concurrent_checkouts_never_oversell() {
        let f = fixture().await;
        let mut handles = Vec::new();
        for buyer in [f.customer.clone(), f.other.clone()] {
            let lifecycle = f.lifecycle.clone();
            let data = at_table(f.table.id, vec![line(f.soda.id, 3)]);
            handles.push(tokio::spawn(async move {
                lifecycle.place_order(&buyer, data).await
            }));
        }

        let mut placed = 0;
        let mut refused = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => placed += 1,
                Err(e) => {
                    assert_eq!(e.code, ErrorCode::ProductOutOfStock);
                    refused += 1;
                }
            }
        }
        assert_eq!((placed, refused), (1, 1));
        assert_eq!(stock_of(&f.pool, f.soda.id).await, 2);
        let ledger = stock::find_all(
            &f.pool,
            &StockMovementQuery {
                product_id: Some(f.soda.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(ledger.len(), 1);
    }

    // File database with a real pool, so checkouts run on separate
    // connections and only SQLite's own locking orders them.
    async fn file_fixture(dir: &tempfile::TempDir) -> Fixture {
        let db = crate::db::DbService::new(&dir.path().join("pos.db")).await.unwrap();
        fixture_on(db.pool).await
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_takeaway_checkouts_on_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let f = file_fixture(&dir).await;
        let lanches = testing::category(&f.pool, "Combos").await;
        let combo = testing::product(&f.pool, lanches.id, "Combo", 25.0, Some(1000)).await;

        let mut buyers = Vec::new();
        for n in 0..8 {
            let email = format!("buyer{n}@example.com");
            let user = testing::user(&f.pool, &email, UserRole::Customer).await;
            buyers.push(CurrentUser::from(user));
        }

        let mut handles = Vec::new();
        for buyer in &buyers {
            for _ in 0..5 {
                let lifecycle = f.lifecycle.clone();
                let buyer = buyer.clone();
                let data = takeaway(vec![line(combo.id, 1)]);
                handles.push(tokio::spawn(async move {
                    lifecycle.place_order(&buyer, data).await
                }));
            }
        }

        let mut failures = Vec::new();
        for handle in handles {
            if let Err(e) = handle.await.unwrap() {
                failures.push(format!("{}: {}", e.code, e.message));
            }
        }
        assert!(failures.is_empty(), "{failures:?}");
        assert_eq!(stock_of(&f.pool, combo.id).await, 960);
        let placed = order::find_all(&f.pool, &OrderQuery::default()).await.unwrap();
        assert_eq!(placed.len(), 40);
        let numbers: std::collections::HashSet<_> =
            placed.iter().map(|o| o.order_number.clone()).collect();
        assert_eq!(numbers.len(), 40);
        f.pool.close().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_checkouts_on_different_tables_never_oversell() {
        let dir = tempfile::tempdir().unwrap();
        let f = file_fixture(&dir).await;

        let mut handles = Vec::new();
        for n in 0..6 {
            let seat = table(&f.pool, 10 + n).await;
            let lifecycle = f.lifecycle.clone();
            let buyer = if n % 2 == 0 { f.customer.clone() } else { f.other.clone() };
            let data = if n == 0 {
                takeaway(vec![line(f.soda.id, 1)])
            } else {
                at_table(seat.id, vec![line(f.soda.id, 1)])
            };
            handles.push(tokio::spawn(async move {
                lifecycle.place_order(&buyer, data).await
            }));
        }

        let mut placed = Vec::new();
        for handle in handles {
            match handle.await.unwrap() {
                Ok(detail) => placed.push(detail.order.id),
                Err(e) => assert_eq!(e.code, ErrorCode::ProductOutOfStock, "{}", e.message),
            }
        }
        assert_eq!(placed.len(), 5);
        assert_eq!(stock_of(&f.pool, f.soda.id).await, 0);

        // staff work the accepted orders in parallel
        let mut handles = Vec::new();
        for id in placed {
            let lifecycle = f.lifecycle.clone();
            let staff = f.staff.clone();
            handles.push(tokio::spawn(async move { lifecycle.receive(&staff, id).await }));
        }
        for handle in handles {
            let detail = handle.await.unwrap().unwrap();
            assert_eq!(detail.order.status, OrderStatus::Confirmado);
        }
        f.pool.close().await;
    }
}
