//! Inventory
//!
//! Stock only changes through ledger entries: manual `ENTRADA` / `SAIDA` /
//! `AJUSTE` movements recorded by admins, and `SAIDA` / `ENTRADA` entries
//! written by the order lifecycle when orders are placed or cancelled.

use shared::error::{AppError, ErrorCode};
use shared::message::resource;
use shared::models::notification::kind;
use shared::models::setting::keys;
use shared::models::{
    MovementType, NotificationAudience, Product, StockMovement, StockMovementCreate,
    StockMovementQuery,
};
use sqlx::{SqliteConnection, SqlitePool};

use crate::auth::CurrentUser;
use crate::db;
use crate::db::repository::{RepoError, product, setting, stock};
use crate::message::EventBus;
use crate::notifications::{NewNotification, NotificationService};
use crate::utils::AppResult;
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text};

/// Movement to apply inside a caller's transaction
#[derive(Debug, Clone)]
pub struct MovementRequest {
    pub product_id: i64,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub reason: Option<String>,
    pub order_id: Option<i64>,
    pub user_id: Option<i64>,
}

/// Apply a stock movement and write its ledger entry.
///
/// Runs on the caller's connection so it commits or rolls back together
/// with whatever caused it. `SAIDA` fails with `ProductOutOfStock` instead
/// of going below zero.
pub async fn apply_movement(
    conn: &mut SqliteConnection,
    request: MovementRequest,
) -> AppResult<StockMovement> {
    validate_movement_quantity(request.movement_type, request.quantity)?;

    let current = product::find_by_id(&mut *conn, request.product_id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::ProductNotFound,
                format!("Product {} not found", request.product_id),
            )
        })?;
    if !current.track_stock {
        return Err(AppError::with_message(
            ErrorCode::StockNotTracked,
            format!("Product '{}' does not track stock", current.name),
        ));
    }

    let (previous_quantity, new_quantity) = match request.movement_type {
        MovementType::Entrada => {
            let new = product::increment_stock(conn, current.id, request.quantity).await?;
            (new - request.quantity, new)
        }
        MovementType::Saida => {
            match product::decrement_stock(conn, current.id, request.quantity).await? {
                Some(new) => (new + request.quantity, new),
                None => return Err(out_of_stock(&current, request.quantity)),
            }
        }
        MovementType::Ajuste => {
            product::set_stock(conn, current.id, request.quantity).await?;
            (current.stock_quantity, request.quantity)
        }
    };

    let movement = StockMovement {
        id: shared::util::snowflake_id(),
        product_id: current.id,
        movement_type: request.movement_type,
        quantity: request.quantity,
        previous_quantity,
        new_quantity,
        reason: request.reason,
        order_id: request.order_id,
        user_id: request.user_id,
        created_at: shared::util::now_millis(),
    };
    stock::insert(conn, &movement).await?;
    Ok(movement)
}

fn validate_movement_quantity(movement_type: MovementType, quantity: i64) -> AppResult<()> {
    let valid = match movement_type {
        MovementType::Entrada | MovementType::Saida => quantity > 0,
        MovementType::Ajuste => quantity >= 0,
    };
    if !valid {
        return Err(AppError::with_message(
            ErrorCode::InvalidStockQuantity,
            format!("Invalid quantity {quantity} for {movement_type}"),
        ));
    }
    Ok(())
}

fn out_of_stock(product: &Product, requested: i64) -> AppError {
    AppError::with_message(
        ErrorCode::ProductOutOfStock,
        format!(
            "Not enough stock for '{}': requested {requested}, available {}",
            product.name, product.stock_quantity
        ),
    )
    .with_detail("product_id", product.id)
    .with_detail("requested", requested)
    .with_detail("available", product.stock_quantity)
}

#[derive(Clone)]
pub struct InventoryService {
    pool: SqlitePool,
    bus: EventBus,
    notifier: NotificationService,
}

impl InventoryService {
    pub fn new(pool: SqlitePool, bus: EventBus, notifier: NotificationService) -> Self {
        Self {
            pool,
            bus,
            notifier,
        }
    }

    /// Manual movement by an admin
    pub async fn record_movement(
        &self,
        user: &CurrentUser,
        data: StockMovementCreate,
    ) -> AppResult<StockMovement> {
        validate_optional_text(&data.reason, "reason", MAX_NOTE_LEN)?;

        let mut tx = db::begin_write(&self.pool).await?;
        let movement = apply_movement(
            &mut tx,
            MovementRequest {
                product_id: data.product_id,
                movement_type: data.movement_type,
                quantity: data.quantity,
                reason: data.reason,
                order_id: None,
                user_id: Some(user.id),
            },
        )
        .await?;
        tx.commit().await.map_err(RepoError::from)?;

        tracing::info!(
            product_id = movement.product_id,
            movement_type = %movement.movement_type,
            quantity = movement.quantity,
            previous = movement.previous_quantity,
            new = movement.new_quantity,
            user_id = user.id,
            "Stock movement recorded"
        );
        self.after_commit(std::slice::from_ref(&movement)).await;
        Ok(movement)
    }

    pub async fn list_movements(
        &self,
        query: &StockMovementQuery,
    ) -> AppResult<Vec<StockMovement>> {
        Ok(stock::find_all(&self.pool, query).await?)
    }

    /// Tracked products at or below their minimum
    pub async fn low_stock(&self) -> AppResult<Vec<Product>> {
        Ok(product::find_low_stock(&self.pool).await?)
    }

    /// Publish product changes and raise low stock alerts for committed movements
    pub async fn after_commit(&self, movements: &[StockMovement]) {
        let mut alerts = None;
        for movement in movements {
            let current = match product::find_by_id(&self.pool, movement.product_id).await {
                Ok(Some(p)) => p,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(
                        product_id = movement.product_id,
                        error = %e,
                        "Failed to reload product"
                    );
                    continue;
                }
            };
            self.bus.updated(resource::PRODUCT, current.id, &current);
            self.bus.created(resource::STOCK, movement.id, movement);

            if !crosses_minimum(movement, current.min_stock) {
                continue;
            }
            // read the flag once, and only when needed
            let enabled = match alerts {
                Some(enabled) => enabled,
                None => {
                    let enabled = setting::get_bool(&self.pool, keys::LOW_STOCK_ALERTS, true)
                        .await
                        .unwrap_or(true);
                    alerts = Some(enabled);
                    enabled
                }
            };
            if !enabled {
                continue;
            }

            tracing::warn!(
                product_id = current.id,
                stock = movement.new_quantity,
                min_stock = current.min_stock,
                "Product reached low stock"
            );
            self.notifier
                .send(
                    None,
                    NotificationAudience::Admin,
                    NewNotification {
                        kind: kind::LOW_STOCK,
                        title: "Estoque baixo".into(),
                        message: format!(
                            "{} tem {} unidades (minimo {})",
                            current.name, movement.new_quantity, current.min_stock
                        ),
                        order_id: movement.order_id,
                    },
                )
                .await;
        }
    }
}

/// Whether the movement took the quantity from above `min_stock` to at or below it
fn crosses_minimum(movement: &StockMovement, min_stock: i64) -> bool {
    movement.previous_quantity > min_stock && movement.new_quantity <= min_stock
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{notification, testing};
    use shared::models::UserRole;

    struct Fixture {
        pool: SqlitePool,
        service: InventoryService,
        admin: CurrentUser,
    }

    async fn fixture() -> Fixture {
        let pool = testing::pool().await;
        let bus = EventBus::new(64);
        let notifier = NotificationService::new(pool.clone(), bus.clone());
        let admin = testing::user(&pool, "admin@example.com", UserRole::Admin).await;
        Fixture {
            service: InventoryService::new(pool.clone(), bus, notifier),
            pool,
            admin: admin.into(),
        }
    }

    impl Fixture {
        async fn record(
            &self,
            product_id: i64,
            movement_type: MovementType,
            quantity: i64,
        ) -> AppResult<StockMovement> {
            let data = StockMovementCreate {
                product_id,
                movement_type,
                quantity,
                reason: None,
            };
            self.service.record_movement(&self.admin, data).await
        }

        async fn admin_unread(&self) -> i64 {
            notification::count_unread(&self.pool, self.admin.id, UserRole::Admin)
                .await
                .unwrap()
        }
    }

    #[tokio::test]
    async fn test_entrada_saida_ajuste() {
        let f = fixture().await;
        let category = testing::category(&f.pool, "Bebidas").await;
        let soda = testing::product(&f.pool, category.id, "Refrigerante", 6.0, Some(10)).await;

        let m = f.record(soda.id, MovementType::Entrada, 5).await.unwrap();
        assert_eq!((m.previous_quantity, m.new_quantity), (10, 15));

        let m = f.record(soda.id, MovementType::Saida, 4).await.unwrap();
        assert_eq!((m.previous_quantity, m.new_quantity), (15, 11));

        let m = f.record(soda.id, MovementType::Ajuste, 3).await.unwrap();
        assert_eq!((m.previous_quantity, m.new_quantity), (11, 3));
        assert_eq!(m.user_id, Some(f.admin.id));

        let all = f
            .service
            .list_movements(&StockMovementQuery {
                product_id: Some(soda.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|m| m.product_id == soda.id));
    }

    #[tokio::test]
    async fn test_saida_cannot_go_negative() {
        let f = fixture().await;
        let category = testing::category(&f.pool, "Bebidas").await;
        let soda = testing::product(&f.pool, category.id, "Refrigerante", 6.0, Some(2)).await;

        let err = f.record(soda.id, MovementType::Saida, 3).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductOutOfStock);

        let reloaded = product::find_by_id(&f.pool, soda.id).await.unwrap().unwrap();
        assert_eq!(reloaded.stock_quantity, 2);
        assert!(f.service.list_movements(&StockMovementQuery::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_quantity_rules() {
        let f = fixture().await;
        let category = testing::category(&f.pool, "Bebidas").await;
        let soda = testing::product(&f.pool, category.id, "Refrigerante", 6.0, Some(2)).await;

        let rejected = [
            (MovementType::Entrada, 0),
            (MovementType::Saida, -1),
            (MovementType::Ajuste, -1),
        ];
        for (kind, qty) in rejected {
            let err = f.record(soda.id, kind, qty).await.unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidStockQuantity);
        }
        assert!(f.record(soda.id, MovementType::Ajuste, 0).await.is_ok());
    }

    #[tokio::test]
    async fn test_untracked_product_rejected() {
        let f = fixture().await;
        let category = testing::category(&f.pool, "Lanches").await;
        let burger = testing::product(&f.pool, category.id, "X-Egg", 14.0, None).await;

        let err = f.record(burger.id, MovementType::Entrada, 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::StockNotTracked);
    }

    #[tokio::test]
    async fn test_low_stock_alert_on_crossing() {
        let f = fixture().await;
        let category = testing::category(&f.pool, "Bebidas").await;
        // min_stock is 2 in the fixture
        let juice = testing::product(&f.pool, category.id, "Suco", 7.0, Some(5)).await;

        f.record(juice.id, MovementType::Saida, 2).await.unwrap();
        assert_eq!(f.admin_unread().await, 0);

        f.record(juice.id, MovementType::Saida, 1).await.unwrap();
        assert_eq!(f.admin_unread().await, 1);

        // already below, no second alert
        f.record(juice.id, MovementType::Saida, 1).await.unwrap();
        assert_eq!(f.admin_unread().await, 1);

        assert_eq!(f.service.low_stock().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_low_stock_alerts_can_be_disabled() {
        let f = fixture().await;
        setting::update(&f.pool, keys::LOW_STOCK_ALERTS, "false").await.unwrap();
        let category = testing::category(&f.pool, "Bebidas").await;
        let juice = testing::product(&f.pool, category.id, "Suco", 7.0, Some(5)).await;

        f.record(juice.id, MovementType::Ajuste, 0).await.unwrap();
        assert_eq!(f.admin_unread().await, 0);
    }
}
