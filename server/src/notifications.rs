//! Notification service
//!
//! Persists notifications and pushes them on the event bus. Callers run it
//! after their transaction committed; a failed notification never undoes
//! the change that caused it.

use shared::message::{EventKind, resource};
use shared::models::{Notification, NotificationAudience};
use sqlx::SqlitePool;

use crate::db::repository::notification as repo;
use crate::message::EventBus;
use crate::utils::AppResult;

/// Message addressed to a user or an audience
#[derive(Debug, Clone)]
pub struct NewNotification<'a> {
    pub kind: &'a str,
    pub title: String,
    pub message: String,
    pub order_id: Option<i64>,
}

#[derive(Clone)]
pub struct NotificationService {
    pool: SqlitePool,
    bus: EventBus,
}

impl NotificationService {
    pub fn new(pool: SqlitePool, bus: EventBus) -> Self {
        Self { pool, bus }
    }

    pub async fn notify_user(
        &self,
        user_id: i64,
        note: NewNotification<'_>,
    ) -> AppResult<Notification> {
        self.store(Some(user_id), NotificationAudience::User, note).await
    }

    /// Every staff member and admin
    pub async fn notify_staff(&self, note: NewNotification<'_>) -> AppResult<Notification> {
        self.store(None, NotificationAudience::Staff, note).await
    }

    pub async fn notify_admins(&self, note: NewNotification<'_>) -> AppResult<Notification> {
        self.store(None, NotificationAudience::Admin, note).await
    }

    /// Fire and forget variant for post-commit hooks
    pub async fn send(
        &self,
        target: Option<i64>,
        audience: NotificationAudience,
        note: NewNotification<'_>,
    ) {
        let kind = note.kind;
        if let Err(e) = self.store(target, audience, note).await {
            tracing::warn!(kind, ?target, error = %e, "Failed to store notification");
        }
    }

    async fn store(
        &self,
        user_id: Option<i64>,
        audience: NotificationAudience,
        note: NewNotification<'_>,
    ) -> AppResult<Notification> {
        let notification = Notification {
            id: shared::util::snowflake_id(),
            user_id,
            audience,
            kind: note.kind.to_string(),
            title: note.title,
            message: note.message,
            order_id: note.order_id,
            is_read: false,
            created_at: shared::util::now_millis(),
        };
        repo::insert(&self.pool, &notification).await?;

        self.bus.publish(
            EventKind::Notification,
            resource::NOTIFICATION,
            Some(notification.id),
            Some(&notification),
        );
        tracing::debug!(
            notification_id = notification.id,
            kind = %notification.kind,
            ?audience,
            "Notification stored"
        );
        Ok(notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::testing;
    use shared::models::UserRole;

    #[tokio::test]
    async fn test_notify_persists_and_publishes() {
        let pool = testing::pool().await;
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let service = NotificationService::new(pool.clone(), bus);
        let customer = testing::user(&pool, "c@example.com", UserRole::Customer).await;

        let stored = service
            .notify_user(
                customer.id,
                NewNotification {
                    kind: "ORDER_STATUS",
                    title: "Pedido".into(),
                    message: "Seu pedido esta pronto".into(),
                    order_id: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(stored.user_id, Some(customer.id));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, EventKind::Notification);
        assert_eq!(event.id, Some(stored.id));

        let unread = repo::count_unread(&pool, customer.id, customer.role).await.unwrap();
        assert_eq!(unread, 1);
    }
}
