//! Notifications API Handlers

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};
use serde::Serialize;
use shared::models::{Notification, NotificationQuery};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::notification;
use crate::message::{ServerEvent, filter};
use crate::utils::AppResult;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkedRead {
    pub updated: u64,
}

/// GET /api/notifications?unread_only=&limit=
pub async fn list(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(query): Query<NotificationQuery>,
) -> AppResult<Json<Vec<Notification>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let notifications = notification::find_visible(
        &state.pool,
        current.id,
        current.role,
        query.unread_only.unwrap_or(false),
        limit,
    )
    .await?;
    Ok(Json(notifications))
}

/// GET /api/notifications/unread-count
pub async fn unread_count(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<UnreadCount>> {
    let count = notification::count_unread(&state.pool, current.id, current.role).await?;
    Ok(Json(UnreadCount { count }))
}

/// PUT /api/notifications/{id}/read
pub async fn mark_read(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    notification::mark_read(&state.pool, id, current.id, current.role).await?;
    Ok(Json(true))
}

/// PUT /api/notifications/read-all
pub async fn mark_all_read(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<MarkedRead>> {
    let updated = notification::mark_all_read(&state.pool, current.id, current.role).await?;
    tracing::debug!(user_id = current.id, updated, "Notifications marked read");
    Ok(Json(MarkedRead { updated }))
}

/// GET /api/notifications/events
///
/// Server-sent events, one per committed change the caller may see.
/// Slow readers skip the events they missed and get a `lagged` event with
/// the count so they can refetch.
pub async fn events(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!(user_id = current.id, role = %current.role, "Event stream opened");
    let stream = visible_events(state.bus.subscribe(), current).filter_map(|item| async move {
        match item {
            StreamItem::Event(event) => Event::default()
                .event(event.event_name())
                .json_data(&event)
                .ok()
                .map(Ok),
            StreamItem::Lagged(skipped) => {
                Some(Ok(Event::default().event("lagged").data(skipped.to_string())))
            }
        }
    });
    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

#[derive(Debug)]
enum StreamItem {
    Event(ServerEvent),
    /// Events dropped because the reader fell behind
    Lagged(u64),
}

/// Bus events the caller may see; ends when the bus closes
fn visible_events(
    rx: broadcast::Receiver<ServerEvent>,
    current: CurrentUser,
) -> impl Stream<Item = StreamItem> {
    futures::stream::unfold((rx, current), |(mut rx, current)| async move {
        loop {
            match rx.recv().await {
                Ok(event) if filter::visible_to(&event, current.id, current.role) => {
                    return Some((StreamItem::Event(event), (rx, current)));
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(user_id = current.id, skipped, "Event stream lagged");
                    return Some((StreamItem::Lagged(skipped), (rx, current)));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{EventBus, resource};
    use futures::StreamExt;
    use serde_json::json;
    use shared::models::UserRole;

    fn caller(id: i64, role: UserRole) -> CurrentUser {
        CurrentUser {
            id,
            name: format!("user{id}"),
            role,
        }
    }

    #[tokio::test]
    async fn test_customer_stream_skips_other_customers_orders() {
        let bus = EventBus::new(16);
        let stream = visible_events(bus.subscribe(), caller(7, UserRole::Customer));

        bus.updated(resource::ORDER, 1, &json!({ "id": 1, "user_id": 8 }));
        bus.updated(resource::TABLE, 3, &json!({ "id": 3, "assigned_to": 7 }));
        bus.updated(resource::ORDER, 2, &json!({ "id": 2, "user_id": 7 }));
        bus.updated(resource::PRODUCT, 5, &json!({ "id": 5 }));
        drop(bus);

        let seen: Vec<_> = stream
            .map(|item| match item {
                StreamItem::Event(e) => (e.resource, e.id),
                StreamItem::Lagged(n) => panic!("unexpected lag of {n}"),
            })
            .collect()
            .await;
        assert_eq!(
            seen,
            vec![
                (resource::ORDER.to_string(), Some(2)),
                (resource::PRODUCT.to_string(), Some(5)),
            ]
        );
    }

    #[tokio::test]
    async fn test_slow_reader_gets_lag_count() {
        let bus = EventBus::new(1);
        let mut stream = Box::pin(visible_events(bus.subscribe(), caller(1, UserRole::Staff)));

        for id in 1..=4 {
            bus.updated(resource::TABLE, id, &json!({ "id": id }));
        }

        match stream.next().await {
            Some(StreamItem::Lagged(skipped)) => assert_eq!(skipped, 3),
            other => panic!("expected lag, got {other:?}"),
        }
        match stream.next().await {
            Some(StreamItem::Event(e)) => assert_eq!(e.id, Some(4)),
            other => panic!("expected the newest event, got {other:?}"),
        }

        drop(bus);
        assert!(stream.next().await.is_none());
    }
}
