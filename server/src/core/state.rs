use sqlx::SqlitePool;

use shared::models::{UserCreate, UserRole};

use crate::core::{Config, Result};
use crate::db::DbService;
use crate::db::repository::user;
use crate::inventory::InventoryService;
use crate::message::EventBus;
use crate::notifications::NotificationService;
use crate::orders::OrderLifecycle;

/// Server state, shared by every handler
///
/// Every field is cheap to clone (pools, channels and `Arc`s).
///
/// | Field | Meaning |
/// |-------|---------|
/// | config | immutable configuration |
/// | pool | SQLite connection pool |
/// | bus | change events for SSE subscribers |
/// | notifications | persisted notifications |
/// | inventory | stock ledger |
/// | lifecycle | order / table coordinator |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub pool: SqlitePool,
    pub bus: EventBus,
    pub notifications: NotificationService,
    pub inventory: InventoryService,
    pub lifecycle: OrderLifecycle,
}

impl ServerState {
    /// Wire services around an open database
    pub fn new(config: Config, db: DbService) -> Self {
        let pool = db.pool;
        let bus = EventBus::new(config.event_channel_capacity);
        let notifications = NotificationService::new(pool.clone(), bus.clone());
        let inventory = InventoryService::new(pool.clone(), bus.clone(), notifications.clone());
        let lifecycle = OrderLifecycle::new(
            pool.clone(),
            bus.clone(),
            notifications.clone(),
            inventory.clone(),
        );
        Self {
            config,
            pool,
            bus,
            notifications,
            inventory,
            lifecycle,
        }
    }

    /// Initialize server state
    ///
    /// 1. open the database (`work_dir/database/lanchonete.db`) and migrate
    /// 2. wire services
    /// 3. create the bootstrap admin when there are no users yet
    pub async fn initialize(config: &Config) -> Result<Self> {
        let db = DbService::new(&config.database_path()).await?;
        let state = Self::new(config.clone(), db);
        state.ensure_admin().await?;
        Ok(state)
    }

    async fn ensure_admin(&self) -> Result<()> {
        if user::count(&self.pool).await? > 0 {
            return Ok(());
        }
        let admin = user::create(
            &self.pool,
            UserCreate {
                name: "Administrador".into(),
                email: self.config.admin_email.clone(),
                role: Some(UserRole::Admin),
            },
        )
        .await?;
        tracing::warn!(
            user_id = admin.id,
            email = %admin.email,
            "Empty database, bootstrap admin created (send its id as x-user-id)"
        );
        Ok(())
    }
}
