//! In-process test harness
//!
//! Builds the full application (middleware included) over an in-memory
//! database and drives it with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use lanchonete_server::api::build_app;
use lanchonete_server::auth::USER_ID_HEADER;
use lanchonete_server::db::DbService;
use lanchonete_server::db::repository::{category, dining_table, product, user};
use lanchonete_server::{Config, ServerState};
use shared::models::{
    CategoryCreate, DiningTable, DiningTableCreate, Product, ProductCreate, User, UserCreate,
    UserRole,
};

pub struct TestApp {
    pub state: ServerState,
    router: Router,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = DbService::in_memory().await.unwrap();
        let state = ServerState::new(Config::default(), db);
        let router = build_app(&state).with_state(state.clone());
        Self { state, router }
    }

    /// Send a request as `user` (anonymous when `None`)
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        user: Option<i64>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(id) = user {
            builder = builder.header(USER_ID_HEADER, id.to_string());
        }
        let request = match body {
            Some(json) => builder
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn get(&self, uri: &str, user: Option<i64>) -> (StatusCode, Value) {
        self.call(Method::GET, uri, user, None).await
    }

    pub async fn post(&self, uri: &str, user: i64, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(user), Some(body)).await
    }

    pub async fn put(&self, uri: &str, user: i64, body: Value) -> (StatusCode, Value) {
        self.call(Method::PUT, uri, Some(user), Some(body)).await
    }

    pub async fn user(&self, email: &str, role: UserRole) -> User {
        user::create(
            &self.state.pool,
            UserCreate {
                name: email.split('@').next().unwrap_or(email).to_string(),
                email: email.to_string(),
                role: Some(role),
            },
        )
        .await
        .unwrap()
    }

    pub async fn table(&self, number: i32) -> DiningTable {
        dining_table::create(
            &self.state.pool,
            DiningTableCreate {
                number,
                name: None,
                capacity: Some(4),
            },
        )
        .await
        .unwrap()
    }

    /// A stock tracked product in a fresh category
    pub async fn product(&self, name: &str, price: f64, stock: i64) -> Product {
        let category = category::create(
            &self.state.pool,
            CategoryCreate {
                name: format!("{name} category"),
                description: None,
                sort_order: None,
            },
        )
        .await
        .unwrap();
        product::create(
            &self.state.pool,
            ProductCreate {
                name: name.to_string(),
                description: None,
                price,
                category_id: category.id,
                image_url: None,
                is_available: Some(true),
                track_stock: Some(true),
                stock_quantity: Some(stock),
                min_stock: Some(1),
            },
        )
        .await
        .unwrap()
    }
}
