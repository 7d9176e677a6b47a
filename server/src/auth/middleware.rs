//! Identity middleware
//!
//! # Public routes (no identity required)
//!
//! - `OPTIONS *` (CORS preflight)
//! - non `/api/` paths (`/health`)
//! - `GET /api/menu`, `GET /api/categories*`, `GET /api/products*`
//! - `GET /api/settings/public`
//!
//! # Errors
//!
//! | Error | HTTP status |
//! |-------|-------------|
//! | missing / malformed `x-user-id` | 401 NotAuthenticated |
//! | unknown user | 401 NotAuthenticated |
//! | deactivated user | 401 AccountDisabled |
//! | role too low | 403 StaffRequired / AdminRequired |

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use http::Method;
use shared::error::ErrorCode;
use shared::models::UserRole;

use crate::auth::{CurrentUser, USER_ID_HEADER};
use crate::core::ServerState;
use crate::db::repository::user;
use crate::security_log;
use crate::utils::AppError;

/// Routes reachable without an identity
pub fn is_public_route(method: &Method, path: &str) -> bool {
    if method == Method::OPTIONS || !path.starts_with("/api/") {
        return true;
    }
    method == Method::GET
        && (path == "/api/menu"
            || path == "/api/settings/public"
            || path == "/api/categories"
            || path.starts_with("/api/categories/")
            || path == "/api/products"
            || path.starts_with("/api/products/"))
}

/// Resolve `x-user-id` to an active user and inject [`CurrentUser`]
pub async fn require_operator(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if is_public_route(req.method(), req.uri().path()) {
        return Ok(next.run(req).await);
    }

    let Some(raw) = req.headers().get(USER_ID_HEADER) else {
        security_log!("WARN", "identity_missing", uri = req.uri().to_string());
        return Err(AppError::not_authenticated());
    };
    let user_id: i64 = raw
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::NotAuthenticated, "Malformed x-user-id header")
        })?;

    let found = user::find_by_id(&state.pool, user_id).await?;
    let Some(found) = found else {
        security_log!("WARN", "identity_unknown", user_id = user_id);
        return Err(AppError::not_authenticated());
    };
    if !found.is_active {
        security_log!("WARN", "identity_disabled", user_id = user_id);
        return Err(AppError::new(ErrorCode::AccountDisabled));
    }

    req.extensions_mut().insert(CurrentUser::from(found));
    Ok(next.run(req).await)
}

/// Role gate - requires at least `min`
///
/// # Usage
///
/// ```ignore
/// use axum::middleware;
/// Router::new()
///     .route("/", post(handler::create))
///     .layer(middleware::from_fn(require_role(UserRole::Admin)));
/// ```
pub fn require_role(
    min: UserRole,
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AppError>> + Send>>
+ Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let user = req
                .extensions()
                .get::<CurrentUser>()
                .ok_or_else(AppError::not_authenticated)?;

            if let Err(e) = user.require(min) {
                security_log!(
                    "WARN",
                    "role_denied",
                    user_id = user.id,
                    role = user.role.as_str(),
                    required_role = min.as_str()
                );
                return Err(e);
            }

            Ok(next.run(req).await)
        })
    }
}
