use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

use super::handlers::*;
use super::models::*;
use crate::app::SharedAppState;
use crate::users::DeleteCheck;

#[derive(OpenApi)]
#[openapi(
    paths(list_users, get_user, create_user, update_user, delete_user, confirm_user_delete),
    components(schemas(UserRow, AccountRequest, DeleteCheckRequest, DeleteCheckResponse, DeleteCheck))
)]
pub struct UsersApiDoc;

// ============================================================================
// Routes
// ============================================================================

pub fn routes() -> Router<SharedAppState> {
    Router::new()
        // 用户 CRUD
        .route("/api/v1/users", get(list_users).post(create_user))
        .route(
            "/api/v1/users/{number}",
            get(get_user).put(update_user).delete(delete_user),
        )
        // 删除确认
        .route("/api/v1/users/{number}/confirm-delete", post(confirm_user_delete))
}
