use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

use super::handlers::*;
use super::models::*;
use crate::app::SharedAppState;
use crate::share::{ConnectionIdentity, QrCaption};

#[derive(OpenApi)]
#[openapi(
    paths(share_user, share_identity, generate_uuid),
    components(schemas(ShareRequest, ShareResponse, ConnectionIdentity, QrCaption, UuidResponse))
)]
pub struct ShareApiDoc;

// ============================================================================
// Routes
// ============================================================================

pub fn routes() -> Router<SharedAppState> {
    Router::new()
        // 分享链接
        .route("/api/v1/users/{number}/share", get(share_user))
        .route("/api/v1/share", post(share_identity))
        // 工具
        .route("/api/v1/uuid", get(generate_uuid))
}
