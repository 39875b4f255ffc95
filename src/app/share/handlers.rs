use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::Json,
};
use tracing::info;
use validator::Validate;

use crate::app::{ApiError, ApiJson, ApiPath, ApiQuery, ApiResponse, SharedAppState};
use crate::config::Settings;
use crate::share::{encode_locked, encode_unlocked, new_opaque_id, ConnectionIdentity, QrCaption};
use crate::users::UserFile;

use super::models::*;

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Host the browser used to reach us, the origin the remark label comes from.
fn request_host(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::HOST).and_then(|h| h.to_str().ok())
}

pub(crate) fn build_share(
    settings: &Settings,
    identity: &ConnectionIdentity,
    request_host: Option<&str>,
    locked: bool,
) -> crate::error::Result<ShareResponse> {
    let profile = settings.profile(request_host);
    let uri = if locked {
        encode_locked(identity, &profile)?
    } else {
        encode_unlocked(identity, &profile)?
    };
    Ok(ShareResponse {
        uri,
        locked,
        caption: QrCaption::new(identity, &profile.subdomain, locked),
    })
}

// ============================================================================
// API Handlers
// ============================================================================

/// 生成用户分享链接
#[utoipa::path(
    get,
    path = "/api/v1/users/{number}/share",
    params(("number" = usize, Path, description = "Row number in the user file"), ShareParams),
    responses(
        (status = 200, description = "Share link and QR caption", body = ShareResponse),
        (status = 400, description = "Locked link requested for a user without device id"),
        (status = 404, description = "No such row")
    )
)]
pub async fn share_user(
    State(state): State<SharedAppState>,
    ApiPath(number): ApiPath<usize>,
    ApiQuery(params): ApiQuery<ShareParams>,
    headers: HeaderMap,
) -> ApiResult<ShareResponse> {
    let users = UserFile::load(&state.settings.user_file).await?;
    let identity = users.get(number)?.identity(number);
    let locked = params.locked.unwrap_or(false);

    let response = build_share(&state.settings, &identity, request_host(&headers), locked)?;
    info!("Generated {} link for user #{} ({})", if locked { "locked" } else { "open" }, number, identity.username);
    Ok(Json(ApiResponse::success("Share link generated", response)))
}

/// 按请求体生成分享链接
#[utoipa::path(
    post,
    path = "/api/v1/share",
    request_body = ShareRequest,
    responses(
        (status = 200, description = "Share link and QR caption", body = ShareResponse),
        (status = 400, description = "Invalid identity or missing device id")
    )
)]
pub async fn share_identity(
    State(state): State<SharedAppState>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<ShareRequest>,
) -> ApiResult<ShareResponse> {
    req.validate()
        .map_err(|e| ApiError::bad_request(format!("Invalid identity: {}", e)))?;

    let response = build_share(&state.settings, &req.identity, request_host(&headers), req.locked)?;
    Ok(Json(ApiResponse::success("Share link generated", response)))
}

/// 生成新的 UUID
#[utoipa::path(
    get,
    path = "/api/v1/uuid",
    responses((status = 200, description = "Fresh account id", body = UuidResponse))
)]
pub async fn generate_uuid() -> ApiResult<UuidResponse> {
    Ok(Json(ApiResponse::success("Generated", UuidResponse { id: new_opaque_id() })))
}
