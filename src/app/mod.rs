// 应用模块
// App Module

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use utoipa::OpenApi;

use crate::accounts::AccountStore;
use crate::config::Settings;
use crate::error::Error;

pub mod share;
pub mod users;

#[cfg(test)]
mod testing;

pub struct AppState {
    pub settings: Settings,
    pub accounts: AccountStore,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let accounts = AccountStore::from_settings(&settings);
        Self { settings, accounts }
    }
}

pub type SharedAppState = Arc<AppState>;

pub fn router(state: SharedAppState) -> Router {
    Router::new()
        .merge(users::routes())
        .merge(share::routes())
        .route("/api/v1/openapi.yaml", get(openapi_yaml))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(settings: Settings) -> crate::error::Result<()> {
    let port = settings.listen_port;
    info!(
        "Sharing links for {}:{} from user file {}",
        settings.server_host,
        settings.v2ray_port,
        settings.user_file.display()
    );
    let app = router(Arc::new(AppState::new(settings)));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Share API listening on http://localhost:{}", port);
    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// OpenAPI
// ============================================================================

pub fn openapi() -> utoipa::openapi::OpenApi {
    let mut doc = users::UsersApiDoc::openapi();
    doc.merge(share::ShareApiDoc::openapi());
    doc
}

async fn openapi_yaml() -> Result<impl IntoResponse, ApiError> {
    let yaml = openapi()
        .to_yaml()
        .map_err(|e| ApiError::internal(format!("failed to render OpenAPI document: {}", e)))?;
    Ok(([(header::CONTENT_TYPE, "application/yaml")], yaml))
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

/// Error half of every handler result.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        error!("{}", message);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message,
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::MissingDeviceId
            | Error::UnsupportedScheme(_)
            | Error::Base64(_)
            | Error::Utf8(_)
            | Error::Json(_)
            | Error::LockedPayload
            | Error::DeleteRejected(_) => StatusCode::BAD_REQUEST,
            Error::UserNotFound(_) => StatusCode::NOT_FOUND,
            Error::DuplicateAccount(_) => StatusCode::CONFLICT,
            Error::UserFile { .. } | Error::ServerConfig { .. } | Error::Config(_) | Error::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            error!("{}", err);
        } else {
            warn!("{}", err);
        }
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::error(self.message))).into_response()
    }
}

// ============================================================================
// Extractors
// ============================================================================

// Malformed bodies, paths and query strings answer in the envelope like
// every other failure.

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("Rejected body: {}", rejection.body_text());
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        warn!("Rejected path: {}", rejection.body_text());
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        warn!("Rejected query: {}", rejection.body_text());
        Self::bad_request(rejection.body_text())
    }
}

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_use_envelope_with_500() {
        let err = ApiError::internal("failed to render OpenAPI document: boom");
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.starts_with("config error"));
    }

    #[test]
    fn error_kinds_map_to_statuses() {
        let status = |e: Error| ApiError::from(e).status;
        assert_eq!(status(Error::MissingDeviceId), StatusCode::BAD_REQUEST);
        assert_eq!(status(Error::UserNotFound(3)), StatusCode::NOT_FOUND);
        assert_eq!(status(Error::DuplicateAccount("x".into())), StatusCode::CONFLICT);
        assert_eq!(
            status(Error::DeleteRejected(crate::users::DeleteCheck::WrongId)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(Error::ServerConfig {
                path: "server.json".into(),
                message: "bad".into()
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn openapi_lists_every_route() {
        let yaml = openapi().to_yaml().unwrap();
        for path in [
            "/api/v1/users",
            "/api/v1/users/{number}",
            "/api/v1/users/{number}/share",
            "/api/v1/users/{number}/confirm-delete",
            "/api/v1/share",
            "/api/v1/uuid",
        ] {
            assert!(yaml.contains(path), "{} missing", path);
        }
    }
}
