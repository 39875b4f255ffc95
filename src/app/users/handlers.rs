use axum::{extract::State, response::Json};
use validator::Validate;

use crate::app::{ApiError, ApiJson, ApiPath, ApiQuery, ApiResponse, SharedAppState};
use crate::users::{confirm_delete, UserFile};

use super::models::*;

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

// ============================================================================
// API Handlers
// ============================================================================

/// 获取用户列表
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(UserListParams),
    responses((status = 200, description = "Rows of the user file", body = [UserRow]))
)]
pub async fn list_users(
    State(state): State<SharedAppState>,
    ApiQuery(params): ApiQuery<UserListParams>,
) -> ApiResult<Vec<UserRow>> {
    let users = UserFile::load(&state.settings.user_file).await?;
    let today = today();
    let rows: Vec<UserRow> = users
        .search(params.search.as_deref().unwrap_or(""))
        .into_iter()
        .map(|(number, client)| UserRow::new(number, client, today))
        .collect();
    Ok(Json(ApiResponse::success(format!("{} users", rows.len()), rows)))
}

/// 获取单个用户
#[utoipa::path(
    get,
    path = "/api/v1/users/{number}",
    params(("number" = usize, Path, description = "Row number in the user file")),
    responses(
        (status = 200, description = "One row of the user file", body = UserRow),
        (status = 404, description = "No such row")
    )
)]
pub async fn get_user(
    State(state): State<SharedAppState>,
    ApiPath(number): ApiPath<usize>,
) -> ApiResult<UserRow> {
    let users = UserFile::load(&state.settings.user_file).await?;
    let row = UserRow::new(number, users.get(number)?, today());
    Ok(Json(ApiResponse::success("User found", row)))
}

/// 创建用户
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = AccountRequest,
    responses(
        (status = 200, description = "Account added to the user file and the v2ray config", body = UserRow),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Account id already in use")
    )
)]
pub async fn create_user(
    State(state): State<SharedAppState>,
    ApiJson(req): ApiJson<AccountRequest>,
) -> ApiResult<UserRow> {
    req.validate()
        .map_err(|e| ApiError::bad_request(format!("Invalid account: {}", e)))?;

    let (number, client) = state.accounts.create(req.into_client()).await?;
    Ok(Json(ApiResponse::success("User created", UserRow::new(number, &client, today()))))
}

/// 更新用户
#[utoipa::path(
    put,
    path = "/api/v1/users/{number}",
    params(("number" = usize, Path, description = "Row number in the user file")),
    request_body = AccountRequest,
    responses(
        (status = 200, description = "Row replaced in the user file and the v2ray config", body = UserRow),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "No such row"),
        (status = 409, description = "Account id already in use")
    )
)]
pub async fn update_user(
    State(state): State<SharedAppState>,
    ApiPath(number): ApiPath<usize>,
    ApiJson(req): ApiJson<AccountRequest>,
) -> ApiResult<UserRow> {
    req.validate()
        .map_err(|e| ApiError::bad_request(format!("Invalid account: {}", e)))?;

    let client = state.accounts.update(number, req.into_client()).await?;
    Ok(Json(ApiResponse::success("User updated", UserRow::new(number, &client, today()))))
}

/// 删除用户
#[utoipa::path(
    delete,
    path = "/api/v1/users/{number}",
    params(("number" = usize, Path, description = "Row number in the user file")),
    request_body = DeleteCheckRequest,
    responses(
        (status = 200, description = "Row removed from the user file and the v2ray config", body = UserRow),
        (status = 400, description = "Id tail or username retyped wrong"),
        (status = 404, description = "No such row")
    )
)]
pub async fn delete_user(
    State(state): State<SharedAppState>,
    ApiPath(number): ApiPath<usize>,
    ApiJson(req): ApiJson<DeleteCheckRequest>,
) -> ApiResult<UserRow> {
    req.validate()
        .map_err(|e| ApiError::bad_request(format!("Invalid request: {}", e)))?;

    let removed = state.accounts.delete(number, &req.id_tail, &req.username).await?;
    Ok(Json(ApiResponse::success("User deleted", UserRow::new(number, &removed, today()))))
}

/// 删除前确认
#[utoipa::path(
    post,
    path = "/api/v1/users/{number}/confirm-delete",
    params(("number" = usize, Path, description = "Row number in the user file")),
    request_body = DeleteCheckRequest,
    responses(
        (status = 200, description = "Outcome of the retype check, nothing is deleted", body = DeleteCheckResponse),
        (status = 404, description = "No such row")
    )
)]
pub async fn confirm_user_delete(
    State(state): State<SharedAppState>,
    ApiPath(number): ApiPath<usize>,
    ApiJson(req): ApiJson<DeleteCheckRequest>,
) -> ApiResult<DeleteCheckResponse> {
    req.validate()
        .map_err(|e| ApiError::bad_request(format!("Invalid request: {}", e)))?;

    let users = UserFile::load(&state.settings.user_file).await?;
    let result = confirm_delete(users.get(number)?, &req.id_tail, &req.username);
    Ok(Json(ApiResponse::success(result.to_string(), DeleteCheckResponse { result })))
}
