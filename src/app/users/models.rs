// 用户管理模块
// User Management Module

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::users::{Client, DeleteCheck};

// ============================================================================
// Request Types
// ============================================================================

/// 用户列表查询参数
#[derive(IntoParams, Deserialize, Clone, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct UserListParams {
    /// Case-insensitive filter over every column.
    pub search: Option<String>,
}

/// 创建/更新用户请求
#[derive(ToSchema, Deserialize, Serialize, Validate, Clone, Debug, Default)]
pub struct AccountRequest {
    /// Account id. Empty gets a fresh UUID on create and keeps the current
    /// one on update.
    #[schema(example = "9b2c6f0e-1d7a-4c53-8a4e-2f1d3b5c7890")]
    #[validate(length(max = 128))]
    #[serde(default)]
    pub id: String,

    #[schema(example = "mgmg")]
    #[validate(length(min = 1, max = 100))]
    #[serde(default)]
    pub username: String,

    /// Empty leaves the account without a device lock.
    #[validate(length(max = 128))]
    #[serde(default)]
    pub device_id: String,

    #[schema(example = "2025-01-01")]
    #[validate(length(max = 32))]
    #[serde(default)]
    pub start_date: String,

    #[schema(example = "2025-02-01")]
    #[validate(length(max = 32))]
    #[serde(default)]
    pub expire_date: String,
}

impl AccountRequest {
    pub fn into_client(self) -> Client {
        Client {
            id: self.id.trim().to_string(),
            alter_id: 1,
            username: self.username,
            device_id: self.device_id.trim().to_string(),
            start_date: self.start_date,
            expire_date: self.expire_date,
        }
    }
}

/// 删除确认请求
#[derive(ToSchema, Deserialize, Serialize, Validate, Clone, Debug)]
pub struct DeleteCheckRequest {
    #[schema(example = "7890")]
    #[validate(length(max = 64))]
    #[serde(default)]
    pub id_tail: String,

    #[schema(example = "mgmg")]
    #[validate(length(max = 100))]
    #[serde(default)]
    pub username: String,
}

// ============================================================================
// Response Types
// ============================================================================

/// 用户行
#[derive(ToSchema, Serialize, Clone, Debug)]
pub struct UserRow {
    pub number: usize,
    pub username: String,
    pub id: String,
    pub device_id: String,
    pub start_date: String,
    pub expire_date: String,
    pub expired: bool,
}

impl UserRow {
    pub fn new(number: usize, client: &Client, today: chrono::NaiveDate) -> Self {
        Self {
            number,
            username: client.username.clone(),
            id: client.id.clone(),
            device_id: client.device_id.clone(),
            start_date: client.start_date.clone(),
            expire_date: client.expire_date.clone(),
            expired: client.is_expired(today),
        }
    }
}

#[derive(ToSchema, Serialize, Clone, Debug)]
pub struct DeleteCheckResponse {
    pub result: DeleteCheck,
}
