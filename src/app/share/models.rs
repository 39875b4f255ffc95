// 分享链接模块
// Share Link Module

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::share::{ConnectionIdentity, QrCaption};

// ============================================================================
// Request Types
// ============================================================================

/// 分享查询参数
#[derive(IntoParams, Deserialize, Clone, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct ShareParams {
    /// Wrap the link in the device-lock envelope.
    pub locked: Option<bool>,
}

/// 按请求体生成分享链接
#[derive(ToSchema, Deserialize, Serialize, Validate, Clone, Debug)]
pub struct ShareRequest {
    #[serde(flatten)]
    #[validate(nested)]
    pub identity: ConnectionIdentity,

    #[serde(default)]
    pub locked: bool,
}

// ============================================================================
// Response Types
// ============================================================================

/// 分享链接响应
#[derive(ToSchema, Serialize, Clone, Debug)]
pub struct ShareResponse {
    #[schema(example = "vmess://eyJhZGQiOiJzZzEuZXhhbXBsZS5jb20i...")]
    pub uri: String,
    pub locked: bool,
    pub caption: QrCaption,
}

#[derive(ToSchema, Serialize, Clone, Debug)]
pub struct UuidResponse {
    #[schema(example = "9b2c6f0e-1d7a-4c53-8a4e-2f1d3b5c7890")]
    pub id: String,
}
