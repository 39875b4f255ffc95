use axum::http::uri::Authority;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// One user's share inputs, built from a user-file row or a request body
/// right before encoding.
#[derive(ToSchema, Deserialize, Serialize, Validate, Clone, Debug, Default, PartialEq)]
pub struct ConnectionIdentity {
    #[serde(default)]
    pub user_number: String,

    #[schema(example = "mgmg")]
    #[serde(default)]
    pub username: String,

    #[schema(example = "9b2c6f0e-1d7a-4c53-8a4e-2f1d3b5c7890")]
    #[validate(length(min = 1, max = 128))]
    #[serde(default)]
    pub id: String,

    /// Empty means the link is not device-locked.
    #[serde(default)]
    pub device_id: String,

    #[schema(example = "2025-01-01")]
    #[serde(default)]
    pub exp_date: String,
}

impl ConnectionIdentity {
    pub fn is_locked(&self) -> bool {
        !self.device_id.is_empty()
    }

    pub fn id_tail(&self) -> &str {
        last_four(&self.id)
    }

    /// Device tail shown under a locked QR. The payload always carries the
    /// full device id.
    pub fn device_tail(&self) -> &str {
        last_four(&self.device_id)
    }
}

/// Last four characters of `value`, or all of it when shorter.
pub fn last_four(value: &str) -> &str {
    let start = value
        .char_indices()
        .rev()
        .nth(3)
        .map(|(i, _)| i)
        .unwrap_or(0);
    &value[start..]
}

/// Leading label of a hostname: `sg1.example.com:8888` -> `sg1`. Text that
/// is not a valid authority is labelled as is.
pub fn subdomain_label(host: &str) -> String {
    let host = host.trim();
    let name = match host.parse::<Authority>() {
        Ok(authority) => authority.host().to_string(),
        Err(_) => host.to_string(),
    };
    match name.split_once('.') {
        Some((label, _)) => label.to_string(),
        None => name,
    }
}
