//! The panel's user file.
//!
//! The panel keeps its accounts as `{"clients": [...]}` with camelCase keys.
//! A client's row number is its index in that list, which is also what the
//! panel's edit and delete forms send back.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use std::fmt;
use std::path::Path;
use utoipa::ToSchema;

use crate::error::{Error, Result};
use crate::share::{last_four, ConnectionIdentity};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    #[serde(default)]
    pub alter_id: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub expire_date: String,
}

impl Client {
    pub fn identity(&self, number: usize) -> ConnectionIdentity {
        ConnectionIdentity {
            user_number: number.to_string(),
            username: self.username.clone(),
            id: self.id.clone(),
            device_id: self.device_id.clone(),
            exp_date: self.expire_date.clone(),
        }
    }

    /// Unparsable expiry dates never count as expired.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        NaiveDate::parse_from_str(self.expire_date.trim(), DATE_FORMAT)
            .map(|expiry| expiry < today)
            .unwrap_or(false)
    }

    fn matches(&self, number: usize, needle: &str) -> bool {
        let number = number.to_string();
        [
            number.as_str(),
            self.username.as_str(),
            self.id.as_str(),
            self.device_id.as_str(),
            self.start_date.as_str(),
            self.expire_date.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct UserFile {
    #[serde(default)]
    pub clients: Vec<Client>,
    /// Keys other than `clients`, written back untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserFile {
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::user_file(path, e))?;
        Self::parse(&text).map_err(|e| Error::user_file(path, e))
    }

    pub fn parse(text: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// One-space indented JSON, the layout the panel itself writes.
    pub fn to_json(&self) -> std::result::Result<Vec<u8>, serde_json::Error> {
        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b" "));
        self.serialize(&mut ser)?;
        Ok(buf)
    }

    pub fn contains_id(&self, id: &str, except: Option<usize>) -> bool {
        self.clients
            .iter()
            .enumerate()
            .any(|(number, client)| client.id == id && Some(number) != except)
    }

    pub fn find_by_number(&self, number: usize) -> Option<&Client> {
        self.clients.get(number)
    }

    pub fn get(&self, number: usize) -> Result<&Client> {
        self.find_by_number(number).ok_or(Error::UserNotFound(number))
    }

    /// Case-insensitive substring search over every visible column, in file
    /// order. A blank query returns every row.
    pub fn search(&self, query: &str) -> Vec<(usize, &Client)> {
        let needle = query.trim().to_lowercase();
        self.clients
            .iter()
            .enumerate()
            .filter(|(number, client)| needle.is_empty() || client.matches(*number, &needle))
            .collect()
    }
}

// ============================================================================
// Delete Confirmation
// ============================================================================

#[derive(ToSchema, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeleteCheck {
    Confirmed,
    Empty,
    WrongId,
    WrongUsername,
}

impl fmt::Display for DeleteCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteCheck::Confirmed => f.write_str("Delete confirmed."),
            DeleteCheck::Empty => f.write_str("Type the last 4 digits of server UUID and the username."),
            DeleteCheck::WrongId => f.write_str("You type in the wrong last 4 digits of server UUID."),
            DeleteCheck::WrongUsername => f.write_str("You type in the wrong username."),
        }
    }
}

/// The operator must retype the last four characters of the account id and
/// the exact username before a row may be deleted. Input is compared as
/// typed, surrounding whitespace included.
pub fn confirm_delete(client: &Client, typed_id_tail: &str, typed_username: &str) -> DeleteCheck {
    if typed_id_tail.is_empty() || typed_username.is_empty() {
        return DeleteCheck::Empty;
    }
    if typed_id_tail != last_four(&client.id) {
        return DeleteCheck::WrongId;
    }
    if typed_username != client.username {
        return DeleteCheck::WrongUsername;
    }
    DeleteCheck::Confirmed
}
