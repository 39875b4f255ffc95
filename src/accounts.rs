//! Account writes.
//!
//! The user file and the v2ray server config hold the same accounts in the
//! same order: row `n` of the user file's `clients` is entry `n` of the
//! server's `inbounds[0].settings.clients`. Every write changes both files.

use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::info;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::share::new_opaque_id;
use crate::users::{confirm_delete, Client, DeleteCheck, UserFile};

const INBOUND_CLIENTS: &str = "/inbounds/0/settings/clients";

/// The v2ray server config, kept as raw JSON so every key besides the
/// client list is written back as it was read.
#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    doc: Value,
}

impl ServerConfig {
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::server_config(path, e))?;
        Self::parse(&text).map_err(|e| Error::server_config(path, e))
    }

    pub fn parse(text: &str) -> std::result::Result<Self, serde_json::Error> {
        Ok(Self {
            doc: serde_json::from_str(text)?,
        })
    }

    pub fn clients(&self) -> Option<&Vec<Value>> {
        self.doc.pointer(INBOUND_CLIENTS).and_then(Value::as_array)
    }

    fn clients_mut(&mut self) -> Option<&mut Vec<Value>> {
        self.doc.pointer_mut(INBOUND_CLIENTS).and_then(Value::as_array_mut)
    }

    pub fn to_json(&self) -> std::result::Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(&self.doc)
    }
}

fn inbound_entry(client: &Client) -> Value {
    json!({ "id": client.id, "alterId": client.alter_id })
}

/// Writes next to `path` first, then renames over it.
async fn write_replacing(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await
}

// ============================================================================
// Account Store
// ============================================================================

pub struct AccountStore {
    user_file: PathBuf,
    server_config: PathBuf,
    write_lock: Mutex<()>,
}

impl AccountStore {
    pub fn new(user_file: impl Into<PathBuf>, server_config: impl Into<PathBuf>) -> Self {
        Self {
            user_file: user_file.into(),
            server_config: server_config.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.user_file, &settings.v2ray_config)
    }

    fn missing_clients(&self) -> Error {
        Error::server_config(&self.server_config, "no inbounds[0].settings.clients list")
    }

    /// Both files, refusing to go on when their rows are out of step.
    async fn load(&self) -> Result<(UserFile, ServerConfig)> {
        let users = UserFile::load(&self.user_file).await?;
        let config = ServerConfig::load(&self.server_config).await?;
        let inbound = config.clients().ok_or_else(|| self.missing_clients())?.len();
        if inbound != users.clients.len() {
            return Err(Error::server_config(
                &self.server_config,
                format!(
                    "{} inbound clients but {} rows in {}",
                    inbound,
                    users.clients.len(),
                    self.user_file.display()
                ),
            ));
        }
        Ok((users, config))
    }

    async fn save(&self, users: &UserFile, config: &ServerConfig) -> Result<()> {
        let config_json = config
            .to_json()
            .map_err(|e| Error::server_config(&self.server_config, e))?;
        let users_json = users
            .to_json()
            .map_err(|e| Error::user_file(&self.user_file, e))?;

        write_replacing(&self.server_config, &config_json)
            .await
            .map_err(|e| Error::server_config(&self.server_config, e))?;
        write_replacing(&self.user_file, &users_json)
            .await
            .map_err(|e| Error::user_file(&self.user_file, e))
    }

    /// Appends `client` to both files and returns its row number. An empty
    /// id gets a fresh one.
    pub async fn create(&self, mut client: Client) -> Result<(usize, Client)> {
        let _guard = self.write_lock.lock().await;
        let (mut users, mut config) = self.load().await?;

        if client.id.is_empty() {
            client.id = new_opaque_id();
        }
        if users.contains_id(&client.id, None) {
            return Err(Error::DuplicateAccount(client.id));
        }

        config
            .clients_mut()
            .ok_or_else(|| self.missing_clients())?
            .push(inbound_entry(&client));
        users.clients.push(client.clone());
        self.save(&users, &config).await?;

        let number = users.clients.len() - 1;
        info!("Created account #{} ({})", number, client.username);
        Ok((number, client))
    }

    /// Replaces row `number` in both files. An empty id keeps the current one.
    pub async fn update(&self, number: usize, mut client: Client) -> Result<Client> {
        let _guard = self.write_lock.lock().await;
        let (mut users, mut config) = self.load().await?;

        let current = users.get(number)?;
        if client.id.is_empty() {
            client.id = current.id.clone();
        }
        if users.contains_id(&client.id, Some(number)) {
            return Err(Error::DuplicateAccount(client.id));
        }

        config.clients_mut().ok_or_else(|| self.missing_clients())?[number] = inbound_entry(&client);
        users.clients[number] = client.clone();
        self.save(&users, &config).await?;

        info!("Updated account #{} ({})", number, client.username);
        Ok(client)
    }

    /// Removes row `number` from both files once the operator has retyped
    /// its id tail and username. Later rows shift up by one.
    pub async fn delete(&self, number: usize, typed_id_tail: &str, typed_username: &str) -> Result<Client> {
        let _guard = self.write_lock.lock().await;
        let (mut users, mut config) = self.load().await?;

        let check = confirm_delete(users.get(number)?, typed_id_tail, typed_username);
        if check != DeleteCheck::Confirmed {
            return Err(Error::DeleteRejected(check));
        }

        config.clients_mut().ok_or_else(|| self.missing_clients())?.remove(number);
        let removed = users.clients.remove(number);
        self.save(&users, &config).await?;

        info!("Deleted account #{} ({})", number, removed.username);
        Ok(removed)
    }
}
