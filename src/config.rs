use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{Error, Result};
use crate::share::{subdomain_label, PortValue, ShareProfile};

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

const SUPPORTED_CIPHERS: [&str; 5] = ["none", "aes-128-gcm", "chacha20-poly1305", "auto", "zero"];

fn default_listen_port() -> u16 {
    8888
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_v2ray_port() -> PortValue {
    PortValue::Number(443)
}

fn default_user_file() -> PathBuf {
    PathBuf::from("test/user_data.json")
}

fn default_v2ray_config() -> PathBuf {
    PathBuf::from("test/server.json")
}

fn default_region() -> String {
    "Singapore".to_string()
}

fn default_disguise_host() -> String {
    "www.youtube.com".to_string()
}

fn default_cipher() -> String {
    "none".to_string()
}

/// Contents of `config.yaml`. Every field is optional in the file.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Port of the share API.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    /// Public address of the v2ray server, written into every link.
    #[serde(default = "default_server_host")]
    pub server_host: String,
    #[serde(default = "default_v2ray_port")]
    pub v2ray_port: PortValue,
    #[serde(default = "default_user_file")]
    pub user_file: PathBuf,
    /// v2ray server config whose `inbounds[0].settings.clients` mirrors the
    /// user file row for row.
    #[serde(default = "default_v2ray_config")]
    pub v2ray_config: PathBuf,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_disguise_host")]
    pub disguise_host: String,
    #[serde(default = "default_cipher")]
    pub cipher: String,
    /// Fixed remark label; when unset it comes from the requesting host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdomain: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen_port: default_listen_port(),
            server_host: default_server_host(),
            v2ray_port: default_v2ray_port(),
            user_file: default_user_file(),
            v2ray_config: default_v2ray_config(),
            region: default_region(),
            disguise_host: default_disguise_host(),
            cipher: default_cipher(),
            subdomain: None,
        }
    }
}

impl Settings {
    /// Reads `path`; a missing file means defaults.
    pub async fn load(path: &Path) -> Result<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => {
                info!("Reading configuration from {}", path.display());
                Self::from_yaml(&text)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No {} found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(Error::Config(format!("failed to read {}: {}", path.display(), e))),
        }
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Settings =
            serde_yaml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.server_host.trim().is_empty() {
            return Err(Error::Config("server_host must not be empty".to_string()));
        }
        if !SUPPORTED_CIPHERS.contains(&self.cipher.as_str()) {
            return Err(Error::Config(format!("unsupported cipher: {}", self.cipher)));
        }
        Ok(())
    }

    /// Remark label: the configured override, else the first label of the
    /// requesting host, else the first label of `server_host`.
    pub fn subdomain_for(&self, request_host: Option<&str>) -> String {
        if let Some(fixed) = self.subdomain.as_deref().filter(|s| !s.trim().is_empty()) {
            return fixed.trim().to_string();
        }
        let host = request_host
            .filter(|h| !h.trim().is_empty())
            .unwrap_or(&self.server_host);
        subdomain_label(host)
    }

    pub fn profile(&self, request_host: Option<&str>) -> ShareProfile {
        ShareProfile {
            host: self.server_host.clone(),
            port: self.v2ray_port.clone(),
            subdomain: self.subdomain_for(request_host),
            region: self.region.clone(),
            disguise_host: self.disguise_host.clone(),
            cipher: self.cipher.clone(),
        }
    }
}
