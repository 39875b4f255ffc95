use base64::alphabet;
use base64::engine::general_purpose::STANDARD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::identity::{last_four, ConnectionIdentity};
use crate::error::{Error, Result};

pub const VMESS_PREFIX: &str = "vmess://";
pub const LOCKED_PREFIX: &str = "v2box://locked=";

// Shared links are not always padded, and some clients re-encode them URL-safe.
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

// ============================================================================
// Share Profile
// ============================================================================

/// `port` is written as whatever the panel was configured with; clients
/// accept both a JSON number and a numeric string.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum PortValue {
    Number(u16),
    Text(String),
}

impl From<u16> for PortValue {
    fn from(port: u16) -> Self {
        PortValue::Number(port)
    }
}

impl From<&str> for PortValue {
    fn from(port: &str) -> Self {
        PortValue::Text(port.to_string())
    }
}

impl fmt::Display for PortValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortValue::Number(n) => write!(f, "{}", n),
            PortValue::Text(s) => f.write_str(s),
        }
    }
}

/// Everything besides the identity that goes into a link.
#[derive(Clone, Debug, PartialEq)]
pub struct ShareProfile {
    /// Server address written to `add`.
    pub host: String,
    pub port: PortValue,
    /// Leading hostname label of whoever asked for the link.
    pub subdomain: String,
    pub region: String,
    /// Fixed HTTP header host used for the tcp/http disguise.
    pub disguise_host: String,
    /// `scy` value, `none` or `aes-128-gcm`.
    pub cipher: String,
}

// ============================================================================
// VMess Link Record
// ============================================================================

/// The JSON object inside a `vmess://` link. Field order is the wire order.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VmessLink {
    pub add: String,
    pub aid: String,
    #[serde(default)]
    pub alpn: String,
    #[serde(default)]
    pub fp: String,
    #[serde(default)]
    pub host: String,
    #[serde(rename = "deviceID", default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    pub id: String,
    pub net: String,
    #[serde(default)]
    pub path: String,
    pub port: PortValue,
    #[serde(default)]
    pub ps: String,
    #[serde(default)]
    pub scy: String,
    #[serde(default)]
    pub sni: String,
    #[serde(default)]
    pub tls: String,
    #[serde(rename = "type", default)]
    pub header_type: String,
    pub v: String,
}

impl VmessLink {
    pub fn new(identity: &ConnectionIdentity, profile: &ShareProfile) -> Self {
        Self {
            add: profile.host.clone(),
            aid: "1".to_string(),
            alpn: String::new(),
            fp: String::new(),
            host: profile.disguise_host.clone(),
            device_id: None,
            id: identity.id.clone(),
            net: "tcp".to_string(),
            path: "/".to_string(),
            port: profile.port.clone(),
            ps: remark(identity, profile),
            scy: profile.cipher.clone(),
            sni: String::new(),
            tls: String::new(),
            header_type: "http".to_string(),
            v: "2".to_string(),
        }
    }

    fn with_device(mut self, device_id: &str) -> Self {
        self.device_id = Some(device_id.to_string());
        self
    }

    /// `vmess://` + base64 of the compact JSON.
    pub fn to_uri(&self) -> Result<String> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{}{}", VMESS_PREFIX, STANDARD.encode(json)))
    }
}

/// `valid before (<exp>) <subdomain>-<region>-<id tail>`
pub fn remark(identity: &ConnectionIdentity, profile: &ShareProfile) -> String {
    format!(
        "valid before ({}) {}-{}-{}",
        identity.exp_date,
        profile.subdomain,
        profile.region,
        last_four(&identity.id)
    )
}

// ============================================================================
// Encoding
// ============================================================================

/// Plain share link. Inputs are not validated: an empty id still gives a
/// well-formed, useless link.
pub fn encode_unlocked(identity: &ConnectionIdentity, profile: &ShareProfile) -> Result<String> {
    VmessLink::new(identity, profile).to_uri()
}

/// Device-locked link: the vmess link carries `deviceID` and is then wrapped
/// in a second base64 layer behind `v2box://locked=`.
pub fn encode_locked(identity: &ConnectionIdentity, profile: &ShareProfile) -> Result<String> {
    if identity.device_id.is_empty() {
        return Err(Error::MissingDeviceId);
    }
    let inner = VmessLink::new(identity, profile)
        .with_device(&identity.device_id)
        .to_uri()?;
    Ok(format!("{}{}", LOCKED_PREFIX, STANDARD.encode(inner)))
}

// ============================================================================
// Decoding
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct DecodedLink {
    pub locked: bool,
    pub link: VmessLink,
}

/// Reverse of both encoders.
pub fn decode_link(text: &str) -> Result<DecodedLink> {
    let text = text.trim();

    if let Some(envelope) = text.strip_prefix(LOCKED_PREFIX) {
        let inner = String::from_utf8(base64_decode(envelope)?)?;
        if !inner.starts_with(VMESS_PREFIX) {
            return Err(Error::LockedPayload);
        }
        return Ok(DecodedLink {
            locked: true,
            link: decode_vmess(&inner)?,
        });
    }

    if text.starts_with(VMESS_PREFIX) {
        return Ok(DecodedLink {
            locked: false,
            link: decode_vmess(text)?,
        });
    }

    let scheme = text.split("://").next().unwrap_or(text);
    Err(Error::UnsupportedScheme(scheme.to_string()))
}

fn decode_vmess(uri: &str) -> Result<VmessLink> {
    let payload = uri.trim_start_matches(VMESS_PREFIX);
    let json = base64_decode(payload)?;
    Ok(serde_json::from_slice(&json)?)
}

fn base64_decode(input: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    let input = input.trim();
    if input.contains('_') || input.contains('-') {
        URL_SAFE_LENIENT.decode(input)
    } else {
        STANDARD_LENIENT.decode(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> ShareProfile {
        ShareProfile {
            host: "sg1.example.com".to_string(),
            port: PortValue::Number(443),
            subdomain: "sg1".to_string(),
            region: "Singapore".to_string(),
            disguise_host: "www.youtube.com".to_string(),
            cipher: "none".to_string(),
        }
    }

    fn identity(device_id: &str) -> ConnectionIdentity {
        ConnectionIdentity {
            user_number: "0".to_string(),
            username: "mgmg".to_string(),
            id: "abcd1234-ef56-4a1b-9c2d-3e4f5a6b7890".to_string(),
            device_id: device_id.to_string(),
            exp_date: "2025-01-01".to_string(),
        }
    }

    fn payload_json(uri: &str) -> serde_json::Value {
        let payload = uri.strip_prefix(VMESS_PREFIX).unwrap();
        serde_json::from_slice(&STANDARD.decode(payload).unwrap()).unwrap()
    }

    #[test]
    fn unlocked_link_carries_documented_fields() {
        let uri = encode_unlocked(&identity(""), &profile()).unwrap();
        assert!(uri.starts_with("vmess://"));

        let json = payload_json(&uri);
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        let mut expected = vec![
            "add", "aid", "alpn", "fp", "host", "id", "net", "path", "port", "ps", "scy", "sni",
            "tls", "type", "v",
        ];
        expected.sort();
        let mut keys_sorted = keys.clone();
        keys_sorted.sort();
        assert_eq!(keys_sorted, expected);

        assert_eq!(json["add"], "sg1.example.com");
        assert_eq!(json["port"], 443);
        assert_eq!(json["id"], "abcd1234-ef56-4a1b-9c2d-3e4f5a6b7890");
        assert_eq!(json["net"], "tcp");
        assert_eq!(json["type"], "http");
        assert_eq!(json["host"], "www.youtube.com");
        assert!(json["ps"].as_str().unwrap().ends_with("-7890"));
    }

    #[test]
    fn json_text_keeps_wire_key_order() {
        let uri = encode_locked(&identity("dev-42"), &profile()).unwrap();
        let inner = String::from_utf8(
            STANDARD.decode(uri.strip_prefix(LOCKED_PREFIX).unwrap()).unwrap(),
        )
        .unwrap();
        let text = String::from_utf8(
            STANDARD.decode(inner.strip_prefix(VMESS_PREFIX).unwrap()).unwrap(),
        )
        .unwrap();
        let order = [
            "\"add\"", "\"aid\"", "\"alpn\"", "\"fp\"", "\"host\"", "\"deviceID\"", "\"id\"",
            "\"net\"", "\"path\"", "\"port\"", "\"ps\"", "\"scy\"", "\"sni\"", "\"tls\"",
            "\"type\"", "\"v\"",
        ];
        let positions: Vec<usize> = order.iter().map(|k| text.find(k).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", text);
    }

    #[test]
    fn remark_has_exact_shape() {
        let json = payload_json(&encode_unlocked(&identity(""), &profile()).unwrap());
        assert_eq!(json["ps"], "valid before (2025-01-01) sg1-Singapore-7890");
    }

    #[test]
    fn string_port_stays_a_string() {
        let mut p = profile();
        p.port = PortValue::from("8443");
        let json = payload_json(&encode_unlocked(&identity(""), &p).unwrap());
        assert_eq!(json["port"], "8443");
    }

    #[test]
    fn empty_id_still_encodes() {
        let mut who = identity("");
        who.id.clear();
        let json = payload_json(&encode_unlocked(&who, &profile()).unwrap());
        assert_eq!(json["id"], "");
        assert_eq!(json["ps"], "valid before (2025-01-01) sg1-Singapore-");
    }

    #[test]
    fn locked_requires_device_id() {
        let err = encode_locked(&identity(""), &profile()).unwrap_err();
        assert!(matches!(err, Error::MissingDeviceId));
    }

    #[test]
    fn locked_link_wraps_vmess_link_with_full_device_id() {
        let device = "5f0c2a9e-77d1-4b3c-a0e8-0d9c8b7a6f54";
        let uri = encode_locked(&identity(device), &profile()).unwrap();
        assert!(uri.starts_with("v2box://locked="));

        let inner = String::from_utf8(
            STANDARD.decode(uri.strip_prefix(LOCKED_PREFIX).unwrap()).unwrap(),
        )
        .unwrap();
        assert!(inner.starts_with("vmess://"));

        let json = payload_json(&inner);
        assert_eq!(json["deviceID"], device);
        assert_eq!(json["id"], "abcd1234-ef56-4a1b-9c2d-3e4f5a6b7890");
    }

    #[test]
    fn link_record_renders_same_uri_as_encoder() {
        let who = identity("");
        let uri = VmessLink::new(&who, &profile()).to_uri().unwrap();
        assert_eq!(uri, encode_unlocked(&who, &profile()).unwrap());
        assert_eq!(decode_link(&uri).unwrap().link.id, who.id);
    }

    #[test]
    fn unlocked_ignores_device_id() {
        let json = payload_json(&encode_unlocked(&identity("dev-42"), &profile()).unwrap());
        assert!(json.get("deviceID").is_none());
    }

    #[test]
    fn encoding_is_deterministic() {
        let who = identity("dev-42");
        assert_eq!(encode_unlocked(&who, &profile()).unwrap(), encode_unlocked(&who, &profile()).unwrap());
        assert_eq!(
            encode_locked(&who, &profile()).unwrap(),
            encode_locked(&who, &profile()).unwrap()
        );
    }

    #[test]
    fn decode_reverses_both_encoders() {
        let who = identity("dev-42");

        let plain = decode_link(&encode_unlocked(&who, &profile()).unwrap()).unwrap();
        assert!(!plain.locked);
        assert_eq!(plain.link, VmessLink::new(&who, &profile()));

        let locked = decode_link(&encode_locked(&who, &profile()).unwrap()).unwrap();
        assert!(locked.locked);
        assert_eq!(locked.link.device_id.as_deref(), Some("dev-42"));
        assert_eq!(locked.link.ps, plain.link.ps);
    }

    #[test]
    fn decode_accepts_unpadded_and_url_safe_payloads() {
        let uri = encode_unlocked(&identity(""), &profile()).unwrap();
        let payload = uri.strip_prefix(VMESS_PREFIX).unwrap();
        let bytes = STANDARD.decode(payload).unwrap();

        let unpadded = format!("vmess://{}", payload.trim_end_matches('='));
        assert!(decode_link(&unpadded).is_ok());

        let url_safe = format!(
            "vmess://{}",
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&bytes)
        );
        assert_eq!(decode_link(&url_safe).unwrap().link.id, "abcd1234-ef56-4a1b-9c2d-3e4f5a6b7890");
    }

    #[test]
    fn decode_rejects_other_schemes_and_bad_envelopes() {
        assert!(matches!(
            decode_link("vless://abc@host:443"),
            Err(Error::UnsupportedScheme(s)) if s == "vless"
        ));

        let bogus = format!("{}{}", LOCKED_PREFIX, STANDARD.encode("trojan://x"));
        assert!(matches!(decode_link(&bogus), Err(Error::LockedPayload)));

        assert!(matches!(decode_link("vmess://!!!"), Err(Error::Base64(_))));
    }
}
