use serde::Serialize;
use utoipa::ToSchema;

use super::identity::ConnectionIdentity;

/// Text drawn above and below a rendered QR code.
#[derive(ToSchema, Serialize, Clone, Debug, PartialEq)]
pub struct QrCaption {
    #[schema(example = "mgmg 6f54")]
    pub title: String,
    #[schema(example = "sg1 - 7890")]
    pub remarks: String,
}

impl QrCaption {
    pub fn new(identity: &ConnectionIdentity, subdomain: &str, locked: bool) -> Self {
        let title = if locked {
            format!("{} {}", identity.username, identity.device_tail())
        } else {
            identity.username.clone()
        };
        Self {
            title,
            remarks: format!("{} - {}", subdomain, identity.id_tail()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> ConnectionIdentity {
        ConnectionIdentity {
            username: "mgmg".to_string(),
            id: "abcd1234-ef56-4a1b-9c2d-3e4f5a6b7890".to_string(),
            device_id: "5f0c2a9e-77d1-4b3c-a0e8-0d9c8b7a6f54".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn unlocked_caption_shows_username_only() {
        let caption = QrCaption::new(&identity(), "sg1", false);
        assert_eq!(caption.title, "mgmg");
        assert_eq!(caption.remarks, "sg1 - 7890");
    }

    #[test]
    fn locked_caption_adds_device_tail() {
        let caption = QrCaption::new(&identity(), "sg1", true);
        assert_eq!(caption.title, "mgmg 6f54");
        assert_eq!(caption.remarks, "sg1 - 7890");
    }
}
