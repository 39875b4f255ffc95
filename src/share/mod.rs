// 分享链接模块
// Share Link Module

pub mod caption;
pub mod id;
pub mod identity;
pub mod link;

pub use caption::QrCaption;
pub use id::new_opaque_id;
pub use identity::{last_four, subdomain_label, ConnectionIdentity};
pub use link::{
    decode_link, encode_locked, encode_unlocked, DecodedLink, PortValue, ShareProfile, VmessLink,
};
