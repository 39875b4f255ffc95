//! VMess share-link generation for a small V2Ray user panel.
//!
//! `share` builds and reads the links, `users` reads the panel's user file,
//! `accounts` writes it together with the v2ray server config, and `app`
//! serves all of it over HTTP.

pub mod accounts;
pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod share;
pub mod users;

pub use error::{Error, Result};
