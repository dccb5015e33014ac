//! Core types for echoip.
//!
//! This crate provides the foundational pieces shared by the cache, the
//! lookup providers and the enrichment pipeline:
//!
//! - **Types**: [`AddressInfo`] and the records providers return
//! - **Keys**: [`AddressKey`], the fixed-width cache key for an address
//! - **Errors**: the [`EchoipError`] taxonomy
//!
//! # Example
//!
//! ```rust,ignore
//! use echoip_core::{AddressInfo, AddressKey};
//!
//! let ip = "203.0.113.7".parse().unwrap();
//! let info = AddressInfo::new(ip);
//! println!("{} -> {:?}", info.ip, AddressKey::of(ip));
//! ```

#![doc(html_root_url = "https://docs.rs/echoip-core/0.1.0")]

mod error;
pub mod key;
pub mod types;

pub use error::{EchoipError, Result};
pub use key::AddressKey;
pub use types::*;
