//! # shelfcast common library
//!
//! Shared code for the shelfcast podcast feed service:
//! - Error type and result alias
//! - Configuration loading and priority resolution

pub mod config;
pub mod error;

pub use config::FeedConfig;
pub use error::{Error, Result};
