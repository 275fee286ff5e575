//! # SMS Relay
//!
//! An inbound SMS webhook relay. One webhook endpoint receives messages
//! from the SMS gateway, fans a notification out to a volunteer roster,
//! and acknowledges the sender by name.
//!
//! ## Features
//!
//! - **Inbound webhook**: form-encoded gateway callback, answered with
//!   the gateway's XML envelope
//! - **Broadcast fan-out**: one concurrent send per volunteer, with
//!   per-recipient outcomes and bounded timeouts
//! - **Contact directory**: E.164-normalized lookup with role-based
//!   listings, loaded from configuration
//! - **Operator alerts**: mail-alert log category delivered through an
//!   HTTP mail transport
//! - **Comprehensive configuration**: file layering plus environment
//!   overrides
//! - **Observability**: structured logging and tracing support
//!
//! ## Configuration
//!
//! ```rust,ignore
//! use smsrelay::config::AppConfig;
//!
//! let config = AppConfig::load()?;
//! println!("listening on {}:{}", config.server.host, config.server.port);
//! ```

pub mod config;

pub use config::*;

/// Common imports for smsrelay usage
pub mod prelude {
    pub use crate::config::{
        AppConfig, DirectoryConfig, GatewayConfig, LoggingConfig, MailConfig, NotifierConfig,
        ServerConfig,
    };
    pub use relay_core::*;
    pub use relay_notify::{BroadcastResult, Broadcaster, EventLog, InboundProcessor};
}
