//! # Relay Core
//!
//! Core traits and types for the smsrelay notification service.
//!
//! This crate provides the building blocks the rest of the workspace is
//! assembled from:
//! - [`SmsClient`] trait for sending SMS messages through the gateway
//! - [`InboundGateway`] trait for parsing inbound webhook payloads
//! - [`Mailer`] trait for the operator alert mail transport
//! - [`Directory`] of known contacts with E.164 normalization
//! - Common types for requests, responses, and errors
//!
//! ## Example
//!
//! ```rust,ignore
//! use relay_core::{SendRequest, SmsClient};
//!
//! // The configured gateway implements SmsClient
//! let response = client.send(SendRequest {
//!     to: "+1234567890",
//!     from: "+0987654321",
//!     text: "Hello world!"
//! }).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

pub mod directory;

pub use directory::{Contact, Directory, PhoneError, PhoneNumber, Role};

/// Errors that can occur during SMS operations
#[derive(Debug, thiserror::Error)]
pub enum SmsError {
    /// HTTP communication error
    #[error("http error: {0}")]
    Http(String),
    /// Authentication/authorization error
    #[error("authentication error: {0}")]
    Auth(String),
    /// Invalid request parameters
    #[error("invalid request: {0}")]
    Invalid(String),
    /// SMS gateway returned an error
    #[error("gateway error: {0}")]
    Gateway(String),
    /// The send did not complete within the allowed time
    #[error("send timed out after {0}s")]
    Timeout(u64),
}

/// Errors from the mail transport used for operator alerts
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("http error: {0}")]
    Http(String),
    #[error("mail gateway error: {0}")]
    Gateway(String),
}

/// HTTP status code for web responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatus {
    Ok = 200,
    BadRequest = 400,
    InternalServerError = 500,
}

impl HttpStatus {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendRequest<'a> {
    pub to: &'a str,
    pub from: &'a str,
    pub text: &'a str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendResponse {
    pub id: String,
    /// Name of the gateway that accepted the message, e.g. "twilio".
    pub gateway: &'static str,
    /// Raw gateway payload for debugging / audit.
    pub raw: serde_json::Value,
}

/// Normalized inbound message event, one per webhook invocation.
///
/// Not persisted anywhere; it exists for the duration of the request and
/// is otherwise only logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundSms {
    pub from: PhoneNumber,
    pub body: String,
    pub received_at: OffsetDateTime,
    pub raw: serde_json::Value,
}

/// Mail to the operator address list.
#[derive(Debug, Clone, Serialize)]
pub struct MailRequest<'a> {
    pub to: &'a [String],
    pub subject: &'a str,
    pub body: &'a str,
}

/// Generic webhook response that can be converted to any framework's response type
#[derive(Debug, Clone)]
pub struct WebhookResponse {
    pub status: HttpStatus,
    pub body: String,
    pub content_type: String,
}

impl WebhookResponse {
    /// Acknowledgement envelope in the format the gateway expects.
    pub fn xml(body: String) -> Self {
        Self {
            status: HttpStatus::Ok,
            body,
            content_type: "text/xml".to_string(),
        }
    }

    pub fn error(status: HttpStatus, message: &str) -> Self {
        Self {
            status,
            body: format!(r#"{{"error": "{}"}}"#, message.replace('"', r#"\""#)),
            content_type: "application/json".to_string(),
        }
    }
}

#[async_trait]
pub trait SmsClient: Send + Sync {
    /// Send a single text SMS.
    async fn send(&self, req: SendRequest<'_>) -> Result<SendResponse, SmsError>;
}

/// Gateway-side parsing of inbound webhook payloads.
pub trait InboundGateway: Send + Sync {
    /// Stable gateway key, e.g. "twilio".
    fn gateway(&self) -> &'static str;
    /// Parse the raw HTTP payload into a normalized [`InboundSms`].
    fn parse_inbound(&self, body: &[u8]) -> Result<InboundSms, SmsError>;
}

/// Outbound mail transport for operator alerts.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: MailRequest<'_>) -> Result<(), MailError>;
}

/// Utility to create a pseudo id if the gateway doesn't return one.
pub fn fallback_id() -> String {
    Uuid::new_v4().to_string()
}
