//! Framework-agnostic notification flow: validate the inbound webhook
//! payload, fan the alert out to volunteers, and render the gateway's
//! acknowledgement envelope.

mod alert;
mod broadcast;

pub use alert::{Category, EventLog};
pub use broadcast::{
    BroadcastResult, Broadcaster, DeliveryStatus, SendOutcome, DEFAULT_SEND_TIMEOUT,
};

use std::sync::Arc;

use relay_core::{Directory, HttpStatus, InboundGateway, InboundSms, WebhookResponse};
use tracing::info;

/// Greeting used when the sender is unknown or has no display name.
pub const FALLBACK_NAME: &str = "Amigo";

/// Render the XML acknowledgement envelope the gateway expects back
/// from the webhook.
pub fn acknowledgement(name: &str) -> String {
    let text = format!("{}, we will contact you as soon as possible!", name);
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Response><Message>{}</Message></Response>",
        escape_xml(&text)
    )
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Handles one inbound webhook invocation end to end.
///
/// The collaborators are injected rather than resolved from anywhere
/// global: the gateway parser, the contact directory, the broadcaster,
/// and the event log.
#[derive(Clone)]
pub struct InboundProcessor {
    gateway: Arc<dyn InboundGateway>,
    directory: Directory,
    broadcaster: Broadcaster,
    log: EventLog,
}

impl InboundProcessor {
    pub fn new(
        gateway: Arc<dyn InboundGateway>,
        directory: Directory,
        broadcaster: Broadcaster,
        log: EventLog,
    ) -> Self {
        Self {
            gateway,
            directory,
            broadcaster,
            log,
        }
    }

    /// Process a raw webhook payload into the response for the gateway.
    ///
    /// A payload that fails validation is rejected before any side
    /// effect, with an error body rather than the acknowledgement
    /// envelope.
    pub async fn process_form(&self, body: &[u8]) -> WebhookResponse {
        let event = match self.gateway.parse_inbound(body) {
            Ok(event) => event,
            Err(e) => {
                return WebhookResponse::error(
                    HttpStatus::BadRequest,
                    &format!("malformed request: {}", e),
                );
            }
        };
        WebhookResponse::xml(self.handle_inbound(event).await)
    }

    /// Log the event, run the fan-out, and render the acknowledgement.
    ///
    /// Broadcast failures are contained here: they are logged, escalated
    /// through the event log, and never change the acknowledgement.
    pub async fn handle_inbound(&self, event: InboundSms) -> String {
        self.log.record(
            &format!("inbound sms from {}", event.from),
            Category::Call,
        );

        let result = self.broadcaster.broadcast(&event.from, &event.body).await;
        info!(
            sent = result.sent(),
            failed = result.failed(),
            "broadcast finished"
        );
        if result.failed() > 0 {
            self.log.record(
                &format!(
                    "{} of {} volunteer notifications failed for inbound sms from {}",
                    result.failed(),
                    result.outcomes.len(),
                    event.from
                ),
                Category::MailAlert,
            );
        } else {
            self.log.record(
                &format!("notified {} volunteers", result.sent()),
                Category::Activity,
            );
        }

        // An empty display name falls back to the generic greeting, same
        // as an unknown sender.
        let name = self
            .directory
            .lookup(event.from.as_str())
            .map(|contact| contact.display_name.trim())
            .filter(|name| !name.is_empty())
            .unwrap_or(FALLBACK_NAME);

        acknowledgement(name)
    }
}
