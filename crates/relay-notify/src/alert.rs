//! Categorized event log with optional mail escalation.

use std::sync::Arc;

use relay_core::{MailRequest, Mailer};
use tracing::{error, info};

/// Category attached to every event log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// General service activity.
    Activity,
    /// Inbound call and message events.
    Call,
    /// Operator-facing alerts, additionally delivered by mail when a
    /// mailer is configured.
    MailAlert,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Activity => "activity",
            Category::Call => "call",
            Category::MailAlert => "mail-alert",
        }
    }
}

/// Logging sink for the notification flow.
///
/// Every record reaches the tracing subscriber. Mail-alert records are
/// also mailed to the operator list on a detached task; mail failures
/// are logged there and never reach the request path. Without a mailer
/// the alert degrades to a plain log record.
#[derive(Clone, Default)]
pub struct EventLog {
    mailer: Option<Arc<dyn Mailer>>,
    operators: Arc<Vec<String>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mailer(mailer: Arc<dyn Mailer>, operators: Vec<String>) -> Self {
        Self {
            mailer: Some(mailer),
            operators: Arc::new(operators),
        }
    }

    pub fn record(&self, message: &str, category: Category) {
        info!(category = category.as_str(), "{}", message);
        if category == Category::MailAlert {
            self.dispatch_mail(message);
        }
    }

    fn dispatch_mail(&self, message: &str) {
        let mailer = match &self.mailer {
            Some(mailer) => Arc::clone(mailer),
            None => return,
        };
        if self.operators.is_empty() {
            return;
        }

        let operators = Arc::clone(&self.operators);
        let body = message.to_string();
        tokio::spawn(async move {
            let mail = MailRequest {
                to: &operators,
                subject: "smsrelay alert",
                body: &body,
            };
            if let Err(e) = mailer.send(mail).await {
                error!(error = %e, "operator alert mail failed");
            }
        });
    }
}
