//! Fan-out of one inbound alert to every volunteer in the directory.

use std::sync::Arc;
use std::time::Duration;

use futures::future;
use relay_core::{Directory, PhoneNumber, Role, SendRequest, SmsClient, SmsError};
use tracing::{debug, warn};

/// Default per-recipient send timeout.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of one volunteer notification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    Sent { id: String },
    Failed { reason: String },
}

#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub recipient: PhoneNumber,
    pub status: DeliveryStatus,
}

/// Per-recipient outcomes of one fan-out, in volunteer order.
#[derive(Debug, Clone, Default)]
pub struct BroadcastResult {
    pub outcomes: Vec<SendOutcome>,
}

impl BroadcastResult {
    pub fn sent(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, DeliveryStatus::Sent { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.sent()
    }
}

/// Sends a notification to every volunteer when an inbound message
/// arrives.
///
/// Sends are independent: they run concurrently, each under its own
/// timeout, and a failure on one recipient never blocks the rest. There
/// are no retries; failures are logged and reported in the result for
/// the caller to surface.
#[derive(Clone)]
pub struct Broadcaster {
    client: Arc<dyn SmsClient>,
    directory: Directory,
    from_number: PhoneNumber,
    send_timeout: Duration,
}

impl Broadcaster {
    pub fn new(client: Arc<dyn SmsClient>, directory: Directory, from_number: PhoneNumber) -> Self {
        Self {
            client,
            directory,
            from_number,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// One send per contact with the volunteer role. All outcomes are
    /// collected before returning, in the directory's listing order.
    pub async fn broadcast(&self, from: &PhoneNumber, body: &str) -> BroadcastResult {
        let sends = self.directory.list_by_role(Role::Volunteer).map(|contact| {
            let text = format!("Hey {}, {} said: {}", contact.display_name, from, body);
            async move {
                let req = SendRequest {
                    to: contact.phone.as_str(),
                    from: self.from_number.as_str(),
                    text: &text,
                };
                let status = match tokio::time::timeout(self.send_timeout, self.client.send(req))
                    .await
                {
                    Ok(Ok(resp)) => {
                        debug!(recipient = %contact.phone, id = %resp.id, "volunteer notified");
                        DeliveryStatus::Sent { id: resp.id }
                    }
                    Ok(Err(e)) => {
                        warn!(recipient = %contact.phone, error = %e, "volunteer notification failed");
                        DeliveryStatus::Failed {
                            reason: e.to_string(),
                        }
                    }
                    Err(_) => {
                        let e = SmsError::Timeout(self.send_timeout.as_secs());
                        warn!(recipient = %contact.phone, error = %e, "volunteer notification failed");
                        DeliveryStatus::Failed {
                            reason: e.to_string(),
                        }
                    }
                };
                SendOutcome {
                    recipient: contact.phone.clone(),
                    status,
                }
            }
        });

        BroadcastResult {
            outcomes: future::join_all(sends).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use relay_core::{Contact, SendResponse};
    use std::sync::Mutex;

    fn phone(raw: &str) -> PhoneNumber {
        PhoneNumber::parse(raw).unwrap()
    }

    /// Records every send; fails recipients listed in `fail_to`.
    struct RecordingClient {
        sent: Mutex<Vec<(String, String, String)>>,
        fail_to: Vec<String>,
        delay: Option<Duration>,
    }

    impl RecordingClient {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_to: Vec::new(),
                delay: None,
            }
        }

        fn failing(fail_to: &[&str]) -> Self {
            Self {
                fail_to: fail_to.iter().map(|s| s.to_string()).collect(),
                ..Self::new()
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::new()
            }
        }

        fn sends(&self) -> Vec<(String, String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SmsClient for RecordingClient {
        async fn send(&self, req: SendRequest<'_>) -> Result<SendResponse, SmsError> {
            self.sent
                .lock()
                .unwrap()
                .push((req.to.to_string(), req.from.to_string(), req.text.to_string()));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_to.iter().any(|t| t == req.to) {
                return Err(SmsError::Gateway("HTTP 500: boom".into()));
            }
            Ok(SendResponse {
                id: format!("SM-{}", req.to),
                gateway: "test",
                raw: serde_json::json!({}),
            })
        }
    }

    fn directory() -> Directory {
        Directory::from_contacts(vec![
            Contact::new(phone("+15550000001"), "Ana", vec![Role::Volunteer]),
            Contact::new(phone("+15550000002"), "Bea", vec![Role::Sender]),
            Contact::new(phone("+15550000003"), "Cruz", vec![Role::Volunteer]),
        ])
    }

    fn broadcaster(client: Arc<RecordingClient>) -> Broadcaster {
        Broadcaster::new(client, directory(), phone("+15559990000"))
    }

    #[tokio::test]
    async fn one_send_per_volunteer_with_exact_text() {
        let client = Arc::new(RecordingClient::new());
        let result = broadcaster(client.clone())
            .broadcast(&phone("+447551524625"), "the office is flooding")
            .await;

        assert_eq!(result.sent(), 2);
        assert_eq!(result.failed(), 0);

        let mut sends = client.sends();
        sends.sort();
        assert_eq!(
            sends,
            vec![
                (
                    "+15550000001".to_string(),
                    "+15559990000".to_string(),
                    "Hey Ana, +447551524625 said: the office is flooding".to_string(),
                ),
                (
                    "+15550000003".to_string(),
                    "+15559990000".to_string(),
                    "Hey Cruz, +447551524625 said: the office is flooding".to_string(),
                ),
            ]
        );
    }

    #[tokio::test]
    async fn failure_does_not_block_remaining_sends() {
        let client = Arc::new(RecordingClient::failing(&["+15550000001"]));
        let result = broadcaster(client.clone())
            .broadcast(&phone("+447551524625"), "help")
            .await;

        // both attempts were made
        assert_eq!(client.sends().len(), 2);
        assert_eq!(result.sent(), 1);
        assert_eq!(result.failed(), 1);

        assert!(matches!(
            result.outcomes[0].status,
            DeliveryStatus::Failed { .. }
        ));
        assert!(matches!(
            result.outcomes[1].status,
            DeliveryStatus::Sent { .. }
        ));
    }

    #[tokio::test]
    async fn outcomes_follow_volunteer_order() {
        let client = Arc::new(RecordingClient::new());
        let result = broadcaster(client)
            .broadcast(&phone("+447551524625"), "hi")
            .await;

        let recipients: Vec<&str> = result
            .outcomes
            .iter()
            .map(|o| o.recipient.as_str())
            .collect();
        assert_eq!(recipients, vec!["+15550000001", "+15550000003"]);
    }

    #[tokio::test]
    async fn slow_send_times_out_as_failed() {
        let client = Arc::new(RecordingClient::slow(Duration::from_millis(200)));
        let result = broadcaster(client)
            .with_send_timeout(Duration::from_millis(20))
            .broadcast(&phone("+447551524625"), "hi")
            .await;

        assert_eq!(result.sent(), 0);
        assert_eq!(result.failed(), 2);
        for outcome in &result.outcomes {
            match &outcome.status {
                DeliveryStatus::Failed { reason } => assert!(reason.contains("timed out")),
                other => panic!("expected timeout failure, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn empty_roster_broadcasts_nothing() {
        let client = Arc::new(RecordingClient::new());
        let broadcaster = Broadcaster::new(client.clone(), Directory::new(), phone("+15559990000"));
        let result = broadcaster.broadcast(&phone("+447551524625"), "hi").await;

        assert!(result.outcomes.is_empty());
        assert!(client.sends().is_empty());
    }
}
