use async_trait::async_trait;
use relay_core::{MailError, MailRequest, Mailer};
use tracing::debug;

/// Mailgun REST client used for operator alert mail.
#[derive(Clone, Debug)]
pub struct MailgunClient {
    /// Private API key (password for Basic auth, username "api").
    pub api_key: String,
    /// Sending domain registered with Mailgun.
    pub domain: String,
    /// Sender address, e.g. "alerts@relay.example.org".
    pub sender: String,
    /// API base URL; override for testing/mocking.
    pub base_url: String,
    http: reqwest::Client,
}

impl MailgunClient {
    pub fn new<S: Into<String>>(api_key: S, domain: S, sender: S) -> Self {
        Self::with_base_url(api_key, domain, sender, "https://api.mailgun.net".to_string())
    }

    pub fn with_base_url<S: Into<String>>(
        api_key: S,
        domain: S,
        sender: S,
        base_url: String,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            domain: domain.into(),
            sender: sender.into(),
            base_url,
            http: reqwest::Client::new(),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/v3/{}/messages",
            self.base_url.trim_end_matches('/'),
            self.domain
        )
    }
}

#[async_trait]
impl Mailer for MailgunClient {
    async fn send(&self, mail: MailRequest<'_>) -> Result<(), MailError> {
        let mut params: Vec<(&str, &str)> = vec![
            ("from", self.sender.as_str()),
            ("subject", mail.subject),
            ("text", mail.body),
        ];
        for to in mail.to {
            params.push(("to", to.as_str()));
        }

        let res = self
            .http
            .post(self.messages_url())
            .basic_auth("api", Some(&self.api_key))
            .form(&params)
            .send()
            .await
            .map_err(|e| MailError::Http(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(MailError::Gateway(format!("HTTP {}: {}", status, body)));
        }

        debug!(recipients = mail.to.len(), "alert mail accepted");
        Ok(())
    }
}
