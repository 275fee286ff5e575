use async_trait::async_trait;
use relay_core::{
    InboundGateway, InboundSms, PhoneNumber, SendRequest, SendResponse, SmsClient, SmsError,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

const GATEWAY: &str = "twilio";

/// Twilio REST client.
#[derive(Clone, Debug)]
pub struct TwilioClient {
    /// Account SID (username for Basic auth).
    pub account_sid: String,
    /// Auth Token (password for Basic auth).
    pub auth_token: String,
    /// API base URL; override for testing/mocking.
    pub base_url: String,
    http: reqwest::Client,
}

impl TwilioClient {
    pub fn new<S: Into<String>>(account_sid: S, auth_token: S) -> Self {
        Self::with_base_url(account_sid, auth_token, "https://api.twilio.com".to_string())
    }

    pub fn with_base_url<S: Into<String>>(account_sid: S, auth_token: S, base_url: String) -> Self {
        Self {
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            base_url,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SmsClient for TwilioClient {
    async fn send(&self, req: SendRequest<'_>) -> Result<SendResponse, SmsError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url.trim_end_matches('/'),
            self.account_sid
        );
        let params = [("To", req.to), ("From", req.from), ("Body", req.text)];
        let res = self
            .http
            .post(url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| SmsError::Http(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(SmsError::Gateway(format!("HTTP {}: {}", status, body)));
        }

        let raw_text = res
            .text()
            .await
            .map_err(|e| SmsError::Http(e.to_string()))?;
        let raw_json: serde_json::Value = serde_json::from_str(&raw_text)
            .unwrap_or_else(|_| serde_json::json!({ "raw": raw_text }));

        let id = raw_json
            .get("sid")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(relay_core::fallback_id);
        debug!(id = %id, to = req.to, "message accepted by gateway");

        Ok(SendResponse {
            id,
            gateway: GATEWAY,
            raw: raw_json,
        })
    }
}

/// Fields Twilio posts to the SMS webhook (`application/x-www-form-urlencoded`).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TwilioInbound {
    #[serde(rename = "From")]
    pub from: String,
    #[serde(rename = "To")]
    pub to: Option<String>,
    #[serde(rename = "Body")]
    pub body: String,
    #[serde(rename = "MessageSid")]
    pub message_sid: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl TryFrom<TwilioInbound> for InboundSms {
    type Error = SmsError;

    fn try_from(inbound: TwilioInbound) -> Result<Self, SmsError> {
        let from = PhoneNumber::parse(&inbound.from)
            .map_err(|e| SmsError::Invalid(format!("From: {}", e)))?;
        if inbound.body.trim().is_empty() {
            return Err(SmsError::Invalid("Body is empty".into()));
        }
        let raw = serde_json::to_value(&inbound).unwrap_or_default();
        Ok(InboundSms {
            from,
            body: inbound.body,
            received_at: time::OffsetDateTime::now_utc(),
            raw,
        })
    }
}

impl InboundGateway for TwilioClient {
    fn gateway(&self) -> &'static str {
        GATEWAY
    }

    fn parse_inbound(&self, body: &[u8]) -> Result<InboundSms, SmsError> {
        let inbound: TwilioInbound = serde_urlencoded::from_bytes(body)
            .map_err(|e| SmsError::Invalid(format!("form decode: {}", e)))?;
        inbound.try_into()
    }
}
