use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use axum::error_handling::HandleErrorLayer;
use axum::http::StatusCode;
use relay_core::PhoneNumber;
use relay_mailgun::MailgunClient;
use relay_notify::{Broadcaster, EventLog, InboundProcessor};
use relay_twilio::TwilioClient;
use relay_web_axum::{router, AppState};
use smsrelay::config::{AppConfig, LoggingConfig};
use tower::{BoxError, ServiceBuilder};
use tower::timeout::TimeoutLayer;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.logging);

    let directory = config
        .directory
        .build()
        .context("invalid contact directory")?;
    info!(contacts = directory.len(), "directory loaded");

    // A missing gateway is fatal here: the webhook route is never served
    // without a working transport behind it.
    let twilio = match &config.gateway.twilio {
        Some(twilio) => twilio,
        None => bail!("no SMS gateway configured; set gateway.twilio"),
    };
    let from_number = PhoneNumber::parse(&twilio.from_number)
        .context("invalid gateway.twilio.from_number")?;
    let gateway = Arc::new(TwilioClient::new(
        twilio.account_sid.clone(),
        twilio.auth_token.clone(),
    ));

    let log = match &config.mail {
        Some(mail) => EventLog::with_mailer(
            Arc::new(MailgunClient::new(
                mail.api_key.clone(),
                mail.domain.clone(),
                mail.sender.clone(),
            )),
            mail.operators.clone(),
        ),
        None => EventLog::new(),
    };

    let broadcaster = Broadcaster::new(gateway.clone(), directory.clone(), from_number)
        .with_send_timeout(Duration::from_secs(config.notifier.send_timeout_seconds));
    let processor = InboundProcessor::new(gateway, directory, broadcaster, log);

    let app = router(AppState { processor }).layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(|_: BoxError| async {
                StatusCode::REQUEST_TIMEOUT
            }))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.server.timeout_seconds,
            ))),
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, "serving SMS webhook");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

fn init_tracing(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.format.as_str() {
        "pretty" => builder.pretty().init(),
        _ => builder.json().init(),
    }
}
