use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::post,
    Router,
};
use bytes::Bytes;
use relay_core::WebhookResponse;
use relay_notify::InboundProcessor;

#[derive(Clone)]
pub struct AppState {
    pub processor: InboundProcessor,
}

/// Convert the framework-agnostic response into an axum response.
pub fn into_axum_response(response: WebhookResponse) -> axum::response::Response {
    let status = StatusCode::from_u16(response.status.as_u16())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, response.content_type)],
        response.body,
    )
        .into_response()
}

/// Webhook handler: POST /webhooks/sms
pub async fn inbound_sms(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let response = state.processor.process_form(&body).await;
    into_axum_response(response)
}

/// Router serving the gateway webhook.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhooks/sms", post(inbound_sms))
        .with_state(state)
}
