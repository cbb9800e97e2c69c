use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing, Json, Router,
};
use portfolio_core_contact_contracts::{ContactFeatureService, ContactSendMessageError};
use portfolio_models::contact::{ContactMessage, ContactMessageError};
use crate::{
    errors::error,
    models::{contact::ApiContactMessage, ApiMessage},
};

pub const MISSING_FIELDS: &str = "Name, email, and message are required";
pub const INVALID_EMAIL: &str = "Invalid email format";
pub const UNAVAILABLE: &str =
    "Contact form is temporarily unavailable. Please try again later or reach out via email.";
pub const SEND_FAILED: &str = "Failed to send message. Please try again later.";
pub const SENT: &str = "Email sent successfully";

pub fn router(service: Arc<impl ContactFeatureService>) -> Router<()> {
    Router::new()
        .route("/api/contact", routing::post(send_message))
        .with_state(service)
}

async fn send_message(
    service: State<Arc<impl ContactFeatureService>>,
    body: Bytes,
) -> Response {
    let payload = match ApiContactMessage::from_json(&body) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::error!("Failed to parse contact form body: {err:#}");
            return error(StatusCode::INTERNAL_SERVER_ERROR, SEND_FAILED);
        }
    };

    let message = match ContactMessage::try_from(payload) {
        Ok(message) => message,
        Err(ContactMessageError::MissingFields) => {
            return error(StatusCode::BAD_REQUEST, MISSING_FIELDS)
        }
        Err(ContactMessageError::InvalidEmail) => {
            return error(StatusCode::BAD_REQUEST, INVALID_EMAIL)
        }
    };

    match service.send_message(message).await {
        Ok(()) => (StatusCode::OK, Json(ApiMessage { message: SENT })).into_response(),
        Err(ContactSendMessageError::Unavailable) => {
            error(StatusCode::SERVICE_UNAVAILABLE, UNAVAILABLE)
        }
        Err(ContactSendMessageError::Other(err)) => {
            tracing::error!("Error sending email: {err:#}");
            error(StatusCode::INTERNAL_SERVER_ERROR, SEND_FAILED)
        }
    }
}
