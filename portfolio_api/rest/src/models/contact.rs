use anyhow::{ensure, Context};
use portfolio_models::contact::{ContactMessage, ContactMessageError};
use serde::Deserialize;
use serde_json::Value;

/// Body of a contact form submission. Absent and `null` fields are treated
/// like empty strings.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiContactMessage {
    /// Full name of the sender
    #[serde(default)]
    pub name: Option<String>,
    /// Email address of the sender
    #[serde(default)]
    pub email: Option<String>,
    /// Content of the message
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiContactMessage {
    /// Parse a request body regardless of its content type. The body must be
    /// a JSON object whose fields are strings, `null` or absent.
    pub fn from_json(body: &[u8]) -> anyhow::Result<Self> {
        let value = serde_json::from_slice::<Value>(body).context("Body is not valid JSON")?;
        ensure!(value.is_object(), "Body is not a JSON object: {value}");
        serde_json::from_value(value).context("Body has fields of the wrong type")
    }
}

impl TryFrom<ApiContactMessage> for ContactMessage {
    type Error = ContactMessageError;

    fn try_from(value: ApiContactMessage) -> Result<Self, Self::Error> {
        ContactMessage::new(
            value.name.unwrap_or_default(),
            value.email.unwrap_or_default(),
            value.message.unwrap_or_default(),
        )
    }
}
