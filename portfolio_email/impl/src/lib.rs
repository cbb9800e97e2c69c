use std::sync::Arc;

use anyhow::{anyhow, Context};
use portfolio_email_contracts::{Email, EmailCredentialsError, EmailSendError, EmailService};
use portfolio_models::{email_address::EmailAddressWithName, Sensitive};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::http::HttpClient;

mod http;

pub const SENDGRID_ENDPOINT: &str = "https://api.sendgrid.com";

/// Every SendGrid API key starts with this prefix.
pub const SENDGRID_API_KEY_PREFIX: &str = "SG.";

const MAIL_SEND_PATH: &str = "v3/mail/send";
const SCOPES_PATH: &str = "v3/scopes";

/// [`EmailService`] backed by the SendGrid v3 API.
#[derive(Debug, Clone)]
pub struct EmailServiceImpl {
    from: EmailAddressWithName,
    api_key: Option<Sensitive<Arc<str>>>,
    mail_send_url: Arc<Url>,
    scopes_url: Arc<Url>,
    client: HttpClient,
}

impl EmailServiceImpl {
    /// Create the client. A missing or malformed `api_key` is accepted here
    /// and reported by [`EmailService::check_credentials`].
    pub fn new(
        from: EmailAddressWithName,
        api_key: Option<Sensitive<String>>,
        endpoint_override: Option<Url>,
    ) -> anyhow::Result<Self> {
        let endpoint = match endpoint_override {
            Some(endpoint) => endpoint,
            None => SENDGRID_ENDPOINT.parse()?,
        };
        let url = |path: &str| {
            endpoint
                .join(path)
                .map(Arc::new)
                .with_context(|| format!("Invalid SendGrid endpoint {endpoint}"))
        };

        Ok(Self {
            from,
            api_key: api_key.map(|key| Sensitive(key.0.into())),
            mail_send_url: url(MAIL_SEND_PATH)?,
            scopes_url: url(SCOPES_PATH)?,
            client: HttpClient::new()?,
        })
    }

    fn api_key(&self) -> Result<&str, EmailCredentialsError> {
        match self.api_key.as_deref().map(|key| &**key) {
            None | Some("") => Err(EmailCredentialsError::Missing),
            Some(key) if !key.starts_with(SENDGRID_API_KEY_PREFIX) => {
                Err(EmailCredentialsError::Malformed)
            }
            Some(key) => Ok(key),
        }
    }
}

impl EmailService for EmailServiceImpl {
    fn check_credentials(&self) -> Result<(), EmailCredentialsError> {
        self.api_key().map(|_| ())
    }

    async fn send(&self, email: Email) -> Result<(), EmailSendError> {
        let api_key = self.api_key()?;

        let request = MailSendRequest {
            personalizations: [Personalization {
                to: [(&email.recipient).into()],
            }],
            from: (&self.from).into(),
            reply_to: email.reply_to.as_deref().map(|email| SendgridAddress {
                email,
                name: None,
            }),
            subject: &email.subject,
            content: [
                Content {
                    content_type: "text/plain",
                    value: &email.text_body,
                },
                Content {
                    content_type: "text/html",
                    value: &email.html_body,
                },
            ],
        };

        let response = self
            .client
            .post((*self.mail_send_url).clone())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| EmailSendError::Transport(err.into()))?;

        let status = response.status();
        if status.is_success() {
            debug!(%status, "email accepted by sendgrid");
            return Ok(());
        }

        let body = response
            .text()
            .await
            .map_err(|err| EmailSendError::Transport(err.into()))?;

        Err(classify_error(status, &body))
    }

    async fn ping(&self) -> anyhow::Result<()> {
        let api_key = self.api_key()?;

        self.client
            .get((*self.scopes_url).clone())
            .bearer_auth(api_key)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

/// Classify a non-success response of the SendGrid API.
///
/// SendGrid describes failures as `{"errors": [{"message": "..."}, ...]}`.
/// If the first message mentions an `API key`, the provider refused the
/// credentials and [`EmailSendError::Credentials`] is returned. Any other
/// response, including bodies that are not in this shape, becomes
/// [`EmailSendError::Other`] carrying the status and all messages.
fn classify_error(status: StatusCode, body: &str) -> EmailSendError {
    let Ok(ErrorResponse { errors }) = serde_json::from_str::<ErrorResponse>(body) else {
        return EmailSendError::Other(anyhow!(
            "SendGrid responded with status {status}: {body:?}"
        ));
    };

    match errors.first() {
        Some(first) if first.message.contains("API key") => {
            EmailSendError::Credentials(format!("{status}: {}", first.message))
        }
        _ => {
            let messages = errors
                .iter()
                .map(|err| match &err.field {
                    Some(field) => format!("{field}: {}", err.message),
                    None => err.message.clone(),
                })
                .collect::<Vec<_>>();
            EmailSendError::Other(anyhow!(
                "SendGrid responded with status {status}: {messages:?}"
            ))
        }
    }
}

#[derive(Serialize)]
struct MailSendRequest<'a> {
    personalizations: [Personalization<'a>; 1],
    from: SendgridAddress<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<SendgridAddress<'a>>,
    subject: &'a str,
    content: [Content<'a>; 2],
}

#[derive(Serialize)]
struct Personalization<'a> {
    to: [SendgridAddress<'a>; 1],
}

#[derive(Serialize)]
struct SendgridAddress<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

impl<'a> From<&'a EmailAddressWithName> for SendgridAddress<'a> {
    fn from(value: &'a EmailAddressWithName) -> Self {
        Self {
            email: value.email(),
            name: value.name(),
        }
    }
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    content_type: &'a str,
    value: &'a str,
}

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    errors: Vec<ErrorEntry>,
}

#[derive(Deserialize)]
struct ErrorEntry {
    message: String,
    field: Option<String>,
}
