use std::future::Future;

use portfolio_models::email_address::EmailAddressWithName;
use thiserror::Error;

/// Client of the transactional email provider.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait EmailService: Send + Sync + 'static {
    /// Check that provider credentials are configured and well-formed,
    /// without contacting the provider.
    fn check_credentials(&self) -> Result<(), EmailCredentialsError>;

    /// Send a single email. Nothing is retried.
    fn send(&self, email: Email) -> impl Future<Output = Result<(), EmailSendError>> + Send;

    /// Check that the provider is reachable and accepts the credentials.
    fn ping(&self) -> impl Future<Output = anyhow::Result<()>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub recipient: EmailAddressWithName,
    /// Plain address the recipient's replies should go to.
    pub reply_to: Option<String>,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EmailCredentialsError {
    #[error("No email provider API key is configured")]
    Missing,
    #[error("The configured email provider API key is malformed")]
    Malformed,
}

#[derive(Debug, Error)]
pub enum EmailSendError {
    /// The provider is not configured or refused the credentials.
    #[error("Email provider credentials are not usable: {0}")]
    Credentials(String),
    /// The provider could not be reached or the response could not be read.
    #[error("Failed to reach the email provider: {0:#}")]
    Transport(anyhow::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<EmailCredentialsError> for EmailSendError {
    fn from(value: EmailCredentialsError) -> Self {
        Self::Credentials(value.to_string())
    }
}

#[cfg(feature = "mock")]
impl MockEmailService {
    pub fn with_check_credentials(mut self, result: Result<(), EmailCredentialsError>) -> Self {
        self.expect_check_credentials()
            .once()
            .return_const(result);
        self
    }

    pub fn with_send(mut self, email: Email, result: Result<(), EmailSendError>) -> Self {
        self.expect_send()
            .once()
            .with(mockall::predicate::eq(email))
            .return_once(move |_| Box::pin(std::future::ready(result)));
        self
    }

    pub fn with_ping(mut self, result: anyhow::Result<()>) -> Self {
        self.expect_ping()
            .once()
            .return_once(move || Box::pin(std::future::ready(result)));
        self
    }
}
