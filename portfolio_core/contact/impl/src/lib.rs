use std::sync::Arc;

use portfolio_core_contact_contracts::{ContactFeatureService, ContactSendMessageError};
use portfolio_email_contracts::{Email, EmailSendError, EmailService};
use portfolio_models::{contact::ContactMessage, email_address::EmailAddressWithName};
use portfolio_templates_contracts::{
    ContactMessageHtmlTemplate, ContactMessageTextTemplate, TemplateService,
};
use tracing::{error, info};

pub const SUBJECT_PREFIX: &str = "Portfolio Contact Form: Message from ";

#[derive(Debug, Clone)]
pub struct ContactFeatureServiceImpl<Email, Template> {
    email: Email,
    template: Template,
    config: ContactFeatureConfig,
}

#[derive(Debug, Clone)]
pub struct ContactFeatureConfig {
    /// Recipient of contact form submissions.
    pub email: Arc<EmailAddressWithName>,
}

impl<EmailS, Template> ContactFeatureServiceImpl<EmailS, Template> {
    pub fn new(email: EmailS, template: Template, config: ContactFeatureConfig) -> Self {
        Self {
            email,
            template,
            config,
        }
    }
}

impl<EmailS, Template> ContactFeatureService for ContactFeatureServiceImpl<EmailS, Template>
where
    EmailS: EmailService,
    Template: TemplateService,
{
    async fn send_message(&self, message: ContactMessage) -> Result<(), ContactSendMessageError> {
        if let Err(err) = self.email.check_credentials() {
            error!("Contact form is unavailable: {err}");
            return Err(ContactSendMessageError::Unavailable);
        }

        let ContactMessage { author, content } = message;
        let name = author.name.into_inner();
        let email = author.email.into_inner();
        let message = content.into_inner();

        let text_body = self.template.render(&ContactMessageTextTemplate {
            name: name.clone(),
            email: email.clone(),
            message: message.clone(),
        })?;
        let html_body = self.template.render(&ContactMessageHtmlTemplate {
            name: name.clone(),
            email: email.clone(),
            message,
        })?;

        let email = Email {
            recipient: (*self.config.email).clone(),
            reply_to: Some(email),
            subject: format!("{SUBJECT_PREFIX}{name}"),
            text_body,
            html_body,
        };

        match self.email.send(email).await {
            Ok(()) => {
                info!("Forwarded contact message");
                Ok(())
            }
            Err(EmailSendError::Credentials(detail)) => {
                error!("Email provider refused the credentials: {detail}");
                Err(ContactSendMessageError::Unavailable)
            }
            Err(err) => Err(anyhow::Error::from(err)
                .context("Failed to send contact message")
                .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use portfolio_email_contracts::{EmailCredentialsError, MockEmailService};
    use portfolio_templates_contracts::MockTemplateService;
    use portfolio_utils::assert_matches;

    use super::*;

    #[tokio::test]
    async fn ok() {
        // Arrange
        let config = make_config();

        let template = make_template();

        let email = MockEmailService::new()
            .with_check_credentials(Ok(()))
            .with_send(make_email(&config), Ok(()));

        let sut = ContactFeatureServiceImpl::new(email, template, config);

        // Act
        let result = sut.send_message(make_message()).await;

        // Assert
        result.unwrap();
    }

    #[tokio::test]
    async fn missing_credentials() {
        // Arrange
        let email =
            MockEmailService::new().with_check_credentials(Err(EmailCredentialsError::Missing));

        let sut = ContactFeatureServiceImpl::new(email, MockTemplateService::new(), make_config());

        // Act
        let result = sut.send_message(make_message()).await;

        // Assert
        assert_matches!(result, Err(ContactSendMessageError::Unavailable));
    }

    #[tokio::test]
    async fn malformed_credentials() {
        // Arrange
        let email =
            MockEmailService::new().with_check_credentials(Err(EmailCredentialsError::Malformed));

        let sut = ContactFeatureServiceImpl::new(email, MockTemplateService::new(), make_config());

        // Act
        let result = sut.send_message(make_message()).await;

        // Assert
        assert_matches!(result, Err(ContactSendMessageError::Unavailable));
    }

    #[tokio::test]
    async fn credentials_rejected_by_provider() {
        // Arrange
        let config = make_config();

        let email = MockEmailService::new()
            .with_check_credentials(Ok(()))
            .with_send(
                make_email(&config),
                Err(EmailSendError::Credentials(
                    "401: The provided API key is invalid".into(),
                )),
            );

        let sut = ContactFeatureServiceImpl::new(email, make_template(), config);

        // Act
        let result = sut.send_message(make_message()).await;

        // Assert
        assert_matches!(result, Err(ContactSendMessageError::Unavailable));
    }

    #[tokio::test]
    async fn transport_error() {
        // Arrange
        let config = make_config();

        let email = MockEmailService::new()
            .with_check_credentials(Ok(()))
            .with_send(
                make_email(&config),
                Err(EmailSendError::Transport(anyhow!("connection refused"))),
            );

        let sut = ContactFeatureServiceImpl::new(email, make_template(), config);

        // Act
        let result = sut.send_message(make_message()).await;

        // Assert
        assert_matches!(result, Err(ContactSendMessageError::Other(_)));
    }

    #[tokio::test]
    async fn provider_error() {
        // Arrange
        let config = make_config();

        let email = MockEmailService::new()
            .with_check_credentials(Ok(()))
            .with_send(
                make_email(&config),
                Err(EmailSendError::Other(anyhow!("400: The subject is required."))),
            );

        let sut = ContactFeatureServiceImpl::new(email, make_template(), config);

        // Act
        let result = sut.send_message(make_message()).await;

        // Assert
        assert_matches!(result, Err(ContactSendMessageError::Other(_)));
    }

    fn make_config() -> ContactFeatureConfig {
        ContactFeatureConfig {
            email: Arc::new("Owner <owner@example.com>".parse().unwrap()),
        }
    }

    fn make_message() -> ContactMessage {
        ContactMessage::new(
            "Jane Doe".into(),
            "jane@example.com".into(),
            "Hello\nWorld".into(),
        )
        .unwrap()
    }

    fn make_template() -> MockTemplateService {
        MockTemplateService::new()
            .with_render(
                ContactMessageTextTemplate {
                    name: "Jane Doe".into(),
                    email: "jane@example.com".into(),
                    message: "Hello\nWorld".into(),
                },
                "text body".into(),
            )
            .with_render(
                ContactMessageHtmlTemplate {
                    name: "Jane Doe".into(),
                    email: "jane@example.com".into(),
                    message: "Hello\nWorld".into(),
                },
                "html body".into(),
            )
    }

    fn make_email(config: &ContactFeatureConfig) -> Email {
        Email {
            recipient: (*config.email).clone(),
            reply_to: Some("jane@example.com".into()),
            subject: "Portfolio Contact Form: Message from Jane Doe".into(),
            text_body: "text body".into(),
            html_body: "html body".into(),
        }
    }
}
