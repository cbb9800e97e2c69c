use anyhow::Context;
use portfolio_config::EmailConfig;
use portfolio_email_impl::EmailServiceImpl;

/// Create the SendGrid client. Does not contact the provider.
pub fn connect(config: &EmailConfig) -> anyhow::Result<EmailServiceImpl> {
    EmailServiceImpl::new(
        config.from.clone(),
        config.sendgrid_api_key.clone(),
        config.sendgrid_endpoint_override.clone(),
    )
    .context("Failed to create SendGrid client")
}
