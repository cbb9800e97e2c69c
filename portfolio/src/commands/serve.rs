use portfolio_config::Config;
use portfolio_email_contracts::EmailService;
use tracing::{info, warn};

use crate::{
    email,
    environment::{ConfigProvider, Provider},
};

pub async fn serve(config: Config) -> anyhow::Result<()> {
    info!("Creating SendGrid client");
    let email = email::connect(&config.email)?;
    match email.check_credentials() {
        Ok(()) => match email.ping().await {
            Ok(()) => info!("SendGrid accepted the configured API key"),
            Err(err) => warn!("Failed to reach SendGrid: {err:#}"),
        },
        Err(err) => warn!("The contact form will be unavailable: {err}"),
    }

    let server = Provider::new(ConfigProvider::new(&config), email).rest_server()?;
    info!(
        "Starting http server on {}:{}",
        config.http.host, config.http.port
    );
    server.serve(config.http.host, config.http.port).await
}
