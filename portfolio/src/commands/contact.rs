use anyhow::ensure;
use clap::Subcommand;
use portfolio_client::{ContactFormClient, ContactFormClientConfig, ContactFormFields, FormStatus};
use url::Url;

#[derive(Debug, Subcommand)]
pub enum ContactCommand {
    /// Submit a message through the contact form of a running server
    #[command(aliases(["s"]))]
    Send {
        /// Base url of the server
        #[arg(long, default_value = "http://127.0.0.1:8000")]
        url: Url,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        message: String,
    },
}

impl ContactCommand {
    pub async fn invoke(self) -> anyhow::Result<()> {
        match self {
            ContactCommand::Send {
                url,
                name,
                email,
                message,
            } => {
                send(
                    &url,
                    ContactFormFields {
                        name,
                        email,
                        message,
                    },
                )
                .await
            }
        }
    }
}

async fn send(url: &Url, fields: ContactFormFields) -> anyhow::Result<()> {
    let client = ContactFormClient::new(ContactFormClientConfig::new(url)?)?;
    client.edit(|form| *form = fields)?;

    let status = client.submit().await?;
    println!("{status:?}");

    ensure!(
        status == FormStatus::Success,
        "The contact form submission failed"
    );

    Ok(())
}
