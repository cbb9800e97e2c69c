use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use portfolio::commands::{contact::ContactCommand, email::EmailCommand, serve::serve};
use portfolio_config::SentryConfig;
use portfolio_utils::portfolio_version;
use sentry::{integrations::tracing::EventFilter, ClientInitGuard};
use tracing::{info, Level, Metadata};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let command = match Cli::parse().command {
        Command::Completion { shell } => {
            print_completions(shell);
            return Ok(());
        }
        command => command,
    };

    let config = portfolio_config::load().context("Failed to load config")?;

    let sentry_guard = config.sentry.as_ref().map(init_sentry);
    init_tracing(sentry_guard.is_some());

    match command {
        Command::Serve => serve(config).await?,
        Command::Email { command } => command.invoke(config).await?,
        Command::Contact { command } => command.invoke().await?,
        Command::CheckConfig { verbose } => {
            verbose.then(|| println!("{config:#?}"));
            info!("Config is valid");
        }
        Command::Completion { .. } => unreachable!(),
    }

    Ok(())
}

#[derive(Debug, Parser)]
#[command(version = portfolio_version())]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the REST API server for the portfolio contact form
    #[command(aliases(["run", "start", "r", "s"]))]
    Serve,
    /// Test email deliverability
    #[command(aliases(["e"]))]
    Email {
        #[command(subcommand)]
        command: EmailCommand,
    },
    /// Use the contact form of a running server
    #[command(aliases(["c"]))]
    Contact {
        #[command(subcommand)]
        command: ContactCommand,
    },
    /// Validate configuration
    CheckConfig {
        /// Print a debug representation of the config
        #[arg(short, long)]
        verbose: bool,
    },
    /// Generate shell completions
    Completion {
        /// The shell to generate completions for
        #[clap(value_enum)]
        shell: Shell,
    },
}

fn print_completions(shell: Shell) {
    clap_complete::generate(
        shell,
        &mut Cli::command(),
        env!("CARGO_BIN_NAME"),
        &mut std::io::stdout(),
    );
}

fn init_sentry(config: &SentryConfig) -> ClientInitGuard {
    sentry::init((
        config.dsn.as_str(),
        sentry::ClientOptions {
            release: Some(portfolio_version().into()),
            attach_stacktrace: true,
            ..Default::default()
        },
    ))
}

fn init_tracing(sentry: bool) {
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    #[cfg(tracing_pretty)]
    let fmt_layer = fmt_layer.pretty();

    let sentry_layer =
        sentry.then(|| sentry::integrations::tracing::layer().event_filter(sentry_event_filter));

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(EnvFilter::from_default_env()))
        .with(sentry_layer)
        .init();
}

/// Errors become sentry issues, warnings become events and everything down to
/// debug is attached as breadcrumbs.
fn sentry_event_filter(meta: &Metadata<'_>) -> EventFilter {
    match *meta.level() {
        Level::ERROR => EventFilter::Exception,
        Level::WARN => EventFilter::Event,
        Level::INFO | Level::DEBUG => EventFilter::Breadcrumb,
        Level::TRACE => EventFilter::Ignore,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_contact_send() {
        let cli = Cli::try_parse_from([
            "portfolio",
            "contact",
            "send",
            "--name",
            "Jane Doe",
            "--email",
            "jane@example.com",
            "--message",
            "Hello",
        ])
        .unwrap();

        let Command::Contact {
            command: ContactCommand::Send { url, name, .. },
        } = cli.command
        else {
            panic!("expected the contact send command");
        };
        assert_eq!(url.as_str(), "http://127.0.0.1:8000/");
        assert_eq!(name, "Jane Doe");
    }
}
