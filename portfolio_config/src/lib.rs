use std::{
    net::IpAddr,
    path::{Path, PathBuf},
};

use anyhow::Context;
use config::{Environment, File, FileFormat};
use portfolio_models::{email_address::EmailAddressWithName, Sensitive};
use serde::Deserialize;
use url::Url;

pub use duration::Duration;

mod duration;

pub const DEFAULT_CONFIG_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../config.toml");

/// Colon separated list of config files, later files override earlier ones.
pub const CONFIG_PATH_ENV: &str = "PORTFOLIO_CONFIG";

/// Environment variable holding the SendGrid API key.
pub const SENDGRID_API_KEY_ENV: &str = "SENDGRID_API_KEY";

/// Load the config from the files listed in `PORTFOLIO_CONFIG`, falling back
/// to [`DEFAULT_CONFIG_PATH`].
pub fn load() -> anyhow::Result<Config> {
    let paths = match std::env::var_os(CONFIG_PATH_ENV) {
        Some(paths) => std::env::split_paths(&paths).collect::<Vec<_>>(),
        None => vec![PathBuf::from(DEFAULT_CONFIG_PATH)],
    };
    load_paths(&paths)
}

/// Load the config from the given files.
///
/// Values can be overridden with `PORTFOLIO__<SECTION>__<KEY>` environment
/// variables. The SendGrid API key is taken from `SENDGRID_API_KEY` if set.
/// A missing or malformed API key is not an error here; the email service
/// reports it at runtime.
pub fn load_paths(paths: &[impl AsRef<Path>]) -> anyhow::Result<Config> {
    let api_key = std::env::var(SENDGRID_API_KEY_ENV).ok();

    paths
        .iter()
        .try_fold(config::Config::builder(), |builder, path| {
            let path = path.as_ref();
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file at {}", path.display()))?;
            let source = File::from_str(&content, FileFormat::Toml);
            anyhow::Ok(builder.add_source(source))
        })?
        .add_source(
            Environment::with_prefix("PORTFOLIO")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .set_override_option("email.sendgrid_api_key", api_key)?
        .build()?
        .try_deserialize()
        .context("Failed to load config")
}

pub fn load_dev_config() -> anyhow::Result<Config> {
    load_paths(&[Path::new(DEFAULT_CONFIG_PATH)])
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub http: HttpConfig,
    pub email: EmailConfig,
    pub contact: ContactConfig,
    pub health: HealthConfig,
    pub sentry: Option<SentryConfig>,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub host: IpAddr,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct EmailConfig {
    pub from: EmailAddressWithName,
    pub sendgrid_api_key: Option<Sensitive<String>>,
    pub sendgrid_endpoint_override: Option<Url>,
}

#[derive(Debug, Deserialize)]
pub struct ContactConfig {
    pub email: EmailAddressWithName,
}

#[derive(Debug, Deserialize)]
pub struct HealthConfig {
    pub cache_ttl: Duration,
}

#[derive(Debug, Deserialize)]
pub struct SentryConfig {
    pub dsn: Sensitive<String>,
}
