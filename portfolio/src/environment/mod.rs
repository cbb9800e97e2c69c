use std::sync::Arc;

use portfolio_config::Config;
use portfolio_core_contact_impl::ContactFeatureConfig;
use portfolio_core_health_impl::HealthFeatureConfig;
use types::{ContactFeature, Email, HealthFeature, RestServer, Template};

pub mod types;

/// Feature configurations derived from the loaded [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigProvider {
    contact: ContactFeatureConfig,
    health: HealthFeatureConfig,
}

impl ConfigProvider {
    pub fn new(config: &Config) -> Self {
        Self {
            contact: ContactFeatureConfig {
                email: Arc::new(config.contact.email.clone()),
            },
            health: HealthFeatureConfig {
                cache_ttl: config.health.cache_ttl.0,
            },
        }
    }
}

/// Wires the services of the backend together.
#[derive(Debug, Clone)]
pub struct Provider {
    config: ConfigProvider,
    email: Email,
}

impl Provider {
    pub fn new(config: ConfigProvider, email: Email) -> Self {
        Self { config, email }
    }

    pub fn rest_server(&self) -> anyhow::Result<RestServer> {
        Ok(RestServer::new(self.health_feature(), self.contact_feature()?))
    }

    pub fn health_feature(&self) -> HealthFeature {
        HealthFeature::new(self.email.clone(), self.config.health.clone())
    }

    pub fn contact_feature(&self) -> anyhow::Result<ContactFeature> {
        Ok(ContactFeature::new(
            self.email.clone(),
            Template::new()?,
            self.config.contact.clone(),
        ))
    }
}
