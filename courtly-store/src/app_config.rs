use std::env;

use courtly_payfast::MerchantConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub payfast: PayfastConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

/// Gateway credentials plus the redirect/notify URLs sent with every
/// checkout. The merchant block deserializes straight into the codec's
/// config type.
#[derive(Debug, Deserialize, Clone)]
pub struct PayfastConfig {
    #[serde(flatten)]
    pub merchant: MerchantConfig,
    pub return_url: String,
    pub cancel_url: String,
    pub notify_url: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // E.g. COURTLY_SERVER__PORT=8080
            .add_source(config::Environment::with_prefix("COURTLY").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
