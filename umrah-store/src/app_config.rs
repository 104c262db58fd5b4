use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use umrah_shared::Masked;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub payments: PaymentsConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Without a URL the service runs on the in-memory store.
    pub url: Option<Masked<String>>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: Masked<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentsConfig {
    pub webhook_secret: Masked<String>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_tolerance")]
    pub signature_tolerance_seconds: u64,
}

fn default_currency() -> String {
    umrah_shared::DEFAULT_CURRENCY.to_string()
}

fn default_tolerance() -> u64 {
    300
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    pub flights_path: PathBuf,
    pub hotels_path: PathBuf,
    pub rails_path: PathBuf,
    #[serde(default = "default_hotel_cities")]
    pub hotel_cities: Vec<String>,
    #[serde(default = "default_destination_city")]
    pub destination_city: String,
}

fn default_hotel_cities() -> Vec<String> {
    vec!["Medina".to_string(), "Mecca".to_string()]
}

fn default_destination_city() -> String {
    "Medina".to_string()
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `UMRAH_DATABASE__URL=postgres://...`
            .add_source(
                config::Environment::with_prefix("UMRAH")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("catalog.hotel_cities")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.catalog.hotel_cities.len() != 2 {
            return Err(config::ConfigError::Message(format!(
                "catalog.hotel_cities must name exactly two cities, got {}",
                self.catalog.hotel_cities.len()
            )));
        }
        Ok(())
    }
}
