//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The file path
//! defaults to `config.yaml` but can be specified via the `-f` flag or the `QUIZBREW_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `QUIZBREW_` override YAML values
//! 3. **DATABASE_URL** - Special case: overrides `database.url` if set
//! 4. **`--service`** - Overrides `service` when given on the command line
//!
//! For nested values, use double underscores in environment variables. For example,
//! `QUIZBREW_TRIVIA__QUESTIONS_PER_PAGE=20` sets `trivia.questions_per_page`.
//!
//! ## Usage
//!
//! ```no_run
//! use clap::Parser;
//! use quizbrew::config::{Args, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let args = Args::parse();
//! let config = Config::load(&args)?;
//!
//! println!("Serving the {} API on {}", config.service, config.bind_address());
//! # Ok(())
//! # }
//! ```
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! QUIZBREW_PORT=8080
//! DATABASE_URL="sqlite://data/quizbrew.db?mode=rwc"
//! QUIZBREW_AUTH__JWKS_URL="https://example.eu.auth0.com/.well-known/jwks.json"
//! QUIZBREW_ENABLE_METRICS=true
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::Error;
use crate::types::Service;

/// CLI args - which API to serve and where its configuration lives
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// API to serve; overrides `service` from the config file
    #[arg(short, long, value_enum)]
    pub service: Option<Service>,

    /// Path to configuration file
    #[arg(short = 'f', long, env = "QUIZBREW_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// All fields have defaults, so an empty file serves the trivia API on port 5000 with a local
/// SQLite database.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Which API this process serves
    pub service: Service,
    /// Set from the raw `DATABASE_URL` environment variable; folded into `database.url` on load
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    pub database: DatabaseConfig,
    pub trivia: TriviaConfig,
    pub coffee: CoffeeConfig,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
    /// Serve Prometheus metrics on `/internal/metrics`
    pub enable_metrics: bool,
    /// Export traces over OTLP (configured through the standard `OTEL_*` variables)
    pub enable_otel_export: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            service: Service::default(),
            database_url: None,
            database: DatabaseConfig::default(),
            trivia: TriviaConfig::default(),
            coffee: CoffeeConfig::default(),
            auth: AuthConfig::default(),
            cors: CorsConfig::default(),
            enable_metrics: false,
            enable_otel_export: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// SQLite connection string; `mode=rwc` creates the file on first start
    pub url: String,
    pub pool: PoolSettings,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://quizbrew.db?mode=rwc".to_string(),
            pool: PoolSettings::default(),
        }
    }
}

/// Connection pool configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolSettings {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections to maintain
    pub min_connections: u32,
    /// Maximum time to wait for a connection (seconds)
    pub acquire_timeout_secs: u64,
    /// Time before idle connections are closed (seconds, 0 = never)
    pub idle_timeout_secs: u64,
    /// Maximum lifetime of a connection (seconds, 0 = never)
    pub max_lifetime_secs: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 5,
            min_connections: 0,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TriviaConfig {
    /// Questions per page on every paginated trivia endpoint
    pub questions_per_page: i64,
    /// Insert the bundled sample questions on first startup
    pub seed_sample_questions: bool,
}

impl Default for TriviaConfig {
    fn default() -> Self {
        Self {
            questions_per_page: 10,
            seed_sample_questions: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoffeeConfig {
    /// Drop every drink on startup and recreate the sample "water" drink
    pub reset_on_startup: bool,
}

/// Bearer-token verification for the coffee-shop API. Exactly one of `secret_key` and `jwks_url`
/// must be set when serving it.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Shared HS256 secret
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    /// JSON Web Key Set of the identity provider (RS256)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwks_url: Option<Url>,
    /// Expected `iss` claim
    pub issuer: String,
    /// Expected `aud` claim
    pub audience: String,
    /// Timeout for fetching the key set at startup
    #[serde(with = "humantime_serde")]
    pub jwks_timeout: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            jwks_url: None,
            issuer: String::new(),
            audience: String::new(),
            jwks_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests
    pub allowed_origins: Vec<CorsOrigin>,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![CorsOrigin::Wildcard],
            max_age: None,
        }
    }
}

/// An allowed CORS origin.
///
/// Can be either a wildcard (`*`) to allow all origins, or a specific URL.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Allow all origins (`*`)
    #[serde(deserialize_with = "parse_wildcard", serialize_with = "serialize_wildcard")]
    Wildcard,
    /// Specific origin URL (e.g., `https://menu.example.com`)
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn serialize_wildcard<S>(serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str("*")
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        if let Some(url) = config.database_url.take() {
            config.database.url = url;
        }

        if let Some(service) = args.service {
            config.service = service;
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.trivia.questions_per_page < 1 {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: trivia.questions_per_page must be at least 1 (got {})",
                    self.trivia.questions_per_page
                ),
            });
        }

        if self.service == Service::Coffee {
            match (&self.auth.secret_key, &self.auth.jwks_url) {
                (None, None) => {
                    return Err(Error::Internal {
                        operation: "Config validation: the coffee service needs a token verification key. \
                         Set auth.jwks_url (QUIZBREW_AUTH__JWKS_URL) or auth.secret_key (QUIZBREW_AUTH__SECRET_KEY)."
                            .to_string(),
                    });
                }
                (Some(_), Some(_)) => {
                    return Err(Error::Internal {
                        operation: "Config validation: auth.secret_key and auth.jwks_url are mutually exclusive".to_string(),
                    });
                }
                _ => {}
            }

            if self.auth.issuer.is_empty() || self.auth.audience.is_empty() {
                return Err(Error::Internal {
                    operation: "Config validation: the coffee service needs auth.issuer and auth.audience".to_string(),
                });
            }
        }

        if self.database.pool.min_connections > self.database.pool.max_connections {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: database.pool.min_connections ({}) cannot be greater than max_connections ({})",
                    self.database.pool.min_connections, self.database.pool.max_connections
                ),
            });
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables override specific values; QUIZBREW_CONFIG only names the file
            .merge(Env::prefixed("QUIZBREW_").ignore(&["config"]).split("__"))
            // Common DATABASE_URL pattern
            .merge(Env::raw().only(&["DATABASE_URL"]))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
