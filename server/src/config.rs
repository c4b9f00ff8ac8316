//! Server configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use quotation_fx::FrankfurterConfig;
use quotation_store::PostgresConfig;

use crate::manager::ManagerConfig;

/// Deployment environment; selects log format and default level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnv {
    /// Developer machine: human readable logs.
    #[default]
    Local,
    /// Shared development environment.
    Dev,
    /// Pre-production.
    Preprod,
    /// Production.
    Prod,
}

impl AppEnv {
    /// Log filter used when `RUST_LOG` is not set.
    pub fn default_log_filter(&self) -> &'static str {
        match self {
            AppEnv::Local | AppEnv::Dev => "debug",
            AppEnv::Preprod | AppEnv::Prod => "info",
        }
    }

    /// Whether logs are emitted as JSON lines.
    pub fn json_logs(&self) -> bool {
        !matches!(self, AppEnv::Local)
    }
}

impl fmt::Display for AppEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AppEnv::Local => "local",
            AppEnv::Dev => "dev",
            AppEnv::Preprod => "preprod",
            AppEnv::Prod => "prod",
        };
        f.write_str(name)
    }
}

impl FromStr for AppEnv {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(AppEnv::Local),
            "dev" => Ok(AppEnv::Dev),
            "preprod" => Ok(AppEnv::Preprod),
            "prod" => Ok(AppEnv::Prod),
            other => Err(format!("Unknown environment: {other}")),
        }
    }
}

/// Where quotation requests are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "postgres" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("Unknown store backend: {other}")),
        }
    }
}

/// Which rate source feeds the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RateSourceKind {
    #[default]
    Frankfurter,
    Random,
}

impl FromStr for RateSourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "frankfurter" => Ok(RateSourceKind::Frankfurter),
            "random" => Ok(RateSourceKind::Random),
            other => Err(format!("Unknown rate source: {other}")),
        }
    }
}

/// Main server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Deployment environment.
    pub env: AppEnv,
    /// Listen address.
    pub listen_addr: String,
    /// Listen port.
    pub listen_port: u16,
    /// Port of the Prometheus scrape endpoint.
    pub metrics_port: u16,
    /// Database URL.
    pub database_url: String,
    /// Maximum pooled database connections.
    pub db_max_connections: u32,
    /// Store implementation.
    pub store_backend: StoreBackend,
    /// Rate source implementation.
    pub rate_source: RateSourceKind,
    /// Frankfurter API base URL.
    pub frankfurter_api_url: String,
    /// Reconciliation loop period.
    pub poll_interval: Duration,
    /// Timeout for calls to the rate source.
    pub outgoing_request_timeout: Duration,
    /// Timeout for one HTTP request served by the API.
    pub incoming_request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            env: AppEnv::Local,
            listen_addr: "0.0.0.0".to_string(),
            listen_port: 8080,
            metrics_port: 9090,
            database_url: "postgres://localhost/quotation".to_string(),
            db_max_connections: 5,
            store_backend: StoreBackend::Postgres,
            rate_source: RateSourceKind::Frankfurter,
            frankfurter_api_url: "https://api.frankfurter.dev".to_string(),
            poll_interval: Duration::from_millis(1000),
            outgoing_request_timeout: Duration::from_millis(2000),
            incoming_request_timeout: Duration::from_millis(5000),
        }
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("Invalid value for {name}: {value}"))
}

fn parse_enum<T: FromStr<Err = String>>(name: &str, value: &str) -> Result<T, String> {
    value.parse().map_err(|e| format!("{name}: {e}"))
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from any variable source, starting from defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(env) = lookup("APP_ENV") {
            config.env = parse_enum("APP_ENV", &env)?;
        }

        if let Some(ip) = lookup("SERVER_IP") {
            config.listen_addr = ip;
        }

        if let Some(port) = lookup("SERVER_PORT") {
            config.listen_port = parse_var("SERVER_PORT", &port)?;
        }

        if let Some(port) = lookup("METRICS_PORT") {
            config.metrics_port = parse_var("METRICS_PORT", &port)?;
        }

        if let Some(url) = lookup("DATABASE_URL") {
            config.database_url = url;
        }

        if let Some(max) = lookup("DB_MAX_CONNECTIONS") {
            config.db_max_connections = parse_var("DB_MAX_CONNECTIONS", &max)?;
        }

        if let Some(backend) = lookup("STORE_BACKEND") {
            config.store_backend = parse_enum("STORE_BACKEND", &backend)?;
        }

        if let Some(source) = lookup("RATE_SOURCE") {
            config.rate_source = parse_enum("RATE_SOURCE", &source)?;
        }

        if let Some(url) = lookup("FRANKFURTER_API_URL") {
            config.frankfurter_api_url = url;
        }

        if let Some(ms) = lookup("QUOTATION_UPDATE_INTERVAL_MILLISECONDS") {
            config.poll_interval = Duration::from_millis(parse_var(
                "QUOTATION_UPDATE_INTERVAL_MILLISECONDS",
                &ms,
            )?);
        }

        if let Some(ms) = lookup("OUTGOING_REQUEST_TIMEOUT_MS") {
            config.outgoing_request_timeout =
                Duration::from_millis(parse_var("OUTGOING_REQUEST_TIMEOUT_MS", &ms)?);
        }

        if let Some(ms) = lookup("INCOMING_REQUEST_TIMEOUT_MS") {
            config.incoming_request_timeout =
                Duration::from_millis(parse_var("INCOMING_REQUEST_TIMEOUT_MS", &ms)?);
        }

        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_port == 0 {
            return Err("Listen port cannot be 0".to_string());
        }

        if self.metrics_port == 0 || self.metrics_port == self.listen_port {
            return Err("Metrics port must be non-zero and differ from the listen port".to_string());
        }

        if self.store_backend == StoreBackend::Postgres && self.database_url.is_empty() {
            return Err("Database URL cannot be empty".to_string());
        }

        if self.db_max_connections == 0 {
            return Err("Database pool needs at least one connection".to_string());
        }

        if self.rate_source == RateSourceKind::Frankfurter && self.frankfurter_api_url.is_empty() {
            return Err("Frankfurter API URL cannot be empty".to_string());
        }

        if self.poll_interval.is_zero() {
            return Err("Quotation update interval cannot be 0".to_string());
        }

        if self.outgoing_request_timeout.is_zero() || self.incoming_request_timeout.is_zero() {
            return Err("Request timeouts cannot be 0".to_string());
        }

        Ok(())
    }

    /// `addr:port` to bind the HTTP listener to.
    pub fn listen_socket(&self) -> String {
        format!("{}:{}", self.listen_addr, self.listen_port)
    }

    /// `addr:port` to bind the metrics listener to.
    pub fn metrics_socket(&self) -> String {
        format!("{}:{}", self.listen_addr, self.metrics_port)
    }

    pub fn manager_config(&self) -> ManagerConfig {
        ManagerConfig {
            poll_interval: self.poll_interval,
        }
    }

    pub fn postgres_config(&self) -> PostgresConfig {
        PostgresConfig {
            database_url: self.database_url.clone(),
            max_connections: self.db_max_connections,
        }
    }

    pub fn frankfurter_config(&self) -> FrankfurterConfig {
        FrankfurterConfig {
            api_url: self.frankfurter_api_url.clone(),
            timeout: self.outgoing_request_timeout,
        }
    }
}
