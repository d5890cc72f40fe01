use crate::settings::{Settings, SettingsError};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub providers: ProviderConfig,
    pub rules: RuleSourceConfig,
    pub defaults: Settings,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let timeout_secs = parse_number::<u64>("BTM_HTTP_TIMEOUT_SECS")?.unwrap_or(15);
        let providers = ProviderConfig {
            google_maps_api_key: optional_var("GOOGLE_MAPS_API_KEY"),
            census_api_key: optional_var("CENSUS_API_KEY"),
            land_area_table: optional_var("BTM_LAND_AREA_TABLE").map(PathBuf::from),
            http_timeout: Duration::from_secs(timeout_secs),
        };

        let rules = match (
            optional_var("SUPABASE_URL"),
            optional_var("SUPABASE_ANON_KEY"),
        ) {
            (Some(url), Some(api_key)) => RuleSourceConfig::Supabase { url, api_key },
            (Some(_), None) => return Err(ConfigError::MissingSupabaseKey),
            _ => match optional_var("BTM_RULES_PATH") {
                Some(path) => RuleSourceConfig::File(PathBuf::from(path)),
                None => RuleSourceConfig::Standard,
            },
        };

        let mut defaults = Settings::default();
        if let Some(density) = parse_number::<f64>("BTM_MIN_POPULATION_DENSITY")? {
            defaults.minimum_population_density = density;
        }
        if let Some(radius) = parse_number::<f64>("BTM_SEARCH_RADIUS_MILES")? {
            defaults.search_radius_miles = radius;
        }
        defaults.validate().map_err(ConfigError::InvalidDefaults)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            providers,
            rules,
            defaults,
        })
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_number<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    optional_var(name)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|_| ConfigError::InvalidNumber { var: name })
        })
        .transpose()
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Credentials and tuning for the third-party data providers.
#[derive(Clone)]
pub struct ProviderConfig {
    pub google_maps_api_key: Option<String>,
    pub census_api_key: Option<String>,
    pub land_area_table: Option<PathBuf>,
    pub http_timeout: Duration,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("google_maps_api_key", &self.google_maps_api_key.is_some())
            .field("census_api_key", &self.census_api_key.is_some())
            .field("land_area_table", &self.land_area_table)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

/// Where qualification rule tables are read from.
#[derive(Clone, PartialEq, Eq)]
pub enum RuleSourceConfig {
    Supabase { url: String, api_key: String },
    File(PathBuf),
    Standard,
}

impl fmt::Debug for RuleSourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSourceConfig::Supabase { url, .. } => {
                f.debug_struct("Supabase").field("url", url).finish()
            }
            RuleSourceConfig::File(path) => f.debug_tuple("File").field(path).finish(),
            RuleSourceConfig::Standard => f.write_str("Standard"),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { var: &'static str },
    MissingSupabaseKey,
    InvalidDefaults(SettingsError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { var } => write!(f, "{var} must be numeric"),
            ConfigError::MissingSupabaseKey => {
                write!(f, "SUPABASE_ANON_KEY is required when SUPABASE_URL is set")
            }
            ConfigError::InvalidDefaults(err) => write!(f, "invalid default settings: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidDefaults(err) => Some(err),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::MissingSupabaseKey => None,
        }
    }
}
