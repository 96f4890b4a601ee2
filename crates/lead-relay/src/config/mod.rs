use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use url::Url;

const DEFAULT_PROVIDER_BASE_URL: &str = "https://2factor.in/API/V1";
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 10;
const DEFAULT_DISQUALIFYING_TIER: &str = "lt25k";

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
    pub otp_provider: OtpProviderConfig,
    pub qualification: QualificationConfig,
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

        let api_key = env::var("TWO_FACTOR_API_KEY")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let raw_base_url = env::var("TWO_FACTOR_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_PROVIDER_BASE_URL.to_string());
        let base_url = Url::parse(raw_base_url.trim())
            .map_err(|source| ConfigError::InvalidProviderUrl { source })?;

        let timeout_secs = match env::var("TWO_FACTOR_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidProviderTimeout)?,
            Err(_) => DEFAULT_PROVIDER_TIMEOUT_SECS,
        };

        let disqualifying_tiers = env::var("LEAD_DISQUALIFYING_TIERS")
            .map(|raw| parse_tier_list(&raw))
            .unwrap_or_else(|_| vec![DEFAULT_DISQUALIFYING_TIER.to_string()]);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            otp_provider: OtpProviderConfig {
                api_key,
                base_url,
                timeout: Duration::from_secs(timeout_secs),
            },
            qualification: QualificationConfig {
                disqualifying_tiers,
            },
        })
    }
}

fn parse_tier_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tier| !tier.is_empty())
        .map(str::to_string)
        .collect()
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Credentials and endpoint for the SMS OTP provider.
#[derive(Clone)]
pub struct OtpProviderConfig {
    pub api_key: String,
    pub base_url: Url,
    pub timeout: Duration,
}

impl fmt::Debug for OtpProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OtpProviderConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Revenue tiers that end a submission before any OTP is dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualificationConfig {
    pub disqualifying_tiers: Vec<String>,
}

impl Default for QualificationConfig {
    fn default() -> Self {
        Self {
            disqualifying_tiers: vec![DEFAULT_DISQUALIFYING_TIER.to_string()],
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    MissingApiKey,
    InvalidProviderUrl { source: url::ParseError },
    InvalidProviderTimeout,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::MissingApiKey => write!(
                f,
                "TWO_FACTOR_API_KEY is not set; export the OTP provider API key (or add it to .env) before starting the service"
            ),
            ConfigError::InvalidProviderUrl { .. } => {
                write!(f, "TWO_FACTOR_BASE_URL must be an absolute URL")
            }
            ConfigError::InvalidProviderTimeout => {
                write!(f, "TWO_FACTOR_TIMEOUT_SECS must be a positive number of seconds")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidProviderUrl { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::MissingApiKey
            | ConfigError::InvalidProviderTimeout => None,
        }
    }
}
