use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::attendance::GeofencePolicy;
use crate::workflows::directory::{Capability, PermissionTable, Role};
use crate::workflows::leave::ChainDriftPolicy;

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
    pub workflow: WorkflowConfig,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            workflow: WorkflowConfig::from_env()?,
        })
    }
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

/// Policy knobs shared by the attendance and leave workflows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowConfig {
    pub chain_drift: ChainDriftPolicy,
    pub permissions: PermissionTable,
    pub flexible_skips_geofence: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            chain_drift: ChainDriftPolicy::default(),
            permissions: PermissionTable::standard(),
            flexible_skips_geofence: false,
        }
    }
}

impl WorkflowConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let chain_drift = match env::var("APP_CHAIN_DRIFT_POLICY") {
            Ok(raw) => raw
                .parse::<ChainDriftPolicy>()
                .map_err(|value| ConfigError::InvalidDriftPolicy { value })?,
            Err(_) => defaults.chain_drift,
        };

        let permissions = match env::var("APP_GEOFENCE_BYPASS_ROLES") {
            Ok(raw) => {
                let roles = parse_roles(&raw)?;
                defaults
                    .permissions
                    .with_holders(Capability::BypassGeofence, &roles)
            }
            Err(_) => defaults.permissions,
        };

        let flexible_skips_geofence = match env::var("APP_FLEXIBLE_SKIPS_GEOFENCE") {
            Ok(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidFlag {
                name: "APP_FLEXIBLE_SKIPS_GEOFENCE",
                value: raw,
            })?,
            Err(_) => defaults.flexible_skips_geofence,
        };

        Ok(Self {
            chain_drift,
            permissions,
            flexible_skips_geofence,
        })
    }

    pub fn geofence_policy(&self) -> GeofencePolicy {
        GeofencePolicy {
            permissions: self.permissions.clone(),
            flexible_skips_geofence: self.flexible_skips_geofence,
        }
    }
}

fn parse_roles(raw: &str) -> Result<Vec<Role>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry.parse::<Role>().map_err(|_| ConfigError::InvalidRole {
                value: entry.to_string(),
            })
        })
        .collect()
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidDriftPolicy { value: String },
    InvalidRole { value: String },
    InvalidFlag { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidDriftPolicy { value } => write!(
                f,
                "APP_CHAIN_DRIFT_POLICY must be advance_to_second, restart_at_first or fail (found '{value}')"
            ),
            ConfigError::InvalidRole { value } => {
                write!(f, "APP_GEOFENCE_BYPASS_ROLES contains unknown role '{value}'")
            }
            ConfigError::InvalidFlag { name, value } => {
                write!(f, "{name} must be true or false (found '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidDriftPolicy { .. }
            | ConfigError::InvalidRole { .. }
            | ConfigError::InvalidFlag { .. } => None,
        }
    }
}
