//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.

use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::{config::database::DatabaseConfig, services::payment_gateway::PaymentEnvironment};

/// Errores de configuración
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Configuración del gateway de pagos (Paypack)
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub poll_interval: Duration,
    pub poll_timeout: Duration,
}

/// Configuración de correo saliente
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from: String,
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub database_acquire_timeout: Duration,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub default_password: String,
    pub bcrypt_cost: u32,
    pub cors_origins: Vec<String>,
    pub log_level: String,
    pub payment: PaymentConfig,
    pub email: EmailConfig,
}

impl Default for EnvironmentConfig {
    /// Valores de desarrollo; `from_env` los sobreescribe
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            database_url: None,
            database_max_connections: 10,
            database_acquire_timeout: Duration::from_secs(10),
            jwt_secret: "development-secret-change-me".to_string(),
            jwt_expiration: 60 * 60 * 24 * 7,
            default_password: "ChangeMe@123".to_string(),
            bcrypt_cost: 12,
            cors_origins: Vec::new(),
            log_level: "info".to_string(),
            payment: PaymentConfig {
                base_url: "https://payments.paypack.rw/api".to_string(),
                client_id: String::new(),
                client_secret: String::new(),
                poll_interval: Duration::from_millis(2000),
                poll_timeout: Duration::from_secs(20),
            },
            email: EmailConfig {
                smtp_host: None,
                smtp_port: 587,
                smtp_username: String::new(),
                smtp_password: String::new(),
                from: "EduMove <info@feliexpress.com>".to_string(),
            },
        }
    }
}

fn var(key: &'static str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match var(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

impl EnvironmentConfig {
    /// Cargar la configuración desde variables de entorno
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let environment = var("ENVIRONMENT").unwrap_or(defaults.environment);

        let jwt_secret = match var("JWT_SECRET") {
            Some(secret) => secret,
            None if environment == "production" => return Err(ConfigError::Missing("JWT_SECRET")),
            None => defaults.jwt_secret,
        };

        let config = Self {
            port: parsed("PORT", defaults.port)?,
            host: var("HOST").unwrap_or(defaults.host),
            database_url: var("DATABASE_URL"),
            database_max_connections: parsed(
                "DB_MAX_CONNECTIONS",
                defaults.database_max_connections,
            )?,
            database_acquire_timeout: Duration::from_secs(parsed("DB_ACQUIRE_TIMEOUT_SECS", 10u64)?),
            jwt_secret,
            jwt_expiration: parsed("JWT_EXPIRATION", defaults.jwt_expiration)?,
            default_password: var("DEFAULT_PASSWORD").unwrap_or(defaults.default_password),
            bcrypt_cost: parsed("BCRYPT_COST", defaults.bcrypt_cost)?,
            cors_origins: var("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            log_level: var("LOG_LEVEL").unwrap_or(defaults.log_level),
            payment: PaymentConfig {
                base_url: var("PAYPACK_BASE_URL").unwrap_or(defaults.payment.base_url),
                client_id: var("PAYPACK_CLIENT_ID").unwrap_or_default(),
                client_secret: var("PAYPACK_CLIENT_SECRET").unwrap_or_default(),
                poll_interval: Duration::from_millis(parsed("PAYMENT_POLL_INTERVAL_MS", 2000u64)?),
                poll_timeout: Duration::from_secs(parsed("PAYMENT_POLL_TIMEOUT_SECS", 20u64)?),
            },
            email: EmailConfig {
                smtp_host: var("SMTP_HOST"),
                smtp_port: parsed("SMTP_PORT", defaults.email.smtp_port)?,
                smtp_username: var("SMTP_USERNAME").unwrap_or_default(),
                smtp_password: var("SMTP_PASSWORD").unwrap_or_default(),
                from: var("EMAIL_FROM").unwrap_or(defaults.email.from),
            },
            environment,
        };

        if config.is_production() && config.database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        Ok(config)
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Pool de PostgreSQL; `None` sin `DATABASE_URL`
    pub fn database_config(&self) -> Option<DatabaseConfig> {
        self.database_url.as_ref().map(|url| DatabaseConfig {
            url: url.clone(),
            max_connections: self.database_max_connections,
            acquire_timeout: self.database_acquire_timeout,
        })
    }

    /// Modo con el que se firman los cobros en el gateway
    pub fn payment_environment(&self) -> PaymentEnvironment {
        if self.is_production() {
            PaymentEnvironment::Production
        } else {
            PaymentEnvironment::Development
        }
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EnvironmentConfig::default();
        assert!(config.is_development());
        assert_eq!(config.payment.poll_timeout, Duration::from_secs(20));
        assert_eq!(config.server_url(), "0.0.0.0:3000");
        assert_eq!(config.payment_environment(), PaymentEnvironment::Development);
        assert!(config.database_config().is_none());
    }

    #[test]
    fn test_database_config_uses_pool_settings() {
        let config = EnvironmentConfig {
            database_url: Some("postgresql://localhost/school_transport".to_string()),
            database_max_connections: 4,
            ..EnvironmentConfig::default()
        };

        let database = config.database_config().unwrap();
        assert_eq!(database.url, "postgresql://localhost/school_transport");
        assert_eq!(database.max_connections, 4);
        assert_eq!(database.acquire_timeout, Duration::from_secs(10));
    }
}
