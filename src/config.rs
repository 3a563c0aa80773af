use std::env;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub sla: SlaConfig,
    pub rate_limit: RateLimitConfig,
    pub mail: Option<MailConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    /// Lifetime of access tokens in minutes.
    pub access_expire_minutes: i64,
    /// Lifetime of refresh tokens in days.
    pub refresh_expire_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlaConfig {
    /// Hours an URGENT item may sit in SUBMITTED before the SLA breaches.
    pub urgent_response_hours: i64,
    /// Days an item may sit in UNDER_REVIEW without update before it is flagged stale.
    pub under_review_days: i64,
    /// Days before the vendor due date at which a pending response starts warning.
    pub vendor_warn_days: i64,
    /// Interval between background vendor SLA sweeps.
    pub sweep_interval_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Allowed requests per second (per IP) for auth endpoints (e.g. /auth/login)
    pub auth_per_second: u32,
    /// Burst size for auth endpoints
    pub auth_burst: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// Transactional mail HTTP API endpoint. Mail sending is disabled when unset.
    pub api_url: String,
    pub api_key: Option<String>,
    pub from_address: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mail = env::var("MAIL_API_URL").ok().map(|api_url| MailConfig {
            api_url,
            api_key: env::var("MAIL_API_KEY").ok(),
            from_address: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "no-reply@staffpulse.local".to_string()),
        });

        Ok(Config {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,
                frontend_url: env::var("FRONTEND_URL")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite://data/staffpulse.db".to_string()),
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            },
            jwt: JwtConfig {
                secret: env::var("JWT_SECRET")
                    .map_err(|_| ConfigError::MissingEnv("JWT_SECRET".to_string()))?,
                access_expire_minutes: env::var("JWT_EXPIRE_MIN")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .unwrap_or(30),
                refresh_expire_days: env::var("JWT_REFRESH_EXPIRE_DAYS")
                    .unwrap_or_else(|_| "7".to_string())
                    .parse()
                    .unwrap_or(7),
            },
            sla: SlaConfig {
                urgent_response_hours: env::var("URGENT_SLA_HOURS")
                    .unwrap_or_else(|_| "12".to_string())
                    .parse()
                    .unwrap_or(12),
                under_review_days: env::var("UNDER_REVIEW_SLA_DAYS")
                    .unwrap_or_else(|_| "3".to_string())
                    .parse()
                    .unwrap_or(3),
                vendor_warn_days: env::var("VENDOR_WARN_DAYS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
                sweep_interval_seconds: env::var("VENDOR_SWEEP_INTERVAL_SECONDS")
                    .unwrap_or_else(|_| "3600".to_string())
                    .parse()
                    .unwrap_or(3600),
            },
            rate_limit: RateLimitConfig {
                auth_per_second: env::var("RATE_LIMIT_AUTH_PER_SECOND")
                    .unwrap_or_else(|_| "3".to_string())
                    .parse()
                    .unwrap_or(3),
                auth_burst: env::var("RATE_LIMIT_AUTH_BURST")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
            },
            mail,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                frontend_url: "http://localhost:3000".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite://data/staffpulse.db".to_string(),
                max_connections: 5,
            },
            jwt: JwtConfig {
                secret: String::new(),
                access_expire_minutes: 30,
                refresh_expire_days: 7,
            },
            sla: SlaConfig {
                urgent_response_hours: 12,
                under_review_days: 3,
                vendor_warn_days: 5,
                sweep_interval_seconds: 3600,
            },
            rate_limit: RateLimitConfig {
                auth_per_second: 3,
                auth_burst: 10,
            },
            mail: None,
        }
    }
}
