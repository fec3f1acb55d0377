use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;

use crate::payroll::service::EngineSettings;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,

    // Rate limiting
    pub rate_protected_per_min: u32,
    pub rate_payroll_per_min: u32,

    pub api_prefix: String,
    pub log_level: String,

    pub account_cache_ttl_secs: u64,
    pub authority_keyword_fallback: bool,
    pub reject_inactive_at_approval: bool,
    pub reconcile_grace_secs: i64,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn or_default<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,

            rate_protected_per_min: or_default("RATE_PROTECTED_PER_MIN", 1000)?,
            rate_payroll_per_min: or_default("RATE_PAYROLL_PER_MIN", 30)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api/v1".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "debug".to_string()),

            account_cache_ttl_secs: or_default("ACCOUNT_CACHE_TTL_SECS", 300)?,
            authority_keyword_fallback: or_default("AUTHORITY_KEYWORD_FALLBACK", true)?,
            reject_inactive_at_approval: or_default("PAYROLL_REJECT_INACTIVE_AT_APPROVAL", false)?,
            reconcile_grace_secs: or_default("PAYROLL_RECONCILE_GRACE_SECS", 300)?,
        })
    }

    /// `LOG_LEVEL` as a subscriber filter; a bad directive stops startup.
    pub fn log_filter(&self) -> Result<EnvFilter> {
        EnvFilter::try_new(&self.log_level)
            .with_context(|| format!("LOG_LEVEL has an invalid directive '{}'", self.log_level))
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            account_cache_ttl: std::time::Duration::from_secs(self.account_cache_ttl_secs),
            keyword_fallback: self.authority_keyword_fallback,
            reject_inactive_at_approval: self.reject_inactive_at_approval,
            reconcile_grace: chrono::Duration::seconds(self.reconcile_grace_secs),
        }
    }
}
