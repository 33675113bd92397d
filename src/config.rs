use crate::error::{AppError, AppResult};
use serde::Deserialize;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub database_url: String,
    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub database_min_connections: u32,
    #[serde(default = "default_connection_timeout")]
    pub database_connection_timeout: u64,

    pub redis_url: String,
    #[serde(default = "default_redis_channel_prefix")]
    pub redis_channel_prefix: String,

    #[serde(default = "default_host")]
    pub server_host: String,
    #[serde(default = "default_port")]
    pub server_port: u16,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_access_token_expires")]
    pub jwt_access_token_expires_in: u64,
    #[serde(default = "default_refresh_token_expires")]
    pub jwt_refresh_token_expires_in: u64,
    #[serde(default = "default_download_link_expires")]
    pub download_link_expires_in: u64,

    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,

    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,

    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<String>,
    pub twilio_from_number: Option<String>,
    #[serde(default = "default_twilio_api_url")]
    pub twilio_api_url: String,

    #[serde(default = "default_exchange_rate_api_url")]
    pub exchange_rate_api_url: String,
    #[serde(default = "default_base_currency")]
    pub exchange_rate_base_currency: String,
    #[serde(default = "default_exchange_rate_sync_interval")]
    pub exchange_rate_sync_interval_secs: u64,
    #[serde(default = "default_true")]
    pub exchange_rate_sync_enabled: bool,

    #[serde(default = "default_annual_discount_percent")]
    pub billing_annual_discount_percent: u32,
    #[serde(default = "default_base_currency")]
    pub billing_currency: String,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Clone, Debug)]
pub struct RedisConfig {
    pub url: String,
    pub channel_prefix: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_expires_in: u64,
    pub refresh_token_expires_in: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Clone, Debug)]
pub struct SmsConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    pub api_url: String,
}

#[derive(Clone, Debug)]
pub struct ExchangeRateConfig {
    pub api_url: String,
    pub base_currency: String,
    pub sync_interval_secs: u64,
    pub sync_enabled: bool,
}

#[derive(Clone, Debug)]
pub struct BillingConfig {
    pub annual_discount_percent: u32,
    pub currency: String,
}

// Default value functions
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    5
}
fn default_connection_timeout() -> u64 {
    30
}
fn default_redis_channel_prefix() -> String {
    "pmis".to_string()
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_jwt_secret() -> String {
    "your-secret-key".to_string()
}
fn default_access_token_expires() -> u64 {
    3600
} // 1 hour
fn default_refresh_token_expires() -> u64 {
    604800
} // 7 days
fn default_download_link_expires() -> u64 {
    900
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_bcrypt_cost() -> u32 {
    12
}
fn default_twilio_api_url() -> String {
    "https://api.twilio.com/2010-04-01".to_string()
}
fn default_exchange_rate_api_url() -> String {
    "https://api.frankfurter.app".to_string()
}
fn default_base_currency() -> String {
    "USD".to_string()
}
fn default_exchange_rate_sync_interval() -> u64 {
    3600
}
fn default_true() -> bool {
    true
}
fn default_annual_discount_percent() -> u32 {
    15
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let config = envy::from_env::<Config>()
            .map_err(|e| AppError::Config(format!("Failed to load config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.database_max_connections == 0 {
            return Err(AppError::Config(
                "DATABASE_MAX_CONNECTIONS must be > 0".to_string(),
            ));
        }

        if self.database_min_connections > self.database_max_connections {
            return Err(AppError::Config(
                "DATABASE_MIN_CONNECTIONS cannot be greater than DATABASE_MAX_CONNECTIONS"
                    .to_string(),
            ));
        }

        if self.jwt_secret == "your-secret-key" || self.jwt_secret.len() < 32 {
            return Err(AppError::Config(
                "JWT_SECRET must be set to a secure value of at least 32 characters".to_string(),
            ));
        }

        if self.jwt_access_token_expires_in == 0 {
            return Err(AppError::Config(
                "JWT_ACCESS_TOKEN_EXPIRES_IN must be > 0".to_string(),
            ));
        }

        if self.jwt_refresh_token_expires_in <= self.jwt_access_token_expires_in {
            return Err(AppError::Config(
                "JWT_REFRESH_TOKEN_EXPIRES_IN must exceed JWT_ACCESS_TOKEN_EXPIRES_IN".to_string(),
            ));
        }

        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(AppError::Config("BCRYPT_COST must be between 4 and 31".to_string()));
        }

        if self.exchange_rate_sync_interval_secs == 0 {
            return Err(AppError::Config(
                "EXCHANGE_RATE_SYNC_INTERVAL_SECS must be > 0".to_string(),
            ));
        }

        for (name, code) in [
            ("EXCHANGE_RATE_BASE_CURRENCY", &self.exchange_rate_base_currency),
            ("BILLING_CURRENCY", &self.billing_currency),
        ] {
            if crate::validation::rules::validate_currency_code(code).is_err() {
                return Err(AppError::Config(format!(
                    "{} must be a three-letter ISO-4217 code",
                    name
                )));
            }
        }

        if self.billing_annual_discount_percent >= 100 {
            return Err(AppError::Config(
                "BILLING_ANNUAL_DISCOUNT_PERCENT must be < 100".to_string(),
            ));
        }

        let twilio_parts = [
            self.twilio_account_sid.is_some(),
            self.twilio_auth_token.is_some(),
            self.twilio_from_number.is_some(),
        ];
        if twilio_parts.iter().any(|set| *set) && !twilio_parts.iter().all(|set| *set) {
            return Err(AppError::Config(
                "TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN and TWILIO_FROM_NUMBER must be set together"
                    .to_string(),
            ));
        }

        Ok(())
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.database_url.clone(),
            max_connections: self.database_max_connections,
            min_connections: self.database_min_connections,
            connection_timeout: self.database_connection_timeout,
        }
    }

    pub fn redis(&self) -> RedisConfig {
        RedisConfig {
            url: self.redis_url.clone(),
            channel_prefix: self.redis_channel_prefix.clone(),
        }
    }

    pub fn server(&self) -> ServerConfig {
        ServerConfig {
            host: self.server_host.clone(),
            port: self.server_port,
            cors_origins: self.cors_origins.clone(),
        }
    }

    pub fn auth(&self) -> AuthConfig {
        AuthConfig {
            jwt_secret: self.jwt_secret.clone(),
            access_token_expires_in: self.jwt_access_token_expires_in,
            refresh_token_expires_in: self.jwt_refresh_token_expires_in,
        }
    }

    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.log_level.clone(),
            format: self.log_format.clone(),
        }
    }

    /// Twilio settings, or `None` when SMS delivery is not configured.
    pub fn sms(&self) -> Option<SmsConfig> {
        match (
            &self.twilio_account_sid,
            &self.twilio_auth_token,
            &self.twilio_from_number,
        ) {
            (Some(sid), Some(token), Some(from)) => Some(SmsConfig {
                account_sid: sid.clone(),
                auth_token: token.clone(),
                from_number: from.clone(),
                api_url: self.twilio_api_url.clone(),
            }),
            _ => None,
        }
    }

    pub fn exchange_rates(&self) -> ExchangeRateConfig {
        ExchangeRateConfig {
            api_url: self.exchange_rate_api_url.clone(),
            base_currency: self.exchange_rate_base_currency.to_ascii_uppercase(),
            sync_interval_secs: self.exchange_rate_sync_interval_secs,
            sync_enabled: self.exchange_rate_sync_enabled,
        }
    }

    pub fn billing(&self) -> BillingConfig {
        BillingConfig {
            annual_discount_percent: self.billing_annual_discount_percent,
            currency: self.billing_currency.to_ascii_uppercase(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A config that passes validation, for tests across the crate.
    pub(crate) fn valid_config() -> Config {
        Config {
            database_url: "postgres://localhost/pmis_test".to_string(),
            database_max_connections: default_max_connections(),
            database_min_connections: default_min_connections(),
            database_connection_timeout: default_connection_timeout(),
            redis_url: "redis://127.0.0.1/".to_string(),
            redis_channel_prefix: default_redis_channel_prefix(),
            server_host: default_host(),
            server_port: default_port(),
            cors_origins: default_cors_origins(),
            jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
            jwt_access_token_expires_in: default_access_token_expires(),
            jwt_refresh_token_expires_in: default_refresh_token_expires(),
            download_link_expires_in: default_download_link_expires(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            bcrypt_cost: 4,
            twilio_account_sid: None,
            twilio_auth_token: None,
            twilio_from_number: None,
            twilio_api_url: default_twilio_api_url(),
            exchange_rate_api_url: default_exchange_rate_api_url(),
            exchange_rate_base_currency: default_base_currency(),
            exchange_rate_sync_interval_secs: default_exchange_rate_sync_interval(),
            exchange_rate_sync_enabled: true,
            billing_annual_discount_percent: default_annual_discount_percent(),
            billing_currency: default_base_currency(),
        }
    }

    #[test]
    fn accepts_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn rejects_default_jwt_secret() {
        let mut config = valid_config();
        config.jwt_secret = default_jwt_secret();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_min_connections_above_max() {
        let mut config = valid_config();
        config.database_min_connections = 50;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_partial_twilio_settings() {
        let mut config = valid_config();
        config.twilio_account_sid = Some("AC123".to_string());
        assert!(config.validate().is_err());
        assert!(config.sms().is_none());

        config.twilio_auth_token = Some("token".to_string());
        config.twilio_from_number = Some("+15550001111".to_string());
        assert!(config.validate().is_ok());
        assert!(config.sms().is_some());
    }

    #[test]
    fn rejects_bad_currency_and_zero_interval() {
        let mut config = valid_config();
        config.exchange_rate_base_currency = "DOLLAR".to_string();
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.exchange_rate_sync_interval_secs = 0;
        assert!(config.validate().is_err());
    }
}
