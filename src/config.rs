use std::env;
use std::str::FromStr;

/// Runtime configuration, read once from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub cors_origins: Vec<String>,
    pub auth: AuthConfig,
    pub capacity: CapacityConfig,
    pub payment: PaymentConfig,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub token_ttl_hours: i64,
}

/// Follower capacity rules for staff members.
#[derive(Debug, Clone, Copy)]
pub struct CapacityConfig {
    /// Followers every staff member accepts without approval
    pub base_capacity: u64,
    /// Extra slots granted by one approved capacity increase
    pub batch_size: u64,
}

/// Details printed in the manual payment message.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub amount: u64,
    pub currency: String,
    pub phone: String,
    pub upi_id: String,
    pub bank_name: String,
    pub account_number: String,
    pub ifsc: String,
    pub account_holder: String,
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            base_capacity: 50,
            batch_size: 50,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "default-secret-change-me".to_string(),
            jwt_issuer: "swapknowledge".to_string(),
            jwt_audience: "swapknowledge-api".to_string(),
            token_ttl_hours: 24,
        }
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            amount: 500,
            currency: "INR".to_string(),
            phone: "+91 90000 00000".to_string(),
            upi_id: "swapknowledge@upi".to_string(),
            bank_name: "State Bank of India".to_string(),
            account_number: "00000000000".to_string(),
            ifsc: "SBIN0000000".to_string(),
            account_holder: "SwapKnowledge".to_string(),
        }
    }
}

impl AppConfig {
    /// Build the configuration from environment variables.
    ///
    /// Only `DATABASE_URL` is mandatory; everything else has a default.
    pub fn from_env() -> Result<Self, String> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let auth_defaults = AuthConfig::default();
        let capacity_defaults = CapacityConfig::default();
        let payment_defaults = PaymentConfig::default();

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host: env_or("HOST", "0.0.0.0".to_string()),
            port: env_parse("PORT", 5000),
            database_url,
            cors_origins,
            auth: AuthConfig {
                jwt_secret: env_or("JWT_SECRET", auth_defaults.jwt_secret),
                jwt_issuer: env_or("JWT_ISSUER", auth_defaults.jwt_issuer),
                jwt_audience: env_or("JWT_AUDIENCE", auth_defaults.jwt_audience),
                token_ttl_hours: env_parse("JWT_TTL_HOURS", auth_defaults.token_ttl_hours),
            },
            capacity: CapacityConfig {
                base_capacity: env_parse("BASE_FOLLOWER_CAPACITY", capacity_defaults.base_capacity),
                batch_size: env_parse("BATCH_SIZE", capacity_defaults.batch_size),
            },
            payment: PaymentConfig {
                amount: env_parse("PAYMENT_AMOUNT", payment_defaults.amount),
                currency: env_or("PAYMENT_CURRENCY", payment_defaults.currency),
                phone: env_or("PAYMENT_PHONE", payment_defaults.phone),
                upi_id: env_or("PAYMENT_UPI_ID", payment_defaults.upi_id),
                bank_name: env_or("PAYMENT_BANK_NAME", payment_defaults.bank_name),
                account_number: env_or("PAYMENT_ACCOUNT_NUMBER", payment_defaults.account_number),
                ifsc: env_or("PAYMENT_IFSC", payment_defaults.ifsc),
                account_holder: env_or("PAYMENT_ACCOUNT_HOLDER", payment_defaults.account_holder),
            },
        })
    }
}

fn env_or(key: &str, default: String) -> String {
    env::var(key).unwrap_or(default)
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                log::warn!("⚠️  Invalid value for {}: '{}', using {}", key, raw, default);
                default
            }
        },
        Err(_) => default,
    }
}
