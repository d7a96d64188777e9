use std::{env, path::PathBuf};

use rust_decimal::Decimal;

pub const DEFAULT_NOTIFY_API_URL: &str = "https://api.callmebot.com/whatsapp.php";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub public_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub notify: NotifyConfig,
    pub checkout: CheckoutConfig,
}

/// Outbound order notifications. Both `api_key` and `admin_phone` must be set
/// for messages to leave the process.
#[derive(Debug, Clone, Default)]
pub struct NotifyConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub admin_phone: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    pub strict_totals: bool,
    pub total_tolerance: Decimal,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            strict_totals: false,
            total_tolerance: Decimal::new(1, 2),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let public_dir = env::var("PUBLIC_DIR").unwrap_or_else(|_| "public".to_string());
        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());

        let notify = NotifyConfig {
            api_url: env::var("NOTIFY_API_URL")
                .unwrap_or_else(|_| DEFAULT_NOTIFY_API_URL.to_string()),
            api_key: non_empty_var("NOTIFY_API_KEY"),
            admin_phone: non_empty_var("ADMIN_PHONE"),
        };

        let mut checkout = CheckoutConfig::default();
        if let Some(strict) = non_empty_var("STRICT_ORDER_TOTALS") {
            checkout.strict_totals = matches!(strict.as_str(), "1" | "true" | "yes");
        }
        if let Some(tolerance) = non_empty_var("ORDER_TOTAL_TOLERANCE") {
            checkout.total_tolerance = tolerance
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid ORDER_TOTAL_TOLERANCE: {e}"))?;
        }

        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret,
            public_dir: PathBuf::from(public_dir),
            upload_dir: PathBuf::from(upload_dir),
            notify,
            checkout,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
