use std::env;

use crate::payments::StripeConfig;
use crate::supabase::SupabaseConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub base_url: String,
    /// `APP_ENV=production` disables reconciliation and marks cookies Secure
    pub production: bool,
    pub supabase: SupabaseConfig,
    pub stripe: StripeConfig,
    pub resend_api_key: Option<String>,
    pub resend_api_base: String,
    pub email_from: String,
    /// Lowercased admin allow-list
    pub admin_emails: Vec<String>,
    pub default_currency: String,
    pub static_dir: Option<String>,
    pub log_json: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

/// Parse a comma-separated allow-list into trimmed, lowercased entries.
pub fn parse_admin_emails(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let production = env::var("APP_ENV")
            .map(|v| v == "production" || v == "prod")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let base_url = env::var("BASE_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| format!("http://{}:{}", host, port));

        let supabase = SupabaseConfig {
            url: required("SUPABASE_URL")?.trim_end_matches('/').to_string(),
            anon_key: required("SUPABASE_ANON_KEY")?,
            service_role_key: required("SUPABASE_SERVICE_ROLE_KEY")?,
            jwt_secret: required("SUPABASE_JWT_SECRET")?,
            storage_bucket: env::var("STORAGE_BUCKET")
                .unwrap_or_else(|_| "package-images".to_string()),
        };

        let stripe = StripeConfig {
            secret_key: required("STRIPE_SECRET_KEY")?,
            webhook_secret: required("STRIPE_WEBHOOK_SECRET")?,
            api_base: env::var("STRIPE_API_BASE")
                .unwrap_or_else(|_| "https://api.stripe.com".to_string()),
        };

        Ok(Self {
            host,
            port,
            base_url,
            production,
            supabase,
            stripe,
            resend_api_key: env::var("RESEND_API_KEY").ok().filter(|k| !k.is_empty()),
            resend_api_base: env::var("RESEND_API_BASE")
                .unwrap_or_else(|_| "https://api.resend.com".to_string()),
            email_from: env::var("EMAIL_FROM").unwrap_or_else(|_| "noreply@localhost".to_string()),
            admin_emails: parse_admin_emails(&env::var("ADMIN_EMAILS").unwrap_or_default()),
            default_currency: env::var("DEFAULT_CURRENCY")
                .map(|c| c.to_lowercase())
                .unwrap_or_else(|_| "gbp".to_string()),
            static_dir: env::var("STATIC_DIR").ok(),
            log_json: env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Case-insensitive membership test against the admin allow-list.
    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        !email.is_empty() && self.admin_emails.iter().any(|a| *a == email)
    }
}
