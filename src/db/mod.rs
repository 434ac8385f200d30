pub mod queries;

use std::sync::Arc;

use crate::config::Config;
use crate::email::EmailService;
use crate::payments::StripeClient;
use crate::supabase::SupabaseClient;

/// Shared handler state. Holds only clients and configuration; all durable
/// state lives in the managed backend.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: SupabaseClient,
    pub stripe: StripeClient,
    pub email: EmailService,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let db = SupabaseClient::new(config.supabase.clone());
        let stripe = StripeClient::new(&config.stripe);
        let email = EmailService::new(
            config.resend_api_key.clone(),
            config.resend_api_base.clone(),
            config.email_from.clone(),
        );
        Self {
            config: Arc::new(config),
            db,
            stripe,
            email,
        }
    }
}
