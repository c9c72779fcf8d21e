use std::env;

use chrono::Duration;
use log::*;
use ofg_common::{parse_boolean_flag, Money, Secret};

use crate::errors::ServerError;

const DEFAULT_OFG_HOST: &str = "127.0.0.1";
const DEFAULT_OFG_PORT: u16 = 8480;
const DEFAULT_REVIEW_REQUEST_DELAY_HOURS: i64 = 72;
const DEFAULT_AMOUNT_TOLERANCE_CENTS: i64 = 1;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Payment processor webhook configuration.
    pub payment: PaymentWebhookConfig,
    /// Secret for verifying storefront checkout webhooks.
    pub storefront_hmac_secret: Secret<String>,
    /// Secret for verifying vendor webhooks.
    pub vendor_hmac_secret: Secret<String>,
    /// The API key admins must present in the `ofg-api-key` header on `/api` routes.
    pub admin_api_key: Secret<String>,
    /// Paid amounts within this distance of the order total are considered a match.
    pub amount_tolerance: Money,
    /// How long after delivery the review request goes out.
    pub review_request_delay: Duration,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
}

#[derive(Clone, Debug, Default)]
pub struct PaymentWebhookConfig {
    pub hmac_secret: Secret<String>,
    /// If false, the payment webhook signature is not checked. Only ever set this in development.
    pub hmac_checks: bool,
    /// The exact public URL the processor posts to. It is part of the signed payload, so a mismatch here makes
    /// every signature check fail.
    pub notification_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_OFG_HOST.to_string(),
            port: DEFAULT_OFG_PORT,
            database_url: String::default(),
            payment: PaymentWebhookConfig { hmac_checks: true, ..Default::default() },
            storefront_hmac_secret: Secret::default(),
            vendor_hmac_secret: Secret::default(),
            admin_api_key: Secret::default(),
            amount_tolerance: Money::from_cents(DEFAULT_AMOUNT_TOLERANCE_CENTS),
            review_request_delay: Duration::hours(DEFAULT_REVIEW_REQUEST_DELAY_HOURS),
            use_x_forwarded_for: false,
            use_forwarded: false,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("OFG_HOST").ok().unwrap_or_else(|| DEFAULT_OFG_HOST.into());
        let port = env::var("OFG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for OFG_PORT. {e} Using the default, {DEFAULT_OFG_PORT}, instead."
                    );
                    DEFAULT_OFG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_OFG_PORT);
        let database_url = env::var("OFG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ OFG_DATABASE_URL is not set. Please set it to the URL for the fulfillment database.");
            String::default()
        });
        let payment = PaymentWebhookConfig::from_env_or_defaults();
        let storefront_hmac_secret = secret_from_env("OFG_STOREFRONT_HMAC_SECRET");
        let vendor_hmac_secret = secret_from_env("OFG_VENDOR_HMAC_SECRET");
        let admin_api_key = secret_from_env("OFG_ADMIN_API_KEY");
        let amount_tolerance = env::var("OFG_AMOUNT_TOLERANCE_CENTS")
            .ok()
            .and_then(|s| {
                s.parse::<i64>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for OFG_AMOUNT_TOLERANCE_CENTS. {e}"))
                    .ok()
            })
            .map(Money::from_cents)
            .unwrap_or_else(|| Money::from_cents(DEFAULT_AMOUNT_TOLERANCE_CENTS));
        let review_request_delay = env::var("OFG_REVIEW_REQUEST_DELAY_HOURS")
            .map_err(|_| {
                info!(
                    "🪛️ OFG_REVIEW_REQUEST_DELAY_HOURS is not set. Using the default value of \
                     {DEFAULT_REVIEW_REQUEST_DELAY_HOURS} hrs."
                )
            })
            .and_then(|s| {
                s.parse::<i64>()
                    .map(Duration::hours)
                    .map_err(|e| warn!("🪛️ Invalid configuration value for OFG_REVIEW_REQUEST_DELAY_HOURS. {e}"))
            })
            .ok()
            .unwrap_or_else(|| Duration::hours(DEFAULT_REVIEW_REQUEST_DELAY_HOURS));
        let use_x_forwarded_for = parse_boolean_flag(env::var("OFG_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("OFG_USE_FORWARDED").ok(), false);
        Self {
            host,
            port,
            database_url,
            payment,
            storefront_hmac_secret,
            vendor_hmac_secret,
            admin_api_key,
            amount_tolerance,
            review_request_delay,
            use_x_forwarded_for,
            use_forwarded,
        }
    }

    /// Refuses to start a server whose payment webhook would accept unsigned requests by accident.
    ///
    /// Signature checks on the payment webhook are only skipped when OFG_PAYMENT_HMAC_CHECKS is explicitly switched
    /// off. An enabled check with no secret is a misconfiguration, not a development mode.
    pub fn assert_ready_for_payments(&self) -> Result<(), ServerError> {
        if self.payment.hmac_checks {
            if self.payment.hmac_secret.is_empty() {
                return Err(ServerError::ConfigurationError(
                    "OFG_PAYMENT_HMAC_SECRET is not set, but payment signature checks are enabled. Set the secret, \
                     or explicitly disable checks with OFG_PAYMENT_HMAC_CHECKS=0 (never in production)."
                        .to_string(),
                ));
            }
            if self.payment.notification_url.is_empty() {
                return Err(ServerError::ConfigurationError(
                    "OFG_PAYMENT_NOTIFICATION_URL is not set. The processor signs the notification URL together \
                     with the body, so signature checks cannot work without it."
                        .to_string(),
                ));
            }
        } else {
            warn!(
                "🚨️🚨️🚨️ Payment webhook signature checks are DISABLED. Anybody who can reach this server can mark \
                 orders as paid. Do not run production like this. 🚨️🚨️🚨️"
            );
        }
        if self.storefront_hmac_secret.is_empty() {
            warn!("🚨️ OFG_STOREFRONT_HMAC_SECRET is not set. Checkout webhooks will not be authenticated.");
        }
        if self.vendor_hmac_secret.is_empty() {
            warn!("🚨️ OFG_VENDOR_HMAC_SECRET is not set. Vendor webhooks will not be authenticated.");
        }
        if self.admin_api_key.is_empty() {
            warn!("🚨️ OFG_ADMIN_API_KEY is not set. All /api requests will be rejected.");
        }
        Ok(())
    }
}

impl PaymentWebhookConfig {
    pub fn from_env_or_defaults() -> Self {
        let hmac_secret = secret_from_env("OFG_PAYMENT_HMAC_SECRET");
        let hmac_checks = parse_boolean_flag(env::var("OFG_PAYMENT_HMAC_CHECKS").ok(), true);
        let notification_url = env::var("OFG_PAYMENT_NOTIFICATION_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ OFG_PAYMENT_NOTIFICATION_URL is not set.");
            String::default()
        });
        Self { hmac_secret, hmac_checks, notification_url }
    }
}

fn secret_from_env(name: &str) -> Secret<String> {
    let value = env::var(name).unwrap_or_else(|_| {
        info!("🪛️ {name} is not set.");
        String::default()
    });
    Secret::new(value)
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep
/// this as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Copy, Debug)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}
