// config.rs
use std::time::Duration;

/// Marketplace tunables. Built once at startup and cloned into services.
#[derive(Debug, Clone)]
pub struct MarketSettings {
    /// Bidding window opened by the first accepted bid.
    pub auction_wait: Duration,
    /// Bid count that closes an auction before its deadline.
    pub bids_limit: i64,
    /// How long a broadcast job may sit without any bid before the sweeper cancels it.
    pub no_bid_timeout: Duration,
    pub broadcast_batch_size: usize,
    pub broadcast_pause: Duration,
    pub draft_retention: Duration,
    pub audit_retention: Duration,
    pub job_offer_template: Option<String>,
    pub rating_template: Option<String>,
}

impl Default for MarketSettings {
    fn default() -> Self {
        Self {
            auction_wait: Duration::from_secs(30 * 60),
            bids_limit: 3,
            no_bid_timeout: Duration::from_secs(6 * 3600),
            broadcast_batch_size: 10,
            broadcast_pause: Duration::from_millis(1000),
            draft_retention: Duration::from_secs(48 * 3600),
            audit_retention: Duration::from_secs(90 * 24 * 3600),
            job_offer_template: None,
            rating_template: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub log_level: String,
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_from_number: String,
    pub cron_secret: String,
    /// Zero disables the in-process sweeper loop.
    pub sweep_interval: Duration,
    pub market: MarketSettings,
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let twilio_account_sid =
            std::env::var("TWILIO_ACCOUNT_SID").expect("TWILIO_ACCOUNT_SID must be set");
        let twilio_auth_token =
            std::env::var("TWILIO_AUTH_TOKEN").expect("TWILIO_AUTH_TOKEN must be set");
        let twilio_from_number =
            std::env::var("TWILIO_FROM_NUMBER").expect("TWILIO_FROM_NUMBER must be set");
        let cron_secret = std::env::var("CRON_SECRET").expect("CRON_SECRET must be set");

        let port = env_or("PORT", 8000u16);
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "debug".to_string());

        let defaults = MarketSettings::default();
        let market = MarketSettings {
            auction_wait: Duration::from_secs(env_or(
                "AUCTION_WAIT_SECS",
                defaults.auction_wait.as_secs(),
            )),
            bids_limit: env_or("BIDS_LIMIT", defaults.bids_limit),
            no_bid_timeout: Duration::from_secs(env_or(
                "NO_BID_TIMEOUT_SECS",
                defaults.no_bid_timeout.as_secs(),
            )),
            broadcast_batch_size: env_or("BROADCAST_BATCH_SIZE", defaults.broadcast_batch_size)
                .max(1),
            broadcast_pause: Duration::from_millis(env_or("BROADCAST_PAUSE_MS", 1000u64)),
            draft_retention: Duration::from_secs(env_or("DRAFT_RETENTION_HOURS", 48u64) * 3600),
            audit_retention: Duration::from_secs(
                env_or("AUDIT_RETENTION_DAYS", 90u64) * 24 * 3600,
            ),
            job_offer_template: std::env::var("JOB_OFFER_TEMPLATE_SID").ok(),
            rating_template: std::env::var("RATING_TEMPLATE_SID").ok(),
        };

        Config {
            database_url,
            port,
            log_level,
            twilio_account_sid,
            twilio_auth_token,
            twilio_from_number,
            cron_secret,
            sweep_interval: Duration::from_secs(env_or("SWEEP_INTERVAL_SECS", 0u64)),
            market,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Config {
        Config {
            database_url: "postgres://localhost/cleanmatch_test".to_string(),
            port: 0,
            log_level: "debug".to_string(),
            twilio_account_sid: "ACtest".to_string(),
            twilio_auth_token: "token".to_string(),
            twilio_from_number: "+14155238886".to_string(),
            cron_secret: "sweep-secret".to_string(),
            sweep_interval: Duration::ZERO,
            market: MarketSettings {
                broadcast_pause: Duration::ZERO,
                ..MarketSettings::default()
            },
        }
    }
}
