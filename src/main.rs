mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod middleware;
mod models;
mod routes;
mod service;
mod utils;

use std::sync::Arc;

use config::Config;
use dotenv::dotenv;
use routes::create_router;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::filter::LevelFilter;

use crate::db::db::{DBClient, MarketStore};
use service::{
    auction_service::AuctionService,
    audit_service::AuditService,
    background_jobs::start_auction_expiry_job,
    broadcast_service::BroadcastService,
    conversation_service::ConversationService,
    messaging::{MessageSender, TwilioSender},
    notification_service::NotificationService,
    sweeper_service::SweeperService,
};

#[derive(Clone)]
pub struct AppState {
    pub env: Config,
    // Services
    pub notification_service: Arc<NotificationService>,
    pub auction_service: Arc<AuctionService>,
    pub conversation_service: Arc<ConversationService>,
    pub sweeper_service: Arc<SweeperService>,
}

impl AppState {
    pub fn new(store: Arc<dyn MarketStore>, sender: Arc<dyn MessageSender>, config: Config) -> Self {
        let settings = config.market.clone();

        let notification_service = Arc::new(NotificationService::new(sender, settings.clone()));
        let audit_service = Arc::new(AuditService::new(store.clone()));
        let broadcast_service = Arc::new(BroadcastService::new(
            notification_service.clone(),
            settings.clone(),
        ));

        let auction_service = Arc::new(AuctionService::new(
            store.clone(),
            notification_service.clone(),
            broadcast_service.clone(),
            audit_service.clone(),
            settings.clone(),
        ));

        let conversation_service = Arc::new(ConversationService::new(
            store.clone(),
            auction_service.clone(),
            notification_service.clone(),
        ));

        let sweeper_service = Arc::new(SweeperService::new(
            store,
            auction_service.clone(),
            settings,
        ));

        Self {
            env: config,
            notification_service,
            auction_service,
            conversation_service,
            sweeper_service,
        }
    }
}

fn level_filter(level: &str) -> LevelFilter {
    level.parse::<LevelFilter>().unwrap_or(LevelFilter::DEBUG)
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let config = Config::init();

    tracing_subscriber::fmt()
        .with_max_level(level_filter(&config.log_level))
        .init();

    let pool = match PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            tracing::info!("✅ Connection to the database is successful!");
            pool
        }
        Err(err) => {
            tracing::error!("🔥 Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = sqlx::migrate!("./migrations").run(&pool).await {
        tracing::error!("🔥 Failed to run database migrations: {:?}", err);
        std::process::exit(1);
    }

    let db_client = DBClient::new(pool);
    tracing::debug!("Store ready: {:?}", db_client);

    let sender: Arc<dyn MessageSender> = Arc::new(TwilioSender::new(&config));
    let app_state = Arc::new(AppState::new(Arc::new(db_client), sender, config.clone()));

    if !config.sweep_interval.is_zero() {
        let app_state_clone = app_state.clone();
        tokio::spawn(async move {
            start_auction_expiry_job(app_state_clone).await;
        });
        tracing::info!(
            "Auction expiry sweeper running every {}s",
            config.sweep_interval.as_secs()
        );
    }

    let app = create_router(app_state.clone());

    tracing::info!("🚀 Server is running on http://localhost:{}", config.port);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("🔥 Failed to bind port {}: {:?}", config.port, err);
            std::process::exit(1);
        }
    };

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("🔥 Server error: {:?}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_parsing_falls_back_to_debug() {
        assert_eq!(level_filter("info"), LevelFilter::INFO);
        assert_eq!(level_filter("WARN"), LevelFilter::WARN);
        assert_eq!(level_filter("chatty"), LevelFilter::DEBUG);
    }
}
