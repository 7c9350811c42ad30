//! # Places Bot Main Entry Point
//!
//! Initializes logging, loads configuration, prepares the database,
//! starts the poll scheduler and the health server, and runs the Telegram bot.

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use places_bot::bot::context::AppContext;
use places_bot::bot::handlers::BotHandler;
use places_bot::bot::transport::TelegramTransport;
use places_bot::config::Config;
use places_bot::database::connection::DatabaseManager;
use places_bot::services::health::HealthService;
use places_bot::services::scheduler::PollScheduler;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "places_bot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    info!("Starting Places Bot v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded - Database: {}, HTTP Port: {}, Poll chat: {}",
        config.database_url, config.http_port, config.poll_chat_id
    );

    info!("Initializing database connection...");
    let db_manager = DatabaseManager::new(&config.database_url).await?;
    db_manager.ensure_schema().await?;
    info!("Database initialized successfully");

    let bot = Bot::new(&config.telegram_bot_token);
    let transport = Arc::new(TelegramTransport::new(bot.clone(), config.request_timeout));
    let ctx = Arc::new(AppContext::from_config(db_manager, transport, &config));
    let handler = BotHandler::new(ctx.clone());
    info!("Telegram bot initialized successfully");

    let mut poll_scheduler = PollScheduler::new(
        ctx.polls.clone(),
        config.poll_send_cron.clone(),
        config.poll_tally_cron.clone(),
    )
    .await
    .map_err(|e| anyhow::anyhow!("Failed to create poll scheduler: {}", e))?;

    if let Err(e) = poll_scheduler.start().await {
        tracing::error!("Failed to start poll scheduler: {}", e);
    }

    let health_service = HealthService::new(ctx.clone());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.http_port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to port {}: {}", config.http_port, e))?;

    info!("Health check server starting on port {}", config.http_port);

    let bot_task = tokio::spawn(async move {
        Dispatcher::builder(bot, handler.schema())
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    });

    let health_task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, health_service.router).await {
            tracing::error!("Health server error: {}", e);
        }
    });

    tokio::select! {
        result = bot_task => {
            if let Err(e) = result {
                tracing::error!("Bot task error: {}", e);
            }
        }
        result = health_task => {
            if let Err(e) = result {
                tracing::error!("Health task error: {}", e);
            }
        }
    }

    if let Err(e) = poll_scheduler.stop().await {
        tracing::warn!("Error stopping poll scheduler: {}", e);
    }

    info!("Application stopped");
    Ok(())
}
