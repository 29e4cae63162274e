//! Housy Booking Server - Main Application Entry Point
//!
//! REST backend for a house-rental marketplace. It manages house listings
//! and booking transactions, opens checkout sessions with the Snap payment
//! gateway, and applies the gateway's payment notifications, emailing the
//! guest when a payment settles.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Payments**: Snap HTTP API via reqwest
//! - **Mail**: SMTP via lettre
//! - **Format**: JSON responses in a `{code, data}` / `{code, message}` envelope
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations
//! 4. Build repositories, gateway client, mailer and services
//! 5. Build HTTP router and start server on configured port

mod config;
mod db;
mod error;
mod handlers;
mod models;
mod repositories;
mod routes;
mod services;
mod state;

#[cfg(test)]
mod test_support;

use std::{sync::Arc, time::Duration};

use tracing_subscriber::EnvFilter;

use crate::{
    repositories::{PgHouseRepository, PgTransactionRepository},
    routes::HttpOptions,
    services::{
        mailer::SmtpMailer,
        notification_service::{NotificationSender, NotificationService},
        payment_gateway::SnapGateway,
        retry::RetryPolicy,
        transaction_id::TransactionIdGenerator,
        transaction_service::BookingService,
        upload::UploadStore,
    },
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG, defaults to "info"
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    let pool = db::create_pool(&config.database_url, config.database_max_connections).await?;
    tracing::info!("Database pool created");

    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    let houses = Arc::new(PgHouseRepository::new(pool.clone()));
    let transactions = Arc::new(PgTransactionRepository::new(pool));

    let gateway = SnapGateway::new(
        config.payment_base_url.clone(),
        config.payment_server_key.clone(),
        Duration::from_secs(config.payment_timeout_secs),
    )?;

    let mailer = SmtpMailer::new(
        &config.smtp_host,
        config.smtp_port,
        &config.smtp_username,
        &config.smtp_password,
        &config.mail_sender,
    )?;

    let sender = NotificationSender::new(
        Arc::new(mailer),
        transactions.clone(),
        RetryPolicy::new(
            config.mail_retry_attempts,
            Duration::from_millis(config.mail_retry_delay_ms),
        ),
    );

    let signature_key = if config.payment_verify_signature {
        Some(config.payment_server_key.clone())
    } else {
        tracing::warn!("payment notification signatures are NOT verified");
        None
    };

    let state = AppState {
        houses: houses.clone(),
        transactions: transactions.clone(),
        bookings: BookingService::new(
            houses,
            transactions.clone(),
            Arc::new(gateway),
            TransactionIdGenerator::system(),
        ),
        notifications: NotificationService::new(transactions, sender, signature_key),
        uploads: UploadStore::new(&config.upload_dir, config.static_base_url.clone()),
    };

    let app = routes::router(state, &HttpOptions::from_config(&config))?;

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
