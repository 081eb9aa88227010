//! Campus Nerds Backend Service
//!
//! Main entry point for the Campus Nerds backend.
//! This service provides:
//! - HTTP functions for friend sync, group confirmation and auto-grouping
//! - ECPay checkout and payment notifications
//! - Facebook data deletion callback
//! - Optional in-process auto-grouping schedule

use campus_nerds_backend::api;
use campus_nerds_backend::config::AppConfig;
use campus_nerds_backend::database::{create_pool, run_migrations};
use campus_nerds_backend::error::{AppError, AppResult};
use campus_nerds_backend::services::AutoGroupingScheduler;
use campus_nerds_backend::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load environment variables first
    dotenv::dotenv().ok();

    // Load configuration
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        AppError::Config(e)
    })?;

    init_tracing(&config);

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║           Campus Nerds Backend Starting                  ║");
    info!("╚══════════════════════════════════════════════════════════╝");
    info!("Environment: {}", config.environment);
    info!("Log level: {}", config.log_level);
    info!("HTTP port: {}", config.http_port);
    info!("ECPay environment: {}", config.ecpay.env);
    if config.supabase.service_role_key.is_empty() {
        warn!("SUPABASE_SERVICE_ROLE_KEY not set - admin routes will reject every request");
    }

    // =========================================================================
    // DATABASE SETUP
    // =========================================================================
    let pool = create_pool(&config.database).await.map_err(|e| {
        error!("Failed to create database pool: {}", e);
        AppError::Database(e)
    })?;

    info!("Database connection pool created successfully");

    // Run migrations
    info!("Running database migrations...");
    run_migrations(&pool, None).await.map_err(|e| {
        error!("Database migration failed: {}", e);
        AppError::Database(e)
    })?;

    info!("Database migrations completed successfully");

    // =========================================================================
    // SERVICES
    // =========================================================================
    let http_port = config.http_port;
    let environment = config.environment.clone();
    let auto_grouping_interval = config.auto_grouping_interval_secs.map(Duration::from_secs);

    let app_state = Arc::new(AppState::new(pool, config));
    info!("✓ Application state initialized with repositories and services");

    // =========================================================================
    // BACKGROUND TASKS
    // =========================================================================
    let scheduler_handle = match auto_grouping_interval {
        Some(interval) => {
            let scheduler = AutoGroupingScheduler::new(app_state.auto_grouping.clone(), interval);
            info!("✓ Auto-grouping scheduler started ({:?} interval)", interval);
            Some(tokio::spawn(async move {
                scheduler.start().await;
            }))
        }
        None => {
            info!("AUTO_GROUPING_INTERVAL_SECS not set - auto-grouping runs via /run-auto-grouping only");
            None
        }
    };

    // =========================================================================
    // START SERVER
    // =========================================================================
    let addr: SocketAddr = format!("0.0.0.0:{}", http_port)
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid HTTP address: {}", e)))?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Message(format!("Failed to bind HTTP server: {}", e)))?;

    let app = api::router(app_state);

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║           Campus Nerds Backend Ready!                    ║");
    info!("╠══════════════════════════════════════════════════════════╣");
    info!("║  HTTP API:     0.0.0.0:{}{}", http_port, api::FUNCTIONS_PREFIX);
    info!("║  Environment:  {}", environment);
    info!("╚══════════════════════════════════════════════════════════╝");
    info!("Press Ctrl+C to shutdown gracefully");

    // =========================================================================
    // SHUTDOWN HANDLING
    // =========================================================================
    let server = async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
    };

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("HTTP server error: {}", e);
                return Err(AppError::Message(format!("HTTP server error: {}", e)));
            }
        }
        _ = async {
            if let Some(handle) = scheduler_handle {
                handle.await.ok();
            } else {
                // Never completes if the scheduler is not running
                futures::future::pending::<()>().await;
            }
        } => {
            error!("Auto-grouping scheduler exited unexpectedly");
        }
    }

    info!("Campus Nerds backend shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "campus_nerds_backend={},sqlx=warn,tower_http=info",
            config.log_level
        )
        .into()
    });

    if config.is_production() {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            futures::future::pending::<()>().await;
        }
        info!("Shutdown signal received, shutting down gracefully...");
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                futures::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = futures::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
