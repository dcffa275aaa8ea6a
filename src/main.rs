//! PR Reviewer Server - Main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use pr_reviewer_lib::api;
use pr_reviewer_lib::config::Config;
use pr_reviewer_lib::db::DbPool;
use pr_reviewer_lib::middleware;
use pr_reviewer_lib::repository::{CounterCache, MemoryCounterCache, RedisCounterCache};
use pr_reviewer_lib::services::AppServices;

/// Pick the counter store: Redis when configured, process memory otherwise.
async fn counter_cache(config: &Config) -> std::io::Result<Arc<dyn CounterCache>> {
    match config.redis_url.as_deref() {
        Some(url) => {
            let cache = RedisCounterCache::connect(url)
                .await
                .map_err(|e| std::io::Error::other(format!("Failed to connect to Redis: {}", e)))?;
            info!("Assignment counters stored in Redis");
            Ok(Arc::new(cache))
        }
        None => {
            warn!("REDIS_URL not set, assignment counters are kept in memory");
            Ok(Arc::new(MemoryCounterCache::new()))
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, DATABASE_URL and REDIS_URL must be set");
            error!("  - In production, values must not match development defaults");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  PR Reviewer Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
        info!("Using development defaults for DATABASE_URL");
    }

    let pool = DbPool::new(&config)
        .await
        .map_err(|e| std::io::Error::other(format!("Failed to connect to database: {}", e)))?;
    info!("Database connection established");

    if config.run_migrations {
        pool.run_migrations()
            .await
            .map_err(|e| std::io::Error::other(format!("Failed to run migrations: {}", e)))?;
        info!("Database migrations complete");
    } else {
        info!("Skipping migrations (PRR_RUN_MIGRATIONS=false)");
    }

    let counters = counter_cache(&config).await?;
    let services = AppServices::postgres(pool, counters);

    let bind_address = config.bind_address();
    info!("Starting server at http://{}", bind_address);

    HttpServer::new(move || {
        App::new()
            // Add request logging middleware
            .wrap(middleware::RequestLogger)
            // Add shared state
            .app_data(web::Data::new(services.clone()))
            .app_data(api::json_config())
            .app_data(api::query_config())
            // Configure API routes
            .configure(api::configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
