use salvo::conn::TcpListener;
use salvo::{Listener, Router};
use cadence_app::app::api::routes;
use cadence_app::config::ConfigHandler;
use cadence_app::db_handler::DbProviderHandler;
use cadence_core::config::load_config;
use cadence_db::db::connection::{DbPool, create_pool};
use cadence_db::db::migrations::run_migrations;
use cadence_service::schedule::horizon::extend_horizons;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting Cadence scheduling server");

    let config = load_config()?;

    tracing::info!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping debug");
    }

    run_migrations(&config.database.url)?;

    let pool = create_pool(
        &config.database.url,
        u32::from(config.database.max_connections),
    )
    .await?;

    tracing::info!("Database connection pool created.");

    spawn_horizon_sweep(
        pool.clone(),
        config.scheduling.sweep_interval_secs,
        config.scheduling.max_instances_per_call,
        config.scheduling.default_lookahead_weeks,
    );

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let acceptor = TcpListener::new(bind_addr.clone()).bind().await;

    let router = Router::new()
        .hoop(DbProviderHandler { provider: pool })
        .hoop(ConfigHandler {
            settings: config.clone(),
        })
        .push(routes());

    tracing::info!("Server listening on {bind_addr}");

    salvo::Server::new(acceptor).serve(router).await;

    Ok(())
}

/// Periodic horizon sweep: keeps open-ended series materialized through
/// `now + lookahead` without ever blocking request handling.
fn spawn_horizon_sweep(
    pool: DbPool,
    interval_secs: u64,
    max_instances_per_call: u16,
    default_lookahead_weeks: u32,
) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
        loop {
            ticker.tick().await;
            let mut conn = match pool.get().await {
                Ok(c) => c,
                Err(err) => {
                    tracing::warn!(error = %err, "Horizon sweep could not get a connection");
                    continue;
                }
            };
            let today = chrono::Utc::now().date_naive();
            match extend_horizons(
                &mut conn,
                today,
                max_instances_per_call,
                default_lookahead_weeks,
            )
            .await
            {
                Ok(extensions) => {
                    tracing::debug!(series = extensions.len(), "Horizon sweep finished");
                }
                Err(err) => {
                    tracing::warn!(error = %err, "Horizon sweep failed; retrying next tick");
                }
            }
        }
    });
}
