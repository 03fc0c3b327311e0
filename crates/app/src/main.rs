use std::{sync::Arc, time::Duration};

use clap::Parser;
use engine::{Engine, cache::MokaCache, ledger::SeaOrmLedger, rates::HttpRateSource};
use migration::{Migrator, MigratorTrait};

mod settings;

#[derive(Parser, Debug)]
#[command(name = "wallet")]
#[command(about = "Wallet balance service")]
struct Cli {
    /// Settings file, without the `.toml` extension.
    #[arg(long, env = "WALLET_SETTINGS", default_value = "settings")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = settings::Settings::new(&cli.config)?;

    let filter = format!(
        "wallet={level},server={level},engine={level},migration={level}",
        level = settings.app.level
    );
    if settings.app.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let db = parse_database(&settings.database).await?;
    let rates = HttpRateSource::new(
        settings.rates.url.as_str(),
        Duration::from_secs(settings.rates.timeout_secs),
    )?;
    let engine = Engine::builder()
        .ledger(Arc::new(SeaOrmLedger::new(db)))
        .cache(Arc::new(MokaCache::new(settings.cache.capacity)))
        .rates(Arc::new(rates))
        .balance_ttl(Duration::from_secs(settings.cache.balance_ttl_secs))
        .rate_ttl(Duration::from_secs(settings.cache.rate_ttl_secs))
        .max_conflict_retries(settings.engine.max_conflict_retries)
        .build()
        .await?;

    let addr = format!("{}:{}", settings.server.bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
    let (_, mut handle) = server::spawn_with_listener(Arc::new(engine), listener, async move {
        let _ = stopped.await;
    })?;

    tokio::select! {
        () = shutdown_signal() => {}
        _ = &mut handle => {
            tracing::error!("server exited unexpectedly");
            return Ok(());
        }
    }

    tracing::info!("shutting down...");
    let _ = stop.send(());
    let timeout = Duration::from_secs(settings.server.shutdown_timeout_secs);
    if tokio::time::timeout(timeout, handle).await.is_err() {
        tracing::warn!("in-flight requests did not finish within {timeout:?}");
    }

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let database = sea_orm::Database::connect(config.url.as_str()).await?;
    if config.run_migrations {
        Migrator::up(&database, None).await?;
    }
    Ok(database)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
