#![doc = include_str!("../README.md")]

mod server;

use anyhow::Context;
use clap::Parser;
use nextid::{
    AtomicSnowflakeGenerator, LockSnowflakeGenerator, MonotonicClock, SnowflakeGenerator,
    SystemClock,
};
use server::config::{ClockKind, CliArgs, GeneratorKind, ServerConfig};
use server::service::handler::{AppState, router};
use server::telemetry::init_telemetry;
use tokio::net::TcpListener;
use tokio::signal;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    let providers = init_telemetry(config.log_format)?;

    let result = match (config.generator_kind, config.clock_kind) {
        (GeneratorKind::Lock, ClockKind::System) => {
            run_server::<LockSnowflakeGenerator<SystemClock>>(SystemClock, config).await
        }
        (GeneratorKind::Lock, ClockKind::Monotonic) => {
            run_server::<LockSnowflakeGenerator<MonotonicClock>>(MonotonicClock::new(), config)
                .await
        }
        (GeneratorKind::Atomic, ClockKind::System) => {
            run_server::<AtomicSnowflakeGenerator<SystemClock>>(SystemClock, config).await
        }
        (GeneratorKind::Atomic, ClockKind::Monotonic) => {
            run_server::<AtomicSnowflakeGenerator<MonotonicClock>>(MonotonicClock::new(), config)
                .await
        }
    };

    // Exporters flush even when the server exits with an error.
    providers.shutdown();
    result
}

async fn run_server<G>(time: G::Time, config: ServerConfig) -> anyhow::Result<()>
where
    G: SnowflakeGenerator + Send + Sync + 'static,
{
    // An epoch in the future or an already exhausted timestamp range aborts
    // startup here.
    let generator = G::new(config.generator.clone(), time).context("failed to build generator")?;
    let app = router(AppState::new(generator, config.request_timeout));

    let listener = TcpListener::bind(config.server_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server_addr))?;
    log_startup_info(&config);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shut down successfully");
    Ok(())
}

fn log_startup_info(config: &ServerConfig) {
    if cfg!(debug_assertions) {
        tracing::info!(
            "Starting ID service on {} with full config: {:#?}",
            config.server_addr,
            config
        );
    } else {
        tracing::info!(
            "Starting ID service on {} as machine {} ({:?} generator, {:?} clock)",
            config.server_addr,
            config.generator.machine_id(),
            config.generator_kind,
            config.clock_kind,
        );
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(%err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }

    tracing::info!("Shutdown signal received, terminating gracefully...");
}
