use std::sync::Arc;

use eventrouter::manufacture_sinks;
use eventrouter::metrics;
use eventrouter::utils::file_io::create_dir_if_not_exist;
use eventrouter::Error;
use eventrouter::EventRouter;
use eventrouter::JsonLinesSource;
use eventrouter::LoggingConfig;
use eventrouter::Result;
use eventrouter::RouterConfig;
use eventrouter::SinkClients;
use tokio::io::BufReader;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    let settings = RouterConfig::new()?.validate()?;

    // Initializing Logs
    let _guard = init_observability(&settings.logging)?;

    // Initializing Shutdown Signal
    let stop = CancellationToken::new();
    tokio::spawn({
        let stop = stop.clone();
        async move {
            if let Err(e) = graceful_shutdown(stop).await {
                error!("Failed to shutdown: {:?}", e);
            }
        }
    });

    // Build Router
    let sinks = manufacture_sinks(&settings.sinks, &SinkClients::default())?;
    let router = Arc::new(EventRouter::new(sinks, settings.enable_prometheus));
    info!(sinks = ?router.sink_names(), "event router started, reading watch notifications from stdin");

    // Watch feed: end of input stops the router as well
    let feed = tokio::spawn({
        let router = router.clone();
        let stop = stop.clone();
        async move {
            let source = JsonLinesSource::new(BufReader::new(tokio::io::stdin()));
            let result = source.run(router, stop.clone()).await;
            stop.cancel();
            result
        }
    });

    if let Err(e) = router.run(stop.clone()).await {
        error!("event router stops: {:?}", e);
    }
    if let Err(e) = feed.await? {
        error!("watch feed stops: {:?}", e);
    }

    if settings.enable_prometheus {
        debug!("final metrics:\n{}", metrics::render()?);
    }
    info!("Exiting program.");
    Ok(())
}

async fn graceful_shutdown(stop: CancellationToken) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
        _ = stop.cancelled() => {
            return Ok(());
        },
    }

    info!("Shutdown router..");
    stop.cancel();
    Ok(())
}

pub fn init_observability(logging: &LoggingConfig) -> Result<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (writer, guard) = match &logging.log_dir {
        Some(log_dir) => {
            create_dir_if_not_exist(log_dir)?;
            tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, "eventrouter.log"))
        }
        None => tracing_appender::non_blocking(std::io::stdout()),
    };

    let layer = if logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .with_filter(filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_filter(filter)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| Error::Fatal(format!("failed to install log subscriber: {e}")))?;

    Ok(guard)
}
