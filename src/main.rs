use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use ssm_param_injector::config::Config;
use ssm_param_injector::injector::Injector;
use ssm_param_injector::resolver::SsmParameterStore;
use ssm_param_injector::webhook::{serve_probes, TlsConfig, WebhookServer};
use ssm_param_injector::telemetry;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    config.validate()?;

    telemetry::init_tracing(config.log_format)?;
    let result = run(config).await;

    // Flush any remaining traces
    telemetry::shutdown_tracing();
    result
}

async fn run(config: Config) -> anyhow::Result<()> {
    info!(
        "Starting SSM Param Injector v{}",
        env!("CARGO_PKG_VERSION")
    );

    let store = SsmParameterStore::from_env(config.aws_region.clone()).await;
    let injector = Injector::new(Arc::new(store)).with_request_timeout(config.request_timeout());

    let mut server = WebhookServer::new(injector);
    if config.insecure {
        warn!("TLS disabled, serving the webhook over plain HTTP");
    } else {
        server = server.with_tls(TlsConfig::from_cert_dir(&config.cert_dir));
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match wait_for_signal().await {
            Ok(()) => {
                info!("Shutdown signal received");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                warn!("Failed to listen for shutdown signals: {e}");
                // Keep the sender alive; dropping it would stop the servers.
                std::future::pending::<()>().await;
            }
        }
    });

    tokio::try_join!(
        async {
            server
                .start(config.socket_addr(), shutdown_rx.clone())
                .await
                .context("webhook server failed")
        },
        async {
            serve_probes(config.health_addr(), shutdown_rx.clone())
                .await
                .context("health probe server failed")
        },
    )?;

    info!("SSM Param Injector stopped");
    Ok(())
}

async fn wait_for_signal() -> std::io::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    debug!("created unix signal handlers");

    tokio::select! {
        _ = sigint.recv() => debug!("received SIGINT"),
        _ = sigterm.recv() => debug!("received SIGTERM"),
    }
    Ok(())
}
