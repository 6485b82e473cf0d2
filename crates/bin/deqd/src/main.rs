use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use deq_adapter_net::{NetProbe, UdpWakeSender};
use deq_adapter_ssh::SshShell;
use deqd::{Adapters, Config, Daemon};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    init_tracing(&config.logging.filter)?;

    let settings = config.settings();
    for name in settings.extensions.keys() {
        if deq_adapter_extensions::builtin(name).is_none() {
            tracing::warn!(extension = %name, "no such extension, table ignored");
        }
    }
    let extensions = deq_adapter_extensions::enabled(&settings);

    let adapters = Adapters {
        prober: NetProbe::from_settings(&settings.poller),
        shell: Arc::new(
            SshShell::new(config.ssh.clone(), &settings.actions)
                .context("failed to prepare ssh client")?,
        ),
        waker: Arc::new(UdpWakeSender::new(config.wake.clone())),
    };
    let daemon = Daemon::assemble(&config, adapters, &extensions).context("startup aborted")?;

    tracing::info!(
        devices = config.devices.len(),
        sections = daemon.scheduler().sections().len(),
        poll_interval_secs = settings.poller.interval_secs,
        render_interval_secs = settings.scheduler.interval_secs,
        "deqd started"
    );

    let cancel = CancellationToken::new();
    tokio::spawn(watch_signals(cancel.clone()));
    daemon.run(cancel).await;

    tracing::info!("deqd stopped");
    Ok(())
}

fn init_tracing(filter: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(filter).context("invalid logging filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

/// Cancel `token` on SIGINT or SIGTERM.
async fn watch_signals(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for ctrl-c");
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
                tracing::error!(%err, "failed to listen for SIGTERM");
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
    tracing::info!("shutdown requested");
    token.cancel();
}
