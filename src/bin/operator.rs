use anyhow::{bail, Context as _};
use clap::Parser;
use kube::{config::KubeConfigOptions, Client};
use log::{error, info};
use tokio::signal;

use operator::{sync, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let config = Config::parse();

  let level = if config.debug { "debug" } else { "info" };
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

  info!("Starting process...");

  let client = client().await?;
  let ctx = sync::Context::new(client, config).await;

  if let Err(e) = sync::run(&ctx, shutdown_signal()).await {
    error!("Reconciliation failed: {}", e);
    return Err(e).context("Reconciliation failed");
  }

  info!("Stopped");
  Ok(())
}

async fn client() -> anyhow::Result<Client> {
  // try load from env var which Terraform uses
  match Client::try_default().await {
    Ok(c) => Ok(c),
    _ => match std::env::var("KUBE_CTX") {
      Ok(ctx) => Client::try_from(
        kube::Config::from_kubeconfig(&KubeConfigOptions {
          context: Some(ctx),
          ..KubeConfigOptions::default()
        })
        .await?,
      )
      .context("Failed to load KUBE_CTX context"),

      _ => bail!("Failed to create client"),
    },
  }
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = signal::ctrl_c().await {
      error!("Failed to listen for Ctrl-C: {}", e);
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
      Ok(mut sig) => {
        sig.recv().await;
      }
      Err(e) => {
        error!("Failed to listen for SIGTERM: {}", e);
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {},
    _ = terminate => {},
  }
}
