use std::{future::Future, time::Duration};

use log::{debug, info};
use tokio::time::MissedTickBehavior;

use crate::{aws, kubernetes, translate, Config, Result};

/// Clients and configuration shared by every reconciliation pass
pub struct Context {
  pub kube: kube::Client,
  pub iam: aws_sdk_iam::Client,
  pub sts: aws_sdk_sts::Client,
  pub config: Config,
}

impl Context {
  pub async fn new(kube: kube::Client, config: Config) -> Self {
    let sdk_config = aws::sdk_config(config.aws_region.as_deref()).await;
    Context {
      kube,
      iam: aws_sdk_iam::Client::new(&sdk_config),
      sts: aws_sdk_sts::Client::new(&sdk_config),
      config,
    }
  }
}

/// Read the source ConfigMap, resolve its permission sets and write the destination ConfigMap
pub async fn run_pass(ctx: &Context) -> Result<()> {
  let config = &ctx.config;

  let src_namespace = match &config.src_namespace {
    Some(ns) => ns.clone(),
    None => kubernetes::current_namespace(&ctx.kube).await,
  };

  let source = kubernetes::get_config_map(&ctx.kube, &src_namespace, &config.src_configmap).await?;
  let mappings = kubernetes::decode_role_mappings(source.data.as_ref())?;
  debug!("Read {} role mappings from {}/{}", mappings.len(), src_namespace, config.src_configmap);

  let roles = aws::list_sso_roles(&ctx.iam).await?;
  let account_id = aws::account_id(&ctx.sts).await?;

  let updated = translate::reconcile(&mappings, &roles, &account_id)?;

  let data = kubernetes::encode_role_mappings(source.data.as_ref(), &updated)?;
  kubernetes::set_config_map(&ctx.kube, &config.dst_namespace, &config.dst_configmap, data).await
}

/// Run `ctx` passes on the configured schedule until `shutdown` resolves
pub async fn run<F>(ctx: &Context, shutdown: F) -> Result<()>
where
  F: Future<Output = ()>,
{
  schedule(ctx.config.interval(), ctx.config.once, shutdown, || run_pass(ctx)).await
}

/// Call `pass` right away and then once per `period`.
///
/// A pass is never interrupted: `shutdown` is only observed between passes, and a
/// pass that overruns the period delays the next tick instead of stacking up.
pub async fn schedule<F, P, Fut>(period: Duration, once: bool, shutdown: F, mut pass: P) -> Result<()>
where
  F: Future<Output = ()>,
  P: FnMut() -> Fut,
  Fut: Future<Output = Result<()>>,
{
  if once {
    return pass().await;
  }

  let mut interval = tokio::time::interval(period);
  interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
  tokio::pin!(shutdown);

  loop {
    tokio::select! {
      biased;
      _ = &mut shutdown => {
        info!("Shutdown requested, stopping reconciliation");
        return Ok(());
      }
      _ = interval.tick() => {
        info!("Starting reconciliation pass");
        pass().await?;
        info!("Reconciliation pass finished, next in {:?}", period);
      }
    }
  }
}
