use std::time::Duration;

use clap::Parser;

/// Resolve AWS SSO permission sets in the aws-auth ConfigMap into role ARNs
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(version, about)]
pub struct Config {
  /// Name of the source ConfigMap to read role mappings from
  #[arg(long = "src-configmap", env = "SRC_CONFIGMAP", default_value = "aws-auth")]
  pub src_configmap: String,

  /// Namespace of the source ConfigMap. Defaults to the namespace of the pod
  #[arg(long = "src-namespace", env = "SRC_NAMESPACE")]
  pub src_namespace: Option<String>,

  /// Name of the ConfigMap written after translation
  #[arg(long = "dst-configmap", env = "DST_CONFIGMAP", default_value = "aws-auth")]
  pub dst_configmap: String,

  /// Namespace of the destination ConfigMap
  #[arg(long = "dst-namespace", env = "DST_NAMESPACE", default_value = "kube-system")]
  pub dst_namespace: String,

  /// AWS region to use when interacting with IAM. Defaults to the AWS SDK region
  /// chain, then us-east-1
  #[arg(long = "aws-region")]
  pub aws_region: Option<String>,

  /// Seconds between two reconciliation passes
  #[arg(long, env = "SYNC_INTERVAL", default_value_t = 300, value_parser = clap::value_parser!(u64).range(1..))]
  pub interval: u64,

  /// Run a single reconciliation pass and exit
  #[arg(long)]
  pub once: bool,

  /// Enable debug logging
  #[arg(long)]
  pub debug: bool,
}

impl Config {
  pub fn interval(&self) -> Duration {
    Duration::from_secs(self.interval)
  }
}
