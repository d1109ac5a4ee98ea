use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("permission set {0} not found in AWS IAM service")]
  PermissionSetNotFound(String),
  #[error("Invalid role name pattern: {0}")]
  Pattern(#[from] regex::Error),
  #[error("ConfigMap {name} not found in namespace {namespace}")]
  ConfigMapNotFound { namespace: String, name: String },
  #[error("STS caller identity has no account")]
  MissingAccountId,
  #[error("Kube error: {0:?}")]
  KubeError(#[from] kube::Error),
  #[error("Yaml error: {0:?}")]
  YamlError(#[from] serde_yaml::Error),
  #[error("Json error: {0:?}")]
  JsonError(#[from] serde_json::Error),
  #[error("IAM error: {0}")]
  IamError(#[from] aws_sdk_iam::Error),
  #[error("STS error: {0}")]
  StsError(#[from] aws_sdk_sts::Error),
}
