use serde::{Deserialize, Serialize};

pub mod aws;
pub mod config;
mod error;
pub mod kubernetes;
pub mod sync;
pub mod translate;

pub use config::Config;
pub use error::{Error, Result};
pub use translate::{reconcile, remove_path_from_role_arn, translate_permission_set};

/// A single `mapRoles` entry of the aws-auth ConfigMap, optionally referring to an
/// SSO permission set instead of a concrete role
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RoleMapping {
  /// ARN of the AWS Role, e.g. `arn:aws:iam::000000000000:role/Foo`
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub rolearn: String,
  /// Name of the SSO permission set to resolve into `rolearn`
  #[serde(default, rename = "permissionSet", skip_serializing_if = "String::is_empty")]
  pub permission_set: String,
  /// Username inside kube
  #[serde(default)]
  pub username: String,
  /// Groups in kube
  #[serde(default)]
  pub groups: Vec<String>,
  /// AWS PrincipalId of the role
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub userid: String,
}

/// The parts of an IAM role needed to resolve permission sets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IamRole {
  pub name: String,
  pub path: String,
  pub arn: String,
}
