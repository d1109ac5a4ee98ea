use aws_config::{meta::region::RegionProviderChain, BehaviorVersion, SdkConfig};
use aws_sdk_iam::types::Role;
use aws_types::region::Region;
use log::{debug, info};

use crate::{Error, IamRole, Result};

/// IAM path under which AWS SSO creates the roles of its permission sets
pub const SSO_ROLE_PATH_PREFIX: &str = "/aws-reserved/sso.amazonaws.com/";

const PAGE_SIZE: i32 = 10;

/// Region used when neither the configuration nor the environment names one
pub const DEFAULT_REGION: &str = "us-east-1";

/// The configured region first, then the SDK's default chain, then [`DEFAULT_REGION`]
fn region_provider(region: Option<&str>) -> RegionProviderChain {
  RegionProviderChain::first_try(region.map(|r| Region::new(r.to_owned())))
    .or_default_provider()
    .or_else(Region::new(DEFAULT_REGION))
}

/// Get the configuration to authn/authz with AWS that will be used across AWS clients
pub async fn sdk_config(region: Option<&str>) -> SdkConfig {
  aws_config::defaults(BehaviorVersion::latest())
    .region(region_provider(region))
    .load()
    .await
}

impl From<&Role> for IamRole {
  fn from(role: &Role) -> Self {
    IamRole {
      name: role.role_name().to_string(),
      path: role.path().to_string(),
      arn: role.arn().to_string(),
    }
  }
}

/// List every role created by AWS SSO
pub async fn list_sso_roles(client: &aws_sdk_iam::Client) -> Result<Vec<IamRole>> {
  info!("Retrieving SSO roles from AWS IAM...");

  let mut pages = client
    .list_roles()
    .path_prefix(SSO_ROLE_PATH_PREFIX)
    .into_paginator()
    .page_size(PAGE_SIZE)
    .send();

  let mut roles = Vec::new();
  let mut page_num = 0;
  while let Some(page) = pages.next().await {
    page_num += 1;
    debug!("Paginating through IAM Roles (page {})...", page_num);
    let page = page.map_err(aws_sdk_iam::Error::from)?;
    roles.extend(page.roles().iter().map(IamRole::from));
  }

  info!("{} SSO roles retrieved from AWS IAM", roles.len());
  Ok(roles)
}

/// Id of the AWS account the credentials belong to
pub async fn account_id(client: &aws_sdk_sts::Client) -> Result<String> {
  debug!("Reading AWS Account ID...");

  let identity = client
    .get_caller_identity()
    .send()
    .await
    .map_err(aws_sdk_sts::Error::from)?;
  let account = identity.account().ok_or(Error::MissingAccountId)?.to_string();

  debug!("Retrieved {} as AWS Account ID", account);
  Ok(account)
}
