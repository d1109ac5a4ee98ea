use std::collections::BTreeMap;

use json_patch::{AddOperation, PatchOperation, ReplaceOperation, TestOperation};
use k8s_openapi::{api::core::v1::ConfigMap, apimachinery::pkg::apis::meta::v1::ObjectMeta};
use kube::{
  api::{Api, Patch, PatchParams, PostParams},
  Client,
};
use log::{debug, info};

use crate::{Error, Result, RoleMapping};

/// Key of the aws-auth ConfigMap holding the role mappings
pub const MAP_ROLES_KEY: &str = "mapRoles";

const NAMESPACE_FILE: &str = "/var/run/secrets/kubernetes.io/serviceaccount/namespace";

/// Namespace the pod runs in, or the client's default namespace outside of a pod
pub async fn current_namespace(client: &Client) -> String {
  info!("Getting current namespace");

  let namespace = match tokio::fs::read_to_string(NAMESPACE_FILE).await {
    Ok(ns) => ns.trim().to_string(),
    Err(e) => {
      debug!("Failed to read {}: {}, using client default namespace", NAMESPACE_FILE, e);
      client.default_namespace().to_string()
    }
  };

  debug!("Current namespace: {}", namespace);
  namespace
}

pub async fn get_config_map(client: &Client, namespace: &str, name: &str) -> Result<ConfigMap> {
  info!("Retrieving ConfigMap {} from namespace {}", name, namespace);

  let api = Api::<ConfigMap>::namespaced(client.clone(), namespace);
  let cm = api.get_opt(name).await?.ok_or_else(|| Error::ConfigMapNotFound {
    namespace: namespace.to_string(),
    name: name.to_string(),
  })?;

  info!("Successfully retrieved ConfigMap {} from namespace {}", name, namespace);
  Ok(cm)
}

/// Create the ConfigMap with `data`, or replace the data of the existing one
pub async fn set_config_map(
  client: &Client,
  namespace: &str,
  name: &str,
  data: BTreeMap<String, String>,
) -> Result<()> {
  info!("Setting ConfigMap {} in namespace {}", name, namespace);

  let api = Api::<ConfigMap>::namespaced(client.clone(), namespace);

  match api.get_opt(name).await? {
    None => {
      let cm = ConfigMap {
        metadata: ObjectMeta {
          name: Some(name.to_string()),
          namespace: Some(namespace.to_string()),
          ..ObjectMeta::default()
        },
        data: Some(data),
        ..ConfigMap::default()
      };
      api.create(&PostParams::default(), &cm).await?;
    }
    Some(existing) => {
      if existing.data.as_ref() == Some(&data) {
        info!("ConfigMap {} in namespace {} is up to date", name, namespace);
        return Ok(());
      }
      api
        .patch(
          name,
          &PatchParams::default(),
          &Patch::<()>::Json(data_patch(existing.data.as_ref(), &data)?),
        )
        .await?;
    }
  }

  info!("Successfully set ConfigMap {} in namespace {}", name, namespace);
  Ok(())
}

/// JSON patch replacing `/data`, guarded by a test against the data last read
fn data_patch(
  current: Option<&BTreeMap<String, String>>,
  data: &BTreeMap<String, String>,
) -> Result<json_patch::Patch> {
  let value = serde_json::to_value(data)?;

  let ops = match current {
    Some(current) => vec![
      PatchOperation::Test(TestOperation {
        path: "/data".to_string(),
        value: serde_json::to_value(current)?,
      }),
      PatchOperation::Replace(ReplaceOperation {
        path: "/data".to_string(),
        value,
      }),
    ],
    None => vec![PatchOperation::Add(AddOperation {
      path: "/data".to_string(),
      value,
    })],
  };

  Ok(json_patch::Patch(ops))
}

/// Role mappings stored in the `mapRoles` key; a missing, blank or null key is an empty list
pub fn decode_role_mappings(data: Option<&BTreeMap<String, String>>) -> Result<Vec<RoleMapping>> {
  match data.and_then(|d| d.get(MAP_ROLES_KEY)) {
    Some(map_roles) if !map_roles.trim().is_empty() => {
      let mappings: Option<Vec<RoleMapping>> = serde_yaml::from_str(map_roles)?;
      Ok(mappings.unwrap_or_default())
    }
    _ => Ok(Vec::new()),
  }
}

/// Copy of `data` with `mapRoles` replaced by `mappings`
pub fn encode_role_mappings(
  data: Option<&BTreeMap<String, String>>,
  mappings: &[RoleMapping],
) -> Result<BTreeMap<String, String>> {
  let mut data = data.cloned().unwrap_or_default();
  data.insert(MAP_ROLES_KEY.to_string(), serde_yaml::to_string(mappings)?);
  Ok(data)
}
