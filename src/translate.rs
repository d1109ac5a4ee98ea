use log::{debug, info, warn};
use regex::Regex;

use crate::{Error, IamRole, Result, RoleMapping};

/// Token in a role ARN replaced by the AWS account id
pub const ACCOUNT_ID_TOKEN: &str = "$ACCOUNTID";

/// Resolve the permission set of `mapping` to the ARN of its `AWSReservedSSO_` role.
///
/// The returned mapping has `rolearn` set (with the role path removed) and
/// `permission_set` cleared. `mapping` itself is left untouched.
pub fn translate_permission_set(mapping: &RoleMapping, roles: &[IamRole]) -> Result<RoleMapping> {
  debug!("Translating {} permission set to ARN", mapping.permission_set);

  // e.g. AWSReservedSSO_devops_07572db8b73986b8
  let pattern = Regex::new(&format!(
    "^AWSReservedSSO_{}_[[:alnum:]]{{16}}$",
    regex::escape(&mapping.permission_set)
  ))?;

  let role = roles
    .iter()
    .find(|r| pattern.is_match(&r.name))
    .ok_or_else(|| Error::PermissionSetNotFound(mapping.permission_set.clone()))?;

  debug!(
    "Found IAM role {} with ARN {} which matches {} permission set",
    role.name, role.arn, mapping.permission_set
  );

  Ok(RoleMapping {
    rolearn: remove_path_from_role_arn(&role.arn, &role.path),
    permission_set: String::new(),
    ..mapping.clone()
  })
}

/// Collapse the path of a role inside its ARN, so
/// `arn:aws:iam::1:role/aws-reserved/sso.amazonaws.com/x` becomes `arn:aws:iam::1:role/x`
pub fn remove_path_from_role_arn(arn: &str, path: &str) -> String {
  if path.is_empty() {
    return arn.to_string();
  }
  arn.replace(path, "/")
}

/// Resolve every permission set in `mappings`, dropping the ones without a matching role.
///
/// Entries that already carry a role ARN are kept, with `$ACCOUNTID` substituted by
/// `account_id`. Order is preserved.
pub fn reconcile(mappings: &[RoleMapping], roles: &[IamRole], account_id: &str) -> Result<Vec<RoleMapping>> {
  info!("Translating permissionSets to RoleARNs in RoleMappings...");

  let mut updated = Vec::with_capacity(mappings.len());

  for mapping in mappings {
    if mapping.permission_set.is_empty() || !mapping.rolearn.is_empty() {
      let mut mapping = mapping.clone();
      // A role ARN takes precedence; the leftover permission set is dropped rather than
      // passed through so that no reconciled entry still carries one.
      if !mapping.permission_set.is_empty() {
        debug!(
          "Role Mapping {} already has a role ARN, ignoring permission set {}",
          mapping.rolearn, mapping.permission_set
        );
        mapping.permission_set.clear();
      }
      if mapping.rolearn.contains(ACCOUNT_ID_TOKEN) {
        info!("Replacing {} with actual account ID", ACCOUNT_ID_TOKEN);
        mapping.rolearn = mapping.rolearn.replace(ACCOUNT_ID_TOKEN, account_id);
      } else {
        debug!("Role Mapping does not need to be translated: {:?}", mapping);
      }
      updated.push(mapping);
      continue;
    }

    match translate_permission_set(mapping, roles) {
      Ok(translated) => {
        debug!("Role Mapping successfully translated: {:?}", translated);
        updated.push(translated);
      }
      Err(Error::PermissionSetNotFound(name)) => {
        warn!(
          "Role that would correspond to {} permission set not found. Removing mapping for {:?} from the list",
          name, mapping.username
        );
      }
      Err(e) => return Err(e),
    }
  }

  info!(
    "Translation finished: {} of {} role mappings kept",
    updated.len(),
    mappings.len()
  );
  Ok(updated)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn role(name: &str, path: &str) -> IamRole {
    IamRole {
      name: name.to_string(),
      path: path.to_string(),
      arn: format!("arn:aws:iam::123456789012:role{}{}", path, name),
    }
  }

  fn permission_set(name: &str) -> RoleMapping {
    RoleMapping {
      permission_set: name.to_string(),
      ..RoleMapping::default()
    }
  }

  #[test]
  fn removes_path_from_role_arn() {
    assert_eq!(
      remove_path_from_role_arn(
        "arn:aws:iam::123456789012:role/aws-reserved/sso.amazonaws.com/eu-west-1/roleName",
        "/aws-reserved/sso.amazonaws.com/eu-west-1/"
      ),
      "arn:aws:iam::123456789012:role/roleName"
    );
  }

  #[test]
  fn keeps_arn_when_path_is_absent() {
    let arn = "arn:aws:iam::123456789012:role/aws-reserved/sso.amazonaws.com/eu-west-1/roleName";
    assert_eq!(remove_path_from_role_arn(arn, "/path/"), arn);
    assert_eq!(remove_path_from_role_arn(arn, ""), arn);
  }

  #[test]
  fn path_is_matched_literally() {
    // `.` must not match any character
    let arn = "arn:aws:iam::123456789012:role/aws-reserved/ssoXamazonaws.com/roleName";
    assert_eq!(remove_path_from_role_arn(arn, "/aws-reserved/sso.amazonaws.com/"), arn);
  }

  #[test]
  fn translates_existing_permission_set() {
    let roles = vec![role("AWSReservedSSO_devops_0123456789abcdef", "/path/")];

    let got = translate_permission_set(&permission_set("devops"), &roles).unwrap();

    assert_eq!(
      got,
      RoleMapping {
        rolearn: "arn:aws:iam::123456789012:role/AWSReservedSSO_devops_0123456789abcdef".to_string(),
        ..RoleMapping::default()
      }
    );
  }

  #[test]
  fn missing_permission_set_is_not_found() {
    let roles = vec![role("AWSReservedSSO_sre_0123456789abcdef", "/path/")];

    let err = translate_permission_set(&permission_set("devops"), &roles).unwrap_err();

    assert!(matches!(err, Error::PermissionSetNotFound(ref name) if name == "devops"));
    assert_eq!(err.to_string(), "permission set devops not found in AWS IAM service");
  }

  #[test]
  fn role_name_must_match_exactly() {
    let roles = vec![
      role("AWSReservedSSO_devops-admin_0123456789abcdef", "/p/"),
      role("AWSReservedSSO_devops_0123456789abcde", "/p/"),
      role("AWSReservedSSO_devops_0123456789abcdef0", "/p/"),
      role("xAWSReservedSSO_devops_0123456789abcdef", "/p/"),
      role("AWSReservedSSO_devops_0123456789abcd-f", "/p/"),
    ];

    assert!(translate_permission_set(&permission_set("devops"), &roles).is_err());
  }

  #[test]
  fn permission_set_name_is_not_a_pattern() {
    let roles = vec![role("AWSReservedSSO_devops_0123456789abcdef", "/p/")];

    assert!(translate_permission_set(&permission_set("dev.ps"), &roles).is_err());
    assert!(translate_permission_set(&permission_set("dev(ops"), &roles).is_err());
  }

  #[test]
  fn substitutes_account_id() {
    let mappings = vec![RoleMapping {
      rolearn: "arn:aws:iam::$ACCOUNTID:role/$ACCOUNTID-admin".to_string(),
      username: "admin".to_string(),
      groups: vec!["system:masters".to_string()],
      ..RoleMapping::default()
    }];

    let got = reconcile(&mappings, &[], "123456789012").unwrap();

    assert_eq!(got.len(), 1);
    assert_eq!(got[0].rolearn, "arn:aws:iam::123456789012:role/123456789012-admin");
    assert_eq!(got[0].username, "admin");
    assert_eq!(got[0].groups, vec!["system:masters".to_string()]);
  }

  #[test]
  fn role_arn_wins_over_permission_set() {
    let mappings = vec![RoleMapping {
      rolearn: "arn:aws:iam::123456789012:role/admin".to_string(),
      permission_set: "devops".to_string(),
      ..RoleMapping::default()
    }];

    let got = reconcile(&mappings, &[], "").unwrap();

    assert_eq!(
      got,
      vec![RoleMapping {
        rolearn: "arn:aws:iam::123456789012:role/admin".to_string(),
        ..RoleMapping::default()
      }]
    );
  }

  #[test]
  fn empty_roles_drop_every_permission_set() {
    let mappings = vec![permission_set("devops"), permission_set("sre")];

    assert!(reconcile(&mappings, &[], "123456789012").unwrap().is_empty());
  }
}
