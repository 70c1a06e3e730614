//! Tiered field visibility for user reads.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::User;

/// Ordered visibility tiers: `Public < Restricted < Confidential`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum AccessScope {
    Public,
    Restricted,
    Confidential,
}

impl std::str::FromStr for AccessScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(AccessScope::Public),
            "restricted" => Ok(AccessScope::Restricted),
            "confidential" => Ok(AccessScope::Confidential),
            _ => Err(format!("Invalid access scope: {}", s)),
        }
    }
}

/// Reduced view of a [`User`]. Absent fields are omitted from serialized output.
///
/// Has no field for the secret hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProjectedUser {
    pub id: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
}

/// Projects `user` down to the fields `scope` allows.
///
/// Public: id, display name. Restricted adds mail, names, position and resources.
/// Confidential adds the PIN.
pub fn project(user: &User, scope: AccessScope) -> ProjectedUser {
    let mut view = ProjectedUser {
        id: user.id.clone(),
        display_name: user.display_name.clone(),
        mail: None,
        first_name: None,
        last_name: None,
        position: None,
        resources: None,
        pin: None,
    };

    if scope >= AccessScope::Restricted {
        view.mail = Some(user.mail.clone());
        view.first_name = Some(user.first_name.clone());
        view.last_name = Some(user.last_name.clone());
        view.position = user.position.clone();
        view.resources = Some(user.resources.clone());
    }

    if scope >= AccessScope::Confidential {
        view.pin = user.pin.clone();
    }

    view
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: "U1".to_string(),
            mail: "a@x.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            display_name: "ada".to_string(),
            position: Some("operator".to_string()),
            pin: Some("1234".to_string()),
            secret_hash: "deadbeef".to_string(),
            resources: vec!["machine:7".to_string()],
        }
    }

    #[test]
    fn scopes_are_ordered() {
        assert!(AccessScope::Public < AccessScope::Restricted);
        assert!(AccessScope::Restricted < AccessScope::Confidential);
    }

    #[test]
    fn public_exposes_only_id_and_display_name() {
        let json = serde_json::to_value(project(&sample_user(), AccessScope::Public)).unwrap();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 2);
        assert_eq!(json["id"], "U1");
        assert_eq!(json["display_name"], "ada");
    }

    #[test]
    fn restricted_adds_contact_fields_but_not_pin() {
        let view = project(&sample_user(), AccessScope::Restricted);
        assert_eq!(view.mail.as_deref(), Some("a@x.com"));
        assert_eq!(view.first_name.as_deref(), Some("Ada"));
        assert_eq!(view.last_name.as_deref(), Some("Lovelace"));
        assert_eq!(view.position.as_deref(), Some("operator"));
        assert_eq!(view.resources, Some(vec!["machine:7".to_string()]));
        assert!(view.pin.is_none());
    }

    #[test]
    fn confidential_adds_pin_never_secret_hash() {
        let view = project(&sample_user(), AccessScope::Confidential);
        assert_eq!(view.pin.as_deref(), Some("1234"));

        let text = serde_json::to_string(&view).unwrap();
        assert!(!text.contains("deadbeef"));
        assert!(!text.contains("secret"));
    }

    #[test]
    fn parses_scope_names() {
        assert_eq!("PUBLIC".parse::<AccessScope>(), Ok(AccessScope::Public));
        assert_eq!(
            "confidential".parse::<AccessScope>(),
            Ok(AccessScope::Confidential)
        );
        assert!("admin".parse::<AccessScope>().is_err());
    }
}
