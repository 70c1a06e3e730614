//! User model - provisioned identity records.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity record as persisted.
///
/// `secret_hash` is write-only from the caller's point of view: nothing in this crate
/// hands a `User` out over the wire; reads go through [`super::ProjectedUser`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub mail: String,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
    pub secret_hash: String,
    #[serde(default)]
    pub resources: Vec<String>,
}

/// Input for administrative provisioning. The id is generated when absent.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub id: Option<String>,
    pub mail: String,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    pub position: Option<String>,
    pub pin: Option<String>,
    pub secret_hash: String,
    pub resources: Vec<String>,
}

impl User {
    pub fn from_new(new: NewUser) -> Self {
        Self {
            id: new.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            mail: new.mail,
            first_name: new.first_name,
            last_name: new.last_name,
            display_name: new.display_name,
            position: new.position,
            pin: new.pin,
            secret_hash: new.secret_hash,
            resources: new.resources,
        }
    }
}

/// A PIN is accepted only when it is non-empty and made of ASCII digits.
pub fn is_valid_pin(pin: &str) -> bool {
    !pin.is_empty() && pin.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_must_be_digits_only() {
        assert!(is_valid_pin("1234"));
        assert!(is_valid_pin("0"));
        assert!(!is_valid_pin(""));
        assert!(!is_valid_pin("12a4"));
        assert!(!is_valid_pin(" 1234"));
        assert!(!is_valid_pin("١٢٣")); // non-ASCII digits
    }

    #[test]
    fn from_new_generates_id_when_missing() {
        let user = User::from_new(NewUser {
            mail: "a@x.com".to_string(),
            secret_hash: "h".to_string(),
            ..Default::default()
        });
        assert!(Uuid::parse_str(&user.id).is_ok());

        let user = User::from_new(NewUser {
            id: Some("U1".to_string()),
            mail: "a@x.com".to_string(),
            secret_hash: "h".to_string(),
            ..Default::default()
        });
        assert_eq!(user.id, "U1");
    }

    #[test]
    fn persisted_shape_uses_mongo_id() {
        let user = User::from_new(NewUser {
            id: Some("U1".to_string()),
            mail: "a@x.com".to_string(),
            secret_hash: "h".to_string(),
            ..Default::default()
        });
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["_id"], "U1");
        assert!(json.get("pin").is_none());
    }
}
