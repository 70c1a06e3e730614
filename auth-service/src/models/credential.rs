//! Credential kinds accepted by `UserStore::authenticate`.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Which stored credential a presented value is compared against.
///
/// A PIN only ever opens a session; privileged mutations such as a password change
/// require the secret hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CredentialKind {
    Hash,
    Pin,
}

impl CredentialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKind::Hash => "hash",
            CredentialKind::Pin => "pin",
        }
    }
}

impl std::str::FromStr for CredentialKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hash" => Ok(CredentialKind::Hash),
            "pin" => Ok(CredentialKind::Pin),
            _ => Err(format!("Unknown credential kind: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_wire_names() {
        for kind in [CredentialKind::Hash, CredentialKind::Pin] {
            assert_eq!(kind.as_str().parse::<CredentialKind>(), Ok(kind));
        }
        assert!("password".parse::<CredentialKind>().is_err());
        assert!("HASH".parse::<CredentialKind>().is_err());
    }
}
