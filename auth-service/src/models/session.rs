//! Session model - server-side login sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Binds an opaque identifier to an authenticated user.
///
/// There is no expiry field: sessions live until logout, explicit invalidation
/// or the periodic purge sweep removes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: String) -> Self {
        Self {
            id: super::generate_opaque_id(),
            user_id,
            created_at: Utc::now(),
        }
    }
}
