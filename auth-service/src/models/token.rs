//! Token model - short-lived, purpose-scoped, single-use artifacts bound to a session.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Purpose tag used when a profile popup is shown in another service.
pub const PROFILE_VIEW_PURPOSE: &str = "profile-view";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    #[serde(rename = "_id")]
    pub id: String,
    pub session_id: String,
    pub purpose: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub issued_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub expires_at: DateTime<Utc>,
}

impl Token {
    pub fn new(session_id: String, purpose: String, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: super::generate_opaque_id(),
            session_id,
            purpose,
            issued_at: now,
            expires_at: now + ttl,
        }
    }

    /// A token is usable strictly before its expiry instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
