//! One-way credential hashing and hash comparison.
//!
//! The transform is deterministic (a service-wide salt, no per-record salt) because
//! callers hash a secret once where it is entered and only hash strings travel
//! after that; authentication compares two digests for equality.

use sha2::{Digest, Sha256, Sha512};
use subtle::ConstantTimeEq;

use crate::config::CredentialConfig;
use crate::services::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Sha256,
    Sha512,
}

impl std::str::FromStr for DigestAlgorithm {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "").as_str() {
            "sha256" => Ok(DigestAlgorithm::Sha256),
            "sha512" => Ok(DigestAlgorithm::Sha512),
            _ => Err(ServiceError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

#[derive(Clone)]
pub struct CredentialCodec {
    algorithm: DigestAlgorithm,
    salt: String,
}

impl std::fmt::Debug for CredentialCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCodec")
            .field("algorithm", &self.algorithm)
            .field("salt", &"<redacted>")
            .finish()
    }
}

impl CredentialCodec {
    /// Fails with `UnsupportedAlgorithm` when the configured digest is not available.
    pub fn new(config: &CredentialConfig) -> Result<Self, ServiceError> {
        let algorithm = config.algorithm.parse()?;
        Ok(Self {
            algorithm,
            salt: config.salt.clone(),
        })
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Lower-case hex digest of `salt || secret`.
    pub fn hash(&self, secret: &str) -> String {
        match self.algorithm {
            DigestAlgorithm::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(self.salt.as_bytes());
                hasher.update(secret.as_bytes());
                hex::encode(hasher.finalize())
            }
            DigestAlgorithm::Sha512 => {
                let mut hasher = Sha512::new();
                hasher.update(self.salt.as_bytes());
                hasher.update(secret.as_bytes());
                hex::encode(hasher.finalize())
            }
        }
    }

    /// Equality of two hash strings, in constant time for equal lengths.
    pub fn matches(candidate_hash: &str, stored_hash: &str) -> bool {
        candidate_hash
            .as_bytes()
            .ct_eq(stored_hash.as_bytes())
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec(algorithm: &str) -> CredentialCodec {
        CredentialCodec::new(&CredentialConfig {
            algorithm: algorithm.to_string(),
            salt: "pepper".to_string(),
        })
        .expect("supported algorithm")
    }

    #[test]
    fn hashing_is_deterministic() {
        let codec = codec("sha256");
        assert_eq!(codec.hash("secret"), codec.hash("secret"));
        assert_ne!(codec.hash("secret"), codec.hash("Secret"));
        assert_eq!(codec.hash("secret").len(), 64);
    }

    #[test]
    fn salt_changes_the_digest() {
        let salted = codec("sha256");
        let other = CredentialCodec::new(&CredentialConfig {
            algorithm: "sha256".to_string(),
            salt: "other".to_string(),
        })
        .unwrap();
        assert_ne!(salted.hash("secret"), other.hash("secret"));
    }

    #[test]
    fn sha512_produces_longer_digest() {
        assert_eq!(codec("SHA-512").hash("secret").len(), 128);
    }

    #[test]
    fn unknown_algorithm_is_rejected() {
        let err = CredentialCodec::new(&CredentialConfig {
            algorithm: "md4".to_string(),
            salt: String::new(),
        })
        .unwrap_err();
        assert!(matches!(err, ServiceError::UnsupportedAlgorithm(name) if name == "md4"));
    }

    #[test]
    fn matches_compares_hash_strings() {
        let codec = codec("sha256");
        let stored = codec.hash("secret");
        assert!(CredentialCodec::matches(&codec.hash("secret"), &stored));
        assert!(!CredentialCodec::matches(&codec.hash("wrong"), &stored));
        assert!(!CredentialCodec::matches("", &stored));
    }

    #[test]
    fn debug_output_hides_salt() {
        assert!(!format!("{:?}", codec("sha256")).contains("pepper"));
    }
}
