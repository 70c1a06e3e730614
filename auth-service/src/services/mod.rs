//! Services layer for auth-service.
//!
//! Credential hashing, the user/session/token stores, the coordinator that
//! orchestrates them, and the collaborators they talk to.

pub mod codec;
pub mod coordinator;
mod database;
pub mod display;
pub mod error;
pub mod heartbeat;
mod memory;
pub mod metrics;
pub mod purge;
pub mod sessions;
pub mod store;
pub mod tokens;
pub mod users;

pub use codec::{CredentialCodec, DigestAlgorithm};
pub use coordinator::AuthCoordinator;
pub use database::MongoDb;
pub use display::{DisplayProvider, HttpDisplayClient, LoggingDisplay, MockDisplayService};
pub use error::ServiceError;
pub use heartbeat::HeartbeatSender;
pub use memory::MemoryStore;
pub use purge::{PurgeReport, PurgeTask};
pub use sessions::SessionStore;
pub use store::{Persistence, SessionRepository, StoreHealth, TokenRepository, UserRepository};
pub use tokens::TokenIssuer;
pub use users::UserStore;
