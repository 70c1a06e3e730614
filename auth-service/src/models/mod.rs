pub mod access_scope;
pub mod credential;
pub mod popup;
pub mod session;
pub mod token;
pub mod user;

pub use access_scope::{project, AccessScope, ProjectedUser};
pub use credential::CredentialKind;
pub use popup::Popup;
pub use session::Session;
pub use token::{Token, PROFILE_VIEW_PURPOSE};
pub use user::{is_valid_pin, NewUser, User};

use rand::Rng;

/// 32 random bytes, hex encoded. Used for session and token identifiers.
pub(crate) fn generate_opaque_id() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}
