//! Credential identities, ES256 minting, and the shared credential cache.

pub mod cache;
pub mod credential;
pub mod id;
pub mod signer;

pub use cache::*;
pub use credential::*;
pub use id::*;
pub use signer::*;
