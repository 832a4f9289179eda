//! Client-side session subsystem.
//!
//! The credential store is the source of truth; [`SessionContext`] is a cache
//! over it that the rest of the console reads. Role checks made here only hide
//! UI actions. The API must authorize every request on its own.

mod context;
mod gateway;
mod record;
mod store;

pub use context::{Scope, SessionContext, SessionState};
pub use gateway::{AuthError, AuthGateway, INVALID_CREDENTIALS_MESSAGE, NETWORK_ERROR_MESSAGE};
pub use record::{ROLE_ADMIN, ROLE_USER, SessionRecord, mask_token};
pub use store::{
    CredentialStore, FileCredentialStore, MemoryCredentialStore, SessionProvider, StoreError,
};
