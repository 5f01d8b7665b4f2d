pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod revalidate;
pub mod session;
pub mod store;

pub use common_auth::{Portal, SessionClaims};
pub use config::SessionConfig;
pub use error::SessionError;
pub use revalidate::{spawn_revalidation, RevalidationHandle};
pub use session::{ApiReply, ApiRequest, SessionSnapshot, SessionStore};
pub use store::{FileTokenStore, MemoryTokenStore, StoreError, TokenStore};
