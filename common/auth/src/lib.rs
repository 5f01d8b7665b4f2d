pub mod claims;
pub mod error;
pub mod roles;

pub use claims::{decode_unverified, SessionClaims};
pub use error::{AuthError, AuthResult};
pub use roles::{Portal, ROLE_STUDENT, ROLE_TEACHER};
