use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The credential was expired, undecodable, or refused by the gateway.
    /// The session has already been logged out when this is returned.
    #[error("session expired or unauthorized; credentials cleared")]
    Unauthorized,
    #[error("network error: {0}")]
    Network(String),
    /// The upstream answered and said no; carries its message.
    #[error("{0}")]
    Rejected(String),
    #[error("unexpected response payload: {0}")]
    Protocol(String),
    #[error("credential storage failed: {0}")]
    Storage(#[from] StoreError),
}
