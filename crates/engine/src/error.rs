//! The module contains the errors the engine can throw.
//!
//! Credential and validation errors ([`DuplicateAccount`], [`WrongCredential`],
//! [`InvalidAmount`], [`InvalidGoal`]) are meant for the user. The remaining
//! ones are degraded-mode signals:
//!
//! - [`RemoteUnreachable`] never leaves the [`SyncCoordinator`], which falls
//!   back to the local cache instead.
//! - [`CacheCorrupt`] is recovered by the [`SessionManager`] with a fresh
//!   ledger.
//!
//!  [`DuplicateAccount`]: EngineError::DuplicateAccount
//!  [`WrongCredential`]: EngineError::WrongCredential
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InvalidGoal`]: EngineError::InvalidGoal
//!  [`RemoteUnreachable`]: EngineError::RemoteUnreachable
//!  [`CacheCorrupt`]: EngineError::CacheCorrupt
//!  [`SyncCoordinator`]: super::sync::SyncCoordinator
//!  [`SessionManager`]: super::session::SessionManager
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("\"{0}\" already registered!")]
    DuplicateAccount(String),
    #[error("\"{0}\" account not found!")]
    NoSuchAccount(String),
    #[error("Wrong credential: {0}")]
    WrongCredential(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid goal: {0}")]
    InvalidGoal(String),
    #[error("No active session: {0}")]
    NoActiveSession(String),
    #[error("Remote unreachable: {0}")]
    RemoteUnreachable(String),
    #[error("Corrupt cache record: {0}")]
    CacheCorrupt(String),
    #[error("Credential hashing failed: {0}")]
    Credential(String),
    #[error("Local cache failure: {0}")]
    Storage(String),
}
