//! Application services, wired with explicit constructor arguments.

mod accounts;
mod auth;
mod events;

pub use accounts::AccountService;
pub use auth::{
    hash_password, hash_token, AuthError, AuthGate, IssuedToken, ACCESS_TOKEN_LIFETIME_HOURS,
    ACCESS_TOKEN_PREFIX,
};
pub use events::{EventService, EventServiceError};
