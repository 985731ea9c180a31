mod middleware;
mod password;

pub use middleware::{login_redirect, reject_anonymous_users, UserId};
pub use password::{
    compute_password_hash, set_password, spawn_blocking_with_tracing, validate_credentials,
    AuthError, Credentials,
};
