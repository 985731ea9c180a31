//! The three route groups: `auth` under `/auth`, `main` unprefixed, and the global error pages.
mod auth;
mod errors;
mod main;

pub use auth::blueprint as auth_blueprint;
pub use errors::{error_handlers, internal_error, not_found};
pub use main::blueprint as main_blueprint;
