use secrecy::Secret;

use crate::domain::{UserEmail, Username};

/// A registration that passed validation, ready to be persisted.
pub struct NewUser {
    pub username: Username,
    pub email: UserEmail,
    pub password: Secret<String>,
}
