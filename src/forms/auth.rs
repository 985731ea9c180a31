use anyhow::Context;
use secrecy::{ExposeSecret, Secret};
use sqlx::SqlitePool;

use crate::authentication::Credentials;
use crate::domain::{NewUser, UserEmail, Username};
use crate::forms::{
    data_required, email, empty_secret, equal_to_password, username_length, FormError,
    FormErrors, PasswordConfirmation,
};
use crate::i18n::Message;
use crate::models::{find_user_by_email, find_user_by_username};

#[derive(serde::Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default = "empty_secret")]
    pub password: Secret<String>,
    /// Checkboxes are only submitted when ticked.
    #[serde(default)]
    pub remember_me: Option<String>,
}

impl LoginForm {
    pub fn remember_me(&self) -> bool {
        self.remember_me.is_some()
    }

    pub fn validate(&self) -> Result<Credentials, FormErrors> {
        let mut errors = FormErrors::default();
        errors.check(self, "username", &self.username, &[data_required]);
        errors.check(
            self,
            "password",
            self.password.expose_secret(),
            &[data_required],
        );
        errors.into_result(|| Credentials {
            username: self.username.trim().to_string(),
            password: self.password.clone(),
        })
    }
}

#[derive(serde::Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "empty_secret")]
    pub password: Secret<String>,
    #[serde(default = "empty_secret")]
    pub password2: Secret<String>,
}

impl PasswordConfirmation for RegistrationForm {
    fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

impl RegistrationForm {
    /// Validates the submission, checking that neither the username nor the email address is
    /// already taken.
    #[tracing::instrument(
        name = "Validate a registration form",
        skip(self, pool),
        fields(username = %self.username, email = %self.email)
    )]
    pub async fn validate(&self, pool: &SqlitePool) -> Result<NewUser, FormError> {
        let mut errors = FormErrors::default();
        let username_ok = errors.check(
            self,
            "username",
            &self.username,
            &[data_required, username_length],
        );
        let email_ok = errors.check(self, "email", &self.email, &[data_required, email]);
        errors.check(
            self,
            "password",
            self.password.expose_secret(),
            &[data_required],
        );
        errors.check(
            self,
            "password2",
            self.password2.expose_secret(),
            &[data_required, equal_to_password],
        );

        if username_ok {
            if let Err(message) = validate_username(self.username.trim(), pool).await? {
                errors.add("username", message);
            }
        }
        if email_ok {
            if let Err(message) = validate_email(self.email.trim(), pool).await? {
                errors.add("email", message);
            }
        }
        if !errors.is_empty() {
            return Err(FormError::Invalid(errors));
        }

        let username = Username::parse(self.username.clone()).map_err(anyhow::Error::msg)?;
        let email = UserEmail::parse(self.email.clone()).map_err(anyhow::Error::msg)?;
        Ok(NewUser {
            username,
            email,
            password: self.password.clone(),
        })
    }
}

/// Rejects a username that already belongs to any stored user.
async fn validate_username(
    username: &str,
    pool: &SqlitePool,
) -> Result<Result<(), Message>, anyhow::Error> {
    let existing = find_user_by_username(pool, username)
        .await
        .context("Failed to look up the username")?;
    Ok(match existing {
        Some(_) => Err(Message::UsernameTaken),
        None => Ok(()),
    })
}

/// Rejects an email address that already belongs to any stored user.
async fn validate_email(
    email: &str,
    pool: &SqlitePool,
) -> Result<Result<(), Message>, anyhow::Error> {
    let existing = find_user_by_email(pool, email)
        .await
        .context("Failed to look up the email address")?;
    Ok(match existing {
        Some(_) => Err(Message::EmailTaken),
        None => Ok(()),
    })
}

#[derive(serde::Deserialize)]
pub struct ResetPasswordRequestForm {
    #[serde(default)]
    pub email: String,
}

impl ResetPasswordRequestForm {
    pub fn validate(&self) -> Result<UserEmail, FormErrors> {
        let mut errors = FormErrors::default();
        errors.check(self, "email", &self.email, &[data_required, email]);
        if !errors.is_empty() {
            return Err(errors);
        }
        UserEmail::parse(self.email.clone()).map_err(|_| {
            let mut errors = FormErrors::default();
            errors.add("email", Message::InvalidEmail);
            errors
        })
    }
}

#[derive(serde::Deserialize)]
pub struct ResetPasswordForm {
    #[serde(default = "empty_secret")]
    pub password: Secret<String>,
    #[serde(default = "empty_secret")]
    pub password2: Secret<String>,
}

impl PasswordConfirmation for ResetPasswordForm {
    fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

impl ResetPasswordForm {
    /// Returns the new password once both entries are present and identical.
    pub fn validate(&self) -> Result<Secret<String>, FormErrors> {
        let mut errors = FormErrors::default();
        errors.check(
            self,
            "password",
            self.password.expose_secret(),
            &[data_required],
        );
        errors.check(
            self,
            "password2",
            self.password2.expose_secret(),
            &[data_required, equal_to_password],
        );
        errors.into_result(|| self.password.clone())
    }
}
