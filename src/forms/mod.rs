//! Input schemas for every form the application accepts.
//!
//! Each field owns an explicit, ordered list of built-in [`Validator`]s. A field's chain stops at
//! its first failure, and the field's custom validators (database lookups) only run once every
//! built-in check on that field passed. Errors are collected per field into [`FormErrors`]
//! before any side effect happens.
mod auth;
mod post;

pub use auth::{LoginForm, RegistrationForm, ResetPasswordForm, ResetPasswordRequestForm};
pub use post::PostForm;

use secrecy::Secret;
use validator::validate_email;

use crate::domain::{PostBody, Username};
use crate::i18n::Message;
use crate::utils::error_chain_fmt;

/// A built-in field check: a pure function of the submitted value and the rest of the form.
pub type Validator<F> = fn(&str, &F) -> Result<(), Message>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: Message,
}

/// Field-scoped validation failures, in the order they were raised.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FormErrors(Vec<FieldError>);

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: Message) {
        self.0.push(FieldError { field, message });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|error| error.field == field)
    }

    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = Message> + 'a {
        self.0
            .iter()
            .filter(move |error| error.field == field)
            .map(|error| error.message)
    }

    /// Runs `validators` against `value` in order, recording the first failure.
    /// Returns `true` when every check passed.
    pub fn check<F>(
        &mut self,
        form: &F,
        field: &'static str,
        value: &str,
        validators: &[Validator<F>],
    ) -> bool {
        for validator in validators {
            if let Err(message) = validator(value, form) {
                self.add(field, message);
                return false;
            }
        }
        true
    }

    pub fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

/// Outcome of a form whose validation needs the database.
#[derive(thiserror::Error)]
pub enum FormError {
    #[error("The submitted form is invalid.")]
    Invalid(FormErrors),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for FormError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Forms that carry a password together with its confirmation.
pub trait PasswordConfirmation {
    fn password(&self) -> &str;
}

pub fn data_required<F>(value: &str, _form: &F) -> Result<(), Message> {
    if value.trim().is_empty() {
        Err(Message::FieldRequired)
    } else {
        Ok(())
    }
}

pub fn email<F>(value: &str, _form: &F) -> Result<(), Message> {
    if validate_email(value.trim()) {
        Ok(())
    } else {
        Err(Message::InvalidEmail)
    }
}

pub fn equal_to_password<F: PasswordConfirmation>(value: &str, form: &F) -> Result<(), Message> {
    if value == form.password() {
        Ok(())
    } else {
        Err(Message::PasswordsMustMatch)
    }
}

pub fn username_length<F>(value: &str, _form: &F) -> Result<(), Message> {
    Username::parse(value.to_string())
        .map(|_| ())
        .map_err(|_| Message::UsernameTooLong)
}

pub fn post_length<F>(value: &str, _form: &F) -> Result<(), Message> {
    PostBody::parse(value.to_string())
        .map(|_| ())
        .map_err(|_| Message::PostLength)
}

/// Missing password fields deserialize as empty so the form can report them as required.
pub(crate) fn empty_secret() -> Secret<String> {
    Secret::new(String::new())
}
