use actix_web::error::InternalError;
use actix_web::{web, HttpResponse};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use sqlx::SqlitePool;

use crate::authentication::{login_redirect, validate_credentials, AuthError};
use crate::forms::{FormErrors, LoginForm};
use crate::i18n::{Locale, Message};
use crate::session_state::TypedSession;
use crate::templates::{checkbox, html_ok, input, submit, Layout};
use crate::utils::{e500, error_chain_fmt, see_other};

#[derive(serde::Deserialize)]
pub struct LoginQuery {
    next: Option<String>,
}

impl LoginQuery {
    /// Only same-site paths are followed after login; anything else lands on the index.
    fn redirect_target(&self) -> &str {
        match self.next.as_deref() {
            Some(next) if is_relative_path(next) => next,
            _ => "/index",
        }
    }

    fn form_action(&self) -> String {
        match self.next.as_deref() {
            Some(next) => login_redirect(next),
            None => "/auth/login".to_string(),
        }
    }
}

fn is_relative_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\")
}

#[derive(thiserror::Error)]
pub enum LoginError {
    #[error("Authentication failed")]
    AuthError(#[source] anyhow::Error),
}

impl std::fmt::Debug for LoginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

fn login_page(
    locale: &Locale,
    flash_messages: Option<&IncomingFlashMessages>,
    action: &str,
    form: Option<&LoginForm>,
    errors: &FormErrors,
) -> String {
    let username = form.map(|form| form.username.as_str()).unwrap_or_default();
    let content = format!(
        r#"<h1>{title}</h1>
    <form action="{action}" method="post" novalidate>
        {username}
        {password}
        {remember_me}
        {submit}
    </form>
    <p>{new_user} <a href="/auth/register">{click_to_register}</a></p>
    <p>{forgot_password} <a href="/auth/reset_password_request">{click_to_reset}</a></p>"#,
        title = locale.t(Message::SignIn),
        action = crate::templates::escape(action),
        username = input(
            "text",
            "username",
            locale.t(Message::Username),
            username,
            errors,
            locale
        ),
        password = input(
            "password",
            "password",
            locale.t(Message::Password),
            "",
            errors,
            locale
        ),
        remember_me = checkbox("remember_me", locale.t(Message::RememberMe)),
        submit = submit(locale.t(Message::SignIn)),
        new_user = locale.t(Message::NewUser),
        click_to_register = locale.t(Message::ClickToRegister),
        forgot_password = locale.t(Message::ForgotPassword),
        click_to_reset = locale.t(Message::ClickToReset),
    );
    let mut layout = Layout::new(locale, locale.t(Message::SignIn));
    if let Some(flash_messages) = flash_messages {
        layout = layout.flash_messages(flash_messages);
    }
    layout.render(&content)
}

pub async fn login_form(
    flash_messages: IncomingFlashMessages,
    query: web::Query<LoginQuery>,
    session: TypedSession,
    locale: Locale,
) -> Result<HttpResponse, actix_web::Error> {
    if session.get_user_id().map_err(e500)?.is_some() {
        return Ok(see_other("/index"));
    }
    Ok(html_ok(login_page(
        &locale,
        Some(&flash_messages),
        &query.form_action(),
        None,
        &FormErrors::default(),
    )))
}

#[tracing::instrument(
    skip(form, query, pool, session, locale),
    fields(
        username=tracing::field::Empty,
        user_id=tracing::field::Empty,
        remember_me=tracing::field::Empty
    )
)]
pub async fn login(
    form: web::Form<LoginForm>,
    query: web::Query<LoginQuery>,
    pool: web::Data<SqlitePool>,
    session: TypedSession,
    locale: Locale,
) -> Result<HttpResponse, actix_web::Error> {
    if session.get_user_id().map_err(e500)?.is_some() {
        return Ok(see_other("/index"));
    }
    let credentials = match form.validate() {
        Ok(credentials) => credentials,
        Err(errors) => {
            return Ok(html_ok(login_page(
                &locale,
                None,
                &query.form_action(),
                Some(&form.0),
                &errors,
            )))
        }
    };
    tracing::Span::current().record("username", &tracing::field::display(&credentials.username));

    match validate_credentials(credentials, &pool).await {
        Ok(user_id) => {
            tracing::Span::current().record("user_id", &tracing::field::display(&user_id));
            // rotate the session key on privilege change
            session.renew();
            session.insert_user_id(user_id).map_err(e500)?;
            // The session cookie has one lifecycle for every login (it ends with the browser),
            // so the remember-me box is accepted but does not extend it.
            tracing::Span::current().record("remember_me", &form.remember_me());
            Ok(see_other(query.redirect_target()))
        }
        Err(AuthError::InvalidCredentials(e)) => {
            FlashMessage::error(locale.t(Message::InvalidCredentials)).send();
            let response = see_other("/auth/login");
            Err(InternalError::from_response(LoginError::AuthError(e), response).into())
        }
        Err(e @ AuthError::UnexpectedError(_)) => Err(e500(e)),
    }
}
