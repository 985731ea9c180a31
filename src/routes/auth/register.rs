use actix_web::{web, HttpResponse};
use actix_web_flash_messages::FlashMessage;
use secrecy::Secret;
use sqlx::SqlitePool;

use crate::authentication::{compute_password_hash, spawn_blocking_with_tracing};
use crate::db_session::DbSession;
use crate::forms::{FormError, FormErrors, RegistrationForm};
use crate::i18n::{Locale, Message};
use crate::models::insert_user;
use crate::session_state::TypedSession;
use crate::templates::{html_ok, input, submit, Layout};
use crate::utils::{e500, see_other};

fn register_page(locale: &Locale, form: Option<&RegistrationForm>, errors: &FormErrors) -> String {
    let username = form.map(|form| form.username.as_str()).unwrap_or_default();
    let email = form.map(|form| form.email.as_str()).unwrap_or_default();
    let content = format!(
        r#"<h1>{title}</h1>
    <form action="/auth/register" method="post" novalidate>
        {username}
        {email}
        {password}
        {password2}
        {submit}
    </form>"#,
        title = locale.t(Message::Register),
        username = input("text", "username", locale.t(Message::Username), username, errors, locale),
        email = input("email", "email", locale.t(Message::Email), email, errors, locale),
        password = input("password", "password", locale.t(Message::Password), "", errors, locale),
        password2 = input(
            "password",
            "password2",
            locale.t(Message::RepeatPassword),
            "",
            errors,
            locale
        ),
        submit = submit(locale.t(Message::Register)),
    );
    Layout::new(locale, locale.t(Message::Register)).render(&content)
}

pub async fn register_form(
    session: TypedSession,
    locale: Locale,
) -> Result<HttpResponse, actix_web::Error> {
    if session.get_user_id().map_err(e500)?.is_some() {
        return Ok(see_other("/index"));
    }
    Ok(html_ok(register_page(&locale, None, &FormErrors::default())))
}

#[tracing::instrument(
    name = "Register a new user",
    skip(form, pool, db, session, locale),
    fields(username = %form.username, email = %form.email)
)]
pub async fn register(
    form: web::Form<RegistrationForm>,
    pool: web::Data<SqlitePool>,
    db: DbSession,
    session: TypedSession,
    locale: Locale,
) -> Result<HttpResponse, actix_web::Error> {
    if session.get_user_id().map_err(e500)?.is_some() {
        return Ok(see_other("/index"));
    }
    let new_user = match form.validate(&pool).await {
        Ok(new_user) => new_user,
        Err(FormError::Invalid(errors)) => {
            return Ok(html_ok(register_page(&locale, Some(&form.0), &errors)))
        }
        Err(e @ FormError::UnexpectedError(_)) => return Err(e500(e)),
    };

    let password: Secret<String> = new_user.password.clone();
    let password_hash = spawn_blocking_with_tracing(move || compute_password_hash(password))
        .await
        .map_err(e500)?
        .map_err(e500)?;
    let mut transaction = db.transaction().await.map_err(e500)?;
    insert_user(&mut transaction, &new_user, password_hash)
        .await
        .map_err(e500)?;

    FlashMessage::info(locale.t(Message::RegistrationComplete)).send();
    Ok(see_other("/auth/login"))
}
