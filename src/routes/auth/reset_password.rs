use actix_web::{web, HttpResponse};
use actix_web_flash_messages::FlashMessage;
use anyhow::Context;
use sqlx::SqlitePool;

use crate::authentication::set_password;
use crate::db_session::DbSession;
use crate::domain::UserEmail;
use crate::email_client::EmailClient;
use crate::forms::{FormErrors, ResetPasswordForm, ResetPasswordRequestForm};
use crate::i18n::{Locale, Message};
use crate::models::{
    consume_reset_token, find_user_by_email, find_user_by_reset_token, generate_reset_token,
    store_reset_token, User,
};
use crate::session_state::TypedSession;
use crate::startup::ApplicationBaseUrl;
use crate::templates::{html_ok, input, submit, Layout};
use crate::utils::{e500, see_other};

pub const RESET_EMAIL_SUBJECT: &str = "[Microblog] Reset Your Password";

fn reset_password_request_page(
    locale: &Locale,
    form: Option<&ResetPasswordRequestForm>,
    errors: &FormErrors,
) -> String {
    let email = form.map(|form| form.email.as_str()).unwrap_or_default();
    let content = format!(
        r#"<h1>{title}</h1>
    <form action="/auth/reset_password_request" method="post" novalidate>
        {email}
        {submit}
    </form>"#,
        title = locale.t(Message::ResetPassword),
        email = input("email", "email", locale.t(Message::Email), email, errors, locale),
        submit = submit(locale.t(Message::RequestPasswordReset)),
    );
    Layout::new(locale, locale.t(Message::ResetPassword)).render(&content)
}

fn reset_password_page(locale: &Locale, token: &str, errors: &FormErrors) -> String {
    let content = format!(
        r#"<h1>{title}</h1>
    <form action="/auth/reset_password/{token}" method="post" novalidate>
        {password}
        {password2}
        {submit}
    </form>"#,
        title = locale.t(Message::ResetPassword),
        token = crate::templates::escape(token),
        password = input("password", "password", locale.t(Message::Password), "", errors, locale),
        password2 = input(
            "password",
            "password2",
            locale.t(Message::RepeatPassword),
            "",
            errors,
            locale
        ),
        submit = submit(locale.t(Message::ResetPassword)),
    );
    Layout::new(locale, locale.t(Message::ResetPassword)).render(&content)
}

pub async fn reset_password_request_form(
    session: TypedSession,
    locale: Locale,
) -> Result<HttpResponse, actix_web::Error> {
    if session.get_user_id().map_err(e500)?.is_some() {
        return Ok(see_other("/index"));
    }
    Ok(html_ok(reset_password_request_page(
        &locale,
        None,
        &FormErrors::default(),
    )))
}

/// Mails a reset link when the address belongs to a user. The response is the same either way,
/// so the form cannot be used to probe for registered addresses.
#[tracing::instrument(
    name = "Request a password reset",
    skip(form, pool, db, email_client, base_url, session, locale),
    fields(email = %form.email)
)]
pub async fn request_password_reset(
    form: web::Form<ResetPasswordRequestForm>,
    pool: web::Data<SqlitePool>,
    db: DbSession,
    email_client: web::Data<EmailClient>,
    base_url: web::Data<ApplicationBaseUrl>,
    session: TypedSession,
    locale: Locale,
) -> Result<HttpResponse, actix_web::Error> {
    if session.get_user_id().map_err(e500)?.is_some() {
        return Ok(see_other("/index"));
    }
    let email = match form.validate() {
        Ok(email) => email,
        Err(errors) => {
            return Ok(html_ok(reset_password_request_page(
                &locale,
                Some(&form.0),
                &errors,
            )))
        }
    };

    if let Some(user) = find_user_by_email(&pool, email.as_ref())
        .await
        .map_err(e500)?
    {
        let token = generate_reset_token();
        {
            let mut transaction = db.transaction().await.map_err(e500)?;
            store_reset_token(&mut transaction, user.user_id, &token)
                .await
                .map_err(e500)?;
        }
        // the link must work by the time the mail arrives
        db.commit().await.map_err(e500)?;
        send_password_reset_email(&email_client, &user, email, &base_url.0, &token)
            .await
            .map_err(e500)?;
    }

    FlashMessage::info(locale.t(Message::CheckYourEmail)).send();
    Ok(see_other("/auth/login"))
}

#[tracing::instrument(
    name = "Send a password reset email",
    skip(email_client, user, recipient, base_url, token)
)]
pub async fn send_password_reset_email(
    email_client: &EmailClient,
    user: &User,
    recipient: UserEmail,
    base_url: &str,
    token: &str,
) -> Result<(), anyhow::Error> {
    let reset_link = format!("{}/auth/reset_password/{}", base_url, token);
    let html_body = format!(
        "<p>Dear {username},</p>\
        <p>To reset your password <a href=\"{link}\">click here</a>.</p>\
        <p>Alternatively, you can paste the following link in your browser's address bar:</p>\
        <p>{link}</p>\
        <p>If you have not requested a password reset simply ignore this message.</p>\
        <p>Sincerely,</p>\
        <p>The Microblog Team</p>",
        username = crate::templates::escape(&user.username),
        link = reset_link,
    );
    let text_body = format!(
        "Dear {username},\n\n\
        To reset your password click on the following link:\n\n\
        {link}\n\n\
        If you have not requested a password reset simply ignore this message.\n\n\
        Sincerely,\n\n\
        The Microblog Team",
        username = user.username,
        link = reset_link,
    );
    email_client
        .send_email(&recipient, RESET_EMAIL_SUBJECT, &html_body, &text_body)
        .await
        .context("Failed to send the password reset email")
}

pub async fn reset_password_form(
    token: web::Path<String>,
    pool: web::Data<SqlitePool>,
    session: TypedSession,
    locale: Locale,
) -> Result<HttpResponse, actix_web::Error> {
    if session.get_user_id().map_err(e500)?.is_some() {
        return Ok(see_other("/index"));
    }
    if find_user_by_reset_token(&pool, &token)
        .await
        .map_err(e500)?
        .is_none()
    {
        return Ok(see_other("/index"));
    }
    Ok(html_ok(reset_password_page(
        &locale,
        &token,
        &FormErrors::default(),
    )))
}

#[tracing::instrument(
    name = "Reset a password",
    skip(token, form, pool, db, session, locale),
    fields(user_id = tracing::field::Empty)
)]
pub async fn reset_password(
    token: web::Path<String>,
    form: web::Form<ResetPasswordForm>,
    pool: web::Data<SqlitePool>,
    db: DbSession,
    session: TypedSession,
    locale: Locale,
) -> Result<HttpResponse, actix_web::Error> {
    if session.get_user_id().map_err(e500)?.is_some() {
        return Ok(see_other("/index"));
    }
    let user_id = match find_user_by_reset_token(&pool, &token)
        .await
        .map_err(e500)?
    {
        Some(user_id) => user_id,
        None => return Ok(see_other("/index")),
    };
    tracing::Span::current().record("user_id", &tracing::field::display(&user_id));

    let password = match form.validate() {
        Ok(password) => password,
        Err(errors) => return Ok(html_ok(reset_password_page(&locale, &token, &errors))),
    };
    let mut transaction = db.transaction().await.map_err(e500)?;
    set_password(user_id, password, &mut transaction)
        .await
        .map_err(e500)?;
    consume_reset_token(&mut transaction, user_id)
        .await
        .map_err(e500)?;

    FlashMessage::info(locale.t(Message::PasswordHasBeenReset)).send();
    Ok(see_other("/auth/login"))
}
