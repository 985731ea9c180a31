//! Server-side HTML rendering.
use std::fmt::Write;

use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use actix_web_flash_messages::IncomingFlashMessages;

use crate::forms::FormErrors;
use crate::i18n::{Locale, Message};
use crate::models::{Paginated, TimelinePost};

/// Escapes the characters that are significant in HTML text and attribute values.
pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// The chrome shared by every page: title, navigation bar and flash messages.
pub struct Layout<'a> {
    locale: &'a Locale,
    title: String,
    current_user: Option<&'a str>,
    flash_html: String,
}

impl<'a> Layout<'a> {
    pub fn new(locale: &'a Locale, title: impl Into<String>) -> Self {
        Self {
            locale,
            title: title.into(),
            current_user: None,
            flash_html: String::new(),
        }
    }

    pub fn current_user(mut self, username: &'a str) -> Self {
        self.current_user = Some(username);
        self
    }

    pub fn flash_messages(mut self, flash_messages: &IncomingFlashMessages) -> Self {
        for m in flash_messages.iter() {
            writeln!(
                self.flash_html,
                r#"<div class="alert alert-info" role="alert">{}</div>"#,
                escape(m.content())
            )
            .ok();
        }
        self
    }

    pub fn render(&self, content: &str) -> String {
        let t = |message| self.locale.t(message);
        let account_links = match self.current_user {
            None => format!(r#"<li><a href="/auth/login">{}</a></li>"#, t(Message::Login)),
            Some(username) => format!(
                r#"<li><a href="/user/{}">{}</a></li>
                <li><a href="/auth/logout">{}</a></li>"#,
                escape(username),
                t(Message::Profile),
                t(Message::Logout)
            ),
        };
        format!(
            r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
    <meta http-equiv="content-type" content="text/html; charset=utf-8">
    <title>{title} - Microblog</title>
</head>
<body>
    <nav>
        <a href="/index">Microblog</a>
        <ul>
            <li><a href="/index">{home}</a></li>
            {account_links}
        </ul>
    </nav>
    <div class="container">
        {flash_html}
        {content}
    </div>
</body>
</html>"#,
            lang = self.locale.code(),
            title = escape(&self.title),
            home = t(Message::Home),
            flash_html = self.flash_html,
        )
    }
}

/// Wraps a rendered page into a response with the given status.
pub fn html_response(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .content_type(ContentType::html())
        .body(body)
}

pub fn html_ok(body: String) -> HttpResponse {
    html_response(StatusCode::OK, body)
}

/// The inline error list for `field`, empty when the field is valid.
pub fn field_errors(errors: &FormErrors, field: &str, locale: &Locale) -> String {
    if !errors.has(field) {
        return String::new();
    }
    let mut html = String::from(r#"<div class="field-errors">"#);
    for message in errors.for_field(field) {
        write!(html, r#"<span class="error">[{}]</span>"#, locale.t(message)).ok();
    }
    html.push_str("</div>");
    html
}

/// A labelled `<input>` followed by its errors. Password inputs never echo their value.
pub fn input(
    kind: &str,
    name: &str,
    label: &str,
    value: &str,
    errors: &FormErrors,
    locale: &Locale,
) -> String {
    let value = if kind == "password" { "" } else { value };
    format!(
        r#"<p>
        <label for="{name}">{label}</label><br>
        <input type="{kind}" id="{name}" name="{name}" value="{value}">
        {errors}
    </p>"#,
        label = escape(label),
        value = escape(value),
        errors = field_errors(errors, name, locale),
    )
}

pub fn textarea(
    name: &str,
    label: &str,
    value: &str,
    errors: &FormErrors,
    locale: &Locale,
) -> String {
    format!(
        r#"<p>
        <label for="{name}">{label}</label><br>
        <textarea id="{name}" name="{name}" cols="32" rows="4">{value}</textarea>
        {errors}
    </p>"#,
        label = escape(label),
        value = escape(value),
        errors = field_errors(errors, name, locale),
    )
}

pub fn checkbox(name: &str, label: &str) -> String {
    format!(
        r#"<p><input type="checkbox" id="{name}" name="{name}" value="y"> <label for="{name}">{}</label></p>"#,
        escape(label)
    )
}

pub fn submit(label: &str) -> String {
    format!(
        r#"<p><input type="submit" name="submit" value="{}"></p>"#,
        escape(label)
    )
}

pub fn post_list(posts: &[TimelinePost]) -> String {
    let mut html = String::new();
    for post in posts {
        write!(
            html,
            r#"<table class="post">
        <tr>
            <td><a href="/user/{username}">{username}</a> said at {timestamp}:<br>{body}</td>
        </tr>
    </table>
    "#,
            username = escape(&post.username),
            timestamp = post.timestamp.format("%Y-%m-%d %H:%M UTC"),
            body = escape(&post.body),
        )
        .ok();
    }
    html
}

/// Newer/older links for a page of posts served at `path`.
pub fn pagination<T>(page: &Paginated<T>, path: &str, locale: &Locale) -> String {
    let mut html = String::from(r#"<nav class="pager">"#);
    if page.has_prev() {
        write!(
            html,
            r#"<a class="newer" href="{}?page={}">{}</a>"#,
            path,
            page.page - 1,
            locale.t(Message::NewerPosts)
        )
        .ok();
    }
    if page.has_next {
        write!(
            html,
            r#"<a class="older" href="{}?page={}">{}</a>"#,
            path,
            page.page + 1,
            locale.t(Message::OlderPosts)
        )
        .ok();
    }
    html.push_str("</nav>");
    html
}
