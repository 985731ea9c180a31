use actix_web::body::MessageBody;
use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use actix_web::middleware::{ErrorHandlerResponse, ErrorHandlers};
use actix_web::HttpRequest;

use crate::db_session::DbSession;
use crate::i18n::{Locale, Message};
use crate::templates::{html_response, Layout};

/// Renders the 404 and 500 pages.
///
/// Wrapped outside the transaction middleware: by the time a 500 gets here the commit was
/// skipped, and the transaction is still open for `internal_error` to roll back.
pub fn error_handlers<B: MessageBody + 'static>() -> ErrorHandlers<B> {
    ErrorHandlers::new()
        .handler(StatusCode::NOT_FOUND, not_found)
        .handler(StatusCode::INTERNAL_SERVER_ERROR, internal_error)
}

fn error_page(request: &HttpRequest, heading: Message, details: Option<Message>) -> String {
    // The session is not consulted here: an error page always shows the anonymous navigation,
    // which avoids failing a second time on a broken session cookie.
    let locale = Locale::of(request);
    let details = details
        .map(|message| format!("<p>{}</p>", locale.t(message)))
        .unwrap_or_default();
    let content = format!(
        r#"<h1>{heading}</h1>
    {details}
    <p><a href="/index">{back}</a></p>"#,
        heading = locale.t(heading),
        back = locale.t(Message::Back),
    );
    Layout::new(&locale, locale.t(heading)).render(&content)
}

/// Replaces any 404 with the not-found page.
pub fn not_found<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let body = error_page(res.request(), Message::NotFound, None);
    let (request, _) = res.into_parts();
    let response = html_response(StatusCode::NOT_FOUND, body);
    Ok(ErrorHandlerResponse::Response(
        ServiceResponse::new(request, response).map_into_right_body(),
    ))
}

/// Rolls back the request's open transaction, logs the failure and renders the error page.
pub fn internal_error<B: 'static>(
    res: ServiceResponse<B>,
) -> actix_web::Result<ErrorHandlerResponse<B>> {
    // Rolling back awaits the database, so this handler needs the `Future` variant.
    Ok(ErrorHandlerResponse::Future(Box::pin(async move {
        // Errors returned by a handler travel with the response; a bare 500 status
        // (e.g. `HttpResponse::InternalServerError()`) carries nothing to log but the fact.
        match res.response().error() {
            Some(e) => tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "The request failed with an internal error"
            ),
            None => tracing::error!("The request failed with an internal error"),
        }
        // Requests that never wrote have no session and nothing to undo.
        if let Some(session) = DbSession::of(res.request()) {
            // The page is rendered either way; a failed rollback is dropped with its
            // connection, and SQLite discards the writes then.
            if let Err(e) = session.rollback().await {
                tracing::error!(error.cause_chain = ?e, "Failed to roll back the request transaction");
            }
        }

        let body = error_page(
            res.request(),
            Message::UnexpectedError,
            Some(Message::AdministratorNotified),
        );
        let (request, _) = res.into_parts();
        let response = html_response(StatusCode::INTERNAL_SERVER_ERROR, body);
        Ok(ServiceResponse::new(request, response).map_into_right_body())
    })))
}
