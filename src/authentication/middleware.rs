use std::ops::Deref;

use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::{FromRequest, HttpMessage};
use actix_web_flash_messages::FlashMessage;
use actix_web_lab::middleware::Next;

use crate::i18n::{Locale, Message};
use crate::session_state::TypedSession;
use crate::utils::{e500, see_other};

/// The id of the logged-in user, inserted into the request extensions by
/// [`reject_anonymous_users`].
#[derive(Copy, Clone, Debug)]
pub struct UserId(i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl Deref for UserId {
    type Target = i64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// The login page, remembering where to send the user once they are in.
pub fn login_redirect(next: &str) -> String {
    match serde_urlencoded::to_string([("next", next)]) {
        Ok(query) => format!("/auth/login?{}", query),
        Err(_) => "/auth/login".to_string(),
    }
}

/// Lets logged-in users through and sends everyone else to the login page.
pub async fn reject_anonymous_users<B: MessageBody + 'static>(
    mut req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, actix_web::Error> {
    let session = {
        let (http_request, payload) = req.parts_mut();
        TypedSession::from_request(http_request, payload).await
    }?;

    match session.get_user_id().map_err(e500)? {
        Some(user_id) => {
            req.extensions_mut().insert(UserId(user_id));
            Ok(next.call(req).await?.map_into_left_body())
        }
        None => {
            let locale = Locale::of(req.request());
            FlashMessage::info(locale.t(Message::LoginRequired)).send();
            let response = see_other(&login_redirect(req.path()));
            Ok(req.into_response(response).map_into_right_body())
        }
    }
}
