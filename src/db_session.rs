//! The request-scoped unit of work.
//!
//! Handlers that write extract a [`DbSession`] and ask it for the transaction, which is begun on
//! first use. [`commit_request_transaction`] commits it once the handler produced anything but a
//! server error; the 500 handler rolls it back instead. A transaction nobody finished is rolled
//! back when the request is dropped.
use std::future::{ready, Ready};
use std::rc::Rc;

use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{Payload, ServiceRequest, ServiceResponse};
use actix_web::{web, FromRequest, HttpMessage, HttpRequest, HttpResponse};
use actix_web_lab::middleware::Next;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};

use crate::utils::e500;

// Cloned into the request extensions and into every extractor that asks for it; all clones
// share one slot. `Rc` is enough: a request never leaves its worker thread.
#[derive(Clone)]
pub struct DbSession(Rc<DbSessionInner>);

struct DbSessionInner {
    pool: SqlitePool,
    // `None` until a handler writes, and again once committed or rolled back.
    // The lock is async because the guard is held across `.await` points in handlers.
    transaction: Mutex<Option<Transaction<'static, Sqlite>>>,
}

impl DbSession {
    pub fn new(pool: SqlitePool) -> Self {
        Self(Rc::new(DbSessionInner {
            pool,
            transaction: Mutex::new(None),
        }))
    }

    /// The request's open transaction, begun on first use.
    pub async fn transaction(
        &self,
    ) -> Result<MappedMutexGuard<'_, Transaction<'static, Sqlite>>, sqlx::Error> {
        let mut slot = self.0.transaction.lock().await;
        // Reads outside a write go straight to the pool, so only begin on demand. A request that
        // never writes never holds a connection for the whole of its lifetime.
        let transaction = match slot.take() {
            Some(transaction) => transaction,
            None => self.0.pool.begin().await?,
        };
        Ok(MutexGuard::map(slot, |slot| slot.insert(transaction)))
    }

    pub async fn is_open(&self) -> bool {
        self.0.transaction.lock().await.is_some()
    }

    /// Commits the open transaction, if any.
    pub async fn commit(&self) -> Result<(), sqlx::Error> {
        match self.0.transaction.lock().await.take() {
            Some(transaction) => transaction.commit().await,
            None => Ok(()),
        }
    }

    /// Discards every uncommitted write of the request. Calling it twice is harmless.
    pub async fn rollback(&self) -> Result<(), sqlx::Error> {
        match self.0.transaction.lock().await.take() {
            Some(transaction) => transaction.rollback().await,
            None => Ok(()),
        }
    }

    /// The session already attached to `request`, if a handler asked for one.
    pub fn of(request: &HttpRequest) -> Option<DbSession> {
        request.extensions().get::<DbSession>().cloned()
    }
}

impl FromRequest for DbSession {
    type Error = actix_web::Error;
    type Future = Ready<Result<DbSession, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        // Two extractors in one handler (or a handler and the middleware) must see the
        // same transaction, so the first one registers it on the request.
        if let Some(session) = DbSession::of(req) {
            return ready(Ok(session));
        }
        let pool = match req.app_data::<web::Data<SqlitePool>>() {
            Some(pool) => pool.get_ref().clone(),
            None => return ready(Err(e500("The connection pool is not registered"))),
        };
        let session = DbSession::new(pool);
        req.extensions_mut().insert(session.clone());
        ready(Ok(session))
    }
}

/// Commits the request's transaction unless the response is a server error.
pub async fn commit_request_transaction<B: MessageBody + 'static>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, actix_web::Error> {
    let response = next.call(req).await?;
    // Handler errors have already been turned into responses at this point, so the status
    // code is all we need to look at. Server errors are left open for the 500 handler, which
    // sits outside this middleware and rolls them back.
    if response.status().is_server_error() {
        return Ok(response.map_into_left_body());
    }
    // No extractor asked for a session: the request did not write anything.
    let session = match DbSession::of(response.request()) {
        Some(session) => session,
        None => return Ok(response.map_into_left_body()),
    };
    match session.commit().await {
        Ok(()) => Ok(response.map_into_left_body()),
        Err(e) => {
            // The handler's success response would be a lie now. Replace it with a 500 so the
            // error handler logs the failure and renders the error page; a failed commit has
            // already discarded the writes.
            let (request, _) = response.into_parts();
            let response = HttpResponse::from_error(e500(e));
            Ok(ServiceResponse::new(request, response).map_into_right_body())
        }
    }
}
