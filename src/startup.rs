use std::net::TcpListener;

use actix_session::storage::CookieSessionStore;
use actix_session::SessionMiddleware;
use actix_web::cookie::Key;
use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use actix_web_flash_messages::storage::CookieMessageStore;
use actix_web_flash_messages::FlashMessagesFramework;
use actix_web_lab::middleware::from_fn;
use anyhow::Context;
use secrecy::{ExposeSecret, Secret};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing_actix_web::TracingLogger;

use crate::configuration::{ApplicationSettings, DatabaseSettings, Settings};
use crate::db_session::commit_request_transaction;
use crate::email_client::EmailClient;
use crate::i18n::Languages;
use crate::routes;

/// Session and flash cookies are signed with a key derived from the secret; shorter secrets are
/// rejected rather than padded.
pub const MIN_SECRET_KEY_BYTES: usize = 64;

/// A bound, not yet running, instance of the application.
pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Only returns when the application is stopped.
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

/// The public url of the application, used to build links sent by email.
pub struct ApplicationBaseUrl(pub String);

/// How many posts a timeline page shows.
#[derive(Clone, Copy)]
pub struct PostsPerPage(pub u32);

/// Builds the application described by `configuration`.
///
/// Every service handle (connection pool, email client, signing key, languages) is created here
/// and owned by the returned instance, so independent configurations give independent apps.
pub async fn create_app(configuration: Settings) -> Result<Application, anyhow::Error> {
    let connection_pool = get_connection_pool(&configuration.database).await?;
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .context("Failed to migrate the database")?;
    let email_client = EmailClient::from_settings(&configuration.email_client)?;

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)
        .with_context(|| format!("Failed to bind to {}", address))?;
    let port = listener.local_addr()?.port();
    let server = run(
        listener,
        connection_pool,
        email_client,
        configuration.application,
    )?;

    tracing::info!("Microblog startup");
    Ok(Application { port, server })
}

pub async fn get_connection_pool(configuration: &DatabaseSettings) -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_with(configuration.connect_options())
        .await
}

fn signing_key(secret_key: &Secret<String>) -> Result<Key, anyhow::Error> {
    let bytes = secret_key.expose_secret().as_bytes();
    if bytes.len() < MIN_SECRET_KEY_BYTES {
        anyhow::bail!(
            "The secret key must be at least {} bytes long.",
            MIN_SECRET_KEY_BYTES
        );
    }
    Ok(Key::from(bytes))
}

fn run(
    listener: TcpListener,
    db_pool: SqlitePool,
    email_client: EmailClient,
    settings: ApplicationSettings,
) -> Result<Server, anyhow::Error> {
    let secret_key = signing_key(&settings.secret_key)?;
    let secure_cookies = settings.is_production();
    let message_store = CookieMessageStore::builder(secret_key.clone()).build();
    let message_framework = FlashMessagesFramework::builder(message_store).build();

    let db_pool = web::Data::new(db_pool);
    let email_client = web::Data::new(email_client);
    let base_url = web::Data::new(ApplicationBaseUrl(settings.base_url));
    let languages = web::Data::new(Languages::new(settings.languages));
    let posts_per_page = web::Data::new(PostsPerPage(settings.posts_per_page.max(1)));

    let server = HttpServer::new(move || {
        // the last `wrap` is the outermost layer
        App::new()
            .wrap(from_fn(commit_request_transaction))
            .wrap(routes::error_handlers())
            .wrap(message_framework.clone())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_secure(secure_cookies)
                    .build(),
            )
            .wrap(TracingLogger::default())
            .service(routes::auth_blueprint())
            .configure(routes::main_blueprint)
            .app_data(db_pool.clone())
            .app_data(email_client.clone())
            .app_data(base_url.clone())
            .app_data(languages.clone())
            .app_data(posts_per_page.clone())
    })
    .listen(listener)?
    .run();
    Ok(server)
}
