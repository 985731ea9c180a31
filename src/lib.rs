pub mod authentication;
pub mod configuration;
pub mod db_session;
pub mod domain;
pub mod email_client;
pub mod forms;
pub mod i18n;
pub mod models;
pub mod routes;
pub mod session_state;
pub mod startup;
pub mod telemetry;
pub mod templates;
mod utils;
