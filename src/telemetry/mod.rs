mod mail_alert;
mod rotating_file;

pub use mail_alert::MailAlertLayer;
pub use rotating_file::{LogLineFormat, RotatingFile};

use tracing::subscriber::set_global_default;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::configuration::Settings;

pub const LOG_FILE_NAME: &str = "microblog.log";
pub const LOG_FILE_MAX_BYTES: u64 = 10240;
pub const LOG_FILE_BACKUPS: usize = 10;

/// An extra sink composed into the subscriber next to the bunyan stdout layer.
pub type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Compose multiple layers into a `tracing` subscriber.
///
/// `sink` receives the bunyan-formatted JSON records; `sinks` are added underneath and apply
/// their own level filters.
pub fn get_tracing_subscriber<Sink>(
    name: impl Into<String>,
    env_filter: impl AsRef<str>,
    sink: Sink,
    sinks: Vec<BoxedLayer>,
) -> impl Subscriber + Send + Sync
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(env_filter.as_ref()));
    let formatting_layer = BunyanFormattingLayer::new(name.into(), sink);
    Registry::default()
        .with(sinks)
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(formatting_layer)
}

/// Register a subscriber as global default to process span data.
///
/// It should only be called once!
pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync) -> Result<(), anyhow::Error> {
    LogTracer::init()?;
    set_global_default(subscriber)?;
    Ok(())
}

/// The sinks that only apply in production, plus the guard flushing the file writer.
#[derive(Default)]
pub struct ProductionSinks {
    pub layers: Vec<BoxedLayer>,
    pub guard: Option<WorkerGuard>,
}

/// Builds the rotating log file (INFO and above) and, when a mail server is configured, the
/// ERROR alert mail to the admins. Debug and testing runs get neither.
pub fn production_sinks(settings: &Settings) -> Result<ProductionSinks, anyhow::Error> {
    if !settings.application.is_production() {
        return Ok(ProductionSinks::default());
    }
    let mut layers = Vec::new();

    if let Some(mail_alert) =
        MailAlertLayer::from_settings(&settings.mail, &settings.application.admins)?
    {
        layers.push(mail_alert.with_filter(LevelFilter::ERROR).boxed());
    }

    let log_file = RotatingFile::open(
        &settings.application.log_directory,
        LOG_FILE_NAME,
        LOG_FILE_MAX_BYTES,
        LOG_FILE_BACKUPS,
    )?;
    let (writer, guard) = tracing_appender::non_blocking(log_file);
    layers.push(
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .event_format(LogLineFormat)
            .with_writer(writer)
            .with_filter(LevelFilter::INFO)
            .boxed(),
    );

    Ok(ProductionSinks {
        layers,
        guard: Some(guard),
    })
}
