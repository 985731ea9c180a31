use std::fmt::Write;

use anyhow::Context as _;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use crate::configuration::MailSettings;

pub const ALERT_SUBJECT: &str = "Microblog Failure";

/// Mails every event it sees to the admins. Filter it down to ERROR before composing it.
///
/// Delivery is spawned on the current tokio runtime and never awaited; events recorded outside
/// a runtime are dropped.
pub struct MailAlertLayer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

impl MailAlertLayer {
    /// `None` when no mail server is configured or there is nobody to alert.
    pub fn from_settings(
        settings: &MailSettings,
        admins: &[String],
    ) -> Result<Option<Self>, anyhow::Error> {
        let server = match settings.server() {
            Some(server) => server,
            None => return Ok(None),
        };
        if admins.is_empty() {
            return Ok(None);
        }

        let mut transport = if settings.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(server)
                .context("Failed to configure STARTTLS for the mail server")?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(server)
        };
        transport = transport.port(settings.port);
        if let Some((username, password)) = settings.credentials() {
            transport = transport.credentials(Credentials::new(
                username,
                password.expose_secret().to_string(),
            ));
        }

        let from: Mailbox = format!("no-reply@{}", server)
            .parse()
            .context("Failed to build the alert sender address")?;
        let to = admins
            .iter()
            .map(|admin| {
                admin
                    .parse()
                    .with_context(|| format!("{} is not a valid admin address", admin))
            })
            .collect::<Result<Vec<Mailbox>, _>>()?;

        Ok(Some(Self {
            mailer: transport.build(),
            from,
            to,
        }))
    }

    fn message(&self, body: String) -> Result<Message, lettre::error::Error> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(ALERT_SUBJECT);
        for admin in &self.to {
            builder = builder.to(admin.clone());
        }
        builder.header(ContentType::TEXT_PLAIN).body(body)
    }
}

/// Collects the event's message and fields into a plain-text mail body.
#[derive(Default)]
struct AlertBody {
    message: String,
    fields: String,
}

impl Visit for AlertBody {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            write!(self.message, "{:?}", value).ok();
        } else {
            writeln!(self.fields, "{} = {:?}", field.name(), value).ok();
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            writeln!(self.fields, "{} = {}", field.name(), value).ok();
        }
    }
}

fn render_event(event: &Event<'_>) -> String {
    let metadata = event.metadata();
    let mut body = AlertBody::default();
    event.record(&mut body);
    format!(
        "{} {}: {} [in {}:{}]\n\n{}",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S,%3f"),
        metadata.level(),
        body.message,
        metadata.file().unwrap_or("<unknown>"),
        metadata.line().unwrap_or(0),
        body.fields
    )
}

impl<S: Subscriber> Layer<S> for MailAlertLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => return,
        };
        let message = match self.message(render_event(event)) {
            Ok(message) => message,
            Err(_) => return,
        };
        let mailer = self.mailer.clone();
        runtime.spawn(async move {
            if let Err(e) = mailer.send(message).await {
                tracing::warn!(error.cause_chain = ?e, "Failed to mail an error alert");
            }
        });
    }
}
