use anyhow::Context;
use microblog::configuration::get_configuration;
use microblog::startup::create_app;
use microblog::telemetry::{get_tracing_subscriber, init_subscriber, production_sinks};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let configuration = get_configuration().context("Failed to read configuration.")?;

    // held until shutdown so buffered file records are flushed
    let sinks = production_sinks(&configuration)?;
    let _guard = sinks.guard;
    let subscriber = get_tracing_subscriber("microblog", "info", std::io::stdout, sinks.layers);
    init_subscriber(subscriber)?;

    let application = create_app(configuration).await?;
    application.run_until_stopped().await?;
    Ok(())
}
