//! scheduled-mailer - Mail handler for monitoring events.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use scheduled_mailer::cli::{Cli, LogFormat};
use scheduled_mailer::config::{MailerConfig, Settings};
use scheduled_mailer::{Event, HandlerOutcome, MailDelivery, MailHandler};

/// Logs go to stderr, stdout carries only the status line.
/// `RUST_LOG` overrides the `info` default.
fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .init(),
    }
}

fn read_event(cli: &Cli) -> Result<Event> {
    let event = match &cli.event {
        Some(path) => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("failed to open event file {}", path.display()))?;
            Event::from_reader(file)?
        }
        None => Event::from_reader(std::io::stdin().lock())?,
    };
    Ok(event)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_format);

    info!(config_path = %cli.config.display(), section = %cli.json_config, "Loading settings");

    let config = match Settings::load(&cli.config).and_then(|s| s.mailer(&cli.json_config)) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, path = %cli.config.display(), "Failed to load settings");
            std::process::exit(1);
        }
    };

    if let Err(errors) = config.validate() {
        for e in &errors {
            error!(error = %e, "Settings validation error");
        }
        error!(error_count = errors.len(), "Settings validation failed");
        std::process::exit(1);
    }

    // Validate mode: display summary and exit
    if cli.validate {
        println!("Configuration is valid: {}", cli.config.display());
        println!("  Section: {}", cli.json_config);
        println!("  Delivery: {:?}", config.delivery_method);
        println!(
            "  Subscriptions: {}",
            config.subscriptions.as_ref().map_or(0, |s| s.len())
        );
        return Ok(());
    }

    let event = read_event(&cli)?;

    // One event per invocation, nothing to parallelize
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let outcome = runtime.block_on(run(config, &event))?;
    println!("{}", outcome.status_line(&event));
    Ok(())
}

/// Build the delivery stack inside the runtime and handle the event.
async fn run(config: MailerConfig, event: &Event) -> Result<HandlerOutcome> {
    let delivery = MailDelivery::from_config(&config)?;
    let handler = MailHandler::new(config, delivery);

    match handler.handle(event).await {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            error!(error = %e, client = %event.client.name, check = %event.check.name, "Handler failed");
            Err(e.into())
        }
    }
}
