use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use smsbatch::{BulkSender, Channel, LogFormat, MessageBody, Settings};

#[derive(Debug, Parser)]
#[command(version, about = "Send one message to every number in a spreadsheet")]
struct Cli {
    /// Delivery channel: `sms` or `whatsapp`.
    #[arg(long, global = true, default_value = "sms")]
    channel: Channel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Send to every valid number in an uploaded .xlsx, .xls or .csv file.
    Bulk {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        message: String,
        /// Column holding the numbers (defaults to NUMBER_COLUMN or `mobile`).
        #[arg(long)]
        column: Option<String>,
    },
    /// Send to a single number.
    Single {
        #[arg(long)]
        number: String,
        #[arg(long)]
        message: String,
    },
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match settings.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let settings = Settings::from_env().context("failed to load settings")?;
    init_tracing(&settings);

    let sender = BulkSender::from_settings(&settings, cli.channel)
        .context("failed to build provider client")?;
    if !sender.is_configured() {
        bail!(
            "provider credentials are not configured for {}; set TWILIO_ACCOUNT_SID, \
             TWILIO_AUTH_TOKEN and the sender number",
            cli.channel
        );
    }

    let output = match cli.command {
        Command::Bulk {
            file,
            message,
            column,
        } => {
            let body = MessageBody::new(message).context("message is required")?;
            let cancel = CancellationToken::new();
            let trigger = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("interrupt received; stopping after the current send");
                    trigger.cancel();
                }
            });

            let report = sender
                .send_file(&file, column.as_deref(), &body, &cancel)
                .await
                .with_context(|| format!("bulk send from {} failed", file.display()))?;
            report.to_json()?
        }
        Command::Single { number, message } => {
            let body = MessageBody::new(message).context("message is required")?;
            sender.send_single(&number, &body).await?.to_json()?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
