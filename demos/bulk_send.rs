use std::io;

use smsbatch::{BulkSender, Channel, MessageBody, Settings, Table};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::var("SMSBATCH_FILE").map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "SMSBATCH_FILE environment variable is required",
        )
    })?;
    let message = std::env::var("SMSBATCH_MESSAGE")
        .unwrap_or_else(|_| "Hello from the smsbatch demo.".to_owned());

    let settings = Settings::from_env()?;
    let sender = BulkSender::from_settings(&settings, Channel::Sms)?;
    if !sender.is_configured() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN and TWILIO_PHONE_NUMBER are required",
        )
        .into());
    }

    let table = Table::load(&path, settings.max_file_size)?;
    let body = MessageBody::new(message)?;
    let report = sender
        .send_bulk(&table, None, &body, &CancellationToken::new())
        .await?;

    println!(
        "status: {:?}, successful: {}, failed: {}, invalid rows: {}",
        report.status(),
        report.successful(),
        report.failed(),
        report.invalid_entries().len()
    );
    println!("{}", serde_json::to_string_pretty(&report.to_json()?)?);

    Ok(())
}
