use std::io;

use smsbatch::{BulkSender, Channel, MessageBody, Settings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let number = std::env::var("SMSBATCH_PHONE").map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "SMSBATCH_PHONE environment variable is required",
        )
    })?;
    let message = std::env::var("SMSBATCH_MESSAGE")
        .unwrap_or_else(|_| "Hello from the smsbatch demo.".to_owned());
    let channel: Channel = std::env::var("SMSBATCH_CHANNEL")
        .unwrap_or_else(|_| "sms".to_owned())
        .parse()
        .map_err(|err: String| io::Error::new(io::ErrorKind::InvalidInput, err))?;

    let settings = Settings::from_env()?;
    let sender = BulkSender::from_settings(&settings, channel)?;
    let outcome = sender
        .send_single(&number, &MessageBody::new(message)?)
        .await?;

    println!(
        "to: {}, status: {:?}, sid: {:?}, error: {:?}",
        outcome.address(),
        outcome.status(),
        outcome.message_id().map(|id| id.as_str()),
        outcome.error()
    );

    Ok(())
}
