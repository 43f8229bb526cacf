//! End-to-end bulk send: credential check, table extraction, paced dispatch.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::client::{ProviderClient, ProviderError, TwilioClient, UnconfiguredProvider};
use crate::config::Settings;
use crate::dispatch::{DEFAULT_MESSAGE_DELAY, Dispatcher};
use crate::domain::{BatchReport, Channel, MessageBody, NumberFormat, SendOutcome};
use crate::gate::{CredentialGate, ProviderCredential};
use crate::table::{self, DEFAULT_COLUMN, DEFAULT_MAX_FILE_SIZE, ExtractError, Table, TableError};

const USER_AGENT: &str = concat!("smsbatch/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, thiserror::Error)]
/// Reasons a send request is refused before any message goes out.
pub enum BatchError {
    #[error(
        "provider not configured; set TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN and a sender number"
    )]
    ProviderNotConfigured,

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("no valid mobile numbers found ({rejected} rejected)")]
    NoValidRecipients { rejected: usize },

    #[error("invalid mobile number: {input}")]
    InvalidRecipient { input: String },
}

#[derive(Clone)]
/// Entry point for callers: one configured channel, one numbering plan.
pub struct BulkSender {
    gate: CredentialGate,
    provider: Arc<dyn ProviderClient>,
    format: NumberFormat,
    channel: Channel,
    delay: Duration,
    column: String,
    max_file_size: u64,
}

impl BulkSender {
    pub fn new(
        gate: CredentialGate,
        provider: Arc<dyn ProviderClient>,
        format: NumberFormat,
    ) -> Self {
        Self {
            gate,
            provider,
            format,
            channel: Channel::Sms,
            delay: DEFAULT_MESSAGE_DELAY,
            column: DEFAULT_COLUMN.to_owned(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Wire a Twilio client when credentials are present, otherwise a provider that
    /// refuses every send.
    pub fn from_settings(settings: &Settings, channel: Channel) -> Result<Self, ProviderError> {
        let gate = CredentialGate::from_settings(settings, channel);
        let provider: Arc<dyn ProviderClient> = match gate.credential() {
            Some(credential) => Arc::new(
                TwilioClient::builder(credential.auth().clone())
                    .api_base(settings.api_base.as_str())
                    .timeout(settings.provider_timeout)
                    .user_agent(USER_AGENT)
                    .build()?,
            ),
            None => Arc::new(UnconfiguredProvider),
        };

        Ok(Self::new(gate, provider, settings.number_format.clone())
            .with_channel(channel)
            .with_delay(settings.message_delay)
            .with_column(settings.number_column.as_str())
            .with_max_file_size(settings.max_file_size))
    }

    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Column read when a request does not name one.
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.gate.is_configured()
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn number_format(&self) -> &NumberFormat {
        &self.format
    }

    fn dispatcher(&self, credential: &ProviderCredential) -> Dispatcher {
        Dispatcher::new(
            Arc::clone(&self.provider),
            credential.sender().clone(),
            self.format.calling_code().clone(),
        )
        .with_channel(self.channel)
        .with_delay(self.delay)
    }

    /// Load an uploaded sheet and send `body` to every valid number in it.
    ///
    /// The credential check runs before the file is opened.
    pub async fn send_file(
        &self,
        path: impl AsRef<Path>,
        column: Option<&str>,
        body: &MessageBody,
        cancel: &CancellationToken,
    ) -> Result<BatchReport, BatchError> {
        self.gate.require()?;
        let table = Table::load(path, self.max_file_size)?;
        self.send_bulk(&table, column, body, cancel).await
    }

    /// Send `body` to every valid number in `column` of an already loaded table.
    ///
    /// # Errors
    ///
    /// Refuses the whole request, sending nothing, when credentials are missing, the
    /// column is absent, the table has no rows, or no row holds a valid number.
    pub async fn send_bulk(
        &self,
        table: &Table,
        column: Option<&str>,
        body: &MessageBody,
        cancel: &CancellationToken,
    ) -> Result<BatchReport, BatchError> {
        let credential = self.gate.require()?;
        let column = column.unwrap_or(&self.column);
        let extraction = table::extract(table, column, &self.format)?;
        if extraction.valid.is_empty() {
            tracing::warn!(column, rejected = extraction.invalid.len(), "no valid recipients");
            return Err(BatchError::NoValidRecipients {
                rejected: extraction.invalid.len(),
            });
        }

        let report = self
            .dispatcher(credential)
            .dispatch_batch(&extraction.valid, extraction.invalid, body, cancel)
            .await;
        Ok(report)
    }

    /// Normalize one raw number and send to it. A provider failure is reported in the
    /// returned outcome, not as an error.
    pub async fn send_single(
        &self,
        raw: &str,
        body: &MessageBody,
    ) -> Result<SendOutcome, BatchError> {
        let credential = self.gate.require()?;
        let recipient = self
            .format
            .normalize_str(raw)
            .ok_or_else(|| BatchError::InvalidRecipient {
                input: raw.trim().to_owned(),
            })?;
        Ok(self.dispatcher(credential).send_one(&recipient, body).await)
    }
}
