//! Spreadsheet-driven bulk messaging over the Twilio Messages API.
//!
//! The crate is layered the usual way: a domain layer of validated types (numbers,
//! senders, outcomes), a transport layer for wire-format details, a client layer talking
//! to the provider, and a dispatcher that paces sends one at a time.
//!
//! ```rust,no_run
//! use smsbatch::{BulkSender, Channel, MessageBody, Settings, Table};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::from_env()?;
//!     let sender = BulkSender::from_settings(&settings, Channel::Sms)?;
//!     let table = Table::load("contacts.xlsx", settings.max_file_size)?;
//!     let body = MessageBody::new("Clinic closed on Friday")?;
//!     let report = sender
//!         .send_bulk(&table, None, &body, &CancellationToken::new())
//!         .await?;
//!     println!("{}", report.to_json()?);
//!     Ok(())
//! }
//! ```
#![forbid(unsafe_code)]

pub mod bulk;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod gate;
pub mod table;
mod transport;

pub use bulk::{BatchError, BulkSender};
pub use client::{
    Auth, ProviderClient, ProviderError, TwilioClient, TwilioClientBuilder, UnconfiguredProvider,
};
pub use config::{ConfigError, LogFormat, Settings};
pub use dispatch::Dispatcher;
pub use domain::{
    AccountSid, AuthToken, BatchReport, BatchStatus, CallingCode, Channel, MessageBody,
    NumberFormat, OutcomeStatus, ProviderMessageId, RawCell, RecipientIdentifier, RejectedEntry,
    SendOutcome, SenderAddress, ValidationError,
};
pub use gate::{CredentialGate, ProviderCredential};
pub use table::{ExtractError, Extraction, Row, Table, TableError, extract};
