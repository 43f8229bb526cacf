use std::fmt;

use chrono::{DateTime, Utc};

use crate::domain::normalize::RawCell;
use crate::domain::value::{MessageBody, ProviderMessageId, RecipientIdentifier};

#[derive(Debug, Clone, PartialEq)]
/// A source row whose value did not normalize. Rendered as `Row <n>: <value>`.
pub struct RejectedEntry {
    row: usize,
    value: RawCell,
}

impl RejectedEntry {
    pub fn new(row: usize, value: RawCell) -> Self {
        Self { row, value }
    }

    /// 1-based physical row in the source file (the header row is row 1 for CSV).
    pub fn row(&self) -> usize {
        self.row
    }

    pub fn value(&self) -> &RawCell {
        &self.value
    }
}

impl fmt::Display for RejectedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}: {}", self.row, self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeStatus {
    Success,
    Failed,
}

impl OutcomeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Delivery {
    Accepted(ProviderMessageId),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Result of one send attempt.
///
/// A provider message id is present iff the send succeeded; an error detail iff it failed.
pub struct SendOutcome {
    recipient: RecipientIdentifier,
    address: String,
    delivery: Delivery,
    timestamp: DateTime<Utc>,
}

impl SendOutcome {
    pub fn success(
        recipient: RecipientIdentifier,
        address: impl Into<String>,
        message_id: ProviderMessageId,
    ) -> Self {
        Self {
            recipient,
            address: address.into(),
            delivery: Delivery::Accepted(message_id),
            timestamp: Utc::now(),
        }
    }

    pub fn failed(
        recipient: RecipientIdentifier,
        address: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            recipient,
            address: address.into(),
            delivery: Delivery::Failed(error.into()),
            timestamp: Utc::now(),
        }
    }

    pub fn recipient(&self) -> &RecipientIdentifier {
        &self.recipient
    }

    /// Destination address handed to the provider.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn status(&self) -> OutcomeStatus {
        match self.delivery {
            Delivery::Accepted(_) => OutcomeStatus::Success,
            Delivery::Failed(_) => OutcomeStatus::Failed,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == OutcomeStatus::Success
    }

    pub fn message_id(&self) -> Option<&ProviderMessageId> {
        match &self.delivery {
            Delivery::Accepted(id) => Some(id),
            Delivery::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.delivery {
            Delivery::Accepted(_) => None,
            Delivery::Failed(detail) => Some(detail),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchStatus {
    /// Every valid recipient was attempted.
    Completed,
    /// The run stopped between sends; remaining recipients were never attempted.
    Cancelled,
}

impl BatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Aggregated result of one batch.
///
/// Invariant: `successful() + failed() == total_valid() == outcomes().len()`.
pub struct BatchReport {
    status: BatchStatus,
    successful: usize,
    failed: usize,
    not_attempted: usize,
    invalid: Vec<RejectedEntry>,
    outcomes: Vec<SendOutcome>,
    message: MessageBody,
}

impl BatchReport {
    pub(crate) fn assemble(
        outcomes: Vec<SendOutcome>,
        invalid: Vec<RejectedEntry>,
        message: MessageBody,
        not_attempted: usize,
    ) -> Self {
        let successful = outcomes.iter().filter(|o| o.is_success()).count();
        let failed = outcomes.len() - successful;
        let status = if not_attempted == 0 {
            BatchStatus::Completed
        } else {
            BatchStatus::Cancelled
        };
        Self {
            status,
            successful,
            failed,
            not_attempted,
            invalid,
            outcomes,
            message,
        }
    }

    pub fn status(&self) -> BatchStatus {
        self.status
    }

    /// Number of recipients attempted.
    pub fn total_valid(&self) -> usize {
        self.outcomes.len()
    }

    pub fn successful(&self) -> usize {
        self.successful
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Valid recipients skipped because the run was cancelled.
    pub fn not_attempted(&self) -> usize {
        self.not_attempted
    }

    pub fn invalid_entries(&self) -> &[RejectedEntry] {
        &self.invalid
    }

    /// Outcomes in the order recipients were supplied.
    pub fn outcomes(&self) -> &[SendOutcome] {
        &self.outcomes
    }

    pub fn message(&self) -> &MessageBody {
        &self.message
    }
}
