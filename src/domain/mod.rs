//! Domain layer: strong types with validation and invariants (no I/O).

mod normalize;
mod outcome;
mod validation;
mod value;

pub use normalize::{NumberFormat, RawCell};
pub use outcome::{BatchReport, BatchStatus, OutcomeStatus, RejectedEntry, SendOutcome};
pub use validation::ValidationError;
pub use value::{
    AccountSid, AuthToken, CallingCode, Channel, MessageBody, ProviderMessageId,
    RecipientIdentifier, SenderAddress,
};
