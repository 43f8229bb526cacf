//! Paced, strictly sequential delivery of one message to many recipients.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::client::ProviderClient;
use crate::domain::{
    BatchReport, CallingCode, Channel, MessageBody, RecipientIdentifier, RejectedEntry,
    SenderAddress, SendOutcome,
};

/// Interval the provider's trial accounts tolerate between messages.
pub const DEFAULT_MESSAGE_DELAY: Duration = Duration::from_secs(1);

#[derive(Clone)]
/// Sends one message body to each recipient in order, one at a time.
///
/// Provider accounts are throttled per account, so sends are never issued in parallel:
/// the dispatcher waits `delay` after every send except the last. A failed send is
/// recorded in the report and the loop moves on; nothing is retried.
pub struct Dispatcher {
    provider: Arc<dyn ProviderClient>,
    sender: SenderAddress,
    channel: Channel,
    calling_code: CallingCode,
    delay: Duration,
}

impl Dispatcher {
    pub fn new(
        provider: Arc<dyn ProviderClient>,
        sender: SenderAddress,
        calling_code: CallingCode,
    ) -> Self {
        Self {
            provider,
            sender,
            channel: Channel::Sms,
            calling_code,
            delay: DEFAULT_MESSAGE_DELAY,
        }
    }

    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Destination address for a recipient: E.164, plus the channel scheme if any.
    pub fn address_for(&self, recipient: &RecipientIdentifier) -> String {
        self.channel.address(&self.calling_code.e164(recipient))
    }

    /// Attempt one send. Provider failures become a failed outcome, never an error.
    pub async fn send_one(
        &self,
        recipient: &RecipientIdentifier,
        body: &MessageBody,
    ) -> SendOutcome {
        let address = self.address_for(recipient);
        let from = self.sender.for_channel(self.channel);

        match self.provider.send(&address, &from, body).await {
            Ok(message_id) => {
                info!(to = %address, sid = message_id.as_str(), "message sent");
                SendOutcome::success(recipient.clone(), address, message_id)
            }
            Err(err) => {
                error!(to = %address, error = %err, "message failed");
                SendOutcome::failed(recipient.clone(), address, err.to_string())
            }
        }
    }

    /// Send to every recipient and report. `recipients` should be non-empty; callers
    /// reject an empty valid set upstream.
    pub async fn dispatch(
        &self,
        recipients: &[RecipientIdentifier],
        body: &MessageBody,
    ) -> BatchReport {
        self.dispatch_batch(recipients, Vec::new(), body, &CancellationToken::new())
            .await
    }

    /// Send to every recipient, carrying the extraction's rejects into the report.
    ///
    /// Cancellation is honored before each send and while waiting between sends. A send
    /// already handed to the provider is not retracted; the report then contains only the
    /// completed attempts and counts the rest as not attempted.
    pub async fn dispatch_batch(
        &self,
        recipients: &[RecipientIdentifier],
        invalid: Vec<RejectedEntry>,
        body: &MessageBody,
        cancel: &CancellationToken,
    ) -> BatchReport {
        info!(
            recipients = recipients.len(),
            rejected = invalid.len(),
            channel = %self.channel,
            delay_ms = self.delay.as_millis() as u64,
            "dispatch started"
        );

        let mut outcomes = Vec::with_capacity(recipients.len());
        for (idx, recipient) in recipients.iter().enumerate() {
            if cancel.is_cancelled() {
                break;
            }

            outcomes.push(self.send_one(recipient, body).await);

            if idx + 1 < recipients.len() {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        break;
                    }
                    _ = tokio::time::sleep(self.delay) => {}
                }
            }
        }

        let not_attempted = recipients.len() - outcomes.len();
        if not_attempted > 0 {
            warn!(
                attempted = outcomes.len(),
                not_attempted, "dispatch cancelled between sends"
            );
        }

        let report = BatchReport::assemble(outcomes, invalid, body.clone(), not_attempted);
        info!(
            successful = report.successful(),
            failed = report.failed(),
            status = report.status().as_str(),
            "dispatch finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tokio::time::Instant;

    use super::*;
    use crate::client::{BoxFuture, ProviderError, UnconfiguredProvider};
    use crate::domain::{BatchStatus, NumberFormat, OutcomeStatus, ProviderMessageId, RawCell};

    #[derive(Debug)]
    struct Call {
        to: String,
        from: String,
        at: Instant,
    }

    /// Fails for any address listed in `fail_for`, records every call.
    #[derive(Default)]
    struct RecordingProvider {
        fail_for: Vec<String>,
        calls: Mutex<Vec<Call>>,
    }

    impl RecordingProvider {
        fn failing_for(addresses: &[&str]) -> Self {
            Self {
                fail_for: addresses.iter().map(|s| (*s).to_owned()).collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(String, String, Instant)> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|c| (c.to.clone(), c.from.clone(), c.at))
                .collect()
        }
    }

    impl ProviderClient for RecordingProvider {
        fn send<'a>(
            &'a self,
            to: &'a str,
            from: &'a SenderAddress,
            _body: &'a MessageBody,
        ) -> BoxFuture<'a, Result<ProviderMessageId, ProviderError>> {
            Box::pin(async move {
                let seq = {
                    let mut calls = self.calls.lock().unwrap();
                    calls.push(Call {
                        to: to.to_owned(),
                        from: from.as_str().to_owned(),
                        at: Instant::now(),
                    });
                    calls.len()
                };
                if self.fail_for.iter().any(|a| a == to) {
                    return Err(ProviderError::Api {
                        status: 400,
                        code: Some(21211),
                        message: format!("The 'To' number {to} is not valid."),
                    });
                }
                Ok(ProviderMessageId::new(format!("SM{seq}")).unwrap())
            })
        }
    }

    fn recipients(raw: &[&str]) -> Vec<RecipientIdentifier> {
        let format = NumberFormat::default();
        raw.iter()
            .map(|r| format.normalize_str(r).unwrap())
            .collect()
    }

    fn dispatcher(provider: Arc<dyn ProviderClient>, delay: Duration) -> Dispatcher {
        Dispatcher::new(
            provider,
            SenderAddress::new("+15005550006").unwrap(),
            CallingCode::default(),
        )
        .with_delay(delay)
    }

    fn body() -> MessageBody {
        MessageBody::new("hello").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn outcomes_follow_input_order_and_prefix_calling_code() {
        let provider = Arc::new(RecordingProvider::default());
        let dispatcher = dispatcher(provider.clone(), Duration::from_secs(1));

        let report = dispatcher
            .dispatch(&recipients(&["9876543210", "9876543211", "9876543212"]), &body())
            .await;

        assert_eq!(report.status(), BatchStatus::Completed);
        assert_eq!(report.total_valid(), 3);
        assert_eq!(report.successful(), 3);
        let addresses: Vec<&str> = report.outcomes().iter().map(SendOutcome::address).collect();
        assert_eq!(
            addresses,
            vec!["+919876543210", "+919876543211", "+919876543212"]
        );
        assert_eq!(
            report.outcomes()[2].message_id().map(ProviderMessageId::as_str),
            Some("SM3")
        );
        assert_eq!(report.message().as_str(), "hello");
    }

    #[tokio::test(start_paused = true)]
    async fn one_failure_does_not_stop_the_batch() {
        let provider = Arc::new(RecordingProvider::failing_for(&["+919876543211"]));
        let dispatcher = dispatcher(provider.clone(), Duration::from_secs(1));

        let report = dispatcher
            .dispatch(&recipients(&["9876543210", "9876543211", "9876543212"]), &body())
            .await;

        assert_eq!(provider.calls().len(), 3);
        assert_eq!(report.successful(), 2);
        assert_eq!(report.failed(), 1);
        let failed = &report.outcomes()[1];
        assert_eq!(failed.status(), OutcomeStatus::Failed);
        assert!(failed.error().unwrap().contains("not valid"));
        assert!(failed.message_id().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn all_failures_still_produce_a_report() {
        let dispatcher = dispatcher(Arc::new(UnconfiguredProvider), Duration::from_secs(1));

        let report = dispatcher
            .dispatch(&recipients(&["9876543210", "9876543211"]), &body())
            .await;

        assert_eq!(report.successful(), 0);
        assert_eq!(report.failed(), report.total_valid());
        assert_eq!(report.total_valid(), 2);
        assert_eq!(
            report.outcomes()[0].error(),
            Some("provider credentials not configured")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn delay_is_applied_only_between_sends() {
        let provider = Arc::new(RecordingProvider::default());
        let dispatcher = dispatcher(provider.clone(), Duration::from_secs(1));

        let started = Instant::now();
        dispatcher
            .dispatch(&recipients(&["9876543210", "9876543211"]), &body())
            .await;
        let elapsed = started.elapsed();

        let calls = provider.calls();
        assert_eq!(calls.len(), 2);
        let first = calls[0].2;
        let second = calls[1].2;
        assert_eq!(first - started, Duration::ZERO);
        assert_eq!(second - first, Duration::from_secs(1));
        // Exactly one suspension: none before the first send, none after the last.
        assert_eq!(elapsed, Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn single_recipient_never_waits() {
        let dispatcher = dispatcher(
            Arc::new(RecordingProvider::default()),
            Duration::from_secs(5),
        );
        let started = Instant::now();
        let report = dispatcher.dispatch(&recipients(&["9876543210"]), &body()).await;
        assert_eq!(report.total_valid(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_delay_truncates_outcomes() {
        let provider = Arc::new(RecordingProvider::default());
        let dispatcher = dispatcher(provider.clone(), Duration::from_secs(10));
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(15)).await;
            trigger.cancel();
        });

        let report = dispatcher
            .dispatch_batch(
                &recipients(&["9876543210", "9876543211", "9876543212", "9876543213"]),
                vec![RejectedEntry::new(4, RawCell::from("bad"))],
                &body(),
                &cancel,
            )
            .await;

        assert_eq!(provider.calls().len(), 2);
        assert_eq!(report.status(), BatchStatus::Cancelled);
        assert_eq!(report.total_valid(), 2);
        assert_eq!(report.not_attempted(), 2);
        assert_eq!(report.successful() + report.failed(), report.outcomes().len());
        assert_eq!(report.invalid_entries().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn already_cancelled_token_sends_nothing() {
        let provider = Arc::new(RecordingProvider::default());
        let dispatcher = dispatcher(provider.clone(), Duration::from_secs(1));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = dispatcher
            .dispatch_batch(&recipients(&["9876543210"]), Vec::new(), &body(), &cancel)
            .await;

        assert!(provider.calls().is_empty());
        assert_eq!(report.total_valid(), 0);
        assert_eq!(report.not_attempted(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn whatsapp_channel_prefixes_both_addresses() {
        let provider = Arc::new(RecordingProvider::default());
        let dispatcher = Dispatcher::new(
            provider.clone(),
            SenderAddress::new("+14155238886").unwrap(),
            CallingCode::default(),
        )
        .with_channel(Channel::WhatsApp);

        let outcome = dispatcher
            .send_one(&recipients(&["9876543210"])[0], &body())
            .await;

        assert_eq!(outcome.address(), "whatsapp:+919876543210");
        let calls = provider.calls();
        assert_eq!(calls[0].0, "whatsapp:+919876543210");
        assert_eq!(calls[0].1, "whatsapp:+14155238886");
    }
}
