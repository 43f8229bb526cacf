use chrono::SecondsFormat;
use serde::Serialize;

use crate::domain::{BatchReport, BatchStatus, SendOutcome};

#[derive(Debug, Serialize)]
struct BatchReportJson<'a> {
    status: &'static str,
    total_numbers: usize,
    successful: usize,
    failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    not_attempted: Option<usize>,
    invalid_numbers: Vec<String>,
    results: Vec<OutcomeJson<'a>>,
    message_sent: &'a str,
}

#[derive(Debug, Serialize)]
struct OutcomeJson<'a> {
    number: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sid: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
}

impl<'a> OutcomeJson<'a> {
    fn new(outcome: &'a SendOutcome, with_timestamp: bool) -> Self {
        Self {
            number: outcome.address(),
            status: outcome.status().as_str(),
            error: outcome.error(),
            sid: outcome.message_id().map(|id| id.as_str()),
            timestamp: with_timestamp
                .then(|| outcome.timestamp().to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }
}

pub fn encode_batch_report(report: &BatchReport) -> serde_json::Result<serde_json::Value> {
    let json = BatchReportJson {
        status: report.status().as_str(),
        total_numbers: report.total_valid(),
        successful: report.successful(),
        failed: report.failed(),
        not_attempted: (report.status() == BatchStatus::Cancelled)
            .then_some(report.not_attempted()),
        invalid_numbers: report
            .invalid_entries()
            .iter()
            .map(ToString::to_string)
            .collect(),
        results: report
            .outcomes()
            .iter()
            .map(|outcome| OutcomeJson::new(outcome, true))
            .collect(),
        message_sent: report.message().as_str(),
    };
    serde_json::to_value(json)
}

/// Single-send record: `{number, status, error?, sid?}`.
pub fn encode_single_outcome(outcome: &SendOutcome) -> serde_json::Result<serde_json::Value> {
    serde_json::to_value(OutcomeJson::new(outcome, false))
}

impl BatchReport {
    /// JSON document handed back to the caller after a bulk send.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        encode_batch_report(self)
    }
}

impl SendOutcome {
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        encode_single_outcome(self)
    }
}
