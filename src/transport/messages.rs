use serde::Deserialize;

use crate::domain::{AccountSid, MessageBody, ProviderMessageId, SenderAddress};

const API_VERSION: &str = "2010-04-01";

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response is missing a message sid")]
    MissingSid,
}

#[derive(Debug, Clone, Deserialize)]
struct MessageJsonResponse {
    #[serde(default)]
    sid: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorJsonResponse {
    #[serde(default)]
    code: Option<i64>,
    message: String,
}

/// Error document returned by the Messages API on non-2xx responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub code: Option<i64>,
    pub message: String,
}

/// Path of the Messages resource relative to the API base URL.
pub fn messages_path(account: &AccountSid) -> String {
    format!("{API_VERSION}/Accounts/{}/Messages.json", account.as_str())
}

pub fn encode_message_form(
    to: &str,
    from: &SenderAddress,
    body: &MessageBody,
) -> Vec<(String, String)> {
    vec![
        ("To".to_owned(), to.to_owned()),
        (SenderAddress::FIELD.to_owned(), from.as_str().to_owned()),
        (MessageBody::FIELD.to_owned(), body.as_str().to_owned()),
    ]
}

pub fn decode_message_response(json: &str) -> Result<ProviderMessageId, TransportError> {
    let parsed: MessageJsonResponse = serde_json::from_str(json)?;
    parsed
        .sid
        .and_then(|sid| ProviderMessageId::new(sid).ok())
        .ok_or(TransportError::MissingSid)
}

/// Returns `None` when the body is not a provider error document.
pub fn decode_error_response(json: &str) -> Option<ApiError> {
    let parsed: ErrorJsonResponse = serde_json::from_str(json).ok()?;
    Some(ApiError {
        code: parsed.code,
        message: parsed.message,
    })
}
