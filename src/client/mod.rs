//! Client layer: the provider seam used by the dispatcher and its Twilio implementation.

use std::error::Error as StdError;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::domain::{
    AccountSid, AuthToken, MessageBody, ProviderMessageId, SenderAddress, ValidationError,
};

const DEFAULT_API_BASE: &str = "https://api.twilio.com";

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Anything that can deliver one message and report the provider's message id.
///
/// Implementations are shared across concurrent batches, so they must not keep per-call
/// state. Every error is treated by the dispatcher as a failure of that one recipient.
pub trait ProviderClient: Send + Sync {
    fn send<'a>(
        &'a self,
        to: &'a str,
        from: &'a SenderAddress,
        body: &'a MessageBody,
    ) -> BoxFuture<'a, Result<ProviderMessageId, ProviderError>>;
}

#[derive(Debug, thiserror::Error)]
/// Errors returned by a [`ProviderClient`].
pub enum ProviderError {
    /// HTTP client / transport failure (DNS, TLS, timeouts, etc).
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn StdError + Send + Sync>),

    /// Non-successful HTTP status without a provider error document.
    #[error("unexpected HTTP status: {status}")]
    HttpStatus { status: u16, body: Option<String> },

    /// The provider rejected the message and explained why.
    #[error("provider rejected the message (HTTP {status}): {message}")]
    Api {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    /// Response body could not be parsed as the expected format.
    #[error("parse error: {0}")]
    Parse(#[source] Box<dyn StdError + Send + Sync>),

    /// No credentials were available when the client was wired.
    #[error("provider credentials not configured")]
    NotConfigured,

    #[error("invalid API endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    /// One of the domain constructors rejected an invalid value.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Clone)]
struct HttpResponse {
    status: u16,
    body: String,
}

trait HttpTransport: Send + Sync {
    fn post_form<'a>(
        &'a self,
        url: &'a str,
        auth: &'a Auth,
        params: Vec<(String, String)>,
    ) -> BoxFuture<'a, Result<HttpResponse, Box<dyn StdError + Send + Sync>>>;
}

#[derive(Debug, Clone)]
struct ReqwestTransport {
    client: reqwest::Client,
}

impl HttpTransport for ReqwestTransport {
    fn post_form<'a>(
        &'a self,
        url: &'a str,
        auth: &'a Auth,
        params: Vec<(String, String)>,
    ) -> BoxFuture<'a, Result<HttpResponse, Box<dyn StdError + Send + Sync>>> {
        Box::pin(async move {
            let response = self
                .client
                .post(url)
                .basic_auth(auth.account.as_str(), Some(auth.token.as_str()))
                .form(&params)
                .send()
                .await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok(HttpResponse { status, body })
        })
    }
}

#[derive(Debug, Clone)]
/// HTTP basic-auth credentials for the Messages API.
pub struct Auth {
    account: AccountSid,
    token: AuthToken,
}

impl Auth {
    pub fn new(account: AccountSid, token: AuthToken) -> Self {
        Self { account, token }
    }

    /// Validate both parts; either may come straight from configuration.
    pub fn basic(
        account: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            account: AccountSid::new(account)?,
            token: AuthToken::new(token)?,
        })
    }

    pub fn account(&self) -> &AccountSid {
        &self.account
    }
}

#[derive(Debug, Clone)]
/// Builder for [`TwilioClient`].
///
/// Use this when you need to customize the API base URL, timeout, or user-agent.
pub struct TwilioClientBuilder {
    auth: Auth,
    api_base: String,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl TwilioClientBuilder {
    pub fn new(auth: Auth) -> Self {
        Self {
            auth,
            api_base: DEFAULT_API_BASE.to_owned(),
            timeout: None,
            user_agent: None,
        }
    }

    /// Override the API base URL (useful for test doubles and regional edges).
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set an HTTP client timeout applied to the entire request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn build(self) -> Result<TwilioClient, ProviderError> {
        let endpoint = messages_endpoint(&self.api_base, &self.auth.account)?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent);
        }

        let client = builder
            .build()
            .map_err(|err| ProviderError::Transport(Box::new(err)))?;

        Ok(TwilioClient {
            auth: self.auth,
            endpoint,
            http: Arc::new(ReqwestTransport { client }),
        })
    }
}

fn messages_endpoint(api_base: &str, account: &AccountSid) -> Result<String, ProviderError> {
    let mut base = Url::parse(api_base.trim())?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    let endpoint = base.join(&crate::transport::messages_path(account))?;
    Ok(endpoint.into())
}

#[derive(Clone)]
/// [`ProviderClient`] for the Twilio Messages REST API.
///
/// Sends are form-encoded `POST`s to `/2010-04-01/Accounts/{AccountSid}/Messages.json`
/// authenticated with HTTP basic auth. The same client serves SMS and WhatsApp; the
/// channel is encoded in the `To`/`From` addresses.
pub struct TwilioClient {
    auth: Auth,
    endpoint: String,
    http: Arc<dyn HttpTransport>,
}

impl TwilioClient {
    pub fn new(auth: Auth) -> Result<Self, ProviderError> {
        TwilioClientBuilder::new(auth).build()
    }

    pub fn builder(auth: Auth) -> TwilioClientBuilder {
        TwilioClientBuilder::new(auth)
    }

    /// Fully resolved Messages endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one message.
    ///
    /// Errors:
    /// - [`ProviderError::Api`] when the provider returns an error document,
    /// - [`ProviderError::HttpStatus`] for other non-2xx responses,
    /// - [`ProviderError::Parse`] when an accepted response carries no usable `sid`.
    pub async fn send_message(
        &self,
        to: &str,
        from: &SenderAddress,
        body: &MessageBody,
    ) -> Result<ProviderMessageId, ProviderError> {
        let params = crate::transport::encode_message_form(to, from, body);

        tracing::debug!(to, endpoint = %self.endpoint, "posting message");
        let response = self
            .http
            .post_form(&self.endpoint, &self.auth, params)
            .await
            .map_err(ProviderError::Transport)?;

        if !(200..=299).contains(&response.status) {
            if let Some(api) = crate::transport::decode_error_response(&response.body) {
                return Err(ProviderError::Api {
                    status: response.status,
                    code: api.code,
                    message: api.message,
                });
            }
            let body = if response.body.trim().is_empty() {
                None
            } else {
                Some(response.body)
            };
            return Err(ProviderError::HttpStatus {
                status: response.status,
                body,
            });
        }

        crate::transport::decode_message_response(&response.body)
            .map_err(|err| ProviderError::Parse(Box::new(err)))
    }
}

impl ProviderClient for TwilioClient {
    fn send<'a>(
        &'a self,
        to: &'a str,
        from: &'a SenderAddress,
        body: &'a MessageBody,
    ) -> BoxFuture<'a, Result<ProviderMessageId, ProviderError>> {
        Box::pin(self.send_message(to, from, body))
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// Stand-in wired when credentials are missing: every send fails with
/// [`ProviderError::NotConfigured`].
pub struct UnconfiguredProvider;

impl ProviderClient for UnconfiguredProvider {
    fn send<'a>(
        &'a self,
        _to: &'a str,
        _from: &'a SenderAddress,
        _body: &'a MessageBody,
    ) -> BoxFuture<'a, Result<ProviderMessageId, ProviderError>> {
        Box::pin(async { Err(ProviderError::NotConfigured) })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Clone)]
    struct FakeTransport {
        state: Arc<Mutex<FakeTransportState>>,
    }

    #[derive(Debug)]
    struct FakeTransportState {
        last_url: Option<String>,
        last_user: Option<String>,
        last_params: Vec<(String, String)>,
        response_status: u16,
        response_body: String,
    }

    impl FakeTransport {
        fn new(response_status: u16, response_body: impl Into<String>) -> Self {
            Self {
                state: Arc::new(Mutex::new(FakeTransportState {
                    last_url: None,
                    last_user: None,
                    last_params: Vec::new(),
                    response_status,
                    response_body: response_body.into(),
                })),
            }
        }

        fn last_request(&self) -> (Option<String>, Option<String>, Vec<(String, String)>) {
            let state = self.state.lock().unwrap();
            (
                state.last_url.clone(),
                state.last_user.clone(),
                state.last_params.clone(),
            )
        }
    }

    impl HttpTransport for FakeTransport {
        fn post_form<'a>(
            &'a self,
            url: &'a str,
            auth: &'a Auth,
            params: Vec<(String, String)>,
        ) -> BoxFuture<'a, Result<HttpResponse, Box<dyn StdError + Send + Sync>>> {
            Box::pin(async move {
                let (status, body) = {
                    let mut state = self.state.lock().unwrap();
                    state.last_url = Some(url.to_owned());
                    state.last_user = Some(auth.account.as_str().to_owned());
                    state.last_params = params;
                    (state.response_status, state.response_body.clone())
                };
                Ok(HttpResponse { status, body })
            })
        }
    }

    #[derive(Debug)]
    struct FailingTransport;

    impl HttpTransport for FailingTransport {
        fn post_form<'a>(
            &'a self,
            _url: &'a str,
            _auth: &'a Auth,
            _params: Vec<(String, String)>,
        ) -> BoxFuture<'a, Result<HttpResponse, Box<dyn StdError + Send + Sync>>> {
            Box::pin(async {
                Err::<HttpResponse, Box<dyn StdError + Send + Sync>>("connection reset".into())
            })
        }
    }

    fn assert_param(params: &[(String, String)], key: &str, value: &str) {
        assert!(
            params.iter().any(|(k, v)| k == key && v == value),
            "missing param {key}={value}; got: {params:?}"
        );
    }

    fn make_client(http: Arc<dyn HttpTransport>) -> TwilioClient {
        TwilioClient {
            auth: Auth::basic("AC123", "token").unwrap(),
            endpoint: "https://example.invalid/2010-04-01/Accounts/AC123/Messages.json"
                .to_owned(),
            http,
        }
    }

    fn sender() -> SenderAddress {
        SenderAddress::new("+15005550006").unwrap()
    }

    fn body() -> MessageBody {
        MessageBody::new("hello").unwrap()
    }

    #[tokio::test]
    async fn send_posts_form_and_returns_sid() {
        let transport = FakeTransport::new(201, r#"{"sid": "SM42", "status": "queued"}"#);
        let client = make_client(Arc::new(transport.clone()));

        let sid = client
            .send_message("+919876543210", &sender(), &body())
            .await
            .unwrap();
        assert_eq!(sid.as_str(), "SM42");

        let (url, user, params) = transport.last_request();
        assert_eq!(
            url.as_deref(),
            Some("https://example.invalid/2010-04-01/Accounts/AC123/Messages.json")
        );
        assert_eq!(user.as_deref(), Some("AC123"));
        assert_param(&params, "To", "+919876543210");
        assert_param(&params, "From", "+15005550006");
        assert_param(&params, "Body", "hello");
    }

    #[tokio::test]
    async fn send_maps_error_document_to_api_error() {
        let json = r#"{"code": 21608, "message": "The number is unverified.", "status": 400}"#;
        let client = make_client(Arc::new(FakeTransport::new(400, json)));

        let err = client
            .send_message("+919876543210", &sender(), &body())
            .await
            .unwrap_err();
        match err {
            ProviderError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 400);
                assert_eq!(code, Some(21608));
                assert_eq!(message, "The number is unverified.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_maps_non_success_http_status() {
        let client = make_client(Arc::new(FakeTransport::new(502, "bad gateway")));
        let err = client
            .send_message("+919876543210", &sender(), &body())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProviderError::HttpStatus {
                status: 502,
                body: Some(_)
            }
        ));
    }

    #[tokio::test]
    async fn send_maps_empty_http_body_to_none() {
        let client = make_client(Arc::new(FakeTransport::new(503, "   ")));
        let err = client
            .send_message("+919876543210", &sender(), &body())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProviderError::HttpStatus {
                status: 503,
                body: None
            }
        ));
    }

    #[tokio::test]
    async fn send_maps_invalid_json_to_parse_error() {
        let client = make_client(Arc::new(FakeTransport::new(201, "{ not json }")));
        let err = client
            .send_message("+919876543210", &sender(), &body())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Parse(_)));
    }

    #[tokio::test]
    async fn send_maps_transport_failure() {
        let client = make_client(Arc::new(FailingTransport));
        let err = client
            .send_message("+919876543210", &sender(), &body())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Transport(_)));
        assert_eq!(err.to_string(), "transport error: connection reset");
    }

    #[tokio::test]
    async fn unconfigured_provider_always_fails() {
        let err = UnconfiguredProvider
            .send("+919876543210", &sender(), &body())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured));
    }

    #[test]
    fn auth_constructor_validates_inputs() {
        assert!(Auth::basic("   ", "token").is_err());
        assert!(Auth::basic("AC123", "").is_err());
    }

    #[test]
    fn builder_resolves_messages_endpoint() {
        let client = TwilioClient::builder(Auth::basic("AC123", "token").unwrap())
            .build()
            .unwrap();
        assert_eq!(
            client.endpoint(),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );

        let client = TwilioClient::builder(Auth::basic("AC123", "token").unwrap())
            .api_base("http://127.0.0.1:8080/mock")
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        assert_eq!(
            client.endpoint(),
            "http://127.0.0.1:8080/mock/2010-04-01/Accounts/AC123/Messages.json"
        );
    }

    #[test]
    fn builder_rejects_unparseable_base() {
        let err = TwilioClient::builder(Auth::basic("AC123", "token").unwrap())
            .api_base("not a url")
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, ProviderError::Endpoint(_)));
    }
}
