//! Client for the external SMS OTP provider.
//!
//! The provider exposes two GET endpoints keyed by a pre-shared API key in the path. Both
//! answer with `{"Status": ..., "Details": ...}`; `Status == "Success"` is the only positive
//! outcome.

use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::domain::SessionId;
use crate::config::OtpProviderConfig;

const SUCCESS_STATUS: &str = "Success";

/// Session returned by a successful send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpSession {
    pub session_id: SessionId,
}

/// Outcome of checking a code. A mismatch is an answer, not a fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpVerification {
    Matched,
    Mismatched { details: String },
}

/// Upstream failures while talking to the provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("otp provider rejected the request: {0}")]
    Rejected(String),
    #[error("otp provider unreachable: {0}")]
    Transport(String),
    #[error("otp provider returned HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
    #[error("otp provider returned a malformed response: {0}")]
    MalformedResponse(String),
    #[error("otp provider misconfigured: {0}")]
    Configuration(String),
}

/// Seam between the qualification service and the SMS provider.
#[async_trait]
pub trait OtpProvider: Send + Sync {
    async fn send_otp(&self, phone: &str) -> Result<OtpSession, ProviderError>;
    async fn verify_otp(
        &self,
        session_id: &SessionId,
        code: &str,
    ) -> Result<OtpVerification, ProviderError>;
}

#[derive(Debug, Deserialize)]
struct ProviderReply {
    #[serde(rename = "Status")]
    status: String,
    #[serde(rename = "Details", default)]
    details: String,
}

impl ProviderReply {
    fn is_success(&self) -> bool {
        self.status == SUCCESS_STATUS
    }
}

/// 2Factor-style HTTP client.
#[derive(Clone)]
pub struct TwoFactorClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl fmt::Debug for TwoFactorClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwoFactorClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl TwoFactorClient {
    pub fn new(config: &OtpProviderConfig) -> Result<Self, ProviderError> {
        if config.base_url.cannot_be_a_base() {
            return Err(ProviderError::Configuration(format!(
                "{} cannot be used as a base url",
                config.base_url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("lead-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| ProviderError::Configuration(err.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ProviderError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::Configuration("provider url cannot be a base".into()))?
            .pop_if_empty()
            .push(&self.api_key)
            .extend(segments);
        Ok(url)
    }

    async fn call(&self, url: Url) -> Result<ProviderReply, ProviderError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| ProviderError::Transport(err.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| ProviderError::Transport(err.without_url().to_string()))?;

        match serde_json::from_str::<ProviderReply>(&body) {
            Ok(reply) => Ok(reply),
            Err(_) if !status.is_success() => Err(ProviderError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            }),
            Err(err) => Err(ProviderError::MalformedResponse(err.to_string())),
        }
    }
}

#[async_trait]
impl OtpProvider for TwoFactorClient {
    async fn send_otp(&self, phone: &str) -> Result<OtpSession, ProviderError> {
        let url = self.endpoint(&["SMS", phone, "AUTOGEN"])?;
        let reply = self.call(url).await?;

        if !reply.is_success() {
            return Err(ProviderError::Rejected(reply.details));
        }
        if reply.details.trim().is_empty() {
            return Err(ProviderError::MalformedResponse(
                "success reply carried no session id".to_string(),
            ));
        }

        Ok(OtpSession {
            session_id: SessionId(reply.details),
        })
    }

    async fn verify_otp(
        &self,
        session_id: &SessionId,
        code: &str,
    ) -> Result<OtpVerification, ProviderError> {
        let url = self.endpoint(&["SMS", "VERIFY", session_id.0.as_str(), code])?;
        let reply = self.call(url).await?;

        if reply.is_success() {
            Ok(OtpVerification::Matched)
        } else {
            Ok(OtpVerification::Mismatched {
                details: reply.details,
            })
        }
    }
}
