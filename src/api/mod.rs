//! Protocol adapter for the backend's public widget namespace.
//!
//! [`WidgetApi`] is implemented once per transport (reqwest on native hosts,
//! gloo-net in the browser). URL layout and body decoding live here so every
//! transport behaves the same.

#[cfg(feature = "native")]
pub mod http;

use async_trait::async_trait;

use crate::config::WidgetConfigPatch;
use crate::errors::WidgetError;
use crate::models::{ChatReply, Message, OtpResponse, VerifyOtpResponse};
use crate::service::widget::Event;

pub const CONFIG_PATH: &str = "/config";
pub const OTP_PATH: &str = "/otp";
pub const VERIFY_OTP_PATH: &str = "/verify-otp";
pub const CHAT_PATH: &str = "/chat";

/// `{base}/api/public/widgets/{public_key}{suffix}`. The key is encoded as a
/// single path segment; `suffix` is expected to be encoded already.
pub fn widget_url(base_url: &str, public_key: &str, suffix: &str) -> String {
    format!(
        "{}/api/public/widgets/{}{suffix}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(public_key)
    )
}

pub fn conversation_path(conversation_id: &str) -> String {
    format!("/conversations/{}", urlencoding::encode(conversation_id))
}

/// A missing `success` flag on a 2xx response counts as sent.
pub fn otp_delivered(body: OtpResponse) -> bool {
    body.success.unwrap_or(true)
}

/// A 2xx verify response without a token is still a failed verification.
pub fn verified_token(body: VerifyOtpResponse) -> Result<String, WidgetError> {
    body.token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| WidgetError::otp_verify("response carried no token"))
}

/// The backend calls the widget makes. Implementations normalise every
/// transport or HTTP failure into the matching [`WidgetError`] variant.
#[async_trait(?Send)]
pub trait WidgetApi {
    async fn fetch_config(&self, public_key: &str) -> Result<WidgetConfigPatch, WidgetError>;

    async fn send_otp(&self, public_key: &str, email: &str, name: &str)
    -> Result<bool, WidgetError>;

    /// Returns the session token.
    async fn verify_otp(
        &self,
        public_key: &str,
        email: &str,
        code: &str,
    ) -> Result<String, WidgetError>;

    async fn send_message(
        &self,
        public_key: &str,
        token: Option<&str>,
        conversation_id: Option<&str>,
        message: &str,
    ) -> Result<ChatReply, WidgetError>;

    async fn load_history(
        &self,
        public_key: &str,
        conversation_id: &str,
        token: Option<&str>,
    ) -> Result<Vec<Message>, WidgetError>;
}

/// A backend call requested by the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiRequest {
    FetchConfig,
    SendOtp {
        seq: u64,
        email: String,
        name: String,
    },
    VerifyOtp {
        seq: u64,
        email: String,
        code: String,
    },
    SendMessage {
        seq: u64,
        token: Option<String>,
        conversation_id: Option<String>,
        message: String,
    },
    LoadHistory {
        seq: u64,
        conversation_id: String,
        token: Option<String>,
    },
}

/// Runs one request and wraps the outcome as the event the widget expects.
pub async fn perform<A: WidgetApi + ?Sized>(api: &A, public_key: &str, request: ApiRequest) -> Event {
    match request {
        ApiRequest::FetchConfig => Event::ConfigLoaded(api.fetch_config(public_key).await),
        ApiRequest::SendOtp { seq, email, name } => Event::OtpSent {
            seq,
            result: api.send_otp(public_key, &email, &name).await,
        },
        ApiRequest::VerifyOtp { seq, email, code } => Event::OtpVerified {
            seq,
            result: api.verify_otp(public_key, &email, &code).await,
        },
        ApiRequest::SendMessage {
            seq,
            token,
            conversation_id,
            message,
        } => Event::ReplyReceived {
            seq,
            result: api
                .send_message(
                    public_key,
                    token.as_deref(),
                    conversation_id.as_deref(),
                    &message,
                )
                .await,
        },
        ApiRequest::LoadHistory {
            seq,
            conversation_id,
            token,
        } => Event::HistoryLoaded {
            seq,
            result: api
                .load_history(public_key, &conversation_id, token.as_deref())
                .await,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_scoped_by_public_key() {
        assert_eq!(
            widget_url("https://app.example.com/", "pk_test", CONFIG_PATH),
            "https://app.example.com/api/public/widgets/pk_test/config"
        );
        assert_eq!(
            widget_url("http://localhost:3000", "pk", &conversation_path("c1")),
            "http://localhost:3000/api/public/widgets/pk/conversations/c1"
        );
    }

    #[test]
    fn path_segments_are_percent_encoded() {
        assert_eq!(
            widget_url("http://h", "pk/../x", &conversation_path("a/b?c#d e")),
            "http://h/api/public/widgets/pk%2F..%2Fx/conversations/a%2Fb%3Fc%23d%20e"
        );
    }

    #[test]
    fn otp_success_flag_defaults_to_sent() {
        assert!(otp_delivered(OtpResponse { success: None }));
        assert!(!otp_delivered(OtpResponse { success: Some(false) }));
    }

    #[test]
    fn verify_requires_a_non_empty_token() {
        assert_eq!(
            verified_token(VerifyOtpResponse { token: Some("tok1".into()) }),
            Ok("tok1".to_string())
        );
        assert!(matches!(
            verified_token(VerifyOtpResponse { token: Some(String::new()) }),
            Err(WidgetError::OtpVerifyFailed { .. })
        ));
        assert!(verified_token(VerifyOtpResponse { token: None }).is_err());
    }
}
