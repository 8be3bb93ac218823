use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::api::{
    CHAT_PATH, CONFIG_PATH, OTP_PATH, VERIFY_OTP_PATH, WidgetApi, conversation_path, otp_delivered,
    verified_token, widget_url,
};
use crate::config::WidgetConfigPatch;
use crate::errors::WidgetError;
use crate::models::{
    ChatReply, ChatRequest, ChatResponseBody, HistoryResponse, Message, OtpRequest, OtpResponse,
    VerifyOtpRequest, VerifyOtpResponse,
};

/// [`WidgetApi`] over reqwest, for native hosts.
#[derive(Debug, Clone)]
pub struct HttpWidgetApi {
    client: Client,
    base_url: String,
}

impl HttpWidgetApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, public_key: &str, suffix: &str) -> String {
        widget_url(&self.base_url, public_key, suffix)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, String> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| format!("Network error: {e}"))?;
        decode(resp).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, String> {
        let resp = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| format!("Network error: {e}"))?;
        decode(resp).await
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, String> {
    if !resp.status().is_success() {
        return Err(format!("Server error: {}", resp.status()));
    }
    resp.json::<T>()
        .await
        .map_err(|e| format!("Parse error: {e}"))
}

#[async_trait(?Send)]
impl WidgetApi for HttpWidgetApi {
    async fn fetch_config(&self, public_key: &str) -> Result<WidgetConfigPatch, WidgetError> {
        tracing::debug!("Fetching configuration for public key: {public_key}");
        self.get_json(&self.url(public_key, CONFIG_PATH), &[])
            .await
            .map_err(WidgetError::config_fetch)
    }

    async fn send_otp(
        &self,
        public_key: &str,
        email: &str,
        name: &str,
    ) -> Result<bool, WidgetError> {
        let body = OtpRequest { email, name };
        self.post_json::<_, OtpResponse>(&self.url(public_key, OTP_PATH), &body)
            .await
            .map(otp_delivered)
            .map_err(WidgetError::otp_send)
    }

    async fn verify_otp(
        &self,
        public_key: &str,
        email: &str,
        code: &str,
    ) -> Result<String, WidgetError> {
        let body = VerifyOtpRequest { email, code };
        let resp: VerifyOtpResponse = self
            .post_json(&self.url(public_key, VERIFY_OTP_PATH), &body)
            .await
            .map_err(WidgetError::otp_verify)?;
        verified_token(resp)
    }

    async fn send_message(
        &self,
        public_key: &str,
        token: Option<&str>,
        conversation_id: Option<&str>,
        message: &str,
    ) -> Result<ChatReply, WidgetError> {
        let body = ChatRequest {
            token,
            message,
            conversation_id,
        };
        self.post_json::<_, ChatResponseBody>(&self.url(public_key, CHAT_PATH), &body)
            .await
            .map(ChatResponseBody::into_reply)
            .map_err(WidgetError::chat_send)
    }

    async fn load_history(
        &self,
        public_key: &str,
        conversation_id: &str,
        token: Option<&str>,
    ) -> Result<Vec<Message>, WidgetError> {
        let url = self.url(public_key, &conversation_path(conversation_id));
        let query: Vec<(&str, &str)> = token.map(|t| ("token", t)).into_iter().collect();
        self.get_json::<HistoryResponse>(&url, &query)
            .await
            .map(HistoryResponse::into_messages)
            .map_err(WidgetError::history_load)
    }
}
