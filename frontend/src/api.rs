use async_trait::async_trait;
use gloo_net::http::Request;
use serde::Serialize;
use serde::de::DeserializeOwned;

use beyond_widget::WidgetError;
use beyond_widget::api::{
    CHAT_PATH, CONFIG_PATH, OTP_PATH, VERIFY_OTP_PATH, WidgetApi, conversation_path, otp_delivered,
    verified_token, widget_url,
};
use beyond_widget::config::WidgetConfigPatch;
use beyond_widget::models::{
    ChatReply, ChatRequest, ChatResponseBody, HistoryResponse, Message, OtpRequest, OtpResponse,
    VerifyOtpRequest, VerifyOtpResponse,
};

/// Browser transport for the widget backend.
#[derive(Clone, Debug)]
pub struct GlooWidgetApi {
    base_url: String,
}

impl GlooWidgetApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }

    fn url(&self, public_key: &str, suffix: &str) -> String {
        widget_url(&self.base_url, public_key, suffix)
    }
}

async fn get_json<T: DeserializeOwned>(url: &str, token: Option<&str>) -> Result<T, String> {
    let mut request = Request::get(url);
    if let Some(token) = token {
        request = request.query([("token", token)]);
    }
    let resp = request
        .send()
        .await
        .map_err(|e| format!("Network error: {e}"))?;

    if !resp.ok() {
        return Err(format!("Server error: {}", resp.status()));
    }

    resp.json::<T>()
        .await
        .map_err(|e| format!("Parse error: {e}"))
}

async fn post_json<B: Serialize, T: DeserializeOwned>(url: &str, body: &B) -> Result<T, String> {
    let resp = Request::post(url)
        .json(body)
        .map_err(|e| format!("Serialize error: {e}"))?
        .send()
        .await
        .map_err(|e| format!("Network error: {e}"))?;

    if !resp.ok() {
        return Err(format!("Server error: {}", resp.status()));
    }

    resp.json::<T>()
        .await
        .map_err(|e| format!("Parse error: {e}"))
}

#[async_trait(?Send)]
impl WidgetApi for GlooWidgetApi {
    async fn fetch_config(&self, public_key: &str) -> Result<WidgetConfigPatch, WidgetError> {
        log::debug!("Fetching configuration for public key: {public_key}");
        get_json(&self.url(public_key, CONFIG_PATH), None)
            .await
            .map_err(WidgetError::config_fetch)
    }

    async fn send_otp(
        &self,
        public_key: &str,
        email: &str,
        name: &str,
    ) -> Result<bool, WidgetError> {
        post_json::<_, OtpResponse>(&self.url(public_key, OTP_PATH), &OtpRequest { email, name })
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
        let resp: VerifyOtpResponse = post_json(&self.url(public_key, VERIFY_OTP_PATH), &body)
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
        post_json::<_, ChatResponseBody>(&self.url(public_key, CHAT_PATH), &body)
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
        get_json::<HistoryResponse>(
            &self.url(public_key, &conversation_path(conversation_id)),
            token,
        )
        .await
        .map(HistoryResponse::into_messages)
        .map_err(WidgetError::history_load)
    }
}
