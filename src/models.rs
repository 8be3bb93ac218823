use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Fallback citation label when the backend gives no usable source.
pub const UNKNOWN_SOURCE: &str = "Unknown";

// ── Widget views ──────────────────────────────────────────────────────────────

/// The screen currently active inside the chat panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Contact,
    Otp,
    Chat,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            View::Contact => "contact",
            View::Otp => "otp",
            View::Chat => "chat",
        }
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Conversation data ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for MessageRole {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

/// A source reference attached to an assistant message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub source: String,
}

impl Citation {
    pub fn new(source: impl Into<String>) -> Self {
        Self { source: source.into() }
    }

    /// Reads `metadata.source` from a raw backend citation object.
    pub fn from_wire(raw: &Value) -> Self {
        let source = raw
            .pointer("/metadata/source")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_SOURCE);
        Self::new(source)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    /// Always empty for user messages.
    #[serde(default)]
    pub citations: Vec<Citation>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            citations: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>, citations: Vec<Citation>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            citations,
            created_at: Utc::now(),
        }
    }
}

/// Visitor contact details. All fields optional; `setUser` merges into it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl UserInfo {
    /// Shallow merge: every field present in `patch` replaces ours.
    pub fn merge(&mut self, patch: UserInfo) {
        if patch.name.is_some() {
            self.name = patch.name;
        }
        if patch.email.is_some() {
            self.email = patch.email;
        }
        if patch.phone.is_some() {
            self.phone = patch.phone;
        }
    }

    /// The email address, if one was actually supplied.
    pub fn email_address(&self) -> Option<&str> {
        non_blank(self.email.as_deref())
    }

    pub fn display_name(&self) -> &str {
        non_blank(self.name.as_deref()).unwrap_or("")
    }

    pub fn has_name(&self) -> bool {
        non_blank(self.name.as_deref()).is_some()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

// ── Wire types: requests ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct OtpRequest<'a> {
    pub email: &'a str,
    pub name: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyOtpRequest<'a> {
    pub email: &'a str,
    pub code: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<&'a str>,
    pub message: &'a str,
    pub conversation_id: Option<&'a str>,
}

// ── Wire types: responses ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OtpResponse {
    #[serde(default, deserialize_with = "lenient")]
    pub success: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyOtpResponse {
    #[serde(default, deserialize_with = "lenient")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponseBody {
    #[serde(default, deserialize_with = "lenient")]
    pub conversation_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<ReplyBody>,
    #[serde(default, deserialize_with = "lenient")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub citations: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplyBody {
    #[serde(default, deserialize_with = "lenient")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub citations: Option<Vec<Value>>,
}

/// The assistant's answer to one chat turn.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantReply {
    pub content: String,
    pub citations: Vec<Citation>,
}

/// A decoded `/chat` response. `answer` is `None` when the body carried
/// neither `message.content` nor a flat `content`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub conversation_id: Option<String>,
    pub answer: Option<AssistantReply>,
}

impl ChatResponseBody {
    pub fn into_reply(self) -> ChatReply {
        let conversation_id = self.conversation_id.filter(|id| !id.is_empty());
        let nested = self.message.and_then(|m| {
            m.content.map(|content| AssistantReply {
                content,
                citations: citations_from_wire(m.citations),
            })
        });
        let answer = nested.or_else(|| {
            self.content.map(|content| AssistantReply {
                content,
                citations: citations_from_wire(self.citations),
            })
        });
        ChatReply { conversation_id, answer }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryResponse {
    #[serde(default, deserialize_with = "lenient")]
    pub messages: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryEntry {
    role: String,
    #[serde(default, deserialize_with = "lenient")]
    content: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    citations: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "lenient")]
    created_at: Option<DateTime<Utc>>,
}

impl HistoryResponse {
    /// Decodes the stored conversation, skipping entries that are not
    /// user or assistant messages.
    pub fn into_messages(self) -> Vec<Message> {
        let loaded_at = Utc::now();
        self.messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|raw| {
                let entry: HistoryEntry = match serde_json::from_value(raw) {
                    Ok(entry) => entry,
                    Err(e) => {
                        tracing::warn!("Skipping malformed history entry: {e}");
                        return None;
                    }
                };
                let role = match MessageRole::try_from(entry.role.as_str()) {
                    Ok(role) => role,
                    Err(e) => {
                        tracing::debug!("Skipping history entry: {e}");
                        return None;
                    }
                };
                let citations = match role {
                    MessageRole::Assistant => citations_from_wire(entry.citations),
                    MessageRole::User => Vec::new(),
                };
                Some(Message {
                    role,
                    content: entry.content.unwrap_or_default(),
                    citations,
                    created_at: entry.created_at.unwrap_or(loaded_at),
                })
            })
            .collect()
    }
}

fn citations_from_wire(raw: Option<Vec<Value>>) -> Vec<Citation> {
    raw.unwrap_or_default().iter().map(Citation::from_wire).collect()
}

/// Deserialises a field, treating a wrong-shaped or null value as absent
/// instead of failing the whole body.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(value) {
        Ok(v) => Ok(Some(v)),
        Err(e) => {
            tracing::warn!("Ignoring malformed field: {e}");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn citation_source_falls_back_to_unknown() {
        assert_eq!(
            Citation::from_wire(&json!({"metadata": {"source": "faq.md"}})).source,
            "faq.md"
        );
        assert_eq!(Citation::from_wire(&json!({"metadata": {}})).source, "Unknown");
        assert_eq!(Citation::from_wire(&json!({})).source, "Unknown");
        assert_eq!(
            Citation::from_wire(&json!({"metadata": {"source": ""}})).source,
            "Unknown"
        );
    }

    #[test]
    fn nested_reply_shape_wins() {
        let body: ChatResponseBody = serde_json::from_value(json!({
            "conversationId": "c1",
            "message": {
                "content": "Hello!",
                "citations": [{"metadata": {"source": "docs"}}, {"id": 4}]
            }
        }))
        .unwrap();
        let reply = body.into_reply();
        assert_eq!(reply.conversation_id.as_deref(), Some("c1"));
        let answer = reply.answer.unwrap();
        assert_eq!(answer.content, "Hello!");
        assert_eq!(
            answer.citations,
            vec![Citation::new("docs"), Citation::new("Unknown")]
        );
    }

    #[test]
    fn flat_reply_shape_is_accepted() {
        let body: ChatResponseBody =
            serde_json::from_value(json!({"content": "Hi", "citations": null})).unwrap();
        let reply = body.into_reply();
        assert_eq!(reply.conversation_id, None);
        assert_eq!(reply.answer.unwrap().content, "Hi");
    }

    #[test]
    fn reply_without_content_has_no_answer() {
        let body: ChatResponseBody =
            serde_json::from_value(json!({"conversationId": "", "message": {}})).unwrap();
        let reply = body.into_reply();
        assert_eq!(reply.conversation_id, None);
        assert_eq!(reply.answer, None);
    }

    #[test]
    fn history_skips_unknown_roles_and_user_citations() {
        let body: HistoryResponse = serde_json::from_value(json!({
            "messages": [
                {"role": "user", "content": "a", "citations": [{"metadata": {"source": "x"}}]},
                {"role": "system", "content": "hidden"},
                {"role": "assistant", "content": "b", "createdAt": "2024-05-01T10:00:00Z",
                 "citations": [{"metadata": {"source": "kb"}}]},
                "garbage"
            ]
        }))
        .unwrap();
        let messages = body.into_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::User);
        assert!(messages[0].citations.is_empty());
        assert_eq!(messages[1].content, "b");
        assert_eq!(messages[1].citations, vec![Citation::new("kb")]);
        assert_eq!(
            messages[1].created_at.to_rfc3339(),
            "2024-05-01T10:00:00+00:00"
        );
    }

    #[test]
    fn chat_request_omits_missing_token_but_keeps_null_conversation() {
        let body = serde_json::to_value(ChatRequest {
            token: None,
            message: "Hi",
            conversation_id: None,
        })
        .unwrap();
        assert_eq!(body, json!({"message": "Hi", "conversationId": null}));
    }

    #[test]
    fn user_merge_only_replaces_supplied_fields() {
        let mut user = UserInfo {
            name: Some("Ann".into()),
            email: Some("ann@x.com".into()),
            phone: None,
        };
        user.merge(UserInfo {
            phone: Some("555".into()),
            ..Default::default()
        });
        assert_eq!(user.name.as_deref(), Some("Ann"));
        assert_eq!(user.email_address(), Some("ann@x.com"));
        assert_eq!(user.phone.as_deref(), Some("555"));
    }

    #[test]
    fn blank_email_is_not_an_address() {
        let user = UserInfo {
            email: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(user.email_address(), None);
    }
}
