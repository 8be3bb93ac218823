//! The widget instance.
//!
//! All state changes go through [`Widget::apply`], which takes an [`Event`]
//! and returns the [`Effect`]s the host must carry out: backend requests,
//! re-render requests and notice timers. The widget itself never performs
//! I/O and never touches presentation.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::api::ApiRequest;
use crate::commands::{self, Command};
use crate::config::{ConfigChange, ConfigResolver, WidgetConfig, WidgetConfigPatch};
use crate::errors::{Operation, WidgetError};
use crate::models::{ChatReply, Message, UserInfo, View};
use crate::service::view_machine::{ContactStep, Outcome, ViewStateMachine};
use crate::store::ConversationStore;

/// How long an inline notice stays visible.
pub const NOTICE_TTL: Duration = Duration::from_secs(5);

pub const CONTACT_REQUIRED_NOTICE: &str = "Please fill in the required fields.";
pub const OTP_SEND_NOTICE: &str =
    "There was a problem submitting your information. Please try again.";
pub const CODE_REQUIRED_NOTICE: &str = "Please enter the verification code";
pub const INVALID_CODE_NOTICE: &str = "Invalid verification code. Please try again.";

pub const CHAT_ERROR_REPLY: &str =
    "Sorry, there was an error processing your message. Please try again.";
pub const UNPROCESSABLE_REPLY: &str = "Sorry, I couldn't process your request. Please try again.";

// ── Construction inputs ───────────────────────────────────────────────────────

/// Values the embedding snippet supplies.
#[derive(Debug, Clone, Default)]
pub struct WidgetOptions {
    pub public_key: String,
    pub api_base_url: String,
    /// A conversation to resume; its history is loaded on entering chat.
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    Created,
    Ready,
    Disposed,
}

/// An inline, auto-dismissing message shown on a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub message: String,
    pub view: View,
}

// ── Events and effects ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ConfigLoaded(Result<WidgetConfigPatch, WidgetError>),
    ContactSubmitted(UserInfo),
    OtpSent {
        seq: u64,
        result: Result<bool, WidgetError>,
    },
    CodeSubmitted(String),
    OtpVerified {
        seq: u64,
        result: Result<String, WidgetError>,
    },
    Back,
    MessageSubmitted(String),
    ReplyReceived {
        seq: u64,
        result: Result<ChatReply, WidgetError>,
    },
    HistoryLoaded {
        seq: u64,
        result: Result<Vec<Message>, WidgetError>,
    },
    Command(Command),
    NoticeExpired(u64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Request(ApiRequest),
    /// Redraw the open panel from current state.
    Render,
    /// Feed `Event::NoticeExpired(id)` back after `after`.
    ExpireNotice { id: u64, after: Duration },
}

/// Serialisable picture of the runtime state, handed back to host scripts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSnapshot {
    pub lifecycle: Lifecycle,
    pub current_view: View,
    pub is_open: bool,
    pub is_authenticated: bool,
    pub awaiting_reply: bool,
    pub message_count: usize,
    pub conversation_id: Option<String>,
}

// ── Widget ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Widget {
    public_key: String,
    lifecycle: Lifecycle,
    config: ConfigResolver,
    machine: ViewStateMachine,
    store: ConversationStore,
    user: UserInfo,
    is_open: bool,
    notice: Option<Notice>,
    notices_raised: u64,
}

impl Widget {
    /// Creates the instance and returns the effects that bring it to ready.
    pub fn initialize(options: WidgetOptions) -> Result<(Widget, Vec<Effect>), WidgetError> {
        let public_key = options.public_key.trim().to_string();
        if public_key.is_empty() {
            let err = WidgetError::MissingPublicKey;
            error!("{err}");
            return Err(err);
        }
        info!("Initializing widget for public key {public_key}");

        let mut store = ConversationStore::new();
        if let Some(id) = options.conversation_id {
            store.set_conversation_id(id);
        }

        let widget = Widget {
            public_key,
            lifecycle: Lifecycle::Created,
            config: ConfigResolver::new(),
            machine: ViewStateMachine::new(),
            store,
            user: UserInfo::default(),
            is_open: false,
            notice: None,
            notices_raised: 0,
        };
        Ok((widget, vec![Effect::Request(ApiRequest::FetchConfig)]))
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn config(&self) -> &WidgetConfig {
        self.config.effective()
    }

    pub fn view(&self) -> View {
        self.machine.view()
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn is_authenticated(&self) -> bool {
        self.machine.is_authenticated()
    }

    /// True while a chat reply is outstanding (typing indicator).
    pub fn is_awaiting_reply(&self) -> bool {
        self.machine.is_pending(Operation::SendMessage)
    }

    /// True while a resumed conversation's history is being fetched. Sending
    /// is refused until it settles.
    pub fn is_loading_history(&self) -> bool {
        self.machine.is_pending(Operation::LoadHistory)
    }

    /// True while a contact or code submission is outstanding.
    pub fn is_submitting(&self) -> bool {
        self.machine.is_pending(Operation::SendOtp) || self.machine.is_pending(Operation::VerifyOtp)
    }

    pub fn messages(&self) -> &[Message] {
        self.store.all()
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn user(&self) -> &UserInfo {
        &self.user
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn snapshot(&self) -> WidgetSnapshot {
        WidgetSnapshot {
            lifecycle: self.lifecycle,
            current_view: self.view(),
            is_open: self.is_open,
            is_authenticated: self.is_authenticated(),
            awaiting_reply: self.is_awaiting_reply(),
            message_count: self.store.len(),
            conversation_id: self.store.conversation_id().map(str::to_string),
        }
    }

    pub fn dispose(&mut self) {
        if self.lifecycle != Lifecycle::Disposed {
            info!("Widget disposed");
            self.lifecycle = Lifecycle::Disposed;
        }
    }

    /// Host-facing command entry point. Unknown commands are ignored.
    pub fn command(&mut self, name: &str, options: Option<serde_json::Value>) -> Vec<Effect> {
        match Command::parse(name, options) {
            Some(command) => self.apply(Event::Command(command)),
            None => Vec::new(),
        }
    }

    // ── Reducer ──────────────────────────────────────────────────────────────

    pub fn apply(&mut self, event: Event) -> Vec<Effect> {
        if self.lifecycle == Lifecycle::Disposed {
            debug!("Ignoring {event:?}: widget disposed");
            return Vec::new();
        }
        match event {
            Event::ConfigLoaded(result) => self.on_config_loaded(result),
            Event::ContactSubmitted(user) => self.on_contact_submitted(user),
            Event::OtpSent { seq, result } => self.on_otp_sent(seq, result),
            Event::CodeSubmitted(code) => self.on_code_submitted(code),
            Event::OtpVerified { seq, result } => self.on_otp_verified(seq, result),
            Event::Back => self.on_back(),
            Event::MessageSubmitted(text) => self.on_message_submitted(text),
            Event::ReplyReceived { seq, result } => self.on_reply_received(seq, result),
            Event::HistoryLoaded { seq, result } => self.on_history_loaded(seq, result),
            Event::Command(command) => commands::execute(self, command),
            Event::NoticeExpired(id) => {
                if self.notice.as_ref().is_some_and(|n| n.id == id) {
                    self.notice = None;
                }
                Vec::new()
            }
        }
    }

    fn on_config_loaded(&mut self, result: Result<WidgetConfigPatch, WidgetError>) -> Vec<Effect> {
        let change = match result {
            Ok(patch) => {
                info!("Configuration loaded");
                self.config.apply_server(patch)
            }
            Err(e) => {
                warn!("{e}; using defaults");
                self.config.apply_server_failure()
            }
        };
        if self.lifecycle == Lifecycle::Created {
            self.lifecycle = Lifecycle::Ready;
            info!("Initialization complete");
        }
        self.render_if_visible(change)
    }

    fn on_contact_submitted(&mut self, user: UserInfo) -> Vec<Effect> {
        if self.view() == View::Contact && !self.has_required_contact_fields(&user) {
            return self.raise_notice(CONTACT_REQUIRED_NOTICE);
        }
        let otp_required = self.config().require_otp_verification;
        let step = match self
            .machine
            .submit_contact(otp_required, user.email_address().is_some())
        {
            Ok(step) => step,
            Err(e) => {
                debug!("Contact submission ignored: {e}");
                return Vec::new();
            }
        };
        self.user = user;
        match step {
            ContactStep::SendOtp(seq) => {
                let email = self.user.email_address().unwrap_or_default().to_string();
                let name = self.user.display_name().to_string();
                vec![Effect::Request(ApiRequest::SendOtp { seq, email, name })]
            }
            ContactStep::EnterChat => self.on_entered_chat(),
        }
    }

    fn has_required_contact_fields(&self, user: &UserInfo) -> bool {
        let config = self.config();
        (!config.collect_name || user.has_name())
            && (!config.collect_email || user.email_address().is_some())
    }

    fn on_otp_sent(&mut self, seq: u64, result: Result<bool, WidgetError>) -> Vec<Effect> {
        let delivered = match result {
            Ok(true) => true,
            Ok(false) => {
                warn!("Backend reported OTP was not sent");
                false
            }
            Err(e) => {
                warn!("{e}");
                false
            }
        };
        match self.machine.otp_sent(seq, delivered) {
            Outcome::Stale => {
                debug!("Discarding stale OTP send response #{seq}");
                Vec::new()
            }
            Outcome::Moved(_) => {
                self.notice = None;
                Vec::new()
            }
            Outcome::Stayed => self.raise_notice(OTP_SEND_NOTICE),
        }
    }

    fn on_code_submitted(&mut self, code: String) -> Vec<Effect> {
        let code = code.trim();
        if self.view() != View::Otp {
            debug!("Code submission ignored in {} view", self.view());
            return Vec::new();
        }
        if code.is_empty() {
            return self.raise_notice(CODE_REQUIRED_NOTICE);
        }
        let Some(email) = self.user.email_address().map(str::to_string) else {
            warn!("No email to verify the code against");
            return self.raise_notice(INVALID_CODE_NOTICE);
        };
        match self.machine.submit_code() {
            Ok(seq) => vec![Effect::Request(ApiRequest::VerifyOtp {
                seq,
                email,
                code: code.to_string(),
            })],
            Err(e) => {
                debug!("Code submission ignored: {e}");
                Vec::new()
            }
        }
    }

    fn on_otp_verified(&mut self, seq: u64, result: Result<String, WidgetError>) -> Vec<Effect> {
        match result {
            Ok(token) => match self.machine.otp_verified(seq, true) {
                Outcome::Moved(_) => {
                    info!("Visitor verified");
                    self.store.session_mut().set_auth_token(token);
                    self.on_entered_chat()
                }
                _ => {
                    debug!("Discarding stale OTP verify response #{seq}");
                    Vec::new()
                }
            },
            Err(e) => match self.machine.otp_verified(seq, false) {
                Outcome::Stale => {
                    debug!("Discarding stale OTP verify failure #{seq}");
                    Vec::new()
                }
                _ => {
                    warn!("{e}");
                    self.raise_notice(INVALID_CODE_NOTICE)
                }
            },
        }
    }

    fn on_back(&mut self) -> Vec<Effect> {
        match self.machine.back() {
            Ok(()) => self.notice = None,
            Err(e) => debug!("Back ignored: {e}"),
        }
        Vec::new()
    }

    fn on_entered_chat(&mut self) -> Vec<Effect> {
        self.notice = None;
        let Some(conversation_id) = self.store.conversation_id().map(str::to_string) else {
            return Vec::new();
        };
        match self.machine.begin_history_load() {
            Ok(seq) => vec![Effect::Request(ApiRequest::LoadHistory {
                seq,
                conversation_id,
                token: self.store.session().auth_token().map(str::to_string),
            })],
            Err(e) => {
                debug!("History load skipped: {e}");
                Vec::new()
            }
        }
    }

    fn on_message_submitted(&mut self, text: String) -> Vec<Effect> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let seq = match self.machine.begin_send() {
            Ok(seq) => seq,
            Err(e) => {
                debug!("Message ignored: {e}");
                return Vec::new();
            }
        };
        self.store.append_user(text.clone());
        let session = self.store.session();
        vec![Effect::Request(ApiRequest::SendMessage {
            seq,
            token: session.auth_token().map(str::to_string),
            conversation_id: session.conversation_id().map(str::to_string),
            message: text,
        })]
    }

    fn on_reply_received(&mut self, seq: u64, result: Result<ChatReply, WidgetError>) -> Vec<Effect> {
        if !self.machine.reply_settled(seq) {
            debug!("Discarding unexpected chat reply #{seq}");
            return Vec::new();
        }
        match result {
            Ok(reply) => {
                if let Some(id) = reply.conversation_id {
                    if self.store.set_conversation_id(id) {
                        debug!("Conversation started: {:?}", self.store.conversation_id());
                    }
                }
                match reply.answer {
                    Some(answer) => {
                        self.store.append_assistant(answer.content, answer.citations);
                    }
                    None => {
                        warn!("Chat reply carried no content");
                        self.store.append_assistant(UNPROCESSABLE_REPLY, Vec::new());
                    }
                }
            }
            Err(e) => {
                warn!("{e}");
                self.store.append_assistant(CHAT_ERROR_REPLY, Vec::new());
            }
        }
        Vec::new()
    }

    fn on_history_loaded(
        &mut self,
        seq: u64,
        result: Result<Vec<Message>, WidgetError>,
    ) -> Vec<Effect> {
        if !self.machine.history_settled(seq) {
            debug!("Discarding stale history response #{seq}");
            return Vec::new();
        }
        match result {
            Ok(history) => {
                let count = history.len();
                if self.store.restore(history) {
                    debug!("Restored {count} messages");
                }
            }
            Err(e) => warn!("{e}"),
        }
        Vec::new()
    }

    // ── Helpers shared with the command dispatcher ───────────────────────────

    fn raise_notice(&mut self, message: &str) -> Vec<Effect> {
        self.notices_raised += 1;
        let id = self.notices_raised;
        self.notice = Some(Notice {
            id,
            message: message.to_string(),
            view: self.view(),
        });
        vec![Effect::ExpireNotice {
            id,
            after: NOTICE_TTL,
        }]
    }

    fn render_if_visible(&self, change: ConfigChange) -> Vec<Effect> {
        if change.visual && self.is_open {
            vec![Effect::Render]
        } else {
            Vec::new()
        }
    }

    /// Returns `true` if the panel went from closed to open.
    pub(crate) fn set_open(&mut self, open: bool) -> bool {
        let opened = open && !self.is_open;
        self.is_open = open;
        opened
    }

    pub(crate) fn merge_user(&mut self, patch: UserInfo) {
        self.user.merge(patch);
    }

    pub(crate) fn apply_host_config(&mut self, patch: WidgetConfigPatch) -> Vec<Effect> {
        let change = self.config.apply_host(patch);
        self.render_if_visible(change)
    }
}
