use thiserror::Error;

use crate::models::View;

/// Failures of the widget's backend operations and initialisation.
/// None of these ever escape to the host page: each one is converted at the
/// operation site into a fallback, an inline notice or a log line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WidgetError {
    // ── Recovered locally ────────────────────────────────────────────────────
    #[error("Failed to fetch widget configuration: {reason}")]
    ConfigFetchFailed { reason: String },

    #[error("Failed to load conversation history: {reason}")]
    HistoryLoadFailed { reason: String },

    #[error("Failed to send message: {reason}")]
    ChatSendFailed { reason: String },

    // ── Surfaced as inline notices ───────────────────────────────────────────
    #[error("Failed to send OTP: {reason}")]
    OtpSendFailed { reason: String },

    #[error("Failed to verify OTP: {reason}")]
    OtpVerifyFailed { reason: String },

    // ── Fatal to initialisation ──────────────────────────────────────────────
    #[error(
        "No public key provided. Please add a data-public-key attribute to the widget script."
    )]
    MissingPublicKey,
}

impl WidgetError {
    pub fn config_fetch(reason: impl Into<String>) -> Self {
        WidgetError::ConfigFetchFailed { reason: reason.into() }
    }

    pub fn otp_send(reason: impl Into<String>) -> Self {
        WidgetError::OtpSendFailed { reason: reason.into() }
    }

    pub fn otp_verify(reason: impl Into<String>) -> Self {
        WidgetError::OtpVerifyFailed { reason: reason.into() }
    }

    pub fn chat_send(reason: impl Into<String>) -> Self {
        WidgetError::ChatSendFailed { reason: reason.into() }
    }

    pub fn history_load(reason: impl Into<String>) -> Self {
        WidgetError::HistoryLoadFailed { reason: reason.into() }
    }
}

/// Operations the view state machine keeps at most one of in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SendOtp,
    VerifyOtp,
    SendMessage,
    LoadHistory,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Operation::SendOtp => "send-otp",
            Operation::VerifyOtp => "verify-otp",
            Operation::SendMessage => "send-message",
            Operation::LoadHistory => "load-history",
        })
    }
}

/// An input the view state machine refused. Logged, never shown.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("'{action}' is only valid in the {expected} view (current: {actual})")]
    WrongView {
        action: &'static str,
        expected: View,
        actual: View,
    },

    #[error("a {0} request is already in flight")]
    Busy(Operation),
}
