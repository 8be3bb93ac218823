//! Screen sequencing: contact → (otp →) chat.
//!
//! Every backend call the machine starts is tagged with a per-operation
//! sequence number. A response is applied only if its number is the one
//! still in flight, so answers to abandoned requests are dropped.

use crate::errors::{Operation, TransitionError};
use crate::models::View;

/// What a contact submission leads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactStep {
    /// OTP is required and an email was given: request a code first.
    SendOtp(u64),
    /// Straight to chat.
    EnterChat,
}

/// How a backend response was taken by the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The response no longer matches the request in flight.
    Stale,
    Moved(View),
    Stayed,
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    issued: u64,
    in_flight: Option<u64>,
}

impl Slot {
    fn begin(&mut self, op: Operation) -> Result<u64, TransitionError> {
        if self.in_flight.is_some() {
            return Err(TransitionError::Busy(op));
        }
        self.issued += 1;
        self.in_flight = Some(self.issued);
        Ok(self.issued)
    }

    fn settle(&mut self, seq: u64) -> bool {
        if self.in_flight == Some(seq) {
            self.in_flight = None;
            true
        } else {
            false
        }
    }

    fn abandon(&mut self) {
        self.in_flight = None;
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewStateMachine {
    view: View,
    is_authenticated: bool,
    send_otp: Slot,
    verify_otp: Slot,
    send_message: Slot,
    load_history: Slot,
}

impl ViewStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    pub fn is_pending(&self, op: Operation) -> bool {
        self.slot(op).in_flight.is_some()
    }

    fn slot(&self, op: Operation) -> &Slot {
        match op {
            Operation::SendOtp => &self.send_otp,
            Operation::VerifyOtp => &self.verify_otp,
            Operation::SendMessage => &self.send_message,
            Operation::LoadHistory => &self.load_history,
        }
    }

    fn expect_view(&self, action: &'static str, expected: View) -> Result<(), TransitionError> {
        if self.view == expected {
            Ok(())
        } else {
            Err(TransitionError::WrongView {
                action,
                expected,
                actual: self.view,
            })
        }
    }

    fn enter(&mut self, view: View) {
        tracing::debug!("View {} -> {}", self.view, view);
        self.view = view;
    }

    // ── contact ──────────────────────────────────────────────────────────────

    /// OTP is only enforceable when there is an email to send the code to.
    pub fn submit_contact(
        &mut self,
        otp_required: bool,
        has_email: bool,
    ) -> Result<ContactStep, TransitionError> {
        self.expect_view("submit-contact", View::Contact)?;
        if otp_required && has_email {
            let seq = self.send_otp.begin(Operation::SendOtp)?;
            return Ok(ContactStep::SendOtp(seq));
        }
        if self.send_otp.in_flight.is_some() {
            return Err(TransitionError::Busy(Operation::SendOtp));
        }
        self.is_authenticated = true;
        self.enter(View::Chat);
        Ok(ContactStep::EnterChat)
    }

    pub fn otp_sent(&mut self, seq: u64, delivered: bool) -> Outcome {
        if !self.send_otp.settle(seq) || self.view != View::Contact {
            return Outcome::Stale;
        }
        if delivered {
            self.enter(View::Otp);
            Outcome::Moved(View::Otp)
        } else {
            Outcome::Stayed
        }
    }

    // ── otp ──────────────────────────────────────────────────────────────────

    pub fn submit_code(&mut self) -> Result<u64, TransitionError> {
        self.expect_view("submit-code", View::Otp)?;
        self.verify_otp.begin(Operation::VerifyOtp)
    }

    pub fn otp_verified(&mut self, seq: u64, verified: bool) -> Outcome {
        if !self.verify_otp.settle(seq) || self.view != View::Otp {
            return Outcome::Stale;
        }
        if verified {
            self.is_authenticated = true;
            self.enter(View::Chat);
            Outcome::Moved(View::Chat)
        } else {
            Outcome::Stayed
        }
    }

    /// Back to the contact form. Any verification still in flight is
    /// abandoned and its response will be discarded.
    pub fn back(&mut self) -> Result<(), TransitionError> {
        self.expect_view("back", View::Otp)?;
        self.verify_otp.abandon();
        self.enter(View::Contact);
        Ok(())
    }

    // ── chat ─────────────────────────────────────────────────────────────────

    /// Refused while a resumed conversation's history is still loading, so
    /// the history can land in an empty store.
    pub fn begin_send(&mut self) -> Result<u64, TransitionError> {
        self.expect_view("send-message", View::Chat)?;
        if self.load_history.in_flight.is_some() {
            return Err(TransitionError::Busy(Operation::LoadHistory));
        }
        self.send_message.begin(Operation::SendMessage)
    }

    /// Chat replies are not view-scoped; only the sequence number matters.
    pub fn reply_settled(&mut self, seq: u64) -> bool {
        self.send_message.settle(seq)
    }

    pub fn begin_history_load(&mut self) -> Result<u64, TransitionError> {
        self.expect_view("load-history", View::Chat)?;
        self.load_history.begin(Operation::LoadHistory)
    }

    pub fn history_settled(&mut self, seq: u64) -> bool {
        self.load_history.settle(seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_otp() -> ViewStateMachine {
        let mut machine = ViewStateMachine::new();
        let ContactStep::SendOtp(seq) = machine.submit_contact(true, true).unwrap() else {
            panic!("expected an OTP step");
        };
        assert_eq!(machine.otp_sent(seq, true), Outcome::Moved(View::Otp));
        machine
    }

    fn in_chat() -> ViewStateMachine {
        let mut machine = ViewStateMachine::new();
        assert_eq!(
            machine.submit_contact(false, true).unwrap(),
            ContactStep::EnterChat
        );
        machine
    }

    #[test]
    fn starts_at_contact_unauthenticated() {
        let machine = ViewStateMachine::new();
        assert_eq!(machine.view(), View::Contact);
        assert!(!machine.is_authenticated());
    }

    #[test]
    fn otp_required_with_email_goes_through_otp() {
        let mut machine = ViewStateMachine::new();
        let step = machine.submit_contact(true, true).unwrap();
        assert!(matches!(step, ContactStep::SendOtp(_)));
        assert_eq!(machine.view(), View::Contact);
        assert!(machine.is_pending(Operation::SendOtp));
    }

    #[test]
    fn otp_required_without_email_bypasses_otp() {
        let mut machine = ViewStateMachine::new();
        assert_eq!(
            machine.submit_contact(true, false).unwrap(),
            ContactStep::EnterChat
        );
        assert_eq!(machine.view(), View::Chat);
        assert!(machine.is_authenticated());
    }

    #[test]
    fn failed_otp_send_stays_at_contact() {
        let mut machine = ViewStateMachine::new();
        let ContactStep::SendOtp(seq) = machine.submit_contact(true, true).unwrap() else {
            panic!("expected an OTP step");
        };
        assert_eq!(machine.otp_sent(seq, false), Outcome::Stayed);
        assert_eq!(machine.view(), View::Contact);
        assert!(!machine.is_pending(Operation::SendOtp));
    }

    #[test]
    fn duplicate_contact_submit_is_busy() {
        let mut machine = ViewStateMachine::new();
        machine.submit_contact(true, true).unwrap();
        assert_eq!(
            machine.submit_contact(true, true),
            Err(TransitionError::Busy(Operation::SendOtp))
        );
        assert_eq!(
            machine.submit_contact(false, true),
            Err(TransitionError::Busy(Operation::SendOtp))
        );
    }

    #[test]
    fn verified_code_enters_chat() {
        let mut machine = in_otp();
        let seq = machine.submit_code().unwrap();
        assert_eq!(machine.submit_code(), Err(TransitionError::Busy(Operation::VerifyOtp)));
        assert_eq!(machine.otp_verified(seq, true), Outcome::Moved(View::Chat));
        assert!(machine.is_authenticated());
    }

    #[test]
    fn rejected_code_stays_at_otp() {
        let mut machine = in_otp();
        let seq = machine.submit_code().unwrap();
        assert_eq!(machine.otp_verified(seq, false), Outcome::Stayed);
        assert_eq!(machine.view(), View::Otp);
        assert!(!machine.is_authenticated());
        assert!(machine.submit_code().is_ok());
    }

    #[test]
    fn verify_response_after_back_is_stale() {
        let mut machine = in_otp();
        let seq = machine.submit_code().unwrap();
        machine.back().unwrap();
        assert_eq!(machine.view(), View::Contact);
        assert_eq!(machine.otp_verified(seq, true), Outcome::Stale);
        assert_eq!(machine.view(), View::Contact);
        assert!(!machine.is_authenticated());
    }

    #[test]
    fn sequence_numbers_increase_per_operation() {
        let mut machine = in_otp();
        let first = machine.submit_code().unwrap();
        machine.back().unwrap();
        let ContactStep::SendOtp(seq) = machine.submit_contact(true, true).unwrap() else {
            panic!("expected an OTP step");
        };
        machine.otp_sent(seq, true);
        let second = machine.submit_code().unwrap();
        assert!(second > first);
        assert_eq!(machine.otp_verified(first, true), Outcome::Stale);
        assert_eq!(machine.otp_verified(second, true), Outcome::Moved(View::Chat));
    }

    #[test]
    fn nothing_leaves_chat() {
        let mut machine = in_chat();
        assert!(machine.back().is_err());
        assert!(machine.submit_contact(true, true).is_err());
        assert!(machine.submit_code().is_err());
        assert_eq!(machine.otp_sent(1, true), Outcome::Stale);
        assert_eq!(machine.otp_verified(1, false), Outcome::Stale);
        assert_eq!(machine.view(), View::Chat);
    }

    #[test]
    fn one_chat_send_at_a_time() {
        let mut machine = in_chat();
        let seq = machine.begin_send().unwrap();
        assert_eq!(
            machine.begin_send(),
            Err(TransitionError::Busy(Operation::SendMessage))
        );
        assert!(!machine.reply_settled(seq + 1));
        assert!(machine.reply_settled(seq));
        assert!(machine.begin_send().is_ok());
    }

    #[test]
    fn chat_send_waits_for_history_load() {
        let mut machine = in_chat();
        let seq = machine.begin_history_load().unwrap();
        assert!(machine.is_pending(Operation::LoadHistory));
        assert_eq!(
            machine.begin_send(),
            Err(TransitionError::Busy(Operation::LoadHistory))
        );
        assert!(machine.history_settled(seq));
        assert!(machine.begin_send().is_ok());
    }

    #[test]
    fn chat_send_requires_chat_view() {
        let mut machine = ViewStateMachine::new();
        assert_eq!(
            machine.begin_send(),
            Err(TransitionError::WrongView {
                action: "send-message",
                expected: View::Chat,
                actual: View::Contact,
            })
        );
    }
}
