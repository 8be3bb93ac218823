pub mod chat;
pub mod contact;
pub mod launcher;
pub mod otp;
pub mod panel;
