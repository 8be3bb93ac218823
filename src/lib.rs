//! Interaction core of the BeyondAsk chat-support widget.
//!
//! Contact collection, OTP verification and chat are sequenced by
//! [`service::view_machine::ViewStateMachine`]; [`service::widget::Widget`]
//! combines it with the configuration layers and the conversation store and
//! turns events into effects. Hosts execute those effects through a
//! [`api::WidgetApi`] transport and own all presentation.

pub mod api;
pub mod commands;
pub mod config;
pub mod errors;
pub mod models;
pub mod service;
pub mod store;

pub use api::{ApiRequest, WidgetApi};
pub use commands::{Command, READY_DELAY};
pub use config::{ConfigResolver, WidgetConfig, WidgetConfigPatch};
pub use errors::WidgetError;
pub use models::{Citation, Message, MessageRole, UserInfo, View};
pub use service::widget::{Effect, Event, Widget, WidgetOptions, WidgetSnapshot};

#[cfg(feature = "native")]
pub use api::http::HttpWidgetApi;
#[cfg(feature = "native")]
pub use service::runner::WidgetRunner;
