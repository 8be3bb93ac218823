//! Host-page command surface: `open`, `close`, `toggle`, `setUser`,
//! `setConfig`, `track`.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::WidgetConfigPatch;
use crate::models::UserInfo;
use crate::service::widget::{Effect, Widget};

/// Delay after script load before the command function is exposed.
pub const READY_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Open,
    Close,
    Toggle,
    SetUser(UserInfo),
    SetConfig(WidgetConfigPatch),
    Track(Value),
}

impl Command {
    /// Parses a `(command, options)` pair. Unknown commands and unusable
    /// options yield `None` and are meant to be ignored.
    pub fn parse(name: &str, options: Option<Value>) -> Option<Command> {
        debug!("Command called with: {name} {options:?}");
        match name {
            "open" => Some(Command::Open),
            "close" => Some(Command::Close),
            "toggle" => Some(Command::Toggle),
            "track" => Some(Command::Track(options.unwrap_or(Value::Null))),
            "setUser" => parse_options(name, options).map(Command::SetUser),
            "setConfig" => parse_options(name, options).map(Command::SetConfig),
            _ => {
                debug!("Ignoring unknown command '{name}'");
                None
            }
        }
    }
}

fn parse_options<T: serde::de::DeserializeOwned>(name: &str, options: Option<Value>) -> Option<T> {
    let options = options.filter(Value::is_object)?;
    match serde_json::from_value(options) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!("Ignoring '{name}' with unusable options: {e}");
            None
        }
    }
}

/// Applies a parsed command to the widget.
pub fn execute(widget: &mut Widget, command: Command) -> Vec<Effect> {
    match command {
        Command::Open => open_effects(widget.set_open(true)),
        Command::Close => {
            widget.set_open(false);
            Vec::new()
        }
        Command::Toggle => {
            let open = !widget.is_open();
            open_effects(widget.set_open(open))
        }
        Command::SetUser(patch) => {
            info!("Set user: {patch:?}");
            widget.merge_user(patch);
            Vec::new()
        }
        Command::SetConfig(patch) => {
            info!("Updating widget configuration");
            widget.apply_host_config(patch)
        }
        Command::Track(payload) => {
            info!("Track event: {payload}");
            Vec::new()
        }
    }
}

/// Opening re-renders so changes made while closed show up.
fn open_effects(opened: bool) -> Vec<Effect> {
    if opened { vec![Effect::Render] } else { Vec::new() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Position, Size};
    use crate::models::View;
    use crate::service::widget::{Event, WidgetOptions};
    use serde_json::json;

    fn widget() -> Widget {
        let (mut widget, _) = Widget::initialize(WidgetOptions {
            public_key: "pk_test".into(),
            ..Default::default()
        })
        .unwrap();
        widget.apply(Event::ConfigLoaded(Ok(WidgetConfigPatch::default())));
        widget
    }

    #[test]
    fn unknown_commands_are_ignored() {
        assert_eq!(Command::parse("explode", Some(json!({"a": 1}))), None);
        let mut w = widget();
        assert!(w.command("explode", None).is_empty());
        assert!(!w.is_open());
    }

    #[test]
    fn open_close_toggle() {
        let mut w = widget();
        assert_eq!(w.command("open", None), vec![Effect::Render]);
        assert!(w.is_open());
        assert!(w.command("open", None).is_empty());
        assert!(w.command("close", None).is_empty());
        assert!(!w.is_open());
        assert_eq!(w.command("toggle", None), vec![Effect::Render]);
        assert!(w.is_open());
        assert!(w.command("toggle", None).is_empty());
        assert!(!w.is_open());
    }

    #[test]
    fn set_user_merges_without_validation() {
        let mut w = widget();
        w.command("setUser", Some(json!({"name": "Ann", "email": "not-an-email"})));
        w.command("setUser", Some(json!({"phone": "555"})));
        assert_eq!(w.user().name.as_deref(), Some("Ann"));
        assert_eq!(w.user().email.as_deref(), Some("not-an-email"));
        assert_eq!(w.user().phone.as_deref(), Some("555"));
    }

    #[test]
    fn set_user_with_non_object_is_ignored() {
        let mut w = widget();
        w.command("setUser", Some(json!("Ann")));
        w.command("setUser", None);
        assert_eq!(w.user(), &UserInfo::default());
    }

    #[test]
    fn set_config_rerenders_only_when_open_and_visual() {
        let mut w = widget();
        assert!(w.command("setConfig", Some(json!({"size": "large"}))).is_empty());
        assert_eq!(w.config().size, Size::Large);

        w.command("open", None);
        assert!(w.command("setConfig", Some(json!({"widgetTitle": "Acme"}))).is_empty());
        assert_eq!(
            w.command("setConfig", Some(json!({"position": "top-left"}))),
            vec![Effect::Render]
        );
        assert_eq!(w.config().position, Position::TopLeft);
        assert_eq!(w.config().widget_title, "Acme");
    }

    #[test]
    fn set_config_does_not_reset_the_conversation() {
        let mut w = widget();
        w.command("setConfig", Some(json!({"requireOtpVerification": false})));
        w.apply(Event::ContactSubmitted(UserInfo {
            name: Some("Ann".into()),
            email: Some("ann@x.com".into()),
            phone: None,
        }));
        w.apply(Event::MessageSubmitted("Hi".into()));
        w.command("setConfig", Some(json!({"requireOtpVerification": true, "theme": {"primaryColor": "#000"}})));
        assert_eq!(w.view(), View::Chat);
        assert_eq!(w.messages().len(), 1);
        assert!(w.is_awaiting_reply());
    }

    #[test]
    fn track_is_accepted_with_any_payload() {
        assert_eq!(
            Command::parse("track", Some(json!({"event": "clicked"}))),
            Some(Command::Track(json!({"event": "clicked"})))
        );
        let mut w = widget();
        assert!(w.command("track", None).is_empty());
    }
}
