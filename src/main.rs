use beyond_widget::{
    Event, HttpWidgetApi, MessageRole, READY_DELAY, UserInfo, View, Widget, WidgetOptions,
    WidgetRunner,
};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

/// One line of terminal input, interpreted against the active view.
#[derive(Debug, PartialEq)]
enum Input {
    Quit,
    Command(&'static str, Option<Value>),
    Event(Event),
    Invalid(String),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "beyond_widget=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // ── Host settings ─────────────────────────────────────────────────────────
    let options = WidgetOptions {
        public_key: std::env::var("WIDGET_PUBLIC_KEY").unwrap_or_default(),
        api_base_url: std::env::var("WIDGET_API_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string()),
        conversation_id: std::env::var("WIDGET_CONVERSATION_ID")
            .ok()
            .filter(|id| !id.trim().is_empty()),
    };
    let api = HttpWidgetApi::new(options.api_base_url.clone());

    // ── Widget ────────────────────────────────────────────────────────────────
    let Ok(mut runner) = WidgetRunner::start(options, api).await else {
        // Already logged by the widget; nothing is shown to the visitor.
        return Ok(());
    };
    tokio::time::sleep(READY_DELAY).await;
    info!("Command surface ready");
    runner.command("open", None).await;

    let mut shown = print_view(runner.widget(), 0);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_input(runner.widget().view(), &line) {
            Input::Quit => break,
            Input::Command(name, options) => {
                runner.command(name, options).await;
            }
            Input::Event(event) => {
                runner.dispatch(event).await;
            }
            Input::Invalid(reason) => println!("! {reason}"),
        }
        shown = print_view(runner.widget(), shown);
    }

    runner.dispose();
    Ok(())
}

fn parse_input(view: View, line: &str) -> Input {
    let line = line.trim();
    if let Some(rest) = line.strip_prefix('/') {
        let (name, arg) = rest.split_once(' ').unwrap_or((rest, ""));
        let options = match arg.trim() {
            "" => None,
            json => match serde_json::from_str(json) {
                Ok(value) => Some(value),
                Err(e) => return Input::Invalid(format!("Invalid JSON: {e}")),
            },
        };
        return match name {
            "quit" => Input::Quit,
            "back" => Input::Event(Event::Back),
            "open" => Input::Command("open", options),
            "close" => Input::Command("close", options),
            "toggle" => Input::Command("toggle", options),
            "track" => Input::Command("track", options),
            "set-user" => Input::Command("setUser", options),
            "set-config" => Input::Command("setConfig", options),
            other => Input::Invalid(format!("Unknown command /{other}")),
        };
    }

    match view {
        View::Contact => {
            let mut fields = line.split(',').map(|f| {
                let f = f.trim();
                (!f.is_empty()).then(|| f.to_string())
            });
            Input::Event(Event::ContactSubmitted(UserInfo {
                name: fields.next().flatten(),
                email: fields.next().flatten(),
                phone: fields.next().flatten(),
            }))
        }
        View::Otp => Input::Event(Event::CodeSubmitted(line.to_string())),
        View::Chat => Input::Event(Event::MessageSubmitted(line.to_string())),
    }
}

/// Prints the active view and any messages after the first `shown`.
/// Returns the new number of messages shown.
fn print_view(widget: &Widget, shown: usize) -> usize {
    if !widget.is_open() {
        println!("(panel closed, /open to show it)");
        return shown;
    }
    let config = widget.config();
    if let Some(notice) = widget.notice() {
        println!("! {}", notice.message);
    }
    match widget.view() {
        View::Contact => {
            println!("[{}] {}", config.widget_title, config.welcome_message);
            println!("Enter: name, email, phone");
            shown
        }
        View::Otp => {
            println!(
                "We've sent a verification code to {}. Please enter it below to continue. (/back to edit)",
                widget.user().email.as_deref().unwrap_or_default()
            );
            shown
        }
        View::Chat => {
            let messages = widget.messages();
            if messages.is_empty() {
                println!("{}: {}", config.brand_name, config.welcome_message);
            }
            for message in messages.iter().skip(shown) {
                let speaker = match message.role {
                    MessageRole::User => "you",
                    MessageRole::Assistant => config.brand_name.as_str(),
                };
                println!("{speaker}: {}", message.content);
                if !message.citations.is_empty() {
                    let sources: Vec<&str> =
                        message.citations.iter().map(|c| c.source.as_str()).collect();
                    println!("  Sources: {}", sources.join(", "));
                }
            }
            messages.len()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn contact_line_splits_into_fields() {
        let Input::Event(Event::ContactSubmitted(user)) =
            parse_input(View::Contact, "Ann, ann@x.com,")
        else {
            panic!("expected a contact submission");
        };
        assert_eq!(user.name.as_deref(), Some("Ann"));
        assert_eq!(user.email.as_deref(), Some("ann@x.com"));
        assert_eq!(user.phone, None);
    }

    #[test]
    fn slash_commands_map_to_host_commands() {
        assert_eq!(
            parse_input(View::Chat, "/set-config {\"size\":\"large\"}"),
            Input::Command("setConfig", Some(json!({"size": "large"})))
        );
        assert!(matches!(
            parse_input(View::Chat, "/set-user {nope"),
            Input::Invalid(_)
        ));
        assert_eq!(parse_input(View::Otp, "/quit"), Input::Quit);
    }

    #[test]
    fn plain_lines_follow_the_view() {
        assert!(matches!(
            parse_input(View::Otp, " 123456 "),
            Input::Event(Event::CodeSubmitted(code)) if code == "123456"
        ));
        assert!(matches!(
            parse_input(View::Chat, "Hi"),
            Input::Event(Event::MessageSubmitted(text)) if text == "Hi"
        ));
    }
}
