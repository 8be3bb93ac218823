use beyond_widget::config::Theme;
use beyond_widget::{Event, Message, MessageRole};
use leptos::ev;
use leptos::prelude::*;

use crate::state::AppState;

/// Conversation view with message history, typing indicator, and input.
#[component]
pub fn ChatView() -> impl IntoView {
    let state = expect_context::<AppState>();
    let config = state.widget.with_untracked(|w| w.config().clone());
    let theme = config.theme.clone();
    let welcome = config.welcome_message.clone();
    let brand = config.brand_name.clone();

    let is_empty = move || state.widget.with(|w| w.messages().is_empty());
    let awaiting = move || state.widget.with(|w| w.is_awaiting_reply());

    view! {
        <div class="chat-view" style="display: flex; flex-direction: column; flex: 1; min-height: 0;">
            <div
                class="messages-container"
                style="flex: 1; overflow-y: auto; padding: 12px; display: flex; flex-direction: column; gap: 8px;"
            >
                // Greeting until the first message arrives
                <Show when=is_empty>
                    <div class="message assistant welcome">{welcome.clone()}</div>
                </Show>

                // Messages are append-only, so the position is a stable key.
                <For
                    each=move || {
                        state.widget.with(|w| {
                            w.messages().iter().cloned().enumerate().collect::<Vec<_>>()
                        })
                    }
                    key=|(index, _)| *index
                    let:entry
                >
                    <MessageBubble message=entry.1 theme=theme.clone() brand=brand.clone() />
                </For>

                <Show when=awaiting>
                    <div class="message assistant typing-indicator">"…"</div>
                </Show>
            </div>

            <ChatInput theme=config.theme />
        </div>
    }
}

/// A single chat message bubble, with sources under assistant replies.
#[component]
fn MessageBubble(message: Message, theme: Theme, brand: String) -> impl IntoView {
    let (css_class, label, style) = match message.role {
        MessageRole::User => (
            "message user",
            "You".to_string(),
            format!(
                "align-self: flex-end; background: {}; color: {};",
                theme.primary_color, theme.text_color
            ),
        ),
        MessageRole::Assistant => (
            "message assistant",
            brand,
            format!(
                "align-self: flex-start; background: {}; color: {};",
                theme.input_background_color, theme.secondary_text_color
            ),
        ),
    };
    let sources: Vec<String> = message.citations.into_iter().map(|c| c.source).collect();

    view! {
        <div
            class=css_class
            style=format!("{style} max-width: 80%; padding: 8px 12px; border-radius: 10px;")
        >
            <div class="role-label" style="font-size: 11px; opacity: 0.7;">{label}</div>
            <div>{message.content}</div>
            {(!sources.is_empty()).then(|| view! {
                <div class="citations" style="margin-top: 6px; font-size: 12px;">
                    <div>"Sources:"</div>
                    <ul style="margin: 2px 0 0 16px; padding: 0;">
                        {sources.into_iter().map(|source| view! { <li>{source}</li> }).collect_view()}
                    </ul>
                </div>
            })}
        </div>
    }
}

/// Chat input with send button. Enter sends, Shift+Enter adds a newline.
#[component]
fn ChatInput(theme: Theme) -> impl IntoView {
    let state = expect_context::<AppState>();
    let (input, set_input) = signal(String::new());

    // Held back while a reply is pending or a resumed history is loading.
    let is_sending = move || state.widget.with(|w| w.is_awaiting_reply() || w.is_loading_history());

    let send = move || {
        let text = input.get_untracked();
        if text.trim().is_empty() || is_sending() {
            return;
        }
        set_input.set(String::new());
        state.dispatch(Event::MessageSubmitted(text));
    };

    let on_keydown = move |ev: ev::KeyboardEvent| {
        if ev.key() == "Enter" && !ev.shift_key() {
            ev.prevent_default();
            send();
        }
    };

    view! {
        <div class="input-area" style="display: flex; gap: 8px; padding: 12px; border-top: 1px solid #eee;">
            <textarea
                rows="1"
                placeholder="Type your message..."
                style=format!(
                    "flex: 1; resize: none; padding: 8px; border: 1px solid #ddd; \
                     border-radius: 6px; background: {};",
                    theme.input_background_color,
                )
                prop:value=input
                on:input=move |ev| set_input.set(event_target_value(&ev))
                on:keydown=on_keydown
            />
            <button
                class="send-btn"
                style=format!(
                    "padding: 8px 14px; border: none; border-radius: 6px; cursor: pointer; \
                     background: {}; color: {};",
                    theme.primary_color,
                    theme.text_color,
                )
                on:click=move |_| send()
                disabled=move || is_sending() || input.get().trim().is_empty()
            >
                "Send"
            </button>
        </div>
    }
}
