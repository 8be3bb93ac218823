use beyond_widget::config::Position;
use leptos::prelude::*;

use crate::state::AppState;

/// CSS offsets anchoring an element to the configured corner.
pub fn anchor_style(position: Position, edge_offset: u32) -> String {
    let vertical = if position.is_top() { "top" } else { "bottom" };
    let horizontal = if position.is_left() { "left" } else { "right" };
    format!("position: fixed; {vertical}: {edge_offset}px; {horizontal}: 20px; z-index: 9999;")
}

/// Round button that opens and closes the panel.
#[component]
pub fn Launcher() -> impl IntoView {
    let state = expect_context::<AppState>();
    let config = Memo::new(move |_| state.widget.with(|w| w.config().clone()));
    let is_open = move || state.widget.with(|w| w.is_open());

    let style = move || {
        let config = config.get();
        format!(
            "{} width: 60px; height: 60px; border-radius: 50%; border: none; cursor: pointer; \
             background: {}; color: {}; font-size: 24px; box-shadow: 0 4px 12px rgba(0,0,0,0.15);",
            anchor_style(config.position, 20),
            config.theme.primary_color,
            config.theme.text_color,
        )
    };

    view! {
        <button
            class="beyond-widget-launcher"
            style=style
            aria-label=move || if is_open() { "Close chat" } else { "Open chat" }
            on:click=move |_| {
                state.command("toggle", None);
            }
        >
            {move || if is_open() { "✕" } else { "💬" }}
        </button>
    }
}
