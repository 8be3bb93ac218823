use beyond_widget::View;
use leptos::prelude::*;

use super::chat::ChatView;
use super::contact::ContactForm;
use super::launcher::anchor_style;
use super::otp::OtpForm;
use crate::state::AppState;

/// The chat window: header, notice banner and the active view.
#[component]
pub fn Panel() -> impl IntoView {
    let state = expect_context::<AppState>();
    let config = Memo::new(move |_| state.widget.with(|w| w.config().clone()));
    let current_view = Memo::new(move |_| state.widget.with(|w| w.view()));
    let is_open = move || state.widget.with(|w| w.is_open());

    let style = move || {
        let config = config.get();
        let (width, height) = config.size.dimensions();
        format!(
            "{} width: {width}px; height: {height}px; display: flex; flex-direction: column; \
             overflow: hidden; border-radius: 12px; background: {}; color: {}; \
             box-shadow: 0 8px 24px rgba(0,0,0,0.2); font-family: sans-serif;",
            anchor_style(config.position, 90),
            config.theme.background_color,
            config.theme.secondary_text_color,
        )
    };

    view! {
        <Show when=is_open>
            <div class="beyond-widget-panel" style=style>
                <div
                    class="panel-header"
                    style=move || {
                        let theme = config.get().theme;
                        format!(
                            "display: flex; justify-content: space-between; align-items: center; \
                             padding: 12px 16px; background: {}; color: {};",
                            theme.primary_color,
                            theme.text_color,
                        )
                    }
                >
                    <span class="panel-title">{move || config.get().widget_title}</span>
                    <button
                        class="panel-close"
                        style="background: none; border: none; color: inherit; cursor: pointer;"
                        aria-label="Close chat"
                        on:click=move |_| {
                            state.command("close", None);
                        }
                    >
                        "✕"
                    </button>
                </div>

                // Notice banner for the active view
                {move || {
                    state.widget.with(|w| {
                        w.notice()
                            .filter(|notice| notice.view == w.view())
                            .map(|notice| {
                                let message = notice.message.clone();
                                view! {
                                    <div
                                        class="notice-banner"
                                        style="padding: 8px 16px; background: #fdecea; color: #b3261e;"
                                    >
                                        {message}
                                    </div>
                                }
                            })
                    })
                }}

                {move || {
                    state.render_epoch.track();
                    match current_view.get() {
                        View::Contact => view! { <ContactForm /> }.into_any(),
                        View::Otp => view! { <OtpForm /> }.into_any(),
                        View::Chat => view! { <ChatView /> }.into_any(),
                    }
                }}
            </div>
        </Show>
    }
}
