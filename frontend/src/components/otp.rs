use beyond_widget::Event;
use leptos::ev;
use leptos::prelude::*;

use crate::state::AppState;

/// Verification-code entry shown after a code has been emailed.
#[component]
pub fn OtpForm() -> impl IntoView {
    let state = expect_context::<AppState>();
    let theme = state.widget.with_untracked(|w| w.config().theme.clone());
    let email = state
        .widget
        .with_untracked(|w| w.user().email.clone().unwrap_or_default());
    let (code, set_code) = signal(String::new());

    let is_submitting = move || state.widget.with(|w| w.is_submitting());

    let on_submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        if is_submitting() {
            return;
        }
        state.dispatch(Event::CodeSubmitted(code.get_untracked()));
    };

    view! {
        <form class="otp-form" style="padding: 16px;" on:submit=on_submit>
            <p>
                "We've sent a verification code to " <strong>{email}</strong>
                ". Please enter it below to continue."
            </p>
            <input
                type="text"
                inputmode="numeric"
                autocomplete="one-time-code"
                placeholder="Verification code"
                style=format!(
                    "width: 100%; box-sizing: border-box; padding: 8px; margin-bottom: 8px; \
                     border: 1px solid #ddd; border-radius: 6px; background: {};",
                    theme.input_background_color,
                )
                prop:value=code
                on:input=move |ev| set_code.set(event_target_value(&ev))
            />
            <button
                type="submit"
                style=format!(
                    "width: 100%; padding: 10px; border: none; border-radius: 6px; \
                     cursor: pointer; background: {}; color: {};",
                    theme.primary_color,
                    theme.text_color,
                )
                disabled=is_submitting
            >
                {move || if is_submitting() { "Verifying…" } else { "Verify" }}
            </button>
            <button
                type="button"
                class="back-btn"
                style="width: 100%; margin-top: 8px; padding: 8px; background: none; \
                       border: none; cursor: pointer; text-decoration: underline;"
                on:click=move |_| state.dispatch(Event::Back)
            >
                "Back"
            </button>
        </form>
    }
}
