use beyond_widget::{Event, UserInfo};
use leptos::ev;
use leptos::prelude::*;

use crate::state::AppState;

fn field(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Collects the visitor's contact details before the conversation starts.
#[component]
pub fn ContactForm() -> impl IntoView {
    let state = expect_context::<AppState>();
    let config = state.widget.with_untracked(|w| w.config().clone());

    // Pre-fill with whatever the visitor (or the host page) already supplied.
    let known = state.widget.with_untracked(|w| w.user().clone());
    let (name, set_name) = signal(known.name.unwrap_or_default());
    let (email, set_email) = signal(known.email.unwrap_or_default());
    let (phone, set_phone) = signal(known.phone.unwrap_or_default());

    let is_submitting = move || state.widget.with(|w| w.is_submitting());

    let on_submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        if is_submitting() {
            return;
        }
        state.dispatch(Event::ContactSubmitted(UserInfo {
            name: field(name.get_untracked()),
            email: field(email.get_untracked()),
            phone: field(phone.get_untracked()),
        }));
    };

    let input_style = format!(
        "width: 100%; box-sizing: border-box; padding: 8px; margin-bottom: 8px; \
         border: 1px solid #ddd; border-radius: 6px; background: {};",
        config.theme.input_background_color,
    );
    let button_style = format!(
        "width: 100%; padding: 10px; border: none; border-radius: 6px; cursor: pointer; \
         background: {}; color: {};",
        config.theme.primary_color, config.theme.text_color,
    );

    view! {
        <form class="contact-form" style="padding: 16px;" on:submit=on_submit>
            <p class="welcome">{config.welcome_message.clone()}</p>
            <p class="hint">"Please provide your information to start chatting:"</p>

            {config.collect_name.then(|| view! {
                <input
                    type="text"
                    placeholder="Name"
                    required=true
                    style=input_style.clone()
                    prop:value=name
                    on:input=move |ev| set_name.set(event_target_value(&ev))
                />
            })}
            {config.collect_email.then(|| view! {
                <input
                    type="email"
                    placeholder="Email"
                    required=true
                    style=input_style.clone()
                    prop:value=email
                    on:input=move |ev| set_email.set(event_target_value(&ev))
                />
            })}
            {config.collect_phone.then(|| view! {
                <input
                    type="tel"
                    placeholder="Phone"
                    style=input_style.clone()
                    prop:value=phone
                    on:input=move |ev| set_phone.set(event_target_value(&ev))
                />
            })}

            <button type="submit" style=button_style disabled=is_submitting>
                {move || if is_submitting() { "Sending…" } else { "Start Chat" }}
            </button>
        </form>
    }
}
