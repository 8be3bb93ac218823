mod api;
mod bridge;
mod components;
mod host;
mod state;

use beyond_widget::READY_DELAY;
use gloo_timers::future::TimeoutFuture;
use leptos::mount::mount_to_body;
use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use components::launcher::Launcher;
use components::panel::Panel;
use state::AppState;

/// Root widget component: the launcher button plus the chat panel.
#[component]
fn App() -> impl IntoView {
    view! {
        <div class="beyond-widget">
            <Launcher />
            <Panel />
        </div>
    }
}

fn main() {
    console_log::init_with_level(log::Level::Debug).expect("Failed to init logger");

    // Give the host page time to finish loading before the widget appears.
    spawn_local(async {
        TimeoutFuture::new(READY_DELAY.as_millis() as u32).await;
        let options = host::widget_options();
        mount_to_body(move || match AppState::provide(options) {
            Ok(state) => {
                bridge::expose(state);
                view! { <App /> }.into_any()
            }
            // Already logged; nothing is shown to the visitor.
            Err(_) => ().into_any(),
        });
    });
}
