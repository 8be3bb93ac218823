use leptos::prelude::*;
use leptos::task::spawn_local;

use beyond_widget::api::perform;
use beyond_widget::{Effect, Event, Widget, WidgetError, WidgetOptions, WidgetSnapshot};
use gloo_timers::future::TimeoutFuture;

use crate::api::GlooWidgetApi;

/// Shared application state, provided via Leptos context.
///
/// The widget itself is a plain reducer; this wrapper runs the effects it
/// returns on the browser event loop.
#[derive(Clone, Copy)]
pub struct AppState {
    pub widget: RwSignal<Widget>,
    /// Bumped whenever the widget asks for the open panel to be redrawn.
    pub render_epoch: RwSignal<u64>,
    api: StoredValue<GlooWidgetApi>,
}

impl AppState {
    /// Initialize the widget, provide it in the current Leptos context and
    /// start the configuration fetch.
    pub fn provide(options: WidgetOptions) -> Result<Self, WidgetError> {
        let api = GlooWidgetApi::new(options.api_base_url.clone());
        let (widget, effects) = Widget::initialize(options)?;

        let state = Self {
            widget: RwSignal::new(widget),
            render_epoch: RwSignal::new(0),
            api: StoredValue::new(api),
        };
        provide_context(state);
        state.run(effects);
        Ok(state)
    }

    pub fn dispatch(&self, event: Event) {
        let effects = self
            .widget
            .try_update(|widget| widget.apply(event))
            .unwrap_or_default();
        self.run(effects);
    }

    /// Runs a host command and reports the resulting state.
    pub fn command(&self, name: &str, options: Option<serde_json::Value>) -> WidgetSnapshot {
        let effects = self
            .widget
            .try_update(|widget| widget.command(name, options))
            .unwrap_or_default();
        self.run(effects);
        self.widget.with_untracked(Widget::snapshot)
    }

    fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Render => self.render_epoch.update(|epoch| *epoch += 1),
                Effect::ExpireNotice { id, after } => {
                    let state = *self;
                    spawn_local(async move {
                        TimeoutFuture::new(after.as_millis() as u32).await;
                        state.dispatch(Event::NoticeExpired(id));
                    });
                }
                Effect::Request(request) => {
                    let state = *self;
                    let api = self.api.get_value();
                    let public_key = self
                        .widget
                        .with_untracked(|widget| widget.public_key().to_string());
                    spawn_local(async move {
                        let event = perform(&api, &public_key, request).await;
                        state.dispatch(event);
                    });
                }
            }
        }
    }
}
