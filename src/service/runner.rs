use std::collections::VecDeque;

use serde_json::Value;
use tokio::time::Instant;

use crate::api::{self, WidgetApi};
use crate::errors::WidgetError;
use crate::service::widget::{Effect, Event, Widget, WidgetOptions};

/// Drives a [`Widget`] on a native host: requests are awaited one after
/// another, notice timers are kept as deadlines and fired on the next call.
pub struct WidgetRunner<A> {
    widget: Widget,
    api: A,
    deadlines: Vec<(Instant, u64)>,
    render_requests: u64,
}

impl<A: WidgetApi> WidgetRunner<A> {
    /// Initializes the widget and waits for its configuration.
    pub async fn start(options: WidgetOptions, api: A) -> Result<Self, WidgetError> {
        let (widget, effects) = Widget::initialize(options)?;
        let mut runner = Self {
            widget,
            api,
            deadlines: Vec::new(),
            render_requests: 0,
        };
        runner.run(effects).await;
        Ok(runner)
    }

    pub fn widget(&self) -> &Widget {
        &self.widget
    }

    /// Number of re-renders the widget has asked for.
    pub fn render_requests(&self) -> u64 {
        self.render_requests
    }

    pub async fn dispatch(&mut self, event: Event) -> &Widget {
        self.fire_due_notices().await;
        let effects = self.widget.apply(event);
        self.run(effects).await;
        &self.widget
    }

    pub async fn command(&mut self, name: &str, options: Option<Value>) -> &Widget {
        self.fire_due_notices().await;
        let effects = self.widget.command(name, options);
        self.run(effects).await;
        &self.widget
    }

    pub async fn fire_due_notices(&mut self) {
        let now = Instant::now();
        let (due, pending): (Vec<_>, Vec<_>) =
            self.deadlines.drain(..).partition(|(at, _)| *at <= now);
        self.deadlines = pending;
        for (_, id) in due {
            let effects = self.widget.apply(Event::NoticeExpired(id));
            self.run(effects).await;
        }
    }

    pub fn dispose(&mut self) {
        self.deadlines.clear();
        self.widget.dispose();
    }

    async fn run(&mut self, effects: Vec<Effect>) {
        let mut queue: VecDeque<Effect> = effects.into();
        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::Request(request) => {
                    let event = api::perform(&self.api, self.widget.public_key(), request).await;
                    queue.extend(self.widget.apply(event));
                }
                Effect::Render => self.render_requests += 1,
                Effect::ExpireNotice { id, after } => {
                    self.deadlines.push((Instant::now() + after, id));
                }
            }
        }
    }
}
