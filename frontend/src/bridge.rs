use beyond_widget::WidgetSnapshot;
use serde_json::Value;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;

use crate::state::AppState;

/// Global the host page calls: `beyondWidget(command, options)`.
const GLOBAL_NAME: &str = "beyondWidget";

/// Installs the command function on `window`. It returns a snapshot of the
/// widget after the command has been applied.
pub fn expose(state: AppState) {
    let Some(window) = web_sys::window() else {
        return;
    };

    let handler = Closure::<dyn Fn(JsValue, JsValue) -> JsValue>::new(
        move |command: JsValue, options: JsValue| {
            let Some(command) = command.as_string() else {
                log::warn!("Widget command must be a string");
                return JsValue::UNDEFINED;
            };
            let snapshot = state.command(&command, to_json(&options));
            to_js(&snapshot)
        },
    );

    if let Err(e) = js_sys::Reflect::set(&window, &JsValue::from_str(GLOBAL_NAME), handler.as_ref())
    {
        log::error!("Failed to expose widget commands: {e:?}");
    }
    // The page keeps calling into it for as long as it lives.
    handler.forget();
}

fn to_json(value: &JsValue) -> Option<Value> {
    if value.is_undefined() || value.is_null() {
        return None;
    }
    let text = js_sys::JSON::stringify(value).ok()?.as_string()?;
    match serde_json::from_str(&text) {
        Ok(json) => Some(json),
        Err(e) => {
            log::warn!("Ignoring unreadable command options: {e}");
            None
        }
    }
}

fn to_js(snapshot: &WidgetSnapshot) -> JsValue {
    serde_json::to_string(snapshot)
        .ok()
        .and_then(|text| js_sys::JSON::parse(&text).ok())
        .unwrap_or(JsValue::UNDEFINED)
}
