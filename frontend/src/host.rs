use beyond_widget::WidgetOptions;
use web_sys::Element;

/// Reads the embedding snippet's `data-*` attributes from the script tag
/// that loaded the widget. The API base URL falls back to the page origin.
pub fn widget_options() -> WidgetOptions {
    let script = widget_script();
    let attr = |name: &str| {
        script
            .as_ref()
            .and_then(|s| s.get_attribute(name))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    WidgetOptions {
        public_key: attr("data-public-key").unwrap_or_default(),
        api_base_url: attr("data-api-base-url").unwrap_or_else(page_origin),
        conversation_id: attr("data-conversation-id"),
    }
}

fn widget_script() -> Option<Element> {
    let document = web_sys::window()?.document()?;
    let scripts = document.get_elements_by_tag_name("script");
    (0..scripts.length())
        .filter_map(|i| scripts.item(i))
        .find(|script| {
            script
                .get_attribute("src")
                .is_some_and(|src| src.contains("/widget.js"))
        })
}

fn page_origin() -> String {
    web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_default()
}
