//! Widget configuration and the resolver that layers it.
//!
//! The effective configuration is always `defaults < server < host`. The
//! server fragment is fetched once by public key; host fragments arrive via
//! `setConfig` and accumulate. Every top-level key is replaced wholesale
//! except `theme`, whose colour keys merge one level deeper.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::lenient;

// ── Effective configuration ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub primary_color: String,
    pub text_color: String,
    pub background_color: String,
    pub secondary_text_color: String,
    pub input_background_color: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_color: "#0078d4".to_string(),
            text_color: "#ffffff".to_string(),
            background_color: "#ffffff".to_string(),
            secondary_text_color: "#333333".to_string(),
            input_background_color: "#f5f5f5".to_string(),
        }
    }
}

/// Screen corner the launcher and panel are anchored to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

impl Position {
    pub fn is_top(&self) -> bool {
        matches!(self, Position::TopLeft | Position::TopRight)
    }

    pub fn is_left(&self) -> bool {
        matches!(self, Position::TopLeft | Position::BottomLeft)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Size {
    Small,
    #[default]
    Medium,
    Large,
}

impl Size {
    /// Panel `(width, height)` in CSS pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Size::Small => (300, 400),
            Size::Medium => (350, 500),
            Size::Large => (400, 600),
        }
    }
}

/// The fully resolved configuration. Every field is always populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    pub theme: Theme,
    pub position: Position,
    pub size: Size,
    pub welcome_message: String,
    pub widget_title: String,
    pub brand_name: String,
    pub collect_name: bool,
    pub collect_email: bool,
    pub collect_phone: bool,
    pub require_otp_verification: bool,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            position: Position::default(),
            size: Size::default(),
            welcome_message: "Hello! How can I help you today?".to_string(),
            widget_title: "AI Assistant".to_string(),
            brand_name: "BeyondAsk".to_string(),
            collect_name: true,
            collect_email: true,
            collect_phone: false,
            require_otp_verification: true,
        }
    }
}

impl WidgetConfig {
    /// Returns a new config with `patch` laid over this one.
    pub fn merged(&self, patch: &WidgetConfigPatch) -> WidgetConfig {
        let mut next = self.clone();
        if let Some(theme) = &patch.theme {
            theme.apply_to(&mut next.theme);
        }
        set(&mut next.position, patch.position);
        set(&mut next.size, patch.size);
        set(&mut next.welcome_message, patch.welcome_message.clone());
        set(&mut next.widget_title, patch.widget_title.clone());
        set(&mut next.brand_name, patch.brand_name.clone());
        set(&mut next.collect_name, patch.collect_name);
        set(&mut next.collect_email, patch.collect_email);
        set(&mut next.collect_phone, patch.collect_phone);
        set(
            &mut next.require_otp_verification,
            patch.require_otp_verification,
        );
        next
    }

    /// Whether switching from `self` to `other` changes how the panel looks.
    pub fn differs_visually(&self, other: &WidgetConfig) -> bool {
        self.theme != other.theme || self.position != other.position || self.size != other.size
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

// ── Partial fragments ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemePatch {
    #[serde(default, deserialize_with = "lenient")]
    pub primary_color: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub text_color: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub background_color: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub secondary_text_color: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub input_background_color: Option<String>,
}

impl ThemePatch {
    fn apply_to(&self, theme: &mut Theme) {
        set(&mut theme.primary_color, self.primary_color.clone());
        set(&mut theme.text_color, self.text_color.clone());
        set(&mut theme.background_color, self.background_color.clone());
        set(
            &mut theme.secondary_text_color,
            self.secondary_text_color.clone(),
        );
        set(
            &mut theme.input_background_color,
            self.input_background_color.clone(),
        );
    }

    fn absorb(&mut self, other: ThemePatch) {
        or_replace(&mut self.primary_color, other.primary_color);
        or_replace(&mut self.text_color, other.text_color);
        or_replace(&mut self.background_color, other.background_color);
        or_replace(&mut self.secondary_text_color, other.secondary_text_color);
        or_replace(&mut self.input_background_color, other.input_background_color);
    }
}

/// A partial configuration as sent by the server or a `setConfig` command.
/// Malformed values are dropped field by field; unknown keys are kept aside
/// in `unrecognized` for diagnostics and never merged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfigPatch {
    #[serde(default, deserialize_with = "lenient")]
    pub theme: Option<ThemePatch>,
    #[serde(default, deserialize_with = "lenient")]
    pub position: Option<Position>,
    #[serde(default, deserialize_with = "lenient")]
    pub size: Option<Size>,
    #[serde(default, deserialize_with = "lenient")]
    pub welcome_message: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub widget_title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub brand_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub collect_name: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub collect_email: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub collect_phone: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub require_otp_verification: Option<bool>,

    #[serde(flatten)]
    pub unrecognized: BTreeMap<String, Value>,
}

impl WidgetConfigPatch {
    pub fn unrecognized_keys(&self) -> Vec<&str> {
        self.unrecognized.keys().map(String::as_str).collect()
    }

    /// Folds a later fragment into this one; later values win, `theme`
    /// merges per colour.
    pub fn absorb(&mut self, later: WidgetConfigPatch) {
        if let Some(theirs) = later.theme {
            self.theme
                .get_or_insert_with(ThemePatch::default)
                .absorb(theirs);
        }
        or_replace(&mut self.position, later.position);
        or_replace(&mut self.size, later.size);
        or_replace(&mut self.welcome_message, later.welcome_message);
        or_replace(&mut self.widget_title, later.widget_title);
        or_replace(&mut self.brand_name, later.brand_name);
        or_replace(&mut self.collect_name, later.collect_name);
        or_replace(&mut self.collect_email, later.collect_email);
        or_replace(&mut self.collect_phone, later.collect_phone);
        or_replace(
            &mut self.require_otp_verification,
            later.require_otp_verification,
        );
    }
}

fn or_replace<T>(slot: &mut Option<T>, later: Option<T>) {
    if later.is_some() {
        *slot = later;
    }
}

// ── Resolver ──────────────────────────────────────────────────────────────────

/// Merges defaults, the server fragment and the host fragment.
pub fn resolve(server: &WidgetConfigPatch, host: &WidgetConfigPatch) -> WidgetConfig {
    WidgetConfig::default().merged(server).merged(host)
}

/// Result of folding in a host override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigChange {
    pub visual: bool,
}

/// Holds both override layers and the effective configuration derived from
/// them. The effective config is replaced, never edited, on every change.
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    server: WidgetConfigPatch,
    host: WidgetConfigPatch,
    effective: WidgetConfig,
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn effective(&self) -> &WidgetConfig {
        &self.effective
    }

    /// Installs the fragment fetched from the backend. Host overrides still
    /// take precedence over it.
    pub fn apply_server(&mut self, patch: WidgetConfigPatch) -> ConfigChange {
        if !patch.unrecognized.is_empty() {
            tracing::warn!(
                "Ignoring unrecognized server config keys: {:?}",
                patch.unrecognized_keys()
            );
        }
        self.server = patch;
        self.refresh()
    }

    /// Falls back to built-in defaults plus whatever the host already set.
    pub fn apply_server_failure(&mut self) -> ConfigChange {
        self.server = WidgetConfigPatch::default();
        self.refresh()
    }

    pub fn apply_host(&mut self, patch: WidgetConfigPatch) -> ConfigChange {
        if !patch.unrecognized.is_empty() {
            tracing::warn!(
                "Ignoring unrecognized setConfig keys: {:?}",
                patch.unrecognized_keys()
            );
        }
        self.host.absorb(patch);
        self.refresh()
    }

    fn refresh(&mut self) -> ConfigChange {
        let next = resolve(&self.server, &self.host);
        let change = ConfigChange {
            visual: self.effective.differs_visually(&next),
        };
        self.effective = next;
        change
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patch(value: Value) -> WidgetConfigPatch {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn empty_layers_yield_defaults() {
        let config = resolve(&WidgetConfigPatch::default(), &WidgetConfigPatch::default());
        assert_eq!(config, WidgetConfig::default());
        assert_eq!(config.position, Position::BottomRight);
        assert_eq!(config.size, Size::Medium);
        assert!(config.require_otp_verification);
        assert_eq!(config.theme.primary_color, "#0078d4");
    }

    #[test]
    fn server_fragment_replaces_only_its_keys() {
        let config = resolve(&patch(json!({"widgetTitle": "Acme"})), &WidgetConfigPatch::default());
        assert_eq!(config.widget_title, "Acme");
        assert_eq!(config.position, Position::BottomRight);
        assert_eq!(config.brand_name, "BeyondAsk");
    }

    #[test]
    fn theme_merges_per_colour() {
        let config = resolve(
            &patch(json!({"theme": {"primaryColor": "#111111"}})),
            &patch(json!({"theme": {"textColor": "#222222"}})),
        );
        assert_eq!(config.theme.primary_color, "#111111");
        assert_eq!(config.theme.text_color, "#222222");
        assert_eq!(config.theme.background_color, "#ffffff");
    }

    #[test]
    fn host_beats_server() {
        let config = resolve(
            &patch(json!({"position": "top-left", "size": "small"})),
            &patch(json!({"position": "bottom-left"})),
        );
        assert_eq!(config.position, Position::BottomLeft);
        assert_eq!(config.size, Size::Small);
    }

    #[test]
    fn malformed_fields_are_dropped_individually() {
        let p = patch(json!({
            "position": "center",
            "collectPhone": "yes",
            "widgetTitle": "Kept",
            "somethingElse": 1
        }));
        assert_eq!(p.position, None);
        assert_eq!(p.collect_phone, None);
        assert_eq!(p.widget_title.as_deref(), Some("Kept"));
        assert_eq!(p.unrecognized_keys(), vec!["somethingElse"]);

        let config = resolve(&p, &WidgetConfigPatch::default());
        assert_eq!(config.position, Position::BottomRight);
        assert!(!config.collect_phone);
    }

    #[test]
    fn resolving_twice_with_empty_override_is_idempotent() {
        let mut resolver = ConfigResolver::new();
        resolver.apply_server(patch(json!({"brandName": "Acme"})));
        let first = resolver.effective().clone();
        let change = resolver.apply_host(WidgetConfigPatch::default());
        assert!(!change.visual);
        resolver.apply_host(WidgetConfigPatch::default());
        assert_eq!(resolver.effective(), &first);
    }

    #[test]
    fn host_overrides_survive_a_late_server_config() {
        let mut resolver = ConfigResolver::new();
        resolver.apply_host(patch(json!({"widgetTitle": "Host"})));
        resolver.apply_server(patch(json!({"widgetTitle": "Server", "brandName": "S"})));
        assert_eq!(resolver.effective().widget_title, "Host");
        assert_eq!(resolver.effective().brand_name, "S");
    }

    #[test]
    fn server_failure_keeps_host_layer() {
        let mut resolver = ConfigResolver::new();
        resolver.apply_host(patch(json!({"size": "large"})));
        resolver.apply_server_failure();
        assert_eq!(resolver.effective().size, Size::Large);
        assert_eq!(resolver.effective().widget_title, "AI Assistant");
    }

    #[test]
    fn host_fragments_accumulate() {
        let mut resolver = ConfigResolver::new();
        resolver.apply_host(patch(json!({"theme": {"primaryColor": "#000000"}})));
        resolver.apply_host(patch(json!({"theme": {"textColor": "#eeeeee"}, "welcomeMessage": "Hey"})));
        let config = resolver.effective();
        assert_eq!(config.theme.primary_color, "#000000");
        assert_eq!(config.theme.text_color, "#eeeeee");
        assert_eq!(config.welcome_message, "Hey");
    }

    #[test]
    fn visual_change_is_reported_only_for_theme_position_size() {
        let mut resolver = ConfigResolver::new();
        assert!(!resolver.apply_host(patch(json!({"widgetTitle": "X"}))).visual);
        assert!(resolver.apply_host(patch(json!({"size": "large"}))).visual);
        assert!(!resolver.apply_host(patch(json!({"size": "large"}))).visual);
        assert!(resolver.apply_host(patch(json!({"theme": {"textColor": "#000"}}))).visual);
    }
}
