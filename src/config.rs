//! Runtime configuration.
//!
//! Every field has a default so a content script can pass `{}` (or nothing)
//! and only override what the host page needs.

use crate::error::{Result, TogglerError};
use crate::markers::Markers;
use serde::{Deserialize, Serialize};

/// Re-probe period for single-page navigation (milliseconds).
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TogglerConfig {
    pub markers: Markers,
    pub poll_interval_ms: u32,
}

impl Default for TogglerConfig {
    fn default() -> Self {
        Self {
            markers: Markers::default(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl TogglerConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: TogglerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Deserialize and validate a config object handed over from JS.
    #[cfg(target_arch = "wasm32")]
    pub fn from_js(value: wasm_bindgen::JsValue) -> Result<Self> {
        if value.is_undefined() || value.is_null() {
            return Ok(Self::default());
        }
        let config: TogglerConfig = serde_wasm_bindgen::from_value(value)
            .map_err(|e| TogglerError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(TogglerError::InvalidConfig(
                "pollIntervalMs must be greater than zero".to_string(),
            ));
        }

        let m = &self.markers;
        for (name, value) in m.single_tokens() {
            if value.is_empty() || value.chars().any(char::is_whitespace) {
                return Err(TogglerError::InvalidConfig(format!(
                    "{} must be a single non-empty token, got {:?}",
                    name, value
                )));
            }
        }

        for (name, value) in [
            ("nativeCollapseSelector", &m.native_collapse_selector),
            ("diffBarSelector", &m.diff_bar_selector),
            ("toolButtonClass", &m.tool_button_class),
            ("storageKey", &m.storage_key),
        ] {
            if value.trim().is_empty() {
                return Err(TogglerError::InvalidConfig(format!(
                    "{} must not be empty",
                    name
                )));
            }
        }

        if m.detail_shown_class == m.detail_hidden_class {
            return Err(TogglerError::InvalidConfig(
                "shown and hidden classes must differ".to_string(),
            ));
        }
        if m.state_collapsed.is_empty()
            || m.state_expanded.is_empty()
            || m.state_collapsed == m.state_expanded
        {
            return Err(TogglerError::InvalidConfig(
                "collapsed and expanded values must be distinct and non-empty".to_string(),
            ));
        }
        if m.show_all_button_id == m.collapse_all_button_id {
            return Err(TogglerError::InvalidConfig(
                "toolbar button ids must differ".to_string(),
            ));
        }
        Ok(())
    }
}
