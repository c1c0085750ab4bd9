//! Marker classes, selectors and ids the toggler reads and writes.
//!
//! The host site changes its markup every so often, so every name lives
//! here and can be overridden from config instead of being baked into the
//! toggling logic.

use serde::{Deserialize, Serialize};

/// Class carried by every file header row.
pub const FILE_HEADER_CLASS: &str = "file-header";
/// Class on a diff body that is currently visible.
pub const DETAIL_SHOWN_CLASS: &str = "Details-content--shown";
/// Class on a diff body that is currently collapsed.
pub const DETAIL_HIDDEN_CLASS: &str = "Details-content--hidden";
/// Class present only on pages that render a diff.
pub const DIFF_BODY_CLASS: &str = "js-diff-progressive-container";
/// The host's own per-file collapse buttons.
pub const NATIVE_COLLAPSE_SELECTOR: &str = ".file-header .js-details-target";
/// Element the toolbar is prepended into.
pub const DIFF_BAR_SELECTOR: &str = ".pr-review-tools";
/// Marks our toolbar; its presence means the page is already enhanced.
pub const TOOLBAR_CLASS: &str = "rvt-tools";
pub const TOOLBAR_GROUP_CLASS: &str = "BtnGroup";
pub const TOOL_BUTTON_CLASS: &str = "btn btn-sm BtnGroup-item";
pub const SHOW_ALL_BUTTON_ID: &str = "rvt-show-all";
pub const COLLAPSE_ALL_BUTTON_ID: &str = "rvt-collapse-all";
/// Local storage key holding the global preference.
pub const STORAGE_KEY: &str = "rvt-diff-state";
pub const STATE_COLLAPSED: &str = "collapsed";
pub const STATE_EXPANDED: &str = "expanded";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Markers {
    pub file_header_class: String,
    pub detail_shown_class: String,
    pub detail_hidden_class: String,
    pub diff_body_class: String,
    pub native_collapse_selector: String,
    pub diff_bar_selector: String,
    pub toolbar_class: String,
    pub toolbar_group_class: String,
    /// Space separated; applied verbatim to both buttons.
    pub tool_button_class: String,
    pub show_all_button_id: String,
    pub collapse_all_button_id: String,
    pub storage_key: String,
    pub state_collapsed: String,
    pub state_expanded: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            file_header_class: FILE_HEADER_CLASS.to_string(),
            detail_shown_class: DETAIL_SHOWN_CLASS.to_string(),
            detail_hidden_class: DETAIL_HIDDEN_CLASS.to_string(),
            diff_body_class: DIFF_BODY_CLASS.to_string(),
            native_collapse_selector: NATIVE_COLLAPSE_SELECTOR.to_string(),
            diff_bar_selector: DIFF_BAR_SELECTOR.to_string(),
            toolbar_class: TOOLBAR_CLASS.to_string(),
            toolbar_group_class: TOOLBAR_GROUP_CLASS.to_string(),
            tool_button_class: TOOL_BUTTON_CLASS.to_string(),
            show_all_button_id: SHOW_ALL_BUTTON_ID.to_string(),
            collapse_all_button_id: COLLAPSE_ALL_BUTTON_ID.to_string(),
            storage_key: STORAGE_KEY.to_string(),
            state_collapsed: STATE_COLLAPSED.to_string(),
            state_expanded: STATE_EXPANDED.to_string(),
        }
    }
}

impl Markers {
    /// Names that are used as a single class token or element id.
    ///
    /// These must be non-empty and free of whitespace; selectors and the
    /// multi-class button string are checked separately.
    pub(crate) fn single_tokens(&self) -> [(&'static str, &str); 8] {
        [
            ("fileHeaderClass", self.file_header_class.as_str()),
            ("detailShownClass", self.detail_shown_class.as_str()),
            ("detailHiddenClass", self.detail_hidden_class.as_str()),
            ("diffBodyClass", self.diff_body_class.as_str()),
            ("toolbarClass", self.toolbar_class.as_str()),
            ("toolbarGroupClass", self.toolbar_group_class.as_str()),
            ("showAllButtonId", self.show_all_button_id.as_str()),
            ("collapseAllButtonId", self.collapse_all_button_id.as_str()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_the_constants() {
        let markers = Markers::default();
        assert_eq!(markers.file_header_class, FILE_HEADER_CLASS);
        assert_eq!(markers.storage_key, STORAGE_KEY);
        assert_ne!(markers.detail_shown_class, markers.detail_hidden_class);
        assert_ne!(markers.state_collapsed, markers.state_expanded);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let markers: Markers =
            serde_json::from_str(r#"{ "fileHeaderClass": "diff-file-header" }"#).unwrap();
        assert_eq!(markers.file_header_class, "diff-file-header");
        assert_eq!(markers.toolbar_class, TOOLBAR_CLASS);
    }
}
