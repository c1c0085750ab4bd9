//! The Show All / Collapse All button group.

use crate::markers::Markers;
use crate::page::ClickAction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolbarButton {
    pub id: String,
    /// Space separated class list.
    pub class: String,
    pub label: String,
    pub aria_label: String,
    pub action: ClickAction,
}

/// Description of the injected toolbar, independent of how a page builds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolbar {
    /// Classes on the wrapping group, marker class last.
    pub classes: Vec<String>,
    pub buttons: Vec<ToolbarButton>,
}

impl Toolbar {
    pub fn from_markers(markers: &Markers) -> Self {
        Self {
            classes: vec![
                markers.toolbar_group_class.clone(),
                markers.toolbar_class.clone(),
            ],
            buttons: vec![
                ToolbarButton {
                    id: markers.show_all_button_id.clone(),
                    class: markers.tool_button_class.clone(),
                    label: "Show All Files".to_string(),
                    aria_label: "Show All".to_string(),
                    action: ClickAction::ShowAll,
                },
                ToolbarButton {
                    id: markers.collapse_all_button_id.clone(),
                    class: markers.tool_button_class.clone(),
                    label: "Collapse All Files".to_string(),
                    aria_label: "Collapse All".to_string(),
                    action: ClickAction::CollapseAll,
                },
            ],
        }
    }

    /// HTML fragment for `insertAdjacentHTML`.
    pub fn to_html(&self) -> String {
        let mut html = format!(
            r#"<div class="{}">"#,
            escape(&self.classes.join(" "))
        );
        for button in &self.buttons {
            html.push_str(&format!(
                r##"<a id="{}" class="{}" href="#" aria-label="{}">{}</a>"##,
                escape(&button.id),
                escape(&button.class),
                escape(&button.aria_label),
                escape(&button.label),
            ));
        }
        html.push_str("</div>");
        html
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_all_comes_first() {
        let toolbar = Toolbar::from_markers(&Markers::default());
        let actions: Vec<_> = toolbar.buttons.iter().map(|b| b.action).collect();
        assert_eq!(actions, vec![ClickAction::ShowAll, ClickAction::CollapseAll]);
        assert_eq!(toolbar.classes.last().map(String::as_str), Some("rvt-tools"));
    }

    #[test]
    fn renders_fragment() {
        let html = Toolbar::from_markers(&Markers::default()).to_html();
        assert!(html.starts_with(r#"<div class="BtnGroup rvt-tools">"#));
        assert!(html.contains(
            r##"<a id="rvt-show-all" class="btn btn-sm BtnGroup-item" href="#" aria-label="Show All">Show All Files</a>"##
        ));
        assert!(html.contains(r#"id="rvt-collapse-all""#));
        assert!(html.ends_with("</div>"));
        assert!(html.find("rvt-show-all") < html.find("rvt-collapse-all"));
    }

    #[test]
    fn escapes_configured_values() {
        let markers = Markers {
            tool_button_class: r#"btn" onclick="x"#.to_string(),
            ..Markers::default()
        };
        let html = Toolbar::from_markers(&markers).to_html();
        assert!(html.contains("btn&quot; onclick=&quot;x"));
        assert!(!html.contains(r#"onclick="x""#));
    }
}
