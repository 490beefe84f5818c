//! Control and trigger classification rules

use crate::dom::NodeId;
use crate::host::HostTree;

/// Tags that are always serialized
const CONTROL_TAGS: [&str; 5] = ["input", "select", "textarea", "button", "summary"];

/// Roles that mark an element as activatable in the main pass
const TRIGGER_ROLES: [&str; 7] = [
    "button", "link", "menuitem", "checkbox", "switch", "radio", "combobox",
];

/// Which trigger rule set a scan applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerRules {
    /// Broad set used by the exploration loop
    Main,
    /// Narrow set used to enumerate combinations
    Combo,
}

impl TriggerRules {
    pub fn matches<T: HostTree + ?Sized>(self, tree: &T, node: NodeId) -> bool {
        match self {
            TriggerRules::Main => is_trigger(tree, node),
            TriggerRules::Combo => is_combo_trigger(tree, node),
        }
    }
}

/// Native form controls, buttons and disclosure summaries
pub fn is_control<T: HostTree + ?Sized>(tree: &T, node: NodeId) -> bool {
    tree.tag_name(node).is_some_and(|tag| CONTROL_TAGS.contains(&tag))
}

fn has_role<T: HostTree + ?Sized>(tree: &T, node: NodeId, roles: &[&str]) -> bool {
    tree.attribute(node, "role")
        .is_some_and(|value| value.split_whitespace().any(|role| roles.contains(&role)))
}

/// Broad trigger classifier of the main exploration pass
pub fn is_trigger<T: HostTree + ?Sized>(tree: &T, node: NodeId) -> bool {
    let Some(tag) = tree.tag_name(node) else {
        return false;
    };
    let disabled = tree.has_attribute(node, "disabled");

    let by_tag = match tag {
        "a" => tree.has_attribute(node, "href") && !tree.has_attribute(node, "download"),
        "button" | "summary" => true,
        "input" => {
            !disabled
                && !tree
                    .attribute(node, "type")
                    .is_some_and(|t| t.eq_ignore_ascii_case("hidden"))
        }
        "select" | "textarea" => !disabled,
        _ => false,
    };

    by_tag
        || tree.attribute(node, "contenteditable") == Some("true")
        || tree.attribute(node, "tabindex").is_some_and(is_focusable_tab_order)
        || tree.has_attribute(node, "aria-haspopup")
        || has_role(tree, node, &TRIGGER_ROLES)
}

/// Narrow classifier of combo mode: choice lists, popups, menus, comboboxes and buttons
pub fn is_combo_trigger<T: HostTree + ?Sized>(tree: &T, node: NodeId) -> bool {
    match tree.tag_name(node) {
        Some("select" | "button") => true,
        Some(_) => {
            tree.has_attribute(node, "aria-haspopup") || has_role(tree, node, &["menu", "combobox"])
        }
        None => false,
    }
}

/// Explicit tab order that is not negative. Unparseable values still count.
fn is_focusable_tab_order(value: &str) -> bool {
    value.trim().parse::<i64>().map_or(true, |order| order >= 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DomTree;

    fn classify(html: &str) -> (bool, bool, bool) {
        let tree = DomTree::parse_html(&format!("<body>{html}</body>"), "https://example.com/").unwrap();
        let node = tree.find_by_id("t").expect("fixture needs id=t");
        (
            is_control(&tree, node),
            is_trigger(&tree, node),
            is_combo_trigger(&tree, node),
        )
    }

    #[test]
    fn test_controls() {
        assert_eq!(classify(r#"<input id="t">"#), (true, true, false));
        assert_eq!(classify(r#"<textarea id="t"></textarea>"#), (true, true, false));
        assert_eq!(classify(r#"<button id="t">b</button>"#), (true, true, true));
        assert_eq!(classify(r#"<select id="t"></select>"#), (true, true, true));
        assert_eq!(
            classify(r#"<details><summary id="t">s</summary></details>"#),
            (true, true, false)
        );
    }

    #[test]
    fn test_disabled_and_hidden_inputs_are_controls_only() {
        assert_eq!(classify(r#"<input id="t" type="HIDDEN">"#), (true, false, false));
        assert_eq!(classify(r#"<input id="t" disabled>"#), (true, false, false));
        assert_eq!(classify(r#"<select id="t" disabled></select>"#), (true, false, true));
        // disabled buttons still match the main trigger rules
        assert_eq!(classify(r#"<button id="t" disabled>b</button>"#), (true, true, true));
    }

    #[test]
    fn test_links() {
        assert_eq!(classify(r##"<a id="t" href="#x">x</a>"##), (false, true, false));
        assert_eq!(classify(r#"<a id="t">x</a>"#), (false, false, false));
        assert_eq!(classify(r#"<a id="t" href="/f.pdf" download>x</a>"#), (false, false, false));
    }

    #[test]
    fn test_attribute_markers() {
        assert_eq!(classify(r#"<div id="t" contenteditable="true"></div>"#), (false, true, false));
        assert_eq!(classify(r#"<div id="t" contenteditable="false"></div>"#), (false, false, false));
        assert_eq!(classify(r#"<div id="t" tabindex="0"></div>"#), (false, true, false));
        assert_eq!(classify(r#"<div id="t" tabindex="-1"></div>"#), (false, false, false));
        assert_eq!(classify(r#"<div id="t" aria-haspopup="menu"></div>"#), (false, true, true));
    }

    #[test]
    fn test_roles() {
        assert_eq!(classify(r#"<div id="t" role="switch"></div>"#), (false, true, false));
        assert_eq!(classify(r#"<div id="t" role="presentation button"></div>"#), (false, true, false));
        assert_eq!(classify(r#"<ul id="t" role="menu"></ul>"#), (false, false, true));
        assert_eq!(classify(r#"<div id="t" role="combobox"></div>"#), (false, true, true));
        assert_eq!(classify(r#"<div id="t" role="region"></div>"#), (false, false, false));
    }

    #[test]
    fn test_tab_order_values() {
        assert!(is_focusable_tab_order("3"));
        assert!(is_focusable_tab_order(" 0 "));
        assert!(is_focusable_tab_order("abc"));
        assert!(!is_focusable_tab_order("-2"));
    }
}
