//! Per-kind activation heuristics
//!
//! Every trigger gets exactly one action: the smallest state change that can
//! reveal hidden content without navigating away or destroying data.

use crate::dom::{EventKind, NodeId};
use crate::host::HostTree;
use serde::Serialize;
use std::time::Duration;
use url::Url;

/// Placeholder typed into free-text inputs
pub const PLACEHOLDER_TEXT: &str = "test";

/// Minimum visible rows of an expanded choice list
pub const MIN_EXPANDED_ROWS: usize = 5;

/// Action family chosen from an element's kind alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Summary inside a disclosure: open the parent container
    OpenParent,
    /// The disclosure container itself
    Open,
    /// Native choice list
    ExpandList,
    /// Hyperlink, subject to the origin check
    Link,
    /// Checkbox or radio
    Toggle,
    /// Input without a type marker
    TypeText,
    /// Everything else
    Pointer,
}

impl ActionKind {
    /// `input_type` is the lowercased `type` attribute (empty when absent)
    pub fn classify(tag: &str, input_type: &str, parent_tag: Option<&str>) -> Self {
        match tag {
            "summary" if parent_tag == Some("details") => ActionKind::OpenParent,
            "details" => ActionKind::Open,
            "select" => ActionKind::ExpandList,
            "a" => ActionKind::Link,
            _ if matches!(input_type, "checkbox" | "radio") => ActionKind::Toggle,
            "input" if input_type.is_empty() => ActionKind::TypeText,
            _ => ActionKind::Pointer,
        }
    }
}

/// Concrete action planned for one trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Force a disclosure container open
    Open { container: NodeId },
    /// Show at least `rows` rows of a choice list
    Expand { rows: usize },
    /// Same-origin link: synthesize its activation
    Follow { target: String },
    /// Cross-origin or unresolvable link: do nothing
    Refuse { href: String },
    /// Flip checkedness and announce the change
    Toggle { checked: bool },
    /// Focus and type placeholder text
    Type { text: &'static str },
    /// Pointer-down followed by click
    Pointer,
}

impl Action {
    /// Decide what activating `node` would do, without touching the tree
    pub fn plan<T: HostTree + ?Sized>(tree: &T, node: NodeId) -> Self {
        let tag = tree.tag_name(node).unwrap_or_default();
        let input_type = tree.attribute(node, "type").unwrap_or_default().to_ascii_lowercase();
        let parent = tree.parent(node);
        let parent_tag = parent.and_then(|p| tree.tag_name(p));

        match ActionKind::classify(tag, &input_type, parent_tag) {
            ActionKind::OpenParent => Action::Open {
                container: parent.unwrap_or(node),
            },
            ActionKind::Open => Action::Open { container: node },
            ActionKind::ExpandList => Action::Expand {
                rows: tree.option_count(node).max(MIN_EXPANDED_ROWS),
            },
            ActionKind::Link => {
                let href = tree.attribute(node, "href").unwrap_or_default();
                match same_origin_target(tree.base_url(), href) {
                    Some(target) => Action::Follow {
                        target: target.to_string(),
                    },
                    None => Action::Refuse {
                        href: href.to_string(),
                    },
                }
            }
            ActionKind::Toggle => Action::Toggle {
                checked: !tree.is_checked(node),
            },
            ActionKind::TypeText => Action::Type {
                text: PLACEHOLDER_TEXT,
            },
            ActionKind::Pointer => Action::Pointer,
        }
    }

    /// Carry the action out on `node`
    pub fn apply<T: HostTree + ?Sized>(&self, tree: &mut T, node: NodeId) {
        match self {
            Action::Open { container } => tree.set_attribute(*container, "open", ""),
            Action::Expand { rows } => tree.set_attribute(node, "size", &rows.to_string()),
            Action::Follow { .. } => tree.click(node),
            Action::Refuse { .. } => {}
            Action::Toggle { checked } => {
                tree.set_checked(node, *checked);
                tree.dispatch_event(node, EventKind::Change);
            }
            Action::Type { text } => {
                tree.focus(node);
                tree.set_value(node, text);
                tree.dispatch_event(node, EventKind::Input);
            }
            Action::Pointer => {
                tree.dispatch_event(node, EventKind::PointerDown);
                tree.dispatch_event(node, EventKind::Click);
            }
        }
    }

    /// Whether carrying out the action changes anything
    pub fn is_noop(&self) -> bool {
        matches!(self, Action::Refuse { .. })
    }
}

/// Resolve `href` against the document URL and keep it only when it stays on
/// the document's origin. Origins are compared in their serialized form, so
/// two opaque origins (e.g. `file:` pages) compare equal as they do in browsers.
pub fn same_origin_target(base: &Url, href: &str) -> Option<Url> {
    let target = base.join(href).ok()?;
    (target.origin().ascii_serialization() == base.origin().ascii_serialization()).then_some(target)
}

/// Performs the action for a trigger and waits for the page to settle
#[derive(Debug, Clone)]
pub struct ActionDispatcher {
    settle: Duration,
}

impl ActionDispatcher {
    pub fn new(settle: Duration) -> Self {
        Self { settle }
    }

    pub async fn activate<T: HostTree + ?Sized>(&self, tree: &mut T, node: NodeId) -> Action {
        let action = Action::plan(&*tree, node);
        if action.is_noop() {
            log::debug!("refusing to activate {}: {:?}", node, action);
        } else {
            log::debug!("activating {}: {:?}", node, action);
        }
        action.apply(tree, node);
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }
        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DomTree;

    fn page(body: &str) -> DomTree {
        DomTree::parse_html(&format!("<body>{body}</body>"), "https://app.example.com/docs/page").unwrap()
    }

    fn target(tree: &DomTree) -> NodeId {
        tree.find_by_id("t").expect("fixture needs id=t")
    }

    #[test]
    fn test_action_kind_table() {
        assert_eq!(ActionKind::classify("summary", "", Some("details")), ActionKind::OpenParent);
        assert_eq!(ActionKind::classify("summary", "", Some("div")), ActionKind::Pointer);
        assert_eq!(ActionKind::classify("details", "", None), ActionKind::Open);
        assert_eq!(ActionKind::classify("select", "", None), ActionKind::ExpandList);
        assert_eq!(ActionKind::classify("a", "", None), ActionKind::Link);
        assert_eq!(ActionKind::classify("input", "checkbox", None), ActionKind::Toggle);
        assert_eq!(ActionKind::classify("div", "radio", None), ActionKind::Toggle);
        assert_eq!(ActionKind::classify("input", "", None), ActionKind::TypeText);
        assert_eq!(ActionKind::classify("input", "text", None), ActionKind::Pointer);
        assert_eq!(ActionKind::classify("button", "", None), ActionKind::Pointer);
    }

    #[test]
    fn test_same_origin_target() {
        let base = Url::parse("https://app.example.com/docs/page").unwrap();

        assert!(same_origin_target(&base, "#section").is_some());
        assert!(same_origin_target(&base, "/other").is_some());
        assert!(same_origin_target(&base, "").is_some());
        assert!(same_origin_target(&base, "https://evil.example.org/").is_none());
        assert!(same_origin_target(&base, "http://app.example.com/").is_none());
        assert!(same_origin_target(&base, "https://app.example.com:8443/").is_none());
    }

    #[test]
    fn test_file_pages_treat_links_as_same_origin() {
        let base = Url::parse("file:///tmp/page.html").unwrap();
        assert!(same_origin_target(&base, "#top").is_some());
    }

    #[test]
    fn test_plan_select_rows() {
        let tree = page(r#"<select id="t"><option>a</option><option>b</option><option>c</option></select>"#);
        assert_eq!(Action::plan(&tree, target(&tree)), Action::Expand { rows: 5 });

        let tree = page(&format!(
            r#"<select id="t"><optgroup>{}</optgroup></select>"#,
            "<option>x</option>".repeat(7)
        ));
        assert_eq!(Action::plan(&tree, target(&tree)), Action::Expand { rows: 7 });
    }

    #[test]
    fn test_plan_summary_opens_parent() {
        let tree = page(r#"<details id="d"><summary id="t">More</summary></details>"#);
        let details = tree.find_by_id("d").unwrap();
        assert_eq!(Action::plan(&tree, target(&tree)), Action::Open { container: details });
    }

    #[test]
    fn test_plan_links() {
        let tree = page(r#"<a id="t" href="https://elsewhere.test/x">x</a>"#);
        assert_eq!(
            Action::plan(&tree, target(&tree)),
            Action::Refuse {
                href: "https://elsewhere.test/x".to_string()
            }
        );

        let tree = page(r##"<a id="t" href="#faq">faq</a>"##);
        assert_eq!(
            Action::plan(&tree, target(&tree)),
            Action::Follow {
                target: "https://app.example.com/docs/page#faq".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_activate_checkbox() {
        let mut tree = page(r#"<input id="t" type="checkbox">"#);
        let node = target(&tree);
        let dispatcher = ActionDispatcher::new(Duration::ZERO);

        let action = dispatcher.activate(&mut tree, node).await;

        assert_eq!(action, Action::Toggle { checked: true });
        assert!(tree.is_checked(node));
        assert_eq!(tree.event_count(node, EventKind::Change), 1);
    }

    #[tokio::test]
    async fn test_activate_text_input() {
        let mut tree = page(r#"<input id="t">"#);
        let node = target(&tree);

        ActionDispatcher::new(Duration::ZERO).activate(&mut tree, node).await;

        assert_eq!(tree.value(node), Some(PLACEHOLDER_TEXT));
        assert_eq!(tree.focused(), Some(node));
        assert_eq!(tree.event_count(node, EventKind::Input), 1);
    }

    #[tokio::test]
    async fn test_activate_pointer_sequence() {
        let mut tree = page(r#"<div id="t" role="button">menu</div>"#);
        let node = target(&tree);

        ActionDispatcher::new(Duration::ZERO).activate(&mut tree, node).await;

        assert_eq!(
            tree.events(),
            &[(node, EventKind::PointerDown), (node, EventKind::Click)]
        );
    }

    #[tokio::test]
    async fn test_refused_link_dispatches_nothing() {
        let mut tree = page(r#"<a id="t" href="//cdn.other.test/">x</a>"#);
        let node = target(&tree);

        let action = ActionDispatcher::new(Duration::ZERO).activate(&mut tree, node).await;

        assert!(action.is_noop());
        assert!(tree.events().is_empty());
        assert!(tree.navigations().is_empty());
    }
}
