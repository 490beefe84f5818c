use crate::dom::NodeId;
use crate::host::HostTree;
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Information needed to locate an element again
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct ElementSelector {
    /// CSS selector for the element; shadow boundaries are written as `>>>`
    pub css_selector: String,

    /// Element's tag name
    pub tag_name: String,

    /// Element's text content (truncated for display)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ElementSelector {
    /// Create a new ElementSelector with CSS selector
    pub fn new(css_selector: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            css_selector: css_selector.into(),
            tag_name: tag_name.into(),
            text: None,
        }
    }

    /// Describe a node of `tree`
    pub fn for_node<T: HostTree + ?Sized>(tree: &T, node: NodeId) -> Self {
        let mut selector = Self::new(css_path(tree, node), tree.tag_name(node).unwrap_or_default());

        let text = tree.inner_text(node);
        if !text.is_empty() {
            let truncated = if text.chars().count() > 50 {
                format!("{}...", text.chars().take(47).collect::<String>())
            } else {
                text
            };
            selector = selector.with_text(truncated);
        }

        selector
    }

    /// Builder method: set text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Get the best selector to use
    pub fn best_selector(&self) -> &str {
        &self.css_selector
    }
}

impl fmt::Display for ElementSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}> {}", self.tag_name, self.css_selector)?;
        if let Some(text) = &self.text {
            write!(f, " {:?}", text)?;
        }
        Ok(())
    }
}

/// Build a selector path for a node: `#id` when available, otherwise
/// `tag:nth-child(k)` steps up to the top of the tree scope.
pub fn css_path<T: HostTree + ?Sized>(tree: &T, node: NodeId) -> String {
    let mut segments = Vec::new();
    let mut current = node;
    let mut host = None;

    while let Some(tag) = tree.tag_name(current) {
        if let Some(id) = tree.attribute(current, "id").filter(|id| !id.is_empty()) {
            segments.push(format!("#{id}"));
            host = scope_host(tree, current);
            break;
        }
        let Some(parent) = tree.parent(current) else {
            segments.push(tag.to_string());
            break;
        };
        let shadow_host = tree.shadow_host(parent);
        if !tree.is_element(parent) && shadow_host.is_none() {
            segments.push(tag.to_string());
            break;
        }
        let position = tree
            .element_children(parent)
            .iter()
            .position(|&child| child == current)
            .map_or(1, |p| p + 1);
        segments.push(format!("{tag}:nth-child({position})"));
        if shadow_host.is_some() {
            host = shadow_host;
            break;
        }
        current = parent;
    }

    segments.reverse();
    let path = segments.join(" > ");
    match host {
        Some(host) => format!("{} >>> {}", css_path(tree, host), path),
        None => path,
    }
}

fn scope_host<T: HostTree + ?Sized>(tree: &T, node: NodeId) -> Option<NodeId> {
    let mut current = node;
    while let Some(parent) = tree.parent(current) {
        current = parent;
    }
    tree.shadow_host(current)
}

/// Map of trigger positions to their selectors
/// Uses IndexMap to preserve insertion order
#[derive(Debug, Clone, Default)]
pub struct SelectorMap {
    /// Map from index to selector information
    map: IndexMap<usize, ElementSelector>,

    /// Next available index
    next_index: usize,
}

impl SelectorMap {
    /// Create a new empty SelectorMap
    pub fn new() -> Self {
        Self {
            map: IndexMap::new(),
            next_index: 0,
        }
    }

    /// Describe every node in order
    pub fn from_nodes<T: HostTree + ?Sized>(tree: &T, nodes: &[NodeId]) -> Self {
        let mut map = Self::new();
        for &node in nodes {
            map.register(ElementSelector::for_node(tree, node));
        }
        map
    }

    /// Register a new element and return its assigned index
    pub fn register(&mut self, selector: ElementSelector) -> usize {
        let index = self.next_index;
        self.map.insert(index, selector);
        self.next_index += 1;
        index
    }

    /// Get selector by index
    pub fn get(&self, index: usize) -> Option<&ElementSelector> {
        self.map.get(&index)
    }

    /// Get the number of registered elements
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the map is empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Get all selectors
    pub fn selectors(&self) -> impl Iterator<Item = &ElementSelector> {
        self.map.values()
    }

    /// Descriptor strings for a set of positions
    pub fn descriptors(&self, indices: &[usize]) -> Vec<String> {
        indices
            .iter()
            .filter_map(|&index| self.get(index))
            .map(|selector| selector.best_selector().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DomTree;

    fn tree() -> DomTree {
        DomTree::parse_html(
            r#"<body>
                <div><button>One</button><button>Two</button></div>
                <nav id="main"><a href="/x">X</a></nav>
                <x-menu><template shadowrootmode="open"><span></span><button id="deep">Deep</button><i></i></template></x-menu>
            </body>"#,
            "https://example.com/",
        )
        .unwrap()
    }

    #[test]
    fn test_css_path_positional() {
        let tree = tree();
        let buttons = tree.find_all_by_tag("button");
        assert_eq!(
            css_path(&tree, buttons[1]),
            "html > body:nth-child(2) > div:nth-child(1) > button:nth-child(2)"
        );
    }

    #[test]
    fn test_css_path_anchors_on_id() {
        let tree = tree();
        let link = tree.find_all_by_tag("a")[0];
        assert_eq!(css_path(&tree, link), "#main > a:nth-child(1)");
    }

    #[test]
    fn test_css_path_crosses_shadow_boundary() {
        let tree = tree();
        let deep = tree.find_by_id("deep").unwrap();
        let italic = tree.find_all_by_tag("i")[0];
        assert_eq!(
            css_path(&tree, deep),
            "html > body:nth-child(2) > x-menu:nth-child(3) >>> #deep"
        );
        assert_eq!(
            css_path(&tree, italic),
            "html > body:nth-child(2) > x-menu:nth-child(3) >>> i:nth-child(3)"
        );
    }

    #[test]
    fn test_element_selector_for_node() {
        let tree = tree();
        let deep = tree.find_by_id("deep").unwrap();
        let selector = ElementSelector::for_node(&tree, deep);

        assert_eq!(selector.tag_name, "button");
        assert_eq!(selector.text.as_deref(), Some("Deep"));
        assert!(selector.best_selector().ends_with(">>> #deep"));
    }

    #[test]
    fn test_selector_map_register() {
        let mut map = SelectorMap::new();

        let idx1 = map.register(ElementSelector::new("#btn1", "button"));
        let idx2 = map.register(ElementSelector::new("#btn2", "button"));

        assert_eq!(idx1, 0);
        assert_eq!(idx2, 1);
        assert_eq!(map.len(), 2);
        assert_eq!(map.descriptors(&[1, 0, 7]), vec!["#btn2", "#btn1"]);
    }

    #[test]
    fn test_selector_map_from_nodes() {
        let tree = tree();
        let buttons = tree.find_all_by_tag("button");
        let map = SelectorMap::from_nodes(&tree, &buttons);

        assert_eq!(map.len(), 3);
        let texts: Vec<_> = map.selectors().filter_map(|s| s.text.clone()).collect();
        assert_eq!(texts, vec!["One", "Two", "Deep"]);
    }

    #[test]
    fn test_selector_display() {
        let selector = ElementSelector::new("#test", "button").with_text("Test Button");
        assert_eq!(selector.to_string(), r#"<button> #test "Test Button""#);
        assert_eq!(ElementSelector::new("#bare", "a").to_string(), "<a> #bare");

        let json = serde_json::to_string(&selector).unwrap();
        let deserialized: ElementSelector = serde_json::from_str(&json).unwrap();
        assert_eq!(selector, deserialized);
    }
}
