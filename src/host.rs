//! The tree the engine explores
//!
//! The exploration engine never owns the document. It reads structure through
//! [`HostTree`] and toggles a handful of state flags (open, hidden, checked,
//! value, size). [`DomTree`](crate::dom::DomTree) is the in-memory host used by
//! the CLI and the tests; other hosts only need to implement this trait.

use crate::dom::{EventKind, MutationReceiver, NodeId};
use indexmap::IndexMap;
use url::Url;

pub trait HostTree {
    /// Document node, `None` if the tree cannot be read
    fn root(&self) -> Option<NodeId>;

    /// Document URL; its origin is the host origin
    fn base_url(&self) -> &Url;

    /// Parent in the same tree scope (`None` for the document and shadow roots)
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Host element of a shadow root
    fn shadow_host(&self, node: NodeId) -> Option<NodeId>;

    /// Ordered child list (elements and text)
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Encapsulated subtree exposed by an element
    fn shadow_root(&self, node: NodeId) -> Option<NodeId>;

    /// Lowercase tag name, `None` for non-element nodes
    fn tag_name(&self, node: NodeId) -> Option<&str>;

    /// Content of a text node
    fn text(&self, node: NodeId) -> Option<&str>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str>;

    fn attributes(&self, node: NodeId) -> IndexMap<String, String>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);

    fn remove_attribute(&mut self, node: NodeId, name: &str);

    /// Whether the node is still reachable from the document
    fn is_connected(&self, node: NodeId) -> bool;

    /// Rendered text of the subtree, whitespace-collapsed
    fn inner_text(&self, node: NodeId) -> String;

    /// Label elements associated with a control, in tree order
    fn labels(&self, node: NodeId) -> Vec<NodeId>;

    /// Number of `option` descendants of a choice list
    fn option_count(&self, node: NodeId) -> usize;

    fn is_checked(&self, node: NodeId) -> bool;

    fn set_checked(&mut self, node: NodeId, checked: bool);

    fn value(&self, node: NodeId) -> Option<&str>;

    fn set_value(&mut self, node: NodeId, value: &str);

    fn focus(&mut self, node: NodeId);

    /// Dispatch a bubbling synthetic event
    fn dispatch_event(&mut self, node: NodeId, kind: EventKind);

    /// Dispatch a click and run the element's default activation behavior
    fn click(&mut self, node: NodeId);

    /// Subscribe to mutations; dropping or closing the receiver unsubscribes
    fn observe(&mut self) -> MutationReceiver;

    /// The tree as a trait object, for collaborators that take `&dyn HostTree`
    fn as_host(&self) -> &dyn HostTree;

    fn is_element(&self, node: NodeId) -> bool {
        self.tag_name(node).is_some()
    }

    fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    /// Element children only
    fn element_children(&self, node: NodeId) -> Vec<NodeId> {
        self.children(node)
            .into_iter()
            .filter(|&child| self.is_element(child))
            .collect()
    }
}
