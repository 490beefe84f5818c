//! In-memory document model
//!
//! This module provides the reference [`HostTree`](crate::host::HostTree)
//! implementation. It includes:
//! - DomTree: arena-backed mutable document with shadow roots, listeners and observers
//! - ElementData: tag, attributes and live form state of an element
//! - ElementSelector / SelectorMap: stable textual descriptors for elements
//! - events: synthetic events and mutation records

pub mod element;
pub mod events;
mod html;
pub mod selector;
pub mod tree;

pub use element::ElementData;
pub use events::{DomEvent, EventKind, Listener, MutationReceiver, MutationRecord};
pub use selector::{ElementSelector, SelectorMap};
pub use tree::{DomTree, NodeId};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostTree;

    #[test]
    fn test_element_data_export() {
        let element = ElementData::new("div");
        assert_eq!(element.tag_name, "div");
    }

    #[test]
    fn test_selector_map_export() {
        let map = SelectorMap::new();
        assert!(map.is_empty());
    }

    #[test]
    fn test_dom_tree_export() {
        let tree = DomTree::new("about:blank").unwrap();
        assert_eq!(tree.root(), Some(tree.document()));
    }
}
