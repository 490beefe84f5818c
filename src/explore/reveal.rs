use crate::dom::{EventKind, NodeId};
use crate::host::HostTree;

/// Every element under `root`, including nested shadow trees, in document order
fn all_elements<T: HostTree + ?Sized>(tree: &T, root: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if tree.is_element(node) {
            out.push(node);
        }
        if let Some(shadow) = tree.shadow_root(node) {
            stack.push(shadow);
        }
        stack.extend(tree.children(node).into_iter().rev());
    }
    out
}

/// Open every closed disclosure and unhide every hidden element.
/// Returns the number of elements changed.
pub fn reveal_all<T: HostTree + ?Sized>(tree: &mut T, root: NodeId) -> usize {
    let mut changed = 0;
    for node in all_elements(&*tree, root) {
        if tree.tag_name(node) == Some("details") && !tree.has_attribute(node, "open") {
            tree.set_attribute(node, "open", "");
            changed += 1;
        }
        if tree.has_attribute(node, "hidden") {
            tree.remove_attribute(node, "hidden");
            changed += 1;
        }
    }
    log::debug!("revealed {} elements", changed);
    changed
}

/// Best-effort return to the unactivated state: close disclosures, shrink
/// choice lists and click expanded widgets closed.
pub fn reset_to_baseline<T: HostTree + ?Sized>(tree: &mut T, root: NodeId) {
    for node in all_elements(&*tree, root) {
        let tag = tree.tag_name(node).map(str::to_string);
        match tag.as_deref() {
            Some("details") if tree.has_attribute(node, "open") => tree.remove_attribute(node, "open"),
            Some("select") if tree.has_attribute(node, "size") => tree.remove_attribute(node, "size"),
            _ => {}
        }
        if tree.attribute(node, "aria-expanded") == Some("true") {
            tree.dispatch_event(node, EventKind::Click);
        }
    }
}
