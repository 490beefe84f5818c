//! Whole-tree serialization used by combo mode

use crate::dom::NodeId;
use crate::host::HostTree;
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::Serialize;

/// Serialized form of a node and its subtree
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum TreeSnapshot {
    Element {
        tag: String,
        attributes: IndexMap<String, String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        children: Vec<TreeSnapshot>,
        #[serde(rename = "shadowRoot", skip_serializing_if = "Option::is_none")]
        shadow_root: Option<Vec<TreeSnapshot>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        checked: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    Text {
        text: String,
    },
}

impl TreeSnapshot {
    /// Number of element nodes in the snapshot, shadow content included
    pub fn count_elements(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(snapshot) = pending.pop() {
            if let TreeSnapshot::Element {
                children, shadow_root, ..
            } = snapshot
            {
                count += 1;
                pending.extend(children);
                pending.extend(shadow_root.iter().flatten());
            }
        }
        count
    }

    /// Convert the snapshot to JSON
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// Deep trees would otherwise be dropped one stack frame per level
impl Drop for TreeSnapshot {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        take_subtrees(self, &mut pending);
        while let Some(mut snapshot) = pending.pop() {
            take_subtrees(&mut snapshot, &mut pending);
        }
    }
}

fn take_subtrees(snapshot: &mut TreeSnapshot, into: &mut Vec<TreeSnapshot>) {
    if let TreeSnapshot::Element {
        children, shadow_root, ..
    } = snapshot
    {
        into.append(children);
        if let Some(shadow) = shadow_root {
            into.append(shadow);
        }
    }
}

/// Converts a tree into a snapshot. Richer serializers (style, canvas or
/// form-state capture) can replace the structural default.
pub trait TreeSerializer {
    fn capture(&self, tree: &dyn HostTree, root: NodeId) -> TreeSnapshot;
}

/// Plain tag/attributes/children serialization with live form state
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralSerializer;

/// Node whose children are still being captured
struct Frame {
    node: NodeId,
    /// Remaining children, last one first
    pending: Vec<NodeId>,
    children: Vec<TreeSnapshot>,
    /// Shadow root still to be captured once the light children are done
    shadow: Option<NodeId>,
    shadow_children: Option<Vec<TreeSnapshot>>,
    is_shadow_root: bool,
}

impl Frame {
    fn open(tree: &dyn HostTree, node: NodeId, is_shadow_root: bool) -> Self {
        let mut pending = tree.children(node);
        pending.reverse();
        Self {
            node,
            pending,
            children: Vec::new(),
            shadow: if is_shadow_root { None } else { tree.shadow_root(node) },
            shadow_children: None,
            is_shadow_root,
        }
    }
}

impl StructuralSerializer {
    fn text(tree: &dyn HostTree, node: NodeId) -> Option<Option<TreeSnapshot>> {
        let text = tree.text(node)?.trim();
        Some((!text.is_empty()).then(|| TreeSnapshot::Text {
            text: text.to_string(),
        }))
    }

    fn element(
        tree: &dyn HostTree,
        node: NodeId,
        children: Vec<TreeSnapshot>,
        shadow_root: Option<Vec<TreeSnapshot>>,
    ) -> TreeSnapshot {
        let tag = tree.tag_name(node).unwrap_or("#document").to_string();
        let input_type = tree.attribute(node, "type").unwrap_or_default().to_ascii_lowercase();
        let checked = (tag == "input" && matches!(input_type.as_str(), "checkbox" | "radio"))
            .then(|| tree.is_checked(node));
        let value = tree
            .value(node)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        TreeSnapshot::Element {
            tag,
            attributes: tree.attributes(node),
            children,
            shadow_root,
            checked,
            value,
        }
    }
}

impl TreeSerializer for StructuralSerializer {
    /// Post-order walk on an explicit stack: a node is built once all of its
    /// children (and then its shadow content) have been.
    fn capture(&self, tree: &dyn HostTree, root: NodeId) -> TreeSnapshot {
        if let Some(text) = Self::text(tree, root) {
            return text.unwrap_or(TreeSnapshot::Text {
                text: String::new(),
            });
        }

        let mut stack = vec![Frame::open(tree, root, false)];
        while let Some(frame) = stack.last_mut() {
            if let Some(child) = frame.pending.pop() {
                match Self::text(tree, child) {
                    Some(text) => frame.children.extend(text),
                    None => stack.push(Frame::open(tree, child, false)),
                }
                continue;
            }
            if let Some(shadow) = frame.shadow.take() {
                stack.push(Frame::open(tree, shadow, true));
                continue;
            }

            let Some(done) = stack.pop() else { break };
            let parent = stack.last_mut();
            if done.is_shadow_root {
                if let Some(host) = parent {
                    host.shadow_children = Some(done.children);
                }
                continue;
            }
            let snapshot = Self::element(tree, done.node, done.children, done.shadow_children);
            match parent {
                Some(parent) => parent.children.push(snapshot),
                None => return snapshot,
            }
        }

        TreeSnapshot::Text {
            text: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DomTree;
    use serde_json::json;

    #[test]
    fn test_structural_capture() {
        let mut tree = DomTree::parse_html(
            r#"<body><input id="c" type="checkbox"><p class="x">Hi <b>there</b></p>
               <x-host><template shadowrootmode="open"><span>in</span></template></x-host></body>"#,
            "https://example.com/",
        )
        .unwrap();
        let checkbox = tree.find_by_id("c").unwrap();
        tree.set_checked(checkbox, true);

        let body = tree.body().unwrap();
        let snapshot = StructuralSerializer.capture(&tree, body);
        let value = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(value["tag"], "body");
        assert_eq!(
            value["children"][0],
            json!({"tag": "input", "attributes": {"id": "c", "type": "checkbox"}, "checked": true})
        );
        assert_eq!(value["children"][1]["children"][0], json!({"text": "Hi"}));
        assert_eq!(value["children"][2]["shadowRoot"][0]["tag"], "span");
        assert_eq!(snapshot.count_elements(), 6);
    }

    #[test]
    fn test_deeply_nested_capture() {
        let depth = 20_000;
        let mut tree = DomTree::new("https://example.com/").unwrap();
        let mut parent = tree.document();
        for _ in 0..depth {
            let div = tree.create_element("div");
            tree.append_child(parent, div).unwrap();
            parent = div;
        }
        let leaf = tree.create_text("bottom");
        tree.append_child(parent, leaf).unwrap();

        let snapshot = StructuralSerializer.capture(&tree, tree.document());

        assert_eq!(snapshot.count_elements(), depth + 1);
        let mut current = &snapshot;
        for _ in 0..=depth {
            match current {
                TreeSnapshot::Element { children, .. } => current = &children[0],
                TreeSnapshot::Text { .. } => panic!("expected element"),
            }
        }
        assert_eq!(current, &TreeSnapshot::Text { text: "bottom".to_string() });
    }

    #[test]
    fn test_document_root_capture() {
        let tree = DomTree::parse_html("<p>x</p>", "https://example.com/").unwrap();
        let snapshot = StructuralSerializer.capture(&tree, tree.document());

        match &snapshot {
            TreeSnapshot::Element { tag, children, .. } => {
                assert_eq!(tag, "#document");
                assert_eq!(children.len(), 1);
            }
            TreeSnapshot::Text { .. } => panic!("expected element"),
        }
        assert!(snapshot.to_json().unwrap().contains("\"#document\""));
    }
}
