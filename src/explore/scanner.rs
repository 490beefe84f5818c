use crate::dom::NodeId;
use crate::explore::classify::{TriggerRules, is_control};
use crate::explore::registry::RunContext;
use crate::host::HostTree;
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Serialized description of a control, captured once per node per run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ControlRecord {
    /// Lowercase tag name
    pub kind: String,

    /// Text of the associated label element, else the `aria-label` attribute
    pub label: Option<String>,

    /// Own text, only for buttons, choice lists and disclosure summaries
    pub visible_text: Option<String>,

    pub required: bool,

    pub attributes: IndexMap<String, String>,
}

impl ControlRecord {
    pub fn capture<T: HostTree + ?Sized>(tree: &T, node: NodeId) -> Self {
        let kind = tree.tag_name(node).unwrap_or_default().to_string();

        let label = match tree.labels(node).first() {
            Some(&label) => Some(tree.inner_text(label).trim().to_string()),
            None => tree
                .attribute(node, "aria-label")
                .filter(|aria| !aria.is_empty())
                .map(|aria| aria.trim().to_string()),
        };

        let visible_text = match kind.as_str() {
            "button" | "select" | "summary" => {
                Some(tree.inner_text(node)).filter(|text| !text.is_empty())
            }
            _ => None,
        };

        Self {
            kind,
            label,
            visible_text,
            required: tree.has_attribute(node, "required"),
            attributes: tree.attributes(node),
        }
    }
}

/// What one scan added to the run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub controls: usize,
    pub triggers: usize,
}

/// Walks a subtree, and every shadow tree nested in it, recording controls
/// and queueing triggers.
#[derive(Debug, Clone, Copy)]
pub struct TreeScanner {
    rules: TriggerRules,
}

impl TreeScanner {
    pub fn new(rules: TriggerRules) -> Self {
        Self { rules }
    }

    /// Classify every rendered node under `start` (itself included).
    /// Only the run context is mutated.
    pub fn scan<T: HostTree + ?Sized>(&self, tree: &T, start: NodeId, ctx: &mut RunContext) -> ScanSummary {
        let mut summary = ScanSummary::default();
        if !is_rendered(tree, start) {
            return summary;
        }
        walk_rendered(tree, start, |node| {
            if is_control(tree, node) && ctx.registry.mark_visited(node) {
                ctx.records.push(ControlRecord::capture(tree, node));
                summary.controls += 1;
            }
            if self.rules.matches(tree, node) && ctx.enqueue(node) {
                summary.triggers += 1;
            }
        });
        summary
    }

    /// Triggers under `start` in discovery order, without touching any run state
    pub fn collect_triggers<T: HostTree + ?Sized>(&self, tree: &T, start: NodeId) -> Vec<NodeId> {
        let mut triggers = Vec::new();
        walk_rendered(tree, start, |node| {
            if self.rules.matches(tree, node) {
                triggers.push(node);
            }
        });
        triggers
    }
}

fn is_closed_disclosure<T: HostTree + ?Sized>(tree: &T, node: NodeId) -> bool {
    tree.tag_name(node) == Some("details") && !tree.has_attribute(node, "open")
}

/// Children that are rendered: a closed disclosure only shows its summary
fn rendered_children<T: HostTree + ?Sized>(tree: &T, node: NodeId) -> Vec<NodeId> {
    if is_closed_disclosure(tree, node) {
        tree.element_children(node)
            .into_iter()
            .find(|&child| tree.tag_name(child) == Some("summary"))
            .into_iter()
            .collect()
    } else {
        tree.children(node)
    }
}

/// Whether no ancestor (across shadow boundaries) hides `node`
pub fn is_rendered<T: HostTree + ?Sized>(tree: &T, node: NodeId) -> bool {
    let mut current = node;
    loop {
        if tree.has_attribute(current, "hidden") {
            return false;
        }
        let parent = match tree.parent(current) {
            Some(parent) => parent,
            None => match tree.shadow_host(current) {
                Some(host) => host,
                None => return true,
            },
        };
        if is_closed_disclosure(tree, parent) && !rendered_children(tree, parent).contains(&current) {
            return false;
        }
        current = parent;
    }
}

/// Pre-order walk over rendered elements. Nested shadow roots are queued on
/// the same worklist instead of being recursed into.
fn walk_rendered<T: HostTree + ?Sized>(tree: &T, start: NodeId, mut visit: impl FnMut(NodeId)) {
    let mut roots = VecDeque::from([start]);
    while let Some(root) = roots.pop_front() {
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if tree.is_element(node) {
                if tree.has_attribute(node, "hidden") {
                    continue;
                }
                visit(node);
                if let Some(shadow) = tree.shadow_root(node) {
                    roots.push_back(shadow);
                }
            }
            stack.extend(rendered_children(tree, node).into_iter().rev());
        }
    }
}
