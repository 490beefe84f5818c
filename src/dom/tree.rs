use crate::dom::element::ElementData;
use crate::dom::events::{DomEvent, EventKind, Listener, MutationReceiver, MutationRecord, MutationSender};
use crate::error::{Result, XrayError};
use crate::host::HostTree;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tokio::sync::mpsc;
use url::Url;

/// Stable handle to a node. Handles are never reused within one tree, so
/// two structurally identical nodes always have distinct identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
enum NodeKind {
    Document,
    ShadowRoot { host: NodeId },
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// In-memory mutable document.
///
/// Nodes live in an arena and are never freed; removing a node only detaches
/// it. Listeners registered with [`DomTree::add_event_listener`] play the role
/// of the page's own scripts and may mutate the tree while an event is
/// dispatched. Mutations of connected nodes are broadcast to every observer.
pub struct DomTree {
    nodes: Vec<Node>,
    root: NodeId,
    url: Url,
    focused: Option<NodeId>,
    listeners: HashMap<(NodeId, EventKind), Vec<Listener>>,
    observers: Vec<MutationSender>,
    event_log: Vec<(NodeId, EventKind)>,
    navigations: Vec<Url>,
}

impl DomTree {
    /// Create an empty document at the given URL
    pub fn new(url: &str) -> Result<Self> {
        Ok(Self::with_url(Url::parse(url)?))
    }

    pub fn with_url(url: Url) -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Document,
            }],
            root: NodeId(0),
            url,
            focused: None,
            listeners: HashMap::new(),
            observers: Vec::new(),
            event_log: Vec::new(),
            navigations: Vec::new(),
        }
    }

    /// The document node
    pub fn document(&self) -> NodeId {
        self.root
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            kind,
        });
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag_name: &str) -> NodeId {
        self.create_element_with(ElementData::new(tag_name))
    }

    pub fn create_element_with(&mut self, element: ElementData) -> NodeId {
        self.push_node(NodeKind::Element(element))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push_node(NodeKind::Text(text.into()))
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    fn is_valid(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.node(id)?.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes.get_mut(id.0)?.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Parent, crossing from a shadow root to its host
    fn composed_parent(&self, id: NodeId) -> Option<NodeId> {
        let node = self.node(id)?;
        match node.kind {
            NodeKind::ShadowRoot { host } => Some(host),
            _ => node.parent,
        }
    }

    /// Whether `ancestor` is `node` or one of its composed ancestors
    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.composed_parent(current);
        }
        false
    }

    /// Append `child` to `parent`, detaching it from its previous parent first
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if !self.is_valid(parent) {
            return Err(XrayError::InvalidNode(parent));
        }
        if !self.is_valid(child) {
            return Err(XrayError::InvalidNode(child));
        }
        if matches!(self.nodes[parent.0].kind, NodeKind::Text(_)) {
            return Err(XrayError::TreeOperation(format!("{parent} cannot have children")));
        }
        if matches!(
            self.nodes[child.0].kind,
            NodeKind::Document | NodeKind::ShadowRoot { .. }
        ) {
            return Err(XrayError::TreeOperation(format!("{child} cannot be appended")));
        }

        // A node without descendants can only be its own ancestor
        let is_leaf = self.nodes[child.0].children.is_empty()
            && self.element(child).is_none_or(|e| e.shadow_root.is_none());
        let creates_cycle = if is_leaf {
            parent == child
        } else {
            self.is_inclusive_ancestor(child, parent)
        };
        if creates_cycle {
            return Err(XrayError::TreeOperation(format!(
                "appending {child} to {parent} would create a cycle"
            )));
        }

        if self.nodes[child.0].parent.is_some() {
            self.remove(child)?;
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        self.notify(MutationRecord::ChildList {
            target: parent,
            added: vec![child],
            removed: Vec::new(),
        });
        Ok(())
    }

    /// Detach a node from its parent. The node and its subtree stay readable.
    pub fn remove(&mut self, child: NodeId) -> Result<()> {
        let parent = self
            .node(child)
            .ok_or(XrayError::InvalidNode(child))?
            .parent
            .ok_or_else(|| XrayError::TreeOperation(format!("{child} has no parent")))?;
        self.nodes[parent.0].children.retain(|&id| id != child);
        self.nodes[child.0].parent = None;
        if self.focused.is_some_and(|f| !self.is_connected(f)) {
            self.focused = None;
        }
        self.notify(MutationRecord::ChildList {
            target: parent,
            added: Vec::new(),
            removed: vec![child],
        });
        Ok(())
    }

    /// Attach an encapsulated subtree to an element
    pub fn attach_shadow(&mut self, host: NodeId) -> Result<NodeId> {
        match self.element(host) {
            None => return Err(XrayError::InvalidNode(host)),
            Some(element) if element.shadow_root.is_some() => {
                return Err(XrayError::TreeOperation(format!("{host} already hosts a shadow root")));
            }
            Some(_) => {}
        }
        let shadow = self.push_node(NodeKind::ShadowRoot { host });
        if let Some(element) = self.element_mut(host) {
            element.shadow_root = Some(shadow);
        }
        Ok(shadow)
    }

    /// Nodes of one tree scope in document order, not entering shadow roots
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = match self.node(scope) {
            Some(node) => node.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        out
    }

    /// All nodes reachable from `scope`, including nested shadow trees
    fn composed_descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![scope];
        while let Some(id) = stack.pop() {
            if id != scope {
                out.push(id);
            }
            let node = &self.nodes[id.0];
            stack.extend(node.children.iter().rev().copied());
            if let NodeKind::Element(ElementData { shadow_root: Some(shadow), .. }) = &node.kind {
                stack.push(*shadow);
            }
        }
        out
    }

    /// First connected element with the given id, searching shadow trees too
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.composed_descendants(self.root)
            .into_iter()
            .find(|&n| self.element(n).and_then(ElementData::id) == Some(id))
    }

    /// Connected elements with the given tag, searching shadow trees too
    pub fn find_all_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.composed_descendants(self.root)
            .into_iter()
            .filter(|&n| self.element(n).is_some_and(|e| e.is_tag(tag)))
            .collect()
    }

    pub fn body(&self) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&n| self.element(n).is_some_and(|e| e.is_tag("body")))
    }

    /// Document or shadow root the node belongs to (or the top of a detached subtree)
    fn tree_scope_root(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.nodes[current.0].parent {
            current = parent;
        }
        current
    }

    /// Register a listener that runs when `kind` reaches `node`
    pub fn add_event_listener<F>(&mut self, node: NodeId, kind: EventKind, listener: F)
    where
        F: Fn(&mut DomTree, &DomEvent) + 'static,
    {
        self.listeners
            .entry((node, kind))
            .or_default()
            .push(Rc::new(listener));
    }

    /// Every event dispatched so far, in order
    pub fn events(&self) -> &[(NodeId, EventKind)] {
        &self.event_log
    }

    /// How many times `kind` was dispatched at `node`
    pub fn event_count(&self, node: NodeId, kind: EventKind) -> usize {
        self.event_log
            .iter()
            .filter(|&&(n, k)| n == node && k == kind)
            .count()
    }

    /// Link activations that would have navigated, in order
    pub fn navigations(&self) -> &[Url] {
        &self.navigations
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    fn notify(&mut self, record: MutationRecord) {
        let target = match &record {
            MutationRecord::ChildList { target, .. } | MutationRecord::Attribute { target, .. } => *target,
        };
        if self.observers.is_empty() || !self.is_connected(target) {
            return;
        }
        self.observers.retain(|tx| tx.send(record.clone()).is_ok());
    }

    fn dispatch(&mut self, target: NodeId, kind: EventKind, bubbles: bool) {
        if !self.is_valid(target) {
            return;
        }
        self.event_log.push((target, kind));

        // Synthetic events are not composed: propagation stops at the shadow root.
        let mut path = vec![target];
        if bubbles {
            let mut cursor = self.nodes[target.0].parent;
            while let Some(node) = cursor {
                path.push(node);
                cursor = self.nodes[node.0].parent;
            }
        }

        let pending: Vec<(NodeId, Listener)> = path
            .iter()
            .flat_map(|&node| {
                self.listeners
                    .get(&(node, kind))
                    .into_iter()
                    .flatten()
                    .map(move |listener| (node, Rc::clone(listener)))
            })
            .collect();

        for (current_target, listener) in pending {
            let event = DomEvent {
                kind,
                target,
                current_target,
                bubbles,
            };
            listener(self, &event);
        }
    }

    fn follow_link(&mut self, anchor: NodeId) {
        let Some(href) = self
            .element(anchor)
            .and_then(|e| e.get_attribute("href"))
            .map(str::to_string)
        else {
            return;
        };
        match self.url.join(&href) {
            Ok(target) => {
                let mut current = self.url.clone();
                current.set_fragment(None);
                let mut destination = target.clone();
                destination.set_fragment(None);
                if current == destination {
                    self.url = target.clone();
                }
                log::trace!("navigation to {} recorded", target);
                self.navigations.push(target);
            }
            Err(e) => log::debug!("link {} has unresolvable href {:?}: {}", anchor, href, e),
        }
    }
}

impl HostTree for DomTree {
    fn root(&self) -> Option<NodeId> {
        Some(self.root)
    }

    fn base_url(&self) -> &Url {
        &self.url
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?.parent
    }

    fn shadow_host(&self, node: NodeId) -> Option<NodeId> {
        match self.node(node)?.kind {
            NodeKind::ShadowRoot { host } => Some(host),
            _ => None,
        }
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node).map(|n| n.children.clone()).unwrap_or_default()
    }

    fn shadow_root(&self, node: NodeId) -> Option<NodeId> {
        self.element(node)?.shadow_root
    }

    fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|e| e.tag_name.as_str())
    }

    fn text(&self, node: NodeId) -> Option<&str> {
        match &self.node(node)?.kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?.get_attribute(&name.to_ascii_lowercase())
    }

    fn attributes(&self, node: NodeId) -> IndexMap<String, String> {
        self.element(node).map(|e| e.attributes.clone()).unwrap_or_default()
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let Some(element) = self.element_mut(node) else {
            return;
        };
        element.set_attribute(name, value);
        self.notify(MutationRecord::Attribute {
            target: node,
            name: name.to_ascii_lowercase(),
        });
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) {
        let removed = self
            .element_mut(node)
            .and_then(|e| e.remove_attribute(name))
            .is_some();
        if removed {
            self.notify(MutationRecord::Attribute {
                target: node,
                name: name.to_ascii_lowercase(),
            });
        }
    }

    fn is_connected(&self, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == self.root {
                return true;
            }
            cursor = self.composed_parent(id);
        }
        false
    }

    fn inner_text(&self, node: NodeId) -> String {
        let mut words = Vec::new();
        for id in self.descendants(node) {
            if let NodeKind::Text(text) = &self.nodes[id.0].kind {
                words.extend(text.split_whitespace());
            }
        }
        words.join(" ")
    }

    /// One pass over the tree scope. A `for` label matches when its target id
    /// resolves to `node`, i.e. `node` is the first element carrying that id.
    /// A wrapping label must be an ancestor whose first labelable descendant is `node`.
    fn labels(&self, node: NodeId) -> Vec<NodeId> {
        let Some(own_id) = self.element(node).filter(|e| e.is_labelable()).map(ElementData::id) else {
            return Vec::new();
        };

        let mut first_with_own_id = None;
        let mut candidates = Vec::new();
        for candidate in self.descendants(self.tree_scope_root(node)) {
            let Some(element) = self.element(candidate) else {
                continue;
            };
            if first_with_own_id.is_none() && own_id.is_some() && element.id() == own_id {
                first_with_own_id = Some(candidate);
            }
            if !element.is_tag("label") {
                continue;
            }
            match element.get_attribute("for") {
                Some(target_id) if Some(target_id) == own_id => candidates.push((candidate, true)),
                Some(_) => {}
                None if self.is_inclusive_ancestor(candidate, node) => candidates.push((candidate, false)),
                None => {}
            }
        }

        candidates
            .into_iter()
            .filter(|&(label, by_id)| {
                if by_id {
                    first_with_own_id == Some(node)
                } else {
                    self.descendants(label)
                        .into_iter()
                        .find(|&n| self.element(n).is_some_and(ElementData::is_labelable))
                        == Some(node)
                }
            })
            .map(|(label, _)| label)
            .collect()
    }

    fn option_count(&self, node: NodeId) -> usize {
        self.descendants(node)
            .into_iter()
            .filter(|&n| self.element(n).is_some_and(|e| e.is_tag("option")))
            .count()
    }

    fn is_checked(&self, node: NodeId) -> bool {
        self.element(node).is_some_and(|e| e.checked)
    }

    fn set_checked(&mut self, node: NodeId, checked: bool) {
        if let Some(element) = self.element_mut(node) {
            element.checked = checked;
        }
    }

    fn value(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|e| e.value.as_str())
    }

    fn set_value(&mut self, node: NodeId, value: &str) {
        if let Some(element) = self.element_mut(node) {
            element.value = value.to_string();
        }
    }

    fn focus(&mut self, node: NodeId) {
        if self.element(node).is_some() && self.is_connected(node) {
            self.focused = Some(node);
            self.dispatch(node, EventKind::Focus, false);
        }
    }

    fn dispatch_event(&mut self, node: NodeId, kind: EventKind) {
        self.dispatch(node, kind, true);
    }

    /// Anchors carry activation behavior: the resolved target is recorded as a
    /// navigation and hash-only targets update the document URL.
    fn click(&mut self, node: NodeId) {
        self.dispatch(node, EventKind::Click, true);
        if self.element(node).is_some_and(|e| e.is_tag("a")) {
            self.follow_link(node);
        }
    }

    fn observe(&mut self) -> MutationReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.observers.push(tx);
        rx
    }

    fn as_host(&self) -> &dyn HostTree {
        self
    }
}
