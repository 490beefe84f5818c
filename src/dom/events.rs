//! Event and mutation notifications emitted by a tree

use crate::dom::{DomTree, NodeId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;
use tokio::sync::mpsc;

/// Synthetic event types the engine can dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    #[serde(rename = "mousedown")]
    PointerDown,
    Click,
    Change,
    Input,
    Focus,
}

impl EventKind {
    /// DOM event type name
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::PointerDown => "mousedown",
            EventKind::Click => "click",
            EventKind::Change => "change",
            EventKind::Input => "input",
            EventKind::Focus => "focus",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event as seen by a listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomEvent {
    pub kind: EventKind,
    /// Node the event was dispatched at
    pub target: NodeId,
    /// Node whose listener is currently running
    pub current_target: NodeId,
    pub bubbles: bool,
}

/// Host-page script reacting to an event. Listeners may mutate the tree.
pub type Listener = Rc<dyn Fn(&mut DomTree, &DomEvent)>;

/// Structural or attribute change under an observed tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRecord {
    ChildList {
        target: NodeId,
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
    Attribute {
        target: NodeId,
        name: String,
    },
}

pub type MutationSender = mpsc::UnboundedSender<MutationRecord>;
pub type MutationReceiver = mpsc::UnboundedReceiver<MutationRecord>;
