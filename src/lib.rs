//! # dom-xray
//!
//! Exhaustive exploration of a live document tree: find every interactive
//! node, activate each one safely, and record the controls that appear.
//!
//! ## Features
//!
//! - **Main mode**: breadth-first activation of triggers with mutation feedback,
//!   producing one record per form control
//! - **Combo mode**: replays every single trigger and every pair of triggers,
//!   snapshotting the whole tree after each
//! - **Safe activation**: per-kind heuristics, no cross-origin navigation
//! - **Host abstraction**: the engine runs against any [`HostTree`]; [`DomTree`]
//!   is the in-memory reference host
//!
//! ## Command line
//!
//! ```bash
//! # Record all controls of a page into ./dom.json
//! cargo run -- explore page.html
//!
//! # Replay trigger combinations and print the result
//! cargo run -- combos page.html --stdout --settle-ms 0
//! ```
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use dom_xray::{DomTree, ExploreOptions, Explorer};
//!
//! # async fn demo() -> dom_xray::Result<()> {
//! let mut tree = DomTree::parse_html(
//!     "<details><summary>More</summary><input aria-label=\"Name\"></details>",
//!     "https://example.com/",
//! )?;
//!
//! let report = Explorer::new(ExploreOptions::new().persist(false))
//!     .run(&mut tree)
//!     .await?;
//! println!("found {} controls", report.records.len());
//! # Ok(())
//! # }
//! ```
//!
//! ### Page scripts
//!
//! Listeners registered on a [`DomTree`] stand in for the page's own code and
//! may mutate the tree in response to synthesized events:
//!
//! ```rust,no_run
//! use dom_xray::{DomTree, EventKind};
//!
//! # fn demo() -> dom_xray::Result<()> {
//! let mut tree = DomTree::parse_html("<button id=\"more\">More</button>", "https://example.com/")?;
//! let button = tree.find_by_id("more").unwrap();
//! tree.add_event_listener(button, EventKind::Click, |tree, _event| {
//!     if let Some(body) = tree.body() {
//!         let field = tree.create_element("textarea");
//!         let _ = tree.append_child(body, field);
//!     }
//! });
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`host`]: the tree interface the engine programs against
//! - [`dom`]: in-memory document, events, mutation records and selectors
//! - [`explore`]: scanner, activation heuristics, main loop and combo mode
//! - [`snapshot`]: whole-tree serialization
//! - [`export`]: persistence targets for the output artifacts
//! - [`error`]: Error types and result aliases

pub mod dom;
pub mod error;
pub mod explore;
pub mod export;
pub mod host;
pub mod snapshot;

pub use dom::{DomTree, ElementSelector, EventKind, MutationRecord, NodeId, SelectorMap};
pub use error::{Result, XrayError};
pub use explore::{
    ComboAdvisory, ComboEnumerator, ComboOutcome, ComboReport, ControlRecord, ExplorationReport, ExploreOptions,
    Explorer,
};
pub use export::{Exporter, FileExporter, MemoryExporter, StdoutExporter};
pub use host::HostTree;
pub use snapshot::{StructuralSerializer, TreeSerializer, TreeSnapshot};
