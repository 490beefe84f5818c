pub mod action;
pub mod classify;
pub mod combo;
pub mod config;
pub mod engine;
pub mod registry;
pub mod reveal;
pub mod scanner;
pub mod watcher;

pub use action::{Action, ActionDispatcher, ActionKind};
pub use classify::TriggerRules;
pub use combo::{ComboAdvisory, ComboEnumerator, ComboOutcome, ComboReport, ComboRun};
pub use config::ExploreOptions;
pub use engine::{ExplorationLoop, ExplorationReport, Explorer, LoopState};
pub use registry::{DedupRegistry, Frontier, RunContext};
pub use scanner::{ControlRecord, ScanSummary, TreeScanner};
pub use watcher::MutationWatcher;
