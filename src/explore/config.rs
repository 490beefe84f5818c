use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Options controlling an exploration run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ExploreOptions {
    /// Hard cap on frontier pops, discarded pops included (default: 1000)
    pub max_iterations: usize,

    /// Pause after every activation, in milliseconds (default: 200)
    pub settle_ms: u64,

    /// Hand the result to the exporter instead of only returning it (default: true)
    pub persist: bool,

    /// Combination count above which combo mode raises an advisory (default: 100)
    pub combo_warn_threshold: usize,

    /// Open collapsed disclosures and unhide content before scanning (default: true)
    pub reveal_hidden: bool,

    /// Suggested filename for main-mode output
    pub output_name: String,

    /// Suggested filename for combo-mode output
    pub combo_output_name: String,
}

impl Default for ExploreOptions {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            settle_ms: 200,
            persist: true,
            combo_warn_threshold: 100,
            reveal_hidden: true,
            output_name: "dom.json".to_string(),
            combo_output_name: "dom-combos.json".to_string(),
        }
    }
}

impl ExploreOptions {
    /// Create new options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the iteration cap
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Builder method: set the settle delay
    pub fn settle_ms(mut self, ms: u64) -> Self {
        self.settle_ms = ms;
        self
    }

    /// Builder method: persist output through the exporter
    pub fn persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    /// Builder method: set the combination advisory threshold
    pub fn combo_warn_threshold(mut self, threshold: usize) -> Self {
        self.combo_warn_threshold = threshold;
        self
    }

    /// Builder method: reveal hidden content before the initial scan
    pub fn reveal_hidden(mut self, reveal: bool) -> Self {
        self.reveal_hidden = reveal;
        self
    }

    /// Builder method: set the main-mode output filename
    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = name.into();
        self
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}
