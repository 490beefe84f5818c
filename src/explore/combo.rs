//! Combo mode: replay every single trigger and every unordered pair of
//! triggers from a common baseline, snapshotting the whole tree each time.

use crate::dom::{NodeId, SelectorMap};
use crate::error::{Result, XrayError};
use crate::explore::action::ActionDispatcher;
use crate::explore::classify::TriggerRules;
use crate::explore::config::ExploreOptions;
use crate::explore::reveal::{reset_to_baseline, reveal_all};
use crate::explore::scanner::TreeScanner;
use crate::export::Exporter;
use crate::host::HostTree;
use crate::snapshot::{StructuralSerializer, TreeSerializer, TreeSnapshot};
use schemars::JsonSchema;
use serde::Serialize;
use std::sync::Arc;

/// All singles by index, then all pairs by ascending index pair
pub fn combinations(n: usize) -> Vec<Vec<usize>> {
    let singles = (0..n).map(|i| vec![i]);
    let pairs = (0..n).flat_map(|i| (i + 1..n).map(move |j| vec![i, j]));
    singles.chain(pairs).collect()
}

/// One replayed combination
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct ComboRun {
    /// Descriptors of the activated triggers
    pub combo: Vec<String>,
    pub tree: TreeSnapshot,
}

/// The combo-mode artifact
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct ComboReport {
    /// Revealed tree before any activation
    pub base: TreeSnapshot,
    pub runs: Vec<ComboRun>,
}

impl ComboReport {
    /// Baseline included
    pub fn result_count(&self) -> usize {
        1 + self.runs.len()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Raised when the combination count exceeds the configured threshold.
/// Informational; the run still completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComboAdvisory {
    pub combinations: usize,
    pub threshold: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComboOutcome {
    pub report: ComboReport,
    pub advisory: Option<ComboAdvisory>,
}

pub struct ComboEnumerator {
    options: ExploreOptions,
    serializer: Box<dyn TreeSerializer>,
    exporter: Option<Arc<dyn Exporter>>,
}

impl ComboEnumerator {
    pub fn new(options: ExploreOptions) -> Self {
        Self {
            options,
            serializer: Box::new(StructuralSerializer),
            exporter: None,
        }
    }

    /// Replace the structural serializer with a richer capture
    pub fn with_serializer(mut self, serializer: Box<dyn TreeSerializer>) -> Self {
        self.serializer = serializer;
        self
    }

    pub fn with_exporter(mut self, exporter: Arc<dyn Exporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    pub async fn run<T: HostTree + ?Sized>(&self, tree: &mut T) -> Result<ComboOutcome> {
        let root = tree.root().ok_or(XrayError::RootUnavailable)?;
        let scanner = TreeScanner::new(TriggerRules::Combo);
        let dispatcher = ActionDispatcher::new(self.options.settle_delay());

        reveal_all(tree, root);
        let discovered = scanner.collect_triggers(&*tree, root);
        let selectors = SelectorMap::from_nodes(&*tree, &discovered);

        let combos = combinations(discovered.len());
        log::info!(
            "combo mode: {} triggers, {} combinations",
            discovered.len(),
            combos.len()
        );
        for (position, selector) in selectors.selectors().enumerate() {
            log::debug!("trigger {}: {}", position, selector);
        }

        let advisory = (combos.len() > self.options.combo_warn_threshold).then(|| {
            log::warn!(
                "{} combinations exceed the threshold of {}",
                combos.len(),
                self.options.combo_warn_threshold
            );
            ComboAdvisory {
                combinations: combos.len(),
                threshold: self.options.combo_warn_threshold,
            }
        });

        self.restore(tree, root);
        let base = self.serializer.capture(tree.as_host(), root);

        let mut runs = Vec::with_capacity(combos.len());
        for combo in &combos {
            self.restore(tree, root);
            let triggers = scanner.collect_triggers(&*tree, root);
            for &position in combo {
                match triggers.get(position) {
                    Some(&trigger) => {
                        dispatcher.activate(tree, trigger).await;
                    }
                    None => log::debug!("trigger {} no longer present", position),
                }
            }
            let snapshot = self.serializer.capture(tree.as_host(), root);
            log::debug!("combo {:?}: {} elements", combo, snapshot.count_elements());
            runs.push(ComboRun {
                combo: selectors.descriptors(combo),
                tree: snapshot,
            });
        }

        let report = ComboReport { base, runs };

        if self.options.persist {
            match &self.exporter {
                Some(exporter) => {
                    exporter
                        .export(&report.to_json()?, &self.options.combo_output_name)
                        .await?
                }
                None => log::debug!("persist requested but no exporter configured"),
            }
        }

        Ok(ComboOutcome { report, advisory })
    }

    fn restore<T: HostTree + ?Sized>(&self, tree: &mut T, root: NodeId) {
        reset_to_baseline(tree, root);
        reveal_all(tree, root);
    }
}
