//! Main-mode exploration: scan, activate triggers one at a time, and scan
//! whatever each activation reveals until nothing is left or the budget is spent.

use crate::dom::NodeId;
use crate::error::{Result, XrayError};
use crate::explore::action::{Action, ActionDispatcher};
use crate::explore::classify::TriggerRules;
use crate::explore::config::ExploreOptions;
use crate::explore::registry::RunContext;
use crate::explore::reveal::reveal_all;
use crate::explore::scanner::{ControlRecord, TreeScanner};
use crate::explore::watcher::MutationWatcher;
use crate::export::Exporter;
use crate::host::HostTree;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Done,
}

/// Result of one main-mode run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplorationReport {
    /// Control records in discovery order, at most one per node
    pub records: Vec<ControlRecord>,

    /// Frontier pops, discarded ones included
    pub iterations: usize,

    /// Triggers handed to the dispatcher
    pub activations: usize,

    /// Pops skipped because the trigger was detached or already activated
    pub discarded: usize,

    /// Triggers still queued when the loop stopped
    pub frontier_remaining: usize,

    /// Links left alone because they point to another origin
    pub navigations_refused: usize,
}

impl ExplorationReport {
    /// Whether the frontier drained before the iteration cap was reached.
    /// A non-exhaustive run is incomplete coverage, not a failure.
    pub fn is_exhaustive(&self) -> bool {
        self.frontier_remaining == 0
    }

    /// The main-mode artifact: the records array
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.records)?)
    }
}

/// The frontier-draining state machine. Owns the per-run context; the tree is
/// borrowed per call so the host can be inspected between steps.
pub struct ExplorationLoop {
    ctx: RunContext,
    watcher: MutationWatcher,
    dispatcher: ActionDispatcher,
    max_iterations: usize,
    state: LoopState,
    iterations: usize,
    activations: usize,
    discarded: usize,
    navigations_refused: usize,
}

impl ExplorationLoop {
    /// Run the initial scan and start watching for mutations.
    /// Fails only when the tree has no readable root.
    pub fn seed<T: HostTree + ?Sized>(tree: &mut T, options: &ExploreOptions) -> Result<Self> {
        let root = tree.root().ok_or(XrayError::RootUnavailable)?;

        if options.reveal_hidden {
            reveal_all(tree, root);
        }

        let scanner = TreeScanner::new(TriggerRules::Main);
        let mut ctx = RunContext::new();
        let seeded = scanner.scan(&*tree, root, &mut ctx);
        log::debug!(
            "initial scan: {} controls, {} triggers",
            seeded.controls,
            seeded.triggers
        );

        let watcher = MutationWatcher::connect(tree, scanner);

        Ok(Self {
            ctx,
            watcher,
            dispatcher: ActionDispatcher::new(options.settle_delay()),
            max_iterations: options.max_iterations,
            state: LoopState::Running,
            iterations: 0,
            activations: 0,
            discarded: 0,
            navigations_refused: 0,
        })
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    /// Pop and handle one trigger. Mutations delivered since the previous
    /// step are scanned first.
    pub async fn step<T: HostTree + ?Sized>(&mut self, tree: &mut T) -> LoopState {
        if self.state == LoopState::Done {
            return LoopState::Done;
        }

        self.watcher.pump(&*tree, &mut self.ctx);

        if self.iterations >= self.max_iterations {
            self.state = LoopState::Done;
            return self.state;
        }
        let Some(trigger) = self.ctx.frontier.pop() else {
            self.state = LoopState::Done;
            return self.state;
        };
        self.iterations += 1;

        if !self.accept(&*tree, trigger) {
            self.discarded += 1;
            return self.state;
        }

        self.activations += 1;
        if let Action::Refuse { .. } = self.dispatcher.activate(tree, trigger).await {
            self.navigations_refused += 1;
        }
        self.state
    }

    fn accept<T: HostTree + ?Sized>(&mut self, tree: &T, trigger: NodeId) -> bool {
        if !tree.is_connected(trigger) {
            log::debug!("skipping detached trigger {}", trigger);
            return false;
        }
        if !self.ctx.registry.mark_activated(trigger) {
            log::debug!("skipping already activated trigger {}", trigger);
            return false;
        }
        true
    }

    /// Drive the loop until it reaches `Done`
    pub async fn run_to_completion<T: HostTree + ?Sized>(&mut self, tree: &mut T) {
        while self.step(tree).await == LoopState::Running {}
    }

    /// Stop watching, drain the last delivered mutations and build the report
    pub fn finish<T: HostTree + ?Sized>(mut self, tree: &T) -> ExplorationReport {
        self.watcher.disconnect(tree, &mut self.ctx);

        let report = ExplorationReport {
            records: self.ctx.records,
            iterations: self.iterations,
            activations: self.activations,
            discarded: self.discarded,
            frontier_remaining: self.ctx.frontier.len(),
            navigations_refused: self.navigations_refused,
        };

        if report.is_exhaustive() {
            log::info!(
                "exploration finished: {} controls, {} activations in {} iterations",
                report.records.len(),
                report.activations,
                report.iterations
            );
        } else {
            log::warn!(
                "iteration cap of {} reached with {} triggers still queued",
                self.max_iterations,
                report.frontier_remaining
            );
        }
        report
    }
}

/// Entry point for main mode
pub struct Explorer {
    options: ExploreOptions,
    exporter: Option<Arc<dyn Exporter>>,
}

impl Explorer {
    pub fn new(options: ExploreOptions) -> Self {
        Self {
            options,
            exporter: None,
        }
    }

    /// Persistence target used when `persist` is set
    pub fn with_exporter(mut self, exporter: Arc<dyn Exporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    pub fn options(&self) -> &ExploreOptions {
        &self.options
    }

    pub async fn run<T: HostTree + ?Sized>(&self, tree: &mut T) -> Result<ExplorationReport> {
        let mut exploration = ExplorationLoop::seed(tree, &self.options)?;
        exploration.run_to_completion(tree).await;
        let report = exploration.finish(&*tree);

        if self.options.persist {
            match &self.exporter {
                Some(exporter) => {
                    exporter
                        .export(&report.to_json()?, &self.options.output_name)
                        .await?
                }
                None => log::debug!("persist requested but no exporter configured"),
            }
        }
        Ok(report)
    }
}
