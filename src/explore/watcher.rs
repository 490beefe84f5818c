use crate::dom::{MutationReceiver, MutationRecord};
use crate::explore::registry::RunContext;
use crate::explore::scanner::{ScanSummary, TreeScanner};
use crate::host::HostTree;

/// Attributes whose change can expose a previously unrendered subtree
const REVEALING_ATTRIBUTES: [&str; 2] = ["open", "hidden"];

/// Feeds content that appears while the run is in progress back into the
/// scanner. Records are drained between activations, so everything a step
/// attached is scanned before the next trigger is popped.
pub struct MutationWatcher {
    rx: MutationReceiver,
    scanner: TreeScanner,
}

impl MutationWatcher {
    /// Start observing `tree`
    pub fn connect<T: HostTree + ?Sized>(tree: &mut T, scanner: TreeScanner) -> Self {
        Self {
            rx: tree.observe(),
            scanner,
        }
    }

    /// Scan everything attached or revealed since the last call
    pub fn pump<T: HostTree + ?Sized>(&mut self, tree: &T, ctx: &mut RunContext) -> ScanSummary {
        let mut total = ScanSummary::default();
        while let Ok(record) = self.rx.try_recv() {
            let found = self.handle(tree, ctx, record);
            total.controls += found.controls;
            total.triggers += found.triggers;
        }
        if total != ScanSummary::default() {
            log::debug!(
                "mutations revealed {} controls and {} triggers",
                total.controls,
                total.triggers
            );
        }
        total
    }

    /// Stop observing. Records already delivered are still scanned.
    pub fn disconnect<T: HostTree + ?Sized>(mut self, tree: &T, ctx: &mut RunContext) -> ScanSummary {
        self.rx.close();
        self.pump(tree, ctx)
    }

    fn handle<T: HostTree + ?Sized>(&self, tree: &T, ctx: &mut RunContext, record: MutationRecord) -> ScanSummary {
        let mut summary = ScanSummary::default();
        let roots = match record {
            MutationRecord::ChildList { added, .. } => added,
            MutationRecord::Attribute { target, name } if REVEALING_ATTRIBUTES.contains(&name.as_str()) => {
                vec![target]
            }
            MutationRecord::Attribute { .. } => Vec::new(),
        };
        for node in roots {
            if !tree.is_element(node) || !tree.is_connected(node) {
                continue;
            }
            let found = self.scanner.scan(tree, node, ctx);
            summary.controls += found.controls;
            summary.triggers += found.triggers;
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{DomTree, ElementData};
    use crate::explore::classify::TriggerRules;

    fn setup() -> (DomTree, MutationWatcher, RunContext) {
        let mut tree = DomTree::parse_html(
            r#"<body><details id="d"><summary>s</summary><input id="late"></details></body>"#,
            "https://example.com/",
        )
        .unwrap();
        let scanner = TreeScanner::new(TriggerRules::Main);
        let mut ctx = RunContext::new();
        scanner.scan(&tree, tree.document(), &mut ctx);
        let watcher = MutationWatcher::connect(&mut tree, scanner);
        (tree, watcher, ctx)
    }

    #[test]
    fn test_attached_subtree_is_scanned() {
        let (mut tree, mut watcher, mut ctx) = setup();
        let body = tree.body().unwrap();
        let panel = tree.create_element("div");
        let button = tree.create_element("button");
        tree.append_child(panel, button).unwrap();
        tree.append_child(body, panel).unwrap();

        let found = watcher.pump(&tree, &mut ctx);

        assert_eq!(found, ScanSummary { controls: 1, triggers: 1 });
        assert!(ctx.frontier.contains(button));
    }

    #[test]
    fn test_opened_disclosure_is_rescanned() {
        let (mut tree, mut watcher, mut ctx) = setup();
        assert_eq!(ctx.records.len(), 1);

        let details = tree.find_by_id("d").unwrap();
        tree.set_attribute(details, "open", "");
        let found = watcher.pump(&tree, &mut ctx);

        assert_eq!(found.controls, 1);
        assert_eq!(ctx.records.len(), 2);
        assert_eq!(ctx.records[1].kind, "input");
    }

    #[test]
    fn test_irrelevant_attributes_are_ignored() {
        let (mut tree, mut watcher, mut ctx) = setup();
        let details = tree.find_by_id("d").unwrap();
        tree.set_attribute(details, "class", "x");

        assert_eq!(watcher.pump(&tree, &mut ctx), ScanSummary::default());
    }

    #[test]
    fn test_removed_before_pump_is_skipped() {
        let (mut tree, mut watcher, mut ctx) = setup();
        let body = tree.body().unwrap();
        let button = tree.create_element_with(ElementData::new("button"));
        tree.append_child(body, button).unwrap();
        tree.remove(button).unwrap();

        assert_eq!(watcher.pump(&tree, &mut ctx), ScanSummary::default());
    }

    #[test]
    fn test_disconnect_drains_pending_records() {
        let (mut tree, watcher, mut ctx) = setup();
        let body = tree.body().unwrap();
        let first = tree.create_element("select");
        tree.append_child(body, first).unwrap();

        let found = watcher.disconnect(&tree, &mut ctx);
        assert_eq!(found.controls, 1);

        let second = tree.create_element("select");
        tree.append_child(body, second).unwrap();
        assert!(!ctx.frontier.contains(second));
    }
}
