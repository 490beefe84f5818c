use crate::dom::{DomTree, ElementData, NodeId};
use crate::error::Result;
use crate::host::HostTree;
use indexmap::IndexMap;
use scraper::{ElementRef, Html};

impl DomTree {
    /// Build a tree from markup.
    ///
    /// Whitespace-only text is dropped. A `<template shadowrootmode>` child is
    /// turned into the parent's shadow root. Nesting depth is bounded only by
    /// the parser: elements are created in order and filled from a worklist.
    pub fn parse_html(html: &str, url: &str) -> Result<Self> {
        let mut tree = DomTree::new(url)?;
        let document = Html::parse_document(html);
        for error in &document.errors {
            log::trace!("html parse error: {}", error);
        }

        let root = tree.document();
        let source = document.root_element();
        let node = append_element(&mut tree, root, source)?;
        let mut pending = vec![(source, node)];

        while let Some((source, target)) = pending.pop() {
            for child in source.children() {
                if let Some(child_element) = ElementRef::wrap(child) {
                    let is_shadow_template = child_element.value().name() == "template"
                        && child_element.value().attr("shadowrootmode").is_some();
                    if is_shadow_template && tree.is_element(target) && tree.shadow_root(target).is_none() {
                        let shadow = tree.attach_shadow(target)?;
                        pending.push((child_element, shadow));
                    } else {
                        let node = append_element(&mut tree, target, child_element)?;
                        pending.push((child_element, node));
                    }
                } else if let Some(text) = child.value().as_text() {
                    if !text.trim().is_empty() {
                        let node = tree.create_text(&**text);
                        tree.append_child(target, node)?;
                    }
                }
            }
        }
        Ok(tree)
    }
}

/// Create an empty copy of `source` as the last child of `parent`
fn append_element(tree: &mut DomTree, parent: NodeId, source: ElementRef<'_>) -> Result<NodeId> {
    let element = source.value();
    let attributes: IndexMap<String, String> = element
        .attrs()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    let node = tree.create_element_with(ElementData::new(element.name()).with_attributes(attributes));
    tree.append_child(parent, node)?;
    Ok(node)
}
