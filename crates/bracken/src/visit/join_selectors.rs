//! The selector-join pass
//!
//! Walks the evaluated tree carrying a stack of ancestor path lists and
//! asks each non-root ruleset to join its selectors against them. Also
//! marks at-rule body wrappers as roots when they sit at the top of
//! their context, so they serialize transparently.

use std::rc::Rc;

use crate::eval::join::join_selector;
use crate::tree::{AtRule, Media, Node, Ruleset, SelectorPath};
use crate::visit::{walk, Visitor};

/// The join pass state: one path-list per open scope.
#[derive(Default)]
pub struct JoinSelectorsVisitor {
    contexts: Vec<Vec<SelectorPath>>,
}

impl JoinSelectorsVisitor {
    /// Run the pass over an evaluated root.
    pub fn run(root: &Node) {
        let mut visitor = JoinSelectorsVisitor { contexts: vec![Vec::new()] };
        walk(root, &mut visitor);
    }
}

impl Visitor for JoinSelectorsVisitor {
    fn visit_ruleset(&mut self, ruleset: &Rc<Ruleset>) -> bool {
        let context = self.contexts.last().cloned().unwrap_or_default();
        let mut paths: Vec<SelectorPath> = Vec::new();

        if !ruleset.root.get() {
            let selectors: Vec<_> = ruleset
                .selectors
                .iter()
                .filter(|s| s.is_output())
                .cloned()
                .collect();
            if selectors.is_empty() {
                // Every guard failed: the body is dead
                ruleset.rules.replace(Vec::new());
            } else {
                for selector in &selectors {
                    join_selector(&mut paths, &context, selector);
                }
            }
            ruleset.paths.replace(paths.clone());
        }

        self.contexts.push(paths);
        true
    }

    fn visit_ruleset_out(&mut self, _ruleset: &Rc<Ruleset>) {
        self.contexts.pop();
    }

    fn visit_media(&mut self, media: &Rc<Media>) -> bool {
        // A body wrapper at the top of its context serializes
        // transparently; nested deeper it keeps its selectors and joins
        // the enclosing paths through its `&`
        let at_top = self.contexts.last().map_or(true, Vec::is_empty);
        if let Some(wrapper) = media.wrapper() {
            wrapper.root.set(at_top);
        }
        true
    }

    fn visit_at_rule(&mut self, at_rule: &Rc<AtRule>) -> bool {
        let at_top = self.contexts.last().map_or(true, Vec::is_empty);
        if let Some(body) = &at_rule.rules {
            body.root.set(at_top);
        }
        true
    }
}
