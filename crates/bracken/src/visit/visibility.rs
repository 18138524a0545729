//! The visibility-marking pass
//!
//! After evaluation every node not under an active visibility block is
//! marked explicitly visible, so the extend pass can distinguish
//! selectors it synthesizes (forced visible) from reference-import
//! content that stays hidden until used.

use crate::tree::Node;

/// Mark a subtree visible, stopping at visibility blocks.
pub fn mark_visible_selectors(root: &Node) {
    mark(root, true);
}

fn mark(node: &Node, visible: bool) {
    let info = node.info();
    if info.blocks_visibility() {
        return;
    }
    if visible {
        info.ensure_visibility();
    } else {
        info.ensure_invisibility();
    }

    match node {
        Node::Ruleset(ruleset) => {
            for selector in &ruleset.selectors {
                mark_selector(selector, visible);
            }
            for path in ruleset.paths.borrow().iter() {
                for selector in path {
                    mark_selector(selector, visible);
                }
            }
            for rule in ruleset.rules.borrow().iter() {
                mark(rule, visible);
            }
        }
        Node::Media(media) => {
            for rule in media.rules.borrow().iter() {
                mark(rule, visible);
            }
        }
        Node::AtRule(at_rule) => {
            if let Some(body) = &at_rule.rules {
                let body = Node::Ruleset(body.clone());
                mark(&body, visible);
            }
        }
        _ => {}
    }
}

fn mark_selector(selector: &crate::tree::Selector, visible: bool) {
    if selector.info.blocks_visibility() {
        return;
    }
    if visible {
        selector.info.ensure_visibility();
    } else {
        selector.info.ensure_invisibility();
    }
}
