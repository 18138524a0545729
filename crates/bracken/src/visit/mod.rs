//! Post-evaluation tree passes
//!
//! The evaluated tree is refined by four passes in order: selector
//! joining, visibility marking, extend resolution, and the output
//! cleanup. Passes that share the enter/exit traversal shape implement
//! [`Visitor`]; the simpler ones are plain recursive functions.

pub mod extend;
pub mod join_selectors;
pub mod to_css;
pub mod visibility;

use std::rc::Rc;

use crate::tree::{AtRule, Declaration, Media, MixinDefinition, Node, Ruleset};

/// Enter/exit hooks over the closed node union.
///
/// Enter hooks return whether to descend. Declarations and mixin
/// definitions default to opaque: the structural passes never look
/// inside them.
pub trait Visitor {
    /// Called on every node before kind dispatch.
    fn visit_any(&mut self, _node: &Node) {}
    /// Enter a ruleset.
    fn visit_ruleset(&mut self, _ruleset: &Rc<Ruleset>) -> bool {
        true
    }
    /// Leave a ruleset.
    fn visit_ruleset_out(&mut self, _ruleset: &Rc<Ruleset>) {}
    /// Enter a media block.
    fn visit_media(&mut self, _media: &Rc<Media>) -> bool {
        true
    }
    /// Leave a media block.
    fn visit_media_out(&mut self, _media: &Rc<Media>) {}
    /// Enter a generic at-rule.
    fn visit_at_rule(&mut self, _at_rule: &Rc<AtRule>) -> bool {
        true
    }
    /// Leave a generic at-rule.
    fn visit_at_rule_out(&mut self, _at_rule: &Rc<AtRule>) {}
    /// Enter a declaration (opaque by default).
    fn visit_declaration(&mut self, _declaration: &Rc<Declaration>) -> bool {
        false
    }
    /// Enter a mixin definition (opaque by default).
    fn visit_mixin_definition(&mut self, _definition: &Rc<MixinDefinition>) -> bool {
        false
    }
}

/// Drive a visitor depth-first over a node.
pub fn walk(node: &Node, visitor: &mut dyn Visitor) {
    visitor.visit_any(node);
    match node {
        Node::Ruleset(ruleset) => {
            if visitor.visit_ruleset(ruleset) {
                let rules = ruleset.rules.borrow().clone();
                for rule in &rules {
                    walk(rule, visitor);
                }
            }
            visitor.visit_ruleset_out(ruleset);
        }
        Node::Media(media) => {
            if visitor.visit_media(media) {
                let rules = media.rules.borrow().clone();
                for rule in &rules {
                    walk(rule, visitor);
                }
            }
            visitor.visit_media_out(media);
        }
        Node::AtRule(at_rule) => {
            if visitor.visit_at_rule(at_rule) {
                if let Some(body) = &at_rule.rules {
                    let body = Node::Ruleset(body.clone());
                    walk(&body, visitor);
                }
            }
            visitor.visit_at_rule_out(at_rule);
        }
        Node::Declaration(declaration) => {
            if visitor.visit_declaration(declaration) {
                walk(&declaration.value, visitor);
            }
        }
        Node::MixinDefinition(definition) => {
            if visitor.visit_mixin_definition(definition) {
                for rule in definition.rules() {
                    walk(&rule, visitor);
                }
            }
        }
        _ => {}
    }
}
