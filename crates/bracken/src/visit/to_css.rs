//! The pre-serialization cleanup pass
//!
//! Flattens the evaluated tree into output shape: nested rulesets,
//! media blocks and block at-rules hoist out of their parents (the
//! parent block prints first, the hoisted blocks follow), and
//! everything that exists only for evaluation is removed: variable
//! declarations, mixin definitions, bare extends, silenced comments,
//! blocks left without content, and invisible (reference-import)
//! nodes. Also the last place structural errors can surface: a bare
//! declaration at the document root is illegal.

use std::rc::Rc;

use crate::error::{EvalError, Result};
use crate::tree::{Combinator, Element, Node, Ruleset};

/// Clean an evaluated root in place.
pub fn clean_tree(root: &Rc<Ruleset>, compress: bool) -> Result<()> {
    clean_block(root, compress)
}

// Clean a root-like block (document root, media body wrapper, at-rule
// body): children are cleaned and their expansions spliced in order.
fn clean_block(ruleset: &Rc<Ruleset>, compress: bool) -> Result<()> {
    let first_root = ruleset.first_root.get();
    let rules = ruleset.rules.borrow().clone();
    let mut kept: Vec<Node> = Vec::new();

    for rule in rules {
        if first_root {
            if let Node::Declaration(decl) = &rule {
                if !decl.variable {
                    return Err(EvalError::DeclarationAtRoot {
                        index: decl.info.index,
                        filename: decl.info.filename(),
                    });
                }
            }
        }
        kept.extend(clean_node(rule, compress)?);
    }

    ruleset.rules.replace(kept);
    Ok(())
}

// A node's replacement in the output tree: empty to drop it, more than
// one entry when nested blocks hoist out.
fn clean_node(node: Node, compress: bool) -> Result<Vec<Node>> {
    match &node {
        Node::Declaration(decl) => {
            if decl.variable || !node.is_output_visible() {
                Ok(Vec::new())
            } else {
                Ok(vec![node])
            }
        }
        Node::MixinDefinition(_) | Node::Extend(_) => Ok(Vec::new()),
        Node::Comment(comment) => {
            if comment.is_silent(compress) || !node.is_output_visible() {
                Ok(Vec::new())
            } else {
                Ok(vec![node])
            }
        }
        Node::Ruleset(ruleset) if ruleset.root.get() => {
            clean_block(ruleset, compress)?;
            if ruleset.rules.borrow().is_empty() {
                Ok(Vec::new())
            } else {
                Ok(vec![node])
            }
        }
        Node::Ruleset(ruleset) => {
            // Hoist block children out; they print after this block
            let mut own: Vec<Node> = Vec::new();
            let mut hoisted: Vec<Node> = Vec::new();
            for rule in ruleset.rules.take() {
                if Ruleset::is_ruleset_like(&rule) {
                    hoisted.extend(clean_node(rule, compress)?);
                } else {
                    own.extend(clean_node(rule, compress)?);
                }
            }
            ruleset.rules.replace(own);
            compile_paths(ruleset);

            let keep = !ruleset.rules.borrow().is_empty()
                && !ruleset.paths.borrow().is_empty()
                && node.is_output_visible();
            let mut result = if keep { vec![node.clone()] } else { Vec::new() };
            result.extend(hoisted);
            Ok(result)
        }
        Node::Media(media) => {
            let mut kept: Vec<Node> = Vec::new();
            for rule in media.rules.take() {
                kept.extend(clean_node(rule, compress)?);
            }
            let has_content = !kept.is_empty();
            media.rules.replace(kept);
            if has_content && node.is_output_visible() {
                Ok(vec![node])
            } else {
                Ok(Vec::new())
            }
        }
        Node::AtRule(at_rule) => {
            if let Some(body) = &at_rule.rules {
                clean_block(body, compress)?;
                if body.rules.borrow().is_empty() {
                    return Ok(Vec::new());
                }
            }
            if node.is_output_visible() {
                Ok(vec![node])
            } else {
                Ok(Vec::new())
            }
        }
        _ => Ok(vec![node]),
    }
}

// Joined paths are final here: a leading descendant space collapses
// away and hidden paths are dropped.
fn compile_paths(ruleset: &Rc<Ruleset>) {
    let mut paths = ruleset.paths.borrow_mut();
    for path in paths.iter_mut() {
        let Some(first) = path.first().cloned() else { continue };
        if let Some(first_el) = first.elements.first() {
            if first_el.combinator.value == " " {
                let mut elements = first.elements.clone();
                elements[0] = Rc::new(Element::new(
                    Combinator::none(),
                    first_el.value.clone(),
                    first_el.is_variable,
                    first_el.info.clone(),
                ));
                path[0] = Rc::new(first.create_derived(elements, None, None));
            }
        }
    }
    paths.retain(|path| {
        path.first()
            .map(|s| s.is_path_visible() && s.is_output())
            .unwrap_or(false)
    });
}
