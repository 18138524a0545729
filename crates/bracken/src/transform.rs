//! The evaluate-then-visit pipeline

use std::rc::Rc;

use crate::context::{EvalContext, Options};
use crate::error::Result;
use crate::eval::ruleset::eval_ruleset;
use crate::output::{CssContext, GenCss, Output};
use crate::tree::{Node, Ruleset};
use crate::visit::extend::process_extends;
use crate::visit::join_selectors::JoinSelectorsVisitor;
use crate::visit::to_css::clean_tree;
use crate::visit::visibility::mark_visible_selectors;

/// Evaluate a parsed root and run the post-eval passes, returning the
/// fully resolved tree. The input root is never mutated and stays valid
/// for further evaluations.
pub fn transform(root: &Rc<Ruleset>, options: Options) -> Result<Rc<Ruleset>> {
    let mut ctx = EvalContext::new(options.clone());
    log::debug!("evaluating root ruleset");
    let evaluated = eval_ruleset(root, &mut ctx)?;

    let root_node = Node::Ruleset(evaluated.clone());
    JoinSelectorsVisitor::run(&root_node);
    mark_visible_selectors(&root_node);
    process_extends(&root_node)?;
    clean_tree(&evaluated, options.compress)?;
    Ok(evaluated)
}

/// Transform and serialize a parsed root to CSS text.
pub fn render(root: &Rc<Ruleset>, options: Options) -> Result<String> {
    let compress = options.compress;
    let transformed = transform(root, options)?;
    let mut css = CssContext::new(compress);
    let mut output = Output::new();
    transformed.gen_css(&mut css, &mut output);
    Ok(output.into_string())
}
