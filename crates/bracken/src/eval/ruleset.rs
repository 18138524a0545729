//! Per-scope evaluation orchestration
//!
//! One `eval_ruleset` call drives the whole per-scope order: selectors
//! and guards, import expansion, eval-first nodes, mixin/variable-call
//! expansion with the scope-pollution guard, remaining rules, the
//! parent-selector fold, and media bubbling. Any nested error aborts the
//! call; the frame and selector stacks unwind through the context guards
//! on every exit path.

use std::rc::Rc;

use crate::context::{EvalContext, Frame};
use crate::error::Result;
use crate::eval::mixin::eval_mixin_call;
use crate::eval::selector::eval_selector;
use crate::eval::variable::eval_variable_call;
use crate::eval::Evaluate;
use crate::tree::{Node, Ruleset};

/// Evaluate a ruleset into a new ruleset; the receiver stays pristine.
pub fn eval_ruleset(ruleset: &Rc<Ruleset>, ctx: &mut EvalContext) -> Result<Rc<Ruleset>> {
    // Selectors and guards. `default()` is illegal here, so the error is
    // armed while they evaluate.
    let mut has_passing_selector = ruleset.selectors.is_empty();
    let selectors = if ruleset.selectors.is_empty() {
        Vec::new()
    } else {
        ctx.default_func.arm_error();
        let evaluated = (|| {
            let mut evaluated = Vec::with_capacity(ruleset.selectors.len());
            for selector in &ruleset.selectors {
                let selector = eval_selector(selector, ctx)?;
                if selector.evald_condition {
                    has_passing_selector = true;
                }
                evaluated.push(selector);
            }
            Ok(evaluated)
        })();
        ctx.default_func.reset();
        evaluated?
    };

    // An unmatched guard suppresses the whole body but still yields an
    // empty ruleset so callers' bubbling stays consistent
    let rules = if has_passing_selector {
        ruleset.rules.borrow().clone()
    } else {
        Vec::new()
    };

    let evaluated = Rc::new(Ruleset::new(
        selectors.clone(),
        rules,
        ruleset.strict_imports,
        ruleset.info.clone(),
    ));
    evaluated.info.copy_visibility_from(&ruleset.info);
    evaluated.original.replace(Some(ruleset.clone()));
    evaluated.root.set(ruleset.root.get());
    evaluated.first_root.set(ruleset.first_root.get());
    evaluated.allow_imports.set(ruleset.allow_imports.get());

    // Inherit a function registry from the nearest enclosing frame,
    // falling back to the context's root registry
    let parent_registry = ctx
        .frames_innermost_first()
        .find_map(|frame| frame.registry())
        .unwrap_or_else(|| ctx.function_registry.clone());
    evaluated.function_registry.replace(Some(parent_registry.inherit()));

    let media_start = ctx.media_block_count();

    let scope = Frame::Ruleset(evaluated.clone());
    let body_result = ctx.with_frame(scope, |ctx| {
        ctx.with_selectors(ruleset.selectors.clone(), |ctx| -> Result<()> {
            if evaluated.root.get() || evaluated.allow_imports.get() || !evaluated.strict_imports {
                eval_imports(&evaluated);
            }

            // Eval-first: definitions and detached rulesets capture their
            // closures before anything else runs
            let rule_count = evaluated.rules.borrow().len();
            for i in 0..rule_count {
                let rule = evaluated.rules.borrow()[i].clone();
                if rule.eval_first() {
                    let replacement = rule.eval(ctx)?;
                    evaluated.rules.borrow_mut()[i] = replacement;
                }
            }

            expand_calls(&evaluated, ctx)?;

            // Everything else
            let rule_count = evaluated.rules.borrow().len();
            for i in 0..rule_count {
                let rule = evaluated.rules.borrow()[i].clone();
                if rule.eval_first() {
                    continue;
                }
                let replacement = rule.eval(ctx)?;
                evaluated.rules.borrow_mut()[i] = replacement;
            }
            evaluated.reset_cache();

            fold_parent_rulesets(&evaluated);
            Ok(())
        })
    });
    body_result?;

    ctx.bubble_media_blocks(media_start, &selectors);
    Ok(evaluated)
}

// Expand `@import` entries in place: each resolved import splices its
// root's rules at the import's position. CSS passthrough imports stay.
fn eval_imports(ruleset: &Rc<Ruleset>) {
    let mut i = 0;
    loop {
        let rule = {
            let rules = ruleset.rules.borrow();
            match rules.get(i) {
                Some(rule) => rule.clone(),
                None => break,
            }
        };
        if let Node::Import(import) = &rule {
            match &import.root {
                Some(root) => {
                    let imported = root.rules.borrow().clone();
                    let count = imported.len();
                    ruleset.splice_rules(i, imported);
                    i += count;
                }
                None => i += 1,
            }
        } else {
            i += 1;
        }
    }
}

// Expand mixin calls and variable calls in place. Mixin results drop
// variable declarations the caller already has (pollution guard); a
// bare variable call drops every variable declaration unconditionally.
fn expand_calls(ruleset: &Rc<Ruleset>, ctx: &mut EvalContext) -> Result<()> {
    let mut i = 0;
    loop {
        let rule = {
            let rules = ruleset.rules.borrow();
            match rules.get(i) {
                Some(rule) => rule.clone(),
                None => break,
            }
        };
        match &rule {
            Node::MixinCall(call) => {
                let produced = eval_mixin_call(call, ctx)?;
                let filtered: Vec<Node> = produced
                    .into_iter()
                    .filter(|r| match r {
                        Node::Declaration(d) if d.variable => match d.name_str() {
                            Some(name) => ruleset.variable(name).is_none(),
                            None => true,
                        },
                        _ => true,
                    })
                    .collect();
                let count = filtered.len();
                ruleset.splice_rules(i, filtered);
                i += count;
            }
            Node::VariableCall(call) => {
                let produced = eval_variable_call(call, ctx)?;
                let filtered: Vec<Node> = produced
                    .into_iter()
                    .filter(|r| !matches!(r, Node::Declaration(d) if d.variable))
                    .collect();
                let count = filtered.len();
                ruleset.splice_rules(i, filtered);
                i += count;
            }
            _ => i += 1,
        }
    }
    Ok(())
}

// Unwrap direct child rulesets whose only selector is a bare `&`. Their
// rules splice in place; variable declarations do not escape the fold.
fn fold_parent_rulesets(ruleset: &Rc<Ruleset>) {
    let mut i = 0;
    loop {
        let rule = {
            let rules = ruleset.rules.borrow();
            match rules.get(i) {
                Some(rule) => rule.clone(),
                None => break,
            }
        };
        if let Node::Ruleset(inner) = &rule {
            if inner.selectors.len() == 1 && inner.selectors[0].is_just_parent_selector() {
                let folded: Vec<Node> = inner
                    .rules
                    .borrow()
                    .iter()
                    .filter(|r| !matches!(r, Node::Declaration(d) if d.variable))
                    .inspect(|r| r.info().copy_visibility_from(&inner.info))
                    .cloned()
                    .collect();
                let count = folded.len();
                ruleset.splice_rules(i, folded);
                i += count;
                continue;
            }
        }
        i += 1;
    }
}
