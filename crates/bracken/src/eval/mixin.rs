//! Mixin resolution: argument binding, guards, candidate selection

use std::rc::Rc;

use crate::context::{EvalContext, Frame};
use crate::error::{EvalError, Result};
use crate::eval::ruleset::eval_ruleset;
use crate::eval::selector::eval_selector;
use crate::eval::value::{css_text, eval_condition};
use crate::eval::Evaluate;
use crate::tree::{
    Declaration, DeclarationName, Expression, MixinCall, MixinDefinition, Node, Ruleset,
};

const DEF_FALSE_EITHER_CASE: i32 = -1;
const DEF_NONE: i32 = 0;
const DEF_TRUE: i32 = 1;
const DEF_FALSE: i32 = 2;

/// One evaluated call argument.
#[derive(Debug, Clone)]
pub struct EvaldArg {
    /// Name for `@name: value` arguments, with the `@` sigil
    pub name: Option<String>,
    /// The already-evaluated value
    pub value: Node,
}

/// Evaluate a mixin definition (its eval-first step): the body stays
/// unevaluated, the defining frames are captured as the closure.
pub fn eval_definition(def: &Rc<MixinDefinition>, ctx: &mut EvalContext) -> Rc<MixinDefinition> {
    if def.frames.borrow().is_some() {
        return def.clone();
    }
    let copy = MixinDefinition::new(
        &def.name,
        def.params.clone(),
        def.rules(),
        def.condition.clone(),
        def.variadic,
        def.info.clone(),
    );
    copy.frames.replace(Some(ctx.frames().to_vec()));
    copy.wrapped.replace(def.wrapped.borrow().clone());
    Rc::new(copy)
}

/// `match_args`: arity window plus pattern-parameter literal matching.
/// Named-argument validity is checked later, in `eval_params`.
pub fn match_args(def: &MixinDefinition, args: &[EvaldArg], ctx: &mut EvalContext) -> bool {
    let required_args = args
        .iter()
        .filter(|arg| match &arg.name {
            Some(name) => !def.optional_parameters.iter().any(|p| p == name),
            None => true,
        })
        .count();

    if !def.variadic {
        if required_args < def.required {
            return false;
        }
        if args.len() > def.arity {
            return false;
        }
    } else if required_args < def.required.saturating_sub(1) {
        return false;
    }

    // Pattern parameters (no name, not variadic) match by literal value
    let len_check = required_args.min(def.arity);
    for i in 0..len_check {
        let Some(param) = def.params.get(i) else { break };
        if param.name.is_none() && !param.variadic {
            let Some(pattern) = &param.value else { continue };
            let Some(arg) = args.get(i) else { return false };
            let pattern_css = match pattern.eval(ctx) {
                Ok(node) => css_text(&node, false),
                Err(err) => {
                    log::debug!("pattern parameter failed to evaluate: {err}");
                    return false;
                }
            };
            if pattern_css != css_text(&arg.value, false) {
                return false;
            }
        }
    }
    true
}

/// Bind call arguments into a fresh frame.
///
/// Named arguments bind first (unknown names error), positional
/// arguments fill the remaining slots, a variadic parameter captures the
/// tail, and unresolved parameters with defaults evaluate those defaults
/// in the defining frames with the partially-built frame visible
/// (defaults may reference other parameters).
pub fn eval_params(
    def: &MixinDefinition,
    ctx: &mut EvalContext,
    mixin_frames: &[Frame],
    args: &[EvaldArg],
) -> Result<(Rc<Ruleset>, Vec<Option<Node>>)> {
    let frame = Ruleset::anonymous(Vec::new());
    if let Some(registry) = mixin_frames.last().and_then(|f| f.registry()) {
        frame.function_registry.replace(Some(registry));
    }

    let mut evald_arguments: Vec<Option<Node>> = vec![None; def.params.len()];
    let mut args: Vec<EvaldArg> = args.to_vec();

    // Named arguments first
    let mut i = 0;
    while i < args.len() {
        let Some(name) = args[i].name.clone() else {
            i += 1;
            continue;
        };
        let mut is_named_found = false;
        for (j, param) in def.params.iter().enumerate() {
            if evald_arguments[j].is_some() {
                continue;
            }
            if param.name.as_deref() == Some(name.as_str()) {
                let value = args[i].value.clone();
                evald_arguments[j] = Some(value.clone());
                frame.prepend_rule(param_declaration(&name, value));
                is_named_found = true;
                break;
            }
        }
        if is_named_found {
            args.remove(i);
        } else {
            return Err(EvalError::UnknownNamedArgument {
                mixin: def.name.clone(),
                name,
            });
        }
    }

    // Positional arguments, variadic capture, defaults
    let mut arg_index = 0;
    for (i, param) in def.params.iter().enumerate() {
        if evald_arguments[i].is_some() {
            continue;
        }
        let arg = args.get(arg_index).cloned();

        let Some(param_name) = &param.name else {
            // Pattern parameter: consumes its positional slot
            if arg.is_some() {
                arg_index += 1;
            }
            continue;
        };

        if param.variadic {
            let varargs: Vec<Node> = args[arg_index.min(args.len())..]
                .iter()
                .map(|a| a.value.clone())
                .collect();
            for (j, value) in varargs.iter().enumerate() {
                if let Some(slot) = evald_arguments.get_mut(arg_index + j) {
                    *slot = Some(value.clone());
                }
            }
            let expression = Expression::new(varargs, def.info.clone());
            frame.prepend_rule(param_declaration(param_name, Node::Expression(Rc::new(expression))));
            arg_index = args.len();
        } else {
            let value = if let Some(arg) = arg {
                arg_index += 1;
                arg.value
            } else if let Some(default) = &param.value {
                // Closure semantics: the default sees the defining frames
                // plus the frame being built
                let mut stack = mixin_frames.to_vec();
                stack.push(Frame::Ruleset(frame.clone()));
                let value = ctx.with_frame_stack(stack, |ctx| default.eval(ctx))?;
                frame.reset_cache();
                value
            } else {
                return Err(EvalError::WrongArgumentCount {
                    mixin: def.name.clone(),
                    given: args.len(),
                    expected: def.arity,
                });
            };
            evald_arguments[i] = Some(value.clone());
            frame.prepend_rule(param_declaration(param_name, value));
        }
    }

    Ok((frame, evald_arguments))
}

fn param_declaration(name: &str, value: Node) -> Node {
    let mut decl = Declaration::new(
        DeclarationName::Ident(name.to_string()),
        value,
        None,
        crate::tree::NodeInfo::none(),
    );
    decl.variable = true;
    Node::Declaration(Rc::new(decl))
}

/// Evaluate the guard with bound parameters in scope; no guard means the
/// candidate always matches. Evaluation errors count as a failed guard.
pub fn match_condition(def: &MixinDefinition, args: &[EvaldArg], ctx: &mut EvalContext) -> bool {
    let Some(condition) = &def.condition else {
        return true;
    };

    let def_frames = def.frames.borrow().clone().unwrap_or_default();
    let mut mixin_frames: Vec<Frame> = ctx.frames().to_vec();
    mixin_frames.extend(def_frames.iter().cloned());

    let (frame, _) = match eval_params(def, ctx, &mixin_frames, args) {
        Ok(bound) => bound,
        Err(err) => {
            log::debug!("guard parameter binding failed for {}: {err}", def.name);
            return false;
        }
    };

    let mut stack = mixin_frames;
    stack.push(Frame::Ruleset(frame));
    let result = ctx.with_frame_stack(stack, |ctx| match condition {
        Node::Condition(cond) => eval_condition(cond, ctx),
        other => other.eval(ctx).map(|n| n.is_truthy()),
    });
    match result {
        Ok(matched) => matched,
        Err(err) => {
            log::debug!("guard evaluation failed for {}: {err}", def.name);
            false
        }
    }
}

// A plain ruleset used as a namespace matches when its last selector's
// guard held.
fn namespace_matches(node: &Node, ctx: &mut EvalContext) -> bool {
    match node {
        Node::Ruleset(rs) => {
            let Some(last) = rs.selectors.last() else {
                return false;
            };
            if !last.evald_condition {
                return false;
            }
            match &last.condition {
                Some(Node::Condition(cond)) => eval_condition(cond, ctx).unwrap_or(false),
                Some(other) => other
                    .eval(ctx)
                    .map(|n| n.is_truthy())
                    .unwrap_or(false),
                None => true,
            }
        }
        Node::MixinDefinition(md) => match_condition(md, &[], ctx),
        _ => true,
    }
}

// Group a candidate by how its guard responds to the two assumed
// `default()` results.
fn calc_def_group(mixin: &Node, path: &[Node], args: &[EvaldArg], ctx: &mut EvalContext) -> i32 {
    let mut condition_result = [true, true];
    for f in 0..2 {
        ctx.default_func.set(Some(f == 1));
        for namespace in path {
            if !condition_result[f] {
                break;
            }
            condition_result[f] = namespace_matches(namespace, ctx);
        }
        if condition_result[f] {
            condition_result[f] = match mixin {
                Node::MixinDefinition(md) => match_condition(md, args, ctx),
                Node::Ruleset(_) => namespace_matches(mixin, ctx),
                _ => false,
            };
        }
    }

    if condition_result[0] || condition_result[1] {
        if condition_result[0] != condition_result[1] {
            return if condition_result[1] { DEF_TRUE } else { DEF_FALSE };
        }
        return DEF_NONE;
    }
    DEF_FALSE_EITHER_CASE
}

/// Call a definition with bound arguments, evaluating its body against
/// the captured closure plus the call-site frames.
pub fn eval_call_definition(
    def: &Rc<MixinDefinition>,
    ctx: &mut EvalContext,
    args: &[EvaldArg],
    important: bool,
) -> Result<Rc<Ruleset>> {
    if ctx.mixin_depth >= ctx.max_mixin_depth {
        return Err(EvalError::MixinDepthExceeded { max: ctx.max_mixin_depth });
    }

    let def_frames = def.frames.borrow().clone().unwrap_or_default();
    let mut mixin_frames: Vec<Frame> = ctx.frames().to_vec();
    mixin_frames.extend(def_frames.iter().cloned());

    let (frame, evald_arguments) = eval_params(def, ctx, &mixin_frames, args)?;

    // @arguments: all evaluated arguments as one expression
    let argument_nodes: Vec<Node> = evald_arguments.into_iter().flatten().collect();
    let arguments_expr = Expression::new(argument_nodes, def.info.clone());
    frame.prepend_rule(param_declaration(
        "@arguments",
        Node::Expression(Rc::new(arguments_expr)),
    ));

    let body = Ruleset::anonymous(def.rules());
    body.original.replace(Some(
        def.wrapped.borrow().clone().unwrap_or_else(|| def.scope.clone()),
    ));

    let mut stack = mixin_frames;
    stack.push(Frame::Ruleset(frame));
    stack.push(Frame::Mixin(def.clone()));

    ctx.mixin_depth += 1;
    let result = ctx.with_frame_stack(stack, |ctx| eval_ruleset(&body, ctx));
    ctx.mixin_depth -= 1;
    let evaluated = result?;

    if important {
        Ok(Rc::new(evaluated.make_important()))
    } else {
        Ok(evaluated)
    }
}

/// Resolve and expand a mixin call, returning the produced rules.
pub fn eval_mixin_call(call: &Rc<MixinCall>, ctx: &mut EvalContext) -> Result<Vec<Node>> {
    let selector = eval_selector(&call.selector, ctx)?;

    // Evaluate arguments against the caller's context, splicing `...`
    // expansions of list values
    let mut args: Vec<EvaldArg> = Vec::new();
    for arg in &call.arguments {
        let value = arg.value.eval(ctx)?;
        if arg.expand {
            let items = match &value {
                Node::Expression(e) => Some(e.value.clone()),
                Node::ValueList(v) => Some(v.value.clone()),
                _ => None,
            };
            match items {
                Some(items) if !items.is_empty() => {
                    for item in items {
                        args.push(EvaldArg { name: None, value: item });
                    }
                }
                _ => args.push(EvaldArg { name: arg.name.clone(), value }),
            }
        } else {
            args.push(EvaldArg { name: arg.name.clone(), value });
        }
    }

    let formatted = |args: &[EvaldArg]| {
        let pairs: Vec<(Option<String>, Node)> =
            args.iter().map(|a| (a.name.clone(), a.value.clone())).collect();
        call.format(&pairs)
    };

    let frames: Vec<Frame> = ctx.frames().to_vec();
    let mut is_one_found = false;

    for frame in frames.iter().rev() {
        let mixins = frame.find(&selector);
        if mixins.is_empty() {
            continue;
        }
        is_one_found = true;
        log::trace!("mixin lookup for `{}`: {} candidates", formatted(&args), mixins.len());

        let mut candidates: Vec<(Node, i32)> = Vec::new();
        let mut matched = false;

        for found in &mixins {
            // Recursion guard: a plain ruleset must not call itself
            // through any frame it is currently evaluating under
            if let Node::Ruleset(candidate) = &found.rule {
                let is_recursive = frames.iter().any(|f| {
                    Rc::ptr_eq(candidate, &f.original_scope()) || Rc::ptr_eq(candidate, f.scope())
                });
                if is_recursive {
                    continue;
                }
            }

            let args_match = match &found.rule {
                Node::MixinDefinition(md) => match_args(md, &args, ctx),
                Node::Ruleset(_) => Ruleset::match_args_empty(args.len()),
                _ => false,
            };
            if args_match {
                matched = true;
                let group = calc_def_group(&found.rule, &found.path, &args, ctx);
                log::trace!("candidate `{}` grouped {}", found.rule.kind(), group);
                if group != DEF_FALSE_EITHER_CASE {
                    candidates.push((found.rule.clone(), group));
                }
            }
        }
        ctx.default_func.reset();

        let mut count = [0usize; 3];
        for (_, group) in &candidates {
            count[*group as usize] += 1;
        }
        let default_result = if count[DEF_NONE as usize] > 0 {
            DEF_FALSE
        } else {
            if count[DEF_TRUE as usize] + count[DEF_FALSE as usize] > 1 {
                return Err(EvalError::AmbiguousDefault {
                    call: formatted(&args),
                    index: call.info.index,
                    filename: call.info.filename(),
                });
            }
            DEF_TRUE
        };

        let mut rules: Vec<Node> = Vec::new();
        for (mixin, group) in &candidates {
            if *group != DEF_NONE && *group != default_result {
                continue;
            }
            let definition = match mixin {
                Node::MixinDefinition(md) => md.clone(),
                Node::Ruleset(rs) => Rc::new(MixinDefinition::wrapping(rs)),
                _ => continue,
            };
            let produced = eval_call_definition(&definition, ctx, &args, call.important)?;
            let new_rules = produced.rules.borrow().clone();
            if call.info.blocks_visibility() {
                for rule in &new_rules {
                    rule.info().add_visibility_block();
                }
            }
            rules.extend(new_rules);
        }

        if matched {
            return Ok(rules);
        }
    }

    if is_one_found {
        Err(EvalError::NoMatchingDefinition {
            call: formatted(&args),
            index: call.info.index,
            filename: call.info.filename(),
        })
    } else {
        let name = css_text(&Node::Selector(selector), false).trim().to_string();
        let name = if name.is_empty() { "<empty selector>".to_string() } else { name };
        Err(EvalError::UndefinedMixin {
            call: name,
            index: call.info.index,
            filename: call.info.filename(),
        })
    }
}
