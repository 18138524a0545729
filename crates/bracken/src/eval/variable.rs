//! Variable and property resolution against the frame stack

use std::rc::Rc;

use crate::context::{EvalContext, Frame};
use crate::error::{EvalError, Result};
use crate::eval::ruleset::eval_ruleset;
use crate::eval::value::css_text;
use crate::eval::Evaluate;
use crate::tree::{Call, DetachedRuleset, Node, Property, Ruleset, Variable, VariableCall};

/// Evaluate a `@name` reference.
pub fn eval_variable(variable: &Rc<Variable>, ctx: &mut EvalContext) -> Result<Node> {
    eval_named(variable, ctx)
}

/// Resolve a variable reference, handling `@@name` indirection, the
/// re-entrancy guard and `calc()` deferral.
pub fn eval_named(variable: &Variable, ctx: &mut EvalContext) -> Result<Node> {
    let mut name = variable.name.clone();

    // @@name: evaluate the inner reference, then look up "@" + its value.
    // Nested @@@ recurses through the same path.
    if name.starts_with("@@") {
        let inner = Variable::new(&name[1..], variable.info.clone());
        let inner_value = eval_named(&inner, ctx)?;
        name = format!("@{}", css_text(&inner_value, false));
    }

    if variable.evaluating.get() {
        return Err(EvalError::RecursiveVariable {
            name,
            index: variable.info.index,
            filename: variable.info.filename(),
        });
    }
    variable.evaluating.set(true);
    let result = resolve_variable(&name, variable, ctx);
    variable.evaluating.set(false);
    result
}

fn resolve_variable(name: &str, variable: &Variable, ctx: &mut EvalContext) -> Result<Node> {
    let declaration = ctx
        .frames_innermost_first()
        .find_map(|frame| frame.variable(name));

    let Some(declaration) = declaration else {
        return Err(EvalError::UndefinedVariable {
            name: name.to_string(),
            index: variable.info.index,
            filename: variable.info.filename(),
        });
    };

    if let Some(important) = &declaration.important {
        ctx.set_important(important.clone());
    }

    // Inside calc() the value must not resolve yet; wrap it so argument
    // evaluation order matches CSS
    if ctx.is_in_calc() {
        return Ok(Node::Call(Rc::new(Call::new(
            "_SELF",
            vec![declaration.value.clone()],
            variable.info.clone(),
        ))));
    }

    declaration.value.eval(ctx)
}

/// Evaluate a `$name` property reference: last declaration wins.
pub fn eval_property(property: &Rc<Property>, ctx: &mut EvalContext) -> Result<Node> {
    if property.evaluating.get() {
        return Err(EvalError::RecursiveProperty {
            name: property.name.clone(),
            index: property.info.index,
            filename: property.info.filename(),
        });
    }
    property.evaluating.set(true);
    let result = resolve_property(property, ctx);
    property.evaluating.set(false);
    result
}

fn resolve_property(property: &Rc<Property>, ctx: &mut EvalContext) -> Result<Node> {
    let declarations = ctx
        .frames_innermost_first()
        .find_map(|frame| frame.property(&property.name));

    let Some(declarations) = declarations else {
        return Err(EvalError::UndefinedProperty {
            name: property.name.clone(),
            index: property.info.index,
            filename: property.info.filename(),
        });
    };

    let last = declarations.last().expect("property cache entries are non-empty");
    if let Some(important) = &last.important {
        ctx.set_important(important.clone());
    }
    last.value.eval(ctx)
}

/// Capture the defining frames into a detached ruleset (its eval-first
/// step).
pub fn eval_detached(detached: &Rc<DetachedRuleset>, ctx: &mut EvalContext) -> Node {
    let frames = detached
        .frames
        .borrow()
        .clone()
        .unwrap_or_else(|| ctx.frames().to_vec());
    Node::DetachedRuleset(Rc::new(DetachedRuleset::with_frames(
        detached.ruleset.clone(),
        frames,
        detached.info.clone(),
    )))
}

/// Evaluate a detached ruleset's body against its captured closure plus
/// the current frames.
pub fn call_detached(detached: &Rc<DetachedRuleset>, ctx: &mut EvalContext) -> Result<Rc<Ruleset>> {
    match detached.frames.borrow().clone() {
        Some(captured) => {
            let mut stack: Vec<Frame> = ctx.frames().to_vec();
            stack.extend(captured);
            ctx.with_frame_stack(stack, |ctx| eval_ruleset(&detached.ruleset, ctx))
        }
        None => eval_ruleset(&detached.ruleset, ctx),
    }
}

/// Evaluate `@name()`: resolve the variable and expand whatever
/// ruleset-shaped value it holds into rules.
pub fn eval_variable_call(call: &Rc<VariableCall>, ctx: &mut EvalContext) -> Result<Vec<Node>> {
    let variable = Variable::new(call.name.clone(), call.info.clone());
    let resolved = eval_named(&variable, ctx)?;

    match resolved {
        Node::DetachedRuleset(dr) => {
            let evaluated = call_detached(&dr, ctx)?;
            let rules = evaluated.rules.borrow().clone();
            Ok(rules)
        }
        Node::Ruleset(rs) => {
            let wrapped = Rc::new(DetachedRuleset::new(rs, call.info.clone()));
            let evaluated = call_detached(&wrapped, ctx)?;
            let rules = evaluated.rules.borrow().clone();
            Ok(rules)
        }
        _ => Err(EvalError::VariableCallFailed { name: call.name.clone() }),
    }
}
