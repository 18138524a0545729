//! Evaluation of declarations and leaf values

use std::rc::Rc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::context::{EvalContext, MathMode};
use crate::error::{EvalError, Result};
use crate::eval::Evaluate;
use crate::output::{CssContext, GenCss};
use crate::eval::variable;
use crate::tree::{
    Call, Condition, ConditionOp, Declaration, DeclarationName, Dimension, Expression, Keyword,
    Node, Operation, Paren, Quoted, ValueList, Variable,
};

static INTERPOLATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@\{([\w-]+)\}").expect("interpolation regex"));

/// Render an evaluated node to plain CSS text (comparison helper).
pub fn css_text(node: &Node, compress: bool) -> String {
    node.to_css_string(&mut CssContext::new(compress))
}

/// Evaluate a declaration: resolve the name, evaluate the value under a
/// fresh important scope, and reject detached rulesets in property
/// position.
pub fn eval_declaration(decl: &Rc<Declaration>, ctx: &mut EvalContext) -> Result<Node> {
    let (name, variable) = match &decl.name {
        DeclarationName::Ident(s) => (s.clone(), decl.variable),
        DeclarationName::Interpolated(parts) => (eval_name(parts, ctx)?, false),
    };

    // Font shorthand contains `/` that must not divide
    let math_bypass = !variable && name == "font" && ctx.math == MathMode::Always;
    if math_bypass {
        ctx.math = MathMode::ParensDivision;
    }
    let (value_result, captured_important) = ctx.with_important_scope(|ctx| decl.value.eval(ctx));
    if math_bypass {
        ctx.math = MathMode::Always;
    }
    let value = value_result?;

    if !decl.variable && matches!(value, Node::DetachedRuleset(_)) {
        return Err(EvalError::RulesetOnProperty);
    }

    let mut evaluated = Declaration::new(DeclarationName::Ident(name), value, None, decl.info.clone());
    evaluated.important = captured_important.or_else(|| decl.important.clone());
    evaluated.merge = decl.merge;
    evaluated.inline = decl.inline;
    evaluated.variable = variable;
    Ok(Node::Declaration(Rc::new(evaluated)))
}

// Interpolated declaration names flatten to the CSS text of their parts.
fn eval_name(parts: &[Node], ctx: &mut EvalContext) -> Result<String> {
    let mut name = String::new();
    for part in parts {
        let evaluated = part.eval(ctx)?;
        name.push_str(&css_text(&evaluated, false));
    }
    Ok(name)
}

/// Evaluate a quoted string, resolving `@{name}` interpolation against
/// the frame stack until a fixed point.
pub fn eval_quoted(quoted: &Rc<Quoted>, ctx: &mut EvalContext) -> Result<Node> {
    let mut value = quoted.value.clone();
    // Interpolations can produce further interpolations; eight rounds is
    // far beyond anything a sane sheet does
    for _ in 0..8 {
        if !value.contains("@{") {
            break;
        }
        let mut replaced = value.clone();
        for capture in INTERPOLATION.captures_iter(&value) {
            let whole = capture.get(0).expect("capture 0").as_str();
            let name = format!("@{}", &capture[1]);
            let variable = Variable::new(name, quoted.info.clone());
            let resolved = variable::eval_named(&variable, ctx)?;
            replaced = replaced.replace(whole, &css_text(&resolved, false));
        }
        if replaced == value {
            break;
        }
        value = replaced;
    }
    Ok(Node::Quoted(Rc::new(Quoted::new(
        quoted.quote,
        value,
        quoted.escaped,
        quoted.info.clone(),
    ))))
}

/// Evaluate a space-separated expression; single members unwrap.
pub fn eval_expression(expr: &Rc<Expression>, ctx: &mut EvalContext) -> Result<Node> {
    match expr.value.len() {
        0 => Ok(Node::Expression(expr.clone())),
        1 => expr.value[0].eval(ctx),
        _ => {
            let values = expr
                .value
                .iter()
                .map(|v| v.eval(ctx))
                .collect::<Result<Vec<_>>>()?;
            let mut evaluated = Expression::new(values, expr.info.clone());
            evaluated.no_spacing = expr.no_spacing;
            Ok(Node::Expression(Rc::new(evaluated)))
        }
    }
}

/// Evaluate a comma list; single members unwrap.
pub fn eval_value_list(list: &Rc<ValueList>, ctx: &mut EvalContext) -> Result<Node> {
    match list.value.len() {
        0 => Ok(Node::ValueList(list.clone())),
        1 => list.value[0].eval(ctx),
        _ => {
            let values = list
                .value
                .iter()
                .map(|v| v.eval(ctx))
                .collect::<Result<Vec<_>>>()?;
            Ok(Node::ValueList(Rc::new(ValueList::new(values, list.info.clone()))))
        }
    }
}

/// Evaluate an operation: arithmetic when math is on for the operator,
/// otherwise the operation re-emits as text with evaluated operands.
pub fn eval_operation(op: &Rc<Operation>, ctx: &mut EvalContext) -> Result<Node> {
    let left = op.operands[0].eval(ctx)?;
    let right = op.operands[1].eval(ctx)?;

    if !ctx.is_math_on(&op.op) {
        return Ok(Node::Operation(Rc::new(Operation::new(
            op.op.clone(),
            left,
            right,
            op.is_spaced,
            op.info.clone(),
        ))));
    }

    match (&left, &right) {
        (Node::Dimension(a), Node::Dimension(b)) => {
            let unit = if a.unit.is_empty() {
                b.unit.clone()
            } else if b.unit.is_empty() || a.unit == b.unit {
                a.unit.clone()
            } else {
                return Err(EvalError::IncompatibleUnits {
                    left: a.unit.clone(),
                    right: b.unit.clone(),
                });
            };
            let value = match op.op.as_str() {
                "+" => a.value + b.value,
                "-" => a.value - b.value,
                "*" => a.value * b.value,
                "/" => a.value / b.value,
                other => {
                    return Err(EvalError::InvalidOperation {
                        op: other.to_string(),
                        left: left.kind().to_string(),
                        right: right.kind().to_string(),
                    })
                }
            };
            Ok(Node::Dimension(Rc::new(Dimension::new(value, unit, op.info.clone()))))
        }
        _ => Err(EvalError::InvalidOperation {
            op: op.op.clone(),
            left: left.kind().to_string(),
            right: right.kind().to_string(),
        }),
    }
}

/// Evaluate a guard condition to a boolean.
pub fn eval_condition(cond: &Rc<Condition>, ctx: &mut EvalContext) -> Result<bool> {
    let result = match cond.op {
        ConditionOp::And => truthy(&cond.lvalue, ctx)? && truthy(&cond.rvalue, ctx)?,
        ConditionOp::Or => truthy(&cond.lvalue, ctx)? || truthy(&cond.rvalue, ctx)?,
        _ => {
            let left = cond.lvalue.eval(ctx)?;
            let right = cond.rvalue.eval(ctx)?;
            match compare(&left, &right) {
                Some(ordering) => match cond.op {
                    ConditionOp::Eq => ordering == 0,
                    ConditionOp::Lt => ordering < 0,
                    ConditionOp::Gt => ordering > 0,
                    ConditionOp::Le => ordering <= 0,
                    ConditionOp::Ge => ordering >= 0,
                    ConditionOp::And | ConditionOp::Or => unreachable!(),
                },
                None => false,
            }
        }
    };
    Ok(if cond.negate { !result } else { result })
}

// Truthiness of a guard operand, recursing into nested conditions.
fn truthy(node: &Node, ctx: &mut EvalContext) -> Result<bool> {
    match node {
        Node::Condition(c) => eval_condition(c, ctx),
        other => Ok(other.eval(ctx)?.is_truthy()),
    }
}

// Three-way comparison between evaluated nodes; `None` means the kinds
// are incomparable and every relation on them is false.
fn compare(left: &Node, right: &Node) -> Option<i32> {
    match (left, right) {
        (Node::Dimension(a), Node::Dimension(b)) => {
            if !a.unit.is_empty() && !b.unit.is_empty() && a.unit != b.unit {
                return None;
            }
            Some(num_compare(a.value, b.value))
        }
        _ => {
            let a = css_text(left, false);
            let b = css_text(right, false);
            Some(match a.cmp(&b) {
                std::cmp::Ordering::Less => -1,
                std::cmp::Ordering::Equal => 0,
                std::cmp::Ordering::Greater => 1,
            })
        }
    }
}

fn num_compare(a: f64, b: f64) -> i32 {
    if a < b {
        -1
    } else if a > b {
        1
    } else {
        0
    }
}

/// Evaluate a parenthesized value, tracking parenthesis depth for the
/// math mode.
pub fn eval_paren(paren: &Rc<Paren>, ctx: &mut EvalContext) -> Result<Node> {
    let value = ctx.in_parens(|ctx| paren.value.eval(ctx))?;
    Ok(Node::Paren(Rc::new(Paren::new(value, paren.info.clone()))))
}

/// Evaluate a function call.
///
/// `default()` reads the mixin-matching state; `calc()` defers variable
/// resolution inside its arguments; unknown functions re-emit as CSS
/// with evaluated arguments.
pub fn eval_call(call: &Rc<Call>, ctx: &mut EvalContext) -> Result<Node> {
    if call.name.eq_ignore_ascii_case("default") {
        let value = ctx.default_func.eval()?;
        return Ok(Node::Keyword(Rc::new(Keyword::bool(value.unwrap_or(false)))));
    }

    let args = if call.is_calc() {
        // Arithmetic must survive verbatim into the emitted calc()
        let math_was_on = ctx.math_on;
        ctx.math_on = false;
        let args = ctx.in_calc(|ctx| {
            call.args
                .iter()
                .map(|a| a.eval(ctx))
                .collect::<Result<Vec<_>>>()
        });
        ctx.math_on = math_was_on;
        args?
    } else {
        call.args
            .iter()
            .map(|a| a.eval(ctx))
            .collect::<Result<Vec<_>>>()?
    };

    let registry = ctx
        .frames_innermost_first()
        .find_map(|f| f.registry())
        .unwrap_or_else(|| ctx.function_registry.clone());
    if let Some(func) = registry.get(&call.name) {
        log::trace!("calling builtin function `{}`", call.name);
        return func(&args, ctx);
    }

    Ok(Node::Call(Rc::new(Call::new(call.name.clone(), args, call.info.clone()))))
}
