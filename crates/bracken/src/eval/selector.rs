//! Selector, element and extend evaluation

use std::rc::Rc;

use crate::context::EvalContext;
use crate::error::Result;
use crate::eval::value::eval_condition;
use crate::eval::Evaluate;
use crate::tree::{Element, ElementValue, Extend, Node, Quoted, Selector};

/// Evaluate a selector: guard first, then elements, then the extend
/// list. Returns a derived selector; the original is untouched.
pub fn eval_selector(selector: &Rc<Selector>, ctx: &mut EvalContext) -> Result<Rc<Selector>> {
    let evald_condition = match &selector.condition {
        Some(Node::Condition(cond)) => Some(eval_condition(cond, ctx)?),
        Some(other) => Some(other.eval(ctx)?.is_truthy()),
        None => None,
    };

    let elements = selector
        .elements
        .iter()
        .map(|el| eval_element(el, ctx))
        .collect::<Result<Vec<_>>>()?;

    let extend_list = selector
        .extend_list
        .iter()
        .map(|e| eval_extend(e, ctx).map(Rc::new))
        .collect::<Result<Vec<_>>>()?;

    Ok(Rc::new(selector.create_derived(elements, Some(extend_list), evald_condition)))
}

/// Evaluate one element: nested values evaluate recursively; literal
/// values run `@{...}` interpolation when present.
pub fn eval_element(element: &Rc<Element>, ctx: &mut EvalContext) -> Result<Rc<Element>> {
    let value = match &element.value {
        ElementValue::Node(node) => ElementValue::Node(node.eval(ctx)?),
        ElementValue::Str(text) if text.contains("@{") => {
            let quoted = Quoted::new(None, text.clone(), true, element.info.clone());
            let evaluated = Rc::new(quoted);
            let resolved = crate::eval::value::eval_quoted(&evaluated, ctx)?;
            match resolved {
                Node::Quoted(q) => ElementValue::Str(q.value.clone()),
                other => ElementValue::Node(other),
            }
        }
        literal => literal.clone(),
    };

    Ok(Rc::new(Element::new(
        element.combinator.clone(),
        value,
        element.is_variable,
        element.info.clone(),
    )))
}

/// Evaluate an extend: its target selector evaluates, identity is fresh.
pub fn eval_extend(extend: &Rc<Extend>, ctx: &mut EvalContext) -> Result<Extend> {
    let selector = eval_selector(&extend.selector, ctx)?;
    let evaluated = Extend::new(selector, extend.option, extend.info.clone());
    Ok(evaluated)
}
