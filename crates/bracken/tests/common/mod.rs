//! Shared AST builders for integration tests
//!
//! The parser is out of scope, so tests construct the pre-eval tree
//! directly with these helpers.

#![allow(dead_code)]

use std::rc::Rc;

use bracken::tree::{
    Anonymous, Arg, Combinator, Condition, ConditionOp, Declaration, DeclarationName, Dimension,
    Element, ElementValue, Expression, Extend, ExtendOption, Keyword, Media, MixinCall,
    MixinDefinition, Node, NodeInfo, Param, Ruleset, Selector, Variable,
};

/// Verbatim text value.
pub fn anon(text: &str) -> Node {
    Node::Anonymous(Rc::new(Anonymous::new(text, NodeInfo::none())))
}

/// Keyword value.
pub fn kw(text: &str) -> Node {
    Node::Keyword(Rc::new(Keyword::new(text, NodeInfo::none())))
}

/// Unitless number.
pub fn num(value: f64) -> Node {
    Node::Dimension(Rc::new(Dimension::number(value)))
}

/// Number with a unit.
pub fn dim(value: f64, unit: &str) -> Node {
    Node::Dimension(Rc::new(Dimension::new(value, unit, NodeInfo::none())))
}

/// `@name` reference (pass the name with its sigil).
pub fn var_ref(name: &str) -> Node {
    Node::Variable(Rc::new(Variable::new(name, NodeInfo::none())))
}

/// One selector element.
pub fn el(combinator: &str, value: &str) -> Rc<Element> {
    Rc::new(Element::new(
        Combinator::new(combinator),
        ElementValue::Str(value.to_string()),
        false,
        NodeInfo::none(),
    ))
}

/// Selector from (combinator, value) pairs.
pub fn sel(parts: &[(&str, &str)]) -> Rc<Selector> {
    let elements = parts.iter().map(|(c, v)| el(c, v)).collect();
    Rc::new(Selector::new(elements, Vec::new(), None, NodeInfo::none()))
}

/// Single-element selector with no combinator.
pub fn sel1(value: &str) -> Rc<Selector> {
    sel(&[("", value)])
}

/// Selector with a guard condition.
pub fn sel_when(value: &str, condition: Node) -> Rc<Selector> {
    Rc::new(Selector::new(
        vec![el("", value)],
        Vec::new(),
        Some(condition),
        NodeInfo::none(),
    ))
}

/// Selector carrying an extend list.
pub fn sel_extend(value: &str, target: Rc<Selector>, option: ExtendOption) -> Rc<Selector> {
    let extend = Rc::new(Extend::new(target, option, NodeInfo::none()));
    Rc::new(Selector::new(
        vec![el("", value)],
        vec![extend],
        None,
        NodeInfo::none(),
    ))
}

/// `property: value;`
pub fn decl(name: &str, value: Node) -> Node {
    Node::Declaration(Rc::new(Declaration::new(
        DeclarationName::Ident(name.to_string()),
        value,
        None,
        NodeInfo::none(),
    )))
}

/// `@name: value;` (pass the name with its sigil).
pub fn var_decl(name: &str, value: Node) -> Node {
    decl(name, value)
}

/// A nested ruleset node.
pub fn rs(selectors: Vec<Rc<Selector>>, rules: Vec<Node>) -> Node {
    Node::Ruleset(Rc::new(Ruleset::new(selectors, rules, false, NodeInfo::none())))
}

/// The document root.
pub fn root(rules: Vec<Node>) -> Rc<Ruleset> {
    Ruleset::root(rules)
}

/// A mixin definition node.
pub fn mixin(name: &str, params: Vec<Param>, rules: Vec<Node>) -> Node {
    let variadic = params.last().map_or(false, |p| p.variadic);
    Node::MixinDefinition(Rc::new(MixinDefinition::new(
        name,
        params,
        rules,
        None,
        variadic,
        NodeInfo::none(),
    )))
}

/// A guarded mixin definition node.
pub fn mixin_when(name: &str, params: Vec<Param>, condition: Node, rules: Vec<Node>) -> Node {
    let variadic = params.last().map_or(false, |p| p.variadic);
    Node::MixinDefinition(Rc::new(MixinDefinition::new(
        name,
        params,
        rules,
        Some(condition),
        variadic,
        NodeInfo::none(),
    )))
}

/// A mixin call statement.
pub fn call(name: &str, args: Vec<Arg>) -> Node {
    Node::MixinCall(Rc::new(MixinCall::new(sel1(name), args, false, NodeInfo::none())))
}

/// A mixin call with `!important`.
pub fn call_important(name: &str, args: Vec<Arg>) -> Node {
    Node::MixinCall(Rc::new(MixinCall::new(sel1(name), args, true, NodeInfo::none())))
}

/// A comparison guard.
pub fn cond(op: ConditionOp, left: Node, right: Node) -> Node {
    Node::Condition(Rc::new(Condition::new(op, left, right, false, NodeInfo::none())))
}

/// A `@media` block node.
pub fn media(features: &str, body: Vec<Node>) -> Node {
    Node::Media(Rc::new(Media::new(anon(features), body, NodeInfo::none())))
}

/// A space-separated expression value.
pub fn expr(values: Vec<Node>) -> Node {
    Node::Expression(Rc::new(Expression::new(values, NodeInfo::none())))
}

/// Render with default options.
pub fn render(root: &Rc<Ruleset>) -> String {
    bracken::render(root, bracken::Options::default()).expect("render failed")
}

/// Render compressed.
pub fn render_compressed(root: &Rc<Ruleset>) -> String {
    bracken::render(
        root,
        bracken::Options { compress: true, ..Default::default() },
    )
    .expect("render failed")
}

/// Render, expecting an error.
pub fn render_err(root: &Rc<Ruleset>) -> bracken::EvalError {
    bracken::render(root, bracken::Options::default()).expect_err("render should fail")
}
