//! Compound value nodes: expressions, lists, operations, conditions, calls

use crate::output::{CssContext, GenCss, Output};
use crate::tree::{Node, NodeInfo};

/// A space-separated sequence of values, e.g. `1px solid red`.
#[derive(Debug, Clone)]
pub struct Expression {
    /// Position info
    pub info: NodeInfo,
    /// The values in order
    pub value: Vec<Node>,
    /// Suppress the separating spaces (used by variadic capture of
    /// comma-separated arguments)
    pub no_spacing: bool,
}

impl Expression {
    /// Build an expression over the given values.
    pub fn new(value: Vec<Node>, info: NodeInfo) -> Self {
        Self { info, value, no_spacing: false }
    }
}

impl GenCss for Expression {
    fn gen_css(&self, ctx: &mut CssContext, output: &mut Output) {
        for (i, node) in self.value.iter().enumerate() {
            node.gen_css(ctx, output);
            if !self.no_spacing && i + 1 < self.value.len() {
                output.add_str(" ");
            }
        }
    }
}

/// A comma-separated sequence of values, e.g. `a, b, c`.
#[derive(Debug, Clone)]
pub struct ValueList {
    /// Position info
    pub info: NodeInfo,
    /// The comma alternatives in order
    pub value: Vec<Node>,
}

impl ValueList {
    /// Build a comma list.
    pub fn new(value: Vec<Node>, info: NodeInfo) -> Self {
        Self { info, value }
    }
}

impl GenCss for ValueList {
    fn gen_css(&self, ctx: &mut CssContext, output: &mut Output) {
        let sep = if ctx.compress { "," } else { ", " };
        for (i, node) in self.value.iter().enumerate() {
            node.gen_css(ctx, output);
            if i + 1 < self.value.len() {
                output.add_str(sep);
            }
        }
    }
}

/// A binary arithmetic operation between two values.
#[derive(Debug, Clone)]
pub struct Operation {
    /// Position info
    pub info: NodeInfo,
    /// Operator token: `+`, `-`, `*` or `/`
    pub op: String,
    /// Left and right operands
    pub operands: [Node; 2],
    /// Whether the source had spaces around the operator, preserved when
    /// math is off and the operation is re-emitted as text
    pub is_spaced: bool,
}

impl Operation {
    /// Build an operation.
    pub fn new(op: impl Into<String>, left: Node, right: Node, is_spaced: bool, info: NodeInfo) -> Self {
        Self { info, op: op.into().trim().to_string(), operands: [left, right], is_spaced }
    }
}

impl GenCss for Operation {
    fn gen_css(&self, ctx: &mut CssContext, output: &mut Output) {
        self.operands[0].gen_css(ctx, output);
        if self.is_spaced {
            output.add_str(" ");
        }
        output.add_str(self.op.clone());
        if self.is_spaced {
            output.add_str(" ");
        }
        self.operands[1].gen_css(ctx, output);
    }
}

/// Comparison and logical operators usable in guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionOp {
    /// `and`
    And,
    /// `or`
    Or,
    /// `=`
    Eq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `=<` / `<=`
    Le,
    /// `>=`
    Ge,
}

/// A guard condition, e.g. `(@a > 1) and (@b = red)`.
#[derive(Debug, Clone)]
pub struct Condition {
    /// Position info
    pub info: NodeInfo,
    /// The operator
    pub op: ConditionOp,
    /// Left operand
    pub lvalue: Node,
    /// Right operand
    pub rvalue: Node,
    /// `not (...)` negation
    pub negate: bool,
}

impl Condition {
    /// Build a condition.
    pub fn new(op: ConditionOp, lvalue: Node, rvalue: Node, negate: bool, info: NodeInfo) -> Self {
        Self { info, op, lvalue, rvalue, negate }
    }
}

/// A parenthesized value.
#[derive(Debug, Clone)]
pub struct Paren {
    /// Position info
    pub info: NodeInfo,
    /// The wrapped value
    pub value: Node,
}

impl Paren {
    /// Wrap a value in parentheses.
    pub fn new(value: Node, info: NodeInfo) -> Self {
        Self { info, value }
    }
}

impl GenCss for Paren {
    fn gen_css(&self, ctx: &mut CssContext, output: &mut Output) {
        output.add_str("(");
        self.value.gen_css(ctx, output);
        output.add_str(")");
    }
}

/// A function call, e.g. `calc(100% - @w)` or `default()`.
#[derive(Debug, Clone)]
pub struct Call {
    /// Position info
    pub info: NodeInfo,
    /// Function name as written
    pub name: String,
    /// Unevaluated arguments
    pub args: Vec<Node>,
}

impl Call {
    /// Build a call.
    pub fn new(name: impl Into<String>, args: Vec<Node>, info: NodeInfo) -> Self {
        Self { info, name: name.into(), args }
    }

    /// Whether this is the `calc()` function, whose arguments defer
    /// variable resolution.
    pub fn is_calc(&self) -> bool {
        self.name.eq_ignore_ascii_case("calc")
    }
}

impl GenCss for Call {
    fn gen_css(&self, ctx: &mut CssContext, output: &mut Output) {
        output.add(
            format!("{}(", self.name),
            self.info.file.clone(),
            Some(self.info.index),
        );
        let sep = if ctx.compress { "," } else { ", " };
        for (i, arg) in self.args.iter().enumerate() {
            arg.gen_css(ctx, output);
            if i + 1 < self.args.len() {
                output.add_str(sep);
            }
        }
        output.add_str(")");
    }
}
