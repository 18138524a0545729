//! Tree-walking evaluation
//!
//! The dispatcher matches over the closed [`Node`] union and hands each
//! kind to its module. Evaluation is single-threaded depth-first
//! recursion; re-entrancy is guarded by the `evaluating` flags on
//! variable and property references and by the mixin call-depth budget.

pub mod join;
pub mod media;
pub mod mixin;
pub mod ruleset;
pub mod selector;
pub mod value;
pub mod variable;

use std::rc::Rc;

use crate::context::EvalContext;
use crate::error::Result;
use crate::tree::{Keyword, Node, Ruleset};

/// Capability for evaluating AST nodes against a context.
///
/// Implementations construct new nodes; the receiver is never mutated,
/// so a pristine pre-eval tree stays reusable.
pub trait Evaluate {
    /// Evaluate this node in the given context.
    fn eval(&self, ctx: &mut EvalContext) -> Result<Node>;
}

impl Evaluate for Node {
    fn eval(&self, ctx: &mut EvalContext) -> Result<Node> {
        match self {
            Node::Declaration(d) => value::eval_declaration(d, ctx),
            Node::Ruleset(r) => Ok(Node::Ruleset(ruleset::eval_ruleset(r, ctx)?)),
            Node::MixinDefinition(m) => Ok(Node::MixinDefinition(mixin::eval_definition(m, ctx))),
            // A mixin call met in value position resolves to a detached
            // body; statement-position calls are expanded by the ruleset
            // orchestration before this dispatcher sees them.
            Node::MixinCall(mc) => {
                let rules = mixin::eval_mixin_call(mc, ctx)?;
                let body = Ruleset::anonymous(rules);
                Ok(Node::DetachedRuleset(Rc::new(
                    crate::tree::DetachedRuleset::new(body, mc.info.clone()),
                )))
            }
            Node::VariableCall(vc) => {
                let rules = variable::eval_variable_call(vc, ctx)?;
                let body = Ruleset::anonymous(rules);
                Ok(Node::DetachedRuleset(Rc::new(
                    crate::tree::DetachedRuleset::new(body, vc.info.clone()),
                )))
            }
            Node::DetachedRuleset(d) => Ok(variable::eval_detached(d, ctx)),
            Node::Import(_) | Node::Comment(_) => Ok(self.clone()),
            Node::Media(m) => media::eval_media(m, ctx),
            Node::AtRule(a) => media::eval_at_rule(a, ctx),
            Node::Extend(e) => Ok(Node::Extend(Rc::new(selector::eval_extend(e, ctx)?))),
            Node::Selector(s) => Ok(Node::Selector(selector::eval_selector(s, ctx)?)),
            Node::Anonymous(_) | Node::Keyword(_) | Node::Dimension(_) => Ok(self.clone()),
            Node::Quoted(q) => value::eval_quoted(q, ctx),
            Node::Expression(e) => value::eval_expression(e, ctx),
            Node::ValueList(v) => value::eval_value_list(v, ctx),
            Node::Operation(o) => value::eval_operation(o, ctx),
            Node::Condition(c) => {
                let result = value::eval_condition(c, ctx)?;
                Ok(Node::Keyword(Rc::new(Keyword::bool(result))))
            }
            Node::Paren(p) => value::eval_paren(p, ctx),
            Node::Call(c) => value::eval_call(c, ctx),
            Node::Variable(v) => variable::eval_variable(v, ctx),
            Node::Property(p) => variable::eval_property(p, ctx),
        }
    }
}
