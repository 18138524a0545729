//! Selector elements and combinators

use std::rc::Rc;

use crate::output::{CssContext, GenCss, Output};
use crate::tree::{Node, NodeInfo};

/// The relational token prefixing a selector element.
#[derive(Debug, Clone, PartialEq)]
pub struct Combinator {
    /// The token itself: `""`, `" "`, `">"`, `"+"`, `"~"` or `"|"`
    pub value: String,
    /// True for the empty and descendant combinators, which join without
    /// surrounding spaces
    pub empty_or_whitespace: bool,
}

impl Combinator {
    /// Build from the raw token; whitespace collapses to `" "`.
    pub fn new(value: &str) -> Self {
        let value = if value == " " {
            " ".to_string()
        } else {
            value.trim().to_string()
        };
        let empty_or_whitespace = value.is_empty() || value == " ";
        Self { value, empty_or_whitespace }
    }

    /// The empty combinator.
    pub fn none() -> Self {
        Self::new("")
    }

    /// The descendant (single space) combinator.
    pub fn descendant() -> Self {
        Self::new(" ")
    }
}

impl GenCss for Combinator {
    fn gen_css(&self, ctx: &mut CssContext, output: &mut Output) {
        // '', ' ' and '|' never take surrounding spaces
        let no_spaces = self.value.is_empty() || self.value == " " || self.value == "|";
        if ctx.compress || no_spaces {
            output.add_str(self.value.clone());
        } else {
            output.add_str(format!(" {} ", self.value));
        }
    }
}

/// The value of a selector element: a literal token or a nested node
/// (a parenthesized sub-selector such as `:not(& > a)`).
#[derive(Debug, Clone)]
pub enum ElementValue {
    /// Literal selector text, e.g. `.a`, `#id`, `&`
    Str(String),
    /// A nested node, resolved recursively during joining
    Node(Node),
}

impl ElementValue {
    /// The literal text, if this value is literal.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ElementValue::Str(s) => Some(s),
            ElementValue::Node(_) => None,
        }
    }

    /// Whether this value is the parent reference `&`.
    pub fn is_parent_ref(&self) -> bool {
        matches!(self, ElementValue::Str(s) if s == "&")
    }
}

/// A combinator-qualified selector fragment.
#[derive(Debug, Clone)]
pub struct Element {
    /// Position and visibility info
    pub info: NodeInfo,
    /// The combinator preceding this fragment
    pub combinator: Combinator,
    /// The fragment itself
    pub value: ElementValue,
    /// Whether the fragment still contains `@{...}` interpolation that a
    /// parser would need to re-tokenize
    pub is_variable: bool,
}

impl Element {
    /// Build an element from its parts; literal values are trimmed.
    pub fn new(combinator: Combinator, value: ElementValue, is_variable: bool, info: NodeInfo) -> Self {
        let value = match value {
            ElementValue::Str(s) => ElementValue::Str(s.trim().to_string()),
            node => node,
        };
        Self { info, combinator, value, is_variable }
    }

    /// Shorthand for a literal element.
    pub fn literal(combinator: Combinator, text: &str) -> Rc<Self> {
        Rc::new(Self::new(combinator, ElementValue::Str(text.to_string()), false, NodeInfo::none()))
    }

    /// The element's value rendered as plain text.
    pub fn value_css(&self, ctx: &mut CssContext) -> String {
        match &self.value {
            ElementValue::Str(s) => s.clone(),
            ElementValue::Node(node) => {
                // A selector inside parens is not affected by the outer
                // first-selector flag
                let was_first = ctx.first_selector;
                if matches!(node, Node::Paren(_)) {
                    ctx.first_selector = true;
                }
                let css = node.to_css_string(ctx);
                ctx.first_selector = was_first;
                css
            }
        }
    }
}

impl GenCss for Element {
    fn gen_css(&self, ctx: &mut CssContext, output: &mut Output) {
        let value = self.value_css(ctx);
        // An emptied parent reference drops its combinator too
        if value.is_empty() && self.combinator.value.starts_with('&') {
            return;
        }
        let mut comb = Output::new();
        self.combinator.gen_css(ctx, &mut comb);
        output.add(
            format!("{}{}", comb.into_string(), value),
            self.info.file.clone(),
            Some(self.info.index),
        );
    }
}
