//! AST node kinds for the evaluation core
//!
//! The tree is a closed tagged union: every kind the evaluator can meet is
//! a variant of [`Node`], and the shared capabilities (`eval`, `gen_css`,
//! visitor dispatch) are matched over it rather than probed dynamically.
//! Nodes are `Rc`-shared and never mutated by evaluation; `eval` builds a
//! fresh tree so the pre-eval AST stays valid for re-evaluation.

mod declaration;
mod element;
mod expression;
mod extend;
mod leaf;
mod media;
mod mixin;
mod ruleset;
mod selector;
mod variable;

pub use declaration::{Declaration, DeclarationName, Merge};
pub use element::{Combinator, Element, ElementValue};
pub use expression::{Call, Condition, ConditionOp, Expression, Operation, Paren, ValueList};
pub use extend::{Extend, ExtendOption};
pub use leaf::{Anonymous, Comment, Dimension, Keyword, Quoted};
pub use media::{AtRule, Import, Media};
pub use mixin::{Arg, MixinCall, MixinDefinition, Param};
pub use ruleset::{FoundMixin, Ruleset, SelectorPath};
pub use selector::Selector;
pub use variable::{DetachedRuleset, Property, Variable, VariableCall};

use std::cell::Cell;
use std::rc::Rc;

use crate::output::{CssContext, GenCss, Output};

/// Source file metadata attached to nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileInfo {
    /// Path the node was parsed from
    pub filename: String,
    /// Whether the file was pulled in through a reference import
    pub reference: bool,
}

impl FileInfo {
    /// File info for a named source.
    pub fn named(filename: impl Into<String>) -> Rc<Self> {
        Rc::new(Self { filename: filename.into(), reference: false })
    }
}

/// Position, provenance and visibility state shared by every node kind.
///
/// The visibility counter implements reference-import hiding: a node with
/// blocks and no explicit visible flag is skipped by CSS generation until
/// an extend or mixin call marks it visible.
#[derive(Debug, Default)]
pub struct NodeInfo {
    /// Character offset in the source
    pub index: usize,
    /// Originating file, when known
    pub file: Option<Rc<FileInfo>>,
    visibility_blocks: Cell<u32>,
    node_visible: Cell<Option<bool>>,
}

impl Clone for NodeInfo {
    fn clone(&self) -> Self {
        Self {
            index: self.index,
            file: self.file.clone(),
            visibility_blocks: Cell::new(self.visibility_blocks.get()),
            node_visible: Cell::new(self.node_visible.get()),
        }
    }
}

impl NodeInfo {
    /// Info at a known position in a known file.
    pub fn at(index: usize, file: Option<Rc<FileInfo>>) -> Self {
        Self { index, file, ..Default::default() }
    }

    /// Info with no position (synthesized nodes).
    pub fn none() -> Self {
        Self::default()
    }

    /// Filename for diagnostics; empty when unknown.
    pub fn filename(&self) -> String {
        self.file.as_ref().map(|f| f.filename.clone()).unwrap_or_default()
    }

    /// Whether one or more visibility blocks are active.
    pub fn blocks_visibility(&self) -> bool {
        self.visibility_blocks.get() != 0
    }

    /// Push one visibility block.
    pub fn add_visibility_block(&self) {
        self.visibility_blocks.set(self.visibility_blocks.get() + 1);
    }

    /// Pop one visibility block.
    pub fn remove_visibility_block(&self) {
        let blocks = self.visibility_blocks.get();
        self.visibility_blocks.set(blocks.saturating_sub(1));
    }

    /// Force the node visible regardless of blocks.
    pub fn ensure_visibility(&self) {
        self.node_visible.set(Some(true));
    }

    /// Force the node invisible.
    pub fn ensure_invisibility(&self) {
        self.node_visible.set(Some(false));
    }

    /// Explicit visibility flag, if one was ever set.
    pub fn is_visible(&self) -> Option<bool> {
        self.node_visible.get()
    }

    /// Copy counter and flag from another node's info.
    pub fn copy_visibility_from(&self, other: &NodeInfo) {
        self.visibility_blocks.set(other.visibility_blocks.get());
        self.node_visible.set(other.node_visible.get());
    }

    /// This info, or the parent's position when this one has none.
    ///
    /// Evaluation threads position down at construction instead of keeping
    /// parent back-pointers; this is the inheritance point.
    pub fn or_inherit(&self, parent: &NodeInfo) -> NodeInfo {
        let mut info = self.clone();
        if info.index == 0 {
            info.index = parent.index;
        }
        if info.file.is_none() {
            info.file = parent.file.clone();
        }
        info
    }
}

/// Any node the evaluator can encounter, as a closed tagged union.
#[derive(Debug, Clone)]
pub enum Node {
    /// `property: value;` or `@var: value;`
    Declaration(Rc<Declaration>),
    /// A selector-qualified block of rules, also the unit of scoping
    Ruleset(Rc<Ruleset>),
    /// `.mixin(@a; @b: default) when (...) { ... }`
    MixinDefinition(Rc<MixinDefinition>),
    /// `.mixin(arguments);`
    MixinCall(Rc<MixinCall>),
    /// `@detached();`
    VariableCall(Rc<VariableCall>),
    /// A ruleset value stored for later evaluation
    DetachedRuleset(Rc<DetachedRuleset>),
    /// `@import` with an optionally pre-resolved root
    Import(Rc<Import>),
    /// `/* ... */` or `// ...`
    Comment(Rc<Comment>),
    /// `@media ... { ... }`
    Media(Rc<Media>),
    /// Any other at-rule, with or without a body
    AtRule(Rc<AtRule>),
    /// `:extend(...)` in rule position
    Extend(Rc<Extend>),
    /// A selector appearing as a value (inside parens)
    Selector(Rc<Selector>),
    /// Verbatim text that serializes as-is
    Anonymous(Rc<Anonymous>),
    /// A bare identifier value
    Keyword(Rc<Keyword>),
    /// A quoted string, possibly interpolated
    Quoted(Rc<Quoted>),
    /// A number with an optional unit
    Dimension(Rc<Dimension>),
    /// Space-separated value sequence
    Expression(Rc<Expression>),
    /// Comma-separated value sequence
    ValueList(Rc<ValueList>),
    /// Binary arithmetic between two values
    Operation(Rc<Operation>),
    /// A guard condition
    Condition(Rc<Condition>),
    /// A parenthesized value
    Paren(Rc<Paren>),
    /// A function call
    Call(Rc<Call>),
    /// `@name` reference
    Variable(Rc<Variable>),
    /// `$name` reference
    Property(Rc<Property>),
}

impl Node {
    /// Human-readable kind name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Declaration(_) => "declaration",
            Node::Ruleset(_) => "ruleset",
            Node::MixinDefinition(_) => "mixin definition",
            Node::MixinCall(_) => "mixin call",
            Node::VariableCall(_) => "variable call",
            Node::DetachedRuleset(_) => "detached ruleset",
            Node::Import(_) => "import",
            Node::Comment(_) => "comment",
            Node::Media(_) => "media",
            Node::AtRule(_) => "at-rule",
            Node::Extend(_) => "extend",
            Node::Selector(_) => "selector",
            Node::Anonymous(_) => "anonymous",
            Node::Keyword(_) => "keyword",
            Node::Quoted(_) => "quoted",
            Node::Dimension(_) => "dimension",
            Node::Expression(_) => "expression",
            Node::ValueList(_) => "value list",
            Node::Operation(_) => "operation",
            Node::Condition(_) => "condition",
            Node::Paren(_) => "paren",
            Node::Call(_) => "call",
            Node::Variable(_) => "variable",
            Node::Property(_) => "property",
        }
    }

    /// Position and visibility info of the node.
    pub fn info(&self) -> &NodeInfo {
        match self {
            Node::Declaration(n) => &n.info,
            Node::Ruleset(n) => &n.info,
            Node::MixinDefinition(n) => &n.info,
            Node::MixinCall(n) => &n.info,
            Node::VariableCall(n) => &n.info,
            Node::DetachedRuleset(n) => &n.info,
            Node::Import(n) => &n.info,
            Node::Comment(n) => &n.info,
            Node::Media(n) => &n.info,
            Node::AtRule(n) => &n.info,
            Node::Extend(n) => &n.info,
            Node::Selector(n) => &n.info,
            Node::Anonymous(n) => &n.info,
            Node::Keyword(n) => &n.info,
            Node::Quoted(n) => &n.info,
            Node::Dimension(n) => &n.info,
            Node::Expression(n) => &n.info,
            Node::ValueList(n) => &n.info,
            Node::Operation(n) => &n.info,
            Node::Condition(n) => &n.info,
            Node::Paren(n) => &n.info,
            Node::Call(n) => &n.info,
            Node::Variable(n) => &n.info,
            Node::Property(n) => &n.info,
        }
    }

    /// Nodes whose closure must be captured before siblings evaluate.
    pub fn eval_first(&self) -> bool {
        matches!(self, Node::MixinDefinition(_) | Node::DetachedRuleset(_))
    }

    /// An empty anonymous value, the "nothing" result.
    pub fn empty_anonymous() -> Node {
        Node::Anonymous(Rc::new(Anonymous::new("", NodeInfo::none())))
    }

    /// Truthiness of an evaluated guard result.
    pub fn is_truthy(&self) -> bool {
        match self {
            Node::Keyword(k) => k.value == "true",
            Node::Quoted(q) => !q.value.is_empty(),
            Node::Dimension(d) => d.value != 0.0,
            _ => false,
        }
    }

    /// A structurally new node with `!important` applied where it applies.
    pub fn make_important(&self) -> Node {
        match self {
            Node::Declaration(d) => Node::Declaration(Rc::new(d.make_important())),
            Node::Ruleset(r) => Node::Ruleset(Rc::new(r.make_important())),
            Node::MixinDefinition(m) => Node::MixinDefinition(Rc::new(m.make_important())),
            other => other.clone(),
        }
    }

    /// Whether CSS generation may emit this node.
    ///
    /// A node under active visibility blocks is hidden unless an extend or
    /// mixin call explicitly marked it visible.
    pub fn is_output_visible(&self) -> bool {
        let info = self.info();
        if info.blocks_visibility() {
            info.is_visible().unwrap_or(false)
        } else {
            info.is_visible().unwrap_or(true)
        }
    }
}

impl GenCss for Node {
    fn gen_css(&self, ctx: &mut CssContext, output: &mut Output) {
        match self {
            Node::Declaration(n) => n.gen_css(ctx, output),
            Node::Ruleset(n) => n.gen_css(ctx, output),
            // Mixin definitions and extends produce no CSS of their own
            Node::MixinDefinition(_) | Node::Extend(_) => {}
            Node::MixinCall(_) | Node::VariableCall(_) | Node::DetachedRuleset(_) => {}
            Node::Import(n) => n.gen_css(ctx, output),
            Node::Comment(n) => n.gen_css(ctx, output),
            Node::Media(n) => n.gen_css(ctx, output),
            Node::AtRule(n) => n.gen_css(ctx, output),
            Node::Selector(n) => n.gen_css(ctx, output),
            Node::Anonymous(n) => n.gen_css(ctx, output),
            Node::Keyword(n) => n.gen_css(ctx, output),
            Node::Quoted(n) => n.gen_css(ctx, output),
            Node::Dimension(n) => n.gen_css(ctx, output),
            Node::Expression(n) => n.gen_css(ctx, output),
            Node::ValueList(n) => n.gen_css(ctx, output),
            Node::Operation(n) => n.gen_css(ctx, output),
            Node::Condition(_) => {}
            Node::Paren(n) => n.gen_css(ctx, output),
            Node::Call(n) => n.gen_css(ctx, output),
            Node::Variable(n) => output.add_str(n.name.clone()),
            Node::Property(n) => output.add_str(format!("${}", n.name)),
        }
    }
}
