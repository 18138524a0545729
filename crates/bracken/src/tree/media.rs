//! At-rules: `@media`, generic at-rules and `@import`

use std::cell::RefCell;
use std::rc::Rc;

use crate::output::{CssContext, GenCss, Output};
use crate::tree::{Extend, Node, NodeInfo, Ruleset, Selector};

/// A `@media` block.
///
/// The body always sits inside a single wrapper ruleset with a synthetic
/// empty selector, so bubbling can re-wrap it under ancestor selectors.
#[derive(Debug)]
pub struct Media {
    /// Position and visibility info
    pub info: NodeInfo,
    /// The media-query features, usually a [`crate::tree::ValueList`]
    pub features: RefCell<Node>,
    /// A single wrapper ruleset holding the body
    pub rules: RefCell<Vec<Node>>,
    /// Extends collected under this block by the find pass
    pub all_extends: RefCell<Vec<Rc<Extend>>>,
}

impl Media {
    /// Build a media block; `body` becomes the wrapper ruleset's rules.
    pub fn new(features: Node, body: Vec<Node>, info: NodeInfo) -> Self {
        let selector = Selector::media_empty(&info);
        let wrapper = Ruleset::new(vec![selector], body, false, info.clone());
        wrapper.allow_imports.set(true);
        Self {
            info,
            features: RefCell::new(features),
            rules: RefCell::new(vec![Node::Ruleset(Rc::new(wrapper))]),
            all_extends: RefCell::new(Vec::new()),
        }
    }

    /// The wrapper ruleset, when the body has one (it always does unless
    /// a visitor emptied it).
    pub fn wrapper(&self) -> Option<Rc<Ruleset>> {
        match self.rules.borrow().first() {
            Some(Node::Ruleset(rs)) => Some(rs.clone()),
            _ => None,
        }
    }

    /// Re-wrap the body under selectors bubbled from an ancestor scope.
    pub fn bubble_selectors(&self, selectors: &[Rc<Selector>]) {
        if selectors.is_empty() {
            return;
        }
        let first = match self.rules.borrow().first() {
            Some(rule) => rule.clone(),
            None => return,
        };
        let wrapper = Ruleset::new(selectors.to_vec(), vec![first], false, self.info.clone());
        self.rules.replace(vec![Node::Ruleset(Rc::new(wrapper))]);
    }
}

impl GenCss for Media {
    fn gen_css(&self, ctx: &mut CssContext, output: &mut Output) {
        if self.info.blocks_visibility() && !self.info.is_visible().unwrap_or(false) {
            return;
        }
        output.add("@media ", self.info.file.clone(), Some(self.info.index));
        self.features.borrow().gen_css(ctx, output);
        output_ruleset_body(ctx, output, &self.rules.borrow());
    }
}

/// Any at-rule other than `@media`, with or without a body.
#[derive(Debug)]
pub struct AtRule {
    /// Position and visibility info
    pub info: NodeInfo,
    /// The at-keyword including `@`
    pub name: String,
    /// Prelude value, e.g. the supports condition
    pub prelude: Option<Node>,
    /// Body ruleset for block at-rules
    pub rules: Option<Rc<Ruleset>>,
}

impl AtRule {
    /// Build an at-rule.
    pub fn new(name: &str, prelude: Option<Node>, rules: Option<Rc<Ruleset>>, info: NodeInfo) -> Self {
        Self { info, name: name.to_string(), prelude, rules }
    }

    /// Whether this is `@charset`, which floats to the top of the output.
    pub fn is_charset(&self) -> bool {
        self.name == "@charset"
    }
}

impl GenCss for AtRule {
    fn gen_css(&self, ctx: &mut CssContext, output: &mut Output) {
        if self.info.blocks_visibility() && !self.info.is_visible().unwrap_or(false) {
            return;
        }
        output.add(self.name.clone(), self.info.file.clone(), Some(self.info.index));
        if let Some(prelude) = &self.prelude {
            output.add_str(" ");
            prelude.gen_css(ctx, output);
        }
        match &self.rules {
            Some(body) => {
                output_ruleset_body(ctx, output, &[Node::Ruleset(body.clone())]);
            }
            None => output.add_str(";"),
        }
    }
}

/// An `@import`, either CSS passthrough or a pre-resolved Less root.
#[derive(Debug)]
pub struct Import {
    /// Position and visibility info
    pub info: NodeInfo,
    /// The import path as written
    pub path: String,
    /// The parsed root of the imported file, injected by the out-of-scope
    /// import manager; `None` for CSS passthrough imports
    pub root: Option<Rc<Ruleset>>,
}

impl Import {
    /// A resolved Less import whose rules splice into the importer.
    pub fn resolved(path: &str, root: Rc<Ruleset>, info: NodeInfo) -> Self {
        Self { info, path: path.to_string(), root: Some(root) }
    }

    /// A CSS import that passes through to the output.
    pub fn css(path: &str, info: NodeInfo) -> Self {
        Self { info, path: path.to_string(), root: None }
    }
}

impl GenCss for Import {
    fn gen_css(&self, _ctx: &mut CssContext, output: &mut Output) {
        if self.root.is_some() {
            return;
        }
        output.add(
            format!("@import {};", self.path),
            self.info.file.clone(),
            Some(self.info.index),
        );
    }
}

// Shared block emission for at-rules: ` {` + indented rules + `}`.
// The body's wrapper ruleset is marked root by the join pass, so it prints
// its children transparently at the indent set up here.
fn output_ruleset_body(ctx: &mut CssContext, output: &mut Output, rules: &[Node]) {
    ctx.tab_level += 1;
    if ctx.compress {
        output.add_str("{");
        for rule in rules {
            rule.gen_css(ctx, output);
        }
        output.add_str("}");
        ctx.tab_level -= 1;
        return;
    }
    let tab_set = format!("\n{}", "  ".repeat(ctx.tab_level.saturating_sub(1)));
    let tab_rule = format!("{tab_set}  ");
    if rules.is_empty() {
        output.add_str(format!(" {{{tab_set}}}"));
    } else {
        output.add_str(format!(" {{{tab_rule}"));
        rules[0].gen_css(ctx, output);
        for rule in &rules[1..] {
            output.add_str(tab_rule.clone());
            rule.gen_css(ctx, output);
        }
        output.add_str(format!("{tab_set}}}"));
    }
    ctx.tab_level -= 1;
}
