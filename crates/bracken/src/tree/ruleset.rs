//! Rulesets: selector-qualified rule blocks, and the unit of scoping

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::output::{CssContext, GenCss, Output};
use crate::registry::Registry;
use crate::tree::{Declaration, Node, NodeInfo, Selector};

/// An ancestor chain of selectors forming one joined output selector.
pub type SelectorPath = Vec<Rc<Selector>>;

/// A mixin-lookup hit: the matched rule and the namespace rulesets
/// traversed to reach it.
#[derive(Debug, Clone)]
pub struct FoundMixin {
    /// The matched ruleset or mixin definition
    pub rule: Node,
    /// Enclosing namespaces, innermost last
    pub path: Vec<Node>,
}

#[derive(Debug, Default)]
struct ScopeCaches {
    variables: IndexMap<String, Rc<Declaration>>,
    properties: IndexMap<String, Vec<Rc<Declaration>>>,
}

/// A block of rules behind selector paths.
///
/// Any ruleset can act as a lookup frame. The caches are lazily built
/// from the current rules and must be dropped on every in-place rules
/// mutation, which `splice_rules`/`reset_cache` guarantee.
#[derive(Debug)]
pub struct Ruleset {
    /// Position and visibility info
    pub info: NodeInfo,
    /// Comma alternatives, evaluated where this ruleset came from `eval`
    pub selectors: Vec<Rc<Selector>>,
    /// The rules, mutable in place during this scope's own evaluation
    pub rules: RefCell<Vec<Node>>,
    /// Whether this is a root scope (no selector output)
    pub root: Cell<bool>,
    /// Whether this is the outermost document root
    pub first_root: Cell<bool>,
    /// Whether imports may expand here even under strict imports
    pub allow_imports: Cell<bool>,
    /// Strict-import mode blocks in-place import expansion
    pub strict_imports: bool,
    /// Set when a wrapper holds several bubbled media blocks
    pub multi_media: Cell<bool>,
    /// Marks rule-level `&:extend` that applies to every comma alternative
    pub extend_on_every_path: Cell<bool>,
    /// Joined output selector paths, produced by the join pass
    pub paths: RefCell<Vec<SelectorPath>>,
    /// All extends found below this root, stacked by the find pass
    pub all_extends: RefCell<Vec<Rc<crate::tree::Extend>>>,
    /// The pre-eval ruleset this one was evaluated from
    pub original: RefCell<Option<Rc<Ruleset>>>,
    /// Registry inherited from the nearest enclosing frame
    pub function_registry: RefCell<Option<Rc<Registry>>>,
    caches: RefCell<Option<ScopeCaches>>,
    lookups: RefCell<HashMap<String, Vec<FoundMixin>>>,
}

impl Ruleset {
    /// Build a ruleset from evaluated (or parsed) parts.
    pub fn new(selectors: Vec<Rc<Selector>>, rules: Vec<Node>, strict_imports: bool, info: NodeInfo) -> Self {
        Self {
            info,
            selectors,
            rules: RefCell::new(rules),
            root: Cell::new(false),
            first_root: Cell::new(false),
            allow_imports: Cell::new(false),
            strict_imports,
            multi_media: Cell::new(false),
            extend_on_every_path: Cell::new(false),
            paths: RefCell::new(Vec::new()),
            all_extends: RefCell::new(Vec::new()),
            original: RefCell::new(None),
            function_registry: RefCell::new(None),
            caches: RefCell::new(None),
            lookups: RefCell::new(HashMap::new()),
        }
    }

    /// A root ruleset wrapping a parsed document.
    pub fn root(rules: Vec<Node>) -> Rc<Self> {
        let rs = Self::new(Vec::new(), rules, false, NodeInfo::none());
        rs.root.set(true);
        rs.first_root.set(true);
        rs.allow_imports.set(true);
        Rc::new(rs)
    }

    /// A selector-less ruleset used as a synthetic scope (mixin call
    /// frames, detached bodies).
    pub fn anonymous(rules: Vec<Node>) -> Rc<Self> {
        Rc::new(Self::new(Vec::new(), rules, false, NodeInfo::none()))
    }

    /// Drop every lazily-built cache. Must follow any in-place mutation
    /// of `rules`.
    pub fn reset_cache(&self) {
        self.caches.replace(None);
        self.lookups.borrow_mut().clear();
    }

    /// Replace the rule at `index` with `replacement`, invalidating caches.
    pub fn splice_rules(&self, index: usize, replacement: Vec<Node>) {
        let mut rules = self.rules.borrow_mut();
        rules.splice(index..index + 1, replacement);
        drop(rules);
        self.reset_cache();
    }

    /// Prepend a rule (used when binding mixin parameters into a frame).
    pub fn prepend_rule(&self, rule: Node) {
        self.rules.borrow_mut().insert(0, rule);
        self.reset_cache();
    }

    fn with_caches<R>(&self, f: impl FnOnce(&ScopeCaches) -> R) -> R {
        {
            let caches = self.caches.borrow();
            if let Some(caches) = caches.as_ref() {
                return f(caches);
            }
        }
        let built = self.build_caches();
        let result = f(&built);
        self.caches.replace(Some(built));
        result
    }

    fn build_caches(&self) -> ScopeCaches {
        let mut caches = ScopeCaches::default();
        for rule in self.rules.borrow().iter() {
            match rule {
                Node::Declaration(decl) => {
                    if let Some(name) = decl.name_str() {
                        if decl.variable {
                            caches.variables.insert(name.to_string(), decl.clone());
                        } else {
                            caches
                                .properties
                                .entry(name.to_string())
                                .or_default()
                                .push(decl.clone());
                        }
                    }
                }
                // Variables exported by a resolved import join this scope
                Node::Import(import) => {
                    if let Some(root) = &import.root {
                        root.with_caches(|imported| {
                            for (name, decl) in &imported.variables {
                                caches.variables.insert(name.clone(), decl.clone());
                            }
                        });
                    }
                }
                _ => {}
            }
        }
        caches
    }

    /// Look up a variable declaration in this scope only.
    pub fn variable(&self, name: &str) -> Option<Rc<Declaration>> {
        self.with_caches(|caches| caches.variables.get(name).cloned())
    }

    /// Look up the declarations of a property in this scope only.
    pub fn property(&self, name: &str) -> Option<Vec<Rc<Declaration>>> {
        self.with_caches(|caches| caches.properties.get(name).cloned())
    }

    /// The nested rulesets and mixin definitions of this scope.
    pub fn rulesets(&self) -> Vec<Node> {
        self.rules
            .borrow()
            .iter()
            .filter(|r| matches!(r, Node::Ruleset(_) | Node::MixinDefinition(_)))
            .cloned()
            .collect()
    }

    /// Find mixin candidates matching `selector`, recursing into matched
    /// namespaces. Results are cached per selector text.
    pub fn find(self: &Rc<Self>, selector: &Selector, exclude: Option<&Rc<Ruleset>>) -> Vec<FoundMixin> {
        let key = selector.to_css_string(&mut CssContext::default());
        if let Some(cached) = self.lookups.borrow().get(&key) {
            return cached.clone();
        }
        let exclude = exclude.or(Some(self));
        let mut found = Vec::new();

        for rule in self.rulesets() {
            if let Node::Ruleset(rs) = &rule {
                if exclude.map(|e| Rc::ptr_eq(e, rs)).unwrap_or(false) {
                    continue;
                }
            }
            let (rule_selectors, inner_scope): (Vec<Rc<Selector>>, Rc<Ruleset>) = match &rule {
                Node::Ruleset(rs) => (rs.selectors.clone(), rs.clone()),
                Node::MixinDefinition(md) => (vec![md.selector.clone()], md.scope.clone()),
                _ => continue,
            };
            for rule_selector in &rule_selectors {
                let matched = selector.match_against(rule_selector);
                if matched == 0 {
                    continue;
                }
                if selector.elements.len() > matched {
                    let remaining = Selector::new(
                        selector.elements[matched..].to_vec(),
                        Vec::new(),
                        None,
                        selector.info.clone(),
                    );
                    let mut nested = inner_scope.find(&remaining, exclude);
                    for hit in &mut nested {
                        hit.path.push(rule.clone());
                    }
                    found.extend(nested);
                } else {
                    found.push(FoundMixin { rule: rule.clone(), path: Vec::new() });
                }
                break;
            }
        }

        self.lookups.borrow_mut().insert(key, found.clone());
        found
    }

    /// A structurally new ruleset whose rules all carry `!important`.
    pub fn make_important(&self) -> Ruleset {
        let rules = self
            .rules
            .borrow()
            .iter()
            .map(|r| r.make_important())
            .collect();
        let copy = Ruleset::new(self.selectors.clone(), rules, self.strict_imports, self.info.clone());
        copy.root.set(self.root.get());
        copy.first_root.set(self.first_root.get());
        copy.allow_imports.set(self.allow_imports.get());
        copy.original.replace(self.original.borrow().clone());
        copy
    }

    /// `match_args` for a plain ruleset called as a mixin: only a call
    /// with no arguments matches.
    pub fn match_args_empty(args_len: usize) -> bool {
        args_len == 0
    }

    /// Whether `node` serializes as a block (affects separator emission).
    pub fn is_ruleset_like(node: &Node) -> bool {
        match node {
            Node::Ruleset(_) | Node::Media(_) => true,
            Node::AtRule(at) => at.rules.is_some(),
            _ => false,
        }
    }
}

impl GenCss for Ruleset {
    fn gen_css(&self, ctx: &mut CssContext, output: &mut Output) {
        if self.info.blocks_visibility() && !self.info.is_visible().unwrap_or(false) {
            return;
        }
        let root = self.root.get();
        if !root {
            ctx.tab_level += 1;
        }
        let (tab_rule, tab_set) = if ctx.compress {
            (String::new(), String::new())
        } else {
            (
                "  ".repeat(ctx.tab_level),
                "  ".repeat(ctx.tab_level.saturating_sub(1)),
            )
        };

        // Order output: imports float to the front; silent comments and
        // extends are dropped entirely.
        let rules = self.rules.borrow();
        let mut rule_nodes: Vec<Node> = Vec::new();
        let mut import_index = 0;
        for rule in rules.iter() {
            match rule {
                Node::Comment(c) if c.is_silent(ctx.compress) => continue,
                Node::Extend(_) => continue,
                Node::Import(_) => {
                    rule_nodes.insert(import_index, rule.clone());
                    import_index += 1;
                }
                _ => rule_nodes.push(rule.clone()),
            }
        }
        let has_only_extends = !root && !rules.is_empty() && rule_nodes.is_empty();
        drop(rules);

        let paths = self.paths.borrow();
        let is_media_empty =
            !root && paths.is_empty() && self.selectors.len() == 1 && self.selectors[0].media_empty;

        if !root && !is_media_empty && !has_only_extends {
            let sep = if ctx.compress {
                ",".to_string()
            } else {
                format!(",\n{tab_set}")
            };
            if !paths.is_empty() {
                let mut first = true;
                for path in paths.iter() {
                    if path.is_empty() {
                        continue;
                    }
                    if !first {
                        output.add_str(sep.clone());
                    }
                    first = false;
                    ctx.first_selector = true;
                    path[0].gen_css(ctx, output);
                    ctx.first_selector = false;
                    for selector in &path[1..] {
                        selector.gen_css(ctx, output);
                    }
                }
            } else {
                // Join pass has not run (media bodies); emit raw selectors
                for (i, selector) in self.selectors.iter().enumerate() {
                    if i > 0 {
                        output.add_str(sep.clone());
                    }
                    ctx.first_selector = true;
                    selector.gen_css(ctx, output);
                    ctx.first_selector = false;
                }
            }
            output.add_str(if ctx.compress { "{" } else { " {\n" });
            output.add_str(tab_rule.clone());
        }
        drop(paths);

        if !has_only_extends {
            for (i, rule) in rule_nodes.iter().enumerate() {
                if i + 1 == rule_nodes.len() {
                    ctx.last_rule = true;
                }
                let current_last = ctx.last_rule;
                if Ruleset::is_ruleset_like(rule) {
                    ctx.last_rule = false;
                }
                rule.gen_css(ctx, output);
                ctx.last_rule = current_last;
                if !ctx.last_rule && rule.is_output_visible() {
                    if !ctx.compress {
                        output.add_str(format!("\n{tab_rule}"));
                    }
                } else {
                    ctx.last_rule = false;
                }
            }
        }

        if !root {
            ctx.tab_level -= 1;
            if !is_media_empty && !has_only_extends {
                output.add_str(if ctx.compress {
                    "}".to_string()
                } else {
                    format!("\n{tab_set}}}")
                });
            }
        }

        if !output.is_empty() && !ctx.compress && self.first_root.get() {
            output.add_str("\n");
        }
    }
}
