//! Mixin definitions and calls

use std::cell::RefCell;
use std::rc::Rc;

use crate::context::Frame;
use crate::output::CssContext;
use crate::output::GenCss;
use crate::tree::{Combinator, Element, ElementValue, Node, NodeInfo, Ruleset, Selector};

/// One declared mixin parameter.
#[derive(Debug, Clone)]
pub struct Param {
    /// Parameter name including the `@` sigil; `None` for pattern params
    pub name: Option<String>,
    /// Default value, or the pattern literal for unnamed params
    pub value: Option<Node>,
    /// Whether this parameter captures all trailing arguments
    pub variadic: bool,
}

impl Param {
    /// A required named parameter.
    pub fn required(name: &str) -> Self {
        Self { name: Some(name.to_string()), value: None, variadic: false }
    }

    /// A named parameter with a default.
    pub fn optional(name: &str, default: Node) -> Self {
        Self { name: Some(name.to_string()), value: Some(default), variadic: false }
    }

    /// A pattern parameter matched by literal value.
    pub fn pattern(value: Node) -> Self {
        Self { name: None, value: Some(value), variadic: false }
    }

    /// A variadic rest parameter.
    pub fn rest(name: &str) -> Self {
        Self { name: Some(name.to_string()), value: None, variadic: true }
    }
}

/// A mixin definition: parameters, guard, body and captured closure.
#[derive(Debug)]
pub struct MixinDefinition {
    /// Position and visibility info
    pub info: NodeInfo,
    /// Mixin name as written, e.g. `.mixin`
    pub name: String,
    /// The lookup selector built from the name
    pub selector: Rc<Selector>,
    /// Declared parameters in order
    pub params: Vec<Param>,
    /// Guard condition, if any
    pub condition: Option<Node>,
    /// Whether the last parameter is variadic
    pub variadic: bool,
    /// Number of declared parameters
    pub arity: usize,
    /// Parameters that must be supplied by the caller
    pub required: usize,
    /// Names of parameters carrying defaults
    pub optional_parameters: Vec<String>,
    /// Defining-scope closure, captured when the definition evaluates
    pub frames: RefCell<Option<Vec<Frame>>>,
    /// Scope view over the body, used when the definition sits on the
    /// frame stack during a call
    pub scope: Rc<Ruleset>,
    /// The plain ruleset this definition wraps, when a ruleset was called
    /// as a zero-parameter mixin
    pub wrapped: RefCell<Option<Rc<Ruleset>>>,
}

impl MixinDefinition {
    /// Build a definition; `required` counts parameters with no name or
    /// no default, `optional_parameters` collects the defaulted names.
    pub fn new(
        name: &str,
        params: Vec<Param>,
        rules: Vec<Node>,
        condition: Option<Node>,
        variadic: bool,
        info: NodeInfo,
    ) -> Self {
        let name = if name.is_empty() { "anonymous mixin" } else { name };
        let element = Element::new(
            Combinator::none(),
            ElementValue::Str(name.to_string()),
            false,
            info.clone(),
        );
        let selector = Rc::new(Selector::new(vec![Rc::new(element)], Vec::new(), None, info.clone()));
        let scope = Rc::new(Ruleset::new(vec![selector.clone()], rules, false, info.clone()));

        let arity = params.len();
        let mut required = 0;
        let mut optional_parameters = Vec::new();
        for param in &params {
            match (&param.name, &param.value) {
                (Some(name), Some(_)) => optional_parameters.push(name.clone()),
                _ => required += 1,
            }
        }

        Self {
            info,
            name: name.to_string(),
            selector,
            params,
            condition,
            variadic,
            arity,
            required,
            optional_parameters,
            frames: RefCell::new(None),
            scope,
            wrapped: RefCell::new(None),
        }
    }

    /// Wrap a plain ruleset so it can be called as a mixin.
    pub fn wrapping(ruleset: &Rc<Ruleset>) -> Self {
        let def = Self::new(
            "",
            Vec::new(),
            ruleset.rules.borrow().clone(),
            None,
            false,
            ruleset.info.clone(),
        );
        def.info.copy_visibility_from(&ruleset.info);
        def.wrapped.replace(Some(ruleset.clone()));
        def
    }

    /// The body rules (shared with `scope`).
    pub fn rules(&self) -> Vec<Node> {
        self.scope.rules.borrow().clone()
    }

    /// A structurally new definition whose body rules all carry
    /// `!important`.
    pub fn make_important(&self) -> MixinDefinition {
        let rules = self.rules().iter().map(|r| r.make_important()).collect();
        let copy = MixinDefinition::new(
            &self.name,
            self.params.clone(),
            rules,
            self.condition.clone(),
            self.variadic,
            self.info.clone(),
        );
        copy.frames.replace(self.frames.borrow().clone());
        copy.wrapped.replace(self.wrapped.borrow().clone());
        copy
    }
}

/// One argument at a mixin call site.
#[derive(Debug, Clone)]
pub struct Arg {
    /// Name for `@name: value` arguments, with the `@` sigil
    pub name: Option<String>,
    /// The argument value, unevaluated
    pub value: Node,
    /// `...` expansion: a list value splices into separate arguments
    pub expand: bool,
}

impl Arg {
    /// A positional argument.
    pub fn positional(value: Node) -> Self {
        Self { name: None, value, expand: false }
    }

    /// A named argument; `name` keeps its `@` sigil.
    pub fn named(name: &str, value: Node) -> Self {
        Self { name: Some(name.to_string()), value, expand: false }
    }
}

/// A mixin call statement.
#[derive(Debug)]
pub struct MixinCall {
    /// Position and visibility info
    pub info: NodeInfo,
    /// The called name (possibly namespaced, e.g. `#ns > .mixin`)
    pub selector: Rc<Selector>,
    /// Call arguments in order
    pub arguments: Vec<Arg>,
    /// Whether the call carries `!important`
    pub important: bool,
}

impl MixinCall {
    /// Build a call.
    pub fn new(selector: Rc<Selector>, arguments: Vec<Arg>, important: bool, info: NodeInfo) -> Self {
        Self { info, selector, arguments, important }
    }

    /// Format the call for diagnostics, e.g. `.m(1, @b: 2)`.
    pub fn format(&self, evaluated: &[(Option<String>, Node)]) -> String {
        let mut ctx = CssContext::default();
        let name = self.selector.to_css_string(&mut ctx).trim().to_string();
        let name = if name.is_empty() { "<empty selector>".to_string() } else { name };
        let args: Vec<String> = evaluated
            .iter()
            .map(|(arg_name, value)| {
                let css = value.to_css_string(&mut ctx);
                match arg_name {
                    Some(n) => format!("{n}: {css}"),
                    None => css,
                }
            })
            .collect();
        format!("{}({})", name, args.join(", "))
    }
}
