//! Function registry shared across evaluation scopes
//!
//! Every evaluated ruleset inherits a registry from its nearest enclosing
//! frame, so `@plugin`-style registration in an inner scope can shadow an
//! outer function without mutating the parent registry.

use std::rc::Rc;

use dashmap::DashMap;

use crate::context::EvalContext;
use crate::error::Result;
use crate::tree::Node;

/// A built-in function callable from evaluated expressions.
///
/// Arguments arrive already evaluated; the function returns the node that
/// replaces the call site.
pub type BuiltinFn = fn(&[Node], &mut EvalContext) -> Result<Node>;

/// Name→function map with parent-chain inheritance.
#[derive(Debug, Default)]
pub struct Registry {
    data: DashMap<String, BuiltinFn>,
    parent: Option<Rc<Registry>>,
}

impl Registry {
    /// Create an empty root registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The default registry seeded with the core functions.
    ///
    /// `_SELF` is the deferred-evaluation shim that variable references
    /// turn into inside `calc()`.
    pub fn with_core_functions() -> Self {
        let registry = Self::new();
        registry.add("_SELF", |args, _ctx| {
            Ok(args.first().cloned().unwrap_or_else(Node::empty_anonymous))
        });
        registry
    }

    /// Register a function under `name` (case-insensitive lookup).
    pub fn add(&self, name: &str, func: BuiltinFn) {
        self.data.insert(name.to_ascii_lowercase(), func);
    }

    /// Look up a function here or in any ancestor registry.
    pub fn get(&self, name: &str) -> Option<BuiltinFn> {
        let key = name.to_ascii_lowercase();
        if let Some(entry) = self.data.get(&key) {
            return Some(*entry);
        }
        self.parent.as_ref().and_then(|p| p.get(&key))
    }

    /// Create a child registry that falls back to `self` on misses.
    pub fn inherit(self: &Rc<Self>) -> Rc<Registry> {
        Rc::new(Registry { data: DashMap::new(), parent: Some(self.clone()) })
    }
}
