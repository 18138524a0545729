//! Reference nodes: variables, properties, variable calls, detached rulesets

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::context::Frame;
use crate::tree::{NodeInfo, Ruleset};

/// A `@name` reference, resolved against the frame stack at eval time.
#[derive(Debug)]
pub struct Variable {
    /// Position info
    pub info: NodeInfo,
    /// Name including the `@` sigil (so `@@indirect` is representable)
    pub name: String,
    /// Re-entrancy flag: set while this reference evaluates, turning
    /// self-reference into an error instead of unbounded recursion
    pub evaluating: Cell<bool>,
}

impl Variable {
    /// Build a reference; `name` keeps its `@` sigil.
    pub fn new(name: impl Into<String>, info: NodeInfo) -> Self {
        Self { info, name: name.into(), evaluating: Cell::new(false) }
    }
}

/// A `$name` reference to a previously declared property value.
#[derive(Debug)]
pub struct Property {
    /// Position info
    pub info: NodeInfo,
    /// Property name without a sigil
    pub name: String,
    /// Re-entrancy flag, as on [`Variable`]
    pub evaluating: Cell<bool>,
}

impl Property {
    /// Build a property reference.
    pub fn new(name: impl Into<String>, info: NodeInfo) -> Self {
        Self { info, name: name.into(), evaluating: Cell::new(false) }
    }
}

/// A `@name()` call expanding a detached ruleset in place.
#[derive(Debug)]
pub struct VariableCall {
    /// Position info
    pub info: NodeInfo,
    /// Variable name including the `@` sigil
    pub name: String,
}

impl VariableCall {
    /// Build a variable call.
    pub fn new(name: impl Into<String>, info: NodeInfo) -> Self {
        Self { info, name: name.into() }
    }
}

/// A ruleset value stored in a variable, evaluated later against the
/// frames captured at its definition site.
#[derive(Debug)]
pub struct DetachedRuleset {
    /// Position info
    pub info: NodeInfo,
    /// The stored body
    pub ruleset: Rc<Ruleset>,
    /// Frames captured when the detached ruleset itself evaluated
    pub frames: RefCell<Option<Vec<Frame>>>,
}

impl DetachedRuleset {
    /// Wrap a ruleset body with no captured frames yet.
    pub fn new(ruleset: Rc<Ruleset>, info: NodeInfo) -> Self {
        Self { info, ruleset, frames: RefCell::new(None) }
    }

    /// Wrap with an explicit closure.
    pub fn with_frames(ruleset: Rc<Ruleset>, frames: Vec<Frame>, info: NodeInfo) -> Self {
        Self { info, ruleset, frames: RefCell::new(Some(frames)) }
    }
}
