//! Error types for Bracken evaluation

use thiserror::Error;

/// Main error type for Bracken evaluation.
///
/// Every error that can surface from `eval` carries enough context
/// (name, source index, filename) for a single top-level diagnostic.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// A variable reference could not be resolved in any frame
    #[error("variable {name} is undefined (index: {index}, filename: {filename})")]
    UndefinedVariable {
        /// Variable name including the `@` sigil
        name: String,
        /// Source index of the reference
        index: usize,
        /// File the reference came from
        filename: String,
    },

    /// A property reference (`$name`) could not be resolved in any frame
    #[error("property '{name}' is undefined (index: {index}, filename: {filename})")]
    UndefinedProperty {
        /// Property name
        name: String,
        /// Source index of the reference
        index: usize,
        /// File the reference came from
        filename: String,
    },

    /// A variable definition refers to itself while being evaluated
    #[error("recursive variable definition for {name} (index: {index}, filename: {filename})")]
    RecursiveVariable {
        /// Variable name including the `@` sigil
        name: String,
        /// Source index of the definition
        index: usize,
        /// File the definition came from
        filename: String,
    },

    /// A property reference re-entered its own evaluation
    #[error("recursive property reference for {name} (index: {index}, filename: {filename})")]
    RecursiveProperty {
        /// Property name
        name: String,
        /// Source index of the reference
        index: usize,
        /// File the reference came from
        filename: String,
    },

    /// No mixin with the called name is in scope
    #[error("{call} is undefined (index: {index}, filename: {filename})")]
    UndefinedMixin {
        /// Formatted call, e.g. `.m(1, 2)`
        call: String,
        /// Source index of the call
        index: usize,
        /// File the call came from
        filename: String,
    },

    /// Mixins with the name exist but none accepted the arguments
    #[error("no matching definition was found for `{call}` (index: {index}, filename: {filename})")]
    NoMatchingDefinition {
        /// Formatted call, e.g. `.m(1, 2)`
        call: String,
        /// Source index of the call
        index: usize,
        /// File the call came from
        filename: String,
    },

    /// A named argument does not correspond to any mixin parameter
    #[error("named argument for {mixin} {name} not found")]
    UnknownNamedArgument {
        /// Mixin name
        mixin: String,
        /// Argument name including the `@` sigil
        name: String,
    },

    /// Too few or too many arguments were supplied to a mixin
    #[error("wrong number of arguments for {mixin} ({given} for {expected})")]
    WrongArgumentCount {
        /// Mixin name
        mixin: String,
        /// Number of arguments supplied
        given: usize,
        /// Number of parameters declared
        expected: usize,
    },

    /// More than one candidate relied on `default()` to disambiguate
    #[error("ambiguous use of `default()` found when matching for `{call}` (index: {index}, filename: {filename})")]
    AmbiguousDefault {
        /// Formatted call
        call: String,
        /// Source index of the call
        index: usize,
        /// File the call came from
        filename: String,
    },

    /// `default()` was used outside a parametric mixin guard
    #[error("default() is only allowed in parametric mixin guards")]
    DefaultOutsideGuard,

    /// A detached ruleset was used where only a plain value is legal
    #[error("rulesets cannot be evaluated on a property")]
    RulesetOnProperty,

    /// A bare declaration appeared at the document root
    #[error("properties must be inside selector blocks, they cannot be in the root (index: {index}, filename: {filename})")]
    DeclarationAtRoot {
        /// Source index of the declaration
        index: usize,
        /// File the declaration came from
        filename: String,
    },

    /// A variable call did not resolve to anything ruleset-shaped
    #[error("could not evaluate variable call {name}")]
    VariableCallFailed {
        /// Variable name including the `@` sigil
        name: String,
    },

    /// An operation was attempted between incompatible evaluated nodes
    #[error("operation '{op}' cannot be applied between {left} and {right}")]
    InvalidOperation {
        /// Operator token
        op: String,
        /// Kind of the left operand
        left: String,
        /// Kind of the right operand
        right: String,
    },

    /// Incompatible units in an arithmetic operation
    #[error("incompatible units: '{left}' and '{right}'")]
    IncompatibleUnits {
        /// Left-hand unit
        left: String,
        /// Right-hand unit
        right: String,
    },

    /// The mixin call-depth budget was exhausted
    #[error("mixin call recursion limit of {max} exceeded")]
    MixinDepthExceeded {
        /// Configured maximum depth
        max: usize,
    },

    /// Extend chaining failed to reach a fixed point
    #[error("extend circular reference detected, one of the circular extends is currently: {selector}:extend({target})")]
    ExtendCircular {
        /// Self selector of one circular extend
        selector: String,
        /// Its target selector
        target: String,
    },
}

/// Result type alias for Bracken evaluation.
pub type Result<T> = std::result::Result<T, EvalError>;
