//! Evaluation context: frame stack, selector stack, accumulators
//!
//! The context replaces the original's untyped key/value scope chain with
//! typed state. Every stack is pushed and popped through closure-scoped
//! guards, so an `Err` bubbling out of a nested evaluation can never leave
//! a stack imbalanced.

use std::cell::Cell;
use std::rc::Rc;

use crate::registry::Registry;
use crate::tree::{Declaration, FoundMixin, Media, MixinDefinition, Ruleset, Selector};

/// Arithmetic mode, controlling when `/` and friends evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MathMode {
    /// Operations always evaluate
    #[default]
    Always,
    /// Division evaluates only inside parentheses
    ParensDivision,
    /// All operations require parentheses
    Parens,
}

/// State backing the `default()` function in mixin guards.
///
/// Mixin-call resolution evaluates each candidate's guard twice, once per
/// assumed `default()` result; outside that window the value is unset and
/// using `default()` in a ruleset guard arms an error instead.
#[derive(Debug, Default)]
pub struct DefaultFunc {
    value: Cell<Option<bool>>,
    error_armed: Cell<bool>,
}

impl DefaultFunc {
    /// Assume a `default()` result while probing a guard.
    pub fn set(&self, value: Option<bool>) {
        self.value.set(value);
    }

    /// Arm the misuse error (set while ruleset selectors evaluate).
    pub fn arm_error(&self) {
        self.error_armed.set(true);
    }

    /// Clear both the assumed value and the armed error.
    pub fn reset(&self) {
        self.value.set(None);
        self.error_armed.set(false);
    }

    /// The current `default()` result: `Err` when armed, `None` when
    /// called outside mixin matching.
    pub fn eval(&self) -> crate::error::Result<Option<bool>> {
        if self.error_armed.get() {
            return Err(crate::error::EvalError::DefaultOutsideGuard);
        }
        Ok(self.value.get())
    }
}

/// A scope participating in the lexical lookup chain.
///
/// Mixin definitions join the chain during their own calls; lookups on
/// them go through the definition's body scope.
#[derive(Debug, Clone)]
pub enum Frame {
    /// An (in-progress) evaluated ruleset
    Ruleset(Rc<Ruleset>),
    /// A mixin definition pushed while its body evaluates
    Mixin(Rc<MixinDefinition>),
}

impl Frame {
    /// The ruleset that backs lookups on this frame.
    pub fn scope(&self) -> &Rc<Ruleset> {
        match self {
            Frame::Ruleset(rs) => rs,
            Frame::Mixin(md) => &md.scope,
        }
    }

    /// Variable lookup in this frame only.
    pub fn variable(&self, name: &str) -> Option<Rc<Declaration>> {
        self.scope().variable(name)
    }

    /// Property lookup in this frame only.
    pub fn property(&self, name: &str) -> Option<Vec<Rc<Declaration>>> {
        self.scope().property(name)
    }

    /// Mixin lookup in this frame only.
    pub fn find(&self, selector: &Selector) -> Vec<FoundMixin> {
        self.scope().find(selector, None)
    }

    /// Registry carried by this frame, if any.
    pub fn registry(&self) -> Option<Rc<Registry>> {
        self.scope().function_registry.borrow().clone()
    }

    /// The pre-eval ruleset this frame was evaluated from, or the frame's
    /// own scope. Used by the mixin recursion guard.
    pub fn original_scope(&self) -> Rc<Ruleset> {
        let scope = self.scope();
        scope.original.borrow().clone().unwrap_or_else(|| scope.clone())
    }
}

/// Options for a single evaluation run.
///
/// Strict-import mode is a per-ruleset flag set by the parser at
/// construction, not a run option.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Compressed output
    pub compress: bool,
    /// Arithmetic mode
    pub math: MathMode,
}

/// Mutable state threaded through every `eval` call.
#[derive(Debug)]
pub struct EvalContext {
    // Stored outermost-first; lookups iterate innermost-first.
    frames: Vec<Frame>,
    selectors: Vec<Vec<Rc<Selector>>>,
    important_scope: Vec<Option<String>>,
    media_blocks: Option<Vec<Rc<Media>>>,
    media_path: Vec<Rc<Media>>,
    parens_depth: usize,
    calc_depth: usize,
    /// Arithmetic mode
    pub math: MathMode,
    /// Master switch for arithmetic (off inside plain declarations when
    /// the mode demands parentheses)
    pub math_on: bool,
    /// Compressed output (threaded into CSS comparisons during matching)
    pub compress: bool,
    /// `default()` state for mixin guards
    pub default_func: DefaultFunc,
    /// Root function registry
    pub function_registry: Rc<Registry>,
    /// Current mixin call depth
    pub mixin_depth: usize,
    /// Budget for mixin call depth
    pub max_mixin_depth: usize,
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl EvalContext {
    /// Fresh context for one evaluation run.
    pub fn new(options: Options) -> Self {
        Self {
            frames: Vec::new(),
            selectors: Vec::new(),
            important_scope: Vec::new(),
            media_blocks: None,
            media_path: Vec::new(),
            parens_depth: 0,
            calc_depth: 0,
            math: options.math,
            math_on: true,
            compress: options.compress,
            default_func: DefaultFunc::default(),
            function_registry: Rc::new(Registry::with_core_functions()),
            mixin_depth: 0,
            max_mixin_depth: 500,
        }
    }

    // ── Frames ─────────────────────────────────────────────────────────

    /// The frame stack, outermost-first.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Lookup-ordered iteration: innermost scope first.
    pub fn frames_innermost_first(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter().rev()
    }

    /// Run `f` with `frame` pushed as the innermost scope.
    pub fn with_frame<R>(&mut self, frame: Frame, f: impl FnOnce(&mut Self) -> R) -> R {
        self.frames.push(frame);
        let result = f(self);
        self.frames.pop();
        result
    }

    /// Run `f` with the frame stack replaced wholesale (mixin calls build
    /// their stack from the captured closure, not the call site).
    pub fn with_frame_stack<R>(&mut self, stack: Vec<Frame>, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = std::mem::replace(&mut self.frames, stack);
        let result = f(self);
        self.frames = saved;
        result
    }

    // ── Selector stack ─────────────────────────────────────────────────

    /// Run `f` with a scope's selector list pushed for `&` joining.
    pub fn with_selectors<R>(
        &mut self,
        selectors: Vec<Rc<Selector>>,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        self.selectors.push(selectors);
        let result = f(self);
        self.selectors.pop();
        result
    }

    /// The selector stack, outermost-first.
    pub fn selector_stack(&self) -> &[Vec<Rc<Selector>>] {
        &self.selectors
    }

    // ── Important scope ────────────────────────────────────────────────

    /// Run `f` under a fresh important-propagation scope, returning its
    /// captured `!important` (if any variable carried one) with `f`'s
    /// result.
    pub fn with_important_scope<R>(
        &mut self,
        f: impl FnOnce(&mut Self) -> R,
    ) -> (R, Option<String>) {
        self.important_scope.push(None);
        let result = f(self);
        let captured = self.important_scope.pop().flatten();
        (result, captured)
    }

    /// Record an `!important` seen while resolving a variable.
    pub fn set_important(&mut self, important: String) {
        if let Some(top) = self.important_scope.last_mut() {
            *top = Some(important);
        }
    }

    // ── Media accumulator ──────────────────────────────────────────────

    /// Number of accumulated media blocks (for the bubbling window).
    pub fn media_block_count(&self) -> usize {
        self.media_blocks.as_ref().map_or(0, Vec::len)
    }

    /// Append an evaluated media block, initializing the accumulator.
    pub fn push_media_block(&mut self, media: Rc<Media>) {
        self.media_blocks.get_or_insert_with(Vec::new).push(media);
    }

    /// Remove the media block at `index` (nested blocks of another type).
    pub fn remove_media_block(&mut self, index: usize) {
        if let Some(blocks) = &mut self.media_blocks {
            if index < blocks.len() {
                blocks.remove(index);
            }
        }
    }

    /// Bubble every media block accumulated after `start` up through the
    /// given selectors.
    pub fn bubble_media_blocks(&mut self, start: usize, selectors: &[Rc<Selector>]) {
        if let Some(blocks) = &self.media_blocks {
            for media in blocks.iter().skip(start) {
                media.bubble_selectors(selectors);
            }
        }
    }

    /// Take and clear the media accumulator (done by `eval_top`).
    pub fn take_media_blocks(&mut self) -> Vec<Rc<Media>> {
        self.media_blocks.take().unwrap_or_default()
    }

    /// Run `f` with `media` pushed onto the nested-media path.
    pub fn with_media_path<R>(&mut self, media: Rc<Media>, f: impl FnOnce(&mut Self) -> R) -> R {
        self.media_path.push(media);
        let result = f(self);
        self.media_path.pop();
        result
    }

    /// Nesting depth of the media currently evaluating.
    pub fn media_path(&self) -> &[Rc<Media>] {
        &self.media_path
    }

    // ── Math / calc ────────────────────────────────────────────────────

    /// Run `f` inside one more level of parentheses.
    pub fn in_parens<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.parens_depth += 1;
        let result = f(self);
        self.parens_depth -= 1;
        result
    }

    /// Run `f` inside a `calc()` argument.
    pub fn in_calc<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.calc_depth += 1;
        let result = f(self);
        self.calc_depth -= 1;
        result
    }

    /// Whether variable references must defer (`calc()` argument order).
    pub fn is_in_calc(&self) -> bool {
        self.calc_depth > 0
    }

    /// Whether the operator may evaluate under the current mode.
    pub fn is_math_on(&self, op: &str) -> bool {
        if !self.math_on {
            return false;
        }
        if op == "/" && self.math != MathMode::Always && self.parens_depth == 0 {
            return false;
        }
        if self.math == MathMode::Parens {
            return self.parens_depth > 0;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_stack_restores_after_scope() {
        let mut ctx = EvalContext::default();
        let scope = Frame::Ruleset(Ruleset::anonymous(Vec::new()));
        assert_eq!(ctx.frames().len(), 0);
        ctx.with_frame(scope, |ctx| {
            assert_eq!(ctx.frames().len(), 1);
        });
        assert_eq!(ctx.frames().len(), 0);
    }

    #[test]
    fn test_frame_stack_restores_on_error_path() {
        let mut ctx = EvalContext::default();
        let scope = Frame::Ruleset(Ruleset::anonymous(Vec::new()));
        let result: crate::error::Result<()> = ctx.with_frame(scope, |_ctx| {
            Err(crate::error::EvalError::RulesetOnProperty)
        });
        assert!(result.is_err());
        assert_eq!(ctx.frames().len(), 0);
    }

    #[test]
    fn test_math_mode_gates_division_outside_parens() {
        let mut ctx = EvalContext::new(Options { math: MathMode::ParensDivision, ..Default::default() });
        assert!(!ctx.is_math_on("/"));
        assert!(ctx.is_math_on("+"));
        let inside = ctx.in_parens(|ctx| ctx.is_math_on("/"));
        assert!(inside);
    }

    #[test]
    fn test_default_func_outside_matching_errors_when_armed() {
        let ctx = EvalContext::default();
        assert_eq!(ctx.default_func.eval(), Ok(None));
        ctx.default_func.arm_error();
        assert!(ctx.default_func.eval().is_err());
        ctx.default_func.reset();
        ctx.default_func.set(Some(true));
        assert_eq!(ctx.default_func.eval(), Ok(Some(true)));
    }
}
