//! The `:extend` node

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::tree::{NodeInfo, Ruleset, Selector};

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

/// Match option on an extend target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendOption {
    /// The target must match a whole selector path
    Exact,
    /// `all`: the target may match anywhere inside a path
    All,
}

/// An `:extend(target)` directive.
///
/// The identity and parent-id fields exist for the two-pass resolution:
/// each extend synthesized while chaining carries the ids of every extend
/// it descends from, and a pair is skipped when the target's id is
/// already among the source's parents.
#[derive(Debug)]
pub struct Extend {
    /// Position and visibility info
    pub info: NodeInfo,
    /// The selector being extended
    pub selector: Rc<Selector>,
    /// Match option
    pub option: ExtendOption,
    /// Unique id of this extend
    pub object_id: usize,
    /// Ids of every extend this one was chained from, self included
    pub parent_ids: RefCell<Vec<usize>>,
    /// Whether elements may precede the match
    pub allow_before: bool,
    /// Whether elements may follow the match
    pub allow_after: bool,
    /// The full selector paths this extend applies from, found by the
    /// find pass
    pub self_selectors: RefCell<Vec<Rc<Selector>>>,
    /// The ruleset declaring this extend, set by the find pass
    pub ruleset: RefCell<Option<Rc<Ruleset>>>,
    /// True on the first extend found for a selector path, so chained
    /// paths are added only once
    pub first_extend_on_this_selector_path: Cell<bool>,
    /// Whether the apply pass matched this extend anywhere
    pub has_found_matches: Cell<bool>,
}

impl Extend {
    /// Build an extend on a target selector.
    pub fn new(selector: Rc<Selector>, option: ExtendOption, info: NodeInfo) -> Self {
        let object_id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        let (allow_before, allow_after) = match option {
            ExtendOption::All => (true, true),
            ExtendOption::Exact => (false, false),
        };
        Self {
            info,
            selector,
            option,
            object_id,
            parent_ids: RefCell::new(vec![object_id]),
            allow_before,
            allow_after,
            self_selectors: RefCell::new(Vec::new()),
            ruleset: RefCell::new(None),
            first_extend_on_this_selector_path: Cell::new(false),
            has_found_matches: Cell::new(false),
        }
    }

    /// A fresh copy with its own identity, used when the find pass clones
    /// list entries per selector path.
    pub fn clone_fresh(&self) -> Extend {
        let copy = Extend::new(self.selector.clone(), self.option, self.info.clone());
        copy.info.copy_visibility_from(&self.info);
        copy
    }

    /// Concatenate a selector path into the single self selector this
    /// extend replaces from.
    pub fn find_self_selectors(&self, path: &[Rc<Selector>]) {
        let mut elements = Vec::new();
        for (i, selector) in path.iter().enumerate() {
            let mut selector_elements = selector.elements.clone();
            if i > 0 {
                if let Some(first) = selector_elements.first_mut() {
                    if first.combinator.value.is_empty() {
                        let mut el = (**first).clone();
                        el.combinator = crate::tree::Combinator::descendant();
                        *first = Rc::new(el);
                    }
                }
            }
            elements.extend(selector_elements);
        }
        let joined = Selector::new(elements, Vec::new(), None, self.info.clone());
        joined.info.copy_visibility_from(&self.info);
        self.self_selectors.replace(vec![Rc::new(joined)]);
    }
}
