//! Selectors: ordered element sequences with guards and extend lists

use std::rc::Rc;

use once_cell::sync::Lazy;
use once_cell::unsync::OnceCell;
use regex::Regex;

use crate::output::{CssContext, GenCss, Output};
use crate::tree::{Combinator, Element, ElementValue, Extend, Node, NodeInfo};

// Tokenizes the flattened element text back into mixin-lookup parts,
// e.g. "#ns > .mixin" -> ["#ns", ".mixin"].
static MIXIN_ELEMENTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[,&#*.\w-]([\w-]|(\\.))*").expect("mixin element regex"));

/// A CSS selector: elements, an optional guard and an extend list.
///
/// Immutable once evaluated — `eval` returns a new `Selector`, never
/// mutates in place.
#[derive(Debug)]
pub struct Selector {
    /// Position and visibility info
    pub info: NodeInfo,
    /// Ordered combinator-qualified fragments
    pub elements: Vec<Rc<Element>>,
    /// `:extend(...)` clauses attached to this selector
    pub extend_list: Vec<Rc<Extend>>,
    /// `when (...)` guard, unevaluated
    pub condition: Option<Node>,
    /// Cached guard result; true when no guard is present
    pub evald_condition: bool,
    /// Marks the synthetic empty selector wrapped around media bodies
    pub media_empty: bool,
    mixin_elements: OnceCell<Vec<String>>,
}

impl Selector {
    /// Build a selector from parts. With no guard the cached condition
    /// result is true.
    pub fn new(
        elements: Vec<Rc<Element>>,
        extend_list: Vec<Rc<Extend>>,
        condition: Option<Node>,
        info: NodeInfo,
    ) -> Self {
        let evald_condition = condition.is_none();
        Self {
            info,
            elements,
            extend_list,
            condition,
            evald_condition,
            media_empty: false,
            mixin_elements: OnceCell::new(),
        }
    }

    /// A selector holding the single parent reference `&`.
    pub fn parent_ref(info: &NodeInfo) -> Rc<Self> {
        let el = Element::new(
            Combinator::none(),
            ElementValue::Str("&".into()),
            false,
            info.clone(),
        );
        Rc::new(Self::new(vec![Rc::new(el)], Vec::new(), None, info.clone()))
    }

    /// The synthetic empty selector that wraps media-query bodies.
    pub fn media_empty(info: &NodeInfo) -> Rc<Self> {
        let mut sel = Self::parent_ref(info);
        Rc::get_mut(&mut sel).expect("freshly created selector").media_empty = true;
        sel
    }

    /// Derive a new selector reusing this one's metadata.
    ///
    /// `extend_list` of `None` keeps the current list; `evald_condition`
    /// of `None` inherits the current cached guard result.
    pub fn create_derived(
        &self,
        elements: Vec<Rc<Element>>,
        extend_list: Option<Vec<Rc<Extend>>>,
        evald_condition: Option<bool>,
    ) -> Selector {
        let mut derived = Selector::new(
            elements,
            extend_list.unwrap_or_else(|| self.extend_list.clone()),
            None,
            self.info.clone(),
        );
        derived.evald_condition = evald_condition.unwrap_or(self.evald_condition);
        derived.media_empty = self.media_empty;
        derived
    }

    /// Whether the selector is syntactically a bare `&` (with at most a
    /// whitespace combinator), the shape unwrapped by the parent fold.
    pub fn is_just_parent_selector(&self) -> bool {
        if self.media_empty || self.elements.len() != 1 {
            return false;
        }
        let el = &self.elements[0];
        el.value.is_parent_ref() && el.combinator.empty_or_whitespace
    }

    /// The string parts used for mixin lookup, computed once.
    ///
    /// Elements are flattened to text and re-tokenized so `#ns.mixin`
    /// yields `["#ns", ".mixin"]`; a leading bare `&` is dropped.
    pub fn mixin_elements(&self) -> &[String] {
        self.mixin_elements.get_or_init(|| {
            let joined: String = self
                .elements
                .iter()
                .map(|el| {
                    let value = el.value.as_str().unwrap_or_default();
                    format!("{}{}", el.combinator.value, value)
                })
                .collect();
            let mut parts: Vec<String> = MIXIN_ELEMENTS
                .find_iter(&joined)
                .map(|m| m.as_str().to_string())
                .collect();
            if parts.first().map(String::as_str) == Some("&") {
                parts.remove(0);
            }
            parts
        })
    }

    /// Match this (call) selector against a definition selector.
    ///
    /// Returns the number of definition parts consumed, or zero on no
    /// match. A positive count smaller than this selector's element count
    /// means the remainder must match inside the found namespace.
    pub fn match_against(&self, other: &Selector) -> usize {
        let other_parts = other.mixin_elements();
        if other_parts.is_empty() || self.elements.len() < other_parts.len() {
            return 0;
        }
        for (element, part) in self.elements.iter().zip(other_parts) {
            let value = element.value.as_str().unwrap_or_default();
            if value != part.as_str() {
                return 0;
            }
        }
        other_parts.len()
    }

    /// Whether this selector participates in output (guard passed).
    pub fn is_output(&self) -> bool {
        self.evald_condition
    }

    /// Whether this selector path member is visible to CSS generation.
    pub fn is_path_visible(&self) -> bool {
        if self.info.blocks_visibility() {
            self.info.is_visible().unwrap_or(false)
        } else {
            self.info.is_visible().unwrap_or(true)
        }
    }
}

impl GenCss for Selector {
    fn gen_css(&self, ctx: &mut CssContext, output: &mut Output) {
        if !ctx.first_selector {
            if let Some(first) = self.elements.first() {
                if first.combinator.value.is_empty() {
                    output.add(" ", self.info.file.clone(), Some(self.info.index));
                }
            }
        }
        for element in &self.elements {
            element.gen_css(ctx, output);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(combinator: &str, value: &str) -> Rc<Element> {
        Rc::new(Element::new(
            Combinator::new(combinator),
            ElementValue::Str(value.to_string()),
            false,
            NodeInfo::none(),
        ))
    }

    fn selector(parts: &[(&str, &str)]) -> Selector {
        let elements = parts.iter().map(|(c, v)| element(c, v)).collect();
        Selector::new(elements, Vec::new(), None, NodeInfo::none())
    }

    #[test]
    fn test_mixin_elements_tokenizes_namespaces() {
        let sel = selector(&[("", "#ns"), (">", ".mixin")]);
        assert_eq!(sel.mixin_elements(), ["#ns", ".mixin"]);
    }

    #[test]
    fn test_mixin_elements_drops_leading_parent_ref() {
        let sel = selector(&[("", "&"), ("", ".m")]);
        assert_eq!(sel.mixin_elements(), [".m"]);
    }

    #[test]
    fn test_match_against_counts_consumed_parts() {
        let call = selector(&[("", "#ns"), ("", ".mixin")]);
        let def = selector(&[("", "#ns")]);
        assert_eq!(call.match_against(&def), 1);
    }

    #[test]
    fn test_match_against_rejects_mismatch() {
        let call = selector(&[("", ".other")]);
        let def = selector(&[("", ".mixin")]);
        assert_eq!(call.match_against(&def), 0);
    }

    #[test]
    fn test_is_just_parent_selector() {
        assert!(selector(&[("", "&")]).is_just_parent_selector());
        assert!(selector(&[(" ", "&")]).is_just_parent_selector());
        assert!(!selector(&[(">", "&")]).is_just_parent_selector());
        assert!(!selector(&[("", "&"), ("", ":hover")]).is_just_parent_selector());
        assert!(!Selector::media_empty(&NodeInfo::none()).is_just_parent_selector());
    }
}
