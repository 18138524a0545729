//! Two-pass `:extend` resolution
//!
//! The find pass walks every non-root ruleset, collects extends from
//! rule bodies and selector extend lists, computes each extend's full
//! self selector, and stacks them per enclosing media/at-rule scope.
//! The apply pass first chains extends (an extend may target an already
//! extended selector; termination is guarded by the parent-id set plus
//! an iteration budget), then matches every extend against every
//! selector path and appends the substituted paths as comma
//! alternatives.

use std::rc::Rc;

use crate::error::{EvalError, Result};
use crate::output::{CssContext, GenCss};
use crate::tree::{
    AtRule, Combinator, Element, ElementValue, Extend, Media, Node, Ruleset, Selector,
    SelectorPath,
};
use crate::visit::{walk, Visitor};

/// Resolve every extend in an evaluated tree, in place.
pub fn process_extends(root: &Node) -> Result<()> {
    let mut finder = ExtendFinderVisitor::default();
    finder.all_extends_stack.push(Vec::new());
    walk(root, &mut finder);
    if !finder.found_extends {
        return Ok(());
    }
    let found = finder.all_extends_stack.pop().unwrap_or_default();

    let chained = do_extend_chaining(&found, &found, 0)?;
    let mut all_extends = found;
    all_extends.extend(chained);

    if let Node::Ruleset(root_ruleset) = root {
        root_ruleset.all_extends.replace(all_extends.clone());
    }

    let mut processor = ProcessExtendsVisitor {
        all_extends_stack: vec![all_extends.clone()],
        error: None,
    };
    walk(root, &mut processor);
    if let Some(error) = processor.error {
        return Err(error);
    }

    warn_on_unmatched(&all_extends);
    Ok(())
}

fn warn_on_unmatched(extends: &[Rc<Extend>]) {
    for extend in extends {
        if !extend.has_found_matches.get() && extend.parent_ids.borrow().len() == 1 {
            let selector = extend
                .selector
                .to_css_string(&mut CssContext::default());
            log::warn!("extend '{}' has no matches", selector.trim());
        }
    }
}

// ── Find pass ──────────────────────────────────────────────────────────

#[derive(Default)]
struct ExtendFinderVisitor {
    all_extends_stack: Vec<Vec<Rc<Extend>>>,
    found_extends: bool,
}

impl Visitor for ExtendFinderVisitor {
    fn visit_ruleset(&mut self, ruleset: &Rc<Ruleset>) -> bool {
        if ruleset.root.get() {
            return true;
        }

        // Rule-level `&:extend(...)` applies to every comma alternative
        let mut all_selectors_extend_list: Vec<Rc<Extend>> = Vec::new();
        for rule in ruleset.rules.borrow().iter() {
            if let Node::Extend(extend) = rule {
                all_selectors_extend_list.push(extend.clone());
                ruleset.extend_on_every_path.set(true);
            }
        }

        let paths = ruleset.paths.borrow().clone();
        for path in &paths {
            let Some(selector) = path.last() else { continue };
            let mut extend_list: Vec<Rc<Extend>> = selector.extend_list.clone();
            extend_list.extend(all_selectors_extend_list.iter().cloned());

            for (j, found) in extend_list.iter().enumerate() {
                self.found_extends = true;
                let extend = Rc::new(found.clone_fresh());
                extend.find_self_selectors(path);
                extend.ruleset.replace(Some(ruleset.clone()));
                if j == 0 {
                    extend.first_extend_on_this_selector_path.set(true);
                }
                self.all_extends_stack
                    .last_mut()
                    .expect("extend stack is never empty")
                    .push(extend);
            }
        }
        true
    }

    fn visit_media(&mut self, _media: &Rc<Media>) -> bool {
        self.all_extends_stack.push(Vec::new());
        true
    }

    fn visit_media_out(&mut self, media: &Rc<Media>) {
        let level = self.all_extends_stack.pop().unwrap_or_default();
        media.all_extends.replace(level);
    }

    fn visit_at_rule(&mut self, _at_rule: &Rc<AtRule>) -> bool {
        self.all_extends_stack.push(Vec::new());
        true
    }

    fn visit_at_rule_out(&mut self, _at_rule: &Rc<AtRule>) {
        self.all_extends_stack.pop();
    }
}

// ── Chaining ───────────────────────────────────────────────────────────

// Match every extend against every target extend's self selector; each
// hit synthesizes a new extend so a extending b extending c resolves.
fn do_extend_chaining(
    extends_list: &[Rc<Extend>],
    extends_list_target: &[Rc<Extend>],
    iteration_count: usize,
) -> Result<Vec<Rc<Extend>>> {
    let mut extends_to_add: Vec<Rc<Extend>> = Vec::new();

    for extend in extends_list {
        for target_extend in extends_list_target {
            // Circular reference: the target is already among this
            // extend's ancestors
            if extend
                .parent_ids
                .borrow()
                .contains(&target_extend.object_id)
            {
                continue;
            }

            let target_self = target_extend.self_selectors.borrow();
            let Some(first_self) = target_self.first() else { continue };
            let selector_path: SelectorPath = vec![first_self.clone()];
            let matches = find_match(extend, &selector_path);
            if matches.is_empty() {
                continue;
            }
            extend.has_found_matches.set(true);

            for self_selector in extend.self_selectors.borrow().iter() {
                let mut new_path = extend_selector(&matches, &selector_path, self_selector, true);
                let Some(last) = new_path.last().cloned() else { continue };

                let new_extend = Rc::new(Extend::new(
                    target_extend.selector.clone(),
                    target_extend.option,
                    target_extend.info.clone(),
                ));
                new_extend.info.copy_visibility_from(&target_extend.info);

                // The synthesized path carries the new extend so later
                // rounds can chain further
                let derived = last.create_derived(
                    last.elements.clone(),
                    Some(vec![new_extend.clone()]),
                    None,
                );
                *new_path.last_mut().expect("non-empty path") = Rc::new(derived);
                new_extend.self_selectors.replace(new_path.clone());

                new_extend.ruleset.replace(target_extend.ruleset.borrow().clone());
                {
                    let mut parents = new_extend.parent_ids.borrow_mut();
                    parents.extend(target_extend.parent_ids.borrow().iter().copied());
                    parents.extend(extend.parent_ids.borrow().iter().copied());
                }

                // Only the first extend on a selector path adds the
                // output path; the others would duplicate it
                if target_extend.first_extend_on_this_selector_path.get() {
                    new_extend.first_extend_on_this_selector_path.set(true);
                    if let Some(target_ruleset) = target_extend.ruleset.borrow().as_ref() {
                        target_ruleset.paths.borrow_mut().push(new_path);
                    }
                }
                extends_to_add.push(new_extend);
            }
        }
    }

    if extends_to_add.is_empty() {
        return Ok(extends_to_add);
    }

    if iteration_count > 100 {
        let mut css = CssContext::default();
        let selector = extends_to_add[0]
            .self_selectors
            .borrow()
            .first()
            .map(|s| s.to_css_string(&mut css))
            .unwrap_or_else(|| "{unable to calculate}".into());
        let target = extends_to_add[0].selector.to_css_string(&mut css);
        return Err(EvalError::ExtendCircular { selector, target });
    }

    let recursive = do_extend_chaining(&extends_to_add, extends_list_target, iteration_count + 1)?;
    extends_to_add.extend(recursive);
    Ok(extends_to_add)
}

// ── Apply pass ─────────────────────────────────────────────────────────

struct ProcessExtendsVisitor {
    all_extends_stack: Vec<Vec<Rc<Extend>>>,
    error: Option<EvalError>,
}

impl Visitor for ProcessExtendsVisitor {
    fn visit_ruleset(&mut self, ruleset: &Rc<Ruleset>) -> bool {
        if ruleset.root.get() {
            return true;
        }
        let all_extends = self
            .all_extends_stack
            .last()
            .cloned()
            .unwrap_or_default();
        let mut selectors_to_add: Vec<SelectorPath> = Vec::new();

        for extend in &all_extends {
            for path in ruleset.paths.borrow().iter() {
                // Extending extends resolved during chaining, before
                // this pass
                if ruleset.extend_on_every_path.get() {
                    continue;
                }
                if let Some(last) = path.last() {
                    if !last.extend_list.is_empty() {
                        continue;
                    }
                }
                let matches = find_match(extend, path);
                if matches.is_empty() {
                    continue;
                }
                extend.has_found_matches.set(true);
                for self_selector in extend.self_selectors.borrow().iter() {
                    selectors_to_add.push(extend_selector(&matches, path, self_selector, true));
                }
            }
        }

        ruleset.paths.borrow_mut().extend(selectors_to_add);
        true
    }

    fn visit_media(&mut self, media: &Rc<Media>) -> bool {
        let current = self
            .all_extends_stack
            .last()
            .cloned()
            .unwrap_or_default();
        let media_extends = media.all_extends.borrow().clone();
        let mut combined = media_extends.clone();
        combined.extend(current);
        match do_extend_chaining(&combined, &media_extends, 0) {
            Ok(chained) => combined.extend(chained),
            Err(error) => {
                if self.error.is_none() {
                    self.error = Some(error);
                }
            }
        }
        self.all_extends_stack.push(combined);
        true
    }

    fn visit_media_out(&mut self, _media: &Rc<Media>) {
        self.all_extends_stack.pop();
    }

    fn visit_at_rule(&mut self, _at_rule: &Rc<AtRule>) -> bool {
        let current = self
            .all_extends_stack
            .last()
            .cloned()
            .unwrap_or_default();
        self.all_extends_stack.push(current);
        true
    }

    fn visit_at_rule_out(&mut self, _at_rule: &Rc<AtRule>) {
        self.all_extends_stack.pop();
    }
}

// ── Matching ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct MatchSpec {
    path_index: usize,
    index: usize,
    matched: usize,
    initial_combinator: String,
    finished: bool,
    end_path_index: usize,
    end_path_element_index: usize,
}

// Match an extend's target against one selector path, returning every
// non-overlapping hit.
fn find_match(extend: &Extend, haystack_path: &[Rc<Selector>]) -> Vec<MatchSpec> {
    let needle_elements = &extend.selector.elements;
    if needle_elements.is_empty() {
        return Vec::new();
    }
    let mut potential_matches: Vec<MatchSpec> = Vec::new();
    let mut matches: Vec<MatchSpec> = Vec::new();

    for (haystack_selector_index, haystack_selector) in haystack_path.iter().enumerate() {
        for (haystack_element_index, haystack_element) in
            haystack_selector.elements.iter().enumerate()
        {
            // Without `all` a match may only start at the very first
            // element
            if extend.allow_before || (haystack_selector_index == 0 && haystack_element_index == 0)
            {
                potential_matches.push(MatchSpec {
                    path_index: haystack_selector_index,
                    index: haystack_element_index,
                    matched: 0,
                    initial_combinator: haystack_element.combinator.value.clone(),
                    finished: false,
                    end_path_index: 0,
                    end_path_element_index: 0,
                });
            }

            let mut i = 0;
            while i < potential_matches.len() {
                let mut keep = true;
                {
                    let potential = &mut potential_matches[i];

                    // Paths imply a descendant combinator before each
                    // selector's first element
                    let mut target_combinator = haystack_element.combinator.value.clone();
                    if target_combinator.is_empty() && haystack_element_index == 0 {
                        target_combinator = " ".to_string();
                    }

                    let needle = &needle_elements[potential.matched];
                    if !element_values_equal(&needle.value, &haystack_element.value) {
                        keep = false;
                    } else if potential.matched > 0 {
                        let needle_combinator = &needle.combinator.value;
                        if *needle_combinator != target_combinator {
                            keep = false;
                        }
                    }

                    if keep {
                        potential.matched += 1;
                        potential.finished = potential.matched == needle_elements.len();
                        if potential.finished && !extend.allow_after {
                            let has_trailing = haystack_element_index + 1
                                < haystack_selector.elements.len()
                                || haystack_selector_index + 1 < haystack_path.len();
                            if has_trailing {
                                keep = false;
                            }
                        }
                    }
                }

                if keep {
                    if potential_matches[i].finished {
                        let mut done = potential_matches[i].clone();
                        done.end_path_index = haystack_selector_index;
                        done.end_path_element_index = haystack_element_index + 1;
                        // Matches never overlap: restart the scan
                        potential_matches.clear();
                        matches.push(done);
                        break;
                    }
                    i += 1;
                } else {
                    potential_matches.remove(i);
                }
            }
        }
    }
    matches
}

// Structural equality of element values, ignoring pseudo-element
// wrapping: strings compare directly, parenthesized selectors compare
// element-wise with the leading-combinator space equivalence.
fn element_values_equal(a: &ElementValue, b: &ElementValue) -> bool {
    match (unwrap_selector(a), unwrap_selector(b)) {
        (None, None) => match (a, b) {
            (ElementValue::Str(x), ElementValue::Str(y)) => x == y,
            _ => false,
        },
        (Some(x), Some(y)) => selectors_equal(&x, &y),
        _ => false,
    }
}

fn unwrap_selector(value: &ElementValue) -> Option<Rc<Selector>> {
    match value {
        ElementValue::Node(Node::Paren(paren)) => match &paren.value {
            Node::Selector(sel) => Some(sel.clone()),
            _ => None,
        },
        ElementValue::Node(Node::Selector(sel)) => Some(sel.clone()),
        _ => None,
    }
}

fn selectors_equal(a: &Selector, b: &Selector) -> bool {
    if a.elements.len() != b.elements.len() {
        return false;
    }
    for (i, (ea, eb)) in a.elements.iter().zip(&b.elements).enumerate() {
        if ea.combinator.value != eb.combinator.value {
            let default_a = if ea.combinator.value.is_empty() { " " } else { &ea.combinator.value };
            let default_b = if eb.combinator.value.is_empty() { " " } else { &eb.combinator.value };
            if i != 0 || default_a != default_b {
                return false;
            }
        }
        if !element_values_equal(&ea.value, &eb.value) {
            return false;
        }
    }
    true
}

// ── Substitution ───────────────────────────────────────────────────────

// Synthesize a new selector path by replacing each matched range with
// the extend's self selector, preserving everything around it.
fn extend_selector(
    matches: &[MatchSpec],
    selector_path: &[Rc<Selector>],
    replacement_selector: &Rc<Selector>,
    is_visible: bool,
) -> SelectorPath {
    let mut current_selector_path_index = 0;
    let mut current_selector_path_element_index = 0;
    let mut path: SelectorPath = Vec::new();

    for (match_index, spec) in matches.iter().enumerate() {
        let selector = &selector_path[spec.path_index];
        let first_element = Rc::new(Element::new(
            Combinator::new(&spec.initial_combinator),
            replacement_selector.elements[0].value.clone(),
            replacement_selector.elements[0].is_variable,
            replacement_selector.elements[0].info.clone(),
        ));

        if spec.path_index > current_selector_path_index && current_selector_path_element_index > 0
        {
            append_elements(
                &mut path,
                &selector_path[current_selector_path_index].elements
                    [current_selector_path_element_index..],
            );
            current_selector_path_element_index = 0;
            current_selector_path_index += 1;
        }

        let mut new_elements: Vec<Rc<Element>> = Vec::new();
        if spec.index > current_selector_path_element_index {
            new_elements.extend(
                selector.elements[current_selector_path_element_index..spec.index]
                    .iter()
                    .cloned(),
            );
        }
        new_elements.push(first_element);
        new_elements.extend(replacement_selector.elements[1..].iter().cloned());

        if current_selector_path_index == spec.path_index && match_index > 0 {
            append_elements(&mut path, &new_elements);
        } else {
            path.extend(
                selector_path[current_selector_path_index..spec.path_index]
                    .iter()
                    .cloned(),
            );
            path.push(Rc::new(Selector::new(
                new_elements,
                Vec::new(),
                None,
                replacement_selector.info.clone(),
            )));
        }

        current_selector_path_index = spec.end_path_index;
        current_selector_path_element_index = spec.end_path_element_index;
        if current_selector_path_index < selector_path.len()
            && current_selector_path_element_index
                >= selector_path[current_selector_path_index].elements.len()
        {
            current_selector_path_element_index = 0;
            current_selector_path_index += 1;
        }
    }

    if current_selector_path_index < selector_path.len() && current_selector_path_element_index > 0
    {
        append_elements(
            &mut path,
            &selector_path[current_selector_path_index].elements
                [current_selector_path_element_index..],
        );
        current_selector_path_index += 1;
    }

    path.extend(selector_path[current_selector_path_index..].iter().cloned());

    // The synthesized path must be visible even when the source came
    // from hidden (reference-import) content
    path.into_iter()
        .map(|selector| {
            let derived = selector.create_derived(selector.elements.clone(), None, None);
            if is_visible {
                derived.info.ensure_visibility();
            } else {
                derived.info.ensure_invisibility();
            }
            Rc::new(derived)
        })
        .collect()
}

// Concatenate elements onto the last selector of a path being built.
fn append_elements(path: &mut SelectorPath, elements: &[Rc<Element>]) {
    if elements.is_empty() {
        return;
    }
    if let Some(last) = path.last().cloned() {
        let mut merged = last.elements.clone();
        merged.extend(elements.iter().cloned());
        *path.last_mut().expect("non-empty path") = Rc::new(last.create_derived(merged, None, None));
    }
}
