//! The parent-selector (`&`) joining algebra
//!
//! `join_selector` combines one evaluated selector with every ancestor
//! path in scope. Non-`&` elements accumulate in a buffer; each `&`
//! flushes the buffer onto the in-progress candidates and multiplies
//! them by the ancestor paths. Parenthesized sub-selectors resolve
//! recursively first, since parens may themselves contain `&`.

use std::rc::Rc;

use crate::tree::{
    Combinator, Element, ElementValue, Node, Paren, Selector, SelectorPath,
};

/// Join `selector` against the ancestor `context`, appending the
/// resulting paths to `paths`.
pub fn join_selector(paths: &mut Vec<SelectorPath>, context: &[SelectorPath], selector: &Rc<Selector>) {
    let mut new_paths: Vec<SelectorPath> = Vec::new();
    let had_parent_selector = replace_parent_selector(&mut new_paths, context, selector);

    if !had_parent_selector {
        if !context.is_empty() {
            // Default descendant combination: every ancestor path gets
            // the selector appended
            new_paths = Vec::new();
            for ancestor in context {
                let mut path: SelectorPath = ancestor
                    .iter()
                    .map(|ctx_sel| derive_selector(ctx_sel, selector))
                    .collect();
                path.push(selector.clone());
                new_paths.push(path);
            }
        } else {
            new_paths = vec![vec![selector.clone()]];
        }
    }

    paths.extend(new_paths);
}

// An ancestor selector re-derived to carry the joining selector's
// visibility info.
fn derive_selector(from: &Rc<Selector>, visibility_of: &Rc<Selector>) -> Rc<Selector> {
    let derived = from.create_derived(
        from.elements.clone(),
        Some(from.extend_list.clone()),
        Some(from.evald_condition),
    );
    derived.info.copy_visibility_from(&visibility_of.info);
    Rc::new(derived)
}

fn find_nested_selector(element: &Element) -> Option<Rc<Selector>> {
    if let ElementValue::Node(Node::Paren(paren)) = &element.value {
        if let Node::Selector(nested) = &paren.value {
            return Some(nested.clone());
        }
    }
    None
}

// Wrap a resolved nested path back into parentheses.
fn create_parenthesis(path: &SelectorPath, original: &Element) -> Node {
    if path.is_empty() {
        let inner = match &original.value {
            ElementValue::Node(node) => node.clone(),
            ElementValue::Str(s) => Node::Anonymous(Rc::new(crate::tree::Anonymous::new(
                s.clone(),
                original.info.clone(),
            ))),
        };
        return Node::Paren(Rc::new(Paren::new(inner, original.info.clone())));
    }
    let inside: Vec<Rc<Element>> = path
        .iter()
        .map(|sel| {
            Rc::new(Element::new(
                Combinator::none(),
                ElementValue::Node(Node::Selector(sel.clone())),
                original.is_variable,
                original.info.clone(),
            ))
        })
        .collect();
    let inner = Selector::new(inside, Vec::new(), None, original.info.clone());
    Node::Paren(Rc::new(Paren::new(Node::Selector(Rc::new(inner)), original.info.clone())))
}

fn create_selector(contained: Node, original: &Element) -> Rc<Selector> {
    let element = Element::new(
        Combinator::none(),
        ElementValue::Node(contained),
        original.is_variable,
        original.info.clone(),
    );
    Rc::new(Selector::new(vec![Rc::new(element)], Vec::new(), None, original.info.clone()))
}

// Join a candidate's trailing partial selector onto one ancestor path.
//
// The candidate's last selector absorbs the ancestor's first element
// (inheriting the ancestor's combinator when `&` carried none), the
// remaining ancestor elements follow unmodified, and the rest of the
// ancestor path is appended with extend lists cleared so ancestor
// extends are not applied twice.
fn add_replacement_into_path(
    beginning: &SelectorPath,
    add_path: &[Rc<Selector>],
    replaced_element: &Element,
    original_selector: &Selector,
) -> SelectorPath {
    let (mut new_path, mut joined_elements): (SelectorPath, Vec<Rc<Element>>) =
        if let Some((last, front)) = beginning.split_last() {
            (front.to_vec(), last.elements.clone())
        } else {
            (Vec::new(), Vec::new())
        };

    if let Some(first_add) = add_path.first() {
        if let Some(parent_el) = first_add.elements.first() {
            let combinator = if replaced_element.combinator.empty_or_whitespace
                && !parent_el.combinator.empty_or_whitespace
            {
                parent_el.combinator.clone()
            } else {
                replaced_element.combinator.clone()
            };
            joined_elements.push(Rc::new(Element::new(
                combinator,
                parent_el.value.clone(),
                replaced_element.is_variable,
                replaced_element.info.or_inherit(&original_selector.info),
            )));
            joined_elements.extend(first_add.elements[1..].iter().cloned());
        }
    }

    // An empty trailing buffer after `&` must not emit a spurious empty
    // selector
    if !joined_elements.is_empty() {
        new_path.push(Rc::new(original_selector.create_derived(joined_elements, None, None)));
    }

    for rest in add_path.iter().skip(1) {
        new_path.push(Rc::new(rest.create_derived(rest.elements.clone(), Some(Vec::new()), None)));
    }
    new_path
}

fn add_all_replacements_into_path(
    beginning_paths: &[SelectorPath],
    add_paths: &[Rc<Selector>],
    replaced_element: &Element,
    original_selector: &Selector,
    result: &mut Vec<SelectorPath>,
) {
    for beginning in beginning_paths {
        result.push(add_replacement_into_path(
            beginning,
            add_paths,
            replaced_element,
            original_selector,
        ));
    }
}

// Flush buffered non-`&` elements onto every in-progress candidate.
fn merge_elements_on_to_selectors(
    elements: Vec<Rc<Element>>,
    selectors: &mut Vec<SelectorPath>,
    in_selector: &Selector,
) {
    if elements.is_empty() {
        return;
    }
    if selectors.is_empty() {
        selectors.push(vec![Rc::new(Selector::new(
            elements,
            Vec::new(),
            None,
            in_selector.info.clone(),
        ))]);
        return;
    }
    for sel in selectors.iter_mut() {
        if let Some(last) = sel.last().cloned() {
            let mut merged = last.elements.clone();
            merged.extend(elements.iter().cloned());
            *sel.last_mut().expect("non-empty path") =
                Rc::new(last.create_derived(merged, None, None));
        } else {
            sel.push(Rc::new(Selector::new(
                elements.clone(),
                Vec::new(),
                None,
                in_selector.info.clone(),
            )));
        }
    }
}

fn replace_parent_selector(
    paths: &mut Vec<SelectorPath>,
    context: &[SelectorPath],
    in_selector: &Rc<Selector>,
) -> bool {
    let mut had_parent_selector = false;
    let mut current_elements: Vec<Rc<Element>> = Vec::new();
    let mut new_selectors: Vec<SelectorPath> = vec![Vec::new()];

    for el in &in_selector.elements {
        if !el.value.is_parent_ref() {
            if let Some(nested) = find_nested_selector(el) {
                merge_elements_on_to_selectors(
                    std::mem::take(&mut current_elements),
                    &mut new_selectors,
                    in_selector,
                );

                let mut nested_paths: Vec<SelectorPath> = Vec::new();
                let replaced = replace_parent_selector(&mut nested_paths, context, &nested);
                had_parent_selector = had_parent_selector || replaced;

                let mut replaced_new_selectors: Vec<SelectorPath> = Vec::new();
                for nested_path in &nested_paths {
                    let replacement = create_selector(create_parenthesis(nested_path, el), el);
                    add_all_replacements_into_path(
                        &new_selectors,
                        std::slice::from_ref(&replacement),
                        el,
                        in_selector,
                        &mut replaced_new_selectors,
                    );
                }
                new_selectors = replaced_new_selectors;
            } else {
                current_elements.push(el.clone());
            }
        } else {
            had_parent_selector = true;
            let mut selectors_multiplied: Vec<SelectorPath> = Vec::new();
            merge_elements_on_to_selectors(
                std::mem::take(&mut current_elements),
                &mut new_selectors,
                in_selector,
            );

            for sel in &new_selectors {
                if context.is_empty() {
                    // No ancestors (mixin body called standalone): keep
                    // `&`'s combinator on a placeholder element so it is
                    // not lost
                    let mut sel = sel.clone();
                    if let Some(first) = sel.first().cloned() {
                        let mut elements = first.elements.clone();
                        elements.push(Rc::new(Element::new(
                            el.combinator.clone(),
                            ElementValue::Str(String::new()),
                            el.is_variable,
                            el.info.clone(),
                        )));
                        sel[0] = Rc::new(first.create_derived(elements, None, None));
                    }
                    selectors_multiplied.push(sel);
                } else {
                    for ancestor in context {
                        selectors_multiplied.push(add_replacement_into_path(
                            sel,
                            ancestor,
                            el,
                            in_selector,
                        ));
                    }
                }
            }
            new_selectors = selectors_multiplied;
        }
    }

    // Elements left over after the last `&` (e.g. `& .b`) attach to every
    // candidate
    merge_elements_on_to_selectors(
        std::mem::take(&mut current_elements),
        &mut new_selectors,
        in_selector,
    );

    for mut sel_path in new_selectors {
        if sel_path.is_empty() {
            continue;
        }
        let last = sel_path.last().expect("non-empty path").clone();
        let derived =
            last.create_derived(last.elements.clone(), Some(in_selector.extend_list.clone()), None);
        *sel_path.last_mut().expect("non-empty path") = Rc::new(derived);
        paths.push(sel_path);
    }

    had_parent_selector
}
