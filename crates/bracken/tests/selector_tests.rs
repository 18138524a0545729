mod common;

use common::*;
use pretty_assertions::assert_eq;

// ═══════════════════════════════════════════════════════════════════════
// Nesting and `&` Joining
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_nested_ruleset_joins_with_descendant_combinator() {
    let tree = root(vec![rs(
        vec![sel1(".a")],
        vec![rs(vec![sel1(".b")], vec![decl("color", kw("red"))])],
    )]);
    assert_eq!(render(&tree), ".a .b {\n  color: red;\n}\n");
}

#[test]
fn test_parent_ref_prefix_joins_without_space() {
    let tree = root(vec![rs(
        vec![sel1(".a")],
        vec![rs(
            vec![sel(&[("", "&"), ("", ":hover")])],
            vec![decl("color", kw("blue"))],
        )],
    )]);
    assert_eq!(render(&tree), ".a:hover {\n  color: blue;\n}\n");
}

#[test]
fn test_parent_ref_with_descendant_tail() {
    // `& .b` nested under `.a` produces exactly one `.a .b` path
    let tree = root(vec![rs(
        vec![sel1(".a")],
        vec![rs(
            vec![sel(&[("", "&"), (" ", ".b")])],
            vec![decl("color", kw("red"))],
        )],
    )]);
    assert_eq!(render(&tree), ".a .b {\n  color: red;\n}\n");
}

#[test]
fn test_parent_ref_suffix_reverses_nesting() {
    // `.b &` nested under `.a` produces `.b .a`
    let tree = root(vec![rs(
        vec![sel1(".a")],
        vec![rs(
            vec![sel(&[("", ".b"), (" ", "&")])],
            vec![decl("color", kw("red"))],
        )],
    )]);
    assert_eq!(render(&tree), ".b .a {\n  color: red;\n}\n");
}

#[test]
fn test_multiple_ancestors_multiply_candidates() {
    // Two comma alternatives on the parent cross-product with `&`
    let tree = root(vec![rs(
        vec![sel1(".a"), sel1(".b")],
        vec![rs(
            vec![sel(&[("", "&"), ("", ":hover")])],
            vec![decl("color", kw("red"))],
        )],
    )]);
    assert_eq!(
        render(&tree),
        ".a:hover,\n.b:hover {\n  color: red;\n}\n"
    );
}

#[test]
fn test_child_combinator_survives_joining() {
    let tree = root(vec![rs(
        vec![sel1(".a")],
        vec![rs(vec![sel(&[(">", ".b")])], vec![decl("color", kw("red"))])],
    )]);
    assert_eq!(render(&tree), ".a > .b {\n  color: red;\n}\n");
}

#[test]
fn test_deep_nesting_builds_full_ancestor_chain() {
    let tree = root(vec![rs(
        vec![sel1(".a")],
        vec![rs(
            vec![sel1(".b")],
            vec![rs(vec![sel1(".c")], vec![decl("color", kw("red"))])],
        )],
    )]);
    assert_eq!(render(&tree), ".a .b .c {\n  color: red;\n}\n");
}

// ═══════════════════════════════════════════════════════════════════════
// Parent-Selector Fold
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_bare_parent_ruleset_is_unwrapped() {
    // `.a { & { color: red; } }` folds to `.a { color: red; }`
    let tree = root(vec![rs(
        vec![sel1(".a")],
        vec![rs(vec![sel1("&")], vec![decl("color", kw("red"))])],
    )]);
    assert_eq!(render(&tree), ".a {\n  color: red;\n}\n");
}

#[test]
fn test_fold_is_idempotent_with_sibling_rules() {
    let tree = root(vec![rs(
        vec![sel1(".a")],
        vec![
            decl("margin", num(0.0)),
            rs(vec![sel1("&")], vec![decl("color", kw("red"))]),
        ],
    )]);
    assert_eq!(
        render(&tree),
        ".a {\n  margin: 0;\n  color: red;\n}\n"
    );
}

#[test]
fn test_variables_do_not_escape_the_fold() {
    // A variable defined inside the folded `&` body must not leak into
    // the parent scope
    let tree = root(vec![
        var_decl("@c", kw("green")),
        rs(
            vec![sel1(".a")],
            vec![
                rs(vec![sel1("&")], vec![var_decl("@c", kw("red"))]),
                decl("color", var_ref("@c")),
            ],
        ),
    ]);
    assert_eq!(render(&tree), ".a {\n  color: green;\n}\n");
}

// ═══════════════════════════════════════════════════════════════════════
// Mixin Bodies Without Ancestors
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_mixin_body_parent_ref_takes_call_site_ancestors() {
    let tree = root(vec![
        mixin(
            ".m",
            vec![],
            vec![rs(
                vec![sel(&[("", "&"), ("", ":focus")])],
                vec![decl("outline", kw("none"))],
            )],
        ),
        rs(vec![sel1(".btn")], vec![call(".m", vec![])]),
    ]);
    assert_eq!(render(&tree), ".btn:focus {\n  outline: none;\n}\n");
}

// ═══════════════════════════════════════════════════════════════════════
// Selector Guards Per Alternative
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_only_passing_alternatives_reach_output() {
    let tree = root(vec![rs(
        vec![sel_when(".on", kw("true")), sel_when(".off", kw("false"))],
        vec![decl("color", kw("red"))],
    )]);
    assert_eq!(render(&tree), ".on {\n  color: red;\n}\n");
}
