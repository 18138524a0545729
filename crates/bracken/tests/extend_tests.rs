mod common;

use common::*;
use pretty_assertions::assert_eq;

use bracken::tree::ExtendOption;

// ═══════════════════════════════════════════════════════════════════════
// Exact Matching
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_extend_adds_comma_alternative_to_target() {
    let tree = root(vec![
        rs(vec![sel1(".a")], vec![decl("color", kw("red"))]),
        rs(
            vec![sel_extend(".b", sel1(".a"), ExtendOption::Exact)],
            vec![decl("width", num(1.0))],
        ),
    ]);
    assert_eq!(
        render(&tree),
        ".a,\n.b {\n  color: red;\n}\n.b {\n  width: 1;\n}\n"
    );
}

#[test]
fn test_extend_with_empty_body_still_applies() {
    let tree = root(vec![
        rs(vec![sel1(".a")], vec![decl("color", kw("red"))]),
        rs(
            vec![sel_extend(".b", sel1(".a"), ExtendOption::Exact)],
            vec![],
        ),
    ]);
    assert_eq!(render(&tree), ".a,\n.b {\n  color: red;\n}\n");
}

#[test]
fn test_exact_extend_ignores_partial_matches() {
    // Without `all`, `.a` must match the whole path, not a fragment of
    // `.x .a`
    let tree = root(vec![
        rs(
            vec![sel(&[("", ".x"), (" ", ".a")])],
            vec![decl("color", kw("red"))],
        ),
        rs(
            vec![sel_extend(".b", sel1(".a"), ExtendOption::Exact)],
            vec![],
        ),
    ]);
    assert_eq!(render(&tree), ".x .a {\n  color: red;\n}\n");
}

// ═══════════════════════════════════════════════════════════════════════
// The `all` Option
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_extend_all_matches_inside_nested_combinators() {
    let tree = root(vec![
        rs(
            vec![sel(&[("", ".x"), (" ", ".a")])],
            vec![decl("color", kw("red"))],
        ),
        rs(
            vec![sel_extend(".b", sel1(".a"), ExtendOption::All)],
            vec![],
        ),
    ]);
    assert_eq!(
        render(&tree),
        ".x .a,\n.x .b {\n  color: red;\n}\n"
    );
}

// ═══════════════════════════════════════════════════════════════════════
// Chaining
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_extend_chains_through_extended_selectors() {
    // .c extends .b which extends .a: .c must reach .a's rule
    let tree = root(vec![
        rs(vec![sel1(".a")], vec![decl("color", kw("red"))]),
        rs(
            vec![sel_extend(".b", sel1(".a"), ExtendOption::Exact)],
            vec![],
        ),
        rs(
            vec![sel_extend(".c", sel1(".b"), ExtendOption::Exact)],
            vec![],
        ),
    ]);
    assert_eq!(render(&tree), ".a,\n.b,\n.c {\n  color: red;\n}\n");
}

#[test]
fn test_mutual_extends_terminate() {
    // .a extends .b while .b extends .a; the parent-id guard stops the
    // chain instead of looping
    let tree = root(vec![
        rs(
            vec![sel_extend(".a", sel1(".b"), ExtendOption::Exact)],
            vec![decl("color", kw("red"))],
        ),
        rs(
            vec![sel_extend(".b", sel1(".a"), ExtendOption::Exact)],
            vec![decl("width", num(1.0))],
        ),
    ]);
    assert_eq!(
        render(&tree),
        ".a,\n.b {\n  color: red;\n}\n.b,\n.a {\n  width: 1;\n}\n"
    );
}

// ═══════════════════════════════════════════════════════════════════════
// Interaction With Nesting
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_extend_matches_joined_nested_paths() {
    // `.x .a` exists only after joining; the extend targets the joined
    // path with `all`
    let tree = root(vec![
        rs(
            vec![sel1(".x")],
            vec![rs(vec![sel1(".a")], vec![decl("color", kw("red"))])],
        ),
        rs(
            vec![sel_extend(".b", sel1(".a"), ExtendOption::All)],
            vec![],
        ),
    ]);
    assert_eq!(
        render(&tree),
        ".x .a,\n.x .b {\n  color: red;\n}\n"
    );
}

#[test]
fn test_unmatched_extend_changes_nothing() {
    let tree = root(vec![
        rs(vec![sel1(".a")], vec![decl("color", kw("red"))]),
        rs(
            vec![sel_extend(".b", sel1(".nothing"), ExtendOption::Exact)],
            vec![decl("width", num(1.0))],
        ),
    ]);
    assert_eq!(
        render(&tree),
        ".a {\n  color: red;\n}\n.b {\n  width: 1;\n}\n"
    );
}
