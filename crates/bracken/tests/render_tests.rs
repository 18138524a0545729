mod common;

use common::*;
use pretty_assertions::assert_eq;

// ═══════════════════════════════════════════════════════════════════════
// End-to-End Strings
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_nested_block() {
    let tree = root(vec![rs(
        vec![sel1(".a")],
        vec![rs(vec![sel1(".b")], vec![decl("color", kw("red"))])],
    )]);
    assert_eq!(render(&tree), ".a .b {\n  color: red;\n}\n");
}

#[test]
fn test_hover_suffix() {
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
fn test_mixin_with_default() {
    use bracken::tree::Param;
    let tree = root(vec![
        mixin(
            ".m",
            vec![Param::optional("@c", kw("red"))],
            vec![decl("color", var_ref("@c"))],
        ),
        rs(vec![sel1(".x")], vec![call(".m", vec![])]),
    ]);
    assert_eq!(render(&tree), ".x {\n  color: red;\n}\n");
}

#[test]
fn test_sibling_blocks_are_separated_by_one_newline() {
    let tree = root(vec![
        rs(vec![sel1(".a")], vec![decl("color", kw("red"))]),
        rs(vec![sel1(".b")], vec![decl("color", kw("blue"))]),
    ]);
    assert_eq!(
        render(&tree),
        ".a {\n  color: red;\n}\n.b {\n  color: blue;\n}\n"
    );
}

#[test]
fn test_parent_block_prints_before_hoisted_children() {
    let tree = root(vec![rs(
        vec![sel1(".a")],
        vec![
            decl("color", kw("red")),
            rs(vec![sel1(".b")], vec![decl("width", num(1.0))]),
        ],
    )]);
    assert_eq!(
        render(&tree),
        ".a {\n  color: red;\n}\n.a .b {\n  width: 1;\n}\n"
    );
}

// ═══════════════════════════════════════════════════════════════════════
// Compressed Mode
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_compressed_elides_whitespace_and_final_semicolon() {
    let tree = root(vec![rs(
        vec![sel1(".a")],
        vec![decl("color", kw("red")), decl("width", dim(0.5, "px"))],
    )]);
    assert_eq!(render_compressed(&tree), ".a{color:red;width:.5px}");
}

#[test]
fn test_compressed_joins_alternatives_without_newlines() {
    let tree = root(vec![rs(
        vec![sel1(".a"), sel1(".b")],
        vec![decl("color", kw("red"))],
    )]);
    assert_eq!(render_compressed(&tree), ".a,.b{color:red}");
}

// ═══════════════════════════════════════════════════════════════════════
// Media Bubbling
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_media_at_root() {
    let tree = root(vec![media(
        "screen",
        vec![rs(vec![sel1(".a")], vec![decl("color", kw("red"))])],
    )]);
    assert_eq!(
        render(&tree),
        "@media screen {\n  .a {\n    color: red;\n  }\n}\n"
    );
}

#[test]
fn test_media_nested_in_ruleset_bubbles_out() {
    let tree = root(vec![rs(
        vec![sel1(".a")],
        vec![media("screen", vec![decl("color", kw("red"))])],
    )]);
    assert_eq!(
        render(&tree),
        "@media screen {\n  .a {\n    color: red;\n  }\n}\n"
    );
}

#[test]
fn test_empty_media_is_dropped() {
    let tree = root(vec![media("screen", vec![])]);
    assert_eq!(render(&tree), "");
}

// ═══════════════════════════════════════════════════════════════════════
// Imports
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_resolved_import_splices_rules_and_exports_variables() {
    use bracken::tree::{Import, Node, NodeInfo, Ruleset};
    use std::rc::Rc;

    let imported = Rc::new(Ruleset::new(
        Vec::new(),
        vec![
            var_decl("@c", kw("teal")),
            rs(vec![sel1(".lib")], vec![decl("color", var_ref("@c"))]),
        ],
        false,
        NodeInfo::none(),
    ));
    let tree = root(vec![
        Node::Import(Rc::new(Import::resolved("\"lib.less\"", imported, NodeInfo::none()))),
        rs(vec![sel1(".app")], vec![decl("border-color", var_ref("@c"))]),
    ]);
    assert_eq!(
        render(&tree),
        ".lib {\n  color: teal;\n}\n.app {\n  border-color: teal;\n}\n"
    );
}

#[test]
fn test_css_import_passes_through() {
    use bracken::tree::{Import, Node, NodeInfo};
    use std::rc::Rc;

    let tree = root(vec![
        Node::Import(Rc::new(Import::css("url(\"theme.css\")", NodeInfo::none()))),
        rs(vec![sel1(".a")], vec![decl("color", kw("red"))]),
    ]);
    assert_eq!(
        render(&tree),
        "@import url(\"theme.css\");\n.a {\n  color: red;\n}\n"
    );
}

// ═══════════════════════════════════════════════════════════════════════
// Detached Rulesets
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_variable_call_expands_detached_ruleset() {
    use bracken::tree::{DetachedRuleset, Node, NodeInfo, Ruleset, VariableCall};
    use std::rc::Rc;

    let body = Rc::new(Ruleset::new(
        Vec::new(),
        vec![decl("color", kw("red"))],
        false,
        NodeInfo::none(),
    ));
    let detached = Node::DetachedRuleset(Rc::new(DetachedRuleset::new(body, NodeInfo::none())));
    let tree = root(vec![
        var_decl("@block", detached),
        rs(
            vec![sel1(".x")],
            vec![Node::VariableCall(Rc::new(VariableCall::new("@block", NodeInfo::none())))],
        ),
    ]);
    assert_eq!(render(&tree), ".x {\n  color: red;\n}\n");
}

#[test]
fn test_detached_ruleset_in_property_position_errors() {
    use bracken::tree::{DetachedRuleset, Node, NodeInfo, Ruleset};
    use std::rc::Rc;

    let body = Rc::new(Ruleset::new(Vec::new(), Vec::new(), false, NodeInfo::none()));
    let detached = Node::DetachedRuleset(Rc::new(DetachedRuleset::new(body, NodeInfo::none())));
    let tree = root(vec![rs(vec![sel1(".x")], vec![decl("color", detached)])]);
    let err = render_err(&tree);
    assert_eq!(err, bracken::EvalError::RulesetOnProperty);
}

// ═══════════════════════════════════════════════════════════════════════
// At-Rules
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_bodyless_at_rule_passes_through() {
    use bracken::tree::{AtRule, Node, NodeInfo};
    use std::rc::Rc;
    let tree = root(vec![
        Node::AtRule(Rc::new(AtRule::new(
            "@charset",
            Some(anon("\"utf-8\"")),
            None,
            NodeInfo::none(),
        ))),
        rs(vec![sel1(".a")], vec![decl("color", kw("red"))]),
    ]);
    assert_eq!(
        render(&tree),
        "@charset \"utf-8\";\n.a {\n  color: red;\n}\n"
    );
}
