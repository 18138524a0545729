mod common;

use common::*;
use pretty_assertions::assert_eq;

// ═══════════════════════════════════════════════════════════════════════
// Variable Scoping
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_variable_resolves_from_outer_scope() {
    let tree = root(vec![
        var_decl("@color", kw("red")),
        rs(vec![sel1(".a")], vec![decl("color", var_ref("@color"))]),
    ]);
    assert_eq!(render(&tree), ".a {\n  color: red;\n}\n");
}

#[test]
fn test_inner_scope_shadows_outer_variable() {
    let tree = root(vec![
        var_decl("@size", num(1.0)),
        rs(
            vec![sel1(".inner")],
            vec![var_decl("@size", num(2.0)), decl("width", var_ref("@size"))],
        ),
        rs(vec![sel1(".outer")], vec![decl("width", var_ref("@size"))]),
    ]);
    assert_eq!(
        render(&tree),
        ".inner {\n  width: 2;\n}\n.outer {\n  width: 1;\n}\n"
    );
}

#[test]
fn test_undefined_variable_errors() {
    let tree = root(vec![rs(
        vec![sel1(".a")],
        vec![decl("color", var_ref("@missing"))],
    )]);
    let err = render_err(&tree);
    assert_eq!(
        err,
        bracken::EvalError::UndefinedVariable {
            name: "@missing".into(),
            index: 0,
            filename: String::new(),
        }
    );
}

#[test]
fn test_self_reference_errors_instead_of_hanging() {
    let tree = root(vec![
        var_decl("@a", var_ref("@a")),
        rs(vec![sel1(".x")], vec![decl("v", var_ref("@a"))]),
    ]);
    let err = render_err(&tree);
    assert!(matches!(err, bracken::EvalError::RecursiveVariable { .. }));
}

#[test]
fn test_variable_indirection() {
    // @@name evaluates the inner reference and re-looks-up "@" + value
    let tree = root(vec![
        var_decl("@real", kw("blue")),
        var_decl("@name", kw("real")),
        rs(vec![sel1(".a")], vec![decl("color", var_ref("@@name"))]),
    ]);
    assert_eq!(render(&tree), ".a {\n  color: blue;\n}\n");
}

#[test]
fn test_variables_defined_later_in_scope_are_visible() {
    // Lazy evaluation: lookup happens at use, not declaration order
    let tree = root(vec![
        rs(
            vec![sel1(".a")],
            vec![decl("color", var_ref("@late")), var_decl("@late", kw("green"))],
        ),
    ]);
    assert_eq!(render(&tree), ".a {\n  color: green;\n}\n");
}

// ═══════════════════════════════════════════════════════════════════════
// Guard Gating
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_false_guard_suppresses_whole_body() {
    let tree = root(vec![rs(
        vec![sel_when(".x", kw("false"))],
        vec![decl("color", kw("red"))],
    )]);
    assert_eq!(render(&tree), "");
}

#[test]
fn test_true_guard_contributes_rules() {
    let tree = root(vec![rs(
        vec![sel_when(".x", kw("true"))],
        vec![decl("color", kw("red"))],
    )]);
    assert_eq!(render(&tree), ".x {\n  color: red;\n}\n");
}

#[test]
fn test_comparison_guard_on_variable() {
    use bracken::tree::ConditionOp;
    let tree = root(vec![
        var_decl("@w", num(10.0)),
        rs(
            vec![sel_when(".wide", cond(ConditionOp::Gt, var_ref("@w"), num(5.0)))],
            vec![decl("width", var_ref("@w"))],
        ),
        rs(
            vec![sel_when(".narrow", cond(ConditionOp::Lt, var_ref("@w"), num(5.0)))],
            vec![decl("width", num(0.0))],
        ),
    ]);
    assert_eq!(render(&tree), ".wide {\n  width: 10;\n}\n");
}

// ═══════════════════════════════════════════════════════════════════════
// Tree Purity
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_evaluating_twice_produces_identical_output() {
    let tree = root(vec![
        var_decl("@c", kw("red")),
        mixin(".m", vec![], vec![decl("border-color", var_ref("@c"))]),
        rs(
            vec![sel1(".a")],
            vec![
                call(".m", vec![]),
                rs(vec![sel(&[("", "&"), ("", ":hover")])], vec![decl("color", kw("blue"))]),
            ],
        ),
    ]);
    let first = render(&tree);
    let second = render(&tree);
    assert_eq!(first, second);
}

// ═══════════════════════════════════════════════════════════════════════
// Structural Errors
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_declaration_at_root_errors() {
    let tree = root(vec![decl("color", kw("red"))]);
    let err = render_err(&tree);
    assert!(matches!(err, bracken::EvalError::DeclarationAtRoot { .. }));
}

#[test]
fn test_arithmetic_between_dimensions() {
    use bracken::tree::{Node, NodeInfo, Operation};
    use std::rc::Rc;
    let sum = Node::Operation(Rc::new(Operation::new(
        "+",
        dim(1.0, "px"),
        num(2.0),
        true,
        NodeInfo::none(),
    )));
    let tree = root(vec![rs(vec![sel1(".a")], vec![decl("width", sum)])]);
    assert_eq!(render(&tree), ".a {\n  width: 3px;\n}\n");
}

#[test]
fn test_operation_on_keyword_is_a_type_error() {
    use bracken::tree::{Node, NodeInfo, Operation};
    use std::rc::Rc;
    let bad = Node::Operation(Rc::new(Operation::new(
        "+",
        kw("red"),
        num(2.0),
        true,
        NodeInfo::none(),
    )));
    let tree = root(vec![rs(vec![sel1(".a")], vec![decl("width", bad)])]);
    let err = render_err(&tree);
    assert!(matches!(err, bracken::EvalError::InvalidOperation { .. }));
}

// ═══════════════════════════════════════════════════════════════════════
// Property References
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_property_reference_resolves_last_declaration() {
    use bracken::tree::{Node, NodeInfo, Property};
    use std::rc::Rc;
    let prop_ref = Node::Property(Rc::new(Property::new("color", NodeInfo::none())));
    let tree = root(vec![rs(
        vec![sel1(".a")],
        vec![
            decl("color", kw("red")),
            decl("color", kw("green")),
            decl("background-color", prop_ref),
        ],
    )]);
    assert_eq!(
        render(&tree),
        ".a {\n  color: red;\n  color: green;\n  background-color: green;\n}\n"
    );
}

#[test]
fn test_undefined_property_errors() {
    use bracken::tree::{Node, NodeInfo, Property};
    use std::rc::Rc;
    let prop_ref = Node::Property(Rc::new(Property::new("missing", NodeInfo::none())));
    let tree = root(vec![rs(vec![sel1(".a")], vec![decl("color", prop_ref)])]);
    let err = render_err(&tree);
    assert!(matches!(err, bracken::EvalError::UndefinedProperty { .. }));
}

// ═══════════════════════════════════════════════════════════════════════
// String Interpolation
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_quoted_interpolation_resolves_variables() {
    use bracken::tree::{Node, NodeInfo, Quoted};
    use std::rc::Rc;
    let quoted = Node::Quoted(Rc::new(Quoted::new(
        Some('"'),
        "icon-@{name}.png",
        false,
        NodeInfo::none(),
    )));
    let tree = root(vec![
        var_decl("@name", kw("home")),
        rs(vec![sel1(".a")], vec![decl("background", quoted)]),
    ]);
    assert_eq!(render(&tree), ".a {\n  background: \"icon-home.png\";\n}\n");
}

// ═══════════════════════════════════════════════════════════════════════
// Comments
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_block_comment_survives_line_comment_does_not() {
    use bracken::tree::{Comment, Node, NodeInfo};
    use std::rc::Rc;
    let tree = root(vec![rs(
        vec![sel1(".a")],
        vec![
            Node::Comment(Rc::new(Comment::new("/* keep */", false, NodeInfo::none()))),
            Node::Comment(Rc::new(Comment::new("// drop", true, NodeInfo::none()))),
            decl("color", kw("red")),
        ],
    )]);
    assert_eq!(render(&tree), ".a {\n  /* keep */\n  color: red;\n}\n");
}
