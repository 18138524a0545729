mod common;

use common::*;
use pretty_assertions::assert_eq;

use bracken::tree::{Arg, ConditionOp, Param};

// ═══════════════════════════════════════════════════════════════════════
// Arity
// ═══════════════════════════════════════════════════════════════════════

fn two_required_one_optional() -> Vec<Param> {
    vec![
        Param::required("@a"),
        Param::required("@b"),
        Param::optional("@c", kw("fallback")),
    ]
}

#[test]
fn test_match_args_arity_window() {
    use bracken::eval::mixin::{match_args, EvaldArg};
    use bracken::tree::{MixinDefinition, NodeInfo};

    let def = MixinDefinition::new(".m", two_required_one_optional(), vec![], None, false, NodeInfo::none());
    assert_eq!(def.arity, 3);
    assert_eq!(def.required, 2);
    assert_eq!(def.optional_parameters, vec!["@c".to_string()]);

    let mut ctx = bracken::EvalContext::default();
    let arg = |v: f64| EvaldArg { name: None, value: num(v) };

    assert!(!match_args(&def, &[arg(1.0)], &mut ctx));
    assert!(match_args(&def, &[arg(1.0), arg(2.0)], &mut ctx));
    assert!(match_args(&def, &[arg(1.0), arg(2.0), arg(3.0)], &mut ctx));
    assert!(!match_args(&def, &[arg(1.0), arg(2.0), arg(3.0), arg(4.0)], &mut ctx));
}

#[test]
fn test_variadic_accepts_any_count_past_required() {
    use bracken::eval::mixin::{match_args, EvaldArg};
    use bracken::tree::{MixinDefinition, NodeInfo};

    let params = vec![
        Param::required("@a"),
        Param::required("@b"),
        Param::rest("@rest"),
    ];
    let def = MixinDefinition::new(".m", params, vec![], None, true, NodeInfo::none());

    let mut ctx = bracken::EvalContext::default();
    let arg = |v: f64| EvaldArg { name: None, value: num(v) };

    assert!(!match_args(&def, &[arg(1.0)], &mut ctx));
    assert!(match_args(&def, &[arg(1.0), arg(2.0)], &mut ctx));
    assert!(match_args(&def, &[arg(1.0), arg(2.0), arg(3.0), arg(4.0), arg(5.0)], &mut ctx));
}

#[test]
fn test_call_with_wrong_arity_reports_no_matching_definition() {
    let tree = root(vec![
        mixin(".m", two_required_one_optional(), vec![decl("a", var_ref("@a"))]),
        rs(vec![sel1(".x")], vec![call(".m", vec![Arg::positional(num(1.0))])]),
    ]);
    let err = render_err(&tree);
    assert!(matches!(err, bracken::EvalError::NoMatchingDefinition { .. }));
}

#[test]
fn test_undefined_mixin_reports_name() {
    let tree = root(vec![rs(vec![sel1(".x")], vec![call(".nope", vec![])])]);
    let err = render_err(&tree);
    assert_eq!(
        err,
        bracken::EvalError::UndefinedMixin {
            call: ".nope".into(),
            index: 0,
            filename: String::new(),
        }
    );
}

// ═══════════════════════════════════════════════════════════════════════
// Argument Binding
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_default_parameter_applies_when_omitted() {
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
fn test_positional_argument_overrides_default() {
    let tree = root(vec![
        mixin(
            ".m",
            vec![Param::optional("@c", kw("red"))],
            vec![decl("color", var_ref("@c"))],
        ),
        rs(vec![sel1(".x")], vec![call(".m", vec![Arg::positional(kw("blue"))])]),
    ]);
    assert_eq!(render(&tree), ".x {\n  color: blue;\n}\n");
}

#[test]
fn test_named_argument_binds_by_name() {
    let tree = root(vec![
        mixin(
            ".m",
            vec![
                Param::optional("@a", num(1.0)),
                Param::optional("@b", num(2.0)),
            ],
            vec![decl("a", var_ref("@a")), decl("b", var_ref("@b"))],
        ),
        rs(
            vec![sel1(".x")],
            vec![call(".m", vec![Arg::named("@b", num(9.0))])],
        ),
    ]);
    assert_eq!(render(&tree), ".x {\n  a: 1;\n  b: 9;\n}\n");
}

#[test]
fn test_unknown_named_argument_errors() {
    let tree = root(vec![
        mixin(".m", vec![Param::required("@a")], vec![decl("a", var_ref("@a"))]),
        rs(
            vec![sel1(".x")],
            vec![call(".m", vec![Arg::named("@zzz", num(1.0))])],
        ),
    ]);
    let err = render_err(&tree);
    assert_eq!(
        err,
        bracken::EvalError::UnknownNamedArgument { mixin: ".m".into(), name: "@zzz".into() }
    );
}

#[test]
fn test_default_may_reference_earlier_parameter() {
    let tree = root(vec![
        mixin(
            ".m",
            vec![
                Param::required("@a"),
                Param::optional("@b", var_ref("@a")),
            ],
            vec![decl("b", var_ref("@b"))],
        ),
        rs(vec![sel1(".x")], vec![call(".m", vec![Arg::positional(num(7.0))])]),
    ]);
    assert_eq!(render(&tree), ".x {\n  b: 7;\n}\n");
}

#[test]
fn test_arguments_variable_holds_all_arguments() {
    let tree = root(vec![
        mixin(
            ".m",
            vec![Param::required("@a"), Param::required("@b")],
            vec![decl("margin", var_ref("@arguments"))],
        ),
        rs(
            vec![sel1(".x")],
            vec![call(".m", vec![Arg::positional(dim(1.0, "px")), Arg::positional(dim(2.0, "px"))])],
        ),
    ]);
    assert_eq!(render(&tree), ".x {\n  margin: 1px 2px;\n}\n");
}

#[test]
fn test_variadic_parameter_captures_tail() {
    let tree = root(vec![
        mixin(
            ".m",
            vec![Param::required("@first"), Param::rest("@rest")],
            vec![decl("first", var_ref("@first")), decl("rest", var_ref("@rest"))],
        ),
        rs(
            vec![sel1(".x")],
            vec![call(
                ".m",
                vec![
                    Arg::positional(num(1.0)),
                    Arg::positional(num(2.0)),
                    Arg::positional(num(3.0)),
                ],
            )],
        ),
    ]);
    assert_eq!(render(&tree), ".x {\n  first: 1;\n  rest: 2 3;\n}\n");
}

// ═══════════════════════════════════════════════════════════════════════
// Scope Pollution
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_mixin_must_not_override_existing_caller_variable() {
    let tree = root(vec![
        mixin(".m", vec![], vec![var_decl("@x", num(2.0))]),
        rs(
            vec![sel1(".a")],
            vec![
                var_decl("@x", num(1.0)),
                call(".m", vec![]),
                decl("val", var_ref("@x")),
            ],
        ),
    ]);
    assert_eq!(render(&tree), ".a {\n  val: 1;\n}\n");
}

#[test]
fn test_mixin_may_introduce_new_variable_into_caller() {
    let tree = root(vec![
        mixin(".m", vec![], vec![var_decl("@fresh", num(5.0))]),
        rs(
            vec![sel1(".a")],
            vec![call(".m", vec![]), decl("val", var_ref("@fresh"))],
        ),
    ]);
    assert_eq!(render(&tree), ".a {\n  val: 5;\n}\n");
}

// ═══════════════════════════════════════════════════════════════════════
// Guards and default()
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_guard_selects_matching_definition() {
    let tree = root(vec![
        mixin_when(
            ".m",
            vec![Param::required("@a")],
            cond(ConditionOp::Gt, var_ref("@a"), num(5.0)),
            vec![decl("size", kw("big"))],
        ),
        mixin_when(
            ".m",
            vec![Param::required("@a")],
            cond(ConditionOp::Le, var_ref("@a"), num(5.0)),
            vec![decl("size", kw("small"))],
        ),
        rs(vec![sel1(".x")], vec![call(".m", vec![Arg::positional(num(10.0))])]),
        rs(vec![sel1(".y")], vec![call(".m", vec![Arg::positional(num(2.0))])]),
    ]);
    assert_eq!(
        render(&tree),
        ".x {\n  size: big;\n}\n.y {\n  size: small;\n}\n"
    );
}

#[test]
fn test_default_function_fires_when_no_other_guard_matches() {
    use bracken::tree::{Call, Node, NodeInfo};
    use std::rc::Rc;
    let default_call = Node::Call(Rc::new(Call::new("default", vec![], NodeInfo::none())));

    let tree = root(vec![
        mixin_when(
            ".m",
            vec![Param::required("@a")],
            cond(ConditionOp::Gt, var_ref("@a"), num(5.0)),
            vec![decl("size", kw("big"))],
        ),
        mixin_when(
            ".m",
            vec![Param::required("@a")],
            default_call,
            vec![decl("size", kw("default"))],
        ),
        rs(vec![sel1(".x")], vec![call(".m", vec![Arg::positional(num(10.0))])]),
        rs(vec![sel1(".y")], vec![call(".m", vec![Arg::positional(num(1.0))])]),
    ]);
    assert_eq!(
        render(&tree),
        ".x {\n  size: big;\n}\n.y {\n  size: default;\n}\n"
    );
}

// ═══════════════════════════════════════════════════════════════════════
// !important Propagation
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_important_call_marks_every_produced_rule() {
    let tree = root(vec![
        mixin(".m", vec![], vec![decl("color", kw("red")), decl("width", num(1.0))]),
        rs(vec![sel1(".x")], vec![call_important(".m", vec![])]),
    ]);
    assert_eq!(
        render(&tree),
        ".x {\n  color: red !important;\n  width: 1 !important;\n}\n"
    );
}

// ═══════════════════════════════════════════════════════════════════════
// Recursion Budget
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_mutually_recursive_mixins_hit_the_depth_budget() {
    // .ping calls .pong calls .ping ... the budget turns this into an
    // error instead of a stack overflow
    let tree = root(vec![
        mixin(".ping", vec![], vec![call(".pong", vec![])]),
        mixin(".pong", vec![], vec![call(".ping", vec![])]),
        rs(vec![sel1(".x")], vec![call(".ping", vec![])]),
    ]);
    let err = render_err(&tree);
    assert!(matches!(err, bracken::EvalError::MixinDepthExceeded { .. }));
}
