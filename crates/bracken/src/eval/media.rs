//! Media and at-rule evaluation, with nested-media bubbling

use std::rc::Rc;

use crate::context::{EvalContext, Frame};
use crate::error::Result;
use crate::eval::ruleset::eval_ruleset;
use crate::eval::Evaluate;
use crate::tree::{
    Anonymous, AtRule, Expression, Media, Node, NodeInfo, Ruleset, Selector, ValueList,
};

/// Evaluate a `@media` block.
///
/// The fresh media joins the accumulator and path; its body evaluates
/// as a normal scope. At the top of the media path the block (or a
/// multi-block wrapper) is returned; nested blocks fold their features
/// into the accumulated copy and leave a placeholder behind.
pub fn eval_media(media: &Rc<Media>, ctx: &mut EvalContext) -> Result<Node> {
    let features = media.features.borrow().clone().eval(ctx)?;
    let fresh = Rc::new(Media::new(features, Vec::new(), media.info.clone()));
    fresh.info.copy_visibility_from(&media.info);
    ctx.push_media_block(fresh.clone());

    if let Some(wrapper) = media.wrapper() {
        if let Some(registry) = ctx.frames_innermost_first().next().and_then(|f| f.registry()) {
            wrapper.function_registry.replace(Some(registry));
        }
        let evaluated = ctx.with_media_path(fresh.clone(), |ctx| {
            ctx.with_frame(Frame::Ruleset(wrapper.clone()), |ctx| eval_ruleset(&wrapper, ctx))
        })?;
        fresh.rules.replace(vec![Node::Ruleset(evaluated)]);
    }

    if ctx.media_path().is_empty() {
        Ok(eval_top(&fresh, ctx))
    } else {
        Ok(eval_nested(&fresh, ctx))
    }
}

// At the top of the media path: clear the accumulator; several blocks
// wrap into one multi-media ruleset.
fn eval_top(media: &Rc<Media>, ctx: &mut EvalContext) -> Node {
    if ctx.media_block_count() > 1 {
        let blocks = ctx.take_media_blocks();
        let selector = Selector::media_empty(&media.info);
        let wrapper = Ruleset::new(
            vec![selector],
            blocks.into_iter().map(Node::Media).collect(),
            false,
            media.info.clone(),
        );
        wrapper.multi_media.set(true);
        Node::Ruleset(Rc::new(wrapper))
    } else {
        ctx.take_media_blocks();
        Node::Media(media.clone())
    }
}

// Nested media: combine the feature sets of every block on the path
// with `and`, permuting comma alternatives, then vanish from the tree.
fn eval_nested(media: &Rc<Media>, ctx: &mut EvalContext) -> Node {
    let mut feature_paths: Vec<Vec<Node>> = Vec::new();
    for block in ctx.media_path().iter().chain(std::iter::once(media)) {
        let features = block.features.borrow().clone();
        let alternatives = match &features {
            Node::ValueList(list) => list.value.clone(),
            other => vec![other.clone()],
        };
        feature_paths.push(alternatives);
    }

    let permuted = permute(&feature_paths);
    let mut expressions: Vec<Node> = Vec::new();
    for combination in permuted {
        let mut fragments: Vec<Node> = Vec::new();
        for (i, fragment) in combination.into_iter().enumerate() {
            if i > 0 {
                fragments.push(Node::Anonymous(Rc::new(Anonymous::new(
                    "and",
                    NodeInfo::none(),
                ))));
            }
            fragments.push(fragment);
        }
        expressions.push(Node::Expression(Rc::new(Expression::new(
            fragments,
            media.info.clone(),
        ))));
    }
    media
        .features
        .replace(Node::ValueList(Rc::new(ValueList::new(expressions, media.info.clone()))));

    // The block already sits in the accumulator; its place in the tree
    // is taken by a node that outputs nothing
    Node::Ruleset(Rc::new(Ruleset::new(Vec::new(), Vec::new(), false, NodeInfo::none())))
}

// Cross product of the comma alternatives along the media path.
fn permute(arr: &[Vec<Node>]) -> Vec<Vec<Node>> {
    match arr.len() {
        0 => Vec::new(),
        1 => arr[0].iter().map(|v| vec![v.clone()]).collect(),
        _ => {
            let rest = permute(&arr[1..]);
            let mut result = Vec::new();
            for rest_item in &rest {
                for first in &arr[0] {
                    let mut combined = vec![first.clone()];
                    combined.extend(rest_item.iter().cloned());
                    result.push(combined);
                }
            }
            result
        }
    }
}

/// Evaluate a generic at-rule: prelude and body evaluate, the node
/// re-emerges structurally fresh.
pub fn eval_at_rule(at_rule: &Rc<AtRule>, ctx: &mut EvalContext) -> Result<Node> {
    let prelude = match &at_rule.prelude {
        Some(p) => Some(p.eval(ctx)?),
        None => None,
    };
    let rules = match &at_rule.rules {
        Some(body) => Some(eval_ruleset(body, ctx)?),
        None => None,
    };
    Ok(Node::AtRule(Rc::new(AtRule::new(
        &at_rule.name,
        prelude,
        rules,
        at_rule.info.clone(),
    ))))
}
