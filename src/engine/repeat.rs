//! Greedy, backtrackable repetition (`spec.md` §4.4): `any`, `some`,
//! `while`, `opt`, and the integer-prefixed exact/ranged forms.
//!
//! Every entry point here hands back candidates greedy-first — the longest
//! run of iterations first, then progressively shorter ones — rather than
//! committing to one count. [`super::try_candidates`] is what actually tries
//! each candidate against the rest of the rule; this module only has to
//! enumerate them correctly, including honoring `break`/`reject`
//! (`spec.md` §4.4) along the way.

use crate::lib::std::rc::Rc;
use crate::lib::std::vec::Vec;

use crate::bind::Bindings;
use crate::error::{ErrMode, PResult, ParseError};
use crate::eval::Evaluator;
use crate::sequence::SeqView;
use crate::value::Value;

use super::{match_rule_element, Ctx, LoopSignal};

/// Run `sub` against `input` as many times as it will greedily go, up to
/// `max` iterations (`None` for unbounded), stopping early on `break`, a
/// failed iteration, or a non-advancing (zero-width) match. Returns one
/// `(position, collect-savepoint)` pair per iteration count from the longest
/// run down to `min`, greedy-first — `spec.md` §4.4's "tries the longest
/// match first, and if the surrounding rule later fails, retries with
/// shorter matches." Fails outright (no candidates) if fewer than `min`
/// iterations were possible, or if `reject` fired on a failed iteration.
fn bounded_or_unbounded<S, B, E>(
    ctx: &mut Ctx<'_, S, B, E>,
    input: SeqView,
    sub: &Value,
    min: usize,
    max: Option<usize>,
) -> PResult<Vec<(SeqView, usize)>>
where
    B: Bindings<S>,
    E: Evaluator<S>,
{
    let mut positions: Vec<(SeqView, usize)> = Vec::new();
    positions.push((input.clone(), savepoint(ctx)));

    let mut pos = input;
    let mut count = 0usize;

    loop {
        if let Some(max) = max {
            if count >= max {
                break;
            }
        }
        ctx.check_halt()?;
        let before = pos.clone();
        match match_rule_element(ctx, pos, sub) {
            Ok(next) => {
                let broke = ctx.loop_signal.take() == Some(LoopSignal::Break);
                let advanced = next.index != before.index || !Rc::ptr_eq(&next.series, &before.series);
                pos = next;
                count += 1;
                positions.push((pos.clone(), savepoint(ctx)));
                if broke || !advanced {
                    break;
                }
            }
            Err(ErrMode::Backtrack(_)) => {
                if ctx.loop_signal.take() == Some(LoopSignal::Reject) {
                    return Err(ParseError::no_match());
                }
                break;
            }
            Err(cut) => return Err(cut),
        }
    }

    if count < min {
        return Err(ParseError::no_match());
    }

    // `positions[i]` is the position after `i` iterations; hand back every
    // count from `count` down to `min`, greedy-first.
    let candidates = (min..=count).rev().map(|i| positions[i].clone()).collect();
    Ok(candidates)
}

fn savepoint<S, B, E>(ctx: &mut Ctx<'_, S, B, E>) -> usize {
    ctx.collect.top_mut().map_or(0, |f| f.savepoint())
}

/// `min n max` / exact-`n` repetition: `integer_repeat`'s two forms both
/// reduce to this once `min`/`max` are known.
pub(crate) fn ranged<S, B, E>(
    ctx: &mut Ctx<'_, S, B, E>,
    input: SeqView,
    sub: &Value,
    min: usize,
    max: usize,
) -> PResult<Vec<(SeqView, usize)>>
where
    B: Bindings<S>,
    E: Evaluator<S>,
{
    bounded_or_unbounded(ctx, input, sub, min, Some(max))
}

/// `any`/`some`/`while`: `min` is 0 for `any`/`while`, 1 for `some`, no
/// upper bound.
pub(crate) fn unbounded<S, B, E>(
    ctx: &mut Ctx<'_, S, B, E>,
    input: SeqView,
    sub: &Value,
    min: usize,
) -> PResult<Vec<(SeqView, usize)>>
where
    B: Bindings<S>,
    E: Evaluator<S>,
{
    bounded_or_unbounded(ctx, input, sub, min, None)
}

/// `opt RULE`: zero or one match, greedy — try matching once, then fall
/// back to not matching at all. A `min` of 0 means the zero-iteration
/// candidate always survives; the only way this fails outright is `reject`
/// firing on the one attempt, which (per `spec.md` §4.4) fails the
/// repetition itself rather than silently falling back.
pub(crate) fn optional<S, B, E>(
    ctx: &mut Ctx<'_, S, B, E>,
    input: SeqView,
    sub: &Value,
) -> PResult<Vec<(SeqView, usize)>>
where
    B: Bindings<S>,
    E: Evaluator<S>,
{
    bounded_or_unbounded(ctx, input, sub, 0, Some(1))
}
