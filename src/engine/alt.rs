//! Top-level `|` alternation (`spec.md` §4.4): `A | B | C` tries each
//! branch in order at the same starting position, the first one to match
//! wins, and a branch's `keep`s/bindings so far are rolled back before the
//! next branch is attempted.
//!
//! A bare rule block with no `|` at all is just one alternative — `parse`
//! and every `Block`/sub-rule element route through [`match_alternatives`]
//! rather than `match_from` directly, so that case falls out of the same
//! code path instead of needing a special case.

use crate::lib::std::vec::Vec;

use crate::bind::Bindings;
use crate::error::{ErrMode, ErrorKind, PResult, ParseError};
use crate::eval::Evaluator;
use crate::sequence::SeqView;
use crate::value::{Value, WordForm};

use super::{match_from, Ctx};

/// Is `elem` the `|` keyword word?
fn is_bar<S, B, E>(ctx: &Ctx<'_, S, B, E>, elem: &Value) -> bool {
    matches!(elem.unescape(), Value::Word(WordForm::Word, sym) if *sym == ctx.keywords.bar)
}

/// Split `elements` on top-level `|` into its alternatives. Does not
/// recurse into nested `Block`s — a `|` inside a parenthesized sub-block is
/// that sub-block's own alternation, already handled when `step` dispatches
/// into it.
fn split_bar<'e, S, B, E>(ctx: &Ctx<'_, S, B, E>, elements: &'e [Value]) -> Vec<&'e [Value]> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, elem) in elements.iter().enumerate() {
        if is_bar(ctx, elem) {
            parts.push(&elements[start..i]);
            start = i + 1;
        }
    }
    parts.push(&elements[start..]);
    parts
}

/// Try every `|`-separated alternative of `elements` against `input`, in
/// order, at the same starting position. The first alternative that
/// matches wins; a `collect` frame open around this alternation is restored
/// to its pre-attempt savepoint before each subsequent alternative runs, so
/// an abandoned branch's `keep`s never leak into the next one.
pub(crate) fn match_alternatives<S, B, E>(ctx: &mut Ctx<'_, S, B, E>, input: SeqView, elements: &[Value]) -> PResult<SeqView>
where
    B: Bindings<S>,
    E: Evaluator<S>,
{
    let alternatives = split_bar(ctx, elements);
    if alternatives.len() == 1 {
        return match_from(ctx, input, alternatives[0]);
    }

    let savepoint = ctx.collect.top_mut().map(|f| f.savepoint());
    let mut last_err = None;
    for alt in alternatives {
        if let (Some(sp), Some(frame)) = (savepoint, ctx.collect.top_mut()) {
            frame.restore(sp);
        }
        match match_from(ctx, input.clone(), alt) {
            Ok(tail) => return Ok(tail),
            Err(ErrMode::Backtrack(e)) => last_err = Some(e),
            Err(cut) => return Err(cut),
        }
    }
    Err(ErrMode::Backtrack(last_err.unwrap_or_else(|| ParseError::new(ErrorKind::NoMatch))))
}
