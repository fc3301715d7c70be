//! The PARSE rule interpreter (`spec.md` §4.3–§4.5): dispatch, advancement,
//! alternation backtracking, and the keyword vocabulary.
//!
//! [`parse`] is the entry point; everything else in this module exists to
//! support its recursive descent over a rule block. Matching is structured
//! as continuation-passing recursion rather than an explicit state-machine
//! loop: [`match_from`] matches "the rest of this rule block" against "the
//! input from here," and a construct with more than one possible outcome
//! (a repetition, `opt`) hands back every candidate continuation point,
//! greedy-first, for [`try_candidates`] to attempt in order against the
//! remaining rule — this is what makes repetition genuinely backtrackable
//! rather than a one-shot greedy loop, per `spec.md` §4.4's "the engine
//! tries the longest match first and, if the surrounding rule later fails,
//! retries with shorter matches."

mod alt;
mod dispatch;
mod keywords;
mod repeat;

use crate::lib::std::vec::Vec;

use crate::bind::Bindings;
use crate::collect::CollectStack;
use crate::error::{ErrMode, ErrorKind, PResult, ParseError};
use crate::eval::Evaluator;
use crate::heap::{Heap, Series, SeriesData};
use crate::sequence::{Mode, Position, SeqView};
use crate::symbol::Interner;
use crate::value::Value;

pub use keywords::Keywords;

/// Configuration for one [`parse`] invocation.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// Use strict (case-sensitive) comparison for `Text`/`Word` matching —
    /// the `/CASE` refinement in `spec.md` §4.2. Defaults to loose,
    /// case-insensitive comparison.
    pub case_sensitive: bool,
    /// Polled at the Dispatch state between rule elements and at the top of
    /// each repetition iteration (`spec.md` §5's cancellation point). A
    /// `Some(f)` where `f()` returns `true` raises [`ErrorKind::Halted`].
    pub halt: Option<fn() -> bool>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            halt: None,
        }
    }
}

/// The result of a top-level [`parse`] invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Did the rule match? Per `spec.md` §4.3, a match requires the rule to
    /// reach the input's tail — partial consumption is not success unless
    /// the rule itself ends in `end` (which already requires the tail).
    pub matched: bool,
    /// The input position reached on a successful match.
    pub tail: Option<Position>,
    /// The `Block` value produced by the last top-level `collect [...]` to
    /// commit during this invocation, if any ran (`spec.md` §6's
    /// `collected?` result field).
    pub collected: Option<Value>,
}

/// Which innermost repetition control-flow keyword fired since it was last
/// consumed, used to implement `break`/`reject` (`spec.md` §4.4) without
/// threading a third return channel through every recursive call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopSignal {
    /// `break`: exit the innermost repetition now, as a success.
    Break,
    /// `reject`: fail the innermost repetition outright, with no retry.
    Reject,
}

/// Mutable state threaded through one [`parse`] invocation.
pub(crate) struct Ctx<'a, S, B, E> {
    pub heap: &'a Heap,
    pub interner: &'a Interner,
    pub keywords: &'a Keywords,
    pub options: ParseOptions,
    pub bindings: &'a mut B,
    pub specifier: &'a S,
    pub evaluator: &'a mut E,
    pub collect: CollectStack,
    pub loop_signal: Option<LoopSignal>,
    /// The rule block's backing series, snapshotted at invocation start —
    /// compared against on every evaluator call so a `GROUP!`/`do` that
    /// mutates the rule out from under the parse is caught (`spec.md` §5's
    /// frozen-rule-block invariant).
    pub rule_series: Series,
    pub rule_snapshot: SeriesData,
    /// The `Block` produced by the most recent top-level `collect` commit.
    pub collected: Option<Value>,
}

impl<'a, S, B, E> Ctx<'a, S, B, E>
where
    B: Bindings<S>,
    E: Evaluator<S>,
{
    pub(crate) fn check_halt(&self) -> PResult<()> {
        if let Some(halt) = self.options.halt {
            if halt() {
                return Err(ErrMode::Cut(ParseError::new(ErrorKind::Halted)));
            }
        }
        Ok(())
    }

    /// Raise [`ErrorKind::AlteredRule`] if the rule block's backing series
    /// no longer matches the snapshot taken at invocation start — the only
    /// way this can happen is a `GROUP!`/`do` evaluation mutating the series
    /// the rule was built over, since the engine itself never writes to it.
    pub(crate) fn check_rule_altered(&self) -> PResult<()> {
        if *self.rule_series.borrow() != self.rule_snapshot {
            return Err(ErrMode::Cut(ParseError::new(ErrorKind::AlteredRule)));
        }
        Ok(())
    }
}

/// Run `rule` against `input`, per `spec.md` §4.3's engine contract.
///
/// `bindings` resolves `Word` rule elements and backs `Set-Word`/`copy`/
/// `set`/`mark`/`collect`'s variable targets; `evaluator` runs `Group`/
/// `Get-Group`/`do` rule elements. Both are external collaborators the
/// engine treats as opaque (`spec.md` §6).
pub fn parse<S, B, E>(
    input: &Value,
    rule: &Value,
    interner: &Interner,
    heap: &Heap,
    options: ParseOptions,
    bindings: &mut B,
    specifier: &S,
    evaluator: &mut E,
) -> PResult<Outcome>
where
    B: Bindings<S>,
    E: Evaluator<S>,
{
    let input_view = sequence_view(input).ok_or_else(|| ErrMode::Cut(ParseError::new(ErrorKind::InvalidRule(input.kind()))))?;
    let rule_view = match rule.unescape() {
        Value::Block(v) => v.clone(),
        other => return Err(ErrMode::Cut(ParseError::new(ErrorKind::InvalidRule(other.kind())))),
    };

    let keywords = Keywords::new(interner);
    let rule_series = rule_view.series.clone();
    let rule_snapshot = rule_series.borrow().clone();
    let mut ctx = Ctx {
        heap,
        interner,
        keywords: &keywords,
        options,
        bindings,
        specifier,
        evaluator,
        collect: CollectStack::new(),
        loop_signal: None,
        rule_series,
        rule_snapshot,
        collected: None,
    };

    let elements = rule_elements(&rule_view);
    match alt::match_alternatives(&mut ctx, input_view, &elements) {
        Ok(tail) if tail.at_tail() => Ok(Outcome {
            matched: true,
            tail: Some(Position {
                series: tail.series,
                index: tail.index,
            }),
            collected: ctx.collected,
        }),
        Ok(_) => Ok(Outcome {
            matched: false,
            tail: None,
            collected: None,
        }),
        Err(ErrMode::Backtrack(_)) => Ok(Outcome {
            matched: false,
            tail: None,
            collected: None,
        }),
        Err(cut) => Err(cut),
    }
}

pub(crate) fn sequence_view(value: &Value) -> Option<SeqView> {
    match value.unescape() {
        Value::Text(v) | Value::Binary(v) | Value::Block(v) => Some(v.clone()),
        _ => None,
    }
}

/// Match `rule_elem` — a single rule element, possibly itself a `Block` —
/// to completion against `input`. The shared entry point every keyword that
/// takes "a RULE operand" known in advance to be exactly one term (a
/// repetition's own body, `into`'s sub-rule, ...) uses to run that operand.
pub(crate) fn match_rule_element<S, B, E>(ctx: &mut Ctx<'_, S, B, E>, input: SeqView, rule_elem: &Value) -> PResult<SeqView>
where
    B: Bindings<S>,
    E: Evaluator<S>,
{
    let one = [rule_elem.clone()];
    match_from(ctx, input, &one)
}

/// How many raw `elements` a RULE operand starting at `elements[0]` spans —
/// 1 for a plain literal/word/Block/kind-test, 2 for `any`/`some`/`while`/
/// `opt X`, 2 or 3 for an integer-prefixed repeat. Computed from shape alone,
/// independent of whether the operand goes on to match, since keywords like
/// `not`/`then` need to know how far to advance the rule cursor even when
/// their operand's match itself fails.
fn operand_span<S, B, E>(ctx: &Ctx<'_, S, B, E>, elements: &[Value]) -> usize {
    match elements.first().map(|v| v.unescape()) {
        Some(Value::Integer(_)) => {
            if matches!(elements.get(1).map(|v| v.unescape()), Some(Value::Integer(_))) {
                3
            } else {
                2
            }
        }
        Some(Value::Word(crate::value::WordForm::Word, sym))
            if *sym == ctx.keywords.any || *sym == ctx.keywords.some || *sym == ctx.keywords.while_ || *sym == ctx.keywords.opt =>
        {
            2
        }
        _ => 1,
    }
}

/// Match the single next RULE operand found at the head of `elements` —
/// which may itself span more than one element (`some "a"` is one operand,
/// two elements) — against `input`, reporting both the match result and how
/// many elements of `elements` the operand occupied. The latter is reported
/// even on failure, since callers like `not`/`ahead` need to advance the rule
/// cursor past a failed operand just the same as a matched one.
pub(crate) fn match_rule_operand<S, B, E>(ctx: &mut Ctx<'_, S, B, E>, input: SeqView, elements: &[Value]) -> (PResult<SeqView>, usize)
where
    B: Bindings<S>,
    E: Evaluator<S>,
{
    if elements.is_empty() {
        return (Err(ParseError::cut(ErrorKind::InvalidRule(crate::value::Kind::Blank))), 0);
    }
    let span = operand_span(ctx, elements).min(elements.len());
    (match_from(ctx, input, &elements[..span]), span)
}

/// The remaining elements of a rule block, as owned clones — cloning a
/// `Value` only bumps `Rc` reference counts, never deep-copies storage.
pub(crate) fn rule_elements(view: &SeqView) -> Vec<Value> {
    view.cells_in_range(view.len())
}

/// Match every element of `elements` in sequence against `input`, recursing
/// through whatever candidates a repetition or `opt` hands back.
/// `elements.is_empty()` is the base case: the rest of the rule block has
/// been fully matched.
pub(crate) fn match_from<S, B, E>(ctx: &mut Ctx<'_, S, B, E>, input: SeqView, elements: &[Value]) -> PResult<SeqView>
where
    B: Bindings<S>,
    E: Evaluator<S>,
{
    if elements.is_empty() {
        return Ok(input);
    }
    ctx.check_halt()?;
    let (step, consumed) = dispatch::step(ctx, input, elements)?;
    let rest = &elements[consumed..];
    match step {
        dispatch::Step::One(next) => match_from(ctx, next, rest),
        dispatch::Step::Candidates(candidates) => try_candidates(ctx, candidates, rest),
    }
}

/// Try each `(position, collect-savepoint)` candidate, greedy-first,
/// against `rest`; the first one whose continuation also matches wins.
/// Restores the innermost collect frame to each candidate's savepoint
/// before trying it, so a later, shorter candidate doesn't see `keep`s a
/// longer one already performed.
pub(crate) fn try_candidates<S, B, E>(
    ctx: &mut Ctx<'_, S, B, E>,
    candidates: Vec<(SeqView, usize)>,
    rest: &[Value],
) -> PResult<SeqView>
where
    B: Bindings<S>,
    E: Evaluator<S>,
{
    let mut last_err = None;
    for (pos, savepoint) in candidates {
        if let Some(frame) = ctx.collect.top_mut() {
            frame.restore(savepoint);
        }
        match match_from(ctx, pos, rest) {
            Ok(tail) => return Ok(tail),
            Err(ErrMode::Backtrack(e)) => {
                // `reject` fails the innermost repetition outright: once a
                // candidate's continuation fails because of it, stop trying
                // shorter candidates rather than retrying — `spec.md` §4.4's
                // "fails the repetition, no fallback to fewer iterations."
                if ctx.loop_signal.take() == Some(LoopSignal::Reject) {
                    return Err(ErrMode::Backtrack(e));
                }
                last_err = Some(e);
            }
            Err(cut) => return Err(cut),
        }
    }
    Err(ErrMode::Backtrack(last_err.unwrap_or_else(|| ParseError::new(ErrorKind::NoMatch))))
}

/// Capture `input`'s position as a bindable value (`spec.md` §4.3's
/// Set-Word/`mark` target): the same view, kept at its current index — a
/// sequence value *is* a position in this model, the way a series-at-index
/// doubles as a cursor in this dialect family.
pub(crate) fn capture_position_value(input: &SeqView) -> Value {
    match input.mode() {
        Mode::Text => Value::Text(input.clone()),
        Mode::Binary => Value::Binary(input.clone()),
        Mode::Block => Value::Block(input.clone()),
    }
}

/// Resolve a `Get-Word`/`seek`-with-word target back to a position within
/// `input`'s series.
pub(crate) fn seek_to_captured(input: &SeqView, captured: &Value) -> Result<SeqView, ErrorKind> {
    let captured_view = match captured.unescape() {
        Value::Text(v) | Value::Binary(v) | Value::Block(v) => v,
        _ => return Err(ErrorKind::PositionOutOfRange),
    };
    if !crate::lib::std::rc::Rc::ptr_eq(&captured_view.series, &input.series) {
        return Err(ErrorKind::PositionOutOfRange);
    }
    Ok(input.seek(captured_view.index))
}

/// Run `block` (a `Group`/`Get-Group` value) to completion through the
/// host evaluator, folding a throw into a `Cut` error carrying the thrown
/// payload.
pub(crate) fn eval_to_completion<S, B, E>(ctx: &mut Ctx<'_, S, B, E>, block: &Value) -> PResult<Value>
where
    B: Bindings<S>,
    E: Evaluator<S>,
{
    match ctx.evaluator.evaluate(block, ctx.specifier) {
        crate::eval::Evaluated::Value(v) => {
            ctx.check_rule_altered()?;
            Ok(v)
        }
        crate::eval::Evaluated::Thrown(v) => Err(ErrMode::Cut(
            ParseError::new(ErrorKind::EvaluatorThrow).with_thrown(v),
        )),
    }
}

/// Match a single literal/type-test/bitset `target` against the element at
/// `input`'s current position (`spec.md` §4.3's Text/Binary/Char/Bitset/
/// kind-test rows), without consuming any further rule structure. Shared by
/// plain literal rule elements and by `to`/`thru`'s search target.
pub(crate) fn match_literal<S, B, E>(ctx: &Ctx<'_, S, B, E>, input: SeqView, target: &Value) -> PResult<SeqView>
where
    B: Bindings<S>,
    E: Evaluator<S>,
{
    let target = target.unescape();
    if let Value::Word(crate::value::WordForm::Word, sym) = target {
        let spelling = ctx.interner.spelling(*sym);
        if let Some(kind) = keywords::kind_test(&spelling) {
            if input.at_tail() {
                return Err(ParseError::no_match());
            }
            return if input.at().kind() == kind {
                Ok(input.skip(1))
            } else {
                Err(ParseError::no_match())
            };
        }
    }
    match target {
        Value::Text(lit) if input.mode() == Mode::Text => literal_subsequence(ctx, input, lit),
        Value::Binary(lit) if input.mode() == Mode::Binary => literal_subsequence(ctx, input, lit),
        Value::Bitset(bits) => {
            if input.at_tail() {
                return Err(ParseError::no_match());
            }
            let elem = input.at();
            let hit = match elem.unescape() {
                Value::Char(c) => bits.borrow().contains(*c),
                Value::Integer(n) => char::from_u32(*n as u32).is_some_and(|c| bits.borrow().contains(c)),
                _ => false,
            };
            if hit {
                Ok(input.skip(1))
            } else {
                Err(ParseError::no_match())
            }
        }
        _ => {
            if input.at_tail() {
                return Err(ParseError::no_match());
            }
            let elem = input.at();
            let hit = crate::compare::compare(&elem, target, crate::compare::Strictness::loose_for(ctx.options.case_sensitive))
                .unwrap_or(false);
            if hit {
                Ok(input.skip(1))
            } else {
                Err(ParseError::no_match())
            }
        }
    }
}

fn literal_subsequence<S, B, E>(_ctx: &Ctx<'_, S, B, E>, input: SeqView, lit: &SeqView) -> PResult<SeqView>
where
    B: Bindings<S>,
    E: Evaluator<S>,
{
    let len = lit.remaining();
    if input.remaining() < len {
        return Err(ParseError::no_match());
    }
    if input.equal_from(input.index, input.index + len, lit, _ctx.options.case_sensitive) {
        Ok(input.skip(len))
    } else {
        Err(ParseError::no_match())
    }
}

/// Is `target` the `end` keyword word, so `to`/`thru` can special-case
/// "search forward to the tail" instead of literal-matching the spelling
/// `end`.
pub(crate) fn is_end_keyword<S, B, E>(ctx: &Ctx<'_, S, B, E>, target: &Value) -> bool {
    matches!(target.unescape(), Value::Word(crate::value::WordForm::Word, sym) if *sym == ctx.keywords.end)
}
