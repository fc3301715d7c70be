//! Rule-element classification and keyword execution (`spec.md` §4.3–§4.4).
//!
//! [`step`] looks at the next one-or-more rule elements and returns either a
//! single deterministic continuation ([`Step::One`]) or every candidate
//! continuation a backtrackable construct could take, greedy-first
//! ([`Step::Candidates`]) — see [`super::try_candidates`] for how the caller
//! walks those candidates against the rest of the rule.

use crate::lib::std::vec::Vec;

use crate::bind::Bindings;
use crate::error::{ErrMode, ErrorKind, PResult, ParseError};
use crate::eval::{Evaluated, Evaluator};
use crate::heap::SeriesData;
use crate::sequence::{Mode, SeqView};
use crate::value::{Value, WordForm};

use super::{alt, repeat};
use super::{capture_position_value, eval_to_completion, match_literal, match_rule_element, seek_to_captured, sequence_view};
use super::Ctx;

/// What dispatching one rule-element unit produced.
pub(crate) enum Step {
    /// A deterministic continuation — the unit either matched exactly once
    /// or failed outright (failure is reported as `Err`, not as this type).
    One(SeqView),
    /// Every candidate continuation, most input consumed first. Produced by
    /// repetitions and `opt`.
    Candidates(Vec<(SeqView, usize)>),
}

/// Classify and execute the rule element(s) at the head of `elements`,
/// returning the resulting [`Step`] and how many elements of `elements` it
/// consumed.
pub(crate) fn step<S, B, E>(ctx: &mut Ctx<'_, S, B, E>, input: SeqView, elements: &[Value]) -> PResult<(Step, usize)>
where
    B: Bindings<S>,
    E: Evaluator<S>,
{
    let head = elements[0].unescape();

    // Integer repeat prefix: `n RULE` or `m n RULE`.
    if let Value::Integer(n) = head {
        return integer_repeat(ctx, input, elements, *n);
    }

    if let Value::Word(WordForm::Word, sym) = head {
        let sym = *sym;
        if sym == ctx.keywords.bar {
            // Splitting happens one level up in `alt`; a bare `|` reaching
            // `step` means it was the sole element of an (empty) alternative.
            return Err(ParseError::no_match());
        }
        if ctx.keywords.is_keyword(sym) {
            return dispatch_keyword(ctx, input, elements, sym);
        }
        let spelling = ctx.interner.spelling(sym);
        if let Some(kind) = super::keywords::kind_test(&spelling) {
            let _ = kind;
            let next = match_literal(ctx, input, elements[0].unescape())?;
            return Ok((Step::One(next), 1));
        }
        let looked_up = ctx
            .bindings
            .lookup(sym, ctx.specifier)
            .into_rule_value()
            .map_err(ParseError::cut)?;
        let next = match_rule_element(ctx, input, &looked_up)?;
        return Ok((Step::One(next), 1));
    }

    if let Value::Word(WordForm::SetWord, sym) = head {
        ctx.bindings.set(*sym, ctx.specifier, capture_position_value(&input));
        return Ok((Step::One(input), 1));
    }

    if let Value::Word(WordForm::GetWord, sym) = head {
        let captured = ctx
            .bindings
            .lookup(*sym, ctx.specifier)
            .into_rule_value()
            .map_err(ParseError::cut)?;
        let next = seek_to_captured(&input, &captured).map_err(ParseError::cut)?;
        return Ok((Step::One(next), 1));
    }

    if let Value::Block(sub) = head {
        let inner = super::rule_elements(sub);
        let next = alt::match_alternatives(ctx, input, &inner)?;
        return Ok((Step::One(next), 1));
    }

    if let Value::Group(g) = head {
        eval_to_completion(ctx, &Value::Group(g.clone()))?;
        return Ok((Step::One(input), 1));
    }

    if let Value::GetGroup(g) = head {
        let result = eval_to_completion(ctx, &Value::GetGroup(g.clone()))?;
        if result.is_falsy() {
            return Err(ParseError::no_match());
        }
        if let Value::Logic(true) = result.unescape() {
            return Ok((Step::One(input), 1));
        }
        let next = match_rule_element(ctx, input, &result)?;
        return Ok((Step::One(next), 1));
    }

    if let Value::Tag(sym) = head {
        if input.mode() == Mode::Text {
            let next = match_tag_as_text(&input, *sym, ctx.interner)?;
            return Ok((Step::One(next), 1));
        }
        let next = match_literal(ctx, input, elements[0].unescape())?;
        return Ok((Step::One(next), 1));
    }

    // Everything else (Text/Binary literal, Char, Bitset, lit-word,
    // refinement, issue, ...) matches as a plain literal at this position.
    let next = match_literal(ctx, input, elements[0].unescape())?;
    Ok((Step::One(next), 1))
}

fn match_tag_as_text(input: &SeqView, sym: crate::symbol::Symbol, interner: &crate::symbol::Interner) -> PResult<SeqView> {
    let spelling = interner.spelling(sym);
    let mut raw: Vec<char> = Vec::new();
    raw.push('<');
    raw.extend(spelling.chars());
    raw.push('>');
    if input.remaining() < raw.len() {
        return Err(ParseError::no_match());
    }
    let hit = match &*input.series.borrow() {
        SeriesData::Text { chars } => (0..raw.len()).all(|i| chars[input.index + i] == raw[i]),
        _ => false,
    };
    if hit {
        Ok(input.skip(raw.len()))
    } else {
        Err(ParseError::no_match())
    }
}

fn integer_repeat<S, B, E>(ctx: &mut Ctx<'_, S, B, E>, input: SeqView, elements: &[Value], n: i64) -> PResult<(Step, usize)>
where
    B: Bindings<S>,
    E: Evaluator<S>,
{
    let min = n.max(0) as usize;
    if let Some(Value::Integer(m)) = elements.get(1).map(|v| v.unescape()) {
        let sub = elements
            .get(2)
            .ok_or_else(|| ParseError::cut(ErrorKind::InvalidRule(crate::value::Kind::Integer)))?;
        let max = (*m).max(0) as usize;
        let candidates = repeat::ranged(ctx, input, sub, min, max)?;
        return Ok((Step::Candidates(candidates), 3));
    }
    let sub = elements
        .get(1)
        .ok_or_else(|| ParseError::cut(ErrorKind::InvalidRule(crate::value::Kind::Integer)))?;
    let candidates = repeat::ranged(ctx, input, sub, min, min)?;
    Ok((Step::Candidates(candidates), 2))
}

fn dispatch_keyword<S, B, E>(
    ctx: &mut Ctx<'_, S, B, E>,
    input: SeqView,
    elements: &[Value],
    sym: crate::symbol::Symbol,
) -> PResult<(Step, usize)>
where
    B: Bindings<S>,
    E: Evaluator<S>,
{
    let kw = ctx.keywords;

    if sym == kw.end {
        return if input.at_tail() {
            Ok((Step::One(input), 1))
        } else {
            Err(ParseError::no_match())
        };
    }
    if sym == kw.skip {
        return if input.at_tail() {
            Err(ParseError::no_match())
        } else {
            Ok((Step::One(input.skip(1)), 1))
        };
    }
    if sym == kw.any || sym == kw.some || sym == kw.while_ {
        let sub = require(elements, 1)?;
        let min = if sym == kw.some { 1 } else { 0 };
        let candidates = repeat::unbounded(ctx, input, sub, min)?;
        return Ok((Step::Candidates(candidates), 2));
    }
    if sym == kw.opt {
        let sub = require(elements, 1)?;
        let candidates = repeat::optional(ctx, input, sub)?;
        return Ok((Step::Candidates(candidates), 2));
    }
    if sym == kw.not {
        let (result, span) = super::match_rule_operand(ctx, input.clone(), &elements[1..]);
        return match result {
            Ok(_) => Err(ParseError::no_match()),
            Err(ErrMode::Backtrack(_)) => Ok((Step::One(input), 1 + span)),
            Err(cut) => Err(cut),
        };
    }
    if sym == kw.ahead || sym == kw.and {
        let (result, span) = super::match_rule_operand(ctx, input.clone(), &elements[1..]);
        return match result {
            Ok(_) => Ok((Step::One(input), 1 + span)),
            Err(ErrMode::Backtrack(e)) => Err(ErrMode::Backtrack(e)),
            Err(cut) => Err(cut),
        };
    }
    if sym == kw.to || sym == kw.thru {
        let target = require(elements, 1)?;
        let (found, after) = search_forward(ctx, input, target)?;
        return Ok((Step::One(if sym == kw.to { found } else { after }), 2));
    }
    if sym == kw.seek {
        let target = require(elements, 1)?;
        let next = do_seek(ctx, &input, target)?;
        return Ok((Step::One(next), 2));
    }
    if sym == kw.mark {
        let target = require(elements, 1)?;
        if let Value::Word(_, w) = target.unescape() {
            ctx.bindings.set(*w, ctx.specifier, capture_position_value(&input));
        }
        return Ok((Step::One(input), 2));
    }
    if sym == kw.copy {
        let w = require(elements, 1)?;
        let before = input.clone();
        let (result, span) = super::match_rule_operand(ctx, input, &elements[2..]);
        let after = result?;
        if let Value::Word(_, wsym) = w.unescape() {
            let copied = before.copy_range(after.index, ctx.heap);
            ctx.bindings.set(*wsym, ctx.specifier, copied);
        }
        return Ok((Step::One(after), 2 + span));
    }
    if sym == kw.set {
        let w = require(elements, 1)?;
        let before = input.clone();
        let (result, span) = super::match_rule_operand(ctx, input, &elements[2..]);
        let after = result?;
        if let Value::Word(_, wsym) = w.unescape() {
            let first = if after.index > before.index { before.at() } else { Value::Blank };
            ctx.bindings.set(*wsym, ctx.specifier, first);
        }
        return Ok((Step::One(after), 2 + span));
    }
    if sym == kw.into {
        let sub = require(elements, 1)?;
        if input.at_tail() {
            return Err(ParseError::cut(ErrorKind::IntoTypeMismatch));
        }
        let inner = input.at();
        let nested = sequence_view(&inner).ok_or_else(|| ParseError::cut(ErrorKind::IntoTypeMismatch))?;
        return match match_rule_element(ctx, nested, sub) {
            Ok(tail) if tail.at_tail() => Ok((Step::One(input.skip(1)), 2)),
            Ok(_) => Err(ParseError::no_match()),
            Err(ErrMode::Backtrack(_)) => Err(ParseError::no_match()),
            Err(cut) => Err(cut),
        };
    }
    if sym == kw.collect {
        return dispatch_collect(ctx, input, elements);
    }
    if sym == kw.keep {
        return dispatch_keep(ctx, input, elements, kw);
    }
    if sym == kw.break_ {
        ctx.loop_signal = Some(super::LoopSignal::Break);
        return Ok((Step::One(input), 1));
    }
    if sym == kw.reject {
        ctx.loop_signal = Some(super::LoopSignal::Reject);
        return Err(ParseError::no_match());
    }
    if sym == kw.fail {
        return Err(ParseError::no_match());
    }
    if sym == kw.do_ {
        return dispatch_do(ctx, input, &elements[1..]);
    }
    if sym == kw.remove {
        let before = input.clone();
        let (result, span) = super::match_rule_operand(ctx, input, &elements[1..]);
        let after = result?;
        mutate_remove(&before, after.index);
        return Ok((Step::One(before), 1 + span));
    }
    if sym == kw.insert {
        let value_elem = require(elements, 1)?;
        let value = resolve_value_operand(ctx, value_elem)?;
        mutate_splice(&input, input.index..input.index, &value).map_err(ParseError::cut)?;
        return Ok((Step::One(input), 2));
    }
    if sym == kw.change {
        let before = input.clone();
        let (result, span) = super::match_rule_operand(ctx, input, &elements[1..]);
        let after = result?;
        let value_elem = require(elements, 1 + span)?;
        let value = resolve_value_operand(ctx, value_elem)?;
        mutate_splice(&before, before.index..after.index, &value).map_err(ParseError::cut)?;
        return Ok((Step::One(before), 1 + span + 1));
    }
    if sym == kw.then {
        // A transparent pass-through: `then RULE` matches iff `RULE`
        // matches. The "don't retry the alternative that got here" half of
        // `spec.md`'s description isn't separately modeled — see DESIGN.md.
        let (result, span) = super::match_rule_operand(ctx, input, &elements[1..]);
        let after = result?;
        return Ok((Step::One(after), 1 + span));
    }

    Err(ParseError::cut(ErrorKind::InvalidRule(elements[0].kind())))
}

fn require<'e>(elements: &'e [Value], index: usize) -> PResult<&'e Value> {
    elements
        .get(index)
        .ok_or_else(|| ParseError::cut(ErrorKind::InvalidRule(crate::value::Kind::Blank)))
}

fn search_forward<S, B, E>(ctx: &Ctx<'_, S, B, E>, mut input: SeqView, target: &Value) -> PResult<(SeqView, SeqView)>
where
    B: Bindings<S>,
    E: Evaluator<S>,
{
    if super::is_end_keyword(ctx, target) {
        let tail = input.seek(input.len());
        return Ok((tail.clone(), tail));
    }
    loop {
        if let Ok(after) = match_literal(ctx, input.clone(), target.unescape()) {
            return Ok((input, after));
        }
        if input.at_tail() {
            return Err(ParseError::no_match());
        }
        input = input.skip(1);
    }
}

fn do_seek<S, B, E>(ctx: &Ctx<'_, S, B, E>, input: &SeqView, target: &Value) -> PResult<SeqView>
where
    B: Bindings<S>,
    E: Evaluator<S>,
{
    match target.unescape() {
        Value::Integer(n) => {
            let index = (*n - 1).max(0) as usize;
            Ok(input.seek(index))
        }
        Value::Word(_, sym) => {
            let captured = ctx
                .bindings
                .lookup(*sym, ctx.specifier)
                .into_rule_value()
                .map_err(ParseError::cut)?;
            seek_to_captured(input, &captured).map_err(ParseError::cut)
        }
        other => Err(ParseError::cut(ErrorKind::InvalidRule(other.kind()))),
    }
}

fn dispatch_collect<S, B, E>(
    ctx: &mut Ctx<'_, S, B, E>,
    input: SeqView,
    elements: &[Value],
) -> PResult<(Step, usize)>
where
    B: Bindings<S>,
    E: Evaluator<S>,
{
    let second = require(elements, 1)?;
    let (target, sub, consumed) = match second.unescape() {
        Value::Word(WordForm::Word, sym) => (Some(*sym), require(elements, 2)?, 3),
        _ => (None, second, 2),
    };
    ctx.collect.push(target);
    match match_rule_element(ctx, input, sub) {
        Ok(after) => {
            let result = ctx.collect.commit(ctx.heap, ctx.bindings, ctx.specifier);
            if ctx.collect.depth() == 0 {
                ctx.collected = Some(result);
            }
            Ok((Step::One(after), consumed))
        }
        Err(ErrMode::Backtrack(e)) => {
            ctx.collect.pop_and_discard();
            Err(ErrMode::Backtrack(e))
        }
        Err(cut) => {
            ctx.collect.pop_and_discard();
            Err(cut)
        }
    }
}

fn dispatch_keep<S, B, E>(
    ctx: &mut Ctx<'_, S, B, E>,
    input: SeqView,
    elements: &[Value],
    kw: &super::keywords::Keywords,
) -> PResult<(Step, usize)>
where
    B: Bindings<S>,
    E: Evaluator<S>,
{
    let mut idx = 1;
    let mut only = false;
    if let Some(Value::Word(WordForm::Word, sym)) = elements.get(idx).map(|v| v.unescape()) {
        if *sym == kw.only {
            only = true;
            idx += 1;
        }
    }
    let operand = require(elements, idx)?;

    match operand.unescape() {
        Value::Group(g) | Value::GetGroup(g) => {
            let result = eval_to_completion(ctx, &Value::Group(g.clone()))?;
            keep_evaluated(ctx, result, only);
            Ok((Step::One(input), idx + 1))
        }
        _ => {
            let before = input.clone();
            let (result, span) = super::match_rule_operand(ctx, input, &elements[idx..]);
            let after = result?;
            if only {
                let cells = before.cells_in_range(after.index);
                ctx.collect.keep_only(cells, ctx.heap);
            } else {
                match before.mode() {
                    Mode::Block => ctx.collect.keep_spread(before.cells_in_range(after.index)),
                    Mode::Text | Mode::Binary => ctx.collect.keep_one(before.copy_range(after.index, ctx.heap)),
                }
            }
            Ok((Step::One(after), idx + span))
        }
    }
}

fn keep_evaluated<S, B, E>(ctx: &mut Ctx<'_, S, B, E>, result: Value, only: bool)
where
    B: Bindings<S>,
    E: Evaluator<S>,
{
    if result.is_null() {
        return;
    }
    if only {
        ctx.collect.keep_only(vec![result], ctx.heap);
        return;
    }
    match result {
        Value::Block(v) => ctx.collect.keep_spread(v.cells_in_range(v.len())),
        other => ctx.collect.keep_one(other),
    }
}

fn dispatch_do<S, B, E>(ctx: &mut Ctx<'_, S, B, E>, input: SeqView, rest: &[Value]) -> PResult<(Step, usize)>
where
    B: Bindings<S>,
    E: Evaluator<S>,
{
    if input.mode() != Mode::Block {
        return Err(ParseError::cut(ErrorKind::InvalidRule(crate::value::Kind::Block)));
    }
    let remaining = Value::Block(input.clone());
    let (evaluated, consumed_cells) = ctx.evaluator.evaluate_one(&remaining, ctx.specifier);
    let result = match evaluated {
        Evaluated::Value(v) => {
            ctx.check_rule_altered()?;
            v
        }
        Evaluated::Thrown(v) => return Err(ErrMode::Cut(ParseError::new(ErrorKind::EvaluatorThrow).with_thrown(v))),
    };
    let pseudo = SeqView::at_head(ctx.heap.alloc(SeriesData::Block(vec![result])));
    let (op_result, span) = super::match_rule_operand(ctx, pseudo, rest);
    op_result?;
    Ok((Step::One(input.skip(consumed_cells)), 1 + span))
}

fn resolve_value_operand<S, B, E>(ctx: &mut Ctx<'_, S, B, E>, value_elem: &Value) -> PResult<Value>
where
    B: Bindings<S>,
    E: Evaluator<S>,
{
    match value_elem.unescape() {
        Value::Group(g) => eval_to_completion(ctx, &Value::Group(g.clone())),
        other => Ok(other.clone()),
    }
}

fn mutate_remove(view: &SeqView, end: usize) {
    match &mut *view.series.borrow_mut() {
        SeriesData::Text { chars } => {
            chars.drain(view.index..end);
        }
        SeriesData::Binary(b) => {
            b.drain(view.index..end);
        }
        SeriesData::Block(b) => {
            b.drain(view.index..end);
        }
    }
}

fn mutate_splice(view: &SeqView, range: crate::lib::std::ops::Range<usize>, value: &Value) -> Result<(), ErrorKind> {
    match &mut *view.series.borrow_mut() {
        SeriesData::Text { chars } => {
            let new_chars: Vec<char> = match value.unescape() {
                Value::Char(c) => vec![*c],
                Value::Text(v) => v
                    .cells_in_range(v.len())
                    .into_iter()
                    .filter_map(|c| if let Value::Char(ch) = c { Some(ch) } else { None })
                    .collect(),
                _ => return Err(ErrorKind::IntoTypeMismatch),
            };
            chars.splice(range, new_chars);
        }
        SeriesData::Binary(bytes) => {
            let new_bytes: Vec<u8> = match value.unescape() {
                Value::Integer(n) => vec![*n as u8],
                Value::Binary(v) => v
                    .cells_in_range(v.len())
                    .into_iter()
                    .filter_map(|c| if let Value::Integer(n) = c { Some(n as u8) } else { None })
                    .collect(),
                _ => return Err(ErrorKind::IntoTypeMismatch),
            };
            bytes.splice(range, new_bytes);
        }
        SeriesData::Block(items) => {
            let new_items: Vec<Value> = match value.unescape() {
                Value::Block(v) => v.cells_in_range(v.len()),
                other => vec![other.clone()],
            };
            items.splice(range, new_items);
        }
    }
    Ok(())
}
