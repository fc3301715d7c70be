//! End-to-end coverage of [`ravel::engine::parse`]: the concrete scenarios
//! and property shapes a rule interpreter like this one has to get right —
//! literal matching, `seek`, `collect`/`keep` (plain, `only`, and spread
//! across two sub-runs), a `do`-driven evaluator handoff, and alternation.
//!
//! Rules are built by hand as `Value` trees here, the same way a host
//! embedding this engine would construct them — there is no textual rule
//! reader in this crate (`spec.md` §6: the dialect's surface syntax is the
//! host's concern, not the engine's).

use std::collections::HashMap;

use ravel::bind::{Bindings, Lookup, NoBindings, SetOutcome};
use ravel::engine::{parse, ParseOptions};
use ravel::error::{ErrMode, ErrorKind};
use ravel::eval::{Evaluated, Evaluator, NoEvaluator};
use ravel::heap::{Heap, Series, SeriesData};
use ravel::sequence::SeqView;
use ravel::symbol::{Interner, Symbol};
use ravel::value::{Value, WordForm};

/// Shared value/series builders for one test's input and rule.
struct Fixture {
    heap: Heap,
    interner: Interner,
}

impl Fixture {
    fn new() -> Self {
        Self {
            heap: Heap::new(),
            interner: Interner::new(),
        }
    }

    fn word(&self, spelling: &str) -> Value {
        Value::Word(WordForm::Word, self.interner.intern(spelling))
    }

    fn lit_word(&self, spelling: &str) -> Value {
        Value::Word(WordForm::LitWord, self.interner.intern(spelling))
    }

    fn text(&self, s: &str) -> Value {
        Value::Text(SeqView::at_head(self.heap.alloc(SeriesData::Text { chars: s.chars().collect() })))
    }

    fn block(&self, items: Vec<Value>) -> Value {
        Value::Block(SeqView::at_head(self.heap.alloc(SeriesData::Block(items))))
    }

    fn integers(&self, items: &[i64]) -> Value {
        self.block(items.iter().copied().map(Value::Integer).collect())
    }
}

/// A minimal word-scope: enough for `collect`/`set`/`mark`/`copy` targets.
#[derive(Default)]
struct Scope(HashMap<Symbol, Value>);

impl Bindings<()> for Scope {
    fn lookup(&self, word: Symbol, _specifier: &()) -> Lookup {
        match self.0.get(&word) {
            Some(v) => Lookup::Found(v.clone()),
            None => Lookup::Unbound,
        }
    }

    fn set(&mut self, word: Symbol, _specifier: &(), value: Value) -> SetOutcome {
        self.0.insert(word, value);
        SetOutcome::Ok
    }
}

/// Stands in for a host language's `do` engine, recognizing exactly the two
/// expression shapes these scenarios exercise: integer addition and a
/// `reverse copy [...]` call. Not a general evaluator.
struct Toy<'a> {
    interner: &'a Interner,
    heap: &'a Heap,
}

impl Evaluator<()> for Toy<'_> {
    fn evaluate(&mut self, block: &Value, _specifier: &()) -> Evaluated {
        Evaluated::Thrown(block.clone())
    }

    fn evaluate_one(&mut self, remaining: &Value, _specifier: &()) -> (Evaluated, usize) {
        let view = match remaining.unescape() {
            Value::Block(v) => v.clone(),
            _ => return (Evaluated::Thrown(remaining.clone()), 0),
        };
        let cells = view.cells_in_range(view.len());

        if let [Value::Integer(a), Value::Word(_, op), Value::Integer(b), ..] = cells.as_slice() {
            if self.interner.is(*op, "+") {
                return (Evaluated::Value(Value::Integer(a + b)), 3);
            }
        }
        if let [Value::Word(_, w1), Value::Word(_, w2), Value::Block(inner), ..] = cells.as_slice() {
            if self.interner.is(*w1, "reverse") && self.interner.is(*w2, "copy") {
                let mut items = inner.cells_in_range(inner.len());
                items.reverse();
                let result = Value::Block(SeqView::at_head(self.heap.alloc(SeriesData::Block(items))));
                return (Evaluated::Value(result), 3);
            }
        }
        (Evaluated::Thrown(remaining.clone()), 0)
    }
}

fn text_of(value: &Value) -> String {
    match value.unescape() {
        Value::Text(v) => v.cells_in_range(v.len()).into_iter().map(|c| match c {
            Value::Char(c) => c,
            _ => unreachable!(),
        }).collect(),
        other => panic!("expected Text, got {other:?}"),
    }
}

fn block_of(value: &Value) -> Vec<Value> {
    match value.unescape() {
        Value::Block(v) => v.cells_in_range(v.len()),
        other => panic!("expected Block, got {other:?}"),
    }
}

// 1. "abc" ; ["abc" end] -> matched, tail at position 3.
#[test]
fn literal_text_match_reaches_the_tail() {
    let f = Fixture::new();
    let input = f.text("abc");
    let rule = f.block(vec![f.text("abc"), f.word("end")]);
    let outcome = parse(&input, &rule, &f.interner, &f.heap, ParseOptions::default(), &mut NoBindings, &(), &mut NoEvaluator).unwrap();
    assert!(outcome.matched);
    assert_eq!(outcome.tail.unwrap().index, 3);
}

// 2. "abcd" ; [seek 3 "cd" end] -> matched. `seek 3` resolves 1-indexed
// position 3 to codepoint index 2; "cd" then matches to the tail (index 4).
#[test]
fn seek_then_literal_reaches_the_tail() {
    let f = Fixture::new();
    let input = f.text("abcd");
    let rule = f.block(vec![f.word("seek"), Value::Integer(3), f.text("cd"), f.word("end")]);
    let outcome = parse(&input, &rule, &f.interner, &f.heap, ParseOptions::default(), &mut NoBindings, &(), &mut NoEvaluator).unwrap();
    assert!(outcome.matched);
    assert_eq!(outcome.tail.unwrap().index, 4);
}

// 3. [1 2 3] ; [collect x [keep integer! keep integer!]] -> x = [1 2].
#[test]
fn collect_gathers_two_plain_keeps() {
    let f = Fixture::new();
    let input = f.integers(&[1, 2, 3]);
    let rule = f.block(vec![
        f.word("collect"),
        f.word("x"),
        f.block(vec![f.word("keep"), f.word("integer!"), f.word("keep"), f.word("integer!")]),
    ]);
    let mut scope = Scope::default();
    let outcome = parse(&input, &rule, &f.interner, &f.heap, ParseOptions::default(), &mut scope, &(), &mut NoEvaluator).unwrap();
    assert!(outcome.matched);

    let x = f.interner.intern("x");
    let Lookup::Found(collected) = scope.lookup(x, &()) else {
        panic!("x was never bound");
    };
    assert_eq!(block_of(&collected), vec![Value::Integer(1), Value::Integer(2)]);
}

// 4. [1 2 3] ; [collect x [some [keep only integer!]]] -> x = [[1] [2] [3]].
#[test]
fn collect_keep_only_wraps_each_iteration() {
    let f = Fixture::new();
    let input = f.integers(&[1, 2, 3]);
    let rule = f.block(vec![
        f.word("collect"),
        f.word("x"),
        f.block(vec![f.word("some"), f.block(vec![f.word("keep"), f.word("only"), f.word("integer!")])]),
    ]);
    let mut scope = Scope::default();
    let outcome = parse(&input, &rule, &f.interner, &f.heap, ParseOptions::default(), &mut scope, &(), &mut NoEvaluator).unwrap();
    assert!(outcome.matched);

    let x = f.interner.intern("x");
    let Lookup::Found(collected) = scope.lookup(x, &()) else {
        panic!("x was never bound");
    };
    let wrapped: Vec<Vec<Value>> = block_of(&collected).iter().map(block_of).collect();
    assert_eq!(
        wrapped,
        vec![vec![Value::Integer(1)], vec![Value::Integer(2)], vec![Value::Integer(3)]]
    );
}

// 5. "aaabbb" ; [collect x [keep some "a" keep some "b"]] -> x = ["aaa" "bbb"].
// Exercises a `keep` operand that is itself a multi-element term (`some "a"`,
// not just a bare literal).
#[test]
fn collect_keep_some_runs() {
    let f = Fixture::new();
    let input = f.text("aaabbb");
    let rule = f.block(vec![
        f.word("collect"),
        f.word("x"),
        f.block(vec![
            f.word("keep"),
            f.word("some"),
            f.text("a"),
            f.word("keep"),
            f.word("some"),
            f.text("b"),
        ]),
    ]);
    let mut scope = Scope::default();
    let outcome = parse(&input, &rule, &f.interner, &f.heap, ParseOptions::default(), &mut scope, &(), &mut NoEvaluator).unwrap();
    assert!(outcome.matched);

    let x = f.interner.intern("x");
    let Lookup::Found(collected) = scope.lookup(x, &()) else {
        panic!("x was never bound");
    };
    let kept: Vec<String> = block_of(&collected).iter().map(text_of).collect();
    assert_eq!(kept, vec!["aaa".to_string(), "bbb".to_string()]);
}

// 6. [1 + 2] ; [do integer! end] -> matched (the sub-evaluator reduces
// `1 + 2` to `3`, which then matches `integer!`).
#[test]
fn do_matches_the_evaluators_reduced_result() {
    let f = Fixture::new();
    let input = f.block(vec![Value::Integer(1), f.word("+"), Value::Integer(2)]);
    let rule = f.block(vec![f.word("do"), f.word("integer!"), f.word("end")]);
    let mut evaluator = Toy { interner: &f.interner, heap: &f.heap };
    let outcome = parse(&input, &rule, &f.interner, &f.heap, ParseOptions::default(), &mut NoBindings, &(), &mut evaluator).unwrap();
    assert!(outcome.matched);
}

// 7. "aa" ; [some "a" reject] -> not matched (`reject` cancels the
// surrounding repetition, with no fallback to fewer iterations).
#[test]
fn reject_cancels_the_repetition_outright() {
    let f = Fixture::new();
    let input = f.text("aa");
    let rule = f.block(vec![f.word("some"), f.text("a"), f.word("reject")]);
    let outcome = parse(&input, &rule, &f.interner, &f.heap, ParseOptions::default(), &mut NoBindings, &(), &mut NoEvaluator).unwrap();
    assert!(!outcome.matched);
}

// 8. "aabb" ; [some ["a" reject] to end] -> not matched.
#[test]
fn reject_inside_the_repeated_body_fails_it() {
    let f = Fixture::new();
    let input = f.text("aabb");
    let rule = f.block(vec![
        f.word("some"),
        f.block(vec![f.text("a"), f.word("reject")]),
        f.word("to"),
        f.word("end"),
    ]);
    let outcome = parse(&input, &rule, &f.interner, &f.heap, ParseOptions::default(), &mut NoBindings, &(), &mut NoEvaluator).unwrap();
    assert!(!outcome.matched);
}

// 9. [reverse copy [a b c]] ; [do [into ['c 'b 'a]] end] -> matched.
#[test]
fn do_into_matches_a_nested_block_result() {
    let f = Fixture::new();
    let input = f.block(vec![f.word("reverse"), f.word("copy"), f.block(vec![f.word("a"), f.word("b"), f.word("c")])]);
    let rule = f.block(vec![
        f.word("do"),
        f.block(vec![f.word("into"), f.block(vec![f.lit_word("c"), f.lit_word("b"), f.lit_word("a")])]),
        f.word("end"),
    ]);
    let mut evaluator = Toy { interner: &f.interner, heap: &f.heap };
    let outcome = parse(&input, &rule, &f.interner, &f.heap, ParseOptions::default(), &mut NoBindings, &(), &mut evaluator).unwrap();
    assert!(outcome.matched);
}

// Boundary behaviors called out alongside the scenarios above.
#[test]
fn end_on_empty_input_succeeds() {
    let f = Fixture::new();
    let input = f.text("");
    let rule = f.block(vec![f.word("end")]);
    let outcome = parse(&input, &rule, &f.interner, &f.heap, ParseOptions::default(), &mut NoBindings, &(), &mut NoEvaluator).unwrap();
    assert!(outcome.matched);
}

#[test]
fn skip_on_empty_input_fails() {
    let f = Fixture::new();
    let input = f.text("");
    let rule = f.block(vec![f.word("skip"), f.word("end")]);
    let outcome = parse(&input, &rule, &f.interner, &f.heap, ParseOptions::default(), &mut NoBindings, &(), &mut NoEvaluator).unwrap();
    assert!(!outcome.matched);
}

#[test]
fn any_on_empty_input_succeeds_without_advancing() {
    let f = Fixture::new();
    let input = f.text("");
    let rule = f.block(vec![f.word("any"), f.text("a"), f.word("end")]);
    let outcome = parse(&input, &rule, &f.interner, &f.heap, ParseOptions::default(), &mut NoBindings, &(), &mut NoEvaluator).unwrap();
    assert!(outcome.matched);
    assert_eq!(outcome.tail.unwrap().index, 0);
}

#[test]
fn some_on_empty_input_fails() {
    let f = Fixture::new();
    let input = f.text("");
    let rule = f.block(vec![f.word("some"), f.text("a"), f.word("end")]);
    let outcome = parse(&input, &rule, &f.interner, &f.heap, ParseOptions::default(), &mut NoBindings, &(), &mut NoEvaluator).unwrap();
    assert!(!outcome.matched);
}

#[test]
fn opt_never_fails() {
    let f = Fixture::new();
    let input = f.text("b");
    let rule = f.block(vec![f.word("opt"), f.text("a"), f.text("b"), f.word("end")]);
    let outcome = parse(&input, &rule, &f.interner, &f.heap, ParseOptions::default(), &mut NoBindings, &(), &mut NoEvaluator).unwrap();
    assert!(outcome.matched);
}

// A rule that matches a prefix but never reaches the input's tail (no `end`,
// no exhausting repeat) is not a match — partial consumption isn't success.
#[test]
fn partial_match_without_reaching_tail_does_not_match() {
    let f = Fixture::new();
    let input = f.text("abc");
    let rule = f.block(vec![f.text("ab")]);
    let outcome = parse(&input, &rule, &f.interner, &f.heap, ParseOptions::default(), &mut NoBindings, &(), &mut NoEvaluator).unwrap();
    assert!(!outcome.matched);
}

// Anonymous `collect [...]` (no target word) still threads its committed
// result back out through `Outcome::collected`, not just a named target.
#[test]
fn anonymous_collect_result_is_surfaced_on_outcome() {
    let f = Fixture::new();
    let input = f.integers(&[1, 2]);
    let rule = f.block(vec![
        f.word("collect"),
        f.block(vec![f.word("keep"), f.word("integer!"), f.word("keep"), f.word("integer!")]),
        f.word("end"),
    ]);
    let outcome = parse(&input, &rule, &f.interner, &f.heap, ParseOptions::default(), &mut NoBindings, &(), &mut NoEvaluator).unwrap();
    assert!(outcome.matched);
    let collected = outcome.collected.expect("anonymous collect should surface its result");
    assert_eq!(block_of(&collected), vec![Value::Integer(1), Value::Integer(2)]);
}

/// An evaluator that mutates the rule block's own backing series when run —
/// standing in for a host `GROUP!`/`do` implementation that (mis)behaves
/// this way — so [`group_mutating_the_rule_block_is_caught_as_altered_rule`]
/// can confirm the engine detects it.
struct Saboteur {
    target: Series,
}

impl Evaluator<()> for Saboteur {
    fn evaluate(&mut self, block: &Value, _specifier: &()) -> Evaluated {
        if let SeriesData::Block(items) = &mut *self.target.borrow_mut() {
            items.push(Value::Integer(99));
        }
        Evaluated::Value(block.clone())
    }

    fn evaluate_one(&mut self, remaining: &Value, _specifier: &()) -> (Evaluated, usize) {
        (Evaluated::Thrown(remaining.clone()), 0)
    }
}

#[test]
fn group_mutating_the_rule_block_is_caught_as_altered_rule() {
    let f = Fixture::new();
    let input = f.text("a");
    let group_body = match f.block(vec![]) {
        Value::Block(v) => v,
        _ => unreachable!(),
    };
    let rule = f.block(vec![Value::Group(group_body), f.text("a"), f.word("end")]);
    let rule_series = match &rule {
        Value::Block(v) => v.series.clone(),
        _ => unreachable!(),
    };
    let mut evaluator = Saboteur { target: rule_series };
    let result = parse(&input, &rule, &f.interner, &f.heap, ParseOptions::default(), &mut NoBindings, &(), &mut evaluator);
    match result {
        Err(ErrMode::Cut(e)) => assert_eq!(e.kind, ErrorKind::AlteredRule),
        other => panic!("expected an AlteredRule Cut, got {other:?}"),
    }
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    fn ascii_lower() -> impl Strategy<Value = String> {
        "[a-z]{0,8}"
    }

    proptest! {
        // Determinism: the same input/rule pair, run twice with fresh
        // bindings/evaluator, always produces the same outcome.
        #[test]
        fn same_input_same_rule_is_deterministic(s in ascii_lower()) {
            let f = Fixture::new();
            let input = f.text(&s);
            let rule = f.block(vec![f.text(&s), f.word("end")]);

            let first = parse(&input, &rule, &f.interner, &f.heap, ParseOptions::default(), &mut NoBindings, &(), &mut NoEvaluator).unwrap();
            let second = parse(&input, &rule, &f.interner, &f.heap, ParseOptions::default(), &mut NoBindings, &(), &mut NoEvaluator).unwrap();
            prop_assert_eq!(first.matched, second.matched);
            prop_assert_eq!(first.tail.map(|p| p.index), second.tail.map(|p| p.index));
        }

        // A rule with no mutation keyword leaves a failed match's input
        // untouched.
        #[test]
        fn failed_match_does_not_mutate_input(s in ascii_lower()) {
            let f = Fixture::new();
            let input = f.text(&s);
            // A literal one character longer than `s` can never match `s`.
            let mismatch = f.text(&(s.clone() + "!"));
            let rule = f.block(vec![mismatch, f.word("end")]);

            let outcome = parse(&input, &rule, &f.interner, &f.heap, ParseOptions::default(), &mut NoBindings, &(), &mut NoEvaluator).unwrap();
            prop_assert!(!outcome.matched);
            prop_assert_eq!(text_of(&input), s);
        }

        // `parse(I, [R1 | R2])` matches iff at least one of `R1`/`R2`
        // matches at the same starting position.
        #[test]
        fn alternation_matches_iff_either_branch_does(s in ascii_lower(), r1 in ascii_lower(), r2 in ascii_lower()) {
            let f = Fixture::new();
            let input = f.text(&s);

            let solo = |lit: &str| {
                let rule = f.block(vec![f.text(lit), f.word("end")]);
                parse(&input, &rule, &f.interner, &f.heap, ParseOptions::default(), &mut NoBindings, &(), &mut NoEvaluator)
                    .unwrap()
                    .matched
            };
            let either = solo(&r1) || solo(&r2);

            let combined_rule = f.block(vec![f.text(&r1), f.word("end"), f.word("|"), f.text(&r2), f.word("end")]);
            let combined = parse(&input, &combined_rule, &f.interner, &f.heap, ParseOptions::default(), &mut NoBindings, &(), &mut NoEvaluator)
                .unwrap()
                .matched;

            prop_assert_eq!(combined, either);
        }
    }
}
