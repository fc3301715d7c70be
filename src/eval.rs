//! The evaluation seam: how `GROUP!`/`DO`/`COMPILE` rule elements run host
//! code (`spec.md` §6, §4.3, §4.4).
//!
//! PARSE does not evaluate expressions itself. Whenever a rule needs a
//! `Group` value's contents run — a bare `(...)` rule element, the `do`
//! keyword's operand, a `Get-Group` splice — it hands the block to an
//! [`Evaluator`] supplied by the host. The engine's only obligation is the
//! guarantee `spec.md` names explicitly: the evaluator may itself call back
//! into [`crate::engine::parse`] (e.g. a host function that runs PARSE on
//! its argument), and the engine must tolerate that reentrance cleanly.

use crate::error::ErrorKind;
use crate::value::Value;

/// The outcome of handing a block to the host evaluator.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluated {
    /// The block ran to completion, producing this value (`Null` if the
    /// block had no result-bearing expression).
    Value(Value),
    /// The block threw; the engine unwinds with
    /// [`ErrorKind::EvaluatorThrow`] unchanged, carrying the thrown payload
    /// for the host to inspect after `parse` returns.
    Thrown(Value),
}

/// A host's expression evaluator, as seen by the PARSE engine.
pub trait Evaluator<S> {
    /// Evaluate `block` (a `Group`/`Get-Group` value's contents) within
    /// `specifier` to completion, returning its result or what it threw.
    /// Used for side-effectful `GROUP!` rule elements and `Get-Group`
    /// splices, where the whole block is one self-contained unit.
    fn evaluate(&mut self, block: &Value, specifier: &S) -> Evaluated;

    /// Evaluate exactly one expression starting at the head of `remaining`
    /// (a `Block` value positioned at the current input cell) within
    /// `specifier`, returning its result and how many cells that expression
    /// consumed. Used by the `do` keyword, which re-parses the result as a
    /// one-element pseudo-input (`spec.md` §6: "must consume exactly one
    /// expression and report how many cells it consumed").
    fn evaluate_one(&mut self, remaining: &Value, specifier: &S) -> (Evaluated, usize);
}

impl Evaluated {
    /// Fold this outcome into the engine's `Result` convention: a thrown
    /// value becomes a hard, non-backtrackable
    /// [`ErrorKind::EvaluatorThrow`] — `spec.md` §4.3's "a thrown evaluation
    /// unwinds the whole parse, it is never treated as a failed match."
    pub fn into_result(self) -> Result<Value, ErrorKind> {
        match self {
            Evaluated::Value(v) => Ok(v),
            Evaluated::Thrown(_) => Err(ErrorKind::EvaluatorThrow),
        }
    }
}

/// An [`Evaluator`] that always throws, for hosts or tests that have no
/// `GROUP!`/`DO` story and want rule blocks containing one to fail loudly
/// rather than silently no-op.
#[derive(Debug, Default)]
pub struct NoEvaluator;

impl<S> Evaluator<S> for NoEvaluator {
    fn evaluate(&mut self, block: &Value, _specifier: &S) -> Evaluated {
        Evaluated::Thrown(block.clone())
    }

    fn evaluate_one(&mut self, remaining: &Value, _specifier: &S) -> (Evaluated, usize) {
        (Evaluated::Thrown(remaining.clone()), 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thrown_becomes_evaluator_throw_error() {
        let outcome = Evaluated::Thrown(Value::Integer(1));
        assert_eq!(outcome.into_result(), Err(ErrorKind::EvaluatorThrow));
    }

    #[test]
    fn value_passes_through() {
        let outcome = Evaluated::Value(Value::Logic(true));
        assert_eq!(outcome.into_result(), Ok(Value::Logic(true)));
    }

    #[test]
    fn no_evaluator_always_throws() {
        let mut e = NoEvaluator;
        let result = e.evaluate(&Value::Block(dummy_seq()), &());
        assert!(matches!(result, Evaluated::Thrown(_)));
    }

    fn dummy_seq() -> crate::sequence::SeqView {
        let heap = crate::heap::Heap::new();
        crate::sequence::SeqView::at_head(heap.alloc(crate::heap::SeriesData::Block(
            crate::lib::std::vec::Vec::new(),
        )))
    }
}
