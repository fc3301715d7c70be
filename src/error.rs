//! # Error management
//!
//! Errors are designed around one split: [`NoMatch`][ErrorKind::NoMatch] is a
//! *local* failure that drives alternation and repetition — it is never
//! surfaced to a caller of [`parse`][crate::engine::parse] as an error, only
//! as `matched: false`. Every other [`ErrorKind`] is surfaced as-is; the
//! engine never retries or masks it.
//!
//! [`ErrMode`] carries that split: [`ErrMode::Backtrack`] for `NoMatch`,
//! [`ErrMode::Cut`] for everything else. Combinators that try alternatives
//! (`alt`, `any`, `some`) only catch `Backtrack`; a `Cut` unwinds straight
//! through them, the same way `winnow`'s `cut_err` stops an `alt` from
//! trying the next branch.

use crate::lib::std::fmt;

use crate::sequence::Position;
use crate::value::{Kind, Value};

/// Holds the result of a rule-matching step.
///
/// `Ok(O)` is the matched value (often `()` or a consumed range); `Err(e)`
/// is an [`ErrMode`] telling the caller whether to keep trying alternatives
/// or give up outright.
pub type PResult<O, E = ParseError> = Result<O, ErrMode<E>>;

/// The `Err` side of [`PResult`].
///
/// Mirrors `winnow::error::ErrMode`, minus the `Incomplete` case: PARSE
/// always runs over a materialized, non-streaming sequence (`spec.md`'s
/// Non-goals exclude streaming), so there is never "not enough data yet",
/// only "no match here" or "this is a hard error."
#[derive(Debug, Clone, PartialEq)]
pub enum ErrMode<E = ParseError> {
    /// A recoverable failure — [`ErrorKind::NoMatch`]. Drives the
    /// Dispatch/Match/Advance/Backtrack state machine; an enclosing
    /// alternation or repetition may still succeed.
    Backtrack(E),
    /// An unrecoverable failure. Propagates straight out of the engine;
    /// `alt` and the repetition keywords do not catch it.
    Cut(E),
}

impl<E> ErrMode<E> {
    /// Prevents backtracking, promoting a `Backtrack` to a `Cut`.
    pub fn cut(self) -> Self {
        match self {
            ErrMode::Backtrack(e) => ErrMode::Cut(e),
            rest => rest,
        }
    }

    /// Re-enables backtracking, demoting a `Cut` to a `Backtrack`.
    pub fn backtrack(self) -> Self {
        match self {
            ErrMode::Cut(e) => ErrMode::Backtrack(e),
            rest => rest,
        }
    }

    /// Unwraps the inner error, discarding whether it was a `Backtrack` or `Cut`.
    pub fn into_inner(self) -> E {
        match self {
            ErrMode::Backtrack(e) | ErrMode::Cut(e) => e,
        }
    }

    /// Is this a local, backtrackable `NoMatch`?
    pub fn is_backtrack(&self) -> bool {
        matches!(self, ErrMode::Backtrack(_))
    }
}

impl<E> fmt::Display for ErrMode<E>
where
    E: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrMode::Backtrack(e) => write!(f, "no match: {e}"),
            ErrMode::Cut(e) => write!(f, "parse error: {e}"),
        }
    }
}

#[cfg(feature = "std")]
impl<E> std::error::Error for ErrMode<E> where E: fmt::Debug + fmt::Display {}

/// The error kinds from the PARSE error-handling design.
///
/// `NoMatch` is always wrapped in [`ErrMode::Backtrack`]; every other
/// variant is always wrapped in [`ErrMode::Cut`]. [`ParseError::kind`]
/// documents which is which, so this split can't drift out of sync.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    /// The rule failed to match at the current position. Local; never
    /// surfaced to the caller as an error.
    #[error("no match")]
    NoMatch,
    /// A `Word` rule element has no binding.
    #[error("unbound rule word")]
    UnboundRule,
    /// A `Word` rule element resolved to `null`.
    #[error("rule word is null")]
    NullRule,
    /// The rule block was mutated by a `GROUP!`.
    #[error("rule block was altered during the parse")]
    AlteredRule,
    /// A mutation keyword (`remove`/`insert`/`change`) was used on frozen input.
    #[error("input is read-only")]
    ReadOnlyInput,
    /// `compare` was asked to order two mismatched kinds.
    #[error("cannot compare {0:?} and {1:?}")]
    IncomparableKinds(Kind, Kind),
    /// A rule element's kind is not legal at this position.
    #[error("{0:?} is not a legal rule element here")]
    InvalidRule(Kind),
    /// `seek` targeted an index outside the input.
    #[error("position out of range")]
    PositionOutOfRange,
    /// `into` was applied to a value that isn't a nested sequence.
    #[error("`into` requires a nested text/binary/block value")]
    IntoTypeMismatch,
    /// An external halt signal was observed.
    #[error("halted")]
    Halted,
    /// A `GROUP!`/`DO` evaluation threw; the engine unwinds with it unchanged.
    #[error("evaluator threw")]
    EvaluatorThrow,
}

/// A structured error: kind, the input position it occurred at, and the
/// rule-cursor index within the rule block, per `spec.md` §7's
/// "kind + optional message + optional location" contract.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Where in the input it went wrong.
    pub at: Option<Position>,
    /// Index of the rule element being evaluated, within its rule block.
    pub rule_cursor: Option<usize>,
    /// The value a `GROUP!`/`DO` evaluation threw, when `kind` is
    /// [`ErrorKind::EvaluatorThrow`] — `spec.md` §6's "PARSE unwinds and
    /// returns it unchanged."
    pub thrown: Option<Value>,
}

impl ParseError {
    /// Build a bare error from a kind, with no position information yet.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            at: None,
            rule_cursor: None,
            thrown: None,
        }
    }

    /// Attach the input position where the error was observed.
    #[must_use]
    pub fn at(mut self, pos: Position) -> Self {
        self.at = Some(pos);
        self
    }

    /// Attach the rule-cursor index where the error was observed.
    #[must_use]
    pub fn at_rule(mut self, cursor: usize) -> Self {
        self.rule_cursor = Some(cursor);
        self
    }

    /// Attach the value a `GROUP!`/`DO` evaluation threw.
    #[must_use]
    pub fn with_thrown(mut self, value: Value) -> Self {
        self.thrown = Some(value);
        self
    }

    /// Wrap as the locally-handled, backtrackable `NoMatch` case.
    pub fn no_match() -> ErrMode<Self> {
        ErrMode::Backtrack(Self::new(ErrorKind::NoMatch))
    }

    /// Wrap any other kind as a hard, surfaced `Cut`.
    pub fn cut(kind: ErrorKind) -> ErrMode<Self> {
        ErrMode::Cut(Self::new(kind))
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(pos) = &self.at {
            write!(f, " at {pos:?}")?;
        }
        if let Some(cursor) = self.rule_cursor {
            write!(f, " (rule element #{cursor})")?;
        }
        Ok(())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backtrack_is_local() {
        let e: ErrMode<ParseError> = ParseError::no_match();
        assert!(e.is_backtrack());
    }

    #[test]
    fn cut_does_not_backtrack_after_promotion() {
        let e = ErrMode::Backtrack(ParseError::new(ErrorKind::NoMatch)).cut();
        assert!(!e.is_backtrack());
    }
}
