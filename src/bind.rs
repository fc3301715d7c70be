//! The binding seam: how a bare `Word` rule element resolves to a value.
//!
//! PARSE itself never decides what a word means — it asks its host (`spec.md`
//! §6) through this trait. A `specifier` is whatever context the host needs
//! to disambiguate the same `Symbol` in two different scopes (a stack frame,
//! a module, `()` if the host has only one scope); PARSE treats it as opaque
//! and only ever passes back what it was given.

use crate::lib::std::boxed::Box;

use crate::error::ErrorKind;
use crate::symbol::Symbol;
use crate::value::Value;

/// The outcome of a binding lookup, distinguishing "no such variable" from
/// "bound to `Value::Null`" (`spec.md` §6: these are different error kinds —
/// [`ErrorKind::UnboundRule`] vs. [`ErrorKind::NullRule`]).
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// The word resolved to this value.
    Found(Value),
    /// The word has no binding at all in this scope.
    Unbound,
}

/// The outcome of a binding write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    /// The write succeeded.
    Ok,
    /// The target is read-only (e.g. a protected or frozen variable).
    ReadOnly,
}

/// A host's variable scope, as seen by the PARSE engine.
///
/// Implementors own what a `specifier` means; PARSE passes the same
/// `specifier` value it was invoked with straight through to every `lookup`/
/// `set` call for the duration of one `parse` invocation.
pub trait Bindings<S> {
    /// Resolve `word` within `specifier`.
    fn lookup(&self, word: Symbol, specifier: &S) -> Lookup;

    /// Bind `word` to `value` within `specifier` (`set-word!` rule elements
    /// and the `set`/`copy` keywords' variable target).
    fn set(&mut self, word: Symbol, specifier: &S, value: Value) -> SetOutcome;
}

impl Lookup {
    /// Turn this lookup into the two error kinds `spec.md` §6 distinguishes:
    /// [`ErrorKind::UnboundRule`] for no binding at all, and, when the
    /// resolved value is `Null`, [`ErrorKind::NullRule`] — since a `Word`
    /// rule element standing for `null` can never itself be a rule.
    pub fn into_rule_value(self) -> Result<Value, ErrorKind> {
        match self {
            Lookup::Unbound => Err(ErrorKind::UnboundRule),
            Lookup::Found(v) if v.is_null() => Err(ErrorKind::NullRule),
            Lookup::Found(v) => Ok(v),
        }
    }
}

/// A [`Bindings`] with no variables at all — every lookup is
/// [`Lookup::Unbound`], every `set` is rejected. Useful for hosts that embed
/// PARSE with no word-binding story of their own, and for tests that only
/// exercise literal rule elements.
#[derive(Debug, Default)]
pub struct NoBindings;

impl<S> Bindings<S> for NoBindings {
    fn lookup(&self, _word: Symbol, _specifier: &S) -> Lookup {
        Lookup::Unbound
    }

    fn set(&mut self, _word: Symbol, _specifier: &S, _value: Value) -> SetOutcome {
        SetOutcome::ReadOnly
    }
}

/// A boxed [`Bindings`] trait object, for hosts that want dynamic dispatch
/// rather than a generic parameter threaded through the engine.
pub type DynBindings<S> = Box<dyn Bindings<S>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_bindings_is_always_unbound() {
        let interner = crate::symbol::Interner::new();
        let word = interner.intern("x");
        let b = NoBindings;
        assert_eq!(b.lookup(word, &()), Lookup::Unbound);
    }

    #[test]
    fn unbound_lookup_is_unbound_rule_error() {
        assert_eq!(Lookup::Unbound.into_rule_value(), Err(ErrorKind::UnboundRule));
    }

    #[test]
    fn null_lookup_is_null_rule_error() {
        assert_eq!(
            Lookup::Found(Value::Null).into_rule_value(),
            Err(ErrorKind::NullRule)
        );
    }

    #[test]
    fn non_null_lookup_passes_through() {
        assert_eq!(
            Lookup::Found(Value::Integer(1)).into_rule_value(),
            Ok(Value::Integer(1))
        );
    }
}
