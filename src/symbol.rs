//! Interned spellings for words, paths, tags, and issues.
//!
//! Words compare by interned identity (`spec.md` §3's invariant), so the
//! interner is the thing that makes `Symbol` a cheap `Copy` handle instead of
//! a heap-allocated string compared byte-for-byte on every lookup.

use crate::lib::std::cell::RefCell;
use crate::lib::std::collections::HashMap;
use crate::lib::std::rc::Rc;
use crate::lib::std::string::String;

/// A handle to an interned spelling.
///
/// Two `Symbol`s are equal iff they were interned from equal strings. The
/// handle itself is `Copy`; the backing text lives in the [`Interner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

/// The table of interned spellings shared by one PARSE invocation's value
/// graph. Cloning an `Interner` clones the `Rc`, not the table.
#[derive(Debug, Clone, Default)]
pub struct Interner(Rc<RefCell<InternerTable>>);

#[derive(Debug, Default)]
struct InternerTable {
    strings: Vec<Rc<str>>,
    ids: HashMap<Rc<str>, Symbol>,
}

impl Interner {
    /// Create an empty interner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `spelling`, returning its (possibly newly assigned) `Symbol`.
    pub fn intern(&self, spelling: &str) -> Symbol {
        let mut table = self.0.borrow_mut();
        if let Some(sym) = table.ids.get(spelling) {
            return *sym;
        }
        let rc: Rc<str> = Rc::from(spelling);
        let sym = Symbol(table.strings.len() as u32);
        table.strings.push(rc.clone());
        table.ids.insert(rc, sym);
        sym
    }

    /// Recover the spelling a `Symbol` was interned from.
    ///
    /// # Panics
    /// If `sym` was not produced by this interner.
    pub fn spelling(&self, sym: Symbol) -> Rc<str> {
        self.0.borrow().strings[sym.0 as usize].clone()
    }

    /// True iff `sym`'s spelling equals `text`, without allocating.
    pub fn is(&self, sym: Symbol, text: &str) -> bool {
        &*self.spelling(sym) == text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_spelling_same_symbol() {
        let interner = Interner::new();
        let a = interner.intern("to");
        let b = interner.intern("to");
        assert_eq!(a, b);
    }

    #[test]
    fn different_spelling_different_symbol() {
        let interner = Interner::new();
        let a = interner.intern("to");
        let b = interner.intern("thru");
        assert_ne!(a, b);
    }

    #[test]
    fn spelling_round_trips() {
        let interner = Interner::new();
        let sym = interner.intern("collect");
        assert_eq!(&*interner.spelling(sym), "collect");
    }
}
