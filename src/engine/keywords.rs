//! The reserved keyword spellings (`spec.md` §4.4) and the type-test words
//! (`integer!`, `text!`, ...) PARSE recognizes at a rule position.
//!
//! Keywords are interned once per invocation and compared by `Symbol`
//! identity afterward, not by re-comparing spelling on every dispatch —
//! `spec.md` §9's "keywords can be pre-interned and compared by identity ...
//! once the rule block has been cooked."

use crate::symbol::{Interner, Symbol};
use crate::value::Kind;

macro_rules! keyword_table {
    ($($field:ident => $spelling:literal),+ $(,)?) => {
        /// Every reserved spelling, interned against one [`Interner`].
        #[derive(Debug, Clone)]
        pub struct Keywords {
            $(pub $field: Symbol,)+
        }

        impl Keywords {
            /// Intern every keyword spelling against `interner`.
            pub fn new(interner: &Interner) -> Self {
                Self {
                    $($field: interner.intern($spelling),)+
                }
            }
        }
    };
}

keyword_table! {
    bar => "|",
    end => "end",
    skip => "skip",
    any => "any",
    some => "some",
    while_ => "while",
    opt => "opt",
    not => "not",
    ahead => "ahead",
    and => "and",
    to => "to",
    thru => "thru",
    seek => "seek",
    mark => "mark",
    copy => "copy",
    set => "set",
    into => "into",
    collect => "collect",
    keep => "keep",
    only => "only",
    break_ => "break",
    reject => "reject",
    fail => "fail",
    do_ => "do",
    remove => "remove",
    insert => "insert",
    change => "change",
    then => "then",
}

impl Keywords {
    /// Is `sym` any reserved keyword spelling (including `|`)?
    pub fn is_keyword(&self, sym: Symbol) -> bool {
        sym == self.bar
            || sym == self.end
            || sym == self.skip
            || sym == self.any
            || sym == self.some
            || sym == self.while_
            || sym == self.opt
            || sym == self.not
            || sym == self.ahead
            || sym == self.and
            || sym == self.to
            || sym == self.thru
            || sym == self.seek
            || sym == self.mark
            || sym == self.copy
            || sym == self.set
            || sym == self.into
            || sym == self.collect
            || sym == self.keep
            || sym == self.only
            || sym == self.break_
            || sym == self.reject
            || sym == self.fail
            || sym == self.do_
            || sym == self.remove
            || sym == self.insert
            || sym == self.change
            || sym == self.then
    }
}

/// The `Kind` a `word!`-style type-test spelling stands for, e.g.
/// `"integer!"` matches any `Integer` input element. Not part of the
/// reserved keyword table — any word ending in `!` is eligible, the same
/// datatype-word convention this dialect family uses throughout.
pub fn kind_test(spelling: &str) -> Option<Kind> {
    use crate::value::{PathForm, WordForm};
    Some(match spelling {
        "null!" => Kind::Null,
        "blank!" => Kind::Blank,
        "logic!" => Kind::Logic,
        "integer!" => Kind::Integer,
        "decimal!" => Kind::Decimal,
        "char!" => Kind::Char,
        "text!" | "string!" => Kind::Text,
        "binary!" => Kind::Binary,
        "block!" => Kind::Block,
        "group!" => Kind::Group,
        "get-group!" => Kind::GetGroup,
        "word!" => Kind::Word(WordForm::Word),
        "set-word!" => Kind::Word(WordForm::SetWord),
        "get-word!" => Kind::Word(WordForm::GetWord),
        "lit-word!" => Kind::Word(WordForm::LitWord),
        "refinement!" => Kind::Word(WordForm::Refinement),
        "issue!" => Kind::Word(WordForm::Issue),
        "path!" => Kind::Path(PathForm::Path),
        "get-path!" => Kind::Path(PathForm::GetPath),
        "set-path!" => Kind::Path(PathForm::SetPath),
        "tag!" => Kind::Tag,
        "bitset!" => Kind::Bitset,
        "map!" => Kind::Map,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_is_a_keyword() {
        let interner = Interner::new();
        let kw = Keywords::new(&interner);
        assert!(kw.is_keyword(kw.bar));
    }

    #[test]
    fn kind_test_recognizes_integer_bang() {
        assert_eq!(kind_test("integer!"), Some(Kind::Integer));
        assert_eq!(kind_test("integer"), None);
    }
}
