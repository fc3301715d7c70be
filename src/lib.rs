//! # ravel
//!
//! A backtracking PARSE-dialect matching and transformation engine over
//! text, binary, and block sequences, in the Rebol/Red tradition.
//!
//! A PARSE invocation runs a *rule block* against an *input sequence* of the
//! same or a nested kind, walking a small state machine —
//! Dispatch/Match/Advance/Backtrack — over the rule elements. Literals,
//! kind tests, character classes, and a fixed keyword vocabulary (`some`,
//! `any`, `opt`, `to`, `thru`, `collect`/`keep`, and friends) combine into
//! rules that can match, capture, and optionally rewrite the input in place.
//!
//! ```rust
//! use ravel::prelude::*;
//! use ravel::heap::{Heap, SeriesData};
//! use ravel::sequence::SeqView;
//! use ravel::symbol::Interner;
//! use ravel::value::{Value, WordForm};
//!
//! let heap = Heap::new();
//! let interner = Interner::new();
//!
//! let input = Value::Text(SeqView::at_head(heap.alloc(SeriesData::Text {
//!     chars: "ab".chars().collect(),
//! })));
//! let literal = Value::Text(SeqView::at_head(heap.alloc(SeriesData::Text {
//!     chars: "ab".chars().collect(),
//! })));
//! let end = Value::Word(WordForm::Word, interner.intern("end"));
//! let rule = Value::Block(SeqView::at_head(heap.alloc(SeriesData::Block(vec![literal, end]))));
//!
//! let outcome = parse(
//!     &input,
//!     &rule,
//!     &interner,
//!     &heap,
//!     ParseOptions::default(),
//!     &mut NoBindings,
//!     &(),
//!     &mut NoEvaluator,
//! );
//! assert!(outcome.unwrap().matched);
//! ```
//!
//! ## Error handling
//!
//! Every fallible operation returns [`error::PResult`], whose `Err` side is
//! [`error::ErrMode`]: a recoverable [`error::ErrMode::Backtrack`] that
//! drives alternation and repetition, or an unrecoverable
//! [`error::ErrMode::Cut`] that unwinds straight out of [`engine::parse`].
//! See the [`error`] module for the full kind list.
//!
//! ## Tracing
//!
//! Enable the `debug` feature to get a depth-indented trace of every rule
//! dispatch on stderr, in the style `trace`/`trace_result` use elsewhere in
//! this family — see the [`trace`] module.
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::doc_markdown)]
#![warn(clippy::empty_enum)]
#![warn(clippy::enum_glob_use)]
#![warn(clippy::exit)]
#![warn(clippy::explicit_deref_methods)]
#![warn(clippy::explicit_into_iter_loop)]
#![warn(clippy::filter_map_next)]
#![warn(clippy::flat_map_option)]
#![warn(clippy::implicit_clone)]
#![warn(clippy::inefficient_to_string)]
#![warn(clippy::large_stack_arrays)]
#![warn(clippy::large_types_passed_by_value)]
#![warn(clippy::let_unit_value)]
#![warn(clippy::linkedlist)]
#![warn(clippy::macro_use_imports)]
#![warn(clippy::manual_ok_or)]
#![warn(clippy::map_err_ignore)]
#![warn(clippy::match_on_vec_items)]
#![warn(clippy::match_wild_err_arm)]
#![warn(clippy::mem_forget)]
#![warn(clippy::mut_mut)]
#![warn(clippy::needless_borrow)]
#![warn(clippy::needless_continue)]
#![warn(clippy::option_option)]
#![warn(clippy::ptr_as_ptr)]
#![warn(clippy::rc_mutex)]
#![warn(clippy::same_functions_in_if_condition)]
#![warn(clippy::semicolon_if_nothing_returned)]
#![warn(clippy::string_to_string)]
#![warn(clippy::todo)]
#![warn(clippy::unimplemented)]
#![warn(clippy::unnested_or_patterns)]
#![warn(future_incompatible)]
#![warn(nonstandard_style)]
#![warn(rust_2018_idioms)]
#![allow(clippy::branches_sharing_code)]
#![allow(clippy::collapsible_else_if)]
#![allow(clippy::if_same_then_else)]
#![allow(clippy::bool_assert_comparison)]
#![allow(clippy::let_and_return)]

#[cfg(feature = "alloc")]
#[macro_use]
extern crate alloc;

#[cfg(all(feature = "debug", not(feature = "std")))]
compile_error!("`debug` requires `std`");

/// Re-exports everything needed from `std` or `core`/`alloc`, so the rest of
/// the crate is written against one name regardless of which feature set is
/// active — the same facade this family's parser combinators use.
#[cfg_attr(docsrs, doc(hidden))]
pub mod lib {
    #[cfg(not(feature = "std"))]
    #[doc(hidden)]
    pub mod std {
        #[doc(hidden)]
        pub use core::{cell, cmp, convert, fmt, iter, mem, ops, option, result, slice, str};

        #[cfg(feature = "alloc")]
        #[doc(hidden)]
        pub use alloc::{borrow, boxed, collections, rc, string, vec};
    }

    #[cfg(feature = "std")]
    #[doc(hidden)]
    pub mod std {
        #[doc(hidden)]
        pub use std::{
            borrow, boxed, cell, cmp, collections, convert, fmt, iter, mem, ops, option, rc,
            result, slice, str, string, sync, vec,
        };
    }
}

pub mod error;
pub mod symbol;
pub mod heap;
pub mod value;
pub mod sequence;
pub mod compare;
pub mod bind;
pub mod eval;
pub mod collect;
pub mod trace;
pub mod engine;

/// Re-exports the pieces most callers need to invoke [`engine::parse`].
pub mod prelude {
    pub use crate::bind::{Bindings, Lookup, NoBindings, SetOutcome};
    pub use crate::engine::{parse, Outcome, ParseOptions};
    pub use crate::error::{ErrMode, ErrorKind, PResult, ParseError};
    pub use crate::eval::{Evaluated, Evaluator, NoEvaluator};
    pub use crate::value::Value;
}
