//! `collect`/`keep`'s backtracking buffer (`spec.md` §4.5).
//!
//! `collect [...]` pushes a fresh [`Frame`]; every `keep` inside it appends to
//! the *top* frame's pending buffer, not whichever frame started furthest
//! out. A `keep` never mutates its target variable directly — only when the
//! enclosing `collect` itself succeeds does [`CollectStack::commit`] write
//! the accumulated buffer out; a failed `collect`, or a backtrack that
//! unwinds past one, discards the frame's buffer entirely via
//! [`CollectStack::pop_and_discard`]. Savepoints inside one frame (for
//! alternation within a single `collect`) are plain length marks into that
//! frame's buffer — rolling back to one truncates off every `keep` the
//! abandoned branch performed, without touching an outer frame's buffer.

use crate::lib::std::vec::Vec;

use crate::bind::{Bindings, SetOutcome};
use crate::heap::{Heap, SeriesData};
use crate::sequence::SeqView;
use crate::symbol::Symbol;
use crate::value::Value;

/// One `collect [...]` invocation's in-flight buffer.
#[derive(Debug)]
pub struct Frame {
    /// The variable `keep` appends to once this frame commits, if `collect`
    /// was given an explicit target (`collect x [...]`); `None` means the
    /// anonymous form, whose result is only the rule's own consumed range.
    pub target: Option<Symbol>,
    /// Values kept so far, in keep order.
    pending: Vec<Value>,
}

impl Frame {
    fn new(target: Option<Symbol>) -> Self {
        Self {
            target,
            pending: Vec::new(),
        }
    }

    /// A savepoint into this frame's buffer, for alternation/backtracking
    /// within the same `collect`.
    pub fn savepoint(&self) -> usize {
        self.pending.len()
    }

    /// Truncate back to a prior savepoint, discarding every `keep` since.
    pub fn restore(&mut self, savepoint: usize) {
        self.pending.truncate(savepoint);
    }
}

/// The stack of in-flight `collect` frames for one `parse` invocation.
///
/// Nested `collect`s each get their own frame; a `keep` always targets
/// [`CollectStack::top`], so an inner `collect`'s keeps never leak into an
/// outer one — `spec.md` §4.5's "keep always targets the nearest enclosing
/// collect" invariant.
#[derive(Debug, Default)]
pub struct CollectStack {
    frames: Vec<Frame>,
}

impl CollectStack {
    /// An empty stack, as `parse` starts with.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a fresh frame for a `collect [...]` (or `collect x [...]`).
    pub fn push(&mut self, target: Option<Symbol>) {
        self.frames.push(Frame::new(target));
    }

    /// The nearest enclosing frame, if any `collect` is in flight. `keep`
    /// outside any `collect` is a no-op rule element match with nothing to
    /// append to — callers should treat an empty stack as "keep had no
    /// effect," not as an error; `spec.md` §4.5 leaves bare `keep` outside
    /// `collect` unspecified and this crate chooses the permissive reading.
    pub fn top_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    /// Append one kept value (plain `keep rule`) to the nearest frame.
    pub fn keep_one(&mut self, value: Value) {
        if let Some(frame) = self.top_mut() {
            frame.pending.push(value);
        }
    }

    /// Append every element of `values` (`keep only rule` when `rule`
    /// matched a block range, or the general multi-value keep form) to the
    /// nearest frame, each as its own entry — as distinct from
    /// [`CollectStack::keep_only`], which keeps the whole range as one cell.
    pub fn keep_spread(&mut self, values: impl IntoIterator<Item = Value>) {
        if let Some(frame) = self.top_mut() {
            frame.pending.extend(values);
        }
    }

    /// Append a single `Block` cell wrapping `values` (`keep only` — "keep
    /// the matched range as one block value" per `spec.md` §4.4).
    pub fn keep_only(&mut self, values: Vec<Value>, heap: &Heap) {
        if let Some(frame) = self.top_mut() {
            frame
                .pending
                .push(Value::Block(SeqView::at_head(heap.alloc(SeriesData::Block(values)))));
        }
    }

    /// Pop the top frame on a successful `collect`, handing its buffer back
    /// as a fresh `Block` value and, if the frame had an explicit target,
    /// writing it through `bindings` as well.
    pub fn commit<S, B: Bindings<S>>(
        &mut self,
        heap: &Heap,
        bindings: &mut B,
        specifier: &S,
    ) -> Value {
        let frame = self.frames.pop().expect("commit called with no open frame");
        let result = Value::Block(SeqView::at_head(heap.alloc(SeriesData::Block(frame.pending))));
        if let Some(target) = frame.target {
            // A read-only target is a host binding-policy decision; `collect`
            // doesn't fail the match over it, it just can't make the write
            // stick — mirrors `spec.md` §4.4's silence on this edge case by
            // picking the permissive reading used elsewhere in this module.
            let _: SetOutcome = bindings.set(target, specifier, result.clone());
        }
        result
    }

    /// Pop the top frame on a failed `collect`, discarding its buffer
    /// entirely — nothing it kept is visible to an outer frame or the host.
    pub fn pop_and_discard(&mut self) {
        self.frames.pop();
    }

    /// How many frames are currently open (0 outside any `collect`).
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::NoBindings;

    #[test]
    fn keep_targets_innermost_frame() {
        let mut stack = CollectStack::new();
        stack.push(None);
        stack.push(None);
        stack.keep_one(Value::Integer(1));
        assert_eq!(stack.top_mut().unwrap().pending.len(), 1);
        stack.pop_and_discard();
        assert_eq!(stack.top_mut().unwrap().pending.len(), 0);
    }

    #[test]
    fn restore_truncates_since_savepoint() {
        let mut stack = CollectStack::new();
        stack.push(None);
        let sp = stack.top_mut().unwrap().savepoint();
        stack.keep_one(Value::Integer(1));
        stack.keep_one(Value::Integer(2));
        stack.top_mut().unwrap().restore(sp);
        assert_eq!(stack.top_mut().unwrap().pending.len(), 0);
    }

    #[test]
    fn commit_produces_block_of_kept_values() {
        let heap = Heap::new();
        let mut stack = CollectStack::new();
        let mut bindings = NoBindings;
        stack.push(None);
        stack.keep_one(Value::Integer(1));
        stack.keep_one(Value::Integer(2));
        let result = stack.commit(&heap, &mut bindings, &());
        if let Value::Block(view) = result {
            assert_eq!(view.len(), 2);
        } else {
            panic!("expected Block");
        }
    }

    #[test]
    fn discard_drops_pending_without_committing() {
        let mut stack = CollectStack::new();
        stack.push(None);
        stack.keep_one(Value::Integer(1));
        stack.pop_and_discard();
        assert_eq!(stack.depth(), 0);
    }
}
