//! Heap objects and the cycle collector.
//!
//! `spec.md` §3's lifecycle rule is: sequences are reference-managed, and
//! become eligible for collection when no root and no live stack reference
//! holds them. Plain `Rc` already reclaims everything that isn't part of a
//! cycle; a rule block is immutable and never contains value cycles back
//! into itself mid-invocation (the one cyclic case `spec.md` §9 calls out —
//! "a rule that refers to itself by a bound word" — is a *binding* lookup,
//! not an owning `Rc` edge, so it never needs the collector to run).
//!
//! What an owning cycle through `Block`/`Map` values *can* still produce
//! (e.g. `b: copy [] append b b`, an observable Rebol idiom) is handled by
//! [`Heap`], a small mark-and-sweep pass over every [`SeriesRef`] allocated
//! through it. This is deliberately the "reference-counted arena with
//! explicit cycle detection" option `spec.md` §9's design notes offer as the
//! borrow-checked-language alternative to a full tracing GC.

use crate::lib::std::cell::RefCell;
use crate::lib::std::rc::{Rc, Weak};
use crate::lib::std::vec::Vec;

use crate::value::Value;

/// What a [`Series`] holds: the three sequence kinds PARSE matches against.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesData {
    /// UTF-8 text, indexed by codepoint via the `chars` side table.
    Text {
        /// The codepoints, in order.
        chars: Vec<char>,
    },
    /// Raw bytes.
    Binary(Vec<u8>),
    /// Cells, in order. The only variant that can itself hold `Rc<Series>`
    /// handles, so it's the only variant that can participate in a cycle.
    Block(Vec<Value>),
}

impl SeriesData {
    /// Element count: codepoints, bytes, or cells.
    pub fn len(&self) -> usize {
        match self {
            SeriesData::Text { chars } => chars.len(),
            SeriesData::Binary(b) => b.len(),
            SeriesData::Block(b) => b.len(),
        }
    }

    /// True iff empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop this series' contents, breaking any outgoing `Rc` edges.
    ///
    /// Called only by the collector once it has proven this series is
    /// unreachable from any root, so severing its edges can't observably
    /// change a live program — it only frees a cycle that nothing can see
    /// anymore.
    fn clear(&mut self) {
        match self {
            SeriesData::Text { chars } => chars.clear(),
            SeriesData::Binary(b) => b.clear(),
            SeriesData::Block(b) => b.clear(),
        }
    }
}

/// A heap-allocated sequence, shared by reference.
///
/// Mutation goes through the `RefCell`. `spec.md` §3 distinguishes
/// read-only-frozen series from mutable ones; this crate does not yet track
/// that distinction at the type level, so `remove`/`insert`/`change` mutate
/// whatever series they're handed (see `ErrorKind::ReadOnlyInput` in
/// `error.rs`, currently never constructed — noted in DESIGN.md).
pub type Series = Rc<RefCell<SeriesData>>;

/// A weak registry entry, used only so the collector can enumerate
/// everything it ever handed out without keeping those entries alive itself.
type Registry = Vec<Weak<RefCell<SeriesData>>>;

/// Allocates [`Series`] and runs the cycle collector over them.
///
/// One `Heap` is created per top-level `parse` invocation (`spec.md` §5:
/// collect frames, and by extension the heap, are never shared across
/// invocations or threads).
#[derive(Debug, Default)]
pub struct Heap {
    registry: RefCell<Registry>,
}

impl Heap {
    /// Create an empty heap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new series, registering it with this heap for collection.
    pub fn alloc(&self, data: SeriesData) -> Series {
        let series = Rc::new(RefCell::new(data));
        self.registry.borrow_mut().push(Rc::downgrade(&series));
        series
    }

    /// Run one mark-and-sweep pass.
    ///
    /// `roots` are the series directly reachable from the invocation's
    /// input, rule block, collect frames, and bound variables (`spec.md`
    /// §9). Anything still alive (non-zero strong count) but unreached from
    /// `roots` must be part of a cycle nothing outside the cycle points
    /// into; its contents are cleared to break the cycle's internal `Rc`
    /// edges, which drops its strong count to zero on the next sweep.
    pub fn collect(&self, roots: &[Series]) {
        let mut marked: Vec<*const RefCell<SeriesData>> = Vec::new();
        for root in roots {
            mark(root, &mut marked);
        }

        let mut registry = self.registry.borrow_mut();
        registry.retain(|weak| {
            let Some(strong) = weak.upgrade() else {
                return false; // already freed
            };
            let ptr = Rc::as_ptr(&strong);
            if !marked.contains(&ptr) {
                strong.borrow_mut().clear();
            }
            true
        });
        // Drop entries whose strong count fell to zero as a result of the
        // clears above (cycle fully broken) or from ordinary scope exit.
        registry.retain(|weak| weak.strong_count() > 0);
    }
}

fn mark(series: &Series, marked: &mut Vec<*const RefCell<SeriesData>>) {
    let ptr = Rc::as_ptr(series);
    if marked.contains(&ptr) {
        return;
    }
    marked.push(ptr);
    if let SeriesData::Block(items) = &*series.borrow() {
        for item in items {
            for child in item.child_series() {
                mark(&child, marked);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn unreachable_cycle_is_broken_by_collect() {
        let heap = Heap::new();
        let a = heap.alloc(SeriesData::Block(Vec::new()));
        let b = heap.alloc(SeriesData::Block(Vec::new()));
        a.borrow_mut()
            .as_block_mut()
            .unwrap()
            .push(Value::block(b.clone()));
        b.borrow_mut()
            .as_block_mut()
            .unwrap()
            .push(Value::block(a.clone()));

        drop(a);
        drop(b);
        // Nothing external still holds either series; no roots.
        heap.collect(&[]);
        assert_eq!(heap.registry.borrow().len(), 0);
    }

    #[test]
    fn rooted_series_survives_collect() {
        let heap = Heap::new();
        let a = heap.alloc(SeriesData::Text {
            chars: vec!['a', 'b'],
        });
        heap.collect(core::slice::from_ref(&a));
        assert_eq!(a.borrow().len(), 2);
    }
}

impl SeriesData {
    pub(crate) fn as_block_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            SeriesData::Block(b) => Some(b),
            _ => None,
        }
    }
}
