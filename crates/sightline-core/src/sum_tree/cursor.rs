//! Cursor over a [`SumTree`].

use super::{Bias, Dimension, Item, SumTree};

/// A position in a tree, measured in dimension `D`.
///
/// The cursor owns the not-yet-visited part of the tree (an O(1) clone), so
/// slicing and advancing never disturb the tree it was created from.
#[derive(Clone, Debug)]
pub struct Cursor<T: Item, D> {
    remaining: SumTree<T>,
    position: D,
}

impl<T: Item, D: Dimension<T::Summary>> Cursor<T, D> {
    pub(crate) fn new(tree: SumTree<T>) -> Self {
        Self {
            remaining: tree,
            position: D::default(),
        }
    }

    /// Dimension value at the start of the current item.
    pub fn start(&self) -> &D {
        &self.position
    }

    /// The item the cursor is positioned at, if any.
    pub fn item(&self) -> Option<&T> {
        self.remaining.first()
    }

    /// Step over the current item.
    pub fn next(&mut self) {
        if let Some(item) = self.remaining.pop_front() {
            self.position.add_summary(&item.summary());
        }
    }

    /// Advance to the boundary for `target`.
    ///
    /// Returns `false` if the tree ran out before reaching `target`. A `true`
    /// result does not mean the cursor sits exactly on `target`: with
    /// `Bias::Left` it stops at the start of an item straddling it.
    pub fn seek(&mut self, target: &D, bias: Bias) -> bool {
        self.slice(target, bias);
        !(self.remaining.is_empty() && self.position < *target)
    }

    /// Advance to the boundary for `target`, returning everything passed
    /// over as an independent tree.
    pub fn slice(&mut self, target: &D, bias: Bias) -> SumTree<T> {
        let mut position = self.position.clone();
        let (before, after) = self.remaining.split(target, bias, &mut position);
        self.remaining = after;
        self.position = position;
        before
    }

    /// Everything from the cursor to the end. Leaves the cursor exhausted.
    pub fn suffix(&mut self) -> SumTree<T> {
        let rest = std::mem::take(&mut self.remaining);
        self.position.add_summary(rest.summary());
        rest
    }
}
