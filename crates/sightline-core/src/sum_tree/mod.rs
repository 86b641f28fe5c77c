//! Persistent summary tree.
//!
//! An ordered sequence stored in a B-tree whose nodes cache the combined
//! [`Summary`] of their subtree. Nodes are shared through `Arc`, so cloning a
//! tree is O(1) and every structural edit copies only the path it touches.
//!
//! Navigation is by [`Dimension`]: a projection accumulated from summaries,
//! such as the running code-point count. A [`Cursor`] seeks to a dimension
//! target, slices off the prefix before it, and hands back the suffix.
//!
//! ```text
//!                  Internal { summary = Σ children }
//!                 /              |               \
//!   Leaf [a, b, c]         Leaf [d, e]         Leaf [f, g, h]
//!    ▲                                                   ▲
//!    └──── cursor.slice(target, bias) ── cursor.suffix() ┘
//! ```

mod cursor;

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

pub use cursor::Cursor;

/// Fan-out parameter. Nodes hold at most `2 * TREE_BASE` children.
#[cfg(test)]
pub const TREE_BASE: usize = 2;
#[cfg(not(test))]
pub const TREE_BASE: usize = 6;

/// Something that can live in a [`SumTree`].
pub trait Item: Clone {
    type Summary: Summary;

    fn summary(&self) -> Self::Summary;
}

/// Associative aggregate with `Default` as its identity.
pub trait Summary: Clone + Default + fmt::Debug {
    fn add_summary(&mut self, other: &Self);
}

/// Ordered projection of a summary used to address positions in the tree.
pub trait Dimension<S: Summary>: Clone + Default + Ord + fmt::Debug {
    fn add_summary(&mut self, summary: &S);

    fn from_summary(summary: &S) -> Self {
        let mut dimension = Self::default();
        dimension.add_summary(summary);
        dimension
    }
}

/// Counts nothing. Used when only the items matter, not their positions.
impl<S: Summary> Dimension<S> for () {
    fn add_summary(&mut self, _: &S) {}
}

/// Tie-break for a seek target that falls exactly on an item boundary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Bias {
    /// Stop before items that start at the target.
    #[default]
    Left,
    /// Step over zero-width items sitting at the target.
    Right,
}

/// Whether an item spanning `[start, end)` lies before the boundary at
/// `target` under `bias`.
pub(crate) fn lies_before<D: Ord>(start: &D, end: &D, target: &D, bias: Bias) -> bool {
    match end.cmp(target) {
        Ordering::Less => true,
        Ordering::Equal => bias == Bias::Right || end > start,
        Ordering::Greater => false,
    }
}

fn sum<'a, S: Summary + 'a>(summaries: impl IntoIterator<Item = &'a S>) -> S {
    let mut total = S::default();
    for summary in summaries {
        total.add_summary(summary);
    }
    total
}

#[derive(Clone, Debug)]
enum Node<T: Item> {
    Internal {
        height: u8,
        summary: T::Summary,
        child_summaries: Vec<T::Summary>,
        child_trees: Vec<SumTree<T>>,
    },
    Leaf {
        summary: T::Summary,
        items: Vec<T>,
        item_summaries: Vec<T::Summary>,
    },
}

impl<T: Item> Node<T> {
    fn summary(&self) -> &T::Summary {
        match self {
            Node::Internal { summary, .. } | Node::Leaf { summary, .. } => summary,
        }
    }

    fn height(&self) -> u8 {
        match self {
            Node::Internal { height, .. } => *height,
            Node::Leaf { .. } => 0,
        }
    }

    fn is_underflowing(&self) -> bool {
        match self {
            Node::Internal { child_trees, .. } => child_trees.len() < TREE_BASE,
            Node::Leaf { items, .. } => items.len() < TREE_BASE,
        }
    }
}

/// An ordered, summarized, persistent sequence of `T`.
#[derive(Clone, Debug)]
pub struct SumTree<T: Item>(Arc<Node<T>>);

impl<T: Item> Default for SumTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Item> SumTree<T> {
    pub fn new() -> Self {
        SumTree(Arc::new(Node::Leaf {
            summary: T::Summary::default(),
            items: Vec::new(),
            item_summaries: Vec::new(),
        }))
    }

    pub fn from_item(item: T) -> Self {
        Self::leaf(vec![item])
    }

    /// Build a balanced tree bottom-up from items in order.
    pub fn from_items(items: impl IntoIterator<Item = T>) -> Self {
        let mut nodes: Vec<SumTree<T>> = Vec::new();
        let mut items = items.into_iter().peekable();
        while items.peek().is_some() {
            let chunk: Vec<T> = items.by_ref().take(2 * TREE_BASE).collect();
            nodes.push(Self::leaf(chunk));
        }

        while nodes.len() > 1 {
            let mut parents = Vec::with_capacity(nodes.len().div_ceil(2 * TREE_BASE));
            let mut children = nodes.into_iter().peekable();
            while children.peek().is_some() {
                let group: Vec<SumTree<T>> = children.by_ref().take(2 * TREE_BASE).collect();
                parents.push(Self::from_children(group));
            }
            nodes = parents;
        }

        nodes.pop().unwrap_or_default()
    }

    fn leaf(items: Vec<T>) -> Self {
        let item_summaries: Vec<T::Summary> = items.iter().map(Item::summary).collect();
        Self::leaf_from_parts(items, item_summaries)
    }

    fn leaf_from_parts(items: Vec<T>, item_summaries: Vec<T::Summary>) -> Self {
        SumTree(Arc::new(Node::Leaf {
            summary: sum(&item_summaries),
            items,
            item_summaries,
        }))
    }

    /// Parent over same-height children. Zero children is the empty tree and
    /// a single child is returned as is.
    fn from_children(mut child_trees: Vec<SumTree<T>>) -> Self {
        match child_trees.len() {
            0 => Self::new(),
            1 => child_trees.pop().unwrap_or_default(),
            _ => {
                let height = child_trees[0].0.height() + 1;
                let child_summaries: Vec<T::Summary> =
                    child_trees.iter().map(|tree| tree.summary().clone()).collect();
                SumTree(Arc::new(Node::Internal {
                    height,
                    summary: sum(&child_summaries),
                    child_summaries,
                    child_trees,
                }))
            }
        }
    }

    fn from_child_trees(left: SumTree<T>, right: SumTree<T>) -> Self {
        let height = left.0.height() + 1;
        let child_summaries = vec![left.summary().clone(), right.summary().clone()];
        SumTree(Arc::new(Node::Internal {
            height,
            summary: sum(&child_summaries),
            child_summaries,
            child_trees: vec![left, right],
        }))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn summary(&self) -> &T::Summary {
        self.0.summary()
    }

    pub fn is_empty(&self) -> bool {
        match self.0.as_ref() {
            Node::Internal { child_trees, .. } => child_trees.is_empty(),
            Node::Leaf { items, .. } => items.is_empty(),
        }
    }

    pub fn first(&self) -> Option<&T> {
        match self.0.as_ref() {
            Node::Internal { child_trees, .. } => child_trees.first().and_then(SumTree::first),
            Node::Leaf { items, .. } => items.first(),
        }
    }

    /// The item a cursor seeking `target` with `bias` would stop at, with its
    /// start position. Walks cached summaries down one path and borrows the
    /// item in place.
    pub fn item_at<D: Dimension<T::Summary>>(&self, target: &D, bias: Bias) -> Option<(D, &T)> {
        let mut position = D::default();
        let item = self.item_at_recursive(target, bias, &mut position)?;
        Some((position, item))
    }

    fn item_at_recursive<D: Dimension<T::Summary>>(
        &self,
        target: &D,
        bias: Bias,
        position: &mut D,
    ) -> Option<&T> {
        match self.0.as_ref() {
            Node::Leaf {
                items,
                item_summaries,
                ..
            } => {
                for (item, summary) in items.iter().zip(item_summaries) {
                    let mut end = position.clone();
                    end.add_summary(summary);
                    if !lies_before(position, &end, target, bias) {
                        return Some(item);
                    }
                    *position = end;
                }
                None
            }
            Node::Internal {
                child_summaries,
                child_trees,
                ..
            } => {
                for (child_summary, child) in child_summaries.iter().zip(child_trees) {
                    let mut end = position.clone();
                    end.add_summary(child_summary);
                    if end < *target || (end == *target && bias == Bias::Right) {
                        *position = end;
                        continue;
                    }
                    if let Some(item) = child.item_at_recursive(target, bias, position) {
                        return Some(item);
                    }
                }
                None
            }
        }
    }

    /// Items in order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.filter::<(), _>(|_| true).map(|(_, item)| item)
    }

    /// Owned copy of every item in order.
    pub fn items(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    pub fn cursor<D: Dimension<T::Summary>>(&self) -> Cursor<T, D> {
        Cursor::new(self.clone())
    }

    /// Items whose summary satisfies `predicate`, with their start position.
    ///
    /// The predicate is also applied to every subtree summary; a subtree that
    /// fails it is skipped without descending. It must therefore be monotone:
    /// if any item in a subtree would pass, the subtree's summary passes.
    pub fn filter<D, F>(&self, predicate: F) -> Filter<'_, T, D, F>
    where
        D: Dimension<T::Summary>,
        F: FnMut(&T::Summary) -> bool,
    {
        Filter {
            stack: vec![StackEntry {
                tree: self,
                index: 0,
            }],
            position: D::default(),
            predicate,
        }
    }

    /// Combined summary of the items a cursor would slice between
    /// `seek(start, Bias::Right)` and `slice(end, Bias::Right)`.
    pub fn summary_of_range<D: Dimension<T::Summary>>(&self, start: &D, end: &D) -> T::Summary {
        let mut total = T::Summary::default();
        let mut position = D::default();
        self.sum_range_recursive(start, end, &mut position, &mut total);
        total
    }

    fn sum_range_recursive<D: Dimension<T::Summary>>(
        &self,
        start: &D,
        end: &D,
        position: &mut D,
        total: &mut T::Summary,
    ) {
        let (summaries, children) = match self.0.as_ref() {
            Node::Internal {
                child_summaries,
                child_trees,
                ..
            } => (child_summaries, Some(child_trees)),
            Node::Leaf { item_summaries, .. } => (item_summaries, None),
        };

        for (index, summary) in summaries.iter().enumerate() {
            if *position > *end {
                break;
            }
            let mut item_end = position.clone();
            item_end.add_summary(summary);

            let skipped = lies_before(position, &item_end, start, Bias::Right);
            let included = lies_before(position, &item_end, end, Bias::Right);
            match children {
                Some(children) if !skipped && !(*position > *start && included) => {
                    children[index].sum_range_recursive(start, end, position, total);
                    continue;
                }
                _ if !skipped && included => total.add_summary(summary),
                _ => {}
            }
            *position = item_end;
        }
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    pub fn push(&mut self, item: T) {
        self.append(Self::from_item(item));
    }

    /// Concatenate `other` onto the end of this tree.
    pub fn append(&mut self, other: Self) {
        if self.is_empty() {
            *self = other;
        } else if !other.is_empty() {
            if self.0.height() < other.0.height() {
                if let Node::Internal { child_trees, .. } = other.0.as_ref() {
                    for tree in child_trees {
                        self.append(tree.clone());
                    }
                }
            } else if let Some(split_tree) = self.push_tree_recursive(other) {
                *self = Self::from_child_trees(self.clone(), split_tree);
            }
        }
    }

    fn push_tree_recursive(&mut self, other: SumTree<T>) -> Option<SumTree<T>> {
        match Arc::make_mut(&mut self.0) {
            Node::Internal {
                height,
                summary,
                child_summaries,
                child_trees,
            } => {
                let other_node = other.0.clone();
                summary.add_summary(other_node.summary());

                let height_delta = *height - other_node.height();
                let mut summaries_to_append = Vec::new();
                let mut trees_to_append = Vec::new();
                if height_delta == 0 {
                    if let Node::Internal {
                        child_summaries: other_summaries,
                        child_trees: other_trees,
                        ..
                    } = other_node.as_ref()
                    {
                        summaries_to_append.extend(other_summaries.iter().cloned());
                        trees_to_append.extend(other_trees.iter().cloned());
                    }
                } else if height_delta == 1 && !other_node.is_underflowing() {
                    summaries_to_append.push(other_node.summary().clone());
                    trees_to_append.push(other);
                } else if let Some(last) = child_trees.last_mut() {
                    let split_tree = last.push_tree_recursive(other);
                    let last_summary = last.summary().clone();
                    if let Some(slot) = child_summaries.last_mut() {
                        *slot = last_summary;
                    }
                    if let Some(split_tree) = split_tree {
                        summaries_to_append.push(split_tree.summary().clone());
                        trees_to_append.push(split_tree);
                    }
                }

                let child_count = child_trees.len() + trees_to_append.len();
                if child_count > 2 * TREE_BASE {
                    let midpoint = (child_count + child_count % 2) / 2;
                    let mut all_summaries = child_summaries.drain(..).chain(summaries_to_append);
                    let left_summaries: Vec<_> = all_summaries.by_ref().take(midpoint).collect();
                    let right_summaries: Vec<_> = all_summaries.collect();
                    let mut all_trees = child_trees.drain(..).chain(trees_to_append);
                    let left_trees: Vec<_> = all_trees.by_ref().take(midpoint).collect();
                    let right_trees: Vec<_> = all_trees.collect();

                    *summary = sum(&left_summaries);
                    *child_summaries = left_summaries;
                    *child_trees = left_trees;

                    Some(SumTree(Arc::new(Node::Internal {
                        height: *height,
                        summary: sum(&right_summaries),
                        child_summaries: right_summaries,
                        child_trees: right_trees,
                    })))
                } else {
                    child_summaries.extend(summaries_to_append);
                    child_trees.extend(trees_to_append);
                    None
                }
            }
            Node::Leaf {
                summary,
                items,
                item_summaries,
            } => {
                let Node::Leaf {
                    items: other_items,
                    item_summaries: other_summaries,
                    ..
                } = other.0.as_ref()
                else {
                    return None;
                };

                let child_count = items.len() + other_items.len();
                if child_count > 2 * TREE_BASE {
                    let midpoint = (child_count + child_count % 2) / 2;
                    let mut all_items = items.drain(..).chain(other_items.iter().cloned());
                    let left_items: Vec<_> = all_items.by_ref().take(midpoint).collect();
                    let right_items: Vec<_> = all_items.collect();
                    let mut all_summaries =
                        item_summaries.drain(..).chain(other_summaries.iter().cloned());
                    let left_summaries: Vec<_> = all_summaries.by_ref().take(midpoint).collect();
                    let right_summaries: Vec<_> = all_summaries.collect();

                    *summary = sum(&left_summaries);
                    *items = left_items;
                    *item_summaries = left_summaries;

                    Some(Self::leaf_from_parts(right_items, right_summaries))
                } else {
                    summary.add_summary(other.summary());
                    items.extend(other_items.iter().cloned());
                    item_summaries.extend(other_summaries.iter().cloned());
                    None
                }
            }
        }
    }

    /// Split at the boundary for `target`, returning `(before, after)`.
    /// `start` enters as the position of this tree's first item and leaves as
    /// the position of the boundary.
    pub(crate) fn split<D: Dimension<T::Summary>>(
        &self,
        target: &D,
        bias: Bias,
        start: &mut D,
    ) -> (Self, Self) {
        match self.0.as_ref() {
            Node::Leaf {
                items,
                item_summaries,
                ..
            } => {
                let mut index = 0;
                for summary in item_summaries {
                    let mut end = start.clone();
                    end.add_summary(summary);
                    if !lies_before(start, &end, target, bias) {
                        break;
                    }
                    *start = end;
                    index += 1;
                }

                if index == 0 {
                    (Self::new(), self.clone())
                } else if index == items.len() {
                    (self.clone(), Self::new())
                } else {
                    (
                        Self::leaf_from_parts(items[..index].to_vec(), item_summaries[..index].to_vec()),
                        Self::leaf_from_parts(items[index..].to_vec(), item_summaries[index..].to_vec()),
                    )
                }
            }
            Node::Internal {
                child_summaries,
                child_trees,
                ..
            } => {
                for (index, (child_summary, child)) in
                    child_summaries.iter().zip(child_trees).enumerate()
                {
                    let mut end = start.clone();
                    end.add_summary(child_summary);
                    if end < *target || (end == *target && bias == Bias::Right) {
                        *start = end;
                        continue;
                    }

                    // Boundary is inside this child (or at its end).
                    let (child_left, child_right) = child.split(target, bias, start);
                    let mut left = Self::from_children(child_trees[..index].to_vec());
                    left.append(child_left);
                    let mut right = child_right;
                    right.append(Self::from_children(child_trees[index + 1..].to_vec()));
                    return (left, right);
                }
                (self.clone(), Self::new())
            }
        }
    }

    /// Remove and return the first item.
    pub(crate) fn pop_front(&mut self) -> Option<T> {
        let popped = self.pop_front_recursive();
        // Only the root may shed levels; inner nodes keep their height.
        loop {
            let collapsed = match self.0.as_ref() {
                Node::Internal { child_trees, .. } if child_trees.len() <= 1 => {
                    child_trees.first().cloned().unwrap_or_default()
                }
                _ => break,
            };
            *self = collapsed;
        }
        popped
    }

    fn pop_front_recursive(&mut self) -> Option<T> {
        match Arc::make_mut(&mut self.0) {
            Node::Leaf {
                summary,
                items,
                item_summaries,
            } => {
                if items.is_empty() {
                    return None;
                }
                let item = items.remove(0);
                item_summaries.remove(0);
                *summary = sum(item_summaries.iter());
                Some(item)
            }
            Node::Internal {
                summary,
                child_summaries,
                child_trees,
                ..
            } => {
                let first = child_trees.first_mut()?;
                let item = first.pop_front_recursive();
                if first.is_empty() {
                    child_trees.remove(0);
                    child_summaries.remove(0);
                } else {
                    child_summaries[0] = first.summary().clone();
                }
                *summary = sum(child_summaries.iter());
                item
            }
        }
    }
}

impl<T: Item> FromIterator<T> for SumTree<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_items(iter)
    }
}

// ============================================================================
// Filter
// ============================================================================

struct StackEntry<'a, T: Item> {
    tree: &'a SumTree<T>,
    index: usize,
}

/// Pruning in-order iterator returned by [`SumTree::filter`].
pub struct Filter<'a, T: Item, D, F> {
    stack: Vec<StackEntry<'a, T>>,
    position: D,
    predicate: F,
}

impl<'a, T, D, F> Iterator for Filter<'a, T, D, F>
where
    T: Item,
    D: Dimension<T::Summary>,
    F: FnMut(&T::Summary) -> bool,
{
    type Item = (D, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = self.stack.last_mut()?;
            let tree: &'a SumTree<T> = entry.tree;
            let index = entry.index;
            entry.index += 1;

            match tree.0.as_ref() {
                Node::Leaf {
                    items,
                    item_summaries,
                    ..
                } => {
                    let (Some(item), Some(summary)) = (items.get(index), item_summaries.get(index))
                    else {
                        self.stack.pop();
                        continue;
                    };
                    let start = self.position.clone();
                    self.position.add_summary(summary);
                    if (self.predicate)(summary) {
                        return Some((start, item));
                    }
                }
                Node::Internal {
                    child_summaries,
                    child_trees,
                    ..
                } => {
                    let (Some(child), Some(summary)) =
                        (child_trees.get(index), child_summaries.get(index))
                    else {
                        self.stack.pop();
                        continue;
                    };
                    if (self.predicate)(summary) {
                        self.stack.push(StackEntry {
                            tree: child,
                            index: 0,
                        });
                    } else {
                        self.position.add_summary(summary);
                    }
                }
            }
        }
    }
}
