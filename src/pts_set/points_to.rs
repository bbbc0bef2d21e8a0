//! A points-to set representation that stores small sets as a plain `Vec`
//! and promotes to a `BitVec` once it grows past [`SMALL_SET_CAPACITY`].
//! Most variables and heap fields end up pointing to a handful of objects,
//! so the array representation avoids bit-vector allocation overhead in the
//! common case while still scaling to the rare hot spot.

use std::fmt;
use std::slice;

use crate::util::bit_vec::{BitIter, BitVec, Idx};

const SMALL_SET_CAPACITY: usize = 32;

pub trait PointsToSet<T> {
    type Iter<'a>: Iterator<Item = T>
    where
        Self: 'a;

    fn new() -> Self;
    fn clear(&mut self);
    fn count(&self) -> usize;
    fn contains(&self, elem: T) -> bool;
    fn is_empty(&self) -> bool;
    fn superset(&self, other: &Self) -> bool;
    fn insert(&mut self, elem: T) -> bool;
    fn remove(&mut self, elem: T) -> bool;
    fn union(&mut self, other: &Self) -> bool;
    fn subtract(&mut self, other: &Self) -> bool;
    fn intersect(&mut self, other: &Self) -> bool;
    fn iter<'a>(&'a self) -> Self::Iter<'a>;
}

/// Hybrid implementation of a points-to set: an explicit array for small
/// sets, a bit vector for large ones.
#[derive(Clone)]
pub struct HybridPointsToSet<T> {
    points_to: HybridSet<T>,
}

impl<T: Idx> fmt::Debug for HybridPointsToSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.points_to.fmt(f)
    }
}

impl<'a, T: Idx> IntoIterator for &'a HybridPointsToSet<T> {
    type Item = T;
    type IntoIter = HybridIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Idx> PointsToSet<T> for HybridPointsToSet<T> {
    fn new() -> Self {
        HybridPointsToSet {
            points_to: HybridSet::new(),
        }
    }

    fn clear(&mut self) {
        self.points_to.clear();
    }

    fn count(&self) -> usize {
        self.points_to.count()
    }

    fn contains(&self, elem: T) -> bool {
        self.points_to.contains(elem)
    }

    fn is_empty(&self) -> bool {
        self.points_to.is_empty()
    }

    fn superset(&self, other: &HybridPointsToSet<T>) -> bool {
        self.points_to.superset(&other.points_to)
    }

    fn insert(&mut self, elem: T) -> bool {
        self.points_to.insert(elem)
    }

    fn remove(&mut self, elem: T) -> bool {
        self.points_to.remove(elem)
    }

    fn union(&mut self, other: &HybridPointsToSet<T>) -> bool {
        self.points_to.union(&other.points_to)
    }

    fn subtract(&mut self, other: &HybridPointsToSet<T>) -> bool {
        self.points_to.subtract(&other.points_to)
    }

    fn intersect(&mut self, other: &HybridPointsToSet<T>) -> bool {
        self.points_to.intersect(&other.points_to)
    }

    type Iter<'a> = HybridIter<'a, T>;
    fn iter(&self) -> HybridIter<'_, T> {
        self.points_to.iter()
    }
}

#[derive(Clone)]
pub enum HybridSet<T> {
    SmallSet(Vec<T>),
    LargeSet(BitVec<T>),
}

impl<T: Idx> fmt::Debug for HybridSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SmallSet(s) => s.fmt(f),
            Self::LargeSet(s) => s.fmt(f),
        }
    }
}

impl<T: Idx> HybridSet<T> {
    pub fn new() -> Self {
        HybridSet::SmallSet(Vec::with_capacity(SMALL_SET_CAPACITY))
    }

    pub fn clear(&mut self) {
        match self {
            HybridSet::SmallSet(small) => small.clear(),
            HybridSet::LargeSet(_) => {
                *self = HybridSet::SmallSet(Vec::with_capacity(SMALL_SET_CAPACITY));
            }
        }
    }

    pub fn count(&self) -> usize {
        match self {
            HybridSet::SmallSet(small) => small.len(),
            HybridSet::LargeSet(large) => large.count(),
        }
    }

    pub fn contains(&self, elem: T) -> bool {
        match self {
            HybridSet::SmallSet(small) => small.contains(&elem),
            HybridSet::LargeSet(large) => large.contains(elem),
        }
    }

    pub fn superset(&self, other: &HybridSet<T>) -> bool {
        match (self, other) {
            (HybridSet::LargeSet(self_large), HybridSet::LargeSet(other_large)) => {
                self_large.superset(other_large)
            }
            _ => other.iter().all(|elem| self.contains(elem)),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            HybridSet::SmallSet(small) => small.is_empty(),
            HybridSet::LargeSet(large) => large.is_empty(),
        }
    }

    /// Adds `elem` to this set, returns true if it was not already present.
    pub fn insert(&mut self, elem: T) -> bool {
        match self {
            HybridSet::SmallSet(small) if small.contains(&elem) => false,
            HybridSet::SmallSet(small) if small.len() < SMALL_SET_CAPACITY => {
                small.push(elem);
                true
            }
            HybridSet::SmallSet(small) => {
                let mut large = BitVec::new_empty();
                for elem in small {
                    large.insert(*elem);
                }
                let changed = large.insert(elem);
                *self = HybridSet::LargeSet(large);
                changed
            }
            HybridSet::LargeSet(large) => large.insert(elem),
        }
    }

    pub fn remove(&mut self, elem: T) -> bool {
        // We never demote a large set back to small, even if it shrinks.
        match self {
            HybridSet::SmallSet(small) => {
                if let Some(pos) = small.iter().position(|x| *x == elem) {
                    small.swap_remove(pos);
                    true
                } else {
                    false
                }
            }
            HybridSet::LargeSet(large) => large.remove(elem),
        }
    }

    pub fn iter(&self) -> HybridIter<'_, T> {
        match self {
            HybridSet::SmallSet(small) => HybridIter::SmallIter(small.iter()),
            HybridSet::LargeSet(large) => HybridIter::LargeIter(large.iter()),
        }
    }

    pub fn union(&mut self, other: &HybridSet<T>) -> bool {
        match self {
            HybridSet::LargeSet(self_large) => match other {
                HybridSet::LargeSet(other_large) => self_large.union(other_large),
                HybridSet::SmallSet(other_small) => {
                    let mut changed = false;
                    for elem in other_small.iter() {
                        changed |= self_large.insert(*elem);
                    }
                    changed
                }
            },
            HybridSet::SmallSet(self_small) => match other {
                HybridSet::LargeSet(other_large) => {
                    let mut self_large = BitVec::new_empty();
                    for elem in self_small.iter() {
                        self_large.insert(*elem);
                    }
                    let changed = self_large.union(other_large);
                    *self = HybridSet::LargeSet(self_large);
                    changed
                }
                HybridSet::SmallSet(other_small) => {
                    let mut changed = false;
                    for &elem in other_small.iter() {
                        changed |= self.insert(elem);
                    }
                    changed
                }
            },
        }
    }

    pub fn subtract(&mut self, other: &HybridSet<T>) -> bool {
        match self {
            HybridSet::LargeSet(self_large) => match other {
                HybridSet::LargeSet(other_large) => self_large.subtract(other_large),
                HybridSet::SmallSet(other_small) => {
                    let mut changed = false;
                    for &elem in other_small.iter() {
                        changed |= self_large.remove(elem);
                    }
                    changed
                }
            },
            HybridSet::SmallSet(self_small) => {
                let mut changed = false;
                self_small.retain(|&elem| {
                    let contains = other.contains(elem);
                    if contains {
                        changed = true;
                    }
                    !contains
                });
                changed
            }
        }
    }

    pub fn intersect(&mut self, other: &HybridSet<T>) -> bool {
        match self {
            HybridSet::LargeSet(self_large) => match other {
                HybridSet::LargeSet(other_large) => self_large.intersect(other_large),
                HybridSet::SmallSet(other_small) => {
                    let mut self_small = other_small.clone();
                    let mut changed = false;
                    self_small.retain(|&elem| {
                        let contains = self_large.contains(elem);
                        if !contains {
                            changed = true;
                        }
                        contains
                    });
                    *self = HybridSet::SmallSet(self_small);
                    changed
                }
            },
            HybridSet::SmallSet(self_small) => {
                let mut changed = false;
                self_small.retain(|&elem| {
                    let contains = other.contains(elem);
                    if !contains {
                        changed = true;
                    }
                    contains
                });
                changed
            }
        }
    }
}

pub enum HybridIter<'a, T: Idx> {
    SmallIter(slice::Iter<'a, T>),
    LargeIter(BitIter<'a, T>),
}

impl<'a, T: Idx> Iterator for HybridIter<'a, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        match self {
            HybridIter::SmallIter(small) => small.next().copied(),
            HybridIter::LargeIter(large) => large.next(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    impl Idx for u32 {
        fn new(idx: usize) -> Self {
            idx as u32
        }
        fn index(self) -> usize {
            self as usize
        }
    }

    #[test]
    fn small_set_stays_small_and_iterates() {
        let mut set = HybridPointsToSet::<u32>::new();
        for x in [3u32, 7, 1, 9] {
            set.insert(x);
        }
        assert_eq!(set.count(), 4);
        assert!(matches!(set.points_to, HybridSet::SmallSet(_)));
        assert_eq!(set.iter().collect::<HashSet<_>>(), HashSet::from([3, 7, 1, 9]));

        assert!(set.contains(7));
        assert!(set.remove(7));
        assert!(!set.contains(7));
        assert_eq!(set.count(), 3);
    }

    #[test]
    fn overflow_promotes_to_large_set() {
        let mut set = HybridPointsToSet::<u32>::new();
        for x in 0..(SMALL_SET_CAPACITY as u32 + 3) {
            set.insert(x);
        }
        assert_eq!(set.count(), SMALL_SET_CAPACITY + 3);
        assert!(matches!(set.points_to, HybridSet::LargeSet(_)));
        assert!(set.contains(0));
        assert!(set.contains(SMALL_SET_CAPACITY as u32 + 2));
    }

    #[test]
    fn union_subtract_intersect_match_across_representations() {
        let mut small = HybridPointsToSet::<u32>::new();
        small.insert(1);
        small.insert(2);

        let mut large = HybridPointsToSet::<u32>::new();
        for x in 0..(SMALL_SET_CAPACITY as u32 + 1) {
            large.insert(x);
        }

        let mut union = small.clone();
        assert!(union.union(&large));
        assert!(union.contains(2) && union.contains(SMALL_SET_CAPACITY as u32));

        let mut diff = large.clone();
        assert!(diff.subtract(&small));
        assert!(!diff.contains(1) && diff.contains(3));

        let mut inter = large.clone();
        assert!(inter.intersect(&small));
        assert_eq!(inter.count(), 2);
    }
}
