//! Newtyped `usize` index support, shared by the bit-vector and chunked-queue
//! utilities. Adapted from `rustc_index`'s `Idx` trait without the
//! compiler-internal machinery.

use std::fmt::Debug;
use std::hash::Hash;

/// Represents some newtyped `usize` wrapper.
///
/// Purpose: avoid mixing indexes for different domains (node ids, edge ids,
/// context ids, ...).
pub trait Idx: Copy + 'static + Eq + PartialEq + Debug + Hash {
    fn new(idx: usize) -> Self;

    fn index(self) -> usize;

    fn plus(self, amount: usize) -> Self {
        Self::new(self.index() + amount)
    }
}

impl Idx for usize {
    #[inline]
    fn new(idx: usize) -> Self {
        idx
    }
    #[inline]
    fn index(self) -> usize {
        self
    }
}

impl Idx for u32 {
    #[inline]
    fn new(idx: usize) -> Self {
        assert!(idx <= u32::MAX as usize);
        idx as u32
    }
    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

/// Defines a newtype wrapper around `u32` that implements [`Idx`], in the
/// style of `rustc_index::newtype_index!` but as a plain macro_rules macro.
#[macro_export]
macro_rules! newtype_index {
    ($(#[$meta:meta])* $vis:vis struct $name:ident { $(#[$debug_meta:meta])* $debug_fmt:literal }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        $vis struct $name(u32);

        impl $name {
            pub const fn from_u32(v: u32) -> Self {
                $name(v)
            }
            pub const fn as_u32(self) -> u32 {
                self.0
            }
        }

        impl $crate::util::index::Idx for $name {
            #[inline]
            fn new(idx: usize) -> Self {
                $name(idx as u32)
            }
            #[inline]
            fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, $debug_fmt, self.0)
            }
        }
    };
}
