#![doc = include_str!("../README.md")]
#![no_std]
#![deny(
    unsafe_code,
    unused_imports,
    unused_variables,
    unused_must_use,
    missing_docs,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented
)]
#![allow(clippy::len_without_is_empty)]

#[cfg_attr(not(test), allow(unused_imports))]
#[macro_use]
extern crate alloc;

pub(crate) type Kbn = compensated_summation::KahanBabuskaNeumaier<f64>;

/// Reserved index marking an absent child, an absent parent and the root of
/// an empty tree. Modelling "nil" as a non-addressable index rather than a
/// shared allocated node rules out accidental mutation through the sentinel.
pub(crate) const NIL: usize = usize::MAX;

mod frequency;
pub use frequency::{FrequencyTable, KeyFrequency};

mod multiset;
pub use multiset::OrderedMultiset;

mod avl;
pub use avl::AvlTree;

mod rb;
pub use rb::RbTree;
