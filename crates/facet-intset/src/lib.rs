//! Compact, immutable sets of non-negative row-ids.
//!
//! This crate is the filtering primitive of the facet column store. A set of
//! row-ids is held in whichever of three representations is cheapest for its
//! shape:
//!
//! - [`RangeIntSet`] — a contiguous run, two integers total.
//! - [`ArrayIntSet`] — a strictly ascending array, for sparse sets.
//! - [`BitmapIntSet`] — one bit per possible id, for dense scattered sets.
//!
//! All three live behind the [`IntSet`] enum; union, intersection, equality
//! and ordered iteration work across any pairing of representations, and
//! [`IntSet::into_best`] re-encodes a set into its cheapest form.
//!
//! Construction goes through [`IntSetBuilder`]: feed strictly ascending ids,
//! call [`finish`](IntSetBuilder::finish).

#![forbid(unsafe_code)]

pub mod bits;

mod algebra;
mod set;

pub use crate::set::{
    ArrayIntSet, BitmapIntSet, IntSet, IntSetBuilder, IntSetIter, RangeIntSet, RowId,
};
