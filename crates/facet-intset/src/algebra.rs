//! Set algebra across the three [`IntSet`] representations.
//!
//! Bitmap pairs combine word-parallel; a range operand clamps the other side
//! without materializing anything; every remaining pairing falls back to an
//! ordered-iterator merge. Results are re-encoded through
//! [`IntSet::into_best`] so algebra never degrades the representation.

use crate::bits;
use crate::set::{ArrayIntSet, BitmapIntSet, IntSet, IntSetBuilder, IntSetIter, RangeIntSet, RowId};

impl IntSet {
    /// Set-theoretic union with `other`, whatever its representation.
    pub fn union(&self, other: &IntSet) -> IntSet {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        if let IntSet::Range(r) = self {
            if range_covers(r, other) {
                return self.clone();
            }
        }
        if let IntSet::Range(r) = other {
            if range_covers(r, self) {
                return other.clone();
            }
        }
        match (self, other) {
            (IntSet::Range(a), IntSet::Range(b)) => {
                if let Some(merged) = merge_ranges(a, b) {
                    return IntSet::Range(merged);
                }
                union_of_ordered(self.iter(), other.iter())
            }
            (IntSet::Bitmap(a), IntSet::Bitmap(b)) => bitmap_union(a, b).into_best(),
            _ => union_of_ordered(self.iter(), other.iter()),
        }
    }

    /// Set-theoretic intersection with `other`, whatever its representation.
    pub fn intersection(&self, other: &IntSet) -> IntSet {
        if self.is_empty() || other.is_empty() {
            return IntSet::empty();
        }
        match (self, other) {
            // A range operand reduces intersection to clamping the other
            // side to its span.
            (IntSet::Range(r), _) => {
                let (lo, hi) = (r.min().unwrap_or(0), r.max().unwrap_or(0));
                clamp(other, lo, hi)
            }
            (_, IntSet::Range(r)) => {
                let (lo, hi) = (r.min().unwrap_or(0), r.max().unwrap_or(0));
                clamp(self, lo, hi)
            }
            (IntSet::Bitmap(a), IntSet::Bitmap(b)) => bitmap_intersection(a, b).into_best(),
            _ => intersection_of_ordered(self.iter(), other.iter()),
        }
    }

    /// K-way union.
    pub fn union_all<'a>(sets: impl IntoIterator<Item = &'a IntSet>) -> IntSet {
        use std::cmp::Reverse;
        use std::collections::BinaryHeap;

        let mut iters: Vec<IntSetIter<'a>> = sets.into_iter().map(|s| s.iter()).collect();
        let mut heap: BinaryHeap<Reverse<(RowId, usize)>> = BinaryHeap::new();
        for (i, it) in iters.iter_mut().enumerate() {
            if let Some(v) = it.next() {
                heap.push(Reverse((v, i)));
            }
        }
        let mut out = IntSetBuilder::new();
        let mut last: Option<RowId> = None;
        while let Some(Reverse((v, i))) = heap.pop() {
            if last != Some(v) {
                out.push(v);
                last = Some(v);
            }
            if let Some(n) = iters[i].next() {
                heap.push(Reverse((n, i)));
            }
        }
        out.finish()
    }
}

/// Whether every member of `s` lies within the contiguous range `r`.
fn range_covers(r: &RangeIntSet, s: &IntSet) -> bool {
    match (r.min(), r.max(), s.min(), s.max()) {
        (Some(rmin), Some(rmax), Some(smin), Some(smax)) => smin >= rmin && smax <= rmax,
        _ => false,
    }
}

/// Two overlapping or adjacent ranges fuse into one; disjoint ranges don't.
fn merge_ranges(a: &RangeIntSet, b: &RangeIntSet) -> Option<RangeIntSet> {
    let (amin, amax) = (a.min()?, a.max()?);
    let (bmin, bmax) = (b.min()?, b.max()?);
    if u64::from(amin) > u64::from(bmax) + 1 || u64::from(bmin) > u64::from(amax) + 1 {
        return None;
    }
    let min = amin.min(bmin);
    let max = amax.max(bmax);
    Some(RangeIntSet::new(min, max - min + 1))
}

fn bitmap_union(a: &BitmapIntSet, b: &BitmapIntSet) -> IntSet {
    let start = a.first_word().min(b.first_word());
    let end = a.end_word().max(b.end_word());
    let words: Vec<u32> = (start..end).map(|w| a.word_at(w) | b.word_at(w)).collect();
    IntSet::Bitmap(BitmapIntSet::from_words(words, start))
}

fn bitmap_intersection(a: &BitmapIntSet, b: &BitmapIntSet) -> IntSet {
    let start = a.first_word().max(b.first_word());
    let end = a.end_word().min(b.end_word());
    if start >= end {
        return IntSet::empty();
    }
    let words: Vec<u32> = (start..end).map(|w| a.word_at(w) & b.word_at(w)).collect();
    IntSet::Bitmap(BitmapIntSet::from_words(words, start))
}

/// The subset of `s` within `[lo, hi]`, inclusive.
fn clamp(s: &IntSet, lo: RowId, hi: RowId) -> IntSet {
    match s {
        IntSet::Range(r) => {
            let (Some(rmin), Some(rmax)) = (r.min(), r.max()) else {
                return IntSet::empty();
            };
            let min = rmin.max(lo);
            let max = rmax.min(hi);
            if min > max {
                return IntSet::empty();
            }
            IntSet::Range(RangeIntSet::new(min, max - min + 1))
        }
        IntSet::Array(a) => {
            let v = a.as_slice();
            let from = v.partition_point(|&x| x < lo);
            let to = v.partition_point(|&x| x <= hi);
            IntSet::Array(ArrayIntSet::from_sorted(v[from..to].to_vec())).into_best()
        }
        IntSet::Bitmap(b) => clamp_bitmap(b, lo, hi),
    }
}

fn clamp_bitmap(s: &BitmapIntSet, lo: RowId, hi: RowId) -> IntSet {
    let start = s.first_word().max(bits::in_word(lo));
    let end = s.end_word().min(bits::in_word(hi) + 1);
    if start >= end {
        return IntSet::empty();
    }
    let mut words: Vec<u32> = (start..end).map(|w| s.word_at(w)).collect();
    if bits::in_word(lo) == start {
        // Drop bits below `lo` in the first word.
        words[0] &= !(1u32 << bits::offset(lo)).wrapping_sub(1);
    }
    if bits::in_word(hi) == end - 1 {
        let keep = bits::offset(hi);
        let mask = if keep == 31 {
            u32::MAX
        } else {
            (1u32 << (keep + 1)) - 1
        };
        let last = words.len() - 1;
        words[last] &= mask;
    }
    IntSet::Bitmap(BitmapIntSet::from_words(words, start)).into_best()
}

/// Classic two-way merge of ascending streams, duplicates emitted once.
fn union_of_ordered(mut a: IntSetIter<'_>, mut b: IntSetIter<'_>) -> IntSet {
    let mut out = IntSetBuilder::new();
    let mut x = a.next();
    let mut y = b.next();
    loop {
        match (x, y) {
            (None, None) => break,
            (Some(v), None) => {
                out.push(v);
                x = a.next();
            }
            (None, Some(v)) => {
                out.push(v);
                y = b.next();
            }
            (Some(va), Some(vb)) => {
                if va < vb {
                    out.push(va);
                    x = a.next();
                } else if vb < va {
                    out.push(vb);
                    y = b.next();
                } else {
                    out.push(va);
                    x = a.next();
                    y = b.next();
                }
            }
        }
    }
    out.finish()
}

/// Leapfrog intersection: advance the lagging stream to the leading head
/// until both agree.
fn intersection_of_ordered(mut a: IntSetIter<'_>, mut b: IntSetIter<'_>) -> IntSet {
    let mut out = IntSetBuilder::new();
    let mut x = a.next();
    let mut y = b.next();
    while let (Some(va), Some(vb)) = (x, y) {
        if va == vb {
            out.push(va);
            x = a.next();
            y = b.next();
        } else if va < vb {
            a.advance_to(vb);
            x = a.next();
        } else {
            b.advance_to(va);
            y = b.next();
        }
    }
    out.finish()
}
