//! Search frontier entries.
//!
//! `BinaryHeap` is a max-heap, so the ordering is reversed: the entry with
//! the smallest `f` compares greatest. Ties go to the smaller quantity id,
//! then to the earlier insertion.

use std::cmp::Ordering;

use crate::model::QuantityId;

#[derive(Debug, Clone)]
pub(crate) struct FrontierEntry {
    pub quantity: QuantityId,
    /// f = g + h
    pub f_score: f64,
    /// Formula applications needed to derive `quantity` on this route.
    pub g_score: u32,
    /// Insertion counter.
    pub seq: u64,
}

impl FrontierEntry {
    pub fn new(quantity: QuantityId, g_score: u32, h_score: f64, seq: u64) -> Self {
        Self {
            quantity,
            f_score: f64::from(g_score) + h_score,
            g_score,
            seq,
        }
    }
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // NaN sinks to the bottom of the heap
        let by_f = match (self.f_score.is_nan(), other.f_score.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => other.f_score.partial_cmp(&self.f_score).unwrap_or(Ordering::Equal),
        };
        by_f.then_with(|| other.quantity.cmp(&self.quantity))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}
