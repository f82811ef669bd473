// SPDX-License-Identifier: Apache-2.0

//! A small Bloom filter of previously-emitted canonical ids (§4.2 "Budget
//! controls"), used to cheaply skip re-emitting cycles a prior discovery pass
//! already surfaced. False positives only cause a skip, never an incorrect
//! admission — the Cycle Cache remains the source of truth for what is
//! actually admitted.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

const ALTERNATE_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

pub struct BloomFilter {
    bits: Vec<u64>,
    num_bits: usize,
    num_hashes: usize,
}

impl BloomFilter {
    pub fn new(expected_items: usize, false_positive_rate: f64) -> Self {
        let num_bits = Self::optimal_num_bits(expected_items, false_positive_rate).max(64);
        let num_hashes = Self::optimal_num_hashes(num_bits, expected_items).max(1);
        Self {
            bits: vec![0u64; num_bits.div_ceil(64)],
            num_bits,
            num_hashes,
        }
    }

    fn optimal_num_bits(expected_items: usize, false_positive_rate: f64) -> usize {
        let n = (expected_items.max(1)) as f64;
        (-(n * false_positive_rate.ln()) / std::f64::consts::LN_2.powi(2)).ceil() as usize
    }

    fn optimal_num_hashes(num_bits: usize, expected_items: usize) -> usize {
        let n = (expected_items.max(1)) as f64;
        ((num_bits as f64 / n) * std::f64::consts::LN_2).round() as usize
    }

    fn hash_pair(item: &str) -> (u64, u64) {
        let mut h1 = DefaultHasher::new();
        item.hash(&mut h1);
        let a = h1.finish();

        let mut h2 = DefaultHasher::new();
        item.hash(&mut h2);
        ALTERNATE_SEED.hash(&mut h2);
        let b = h2.finish();

        (a, b)
    }

    fn bit_indices(&self, item: &str) -> Vec<usize> {
        let (h1, h2) = Self::hash_pair(item);
        (0..self.num_hashes)
            .map(|i| {
                let combined = h1.wrapping_add((i as u64).wrapping_mul(h2));
                (combined % self.num_bits as u64) as usize
            })
            .collect()
    }

    pub fn insert(&mut self, item: &str) {
        for idx in self.bit_indices(item) {
            self.bits[idx / 64] |= 1 << (idx % 64);
        }
    }

    pub fn might_contain(&self, item: &str) -> bool {
        self.bit_indices(item)
            .into_iter()
            .all(|idx| self.bits[idx / 64] & (1 << (idx % 64)) != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserted_item_is_reported_present() {
        let mut filter = BloomFilter::new(1_000, 0.01);
        filter.insert("A>B>C|x,y,z");
        assert!(filter.might_contain("A>B>C|x,y,z"));
    }

    #[test]
    fn fresh_filter_reports_arbitrary_item_absent() {
        let filter = BloomFilter::new(1_000, 0.01);
        assert!(!filter.might_contain("never-inserted"));
    }
}
