//! Fixed leg-index adjacency derived from the body plan ordering.
//!
//! Legs alternate left/right and run front to back, so for leg `i`:
//!
//! ```text
//!   row 0:   0 (L)  1 (R)
//!   row 1:   2 (L)  3 (R)
//!   row 2:   4 (L)  5 (R)
//! ```
//!
//! - `horizontal(i)` is the other leg in the same row (`i ^ 1`),
//! - `front(i)` / `back(i)` are the same-side legs one row away (`i ∓ 2`),
//! - `diagonal(i)` are the rows either side of `horizontal(i)`,
//! - `adjacent(i)` is front, back and horizontal.

use serde::{Deserialize, Serialize};

/// Adjacency tables for a body with `leg_count` legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegTopology {
    leg_count: usize,
}

impl LegTopology {
    pub const fn new(leg_count: usize) -> Self {
        Self { leg_count }
    }

    pub const fn leg_count(&self) -> usize {
        self.leg_count
    }

    /// Even indices are on the left side.
    pub const fn is_left(leg: usize) -> bool {
        leg % 2 == 0
    }

    /// Front-to-back row of a leg.
    pub const fn row(leg: usize) -> usize {
        leg / 2
    }

    /// Number of front-to-back rows.
    pub const fn row_count(&self) -> usize {
        self.leg_count.div_ceil(2)
    }

    fn valid(&self, leg: usize) -> Option<usize> {
        (leg < self.leg_count).then_some(leg)
    }

    /// Same row, opposite side.
    pub fn horizontal(&self, leg: usize) -> Option<usize> {
        self.valid(leg ^ 1)
    }

    /// Same side, one row toward the front.
    pub fn front(&self, leg: usize) -> Option<usize> {
        leg.checked_sub(2)
    }

    /// Same side, one row toward the back.
    pub fn back(&self, leg: usize) -> Option<usize> {
        self.valid(leg + 2)
    }

    /// Opposite-side legs in the neighbouring rows.
    pub fn diagonal(&self, leg: usize) -> Vec<usize> {
        self.horizontal(leg)
            .map(|h| [self.front(h), self.back(h)].into_iter().flatten().collect())
            .unwrap_or_default()
    }

    /// Front, back and horizontal neighbours.
    pub fn adjacent(&self, leg: usize) -> Vec<usize> {
        [self.front(leg), self.back(leg), self.horizontal(leg)]
            .into_iter()
            .flatten()
            .collect()
    }

    /// Which of the two alternating diagonal groups a leg belongs to.
    ///
    /// Group 0 holds leg 0 and every leg diagonal to a group 0 leg's
    /// horizontal neighbour, so a quadruped's groups are its diagonal pairs
    /// and a hexapod's are its tripods.
    pub const fn diagonal_group(leg: usize) -> usize {
        (leg / 2 + leg % 2) % 2
    }

    /// Per-tick update order: every group 0 leg, then every group 1 leg,
    /// each in index order.
    pub fn update_order(&self) -> Vec<usize> {
        let (mut first, second): (Vec<usize>, Vec<usize>) =
            (0..self.leg_count).partition(|&leg| Self::diagonal_group(leg) == 0);
        first.extend(second);
        first
    }

    /// Leg order that walks around the body outline: left legs front to
    /// back, then right legs back to front.
    pub fn outline_order(&self) -> Vec<usize> {
        let left = (0..self.leg_count).step_by(2);
        let right = (1..self.leg_count).step_by(2).rev();
        left.chain(right).collect()
    }

    /// Whether a leg sits in the front half of the body.
    ///
    /// With an odd row count the middle row is neither front nor back.
    pub const fn is_front_half(&self, leg: usize) -> bool {
        Self::row(leg) < self.row_count() / 2
    }

    pub const fn is_back_half(&self, leg: usize) -> bool {
        Self::row(leg) >= self.row_count().div_ceil(2)
    }
}
