//! Count-based ranking measures.
//!
//! Every value counts once, whatever its size. Ties are broken by input
//! order, so equal values receive consecutive ranks.

use crate::error::{RankError, Result};

fn sorted_positions(values: &[f64]) -> Result<Vec<usize>> {
    if let Some(index) = values.iter().position(|v| v.is_nan()) {
        return Err(RankError::not_a_number(index));
    }
    let mut positions: Vec<usize> = (0..values.len()).collect();
    positions.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    Ok(positions)
}

/// 1-based position of each value in ascending order, reported in input order.
pub fn ordinal_ranks(values: &[f64]) -> Result<Vec<usize>> {
    let positions = sorted_positions(values)?;
    let mut ranks = vec![0; values.len()];
    for (order, position) in positions.into_iter().enumerate() {
        ranks[position] = order + 1;
    }
    Ok(ranks)
}

/// Ordinal rank and the measures derived from it, one entry per input value.
#[derive(Debug, Clone, PartialEq)]
pub struct OrdinalSummary {
    pub rank: Vec<usize>,
    /// `rank / n * 100`
    pub percentile_rank: Vec<f64>,
    /// `n - rank + 1`, i.e. "n-th largest".
    pub inverse_rank: Vec<usize>,
    /// `(rank - 1) / n * 100`, the empirical distribution at each value.
    pub cumulative_probability: Vec<f64>,
}

impl OrdinalSummary {
    pub fn from_values(values: &[f64]) -> Result<Self> {
        let rank = ordinal_ranks(values)?;
        let n = values.len();
        let len = n as f64;

        let percentile_rank = rank.iter().map(|&r| r as f64 / len * 100.0).collect();
        let inverse_rank = rank.iter().map(|&r| n - r + 1).collect();
        let cumulative_probability = rank
            .iter()
            .map(|&r| (r - 1) as f64 / len * 100.0)
            .collect();

        Ok(Self {
            rank,
            percentile_rank,
            inverse_rank,
            cumulative_probability,
        })
    }

    pub fn len(&self) -> usize {
        self.rank.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rank.is_empty()
    }
}
