//! Weighted percentile rank.
//!
//! The rank of a value is the share of the total weight held by all values
//! up to and including it, so a single heavy item pushes everything below it
//! down. Equal values share the highest rank any of them reaches.

use log::debug;
use ndarray::{Array1, Array2, ArrayBase, Data, Ix1, Ix2};
use rayon::prelude::*;

use crate::error::{RankError, Result};

/// Checks that every weight is finite and non-negative.
///
/// Reports the first offending position.
pub fn validate_weights(weights: &[f64]) -> Result<()> {
    for (index, &value) in weights.iter().enumerate() {
        if value < 0.0 {
            return Err(RankError::negative(index, value));
        }
        if !value.is_finite() {
            return Err(RankError::non_finite(index, value));
        }
    }
    Ok(())
}

/// Weighted percentile rank of every element of `weights`, in input order.
///
/// Ranks lie in `[0, 100]` and the highest rank is exactly `100.0` as soon as
/// one weight is positive. If every weight is zero the cumulative sums are
/// returned as they are (all zeros) instead of being normalised.
///
/// ```
/// let ranks = wprank::weighted_percentile_rank(&[10.0, 10.0, 20.0, 60.0]).unwrap();
/// assert_eq!(ranks, vec![20.0, 20.0, 40.0, 100.0]);
/// ```
pub fn weighted_percentile_rank(weights: &[f64]) -> Result<Vec<f64>> {
    if weights.is_empty() {
        return Ok(Vec::new());
    }
    validate_weights(weights)?;

    let n = weights.len();
    let mut sorted: Vec<(usize, f64)> = weights.iter().copied().enumerate().collect();
    sorted.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut cumsum = cumulative_sum(sorted.iter().map(|&(_, w)| w));
    let mut total = cumsum[n - 1];

    // Finite weights can still overflow once summed.
    if total.is_infinite() {
        let max = sorted[n - 1].1;
        debug!("cumulative weight overflowed, rescaling by {max}");
        cumsum = cumulative_sum(sorted.iter().map(|&(_, w)| w / max));
        total = cumsum[n - 1];
    }

    let normalized: Vec<f64> = if total > 0.0 {
        cumsum.iter().map(|c| c / total * 100.0).collect()
    } else {
        debug!("all {n} weights are zero, returning unnormalized cumulative sums");
        cumsum
    };

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j < n - 1 && sorted[j].1 == sorted[j + 1].1 {
            j += 1;
        }
        let rank = normalized[i..=j]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        for &(position, _) in &sorted[i..=j] {
            ranks[position] = rank;
        }
        i = j + 1;
    }
    Ok(ranks)
}

fn cumulative_sum(values: impl Iterator<Item = f64>) -> Vec<f64> {
    values
        .scan(0.0, |acc, w| {
            *acc += w;
            Some(*acc)
        })
        .collect()
}

pub fn weighted_percentile_rank_array<S>(data: &ArrayBase<S, Ix1>) -> Result<Array1<f64>>
where
    S: Data<Elem = f64>,
{
    let ranks = match data.as_slice() {
        Some(values) => weighted_percentile_rank(values)?,
        None => weighted_percentile_rank(&data.to_vec())?,
    };
    Ok(Array1::from(ranks))
}

/// Ranks each row of `data` on its own. Rows are processed in parallel.
///
/// If several rows are invalid, the error of the lowest row is returned.
pub fn weighted_percentile_rank_rows<S>(data: &ArrayBase<S, Ix2>) -> Result<Array2<f64>>
where
    S: Data<Elem = f64> + Sync,
{
    let (n_rows, n_cols) = data.dim();

    let rank_rows: Vec<Result<Array1<f64>>> = (0..n_rows)
        .into_par_iter()
        .map(|i| weighted_percentile_rank_array(&data.row(i)).map_err(|e| e.in_row(i)))
        .collect();

    let mut rank_matrix = Array2::<f64>::zeros((n_rows, n_cols));
    for (i, rank_row) in rank_rows.into_iter().enumerate() {
        rank_matrix.row_mut(i).assign(&rank_row?);
    }
    Ok(rank_matrix)
}
