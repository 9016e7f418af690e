pub mod error;
pub mod rank;
pub mod weighted;

pub use error::{RankError, Result};
pub use rank::{ordinal_ranks, OrdinalSummary};
pub use weighted::{
    validate_weights, weighted_percentile_rank, weighted_percentile_rank_array,
    weighted_percentile_rank_rows,
};
