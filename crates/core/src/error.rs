use thiserror::Error;

/// Errors raised by the ranking functions.
///
/// No partial result is ever produced: validation runs over the whole input
/// before anything is sorted or summed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RankError {
    /// A value at `index` cannot take part in a ranking.
    #[error("invalid value {value} at index {index}: {reason}")]
    InvalidArgument {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    /// A row of a matrix held an invalid value.
    #[error("row {row}: {source}")]
    InvalidRow {
        row: usize,
        #[source]
        source: Box<RankError>,
    },
}

impl RankError {
    pub(crate) fn negative(index: usize, value: f64) -> Self {
        RankError::InvalidArgument {
            index,
            value,
            reason: "weights must be non-negative",
        }
    }

    pub(crate) fn non_finite(index: usize, value: f64) -> Self {
        RankError::InvalidArgument {
            index,
            value,
            reason: "value is not finite",
        }
    }

    pub(crate) fn not_a_number(index: usize) -> Self {
        RankError::InvalidArgument {
            index,
            value: f64::NAN,
            reason: "value is NaN",
        }
    }

    pub(crate) fn in_row(self, row: usize) -> Self {
        RankError::InvalidRow {
            row,
            source: Box::new(self),
        }
    }

    /// Position of the offending value within its own sequence.
    pub fn index(&self) -> usize {
        match self {
            RankError::InvalidArgument { index, .. } => *index,
            RankError::InvalidRow { source, .. } => source.index(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RankError>;
