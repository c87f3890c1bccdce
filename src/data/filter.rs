use thiserror::Error;

use super::model::ComponentTable;

// ---------------------------------------------------------------------------
// Value filter: inclusive [min, max] window over the value column
// ---------------------------------------------------------------------------

/// Rejected text typed into a bound field.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterInputError {
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error("bound must be finite, got {0}")]
    NotFinite(f64),
}

/// Inclusive value window. `lo`/`hi` are the column extremes the window is
/// clamped to; `min <= max` always holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueFilter {
    lo: f64,
    hi: f64,
    min: f64,
    max: f64,
}

impl ValueFilter {
    /// A filter spanning `[lo, hi]` (swapped if given in reverse).
    pub fn new(lo: f64, hi: f64) -> Self {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        Self {
            lo,
            hi,
            min: lo,
            max: hi,
        }
    }

    /// A filter showing every component of `table`.
    pub fn for_table(table: &ComponentTable) -> Option<Self> {
        table.value_range().map(|(lo, hi)| Self::new(lo, hi))
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.lo, self.hi)
    }

    /// Set the lower bound. A bound above `max` drags `max` along.
    pub fn set_min(&mut self, value: f64) {
        self.min = value.clamp(self.lo, self.hi);
        if self.min > self.max {
            self.max = self.min;
        }
    }

    /// Set the upper bound. A bound below `min` drags `min` along.
    pub fn set_max(&mut self, value: f64) {
        self.max = value.clamp(self.lo, self.hi);
        if self.max < self.min {
            self.min = self.max;
        }
    }

    /// Back to the full column range.
    pub fn reset(&mut self) {
        self.min = self.lo;
        self.max = self.hi;
    }

    pub fn is_full_range(&self) -> bool {
        self.min <= self.lo && self.max >= self.hi
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Parse a bound typed by the user; accepts plain and scientific notation.
pub fn parse_bound(text: &str) -> Result<f64, FilterInputError> {
    let value = text
        .trim()
        .parse::<f64>()
        .map_err(|_| FilterInputError::NotANumber(text.trim().to_string()))?;
    if !value.is_finite() {
        return Err(FilterInputError::NotFinite(value));
    }
    Ok(value)
}

/// Format a bound the way the text fields display it.
pub fn format_bound(value: f64) -> String {
    format!("{value:.2e}")
}

/// Return indices of components whose value passes the filter.
pub fn visible_indices(table: &ComponentTable, filter: &ValueFilter) -> Vec<usize> {
    table
        .components
        .iter()
        .enumerate()
        .filter(|(_, c)| filter.contains(c.value))
        .map(|(i, _)| i)
        .collect()
}
