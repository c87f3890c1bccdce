//! Pure analysis over a loaded table: value binning, endpoint proximity and
//! summary statistics. Nothing here touches UI state.

pub mod distribution;
pub mod proximity;
pub mod stats;

pub use distribution::{analyze, BinScale, Distribution, DistributionError};
pub use proximity::{closest_pairs, find_close_pairs, ProximityRecord, DEFAULT_PROXIMITY_THRESHOLD};
pub use stats::ValueSummary;
