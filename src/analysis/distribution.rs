//! Value-distribution binning.
//!
//! A value column is split into `num_bins` contiguous ranges, either linearly
//! or logarithmically spaced, and every value is counted into one of them.
//! The bins drive the discrete colouring and the legend of the 3D view.

use std::fmt;

use thiserror::Error;

/// `max / (min + RATIO_EPSILON)` guards the ratio against a zero minimum.
const RATIO_EPSILON: f64 = 1e-10;

/// Above this `max / min` ratio the column is binned logarithmically.
pub const LOG_RATIO_THRESHOLD: f64 = 100.0;

/// Lowest value a logarithmic edge may take.
const LOG_FLOOR: f64 = 1e-15;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DistributionError {
    #[error("cannot bin an empty value column")]
    Empty,
    #[error("at least 2 bins are required, got {0}")]
    TooFewBins(usize),
    #[error("value at index {index} is not finite ({value})")]
    NonFinite { index: usize, value: f64 },
}

/// How the bin edges are spaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinScale {
    Linear,
    Log,
}

impl fmt::Display for BinScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinScale::Linear => write!(f, "linear"),
            BinScale::Log => write!(f, "logarithmic"),
        }
    }
}

/// One colour range of the distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub min: f64,
    pub max: f64,
    pub label: String,
    pub count: usize,
    pub percentage: f64,
}

/// Bins and edges of one value column. `edges.len() == bins.len() + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    pub bins: Vec<Bin>,
    pub edges: Vec<f64>,
    pub scale: BinScale,
}

impl Distribution {
    pub fn num_bins(&self) -> usize {
        self.bins.len()
    }

    /// Bin a value falls into. Values outside the edges are clamped to the
    /// first or last bin.
    pub fn bin_index(&self, value: f64) -> usize {
        bin_index(&self.edges, value)
    }
}

/// Pick the edge spacing for a column with extremes `min` and `max`.
///
/// Logarithmic spacing is used when it is requested, or when a strictly
/// positive column spans more than [`LOG_RATIO_THRESHOLD`]; a request for
/// linear bins does not override such a column. A column reaching down to
/// zero keeps the requested spacing, since its ratio is unbounded. Log
/// spacing needs a positive maximum, so a column of zeros always gets linear
/// bins.
pub fn choose_scale(min: f64, max: f64, use_log: bool) -> BinScale {
    if max <= 0.0 {
        return BinScale::Linear;
    }
    let wide = min > 0.0 && max / (min + RATIO_EPSILON) > LOG_RATIO_THRESHOLD;
    if use_log || wide {
        BinScale::Log
    } else {
        BinScale::Linear
    }
}

/// Bin `values` into `num_bins` ranges.
///
/// Every value is counted exactly once: `edges[i] <= v < edges[i + 1]`, with
/// the last bin closed on the right. The first edge is the column minimum
/// (or the log floor for non-positive minima) and the last edge is exactly
/// the column maximum.
///
/// A column of identical values `v` is binned over `[v, v + ε]` with
/// `ε = max(|v| * 1e-9, 1e-12)`, putting every value into the first bin.
pub fn analyze(values: &[f64], num_bins: usize, use_log: bool) -> Result<Distribution, DistributionError> {
    if values.is_empty() {
        return Err(DistributionError::Empty);
    }
    if num_bins < 2 {
        return Err(DistributionError::TooFewBins(num_bins));
    }
    if let Some((index, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(DistributionError::NonFinite { index, value });
    }

    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    let scale = if min == max {
        BinScale::Linear
    } else {
        choose_scale(min, max, use_log)
    };
    let edges = if min == max {
        let epsilon = (min.abs() * 1e-9).max(1e-12);
        linspace(min, min + epsilon, num_bins + 1)
    } else {
        match scale {
            BinScale::Linear => linspace(min, max, num_bins + 1),
            BinScale::Log => {
                let lo = min.max(LOG_FLOOR);
                let mut edges: Vec<f64> = linspace(lo.log10(), max.log10(), num_bins + 1)
                    .into_iter()
                    .map(|exp| 10f64.powf(exp))
                    .collect();
                edges[0] = lo;
                edges[num_bins] = max;
                edges
            }
        }
    };

    let mut counts = vec![0usize; num_bins];
    for &v in values {
        counts[bin_index(&edges, v)] += 1;
    }

    let total = values.len() as f64;
    let bins = counts
        .iter()
        .enumerate()
        .map(|(i, &count)| Bin {
            min: edges[i],
            max: edges[i + 1],
            label: format!("{:.3e} - {:.3e}", edges[i], edges[i + 1]),
            count,
            percentage: count as f64 / total * 100.0,
        })
        .collect();

    log::debug!(
        "Binned {} values into {num_bins} {scale} bins over [{min:e}, {max:e}]: {counts:?}",
        values.len()
    );

    Ok(Distribution { bins, edges, scale })
}

/// `n` evenly spaced points from `start` to `stop`; the last point is `stop`.
fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    let step = (stop - start) / (n - 1) as f64;
    let mut points: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
    points[n - 1] = stop;
    points
}

fn bin_index(edges: &[f64], value: f64) -> usize {
    let last = edges.len().saturating_sub(2);
    edges
        .partition_point(|&e| e <= value)
        .saturating_sub(1)
        .min(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn linear_bins_split_evenly() {
        let dist = analyze(&[0.0, 25.0, 50.0, 75.0, 100.0], 4, false).unwrap();
        assert_eq!(dist.scale, BinScale::Linear);
        assert_eq!(dist.edges, vec![0.0, 25.0, 50.0, 75.0, 100.0]);
        assert!(dist.bins.iter().take(3).all(|b| b.count == 1));
        // The maximum sits in the closed last bin alongside 75.
        assert_eq!(dist.bins[3].count, 2);
        assert_eq!(dist.bins.iter().map(|b| b.count).sum::<usize>(), 5);
    }

    #[test]
    fn linear_bins_one_value_each() {
        let dist = analyze(&[0.0, 30.0, 60.0, 100.0], 4, false).unwrap();
        assert_eq!(dist.edges, vec![0.0, 25.0, 50.0, 75.0, 100.0]);
        assert_eq!(
            dist.bins.iter().map(|b| b.count).collect::<Vec<_>>(),
            vec![1, 1, 1, 1]
        );
    }

    #[test]
    fn log_bins_follow_decades() {
        let values = [1.0, 10.0, 100.0, 1000.0, 10000.0];
        for use_log in [true, false] {
            let dist = analyze(&values, 4, use_log).unwrap();
            assert_eq!(dist.scale, BinScale::Log);
            let expected = [1.0, 10.0, 100.0, 1000.0, 10000.0];
            for (edge, want) in dist.edges.iter().zip(expected) {
                assert!(close(*edge, want), "{edge} != {want}");
            }
            assert_eq!(dist.edges[4], 10000.0);
        }
    }

    #[test]
    fn log_bins_count_decades() {
        let values = [2.0, 20.0, 200.0, 2000.0, 3000.0];
        let dist = analyze(&values, 4, true).unwrap();
        assert_eq!(
            dist.bins.iter().map(|b| b.count).collect::<Vec<_>>(),
            vec![1, 1, 1, 2]
        );
    }

    #[test]
    fn wide_range_overrides_linear_request() {
        assert_eq!(choose_scale(1.0, 1000.0, false), BinScale::Log);
        assert_eq!(choose_scale(1.0, 50.0, false), BinScale::Linear);
        assert_eq!(choose_scale(1.0, 50.0, true), BinScale::Log);
        assert_eq!(choose_scale(0.0, 0.0, true), BinScale::Linear);
    }

    #[test]
    fn zero_minimum_keeps_the_requested_scale() {
        assert_eq!(choose_scale(0.0, 100.0, false), BinScale::Linear);
        assert_eq!(choose_scale(0.0, 1e6, false), BinScale::Linear);
        assert_eq!(choose_scale(0.0, 100.0, true), BinScale::Log);
    }

    #[test]
    fn zero_minimum_in_log_mode_still_counts_everything() {
        let values = [0.0, 1e-3, 1.0, 5.0];
        let dist = analyze(&values, 3, true).unwrap();
        assert_eq!(dist.scale, BinScale::Log);
        assert_eq!(dist.edges[0], LOG_FLOOR);
        assert_eq!(dist.bins.iter().map(|b| b.count).sum::<usize>(), 4);
        assert_eq!(dist.bin_index(0.0), 0);
    }

    #[test]
    fn identical_values_widen_the_range() {
        let dist = analyze(&[4.7, 4.7, 4.7], 5, false).unwrap();
        assert_eq!(dist.edges.len(), 6);
        assert_eq!(dist.edges[0], 4.7);
        assert!(dist.edges.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(dist.bins[0].count, 3);
        assert_eq!(dist.bins.iter().map(|b| b.count).sum::<usize>(), 3);
    }

    #[test]
    fn identical_zeros_are_binned() {
        let dist = analyze(&[0.0, 0.0], 2, true).unwrap();
        assert_eq!(dist.scale, BinScale::Linear);
        assert_eq!(dist.bins[0].count, 2);
    }

    #[rstest]
    #[case(vec![3e-3, 2.5e-2, 1e-2, 7e-3], 5, false)]
    #[case(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0], 3, false)]
    #[case(vec![1e-6, 3e-4, 2.0, 9e2], 6, false)]
    #[case(vec![0.5, 0.5, 0.75], 2, true)]
    fn bins_partition_the_column(#[case] values: Vec<f64>, #[case] num_bins: usize, #[case] use_log: bool) {
        let dist = analyze(&values, num_bins, use_log).unwrap();
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        assert_eq!(dist.bins.len(), num_bins);
        assert_eq!(dist.edges.len(), num_bins + 1);
        assert_eq!(dist.edges[0], min);
        assert_eq!(dist.edges[num_bins], max);
        for (bin, pair) in dist.bins.iter().zip(dist.edges.windows(2)) {
            assert_eq!((bin.min, bin.max), (pair[0], pair[1]));
            assert!(bin.min < bin.max);
        }
        assert_eq!(dist.bins.iter().map(|b| b.count).sum::<usize>(), values.len());
        let pct: f64 = dist.bins.iter().map(|b| b.percentage).sum();
        assert!(close(pct, 100.0));
    }

    #[test]
    fn analysis_is_deterministic() {
        let values = [3.3e-3, 1.2e-2, 8.1e-3, 2.5e-2, 4.4e-3];
        let a = analyze(&values, 5, false).unwrap();
        let b = analyze(&values, 5, false).unwrap();
        let bits = |d: &Distribution| d.edges.iter().map(|e| e.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn labels_use_scientific_notation() {
        let dist = analyze(&[0.0, 100.0], 2, false).unwrap();
        assert_eq!(dist.bins[0].label, "0.000e0 - 5.000e1");
        assert_eq!(dist.bins[1].percentage, 50.0);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(analyze(&[], 5, false), Err(DistributionError::Empty));
        assert_eq!(analyze(&[1.0], 1, false), Err(DistributionError::TooFewBins(1)));
        assert!(matches!(
            analyze(&[1.0, f64::NAN], 2, false),
            Err(DistributionError::NonFinite { index: 1, .. })
        ));
    }

    #[test]
    fn out_of_range_values_clamp_to_outer_bins() {
        let dist = analyze(&[10.0, 20.0], 2, false).unwrap();
        assert_eq!(dist.bin_index(-5.0), 0);
        assert_eq!(dist.bin_index(15.0), 1);
        assert_eq!(dist.bin_index(99.0), 1);
        assert_eq!(dist.bins[dist.bin_index(12.0)].min, 10.0);
    }
}
