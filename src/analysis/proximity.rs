//! Endpoint proximity between component segments.

use crate::data::model::{Component, Point3};

/// Endpoints closer than this (in input units) are reported by default.
pub const DEFAULT_PROXIMITY_THRESHOLD: f64 = 0.05;

/// Anything drawn as a named segment between two points.
pub trait Segment {
    fn name(&self) -> &str;
    fn start(&self) -> Point3;
    fn end(&self) -> Point3;
}

impl Segment for Component {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self) -> Point3 {
        self.start
    }

    fn end(&self) -> Point3 {
        self.end
    }
}

impl<S: Segment + ?Sized> Segment for &S {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn start(&self) -> Point3 {
        (**self).start()
    }

    fn end(&self) -> Point3 {
        (**self).end()
    }
}

/// Two segments whose nearest endpoints lie below the threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct ProximityRecord {
    pub name_a: String,
    pub name_b: String,
    pub min_distance: f64,
}

/// Smallest of the four endpoint-to-endpoint distances of two segments.
pub fn endpoint_distance<S: Segment + ?Sized>(a: &S, b: &S) -> f64 {
    let (a_start, a_end) = (a.start(), a.end());
    let (b_start, b_end) = (b.start(), b.end());
    [
        a_start.distance(&b_start),
        a_start.distance(&b_end),
        a_end.distance(&b_start),
        a_end.distance(&b_end),
    ]
    .into_iter()
    .fold(f64::INFINITY, f64::min)
}

/// Every unordered pair `(i, j)`, `i < j`, whose endpoint distance is
/// strictly below `threshold`, in evaluation order.
///
/// This is a plain O(n²) scan without spatial indexing; tables hold tens
/// to a few hundred components.
pub fn find_close_pairs<S: Segment>(segments: &[S], threshold: f64) -> Vec<ProximityRecord> {
    let mut records = Vec::new();
    for (i, a) in segments.iter().enumerate() {
        for b in &segments[i + 1..] {
            let min_distance = endpoint_distance(a, b);
            if min_distance < threshold {
                records.push(ProximityRecord {
                    name_a: a.name().to_string(),
                    name_b: b.name().to_string(),
                    min_distance,
                });
            }
        }
    }
    log::debug!(
        "{} of {} segment pairs closer than {threshold}",
        records.len(),
        segments.len() * segments.len().saturating_sub(1) / 2
    );
    records
}

/// The `n` closest pairs, nearest first.
pub fn closest_pairs(records: &[ProximityRecord], n: usize) -> Vec<ProximityRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| a.min_distance.total_cmp(&b.min_distance));
    sorted.truncate(n);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(name: &str, start: [f64; 3], end: [f64; 3]) -> Component {
        Component {
            name: name.to_string(),
            start: start.into(),
            end: end.into(),
            value: 1.0,
            unit: "fF".to_string(),
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn reports_pair_below_threshold() {
        // End of A is 0.03 away from start of B.
        let segments = vec![
            seg("A", [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]),
            seg("B", [1.0, 0.03, 0.0], [2.0, 0.0, 0.0]),
        ];
        let records = find_close_pairs(&segments, 0.05);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name_a, "A");
        assert_eq!(records[0].name_b, "B");
        assert!(approx(records[0].min_distance, 0.03));
    }

    #[test]
    fn threshold_is_strict() {
        let segments = vec![
            seg("A", [0.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            seg("B", [0.5, 0.0, 0.0], [3.0, 0.0, 0.0]),
        ];
        assert_eq!(find_close_pairs(&segments, 0.5).len(), 0);
        assert_eq!(find_close_pairs(&segments, 0.25).len(), 0);
        let records = find_close_pairs(&segments, 0.5000001);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].min_distance, 0.5);
    }

    #[test]
    fn distance_is_symmetric_under_swap() {
        let a = seg("A", [0.0, 0.0, 0.0], [0.2, 0.1, 0.0]);
        let b = seg("B", [0.21, 0.12, 0.01], [0.5, 0.5, 0.0]);
        let forward = find_close_pairs(&[a.clone(), b.clone()], 0.1);
        let backward = find_close_pairs(&[b, a], 0.1);
        assert_eq!(forward.len(), 1);
        assert_eq!(backward.len(), 1);
        assert_eq!(forward[0].min_distance, backward[0].min_distance);
        assert_eq!((forward[0].name_a.as_str(), backward[0].name_a.as_str()), ("A", "B"));
    }

    #[test]
    fn output_follows_evaluation_order() {
        let segments = vec![
            seg("A", [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]),
            seg("B", [0.0, 0.04, 0.0], [5.0, 5.0, 0.0]),
            seg("C", [1.0, 0.01, 0.0], [9.0, 9.0, 0.0]),
            seg("D", [5.0, 5.02, 0.0], [7.0, 7.0, 0.0]),
        ];
        let records = find_close_pairs(&segments, 0.05);
        let pairs: Vec<(&str, &str)> = records
            .iter()
            .map(|r| (r.name_a.as_str(), r.name_b.as_str()))
            .collect();
        assert_eq!(pairs, vec![("A", "B"), ("A", "C"), ("B", "D")]);

        let nearest = closest_pairs(&records, 2);
        assert_eq!(nearest.len(), 2);
        assert_eq!((nearest[0].name_a.as_str(), nearest[0].name_b.as_str()), ("A", "C"));
        assert_eq!((nearest[1].name_a.as_str(), nearest[1].name_b.as_str()), ("B", "D"));
    }

    #[test]
    fn empty_and_single_inputs_yield_nothing() {
        let none: Vec<Component> = Vec::new();
        assert!(find_close_pairs(&none, 1.0).is_empty());
        let one = vec![seg("A", [0.0; 3], [0.0; 3])];
        assert!(find_close_pairs(&one, 1.0).is_empty());
    }
}
