//! Plain-text tables for the command-line report, built with [`tabled`].

use tabled::{Table, Tabled};

use crate::analysis::{Distribution, ProximityRecord, ValueSummary};

/// One distribution bin as a table row.
#[derive(Debug, Clone, Tabled)]
pub struct BinRow {
    #[tabled(rename = "Bin")]
    pub index: usize,
    #[tabled(rename = "Range")]
    pub range: String,
    #[tabled(rename = "Count")]
    pub count: usize,
    #[tabled(rename = "Percentage")]
    pub percentage: String,
}

impl BinRow {
    pub fn from_distribution(distribution: &Distribution) -> Vec<Self> {
        distribution
            .bins
            .iter()
            .enumerate()
            .map(|(index, bin)| BinRow {
                index,
                range: bin.label.clone(),
                count: bin.count,
                percentage: format!("{:.2}%", bin.percentage),
            })
            .collect()
    }
}

/// One close pair as a table row.
#[derive(Debug, Clone, Tabled)]
pub struct PairRow {
    #[tabled(rename = "Component A")]
    pub name_a: String,
    #[tabled(rename = "Component B")]
    pub name_b: String,
    #[tabled(rename = "Distance")]
    pub distance: String,
}

impl From<&ProximityRecord> for PairRow {
    fn from(record: &ProximityRecord) -> Self {
        PairRow {
            name_a: record.name_a.clone(),
            name_b: record.name_b.clone(),
            distance: format!("{:.3e}", record.min_distance),
        }
    }
}

fn titled(title: Option<&str>, table: String) -> String {
    match title {
        Some(title) => format!("{}\n{}\n{}", title, "=".repeat(title.len()), table),
        None => table,
    }
}

/// The bins of `distribution` as an ASCII table.
pub fn format_distribution_table(distribution: &Distribution, title: Option<&str>) -> String {
    let rows = BinRow::from_distribution(distribution);
    if rows.is_empty() {
        return "No bins".to_string();
    }
    titled(title, Table::new(rows).to_string())
}

/// Close pairs as an ASCII table.
pub fn format_pair_table(records: &[ProximityRecord], title: Option<&str>) -> String {
    if records.is_empty() {
        return "No components closer than the threshold".to_string();
    }
    let rows: Vec<PairRow> = records.iter().map(PairRow::from).collect();
    titled(title, Table::new(rows).to_string())
}

/// Count, range, mean and median, one per line.
pub fn format_summary(summary: &ValueSummary, unit: &str) -> String {
    format!(
        "Count:  {}\nRange:  {:.3e} - {:.3e} {unit}\nMean:   {:.3e} {unit}\nMedian: {:.3e} {unit}",
        summary.count, summary.min, summary.max, summary.mean, summary.median
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;

    #[test]
    fn distribution_table_lists_bins() {
        let dist = analyze(&[0.0, 25.0, 50.0, 75.0, 100.0], 4, false).unwrap();
        let table = format_distribution_table(&dist, Some("Distribution"));

        assert!(table.starts_with("Distribution\n============"));
        assert!(table.contains("Range"));
        assert!(table.contains("Percentage"));
        assert!(table.contains("0.000e0 - 2.500e1"));
        assert!(table.contains("40.00%"));

        let untitled = format_distribution_table(&dist, None);
        assert!(!untitled.contains("Distribution"));
    }

    #[test]
    fn pair_table_formats_distances() {
        let records = vec![ProximityRecord {
            name_a: "C1".to_string(),
            name_b: "C2".to_string(),
            min_distance: 0.0125,
        }];
        let table = format_pair_table(&records, None);
        assert!(table.contains("Component A"));
        assert!(table.contains("C2"));
        assert!(table.contains("1.250e-2"));

        assert_eq!(
            format_pair_table(&[], None),
            "No components closer than the threshold"
        );
    }

    #[test]
    fn summary_lines() {
        let summary = ValueSummary::from_values(&[1.0, 3.0]).unwrap();
        let text = format_summary(&summary, "fF");
        assert!(text.contains("Count:  2"));
        assert!(text.contains("Mean:   2.000e0 fF"));
    }
}
