//! Aggregation over categorized expenses. Pure functions of their input:
//! no storage, no network, and an empty input produces an empty report.

use std::collections::BTreeMap;

use crate::models::ReportRecord;

pub const RECENT_LIMIT: usize = 10;

pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
    pub pct: f64,
}

pub struct AggregateReport {
    pub total: f64,
    pub categories: Vec<CategoryTotal>,
    pub monthly: Vec<(String, f64)>,
    pub recent: Vec<ReportRecord>,
}

pub fn aggregate(records: &[ReportRecord]) -> AggregateReport {
    let mut by_category: BTreeMap<&str, f64> = BTreeMap::new();
    for record in records {
        *by_category.entry(record.category.as_str()).or_default() += record.amount;
    }
    let total: f64 = by_category.values().sum();

    let mut categories: Vec<CategoryTotal> = by_category
        .into_iter()
        .map(|(category, sum)| CategoryTotal {
            category: category.to_string(),
            total: sum,
            pct: if total != 0.0 { sum / total * 100.0 } else { 0.0 },
        })
        .collect();
    // Descending by amount; the BTreeMap ordering breaks ties by name
    categories.sort_by(|a, b| b.total.total_cmp(&a.total));

    let mut by_month: BTreeMap<String, f64> = BTreeMap::new();
    for record in records {
        if let Some(date) = record.date {
            *by_month.entry(date.format("%Y-%m").to_string()).or_default() += record.amount;
        }
    }

    let mut recent: Vec<ReportRecord> = records.to_vec();
    recent.sort_by(|a, b| b.date.cmp(&a.date));
    recent.truncate(RECENT_LIMIT);

    AggregateReport {
        total,
        categories,
        monthly: by_month.into_iter().collect(),
        recent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: Option<&str>, category: &str, amount: f64) -> ReportRecord {
        ReportRecord {
            date: date.map(|d| d.parse().unwrap()),
            description: format!("{category} vendor"),
            category: category.to_string(),
            amount,
        }
    }

    #[test]
    fn test_category_totals_sum_to_total() {
        let report = aggregate(&[
            record(Some("2026-05-01"), "Food", 240.0),
            record(Some("2026-05-02"), "Food", 60.0),
            record(Some("2026-05-03"), "Transport", 180.0),
        ]);
        assert_eq!(report.total, 480.0);
        let sum: f64 = report.categories.iter().map(|c| c.total).sum();
        assert_eq!(sum, report.total);
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        let report = aggregate(&[
            record(Some("2026-05-01"), "Food", 300.0),
            record(Some("2026-05-02"), "Transport", 100.0),
            record(Some("2026-05-03"), "Extra", 33.0),
        ]);
        let pct_sum: f64 = report.categories.iter().map(|c| c.pct).sum();
        assert!((pct_sum - 100.0).abs() < 1e-9, "got {pct_sum}");
    }

    #[test]
    fn test_categories_sorted_descending() {
        let report = aggregate(&[
            record(Some("2026-05-01"), "Transport", 100.0),
            record(Some("2026-05-02"), "Food", 300.0),
        ]);
        assert_eq!(report.categories[0].category, "Food");
        assert_eq!(report.categories[1].category, "Transport");
    }

    #[test]
    fn test_empty_input_yields_empty_report() {
        let report = aggregate(&[]);
        assert_eq!(report.total, 0.0);
        assert!(report.categories.is_empty());
        assert!(report.monthly.is_empty());
        assert!(report.recent.is_empty());
    }

    #[test]
    fn test_zero_total_has_zero_percentages() {
        let report = aggregate(&[record(Some("2026-05-01"), "Food", 0.0)]);
        assert_eq!(report.total, 0.0);
        assert_eq!(report.categories[0].pct, 0.0);
    }

    #[test]
    fn test_monthly_grouping() {
        let report = aggregate(&[
            record(Some("2026-04-28"), "Food", 100.0),
            record(Some("2026-05-01"), "Food", 50.0),
            record(Some("2026-05-14"), "Transport", 25.0),
            record(None, "Extra", 999.0),
        ]);
        assert_eq!(
            report.monthly,
            vec![("2026-04".to_string(), 100.0), ("2026-05".to_string(), 75.0)]
        );
    }

    #[test]
    fn test_recent_limited_and_newest_first() {
        let records: Vec<ReportRecord> = (1..=14)
            .map(|day| record(Some(&format!("2026-05-{day:02}")), "Food", day as f64))
            .collect();
        let report = aggregate(&records);
        assert_eq!(report.recent.len(), RECENT_LIMIT);
        assert_eq!(report.recent[0].date, Some("2026-05-14".parse().unwrap()));
        assert_eq!(report.recent[9].date, Some("2026-05-05".parse().unwrap()));
    }
}
