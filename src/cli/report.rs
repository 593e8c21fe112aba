use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::{Result, RupiError};
use crate::fmt::money;
use crate::models::ReportRecord;
use crate::reports::{self, AggregateReport};
use crate::settings::get_data_dir;

fn load_records() -> Result<Vec<ReportRecord>> {
    let path = get_data_dir().join("categorized.json");
    let content = std::fs::read_to_string(&path)
        .map_err(|_| RupiError::Other("No categorized data. Run `rupi categorize` first".to_string()))?;
    Ok(serde_json::from_str(&content)?)
}

pub fn summary() -> Result<()> {
    let records = load_records()?;
    let report = reports::aggregate(&records);
    print!("{}", format_summary(&report));
    Ok(())
}

pub fn monthly() -> Result<()> {
    let records = load_records()?;
    let report = reports::aggregate(&records);
    print!("{}", format_monthly(&report));
    Ok(())
}

pub fn recent() -> Result<()> {
    let records = load_records()?;
    let report = reports::aggregate(&records);
    print!("{}", format_recent(&report));
    Ok(())
}

// ---------------------------------------------------------------------------
// Pure formatting functions (report data → String)
// ---------------------------------------------------------------------------

fn format_summary(report: &AggregateReport) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Category", "Amount", "%"]);
    for item in &report.categories {
        table.add_row(vec![
            Cell::new(&item.category),
            Cell::new(money(item.total)),
            Cell::new(format!("{:.1}%", item.pct)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(money(report.total)),
        Cell::new(""),
    ]);
    format!("Spending by Category\n{table}\n")
}

fn format_monthly(report: &AggregateReport) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Month", "Amount"]);
    for (month, total) in &report.monthly {
        table.add_row(vec![Cell::new(month), Cell::new(money(*total))]);
    }
    format!("Monthly Spending\n{table}\n")
}

fn format_recent(report: &AggregateReport) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Date", "Description", "Category", "Amount"]);
    for record in &report.recent {
        table.add_row(vec![
            Cell::new(
                record
                    .date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
            ),
            Cell::new(&record.description),
            Cell::new(&record.category),
            Cell::new(money(record.amount)),
        ]);
    }
    format!("Recent Transactions\n{table}\n")
}
