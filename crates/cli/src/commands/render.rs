//! Plain-text rendering of the customer table.

use std::fmt::Write;

use little_sun_core::{CustomerRecord, PageSpec, SortSpec};
use little_sun_dashboard::components::{DataTableConfig, TableColumn};

/// Render `rows` as an aligned text table.
///
/// Only the configuration's default columns are shown. An empty page renders
/// the configured empty state.
#[must_use]
pub fn table(config: &DataTableConfig, rows: &[CustomerRecord], sort: &SortSpec) -> String {
    if rows.is_empty() {
        return format!("{}\n", config.empty_title);
    }

    let columns = config.default_columns();
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| columns.iter().map(|c| c.field.cell(row)).collect())
        .collect();
    let headers: Vec<String> = columns.iter().map(|c| header(c, sort)).collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            cells
                .iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or_default()
        })
        .collect();

    let mut out = String::new();
    push_line(&mut out, &headers, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, &rule, &widths);
    for row in &cells {
        push_line(&mut out, row, &widths);
    }
    out
}

/// Render the pager line, with the page number counted from one.
#[must_use]
pub fn pager(page: &PageSpec, page_count: usize, total: usize) -> String {
    format!(
        "Page {} of {} ({} records, {} per page)",
        page.index() + 1,
        page_count,
        total,
        page.size()
    )
}

fn header(column: &TableColumn, sort: &SortSpec) -> String {
    let marker = match sort.active() {
        Some(active) if active == column.field => match sort.direction {
            little_sun_core::SortDirection::Ascending => " ^",
            little_sun_core::SortDirection::Descending => " v",
            little_sun_core::SortDirection::None => "",
        },
        _ => "",
    };
    format!("{}{marker}", column.label)
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join(" | ");
    let _ = writeln!(out, "{}", line.trim_end());
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use little_sun_core::SortColumn;
    use little_sun_dashboard::components::customer_records_table_config;
    use rust_decimal::Decimal;

    use super::*;

    fn record(name: &str, total: i64) -> CustomerRecord {
        CustomerRecord {
            customer_name: name.to_string(),
            total: Decimal::from(total),
            ..CustomerRecord::default()
        }
    }

    #[test]
    fn test_empty_page_shows_empty_state() {
        let config = customer_records_table_config();
        assert_eq!(
            table(&config, &[], &SortSpec::UNSORTED),
            "No results found\n"
        );
    }

    #[test]
    fn test_rows_are_aligned() {
        let config = DataTableConfig::new("t")
            .column(TableColumn::sortable(SortColumn::CustomerName, "Customer"))
            .column(TableColumn::sortable(SortColumn::Total, "Total"));
        let rendered = table(
            &config,
            &[record("Lin", 5), record("Alexandra", 12)],
            &SortSpec::descending(SortColumn::Total),
        );

        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.first().unwrap(), &"Customer  | Total v");
        assert_eq!(lines.get(2).unwrap(), &"Lin       | 5");
        assert_eq!(lines.get(3).unwrap(), &"Alexandra | 12");
    }

    #[test]
    fn test_pager_counts_from_one() {
        let page = PageSpec::new(1, 10).unwrap();
        assert_eq!(pager(&page, 3, 25), "Page 2 of 3 (25 records, 10 per page)");
    }
}
