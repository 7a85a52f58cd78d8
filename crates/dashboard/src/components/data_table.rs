//! Data table component types.
//!
//! These types define the configuration of the customer records table.

use little_sun_core::SortColumn;
use serde::{Deserialize, Serialize};

use crate::services::NO_RESULTS_MESSAGE;

/// Column definition for a data table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumn {
    /// Record field shown in the column.
    pub field: SortColumn,
    /// Display label for the column header.
    pub label: String,
    /// Whether the column is sortable.
    pub sortable: bool,
    /// Whether the column is visible by default.
    pub default_visible: bool,
}

impl TableColumn {
    /// Create a new sortable column.
    #[must_use]
    pub fn sortable(field: SortColumn, label: &str) -> Self {
        Self {
            field,
            label: label.to_string(),
            sortable: true,
            default_visible: true,
        }
    }

    /// Create a new non-sortable column.
    #[must_use]
    pub fn new(field: SortColumn, label: &str) -> Self {
        Self {
            sortable: false,
            ..Self::sortable(field, label)
        }
    }

    /// Set whether the column is visible by default.
    #[must_use]
    pub const fn visible(mut self, visible: bool) -> Self {
        self.default_visible = visible;
        self
    }

    /// Column key, the camelCase record field name.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        self.field.key()
    }
}

/// Configuration for a data table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataTableConfig {
    /// Unique table identifier.
    pub table_id: String,
    /// Column definitions, in display order.
    pub columns: Vec<TableColumn>,
    /// Page sizes offered to the user.
    pub page_size_options: Vec<usize>,
    /// Search placeholder text.
    pub search_placeholder: String,
    /// Title for empty state.
    pub empty_title: String,
    /// Description for empty state.
    pub empty_description: Option<String>,
}

impl DataTableConfig {
    /// Create a new data table configuration.
    #[must_use]
    pub fn new(table_id: &str) -> Self {
        Self {
            table_id: table_id.to_string(),
            columns: vec![],
            page_size_options: vec![10],
            search_placeholder: "Search...".to_string(),
            empty_title: "No items found".to_string(),
            empty_description: None,
        }
    }

    /// Add a column.
    #[must_use]
    pub fn column(mut self, column: TableColumn) -> Self {
        self.columns.push(column);
        self
    }

    /// Set the page sizes offered to the user.
    #[must_use]
    pub fn page_sizes(mut self, sizes: &[usize]) -> Self {
        self.page_size_options = sizes.iter().copied().filter(|s| *s > 0).collect();
        self
    }

    /// Set search placeholder.
    #[must_use]
    pub fn search_placeholder(mut self, placeholder: &str) -> Self {
        self.search_placeholder = placeholder.to_string();
        self
    }

    /// Set empty state configuration.
    #[must_use]
    pub fn empty_state(mut self, title: &str, description: Option<&str>) -> Self {
        self.empty_title = title.to_string();
        self.empty_description = description.map(ToString::to_string);
        self
    }

    /// Get default visible columns.
    #[must_use]
    pub fn default_columns(&self) -> Vec<&TableColumn> {
        self.columns.iter().filter(|c| c.default_visible).collect()
    }

    /// Look up a column by key.
    #[must_use]
    pub fn column_by_key(&self, key: &str) -> Option<&TableColumn> {
        self.columns.iter().find(|c| c.key() == key)
    }
}

/// Build the customer records table configuration.
#[must_use]
pub fn customer_records_table_config() -> DataTableConfig {
    DataTableConfig::new("customer-records")
        .column(TableColumn::sortable(SortColumn::Date, "Date"))
        .column(TableColumn::sortable(SortColumn::CustomerName, "Customer"))
        .column(TableColumn::sortable(SortColumn::Birthday, "Birthday"))
        .column(TableColumn::sortable(SortColumn::SerialNumber, "Serial No."))
        .column(TableColumn::sortable(SortColumn::Name, "Name"))
        .column(TableColumn::sortable(SortColumn::ServiceItem1, "Service 1"))
        .column(TableColumn::sortable(SortColumn::ServiceItem2, "Service 2"))
        .column(TableColumn::sortable(SortColumn::ExtraItem1, "Extra 1"))
        .column(TableColumn::sortable(SortColumn::ExtraItem2, "Extra 2"))
        .column(TableColumn::new(SortColumn::Note, "Note"))
        .column(TableColumn::sortable(SortColumn::Total, "Total"))
        .column(TableColumn::sortable(SortColumn::Retail, "Retail").visible(false))
        .column(TableColumn::sortable(SortColumn::Revenue, "Revenue"))
        .column(TableColumn::sortable(SortColumn::DailyRetail, "Daily Retail").visible(false))
        .column(TableColumn::new(SortColumn::FormulaNote, "Formula Note").visible(false))
        .page_sizes(&[5, 10, 20])
        .search_placeholder("Search by customer name...")
        .empty_state(NO_RESULTS_MESSAGE, Some("Try another customer name"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_columns_in_display_order() {
        let config = customer_records_table_config();
        let keys: Vec<&str> = config.columns.iter().map(TableColumn::key).collect();
        assert_eq!(
            keys,
            [
                "date",
                "customerName",
                "birthday",
                "serialNumber",
                "name",
                "serviceItem1",
                "serviceItem2",
                "extraItem1",
                "extraItem2",
                "note",
                "total",
                "retail",
                "revenue",
                "dailyRetail",
                "formulaNote",
            ]
        );
        assert_eq!(config.columns.len(), SortColumn::ALL.len());
    }

    #[test]
    fn test_customer_paging_and_empty_state() {
        let config = customer_records_table_config();
        assert_eq!(config.page_size_options, vec![5, 10, 20]);
        assert_eq!(config.empty_title, "No results found");
    }

    #[test]
    fn test_default_columns_hide_unsupplied_fields() {
        let config = customer_records_table_config();
        let visible: Vec<&str> = config.default_columns().iter().map(|c| c.key()).collect();
        assert!(visible.contains(&"total"));
        assert!(!visible.contains(&"retail"));
        assert!(!visible.contains(&"dailyRetail"));
    }

    #[test]
    fn test_column_by_key() {
        let config = customer_records_table_config();
        assert!(config.column_by_key("revenue").unwrap().sortable);
        assert!(config.column_by_key("unknown").is_none());
    }

    #[test]
    fn test_page_sizes_drop_zero() {
        let config = DataTableConfig::new("t").page_sizes(&[0, 5]);
        assert_eq!(config.page_size_options, vec![5]);
    }
}
