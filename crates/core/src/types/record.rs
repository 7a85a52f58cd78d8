//! Customer records as shown in the dashboard table.
//!
//! A record is one row of the backend spreadsheet. Rows arrive as positional
//! JSON arrays whose cells may be strings or numbers; [`CustomerRecord::from_sheet_row`]
//! maps them into typed fields.

use std::cmp::Ordering;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row of customer business data.
///
/// No identity constraint applies: duplicate rows are legitimate and kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    pub date: String,
    pub customer_name: String,
    pub birthday: String,
    pub serial_number: String,
    pub name: String,
    pub service_item1: String,
    pub service_item2: String,
    pub extra_item1: String,
    pub extra_item2: String,
    pub note: String,
    pub total: Decimal,
    pub retail: Decimal,
    pub revenue: Decimal,
    pub daily_retail: Decimal,
    pub formula_note: String,
}

impl CustomerRecord {
    /// Map a positional spreadsheet row into a record.
    ///
    /// Positions 0-11 are, in order: date, customer name, birthday, serial
    /// number, name, service item 1, service item 2, extra item 1, extra item 2,
    /// note, total, revenue. Missing cells default to `""` or zero. `retail`,
    /// `daily_retail` and `formula_note` are not supplied by the backend.
    #[must_use]
    pub fn from_sheet_row(row: &[Value]) -> Self {
        let text = |i: usize| coerce_text(row.get(i));
        let amount = |i: usize| coerce_amount(row.get(i));

        Self {
            date: text(0),
            customer_name: text(1),
            birthday: text(2),
            serial_number: text(3),
            name: text(4),
            service_item1: text(5),
            service_item2: text(6),
            extra_item1: text(7),
            extra_item2: text(8),
            note: text(9),
            total: amount(10),
            retail: Decimal::ZERO,
            revenue: amount(11),
            daily_retail: Decimal::ZERO,
            formula_note: String::new(),
        }
    }
}

/// Coerce a spreadsheet cell into text.
///
/// Strings are kept as-is and numbers use their JSON rendering. Anything else,
/// including an absent cell, becomes the empty string.
#[must_use]
pub fn coerce_text(cell: Option<&Value>) -> String {
    match cell {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Coerce a spreadsheet cell into an amount.
///
/// Accepts JSON numbers and numeric strings (surrounding whitespace and `,`
/// grouping separators are ignored, scientific notation is allowed).
/// Absent or non-numeric cells yield zero.
#[must_use]
pub fn coerce_amount(cell: Option<&Value>) -> Decimal {
    let parsed = match cell {
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Decimal::from)
            .or_else(|| n.as_f64().and_then(|f| Decimal::try_from(f).ok())),
        Some(Value::String(s)) => parse_amount(s),
        _ => None,
    };
    parsed.unwrap_or(Decimal::ZERO)
}

fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}

/// A column of [`CustomerRecord`] the table can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortColumn {
    Date,
    CustomerName,
    Birthday,
    SerialNumber,
    Name,
    ServiceItem1,
    ServiceItem2,
    ExtraItem1,
    ExtraItem2,
    Note,
    Total,
    Retail,
    Revenue,
    DailyRetail,
    FormulaNote,
}

impl SortColumn {
    /// Every sortable column, in table display order.
    pub const ALL: [Self; 15] = [
        Self::Date,
        Self::CustomerName,
        Self::Birthday,
        Self::SerialNumber,
        Self::Name,
        Self::ServiceItem1,
        Self::ServiceItem2,
        Self::ExtraItem1,
        Self::ExtraItem2,
        Self::Note,
        Self::Total,
        Self::Retail,
        Self::Revenue,
        Self::DailyRetail,
        Self::FormulaNote,
    ];

    /// The column key as used by the front-end (camelCase field name).
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::CustomerName => "customerName",
            Self::Birthday => "birthday",
            Self::SerialNumber => "serialNumber",
            Self::Name => "name",
            Self::ServiceItem1 => "serviceItem1",
            Self::ServiceItem2 => "serviceItem2",
            Self::ExtraItem1 => "extraItem1",
            Self::ExtraItem2 => "extraItem2",
            Self::Note => "note",
            Self::Total => "total",
            Self::Retail => "retail",
            Self::Revenue => "revenue",
            Self::DailyRetail => "dailyRetail",
            Self::FormulaNote => "formulaNote",
        }
    }

    /// Whether the column holds an amount rather than text.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Total | Self::Retail | Self::Revenue | Self::DailyRetail
        )
    }

    /// Compare two records by this column in natural (ascending) order.
    ///
    /// Text compares lexicographically, amounts numerically.
    #[must_use]
    pub fn compare(self, a: &CustomerRecord, b: &CustomerRecord) -> Ordering {
        match self {
            Self::Date => a.date.cmp(&b.date),
            Self::CustomerName => a.customer_name.cmp(&b.customer_name),
            Self::Birthday => a.birthday.cmp(&b.birthday),
            Self::SerialNumber => a.serial_number.cmp(&b.serial_number),
            Self::Name => a.name.cmp(&b.name),
            Self::ServiceItem1 => a.service_item1.cmp(&b.service_item1),
            Self::ServiceItem2 => a.service_item2.cmp(&b.service_item2),
            Self::ExtraItem1 => a.extra_item1.cmp(&b.extra_item1),
            Self::ExtraItem2 => a.extra_item2.cmp(&b.extra_item2),
            Self::Note => a.note.cmp(&b.note),
            Self::Total => a.total.cmp(&b.total),
            Self::Retail => a.retail.cmp(&b.retail),
            Self::Revenue => a.revenue.cmp(&b.revenue),
            Self::DailyRetail => a.daily_retail.cmp(&b.daily_retail),
            Self::FormulaNote => a.formula_note.cmp(&b.formula_note),
        }
    }

    /// Render this column's cell of `record` for display.
    #[must_use]
    pub fn cell(self, record: &CustomerRecord) -> String {
        match self {
            Self::Date => record.date.clone(),
            Self::CustomerName => record.customer_name.clone(),
            Self::Birthday => record.birthday.clone(),
            Self::SerialNumber => record.serial_number.clone(),
            Self::Name => record.name.clone(),
            Self::ServiceItem1 => record.service_item1.clone(),
            Self::ServiceItem2 => record.service_item2.clone(),
            Self::ExtraItem1 => record.extra_item1.clone(),
            Self::ExtraItem2 => record.extra_item2.clone(),
            Self::Note => record.note.clone(),
            Self::Total => record.total.normalize().to_string(),
            Self::Retail => record.retail.normalize().to_string(),
            Self::Revenue => record.revenue.normalize().to_string(),
            Self::DailyRetail => record.daily_retail.normalize().to_string(),
            Self::FormulaNote => record.formula_note.clone(),
        }
    }
}

/// Error returned when a column key is not a sortable column.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown column: {0}")]
pub struct ParseSortColumnError(pub String);

impl FromStr for SortColumn {
    type Err = ParseSortColumnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.key() == s)
            .ok_or_else(|| ParseSortColumnError(s.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_from_sheet_row_full() {
        let row = vec![
            json!("2025/01/02"),
            json!("Lin"),
            json!("1990/05/06"),
            json!("A-001"),
            json!("Chen"),
            json!("Facial"),
            json!("Massage"),
            json!("Mask"),
            json!(""),
            json!("VIP"),
            json!("1,200"),
            json!(350.5),
        ];

        let record = CustomerRecord::from_sheet_row(&row);
        assert_eq!(record.date, "2025/01/02");
        assert_eq!(record.customer_name, "Lin");
        assert_eq!(record.serial_number, "A-001");
        assert_eq!(record.note, "VIP");
        assert_eq!(record.total, dec("1200"));
        assert_eq!(record.revenue, dec("350.5"));
        assert_eq!(record.retail, Decimal::ZERO);
        assert_eq!(record.daily_retail, Decimal::ZERO);
        assert_eq!(record.formula_note, "");
    }

    #[test]
    fn test_from_sheet_row_short_row_defaults() {
        let record = CustomerRecord::from_sheet_row(&[json!("2025/01/02"), json!("Lin")]);
        assert_eq!(record.customer_name, "Lin");
        assert_eq!(record.birthday, "");
        assert_eq!(record.note, "");
        assert_eq!(record.total, Decimal::ZERO);
        assert_eq!(record.revenue, Decimal::ZERO);
    }

    #[test]
    fn test_coerce_amount_non_numeric_is_zero() {
        assert_eq!(coerce_amount(None), Decimal::ZERO);
        assert_eq!(coerce_amount(Some(&json!(""))), Decimal::ZERO);
        assert_eq!(coerce_amount(Some(&json!("n/a"))), Decimal::ZERO);
        assert_eq!(coerce_amount(Some(&json!(null))), Decimal::ZERO);
        assert_eq!(coerce_amount(Some(&json!(true))), Decimal::ZERO);
        assert_eq!(coerce_amount(Some(&json!([1]))), Decimal::ZERO);
    }

    #[test]
    fn test_coerce_amount_numeric_forms() {
        assert_eq!(coerce_amount(Some(&json!(42))), dec("42"));
        assert_eq!(coerce_amount(Some(&json!(" 12.5 "))), dec("12.5"));
        assert_eq!(coerce_amount(Some(&json!("-3"))), dec("-3"));
        assert_eq!(coerce_amount(Some(&json!("1e3"))), dec("1000"));
    }

    #[test]
    fn test_coerce_text_forms() {
        assert_eq!(coerce_text(Some(&json!("x"))), "x");
        assert_eq!(coerce_text(Some(&json!(7))), "7");
        assert_eq!(coerce_text(Some(&json!(null))), "");
        assert_eq!(coerce_text(None), "");
    }

    #[test]
    fn test_sort_column_keys_roundtrip() {
        for column in SortColumn::ALL {
            assert_eq!(column.key().parse::<SortColumn>().unwrap(), column);
        }
        assert!("number".parse::<SortColumn>().is_err());
    }

    #[test]
    fn test_compare_numeric_vs_text() {
        let a = CustomerRecord {
            total: dec("9"),
            name: "9".to_string(),
            ..CustomerRecord::default()
        };
        let b = CustomerRecord {
            total: dec("10"),
            name: "10".to_string(),
            ..CustomerRecord::default()
        };
        assert_eq!(SortColumn::Total.compare(&a, &b), Ordering::Less);
        // Lexicographic: "9" > "10"
        assert_eq!(SortColumn::Name.compare(&a, &b), Ordering::Greater);
    }

    #[test]
    fn test_serializes_camel_case() {
        let value = serde_json::to_value(CustomerRecord::default()).unwrap();
        assert!(value.get("customerName").is_some());
        assert!(value.get("dailyRetail").is_some());
    }
}
