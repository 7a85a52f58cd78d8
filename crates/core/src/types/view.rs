//! View parameters for the customer table: sort order and pagination.

use std::cmp::Ordering;
use std::num::NonZeroUsize;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::record::{CustomerRecord, SortColumn};

/// Direction of a table sort.
///
/// `None` keeps the input order unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
    #[default]
    None,
}

impl SortDirection {
    /// Short form used in the UI (`asc`, `desc`, or empty).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
            Self::None => "",
        }
    }
}

/// Error returned when parsing an unknown sort direction.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown sort direction: {0} (expected asc, desc or none)")]
pub struct ParseSortDirectionError(pub String);

impl FromStr for SortDirection {
    type Err = ParseSortDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            "" | "none" => Ok(Self::None),
            _ => Err(ParseSortDirectionError(s.to_string())),
        }
    }
}

/// Which column to sort by, and in which direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Active column, or `None` when the table is unsorted.
    pub column: Option<SortColumn>,
    pub direction: SortDirection,
}

impl SortSpec {
    /// A spec that leaves rows in their input order.
    pub const UNSORTED: Self = Self {
        column: None,
        direction: SortDirection::None,
    };

    /// Sort by `column` ascending.
    #[must_use]
    pub const fn ascending(column: SortColumn) -> Self {
        Self {
            column: Some(column),
            direction: SortDirection::Ascending,
        }
    }

    /// Sort by `column` descending.
    #[must_use]
    pub const fn descending(column: SortColumn) -> Self {
        Self {
            column: Some(column),
            direction: SortDirection::Descending,
        }
    }

    /// The column to sort by, if sorting applies at all.
    #[must_use]
    pub const fn active(&self) -> Option<SortColumn> {
        match (self.column, self.direction) {
            (Some(column), SortDirection::Ascending | SortDirection::Descending) => Some(column),
            _ => None,
        }
    }

    /// Compare two records under this spec.
    ///
    /// Descending reverses the comparison; an inactive spec treats all rows
    /// as equal so a stable sort keeps input order.
    #[must_use]
    pub fn compare(&self, a: &CustomerRecord, b: &CustomerRecord) -> Ordering {
        let Some(column) = self.active() else {
            return Ordering::Equal;
        };
        let natural = column.compare(a, b);
        match self.direction {
            SortDirection::Descending => natural.reverse(),
            _ => natural,
        }
    }
}

/// Error returned when constructing an invalid [`PageSpec`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PageSpecError {
    #[error("page size must be positive")]
    ZeroPageSize,
}

/// Zero-based page index and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSpec {
    index: usize,
    size: NonZeroUsize,
}

impl PageSpec {
    /// Default number of rows per page.
    pub const DEFAULT_SIZE: NonZeroUsize = NonZeroUsize::MIN.saturating_add(9);

    /// Create a page spec.
    ///
    /// # Errors
    ///
    /// Returns [`PageSpecError::ZeroPageSize`] if `size` is zero.
    pub fn new(index: usize, size: usize) -> Result<Self, PageSpecError> {
        let size = NonZeroUsize::new(size).ok_or(PageSpecError::ZeroPageSize)?;
        Ok(Self { index, size })
    }

    /// First page with the given size.
    #[must_use]
    pub const fn first(size: NonZeroUsize) -> Self {
        Self { index: 0, size }
    }

    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub const fn size(&self) -> usize {
        self.size.get()
    }

    /// Offset of the first row on this page.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.index.saturating_mul(self.size.get())
    }

    /// Same page size, different index.
    #[must_use]
    pub const fn with_index(self, index: usize) -> Self {
        Self { index, ..self }
    }

    /// Number of pages needed for `total` rows (at least one).
    #[must_use]
    pub const fn page_count(&self, total: usize) -> usize {
        let pages = total.div_ceil(self.size.get());
        if pages == 0 { 1 } else { pages }
    }
}

impl Default for PageSpec {
    fn default() -> Self {
        Self::first(Self::DEFAULT_SIZE)
    }
}
