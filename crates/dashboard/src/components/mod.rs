//! View components.
//!
//! - `data_table` - column and paging configuration of the customer table
//! - `table_view` - tabular view pipeline producing the visible rows
//! - `profile` - profile display adapter mirroring persisted login state

pub mod data_table;
pub mod profile;
pub mod table_view;

pub use data_table::{DataTableConfig, TableColumn, customer_records_table_config};
pub use profile::ProfileAdapter;
pub use table_view::TableView;
