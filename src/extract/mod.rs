pub mod fields;
pub mod table;

pub use fields::{extract_labeled_fields, pair_labels, project_name, LabeledFields};
pub use table::{extract_trader_rows, parse_rows, wait_for_table};
