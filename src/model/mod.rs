//! Data model for tabular data representation

mod schema;
mod table;

pub use schema::Column;
pub use table::{CellValue, Dataset, Row};
