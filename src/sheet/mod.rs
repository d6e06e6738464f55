//! Spreadsheet abstractions shared by the workbook reader and writer.

// Submodule declarations
pub mod date;
pub mod types;

// Re-exports for convenience
pub use date::{date_to_serial, datetime_to_serial, serial_to_date, serial_to_datetime};
pub use types::CellValue;
