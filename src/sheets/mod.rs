mod client;
mod range;
mod transport;

pub use client::{RangeValues, SpreadsheetClient, USER_ENTERED};
pub use range::{column_range, row_range};
pub use transport::{HubTransport, SheetsTransport};
