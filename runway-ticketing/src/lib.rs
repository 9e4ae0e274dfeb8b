pub mod allocation;
pub mod ledger;
pub mod report;

pub use allocation::{draw_price, draw_seat, PRICE_RANGE, SEAT_LETTERS};
pub use ledger::TicketLedger;
pub use report::{ReportInterval, SalesReport, SalesRow};
