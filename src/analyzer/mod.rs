pub mod aggregate;
pub mod channel;
pub mod filter;
pub mod reconcile;
pub mod reports;
pub mod temporal;

pub use filter::DateRange;
pub use reports::{build_report, ReportContext, ReportKind, ReportOutput};
