pub mod catalog;
pub mod engine;
pub mod handlers;

pub use catalog::{Report, ReportParam};
pub use engine::{ReportEngine, ReportTable, ReportValue};
