//! Terminal presentation of summaries and reports

pub mod report;
pub mod summary;
