pub mod income_job;
pub mod selection_cycle_job;
pub mod status_job;

pub use income_job::{parse_income_member, IncomeAggregationJob};
pub use selection_cycle_job::SelectionCycleJob;
pub use status_job::{StatusReport, StatusReportJob};
