//! Statistics reports. Both renderers are pure functions of
//! [`IncidentStats`](crate::stats::IncidentStats).

pub mod console;
pub mod html;

/// Default length of the province ranking in the console report.
pub const DEFAULT_TOP_N: usize = 10;
