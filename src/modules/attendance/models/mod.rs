mod attendance_summary;

pub use attendance_summary::AttendanceSummary;
pub(crate) use attendance_summary::month_bounds;
