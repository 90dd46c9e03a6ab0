pub mod models;
pub mod repositories;

pub use models::AttendanceSummary;
pub use repositories::{AttendanceRepository, MySqlAttendanceRepository};
