pub mod attendance;
pub mod components;
pub mod employees;
pub mod payslips;
pub mod structures;
pub mod taxes;
