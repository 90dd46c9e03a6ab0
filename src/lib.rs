//! Payslip calculation engine
//!
//! Turns salary structures, salary components and monthly attendance into
//! itemized payslips with gross/net totals, income tax and provident fund,
//! and drives the monthly batch that generates them.

pub mod config;
pub mod core;
pub mod modules;

// Re-export commonly used types
pub use modules::attendance;
pub use modules::components;
pub use modules::employees;
pub use modules::payslips;
pub use modules::structures;
pub use modules::taxes;
