pub mod payslip_repository;

pub use payslip_repository::{MySqlPayslipRepository, PayslipRepository};
