pub mod models;
pub mod repositories;

pub use models::{EmployeeSalaryStructure, PayPeriod, SalaryStructure, StructureEntry};
pub use repositories::{MySqlSalaryStructureRepository, SalaryStructureRepository};
