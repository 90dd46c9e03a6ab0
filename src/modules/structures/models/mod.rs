mod employee_salary_structure;
mod salary_structure;

pub use employee_salary_structure::EmployeeSalaryStructure;
pub use salary_structure::{PayPeriod, SalaryStructure, StructureEntry};
