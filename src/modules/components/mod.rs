pub mod models;
pub mod repositories;

pub use models::{CalculationMethod, ComponentKind, SalaryComponent};
pub use repositories::{MySqlSalaryComponentRepository, SalaryComponentRepository};
