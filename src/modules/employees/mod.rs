pub mod models;
pub mod repositories;

pub use models::Employee;
pub use repositories::{EmployeeRepository, MySqlEmployeeRepository};
