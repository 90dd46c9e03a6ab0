pub mod component_repository;

pub use component_repository::{MySqlSalaryComponentRepository, SalaryComponentRepository};
