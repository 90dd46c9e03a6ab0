mod salary_component;

pub use salary_component::{CalculationMethod, ComponentKind, SalaryComponent};
