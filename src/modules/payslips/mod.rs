// Payslips module

pub mod models;
pub mod repositories;
pub mod services;

pub use models::{CalculationDetails, Payslip, PayslipItem, PayslipNumbering, PayslipStatus};
pub use repositories::{MySqlPayslipRepository, PayslipRepository};
pub use services::{
    ComponentInputs, GenerationRequest, GenerationSummary, PayrollRepositories,
    PayslipCalculationService, PayslipCalculator, PayslipGenerationJob, PayslipService,
};
