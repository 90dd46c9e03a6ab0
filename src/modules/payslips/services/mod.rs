pub mod calculation_context;
pub mod component_evaluator;
pub mod formula;
pub mod generation_job;
pub mod payslip_calculation_service;
pub mod payslip_calculator;
pub mod payslip_service;
pub mod statutory;
pub mod totals;

pub use calculation_context::CalculationContext;
pub use component_evaluator::{ComponentEvaluator, ComponentInputs, Evaluation};
pub use formula::FormulaError;
pub use generation_job::{
    GenerationFailure, GenerationRequest, GenerationSummary, PayslipGenerationJob,
};
pub use payslip_calculation_service::{PayrollRepositories, PayslipCalculationService};
pub use payslip_calculator::PayslipCalculator;
pub use payslip_service::PayslipService;
pub use statutory::{StatutoryCalculator, StatutoryFigures, PROVIDENT_FUND_RATE};
pub use totals::PayslipTotals;
