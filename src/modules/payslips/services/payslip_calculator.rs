use std::sync::Arc;

use chrono::Utc;

use super::calculation_context::CalculationContext;
use super::component_evaluator::{ComponentEvaluator, ComponentInputs};
use super::statutory::StatutoryCalculator;
use super::totals::PayslipTotals;
use crate::config::PayrollConfig;
use crate::modules::attendance::AttendanceSummary;
use crate::modules::components::SalaryComponent;
use crate::modules::payslips::models::{CalculationDetails, Payslip};
use crate::modules::structures::EmployeeSalaryStructure;
use crate::modules::taxes::IncomeTaxCalculator;

/// Synchronous payslip computation: items, totals and audit details
///
/// No I/O happens here; the calculation service loads the inputs and
/// persists the result.
#[derive(Debug, Clone)]
pub struct PayslipCalculator {
    config: Arc<PayrollConfig>,
    tax: IncomeTaxCalculator,
}

impl PayslipCalculator {
    pub fn new(config: Arc<PayrollConfig>) -> Self {
        let tax = IncomeTaxCalculator::new(config.tax_brackets.clone());
        Self { config, tax }
    }

    pub fn config(&self) -> &PayrollConfig {
        &self.config
    }

    /// Replace the payslip's items, totals and details with a fresh run
    pub fn calculate(
        &self,
        payslip: &mut Payslip,
        components: &[SalaryComponent],
        assignment: &EmployeeSalaryStructure,
        attendance: &AttendanceSummary,
        inputs: &ComponentInputs,
    ) {
        let context = CalculationContext::new(assignment.basic_salary, attendance);

        let evaluation = ComponentEvaluator::new(&self.config)
            .with_assignment(assignment)
            .with_inputs(inputs)
            .evaluate(&payslip.id, components, context);

        let statutory = StatutoryCalculator::new(&self.tax, &self.config.overtime_component_code)
            .compute(&evaluation.items, components);
        let totals = PayslipTotals::aggregate(&evaluation.items, statutory, self.config.currency);

        payslip.apply_totals(&totals);
        payslip.calculation_details = Some(CalculationDetails::automated(
            Utc::now(),
            &evaluation.items,
            inputs.as_map().clone(),
        ));
        payslip.items = evaluation.items;
        payslip.updated_at = Some(Utc::now());
    }
}
