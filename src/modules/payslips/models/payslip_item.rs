use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::modules::components::{ComponentKind, SalaryComponent};

/// One computed payslip line
///
/// Name, code and kind are copied from the component so the payslip stays
/// readable after the component is changed or retired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayslipItem {
    pub id: String,
    pub payslip_id: String,
    pub salary_component_id: String,
    pub component_name: String,
    pub component_code: String,
    pub component_kind: ComponentKind,
    pub base_amount: Decimal,
    /// Only set for percentage components
    pub rate: Option<Decimal>,
    pub calculated_amount: Decimal,
    pub calculation_notes: Option<String>,
    pub display_order: i32,
}

impl PayslipItem {
    pub fn for_component(
        payslip_id: &str,
        component: &SalaryComponent,
        base_amount: Decimal,
        rate: Option<Decimal>,
        calculated_amount: Decimal,
        notes: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            payslip_id: payslip_id.to_string(),
            salary_component_id: component.id.clone(),
            component_name: component.name.clone(),
            component_code: component.code.clone(),
            component_kind: component.kind,
            base_amount,
            rate,
            calculated_amount,
            calculation_notes: Some(notes),
            display_order: component.display_order,
        }
    }

    pub fn is_earning(&self) -> bool {
        self.component_kind == ComponentKind::Earning
    }

    pub fn is_deduction(&self) -> bool {
        self.component_kind == ComponentKind::Deduction
    }

    pub fn is_employer_contribution(&self) -> bool {
        self.component_kind == ComponentKind::EmployerContribution
    }
}
