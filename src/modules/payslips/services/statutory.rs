use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::modules::components::SalaryComponent;
use crate::modules::payslips::models::PayslipItem;
use crate::modules::taxes::IncomeTaxCalculator;

/// Employee provident-fund contribution: 12% of PF-applicable earnings
pub const PROVIDENT_FUND_RATE: Decimal = Decimal::from_parts(12, 0, 0, false, 2);

/// Statutory figures derived from a payslip's items (unrounded)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StatutoryFigures {
    pub taxable_income: Decimal,
    pub tax_deducted: Decimal,
    pub provident_fund: Decimal,
    pub overtime_amount: Decimal,
}

pub struct StatutoryCalculator<'a> {
    tax: &'a IncomeTaxCalculator,
    overtime_code: &'a str,
}

impl<'a> StatutoryCalculator<'a> {
    pub fn new(tax: &'a IncomeTaxCalculator, overtime_code: &'a str) -> Self {
        Self { tax, overtime_code }
    }

    pub fn compute(&self, items: &[PayslipItem], components: &[SalaryComponent]) -> StatutoryFigures {
        let by_id: HashMap<&str, &SalaryComponent> =
            components.iter().map(|c| (c.id.as_str(), c)).collect();

        let taxable_income = earnings_where(items, &by_id, |c| c.is_taxable);
        let pf_base = earnings_where(items, &by_id, |c| c.is_provident_fund_applicable);

        StatutoryFigures {
            taxable_income,
            tax_deducted: self.tax.monthly_tax(taxable_income),
            provident_fund: pf_base * PROVIDENT_FUND_RATE,
            overtime_amount: self.overtime_amount(items),
        }
    }

    /// Amount of the overtime line, 0 without one
    pub fn overtime_amount(&self, items: &[PayslipItem]) -> Decimal {
        items
            .iter()
            .filter(|item| item.component_code == self.overtime_code)
            .map(|item| item.calculated_amount)
            .sum()
    }
}

fn earnings_where(
    items: &[PayslipItem],
    components: &HashMap<&str, &SalaryComponent>,
    predicate: impl Fn(&SalaryComponent) -> bool,
) -> Decimal {
    items
        .iter()
        .filter(|item| item.is_earning())
        .filter(|item| {
            components
                .get(item.salary_component_id.as_str())
                .is_some_and(|c| predicate(c))
        })
        .map(|item| item.calculated_amount)
        .sum()
}
