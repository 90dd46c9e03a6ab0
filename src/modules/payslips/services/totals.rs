use rust_decimal::Decimal;

use super::statutory::StatutoryFigures;
use crate::core::Currency;
use crate::modules::payslips::models::{Payslip, PayslipItem};

/// Aggregates written onto a payslip after its items are computed
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PayslipTotals {
    pub total_earnings: Decimal,
    pub total_deductions: Decimal,
    pub employer_contributions: Decimal,
    pub gross_salary: Decimal,
    pub net_salary: Decimal,
    pub taxable_income: Decimal,
    pub tax_deducted: Decimal,
    pub provident_fund: Decimal,
    pub overtime_amount: Decimal,
}

impl PayslipTotals {
    pub fn aggregate(items: &[PayslipItem], statutory: StatutoryFigures, currency: Currency) -> Self {
        let sum = |keep: fn(&PayslipItem) -> bool| -> Decimal {
            items
                .iter()
                .filter(|item| keep(item))
                .map(|item| item.calculated_amount)
                .sum()
        };

        let total_earnings = sum(PayslipItem::is_earning);
        let total_deductions = sum(PayslipItem::is_deduction);

        Self {
            total_earnings,
            total_deductions,
            employer_contributions: sum(PayslipItem::is_employer_contribution),
            gross_salary: total_earnings,
            net_salary: total_earnings - total_deductions,
            taxable_income: currency.round(statutory.taxable_income),
            tax_deducted: currency.round(statutory.tax_deducted),
            provident_fund: currency.round(statutory.provident_fund),
            overtime_amount: currency.round(statutory.overtime_amount),
        }
    }
}

impl Payslip {
    pub fn apply_totals(&mut self, totals: &PayslipTotals) {
        self.total_earnings = totals.total_earnings;
        self.total_deductions = totals.total_deductions;
        self.employer_contributions = totals.employer_contributions;
        self.gross_salary = totals.gross_salary;
        self.net_salary = totals.net_salary;
        self.taxable_income = totals.taxable_income;
        self.tax_deducted = totals.tax_deducted;
        self.provident_fund = totals.provident_fund;
        self.overtime_amount = totals.overtime_amount;
    }
}
