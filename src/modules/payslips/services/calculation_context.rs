use rust_decimal::Decimal;
use serde::Serialize;

use crate::modules::attendance::AttendanceSummary;
use crate::modules::components::ComponentKind;

/// Numeric state of one payslip run
///
/// Built once from the salary assignment and attendance, then threaded by
/// value through the component fold. Each evaluated component returns the
/// advanced context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationContext {
    pub basic_salary: Decimal,
    pub adjusted_basic_salary: Decimal,
    pub gross_salary: Decimal,
    pub total_earnings: Decimal,
    pub total_deductions: Decimal,
    pub attendance_ratio: Decimal,
    pub days_present: Decimal,
    pub total_working_days: Decimal,
    pub overtime_hours: Decimal,
    pub regular_hours: Decimal,
    pub hourly_rate: Decimal,
    /// Earning lines recorded so far
    #[serde(skip)]
    pub earnings_recorded: usize,
}

/// Names accepted as `{placeholders}` in computed component formulas
pub const VARIABLES: [&str; 11] = [
    "basic_salary",
    "adjusted_basic_salary",
    "gross_salary",
    "total_earnings",
    "total_deductions",
    "attendance_ratio",
    "days_present",
    "total_working_days",
    "overtime_hours",
    "regular_hours",
    "hourly_rate",
];

impl CalculationContext {
    pub fn new(basic_salary: Decimal, attendance: &AttendanceSummary) -> Self {
        let attendance_ratio = attendance.attendance_ratio();
        let regular_hours = attendance.regular_hours;

        Self {
            basic_salary,
            adjusted_basic_salary: basic_salary.saturating_mul(attendance_ratio),
            gross_salary: Decimal::ZERO,
            total_earnings: Decimal::ZERO,
            total_deductions: Decimal::ZERO,
            attendance_ratio,
            days_present: Decimal::from(attendance.days_present),
            total_working_days: Decimal::from(attendance.total_working_days),
            overtime_hours: attendance.overtime_hours,
            regular_hours,
            hourly_rate: basic_salary / regular_hours.max(Decimal::ONE),
            earnings_recorded: 0,
        }
    }

    /// Value of a formula variable
    pub fn variable(&self, name: &str) -> Option<Decimal> {
        let value = match name {
            "basic_salary" => self.basic_salary,
            "adjusted_basic_salary" => self.adjusted_basic_salary,
            "gross_salary" => self.gross_salary,
            "total_earnings" => self.total_earnings,
            "total_deductions" => self.total_deductions,
            "attendance_ratio" => self.attendance_ratio,
            "days_present" => self.days_present,
            "total_working_days" => self.total_working_days,
            "overtime_hours" => self.overtime_hours,
            "regular_hours" => self.regular_hours,
            "hourly_rate" => self.hourly_rate,
            _ => return None,
        };
        Some(value)
    }

    /// Context after a line of `kind` worth `amount` has been recorded
    ///
    /// Employer contributions move neither accumulator. Gross always tracks
    /// total earnings. Accumulators saturate instead of overflowing.
    pub fn record(mut self, kind: ComponentKind, amount: Decimal) -> Self {
        match kind {
            ComponentKind::Earning => {
                self.total_earnings = self.total_earnings.saturating_add(amount);
                self.earnings_recorded += 1;
            }
            ComponentKind::Deduction => {
                self.total_deductions = self.total_deductions.saturating_add(amount)
            }
            ComponentKind::EmployerContribution => {}
        }
        self.gross_salary = self.total_earnings;
        self
    }
}
