//! Integration tests for payslip calculation
//!
//! Drives `PayslipCalculationService` end to end over in-memory repositories
//! with the reference component set (see `helpers::test_data`).

#[path = "../helpers/mod.rs"]
mod helpers;

use helpers::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use payslip_engine::attendance::AttendanceRepository;
use payslip_engine::components::ComponentKind;
use payslip_engine::core::AppError;
use payslip_engine::employees::Employee;
use payslip_engine::payslips::models::AUTOMATED_METHOD;
use payslip_engine::payslips::{
    ComponentInputs, Payslip, PayslipCalculationService, PayslipRepository, PayslipStatus,
};

async fn setup() -> (InMemoryPayroll, PayslipCalculationService, Employee) {
    let payroll = InMemoryPayroll::new();
    payroll.seed_standard_components().await;
    let employee = payroll.seed_employee(101, "Asha Rao", dec!(50000)).await;
    let service = PayslipCalculationService::new(payroll.repositories(), TestDataFactory::config());
    (payroll, service, employee)
}

fn amount_of(payslip: &Payslip, code: &str) -> Decimal {
    payslip
        .items
        .iter()
        .find(|item| item.component_code == code)
        .map(|item| item.calculated_amount)
        .unwrap_or_else(|| panic!("no item for {}", code))
}

#[tokio::test]
async fn test_full_attendance_payslip() {
    let (_payroll, service, employee) = setup().await;

    let payslip = service.calculate_payslip(&employee, 2025, 3).await.unwrap();

    assert_eq!(payslip.status, PayslipStatus::Draft);
    assert_eq!(payslip.payslip_number, "PS-000001");
    assert_eq!(payslip.items.len(), 7);

    assert_eq!(amount_of(&payslip, "BASIC"), dec!(50000));
    assert_eq!(amount_of(&payslip, "HRA"), dec!(20000));
    assert_eq!(amount_of(&payslip, "TA"), dec!(1600));
    assert_eq!(amount_of(&payslip, "OT"), Decimal::ZERO);
    assert_eq!(amount_of(&payslip, "PF"), dec!(8592));
    assert_eq!(amount_of(&payslip, "PT"), dec!(200));
    assert_eq!(amount_of(&payslip, "EPF"), dec!(6000));

    assert_eq!(payslip.total_earnings, dec!(71600));
    assert_eq!(payslip.total_deductions, dec!(8792));
    assert_eq!(payslip.gross_salary, dec!(71600));
    assert_eq!(payslip.net_salary, dec!(62808));
    assert_eq!(payslip.employer_contributions, dec!(6000));

    // Annual 840000: 250000 x 5% + 340000 x 20% = 80500, / 12
    assert_eq!(payslip.taxable_income, dec!(70000));
    assert_eq!(payslip.tax_deducted, dec!(6708.33));
    assert_eq!(payslip.provident_fund, dec!(6000));
    assert_eq!(payslip.overtime_amount, Decimal::ZERO);
}

#[tokio::test]
async fn test_default_attendance_created_when_missing() {
    let (payroll, service, employee) = setup().await;

    let payslip = service.calculate_payslip(&employee, 2025, 3).await.unwrap();

    assert_eq!(payslip.total_working_days, 22);
    assert_eq!(payslip.days_present, 22);
    assert_eq!(payslip.days_absent, 0);

    let stored = payroll.attendance.find(employee.id, 2025, 3).await.unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn test_partial_attendance_and_overtime() {
    let (payroll, service, employee) = setup().await;
    payroll
        .seed_attendance(TestDataFactory::attendance(employee.id, 2025, 4, 11, dec!(10)))
        .await;

    let payslip = service.calculate_payslip(&employee, 2025, 4).await.unwrap();

    // Percentage earnings are based on the adjusted basic and then pro-rated
    assert_eq!(amount_of(&payslip, "BASIC"), dec!(12500));
    assert_eq!(amount_of(&payslip, "HRA"), dec!(5000));
    assert_eq!(amount_of(&payslip, "TA"), dec!(800));
    // 50000 / 176 h x 10 h x 1.5
    assert_eq!(amount_of(&payslip, "OT"), dec!(4261.36));
    assert_eq!(payslip.overtime_amount, dec!(4261.36));
    assert_eq!(payslip.overtime_hours, dec!(10));
    assert_eq!(payslip.days_absent, 11);

    assert_eq!(payslip.total_earnings, dec!(22561.36));
    assert_eq!(amount_of(&payslip, "PF"), dec!(2707.36));
    assert_eq!(payslip.net_salary, payslip.total_earnings - payslip.total_deductions);
}

#[tokio::test]
async fn test_recalculation_is_idempotent() {
    let (payroll, service, employee) = setup().await;

    let first = service.calculate_payslip(&employee, 2025, 3).await.unwrap();
    let second = service.calculate_payslip(&employee, 2025, 3).await.unwrap();

    assert_eq!(payroll.payslips.count(), 1);
    assert_eq!(first.id, second.id);
    assert_eq!(first.payslip_number, second.payslip_number);
    assert_eq!(first.net_salary, second.net_salary);
    assert_eq!(first.tax_deducted, second.tax_deducted);

    let strip = |p: &Payslip| -> Vec<(String, Decimal, Decimal)> {
        p.items
            .iter()
            .map(|i| (i.component_code.clone(), i.base_amount, i.calculated_amount))
            .collect()
    };
    assert_eq!(strip(&first), strip(&second));
}

#[tokio::test]
async fn test_numbers_are_sequential_per_new_payslip() {
    let (payroll, service, employee) = setup().await;
    let other = payroll.seed_employee(102, "Vikram Shah", dec!(30000)).await;

    let a = service.calculate_payslip(&employee, 2025, 3).await.unwrap();
    let b = service.calculate_payslip(&other, 2025, 3).await.unwrap();
    let c = service.calculate_payslip(&employee, 2025, 4).await.unwrap();

    assert_eq!(a.payslip_number, "PS-000001");
    assert_eq!(b.payslip_number, "PS-000002");
    assert_eq!(c.payslip_number, "PS-000003");
}

#[tokio::test]
async fn test_missing_structure_is_not_found() {
    let (_payroll, service, _employee) = setup().await;
    let stranger = Employee::new(999, "No Structure", COMPANY_ID);

    let result = service.calculate_payslip(&stranger, 2025, 3).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_structure_not_yet_effective_is_not_found() {
    let (_payroll, service, employee) = setup().await;

    // Assignment starts 2024-01-01
    let result = service.calculate_payslip(&employee, 2023, 12).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_invalid_month_rejected() {
    let (_payroll, service, employee) = setup().await;

    let result = service.calculate_payslip(&employee, 2025, 13).await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_non_draft_payslip_is_not_recalculated() {
    let (payroll, service, employee) = setup().await;
    let mut payslip = service.calculate_payslip(&employee, 2025, 3).await.unwrap();

    payslip.process(7).unwrap();
    payroll.payslips.update_status(&payslip).await.unwrap();

    let again = service.calculate_payslip(&employee, 2025, 3).await;
    assert!(matches!(again, Err(AppError::Validation(_))));

    let recalc = service.recalculate_payslip(&payslip).await;
    assert!(matches!(recalc, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_manual_amounts_survive_recalculation() {
    let payroll = InMemoryPayroll::new();
    payroll.seed_standard_components().await;
    payroll
        .seed_components(vec![TestDataFactory::variable("BONUS", ComponentKind::Earning, 5)])
        .await;
    let employee = payroll.seed_employee(101, "Asha Rao", dec!(50000)).await;
    let service = PayslipCalculationService::new(payroll.repositories(), TestDataFactory::config());

    let inputs = ComponentInputs::new().with("BONUS", dec!(5000));
    let first = service
        .calculate_payslip_with_inputs(&employee, 2025, 3, &inputs)
        .await
        .unwrap();
    assert_eq!(amount_of(&first, "BONUS"), dec!(5000));

    let details = first.calculation_details.as_ref().unwrap();
    assert_eq!(details.calculation_method, AUTOMATED_METHOD);
    assert_eq!(details.items_breakdown.len(), first.items.len());
    assert_eq!(details.manual_amounts.get("BONUS"), Some(&dec!(5000)));

    let recalculated = service.recalculate_payslip(&first).await.unwrap();
    assert_eq!(amount_of(&recalculated, "BONUS"), dec!(5000));
    assert_eq!(recalculated.id, first.id);
    assert_eq!(recalculated.net_salary, first.net_salary);
}

#[tokio::test]
async fn test_bulk_calculation_skips_failures() {
    let (payroll, service, employee) = setup().await;
    let other = payroll.seed_employee(102, "Vikram Shah", dec!(30000)).await;
    let stranger = Employee::new(999, "No Structure", COMPANY_ID);

    let payslips = service
        .bulk_calculate_payslips(&[employee.clone(), stranger, other.clone()], 2025, 3)
        .await;

    let employees: Vec<i64> = payslips.iter().map(|p| p.employee_id).collect();
    assert_eq!(employees, vec![employee.id, other.id]);
    assert_eq!(payroll.payslips.count(), 2);
}

#[tokio::test]
async fn test_totals_invariants_hold_after_recalculation() {
    let (payroll, service, employee) = setup().await;
    service.calculate_payslip(&employee, 2025, 5).await.unwrap();

    payroll
        .seed_attendance(TestDataFactory::attendance(employee.id, 2025, 5, 18, dec!(4.5)))
        .await;
    let payslip = service.calculate_payslip(&employee, 2025, 5).await.unwrap();

    let sum = |keep: fn(&payslip_engine::payslips::PayslipItem) -> bool| -> Decimal {
        payslip
            .items
            .iter()
            .filter(|item| keep(item))
            .map(|item| item.calculated_amount)
            .sum()
    };
    let earnings = sum(|item| item.is_earning());
    let deductions = sum(|item| item.is_deduction());

    assert_eq!(payslip.days_present, 18);
    assert_eq!(payslip.total_earnings, earnings);
    assert_eq!(payslip.total_deductions, deductions);
    assert_eq!(payslip.gross_salary, payslip.total_earnings);
    assert_eq!(payslip.net_salary, payslip.total_earnings - payslip.total_deductions);
    assert_eq!(payroll.payslips.count(), 1);
}
