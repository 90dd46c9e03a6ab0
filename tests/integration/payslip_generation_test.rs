//! Integration tests for the monthly payslip generation job
//!
//! Existing payslips are skipped unless forced, and one employee's failure
//! never stops the batch.

#[path = "../helpers/mod.rs"]
mod helpers;

use std::sync::Arc;

use helpers::*;
use rust_decimal_macros::dec;

use payslip_engine::payslips::{
    GenerationRequest, PayslipCalculationService, PayslipGenerationJob, PayslipRepository,
};
use payslip_engine::structures::SalaryStructureRepository;

fn job(payroll: &InMemoryPayroll) -> PayslipGenerationJob {
    let repositories = payroll.repositories();
    let calculation = Arc::new(PayslipCalculationService::new(
        repositories.clone(),
        TestDataFactory::config(),
    ));
    PayslipGenerationJob::new(&repositories, calculation)
}

async fn payroll_with_two_employees() -> InMemoryPayroll {
    let payroll = InMemoryPayroll::new();
    payroll.seed_standard_components().await;
    payroll.seed_employee(101, "Asha Rao", dec!(50000)).await;
    payroll.seed_employee(102, "Vikram Shah", dec!(30000)).await;
    payroll
}

#[tokio::test]
async fn test_generates_for_every_payable_employee() {
    let payroll = payroll_with_two_employees().await;

    let summary = job(&payroll)
        .run(&GenerationRequest::new(2025, 3))
        .await
        .unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.failed, 0);
    assert!(!summary.has_failures());
    assert_eq!(payroll.payslips.count(), 2);

    let stored = payroll.payslips.list_for_period(None, 2025, 3).await.unwrap();
    let net: rust_decimal::Decimal = stored.iter().map(|p| p.net_salary).sum();
    assert_eq!(summary.total_net_salary, net);
}

#[tokio::test]
async fn test_second_run_skips_existing() {
    let payroll = payroll_with_two_employees().await;
    let job = job(&payroll);

    job.run(&GenerationRequest::new(2025, 3)).await.unwrap();
    let summary = job.run(&GenerationRequest::new(2025, 3)).await.unwrap();

    assert_eq!(summary.processed, 0);
    assert_eq!(summary.skipped, 2);
    assert_eq!(payroll.payslips.count(), 2);
}

#[tokio::test]
async fn test_force_recalculates_drafts_in_place() {
    let payroll = payroll_with_two_employees().await;
    let job = job(&payroll);

    job.run(&GenerationRequest::new(2025, 3)).await.unwrap();
    let before = payroll.payslips.find_by_period(101, 2025, 3).await.unwrap().unwrap();

    let summary = job
        .run(&GenerationRequest::new(2025, 3).forced(true))
        .await
        .unwrap();
    let after = payroll.payslips.find_by_period(101, 2025, 3).await.unwrap().unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.skipped, 0);
    assert_eq!(payroll.payslips.count(), 2);
    assert_eq!(before.id, after.id);
    assert_eq!(before.payslip_number, after.payslip_number);
}

#[tokio::test]
async fn test_force_counts_locked_payslips_as_failures() {
    let payroll = payroll_with_two_employees().await;
    let job = job(&payroll);
    job.run(&GenerationRequest::new(2025, 3)).await.unwrap();

    let mut approved = payroll.payslips.find_by_period(101, 2025, 3).await.unwrap().unwrap();
    approved.process(1).unwrap();
    payroll.payslips.update_status(&approved).await.unwrap();

    let summary = job
        .run(&GenerationRequest::new(2025, 3).forced(true))
        .await
        .unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.failures[0].employee_id, 101);
    assert!(summary.has_failures());
}

#[tokio::test]
async fn test_failure_does_not_stop_the_batch() {
    let payroll = payroll_with_two_employees().await;

    // Active, but only effective from 2026: payable yet without a structure for March 2025
    let structure = payroll
        .structures
        .create_structure(TestDataFactory::structure(dec!(20000)))
        .await
        .unwrap();
    let mut late = TestDataFactory::assignment(100, &structure, dec!(20000));
    late.effective_from = TestDataFactory::date(2026, 1, 1);
    payroll.structures.assign(late).await.unwrap();
    payroll
        .employees
        .add(payslip_engine::employees::Employee::new(100, "Late Joiner", COMPANY_ID));

    let summary = job(&payroll)
        .run(&GenerationRequest::new(2025, 3))
        .await
        .unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.failures[0].employee_id, 100);
    assert_eq!(summary.failures[0].employee_name, "Late Joiner");
    assert!(summary.failures[0].error.contains("No active salary structure"));
    assert_eq!(payroll.payslips.count(), 2);
}

#[tokio::test]
async fn test_filters_by_employee_and_company() {
    let payroll = payroll_with_two_employees().await;
    let job = job(&payroll);

    let one = job
        .run(&GenerationRequest::new(2025, 3).for_employee(Some(102)))
        .await
        .unwrap();
    assert_eq!(one.total(), 1);
    assert!(payroll.payslips.find_by_period(102, 2025, 3).await.unwrap().is_some());
    assert!(payroll.payslips.find_by_period(101, 2025, 3).await.unwrap().is_none());

    let none = job
        .run(&GenerationRequest::new(2025, 3).for_company(Some(COMPANY_ID + 1)))
        .await
        .unwrap();
    assert_eq!(none.total(), 0);
}

#[tokio::test]
async fn test_invalid_period_is_rejected() {
    let payroll = payroll_with_two_employees().await;

    let result = job(&payroll).run(&GenerationRequest::new(2025, 0)).await;

    assert!(result.is_err());
    assert_eq!(payroll.payslips.count(), 0);
}
