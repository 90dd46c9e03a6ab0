// Component evaluation properties
//
// - Evaluation order is display order then name, and deductions see the
//   earnings recorded so far, not the final total
// - Fixed amounts ignore the base amount
// - The overtime component always pays hours x hourly rate x multiplier
// - Full attendance leaves the basic salary unadjusted

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use payslip_engine::attendance::AttendanceSummary;
use payslip_engine::components::{CalculationMethod, ComponentKind, SalaryComponent};
use payslip_engine::config::PayrollConfig;
use payslip_engine::payslips::services::{CalculationContext, ComponentEvaluator, ComponentInputs};
use payslip_engine::structures::{EmployeeSalaryStructure, SalaryStructure, StructureEntry};

fn component(code: &str, kind: ComponentKind, calculation: CalculationMethod, order: i32) -> SalaryComponent {
    SalaryComponent::new(1, code, code, kind, calculation, order).unwrap()
}

fn fixed(code: &str, kind: ComponentKind, amount: Decimal, order: i32) -> SalaryComponent {
    component(code, kind, CalculationMethod::Fixed { amount: Some(amount) }, order)
}

fn percentage(code: &str, kind: ComponentKind, rate: Decimal, order: i32) -> SalaryComponent {
    component(code, kind, CalculationMethod::Percentage { rate: Some(rate) }, order)
}

fn attendance(days_present: i32, total_working_days: u32, overtime_hours: Decimal) -> AttendanceSummary {
    let mut summary =
        AttendanceSummary::with_defaults(1, 1, 2025, 3, total_working_days, dec!(8)).unwrap();
    summary.days_present = days_present;
    summary.overtime_hours = overtime_hours;
    summary
}

fn context(basic: Decimal, attendance: &AttendanceSummary) -> CalculationContext {
    CalculationContext::new(basic, attendance)
}

#[test]
fn test_deduction_base_is_earnings_so_far() {
    let config = PayrollConfig::default();
    let components = vec![
        fixed("A", ComponentKind::Earning, dec!(10000), 1),
        percentage("B", ComponentKind::Deduction, dec!(10), 2),
        fixed("C", ComponentKind::Earning, dec!(5000), 3),
    ];

    let evaluation = ComponentEvaluator::new(&config).evaluate(
        "payslip",
        &components,
        context(dec!(30000), &attendance(22, 22, Decimal::ZERO)),
    );

    let deduction = &evaluation.items[1];
    assert_eq!(deduction.component_code, "B");
    assert_eq!(deduction.base_amount, dec!(10000));
    assert_eq!(deduction.calculated_amount, dec!(1000));
    assert_eq!(evaluation.context.total_earnings, dec!(15000));
    assert_eq!(evaluation.context.total_deductions, dec!(1000));
    assert_eq!(evaluation.context.gross_salary, dec!(15000));
}

#[test]
fn test_reordering_changes_deduction_base() {
    let config = PayrollConfig::default();
    let components = vec![
        fixed("A", ComponentKind::Earning, dec!(10000), 1),
        percentage("B", ComponentKind::Deduction, dec!(10), 5),
        fixed("C", ComponentKind::Earning, dec!(5000), 3),
    ];

    let evaluation = ComponentEvaluator::new(&config).evaluate(
        "payslip",
        &components,
        context(dec!(30000), &attendance(22, 22, Decimal::ZERO)),
    );

    let codes: Vec<&str> = evaluation.items.iter().map(|i| i.component_code.as_str()).collect();
    assert_eq!(codes, vec!["A", "C", "B"]);
    assert_eq!(evaluation.items[2].base_amount, dec!(15000));
    assert_eq!(evaluation.items[2].calculated_amount, dec!(1500));
}

#[test]
fn test_ties_broken_by_name_and_inactive_skipped() {
    let mut retired = fixed("ZZ", ComponentKind::Earning, dec!(1), 1);
    retired.deactivate();
    let components = vec![
        fixed("Beta", ComponentKind::Earning, dec!(1), 1),
        fixed("Alpha", ComponentKind::Earning, dec!(1), 1),
        retired,
    ];

    let ordered = ComponentEvaluator::order(&components);
    let names: Vec<&str> = ordered.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "Beta"]);
}

#[test]
fn test_deduction_before_any_earning_uses_adjusted_basic() {
    let config = PayrollConfig::default();
    let components = vec![
        percentage("EARLY", ComponentKind::Deduction, dec!(10), 1),
        fixed("A", ComponentKind::Earning, dec!(10000), 2),
    ];

    let evaluation = ComponentEvaluator::new(&config).evaluate(
        "payslip",
        &components,
        context(dec!(20000), &attendance(11, 22, Decimal::ZERO)),
    );

    assert_eq!(evaluation.items[0].base_amount, dec!(10000));
    assert_eq!(evaluation.items[0].calculated_amount, dec!(1000));
}

#[test]
fn test_earnings_prorated_deductions_not() {
    let config = PayrollConfig::default();
    let components = vec![
        fixed("TA", ComponentKind::Earning, dec!(1600), 1),
        fixed("PT", ComponentKind::Deduction, dec!(200), 2),
    ];

    let evaluation = ComponentEvaluator::new(&config).evaluate(
        "payslip",
        &components,
        context(dec!(22000), &attendance(11, 22, Decimal::ZERO)),
    );

    assert_eq!(evaluation.items[0].calculated_amount, dec!(800));
    assert!(evaluation.items[0]
        .calculation_notes
        .as_deref()
        .unwrap_or_default()
        .contains("pro-rated"));
    assert_eq!(evaluation.items[1].calculated_amount, dec!(200));
}

#[test]
fn test_overtime_ignores_configured_method() {
    let config = PayrollConfig::default();
    let components = vec![percentage("OT", ComponentKind::Earning, dec!(50), 1)];

    // 17600 / 176 h = 100 per hour; 10 h x 100 x 1.5 = 1500, not pro-rated
    let evaluation = ComponentEvaluator::new(&config).evaluate(
        "payslip",
        &components,
        context(dec!(17600), &attendance(11, 22, dec!(10))),
    );

    assert_eq!(evaluation.items[0].calculated_amount, dec!(1500));
}

#[test]
fn test_assignment_entries_override_defaults() {
    let config = PayrollConfig::default();
    let structure = SalaryStructure::new(1, "Standard", "SS-0001", dec!(40000))
        .unwrap()
        .with_allowances(vec![
            StructureEntry::rate("HRA", dec!(50)),
            StructureEntry::amount("TA", dec!(2000)),
        ]);
    let assignment = EmployeeSalaryStructure::new(
        1,
        1,
        &structure,
        dec!(40000),
        chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        None,
    )
    .unwrap()
    .with_custom_allowances(vec![StructureEntry::amount("TA", dec!(3000))]);

    let components = vec![
        percentage("HRA", ComponentKind::Earning, dec!(40), 1),
        fixed("TA", ComponentKind::Earning, dec!(1600), 2),
    ];

    let evaluation = ComponentEvaluator::new(&config)
        .with_assignment(&assignment)
        .evaluate(
            "payslip",
            &components,
            context(dec!(40000), &attendance(22, 22, Decimal::ZERO)),
        );

    assert_eq!(evaluation.items[0].rate, Some(dec!(50)));
    assert_eq!(evaluation.items[0].calculated_amount, dec!(20000));
    assert_eq!(evaluation.items[1].calculated_amount, dec!(3000));
}

#[test]
fn test_variable_and_computed_components() {
    let config = PayrollConfig::default();
    let components = vec![
        component("BONUS", ComponentKind::Earning, CalculationMethod::Variable, 1),
        component(
            "SPECIAL",
            ComponentKind::Earning,
            CalculationMethod::Computed {
                formula: Some("{basic_salary} * 0.1".to_string()),
            },
            2,
        ),
        component(
            "BROKEN",
            ComponentKind::Earning,
            CalculationMethod::Computed {
                formula: Some("{basic_salary}; exit".to_string()),
            },
            3,
        ),
        component("MISSING", ComponentKind::Earning, CalculationMethod::Variable, 4),
    ];
    let inputs = ComponentInputs::new().with("BONUS", dec!(2500));

    let evaluation = ComponentEvaluator::new(&config)
        .with_inputs(&inputs)
        .evaluate(
            "payslip",
            &components,
            context(dec!(30000), &attendance(22, 22, Decimal::ZERO)),
        );

    let amounts: Vec<Decimal> = evaluation.items.iter().map(|i| i.calculated_amount).collect();
    assert_eq!(amounts, vec![dec!(2500), dec!(3000), Decimal::ZERO, Decimal::ZERO]);
}

#[test]
fn test_zero_working_days_yields_zero_ratio() {
    let summary = attendance(0, 0, Decimal::ZERO);
    let context = context(dec!(30000), &summary);

    assert_eq!(context.attendance_ratio, Decimal::ZERO);
    assert_eq!(context.adjusted_basic_salary, Decimal::ZERO);
}

#[test]
fn test_out_of_range_amounts_do_not_abort_evaluation() {
    let config = PayrollConfig::default();
    let huge = || CalculationMethod::Computed {
        formula: Some("50000000000000000000000000000".to_string()),
    };
    let components = vec![
        fixed("TA", ComponentKind::Earning, dec!(1600), 1),
        component("BIG1", ComponentKind::Earning, huge(), 2),
        component("BIG2", ComponentKind::Earning, huge(), 3),
        fixed("OT", ComponentKind::Earning, Decimal::ZERO, 4),
        percentage("PF", ComponentKind::Deduction, dec!(12), 5),
    ];

    let evaluation = ComponentEvaluator::new(&config).evaluate(
        "payslip",
        &components,
        context(dec!(30000), &attendance(22, 22, Decimal::MAX)),
    );

    let amounts: Vec<Decimal> = evaluation.items.iter().map(|i| i.calculated_amount).collect();
    assert_eq!(amounts, vec![dec!(1600), dec!(0), dec!(0), dec!(0), dec!(192)]);
    assert_eq!(evaluation.context.total_earnings, dec!(1600));
    assert_eq!(evaluation.context.total_deductions, dec!(192));
}

proptest! {
    #[test]
    fn test_full_attendance_keeps_basic(basic in 0u32..10_000_000u32, days in 1u32..31u32) {
        let basic = Decimal::from(basic);
        let summary = attendance(days as i32, days, Decimal::ZERO);
        let context = context(basic, &summary);

        prop_assert_eq!(context.adjusted_basic_salary, basic);
    }

    #[test]
    fn test_fixed_amount_independent_of_base(
        amount in 0u32..1_000_000u32,
        basic_a in 0u32..1_000_000u32,
        basic_b in 0u32..1_000_000u32,
    ) {
        let config = PayrollConfig::default();
        let amount = Decimal::from(amount);
        let components = vec![fixed("FX", ComponentKind::Deduction, amount, 1)];
        let full = attendance(22, 22, Decimal::ZERO);

        let a = ComponentEvaluator::new(&config)
            .evaluate("p", &components, context(Decimal::from(basic_a), &full));
        let b = ComponentEvaluator::new(&config)
            .evaluate("p", &components, context(Decimal::from(basic_b), &full));

        prop_assert_eq!(a.items[0].calculated_amount, amount);
        prop_assert_eq!(b.items[0].calculated_amount, amount);
    }

    #[test]
    fn test_overtime_formula_holds(basic in 1u32..1_000_000u32, hours in 0u32..100u32) {
        let config = PayrollConfig::default();
        let basic = Decimal::from(basic);
        let hours = Decimal::from(hours);
        let summary = attendance(22, 22, hours);
        let components = vec![fixed("OT", ComponentKind::Earning, dec!(999), 1)];

        let context = context(basic, &summary);
        let expected = config
            .currency
            .round(hours * context.hourly_rate * config.overtime_multiplier);
        let evaluation = ComponentEvaluator::new(&config).evaluate("p", &components, context);

        prop_assert_eq!(evaluation.items[0].calculated_amount, expected);
    }
}
