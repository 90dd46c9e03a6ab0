// Ordered evaluation of salary components into payslip items.
//
// Components run in display order, then name. Each one sees the
// accumulators left by the components before it, so a deduction's base is
// the earnings recorded so far rather than the final total.

use std::borrow::Cow;
use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::calculation_context::CalculationContext;
use super::formula;
use crate::config::PayrollConfig;
use crate::modules::components::{CalculationMethod, ComponentKind, SalaryComponent};
use crate::modules::payslips::models::PayslipItem;
use crate::modules::structures::EmployeeSalaryStructure;

/// Largest absolute amount a payslip line may carry (9,999,999,999.99)
pub const MAX_LINE_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

/// Manual amounts for variable components, keyed by component code
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentInputs {
    amounts: BTreeMap<String, Decimal>,
}

impl ComponentInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, component_code: impl Into<String>, amount: Decimal) -> Self {
        self.set(component_code, amount);
        self
    }

    pub fn set(&mut self, component_code: impl Into<String>, amount: Decimal) {
        self.amounts.insert(component_code.into(), amount);
    }

    pub fn get(&self, component_code: &str) -> Option<Decimal> {
        self.amounts.get(component_code).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<String, Decimal> {
        &self.amounts
    }
}

impl FromIterator<(String, Decimal)> for ComponentInputs {
    fn from_iter<I: IntoIterator<Item = (String, Decimal)>>(iter: I) -> Self {
        Self {
            amounts: iter.into_iter().collect(),
        }
    }
}

/// Items produced by one run plus the final context
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub items: Vec<PayslipItem>,
    pub context: CalculationContext,
}

pub struct ComponentEvaluator<'a> {
    config: &'a PayrollConfig,
    assignment: Option<&'a EmployeeSalaryStructure>,
    inputs: Option<&'a ComponentInputs>,
}

impl<'a> ComponentEvaluator<'a> {
    pub fn new(config: &'a PayrollConfig) -> Self {
        Self {
            config,
            assignment: None,
            inputs: None,
        }
    }

    /// Apply the assignment's structure entries as parameter overrides
    pub fn with_assignment(mut self, assignment: &'a EmployeeSalaryStructure) -> Self {
        self.assignment = Some(assignment);
        self
    }

    pub fn with_inputs(mut self, inputs: &'a ComponentInputs) -> Self {
        self.inputs = Some(inputs);
        self
    }

    /// Active components in evaluation order
    pub fn order(components: &[SalaryComponent]) -> Vec<&SalaryComponent> {
        let mut ordered: Vec<&SalaryComponent> =
            components.iter().filter(|c| c.is_active).collect();
        ordered.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        ordered
    }

    pub fn evaluate(
        &self,
        payslip_id: &str,
        components: &[SalaryComponent],
        context: CalculationContext,
    ) -> Evaluation {
        let ordered = Self::order(components);
        let capacity = ordered.len();

        let (context, items) = ordered.into_iter().fold(
            (context, Vec::with_capacity(capacity)),
            |(context, mut items), component| {
                let (item, context) = self.evaluate_component(payslip_id, component, context);
                items.push(item);
                (context, items)
            },
        );

        Evaluation { items, context }
    }

    fn evaluate_component(
        &self,
        payslip_id: &str,
        component: &SalaryComponent,
        context: CalculationContext,
    ) -> (PayslipItem, CalculationContext) {
        let currency = self.config.currency;
        let is_overtime = component.code == self.config.overtime_component_code;
        let base_amount = self.base_amount(component, &context);
        let method = self.resolve_method(component);

        let (amount, notes) = if is_overtime {
            let amount = context
                .overtime_hours
                .checked_mul(context.hourly_rate)
                .and_then(|amount| amount.checked_mul(self.config.overtime_multiplier));
            let notes = format!(
                "Overtime: {} h x {} x {}",
                context.overtime_hours,
                currency.round(context.hourly_rate),
                self.config.overtime_multiplier
            );
            (bounded(component, amount.map(|a| currency.round(a))), notes)
        } else {
            let raw = self.method_amount(component, &method, base_amount, &context);
            let prorated = component.kind == ComponentKind::Earning
                && context.attendance_ratio != Decimal::ONE;
            let amount = if component.kind == ComponentKind::Earning {
                raw.and_then(|raw| raw.checked_mul(context.attendance_ratio))
            } else {
                raw
            };
            let amount = bounded(component, amount.map(|a| currency.round(a)));

            let mut notes = describe(&method, currency.round(base_amount), amount);
            if prorated {
                notes.push_str(&format!(
                    " (pro-rated at {} attendance)",
                    context.attendance_ratio.round_dp(4)
                ));
            }
            (amount, notes)
        };

        debug!(
            component_code = component.code.as_str(),
            kind = component.kind.as_str(),
            base_amount = %base_amount,
            amount = %amount,
            "Evaluated salary component"
        );

        let item = PayslipItem::for_component(
            payslip_id,
            component,
            currency.round(base_amount),
            method.rate(),
            amount,
            notes,
        );

        (item, context.record(component.kind, amount))
    }

    fn base_amount(&self, component: &SalaryComponent, context: &CalculationContext) -> Decimal {
        match component.kind {
            ComponentKind::Earning | ComponentKind::EmployerContribution => {
                context.adjusted_basic_salary
            }
            ComponentKind::Deduction => {
                if context.earnings_recorded == 0 {
                    warn!(
                        component_code = component.code.as_str(),
                        "Deduction evaluated before any earning; using adjusted basic salary as base"
                    );
                }

                if context.total_earnings.is_zero() {
                    context.adjusted_basic_salary
                } else {
                    context.total_earnings
                }
            }
        }
    }

    /// Component method with the assignment's amount or rate substituted
    ///
    /// Employee custom entries win over structure entries, which win over
    /// the component's own default. Only fixed amounts and percentage rates
    /// are overridable.
    fn resolve_method<'c>(&self, component: &'c SalaryComponent) -> Cow<'c, CalculationMethod> {
        let entry = self
            .assignment
            .and_then(|assignment| assignment.entry_for(&component.code));

        match (&component.calculation, entry) {
            (CalculationMethod::Fixed { .. }, Some(entry)) if entry.amount.is_some() => {
                Cow::Owned(CalculationMethod::Fixed {
                    amount: entry.amount,
                })
            }
            (CalculationMethod::Percentage { .. }, Some(entry)) if entry.rate.is_some() => {
                Cow::Owned(CalculationMethod::Percentage { rate: entry.rate })
            }
            _ => Cow::Borrowed(&component.calculation),
        }
    }

    fn method_amount(
        &self,
        component: &SalaryComponent,
        method: &CalculationMethod,
        base_amount: Decimal,
        context: &CalculationContext,
    ) -> Option<Decimal> {
        match method {
            CalculationMethod::Fixed { amount } => Some(amount.unwrap_or(Decimal::ZERO)),
            CalculationMethod::Percentage { rate: Some(rate) } => base_amount
                .checked_mul(*rate)
                .map(|amount| amount / Decimal::ONE_HUNDRED),
            CalculationMethod::Percentage { rate: None } => Some(Decimal::ZERO),
            CalculationMethod::Computed { formula } => {
                Some(computed_amount(component, formula.as_deref(), context))
            }
            CalculationMethod::Variable => Some(
                self.inputs
                    .and_then(|inputs| inputs.get(&component.code))
                    .unwrap_or(Decimal::ZERO),
            ),
        }
    }
}

/// Line amount if it overflowed nowhere and fits a payslip line, else 0
fn bounded(component: &SalaryComponent, amount: Option<Decimal>) -> Decimal {
    match amount {
        Some(amount) if amount.abs() <= MAX_LINE_AMOUNT => amount,
        _ => {
            warn!(
                component_code = component.code.as_str(),
                "Component amount out of range; amount set to 0"
            );
            Decimal::ZERO
        }
    }
}

fn computed_amount(
    component: &SalaryComponent,
    formula: Option<&str>,
    context: &CalculationContext,
) -> Decimal {
    let Some(formula) = formula.filter(|f| !f.trim().is_empty()) else {
        warn!(
            component_code = component.code.as_str(),
            "Computed component has no formula; amount set to 0"
        );
        return Decimal::ZERO;
    };

    match formula::evaluate(formula, |name| context.variable(name)) {
        Ok(value) => value,
        Err(e) => {
            warn!(
                component_code = component.code.as_str(),
                formula,
                error = %e,
                "Formula rejected; amount set to 0"
            );
            Decimal::ZERO
        }
    }
}

fn describe(method: &CalculationMethod, base_amount: Decimal, amount: Decimal) -> String {
    match method {
        CalculationMethod::Fixed { amount: configured } => {
            format!("Fixed amount: {}", configured.unwrap_or(Decimal::ZERO))
        }
        CalculationMethod::Percentage { rate } => format!(
            "({}% of {}) = {}",
            rate.unwrap_or(Decimal::ZERO),
            base_amount,
            amount
        ),
        CalculationMethod::Computed { formula } => {
            format!("Formula: {}", formula.as_deref().unwrap_or(""))
        }
        CalculationMethod::Variable => format!("Variable amount: {}", amount),
    }
}
