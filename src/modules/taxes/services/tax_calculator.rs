use rust_decimal::Decimal;

use crate::modules::taxes::models::TaxBracketTable;

const MONTHS_PER_YEAR: i64 = 12;

/// Progressive income-tax calculator over a validated bracket table
#[derive(Debug, Clone)]
pub struct IncomeTaxCalculator {
    table: TaxBracketTable,
}

impl IncomeTaxCalculator {
    pub fn new(table: TaxBracketTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &TaxBracketTable {
        &self.table
    }

    /// Annual tax for an annual taxable income
    ///
    /// Each bracket whose floor is exceeded contributes
    /// `(min(income, max) - floor) × rate / 100`.
    pub fn annual_tax(&self, annual_income: Decimal) -> Decimal {
        self.table
            .floors()
            .filter(|(floor, _)| annual_income > *floor)
            .map(|(floor, bracket)| {
                let ceiling = match bracket.max_amount {
                    Some(max) => annual_income.min(max),
                    None => annual_income,
                };
                (ceiling - floor) * bracket.tax_rate / Decimal::ONE_HUNDRED
            })
            .sum()
    }

    /// Monthly tax for a monthly taxable income
    ///
    /// Annualizes the income (× 12), applies the brackets, and spreads the
    /// annual figure back over twelve months. Result is unrounded.
    pub fn monthly_tax(&self, monthly_taxable_income: Decimal) -> Decimal {
        if monthly_taxable_income <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let months = Decimal::from(MONTHS_PER_YEAR);
        self.annual_tax(monthly_taxable_income * months) / months
    }
}

impl Default for IncomeTaxCalculator {
    fn default() -> Self {
        Self::new(TaxBracketTable::default())
    }
}
