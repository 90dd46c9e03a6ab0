use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{AppError, Result};

/// One slab of the progressive income-tax table, expressed on annual income
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxBracket {
    /// Lower bound of the slab
    pub min_amount: Decimal,
    /// Upper bound of the slab; `None` means unbounded
    #[serde(default)]
    pub max_amount: Option<Decimal>,
    /// Rate in percent (e.g. 5 for 5%)
    pub tax_rate: Decimal,
}

impl TaxBracket {
    pub fn new(min_amount: Decimal, max_amount: Option<Decimal>, tax_rate: Decimal) -> Self {
        Self {
            min_amount,
            max_amount,
            tax_rate,
        }
    }

    fn validate(&self, index: usize) -> Result<()> {
        if self.min_amount < Decimal::ZERO {
            return Err(AppError::configuration(format!(
                "Tax bracket {} has a negative minimum ({})",
                index, self.min_amount
            )));
        }

        if self.tax_rate < Decimal::ZERO || self.tax_rate > Decimal::ONE_HUNDRED {
            return Err(AppError::configuration(format!(
                "Tax bracket {} rate must be between 0 and 100, got {}",
                index, self.tax_rate
            )));
        }

        if let Some(max) = self.max_amount {
            if max <= self.min_amount {
                return Err(AppError::configuration(format!(
                    "Tax bracket {} maximum ({}) must exceed its minimum ({})",
                    index, max, self.min_amount
                )));
            }
        }

        Ok(())
    }
}

/// Validated, ordered set of tax brackets
///
/// Brackets are sorted ascending and never overlap. Only the last bracket
/// may be unbounded. A bracket whose minimum is exactly one unit above the
/// previous maximum (the `250001` style used in published slab tables) is
/// treated as starting at that previous maximum, so no income falls between
/// two slabs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxBracketTable {
    brackets: Vec<TaxBracket>,
}

impl TaxBracketTable {
    /// Build a table, failing fast on unsorted, overlapping or malformed brackets
    pub fn new(brackets: Vec<TaxBracket>) -> Result<Self> {
        for (index, bracket) in brackets.iter().enumerate() {
            bracket.validate(index)?;
        }

        for (index, pair) in brackets.windows(2).enumerate() {
            let (previous, next) = (&pair[0], &pair[1]);

            let Some(previous_max) = previous.max_amount else {
                return Err(AppError::configuration(format!(
                    "Tax bracket {} is unbounded but is not the last bracket",
                    index
                )));
            };

            if next.min_amount < previous_max {
                return Err(AppError::configuration(format!(
                    "Tax brackets {} and {} overlap or are unsorted ({} < {})",
                    index,
                    index + 1,
                    next.min_amount,
                    previous_max
                )));
            }
        }

        Ok(Self { brackets })
    }

    /// Empty table: no income tax is withheld
    pub fn empty() -> Self {
        Self { brackets: vec![] }
    }

    /// Parse a YAML list of `{min_amount, max_amount, tax_rate}` entries
    pub fn from_yaml(source: &str) -> Result<Self> {
        let brackets: Vec<TaxBracket> = serde_yaml::from_str(source)?;
        Self::new(brackets)
    }

    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }

    pub fn is_empty(&self) -> bool {
        self.brackets.is_empty()
    }

    /// Lower edge from which each bracket taxes income
    pub(crate) fn floors(&self) -> impl Iterator<Item = (Decimal, &TaxBracket)> {
        let mut previous_max: Option<Decimal> = None;
        self.brackets.iter().map(move |bracket| {
            let floor = match previous_max {
                Some(max) if bracket.min_amount == max + Decimal::ONE => max,
                _ => bracket.min_amount,
            };
            previous_max = bracket.max_amount;
            (floor, bracket)
        })
    }
}

impl Default for TaxBracketTable {
    /// Slab table shipped with the payroll plugin
    fn default() -> Self {
        Self {
            brackets: vec![
                TaxBracket::new(Decimal::ZERO, Some(Decimal::from(250_000)), Decimal::ZERO),
                TaxBracket::new(
                    Decimal::from(250_001),
                    Some(Decimal::from(500_000)),
                    Decimal::from(5),
                ),
                TaxBracket::new(
                    Decimal::from(500_001),
                    Some(Decimal::from(1_000_000)),
                    Decimal::from(20),
                ),
                TaxBracket::new(Decimal::from(1_000_001), None, Decimal::from(30)),
            ],
        }
    }
}
