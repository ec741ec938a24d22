use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TaxClass {
    One,
    Two,
    Three,
}

impl TaxClass {
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(TaxClass::One),
            2 => Some(TaxClass::Two),
            3 => Some(TaxClass::Three),
            _ => None,
        }
    }

    pub fn as_number(self) -> u8 {
        match self {
            TaxClass::One => 1,
            TaxClass::Two => 2,
            TaxClass::Three => 3,
        }
    }
}

/// Taxable estate passed to `TaxPolicy::inheritance_tax`. The simple
/// single-amount form maps to all housing/financial assets via
/// [`InheritedEstate::financial`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct InheritedEstate {
    pub housing_financial: f64,
    pub business: f64,
    pub hardship: bool,
}

impl InheritedEstate {
    pub fn financial(amount: f64) -> Self {
        Self {
            housing_financial: amount,
            business: 0.0,
            hardship: false,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct InheritanceEvent {
    pub age: u32,
    pub amount: f64,
    pub tax_class: TaxClass,
}

/// Additive per-age adjustment to income and wealth.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct YearlyOverride {
    pub age: u32,
    pub income: f64,
    pub wealth: f64,
}

/// Annual income compounding factor as a function of age.
#[derive(Debug, Clone)]
pub enum IncomeGrowth {
    Constant(f64),
    /// Exact-age multipliers falling back to `default` for unlisted ages.
    Steps { default: f64, steps: Vec<(u32, f64)> },
}

impl IncomeGrowth {
    pub fn at(&self, age: u32) -> f64 {
        match self {
            IncomeGrowth::Constant(m) => *m,
            IncomeGrowth::Steps { default, steps } => steps
                .iter()
                .find(|(a, _)| *a == age)
                .map(|(_, m)| *m)
                .unwrap_or(*default),
        }
    }
}

impl Default for IncomeGrowth {
    fn default() -> Self {
        IncomeGrowth::Constant(1.02)
    }
}

#[derive(Debug, Clone)]
pub struct Persona {
    pub initial_age: u32,
    pub current_age: u32,
    pub current_income: f64,
    pub current_wealth: f64,
    pub savings_rate: f64,
    pub growth: IncomeGrowth,
    pub inheritance: Option<InheritanceEvent>,
    pub yearly_spending_from_wealth: f64,
    pub vat_rate: f64,
    pub vat_applicable_rate: f64,
    pub overrides: Vec<YearlyOverride>,
}

/// One simulated year. Every currency field is rounded to the nearest
/// whole unit when the row is created; totals are accumulated from the
/// unrounded values instead.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearResult {
    pub age: u32,
    pub income: i64,
    pub income_tax: i64,
    pub savings: i64,
    pub wealth: i64,
    pub wealth_growth: i64,
    pub wealth_income: i64,
    pub wealth_income_tax: i64,
    pub wealth_tax: i64,
    pub inheritance: i64,
    pub inheritance_tax: i64,
    pub vat: i64,
    pub total_spending: i64,
    pub spending_from_income: i64,
}

/// Whole-horizon sums, each rounded exactly once from its exact running
/// value. `total_income` is therefore not guaranteed to equal the sum of
/// the rounded per-year incomes.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub total_income: i64,
    pub total_income_tax: i64,
    pub total_savings: i64,
    pub total_wealth_growth: i64,
    pub total_wealth_income: i64,
    pub total_wealth_income_tax: i64,
    pub total_wealth_tax: i64,
    pub total_inheritance: i64,
    pub total_inheritance_tax: i64,
    pub total_vat: i64,
    pub total_spending: i64,
    pub total_spending_from_income: i64,
    pub total_spending_from_wealth: i64,
    pub final_wealth: i64,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub totals: Totals,
    pub details: Vec<YearResult>,
}
