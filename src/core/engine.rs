use thiserror::Error;
use tracing::warn;

use super::policy::TaxPolicy;
use super::types::{
    InheritedEstate, Persona, SimulationResult, Totals, YearResult, YearlyOverride,
};

pub const RETIREMENT_AGE: u32 = 65;
pub const MIN_INITIAL_AGE: u32 = 18;

const WEALTH_GROWTH_RATE: f64 = 0.05;
const WEALTH_INCOME_RATE: f64 = 0.03;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("initialAge must be between {MIN_INITIAL_AGE} and {RETIREMENT_AGE}, got {0}")]
    InitialAgeOutOfRange(u32),
    #[error("currentAge must be between initialAge and {RETIREMENT_AGE}, got {0}")]
    CurrentAgeOutOfRange(u32),
    #[error("savingsRate must be between 0 and 1, got {0}")]
    SavingsRateOutOfRange(f64),
    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },
    #[error("income growth multiplier must be positive and finite at age {age}, got {multiplier}")]
    InvalidGrowthMultiplier { age: u32, multiplier: f64 },
}

/// Exhaustive list of violated input rules; the engine produces no
/// result when any rule fails.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("invalid simulation inputs: {}", .errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
pub struct ValidationFailure {
    pub errors: Vec<ValidationError>,
}

impl ValidationFailure {
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

/// Checks every rule and collects all violations rather than stopping
/// at the first.
pub fn validate(persona: &Persona) -> Result<(), ValidationFailure> {
    let mut errors = Vec::new();

    if !(MIN_INITIAL_AGE..=RETIREMENT_AGE).contains(&persona.initial_age) {
        errors.push(ValidationError::InitialAgeOutOfRange(persona.initial_age));
    }
    if persona.current_age < persona.initial_age || persona.current_age > RETIREMENT_AGE {
        errors.push(ValidationError::CurrentAgeOutOfRange(persona.current_age));
    }
    if !persona.savings_rate.is_finite() || !(0.0..=1.0).contains(&persona.savings_rate) {
        errors.push(ValidationError::SavingsRateOutOfRange(persona.savings_rate));
    }

    let numeric_fields = [
        ("currentIncome", persona.current_income),
        ("currentWealth", persona.current_wealth),
        ("yearlySpendingFromWealth", persona.yearly_spending_from_wealth),
        ("vatRate", persona.vat_rate),
        ("vatApplicableRate", persona.vat_applicable_rate),
    ];
    for (field, value) in numeric_fields {
        if !value.is_finite() {
            errors.push(ValidationError::NonFinite { field });
        }
    }

    if let Some(event) = &persona.inheritance {
        if !event.amount.is_finite() {
            errors.push(ValidationError::NonFinite {
                field: "inheritanceAmount",
            });
        }
    }

    for ov in &persona.overrides {
        if !ov.income.is_finite() || !ov.wealth.is_finite() {
            errors.push(ValidationError::NonFinite {
                field: "yearlyOverrides",
            });
        }
    }

    // Guards both the back-calculation divisions and the forward loop.
    if persona.initial_age <= RETIREMENT_AGE {
        for age in persona.initial_age..=RETIREMENT_AGE.max(persona.current_age) {
            let multiplier = persona.growth.at(age);
            if !multiplier.is_finite() || multiplier <= 0.0 {
                errors.push(ValidationError::InvalidGrowthMultiplier { age, multiplier });
                break;
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationFailure { errors })
    }
}

/// Income at `initial_age` derived by unwinding the growth multipliers
/// from the present-day income backwards.
fn back_calculate_initial_income(persona: &Persona) -> f64 {
    let mut income = persona.current_income;
    let mut age = persona.current_age;
    while age > persona.initial_age {
        income /= persona.growth.at(age);
        age -= 1;
    }
    income
}

/// Combined adjustment for one age; multiple entries for the same age
/// have their deltas summed.
fn override_for(persona: &Persona, age: u32) -> YearlyOverride {
    persona
        .overrides
        .iter()
        .filter(|ov| ov.age == age)
        .fold(YearlyOverride { age, ..Default::default() }, |mut acc, ov| {
            acc.income += ov.income;
            acc.wealth += ov.wealth;
            acc
        })
}

#[derive(Debug, Default)]
struct TotalsAccumulator {
    income: f64,
    income_tax: f64,
    savings: f64,
    wealth_growth: f64,
    wealth_income: f64,
    wealth_income_tax: f64,
    wealth_tax: f64,
    inheritance: f64,
    inheritance_tax: f64,
    vat: f64,
    spending: f64,
    spending_from_income: f64,
    spending_from_wealth: f64,
}

impl TotalsAccumulator {
    /// Single rounding step for the whole horizon. Rounding here rather
    /// than summing the rounded per-year rows is what makes
    /// `totals.totalIncome` differ from the sum of the detail rows by a
    /// small integer.
    fn rounded(&self, final_wealth: f64) -> Totals {
        Totals {
            total_income: self.income.round() as i64,
            total_income_tax: self.income_tax.round() as i64,
            total_savings: self.savings.round() as i64,
            total_wealth_growth: self.wealth_growth.round() as i64,
            total_wealth_income: self.wealth_income.round() as i64,
            total_wealth_income_tax: self.wealth_income_tax.round() as i64,
            total_wealth_tax: self.wealth_tax.round() as i64,
            total_inheritance: self.inheritance.round() as i64,
            total_inheritance_tax: self.inheritance_tax.round() as i64,
            total_vat: self.vat.round() as i64,
            total_spending: self.spending.round() as i64,
            total_spending_from_income: self.spending_from_income.round() as i64,
            total_spending_from_wealth: self.spending_from_wealth.round() as i64,
            final_wealth: final_wealth.round() as i64,
        }
    }
}

/// Projects income, taxes and wealth from `initial_age` through
/// [`RETIREMENT_AGE`] under the given policy. Pure and deterministic:
/// identical inputs produce identical output. Invalid inputs are
/// rejected up front with the full list of violations; the loop itself
/// never fails.
pub fn run_simulation(
    persona: &Persona,
    policy: &dyn TaxPolicy,
) -> Result<SimulationResult, ValidationFailure> {
    if let Err(failure) = validate(persona) {
        warn!(policy = policy.id(), %failure, "rejecting simulation input");
        return Err(failure);
    }

    let initial_income = back_calculate_initial_income(persona);
    let years = (RETIREMENT_AGE - persona.initial_age + 1) as usize;

    let mut total_wealth = persona.current_wealth;
    // Growth compounds on the previously *rounded* income, so the series
    // drifts slightly from an exact compounding of initial_income.
    let mut previous_rounded_income = 0.0;
    let mut acc = TotalsAccumulator::default();
    let mut details = Vec::with_capacity(years);

    for age in persona.initial_age..=RETIREMENT_AGE {
        let mut income = if age == persona.initial_age {
            initial_income
        } else {
            previous_rounded_income * persona.growth.at(age)
        };

        let ov = override_for(persona, age);
        income += ov.income;
        total_wealth += ov.wealth;

        let wealth_start = total_wealth;
        let wealth_income = wealth_start * WEALTH_INCOME_RATE;

        let income_tax = policy.income_tax(income);
        let wealth_income_tax = policy.wealth_income_tax(wealth_income);
        let wealth_tax = policy.wealth_tax(wealth_start);
        let vat = policy.vat(income, persona.vat_rate, persona.vat_applicable_rate);
        let savings = income * persona.savings_rate;

        let (inheritance, inheritance_tax) = match &persona.inheritance {
            Some(event) if event.age == age => {
                let tax =
                    policy.inheritance_tax(&InheritedEstate::financial(event.amount), event.tax_class);
                (event.amount, tax)
            }
            _ => (0.0, 0.0),
        };

        // Inheritance lands before the growth step, so it compounds at
        // the wealth-growth rate in the year it arrives.
        total_wealth += inheritance - inheritance_tax;
        let wealth_growth = total_wealth * WEALTH_GROWTH_RATE;

        let net_wealth_income = wealth_income - wealth_income_tax;
        let contribution =
            savings + net_wealth_income - persona.yearly_spending_from_wealth - wealth_tax;
        total_wealth += wealth_growth + contribution;

        // VAT is levied on spending already counted here, so it is not
        // subtracted again.
        let spending_from_income = income - income_tax - savings;
        let total_spending = spending_from_income + persona.yearly_spending_from_wealth;

        acc.income += income;
        acc.income_tax += income_tax;
        acc.savings += savings;
        acc.wealth_growth += wealth_growth;
        acc.wealth_income += wealth_income;
        acc.wealth_income_tax += wealth_income_tax;
        acc.wealth_tax += wealth_tax;
        acc.inheritance += inheritance;
        acc.inheritance_tax += inheritance_tax;
        acc.vat += vat;
        acc.spending += total_spending;
        acc.spending_from_income += spending_from_income;
        acc.spending_from_wealth += persona.yearly_spending_from_wealth;

        details.push(YearResult {
            age,
            income: income.round() as i64,
            income_tax: income_tax.round() as i64,
            savings: savings.round() as i64,
            wealth: total_wealth.round() as i64,
            wealth_growth: wealth_growth.round() as i64,
            wealth_income: wealth_income.round() as i64,
            wealth_income_tax: wealth_income_tax.round() as i64,
            wealth_tax: wealth_tax.round() as i64,
            inheritance: inheritance.round() as i64,
            inheritance_tax: inheritance_tax.round() as i64,
            vat: vat.round() as i64,
            total_spending: total_spending.round() as i64,
            spending_from_income: spending_from_income.round() as i64,
        });

        previous_rounded_income = income.round();
    }

    Ok(SimulationResult {
        totals: acc.rounded(total_wealth),
        details,
    })
}
