use serde::Serialize;

use super::engine::{ValidationFailure, run_simulation};
use super::policy::{STATUS_QUO_ID, StatusQuoPolicy, TaxPolicy};
use super::types::{Persona, Totals};

/// Per-field difference of a scenario's aggregated totals against the
/// status-quo baseline on the same personas. `percent` is absent when
/// the baseline value is zero.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldDelta {
    pub field: &'static str,
    pub baseline: i64,
    pub scenario: i64,
    pub absolute: i64,
    pub percent: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioRun {
    pub policy_id: String,
    pub policy_name: String,
    pub totals: Totals,
    /// `None` for the baseline policy itself.
    pub baseline_delta: Option<Vec<FieldDelta>>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioComparison {
    pub personas: usize,
    pub baseline: Totals,
    pub scenarios: Vec<ScenarioRun>,
}

fn totals_fields(totals: &Totals) -> [(&'static str, i64); 14] {
    [
        ("totalIncome", totals.total_income),
        ("totalIncomeTax", totals.total_income_tax),
        ("totalSavings", totals.total_savings),
        ("totalWealthGrowth", totals.total_wealth_growth),
        ("totalWealthIncome", totals.total_wealth_income),
        ("totalWealthIncomeTax", totals.total_wealth_income_tax),
        ("totalWealthTax", totals.total_wealth_tax),
        ("totalInheritance", totals.total_inheritance),
        ("totalInheritanceTax", totals.total_inheritance_tax),
        ("totalVat", totals.total_vat),
        ("totalSpending", totals.total_spending),
        ("totalSpendingFromIncome", totals.total_spending_from_income),
        ("totalSpendingFromWealth", totals.total_spending_from_wealth),
        ("finalWealth", totals.final_wealth),
    ]
}

/// Weighted field-wise sum across a persona population, rounded once.
fn aggregate_totals(runs: &[Totals], weights: Option<&[f64]>) -> Totals {
    let weight_at = |index: usize| -> f64 {
        weights
            .and_then(|w| w.get(index))
            .copied()
            .unwrap_or(1.0)
            .max(0.0)
    };

    let mut sums = [0.0_f64; 14];
    for (index, totals) in runs.iter().enumerate() {
        let weight = weight_at(index);
        for (slot, (_, value)) in sums.iter_mut().zip(totals_fields(totals)) {
            *slot += value as f64 * weight;
        }
    }

    Totals {
        total_income: sums[0].round() as i64,
        total_income_tax: sums[1].round() as i64,
        total_savings: sums[2].round() as i64,
        total_wealth_growth: sums[3].round() as i64,
        total_wealth_income: sums[4].round() as i64,
        total_wealth_income_tax: sums[5].round() as i64,
        total_wealth_tax: sums[6].round() as i64,
        total_inheritance: sums[7].round() as i64,
        total_inheritance_tax: sums[8].round() as i64,
        total_vat: sums[9].round() as i64,
        total_spending: sums[10].round() as i64,
        total_spending_from_income: sums[11].round() as i64,
        total_spending_from_wealth: sums[12].round() as i64,
        final_wealth: sums[13].round() as i64,
    }
}

fn delta_against(baseline: &Totals, scenario: &Totals) -> Vec<FieldDelta> {
    totals_fields(baseline)
        .into_iter()
        .zip(totals_fields(scenario))
        .map(|((field, base), (_, value))| {
            let absolute = value - base;
            let percent = if base != 0 {
                Some(absolute as f64 / base as f64 * 100.0)
            } else {
                None
            };
            FieldDelta {
                field,
                baseline: base,
                scenario: value,
                absolute,
                percent,
            }
        })
        .collect()
}

fn run_population(
    policy: &dyn TaxPolicy,
    personas: &[Persona],
    weights: Option<&[f64]>,
) -> Result<Totals, ValidationFailure> {
    let mut runs = Vec::with_capacity(personas.len());
    for persona in personas {
        runs.push(run_simulation(persona, policy)?.totals);
    }
    Ok(aggregate_totals(&runs, weights))
}

/// Runs every policy once per persona, aggregates across the population
/// (optionally weighted by a population-size scale factor per persona),
/// and reports each non-baseline policy's totals as signed and
/// percentage differences against a status-quo baseline computed fresh
/// on the same personas.
pub fn run_scenarios(
    policies: &[&dyn TaxPolicy],
    personas: &[Persona],
    weights: Option<&[f64]>,
) -> Result<ScenarioComparison, ValidationFailure> {
    // baseline is recomputed per call, never cached across calls
    let baseline = run_population(&StatusQuoPolicy, personas, weights)?;

    let mut scenarios = Vec::with_capacity(policies.len());
    for policy in policies {
        let totals = run_population(*policy, personas, weights)?;
        let baseline_delta = if policy.id() == STATUS_QUO_ID {
            None
        } else {
            Some(delta_against(&baseline, &totals))
        };
        scenarios.push(ScenarioRun {
            policy_id: policy.id().to_string(),
            policy_name: policy.name().to_string(),
            totals,
            baseline_delta,
        });
    }

    Ok(ScenarioComparison {
        personas: personas.len(),
        baseline,
        scenarios,
    })
}
