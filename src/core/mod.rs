mod brackets;
mod compare;
mod engine;
mod policy;
mod types;

pub use brackets::{
    Bracket, CapitalIncomeLevel, IncomeTaxLevel, InheritanceTaxLevel, VAT_EQUIVALENT,
    WEALTH_TAX_PROGRESSIVE, WealthTaxLevel, capital_income_table, income_tax_table,
    inheritance_tax_table, marginal_tax,
};
pub use compare::{FieldDelta, ScenarioComparison, ScenarioRun, run_scenarios};
pub use engine::{
    RETIREMENT_AGE, ValidationError, ValidationFailure, run_simulation, validate,
};
pub use policy::{
    CUSTOM_ID, CustomPolicy, CustomPolicyBuilder, FLAT_TAX_ID, FlatTaxPolicy,
    PROGRESSIVE_WEALTH_ID, ProgressiveWealthTaxPolicy, STATUS_QUO_ID, StatusQuoPolicy, TaxPolicy,
    all_policies, policy_by_id, status_quo_income_tax, status_quo_inheritance_tax, standard_vat,
};
pub use types::{
    IncomeGrowth, InheritanceEvent, InheritedEstate, Persona, SimulationResult, TaxClass, Totals,
    YearResult, YearlyOverride,
};
