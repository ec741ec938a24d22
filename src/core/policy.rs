use super::brackets::{
    self, Bracket, CapitalIncomeLevel, IncomeTaxLevel, WealthTaxLevel, marginal_tax,
};
use super::types::{InheritedEstate, TaxClass};

/// A named, swappable bundle of pure tax-computation rules. Every
/// function returns 0, never a negative amount, for non-positive bases;
/// the simulation engine treats any implementation uniformly.
pub trait TaxPolicy: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn description(&self) -> &str;

    fn income_tax(&self, income: f64) -> f64;
    fn wealth_tax(&self, wealth: f64) -> f64;
    fn wealth_income_tax(&self, capital_income: f64) -> f64;
    fn inheritance_tax(&self, estate: &InheritedEstate, tax_class: TaxClass) -> f64;
    fn vat(&self, income: f64, vat_rate: f64, vat_applicable_rate: f64) -> f64;
}

pub const STATUS_QUO_ID: &str = "status-quo";
pub const PROGRESSIVE_WEALTH_ID: &str = "progressive-wealth-tax";
pub const FLAT_TAX_ID: &str = "flat-tax";
pub const CUSTOM_ID: &str = "custom";

const INHERITANCE_EXEMPTION: f64 = 400_000.0;
// Standard relief on business assets; denied for hardship cases, which
// then inherit the full business value into the taxable base.
const BUSINESS_RELIEF: f64 = 0.85;

const FLAT_INCOME_EXEMPTION: f64 = 12_000.0;
const FLAT_INCOME_RATE: f64 = 0.25;
const FLAT_INHERITANCE_EXEMPTION: f64 = 500_000.0;
const FLAT_INHERITANCE_RATE: f64 = 0.20;
const FLAT_CAPITAL_RATE: f64 = 0.25;
const FLAT_VAT_RATE: f64 = 15.0;

const CAPITAL_FLAT_RATE: f64 = 0.26375;
const WEALTH_TAX_EXEMPTION: f64 = 1_000_000.0;

/// Statutory closed-form income schedule: a zero zone up to 12,096, two
/// quadratic progression bands, then linear 42% and 45% top bands. This
/// is the authoritative status-quo income tax; the linear-band table in
/// `brackets` is a chart-grade approximation of the same curve and must
/// never be substituted for it.
pub fn status_quo_income_tax(income: f64) -> f64 {
    if income <= 12_096.0 {
        0.0
    } else if income <= 17_443.0 {
        let y = (income - 12_096.0) / 10_000.0;
        (932.30 * y + 1_400.0) * y
    } else if income <= 68_480.0 {
        let z = (income - 17_443.0) / 10_000.0;
        (176.64 * z + 2_397.0) * z + 1_015.13
    } else if income <= 277_825.0 {
        0.42 * income - 10_911.92
    } else {
        0.45 * income - 19_246.67
    }
}

fn estate_taxable_base(estate: &InheritedEstate) -> f64 {
    let relief = if estate.hardship {
        0.0
    } else {
        BUSINESS_RELIEF
    };
    estate.housing_financial.max(0.0) + estate.business.max(0.0) * (1.0 - relief)
}

pub fn status_quo_inheritance_tax(estate: &InheritedEstate, tax_class: TaxClass) -> f64 {
    let taxable = estate_taxable_base(estate) - INHERITANCE_EXEMPTION;
    if taxable <= 0.0 {
        return 0.0;
    }
    let table = brackets::inheritance_tax_table(brackets::InheritanceTaxLevel::Current, tax_class);
    marginal_tax(taxable, &table)
}

/// VAT on the VAT-bearing share of consumption, extracted from gross
/// prices: `(income * applicable%) * rate / (100 + rate)`.
pub fn standard_vat(income: f64, vat_rate: f64, vat_applicable_rate: f64) -> f64 {
    if income <= 0.0 {
        return 0.0;
    }
    let consumption = income * (vat_applicable_rate.max(0.0) / 100.0);
    let rate = vat_rate.max(0.0);
    consumption * rate / (100.0 + rate)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StatusQuoPolicy;

impl TaxPolicy for StatusQuoPolicy {
    fn id(&self) -> &str {
        STATUS_QUO_ID
    }

    fn name(&self) -> &str {
        "Status quo"
    }

    fn description(&self) -> &str {
        "Current law: statutory progressive income tax, flat 26.375% capital income tax, \
         per-class inheritance schedule after a 400k exemption, no wealth tax"
    }

    fn income_tax(&self, income: f64) -> f64 {
        status_quo_income_tax(income)
    }

    fn wealth_tax(&self, _wealth: f64) -> f64 {
        0.0
    }

    fn wealth_income_tax(&self, capital_income: f64) -> f64 {
        if capital_income <= 0.0 {
            return 0.0;
        }
        capital_income * CAPITAL_FLAT_RATE
    }

    fn inheritance_tax(&self, estate: &InheritedEstate, tax_class: TaxClass) -> f64 {
        status_quo_inheritance_tax(estate, tax_class)
    }

    fn vat(&self, income: f64, vat_rate: f64, vat_applicable_rate: f64) -> f64 {
        standard_vat(income, vat_rate, vat_applicable_rate)
    }
}

/// Status quo plus a marginal wealth tax above a 1M exemption; capital
/// income loses its flat rate and is taxed as ordinary income.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressiveWealthTaxPolicy;

impl TaxPolicy for ProgressiveWealthTaxPolicy {
    fn id(&self) -> &str {
        PROGRESSIVE_WEALTH_ID
    }

    fn name(&self) -> &str {
        "Progressive wealth tax"
    }

    fn description(&self) -> &str {
        "Status-quo income, inheritance and VAT; wealth taxed marginally above a 1M exemption \
         (1% / 1.5% / 2%); capital income taxed as ordinary income"
    }

    fn income_tax(&self, income: f64) -> f64 {
        status_quo_income_tax(income)
    }

    fn wealth_tax(&self, wealth: f64) -> f64 {
        marginal_tax(wealth, brackets::WEALTH_TAX_PROGRESSIVE)
    }

    fn wealth_income_tax(&self, capital_income: f64) -> f64 {
        status_quo_income_tax(capital_income)
    }

    fn inheritance_tax(&self, estate: &InheritedEstate, tax_class: TaxClass) -> f64 {
        status_quo_inheritance_tax(estate, tax_class)
    }

    fn vat(&self, income: f64, vat_rate: f64, vat_applicable_rate: f64) -> f64 {
        standard_vat(income, vat_rate, vat_applicable_rate)
    }
}

/// Flat rates with exemptions everywhere; ignores the configured VAT
/// rate in favour of a fixed 15%. Tax class and asset composition do
/// not matter under the flat inheritance tax.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatTaxPolicy;

impl TaxPolicy for FlatTaxPolicy {
    fn id(&self) -> &str {
        FLAT_TAX_ID
    }

    fn name(&self) -> &str {
        "Flat tax"
    }

    fn description(&self) -> &str {
        "25% income tax above a 12k exemption, 20% inheritance tax above 500k, \
         25% capital income tax, flat 15% VAT, no wealth tax"
    }

    fn income_tax(&self, income: f64) -> f64 {
        ((income - FLAT_INCOME_EXEMPTION).max(0.0)) * FLAT_INCOME_RATE
    }

    fn wealth_tax(&self, _wealth: f64) -> f64 {
        0.0
    }

    fn wealth_income_tax(&self, capital_income: f64) -> f64 {
        capital_income.max(0.0) * FLAT_CAPITAL_RATE
    }

    fn inheritance_tax(&self, estate: &InheritedEstate, _tax_class: TaxClass) -> f64 {
        let total = estate.housing_financial.max(0.0) + estate.business.max(0.0);
        ((total - FLAT_INHERITANCE_EXEMPTION).max(0.0)) * FLAT_INHERITANCE_RATE
    }

    fn vat(&self, income: f64, _vat_rate: f64, vat_applicable_rate: f64) -> f64 {
        standard_vat(income, FLAT_VAT_RATE, vat_applicable_rate)
    }
}

/// Runtime-assembled policy over the generic bracket evaluator, one
/// selectable level per tax type. Inheritance always delegates to the
/// status-quo schedule.
#[derive(Debug, Clone)]
pub struct CustomPolicy {
    income_level: IncomeTaxLevel,
    capital_level: CapitalIncomeLevel,
    wealth_level: WealthTaxLevel,
    description: String,
}

impl CustomPolicy {
    pub fn builder() -> CustomPolicyBuilder {
        CustomPolicyBuilder::default()
    }

    pub fn income_level(&self) -> IncomeTaxLevel {
        self.income_level
    }

    pub fn capital_level(&self) -> CapitalIncomeLevel {
        self.capital_level
    }

    pub fn wealth_level(&self) -> WealthTaxLevel {
        self.wealth_level
    }
}

#[derive(Debug, Clone)]
pub struct CustomPolicyBuilder {
    income_level: IncomeTaxLevel,
    capital_level: CapitalIncomeLevel,
    wealth_level: WealthTaxLevel,
}

impl Default for CustomPolicyBuilder {
    fn default() -> Self {
        Self {
            income_level: IncomeTaxLevel::SimplifiedCurrent,
            capital_level: CapitalIncomeLevel::StatusQuo,
            wealth_level: WealthTaxLevel::None,
        }
    }
}

impl CustomPolicyBuilder {
    pub fn income(mut self, level: IncomeTaxLevel) -> Self {
        self.income_level = level;
        self
    }

    pub fn capital_income(mut self, level: CapitalIncomeLevel) -> Self {
        self.capital_level = level;
        self
    }

    pub fn wealth(mut self, level: WealthTaxLevel) -> Self {
        self.wealth_level = level;
        self
    }

    pub fn build(self) -> CustomPolicy {
        let description = format!(
            "Custom policy: income {:?}, capital income {:?}, wealth tax {:?}, \
             status-quo inheritance tax",
            self.income_level, self.capital_level, self.wealth_level
        );
        CustomPolicy {
            income_level: self.income_level,
            capital_level: self.capital_level,
            wealth_level: self.wealth_level,
            description,
        }
    }
}

impl TaxPolicy for CustomPolicy {
    fn id(&self) -> &str {
        CUSTOM_ID
    }

    fn name(&self) -> &str {
        "Custom"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn income_tax(&self, income: f64) -> f64 {
        marginal_tax(income, brackets::income_tax_table(self.income_level))
    }

    fn wealth_tax(&self, wealth: f64) -> f64 {
        let table: &[Bracket] = match self.wealth_level {
            WealthTaxLevel::None => return 0.0,
            WealthTaxLevel::Progressive => brackets::WEALTH_TAX_PROGRESSIVE,
        };
        marginal_tax(wealth, table)
    }

    fn wealth_income_tax(&self, capital_income: f64) -> f64 {
        marginal_tax(
            capital_income,
            brackets::capital_income_table(self.capital_level),
        )
    }

    fn inheritance_tax(&self, estate: &InheritedEstate, tax_class: TaxClass) -> f64 {
        status_quo_inheritance_tax(estate, tax_class)
    }

    fn vat(&self, income: f64, vat_rate: f64, vat_applicable_rate: f64) -> f64 {
        standard_vat(income, vat_rate, vat_applicable_rate)
    }
}

pub fn all_policies() -> Vec<Box<dyn TaxPolicy>> {
    vec![
        Box::new(StatusQuoPolicy),
        Box::new(ProgressiveWealthTaxPolicy),
        Box::new(FlatTaxPolicy),
        Box::new(CustomPolicy::builder().build()),
    ]
}

pub fn policy_by_id(id: &str) -> Option<Box<dyn TaxPolicy>> {
    match id {
        STATUS_QUO_ID => Some(Box::new(StatusQuoPolicy)),
        PROGRESSIVE_WEALTH_ID => Some(Box::new(ProgressiveWealthTaxPolicy)),
        FLAT_TAX_ID => Some(Box::new(FlatTaxPolicy)),
        CUSTOM_ID => Some(Box::new(CustomPolicy::builder().build())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn policies() -> Vec<Box<dyn TaxPolicy>> {
        all_policies()
    }

    #[test]
    fn status_quo_income_tax_matches_statutory_points() {
        assert_approx_tol(status_quo_income_tax(0.0), 0.0, 1e-9);
        assert_approx_tol(status_quo_income_tax(12_096.0), 0.0, 1e-9);
        assert_approx_tol(status_quo_income_tax(50_000.0), 10_691.3, 0.5);
        assert_approx_tol(status_quo_income_tax(51_000.0), 11_047.8, 0.5);
        // linear top bands
        assert_approx_tol(status_quo_income_tax(100_000.0), 31_088.08, 0.01);
        assert_approx_tol(status_quo_income_tax(300_000.0), 115_753.33, 0.01);
    }

    #[test]
    fn status_quo_income_tax_is_continuous_at_band_edges() {
        for edge in [12_096.0, 17_443.0, 68_480.0, 277_825.0] {
            let below = status_quo_income_tax(edge);
            let above = status_quo_income_tax(edge + 1.0);
            assert!(above >= below);
            assert!(above - below <= 1.0);
        }
    }

    #[test]
    fn simplified_table_is_not_the_statutory_formula() {
        let table = brackets::income_tax_table(IncomeTaxLevel::SimplifiedCurrent);
        let approximate = marginal_tax(50_000.0, table);
        let statutory = status_quo_income_tax(50_000.0);
        assert!((approximate - statutory).abs() > 1.0);
    }

    #[test]
    fn status_quo_vat_extracts_rate_from_gross_prices() {
        assert_approx_tol(standard_vat(50_000.0, 19.0, 70.0), 5_588.24, 0.01);
        assert_approx_tol(standard_vat(51_000.0, 19.0, 70.0), 5_700.0, 0.01);
        assert_approx_tol(standard_vat(0.0, 19.0, 70.0), 0.0, 1e-9);
        assert_approx_tol(standard_vat(-10.0, 19.0, 70.0), 0.0, 1e-9);
    }

    #[test]
    fn status_quo_inheritance_applies_exemption_then_class_schedule() {
        let estate = InheritedEstate::financial(500_000.0);
        // 100k taxable: 75k at 7%, 25k at 11%
        assert_approx_tol(
            status_quo_inheritance_tax(&estate, TaxClass::One),
            8_000.0,
            1e-6,
        );
        // class three taxes the whole first band at 30%
        assert_approx_tol(
            status_quo_inheritance_tax(&estate, TaxClass::Three),
            30_000.0,
            1e-6,
        );

        let exempt = InheritedEstate::financial(400_000.0);
        assert_approx_tol(status_quo_inheritance_tax(&exempt, TaxClass::One), 0.0, 1e-9);
    }

    #[test]
    fn business_assets_get_relief_unless_hardship() {
        let relieved = InheritedEstate {
            housing_financial: 0.0,
            business: 1_000_000.0,
            hardship: false,
        };
        let hardship = InheritedEstate {
            housing_financial: 0.0,
            business: 1_000_000.0,
            hardship: true,
        };
        // 15% of 1M is below the 400k exemption
        assert_approx_tol(
            status_quo_inheritance_tax(&relieved, TaxClass::One),
            0.0,
            1e-9,
        );
        assert!(status_quo_inheritance_tax(&hardship, TaxClass::One) > 0.0);
    }

    #[test]
    fn flat_tax_exemptions_shift_the_schedule() {
        let policy = FlatTaxPolicy;
        assert_approx_tol(policy.income_tax(12_000.0), 0.0, 1e-9);
        assert_approx_tol(policy.income_tax(52_000.0), 10_000.0, 1e-6);
        assert_approx_tol(
            policy.inheritance_tax(&InheritedEstate::financial(500_000.0), TaxClass::Three),
            0.0,
            1e-9,
        );
        assert_approx_tol(
            policy.inheritance_tax(&InheritedEstate::financial(600_000.0), TaxClass::Three),
            20_000.0,
            1e-6,
        );
        assert_approx_tol(policy.wealth_income_tax(1_000.0), 250.0, 1e-9);
    }

    #[test]
    fn flat_tax_vat_ignores_configured_rate() {
        let policy = FlatTaxPolicy;
        let fifteen = policy.vat(50_000.0, 19.0, 70.0);
        assert_approx_tol(fifteen, 35_000.0 * 15.0 / 115.0, 1e-6);
        assert_approx_tol(policy.vat(50_000.0, 7.0, 70.0), fifteen, 1e-9);
    }

    #[test]
    fn progressive_wealth_policy_taxes_wealth_and_ordinary_capital_income() {
        let policy = ProgressiveWealthTaxPolicy;
        assert_approx_tol(policy.wealth_tax(500_000.0), 0.0, 1e-9);
        assert_approx_tol(policy.wealth_tax(2_000_000.0), 10_000.0, 1e-6);
        assert_approx_tol(
            policy.wealth_income_tax(50_000.0),
            status_quo_income_tax(50_000.0),
            1e-9,
        );
        // below the basic allowance capital income is untaxed, unlike
        // the status-quo flat rate
        assert_approx_tol(policy.wealth_income_tax(10_000.0), 0.0, 1e-9);
        assert!(StatusQuoPolicy.wealth_income_tax(10_000.0) > 0.0);
    }

    #[test]
    fn custom_policy_builder_selects_levels_and_delegates_inheritance() {
        let policy = CustomPolicy::builder()
            .income(IncomeTaxLevel::Adenauer)
            .capital_income(CapitalIncomeLevel::Higher)
            .wealth(WealthTaxLevel::Progressive)
            .build();

        assert_eq!(policy.id(), CUSTOM_ID);
        assert_approx_tol(
            policy.income_tax(50_000.0),
            marginal_tax(
                50_000.0,
                brackets::income_tax_table(IncomeTaxLevel::Adenauer),
            ),
            1e-9,
        );
        assert_approx_tol(policy.wealth_income_tax(1_000.0), 350.0, 1e-9);
        assert_approx_tol(policy.wealth_tax(2_000_000.0), 10_000.0, 1e-6);
        assert_approx_tol(
            policy.inheritance_tax(&InheritedEstate::financial(500_000.0), TaxClass::One),
            8_000.0,
            1e-6,
        );
    }

    #[test]
    fn registry_resolves_every_listed_policy() {
        for policy in all_policies() {
            let resolved = policy_by_id(policy.id()).expect("listed policy must resolve");
            assert_eq!(resolved.id(), policy.id());
            assert!(!policy.name().is_empty());
            assert!(!policy.description().is_empty());
        }
        assert!(policy_by_id("no-such-policy").is_none());
    }

    proptest! {
        #[test]
        fn prop_no_policy_returns_negative_tax(
            income in -100_000i64..5_000_000,
            wealth in -1_000_000i64..200_000_000,
            capital_income in -50_000i64..2_000_000,
            estate in 0i64..50_000_000,
            vat_rate in 0u32..40,
            applicable in 0u32..101
        ) {
            let income = income as f64;
            let wealth = wealth as f64;
            let capital_income = capital_income as f64;
            let estate = InheritedEstate::financial(estate as f64);

            for policy in policies() {
                prop_assert!(policy.income_tax(income) >= 0.0);
                prop_assert!(policy.wealth_tax(wealth) >= 0.0);
                prop_assert!(policy.wealth_income_tax(capital_income) >= 0.0);
                for class in [TaxClass::One, TaxClass::Two, TaxClass::Three] {
                    prop_assert!(policy.inheritance_tax(&estate, class) >= 0.0);
                }
                prop_assert!(policy.vat(income, vat_rate as f64, applicable as f64) >= 0.0);
            }
        }
    }

    proptest! {
        #[test]
        fn prop_status_quo_income_tax_is_monotone_and_below_top_rate(
            income in 0u64..2_000_000,
            delta in 1u64..100_000
        ) {
            let at = status_quo_income_tax(income as f64);
            let above = status_quo_income_tax((income + delta) as f64);
            prop_assert!(above + 1e-9 >= at);
            prop_assert!(at <= 0.45 * income as f64 + 1e-9);
        }
    }
}
