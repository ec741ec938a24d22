use super::types::TaxClass;

/// One band of a progressive schedule. The last band of every table has
/// `upper_limit == f64::INFINITY`, so the table partitions `[0, inf)`
/// without gaps or overlaps.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bracket {
    pub upper_limit: f64,
    pub rate: f64,
}

const fn bracket(upper_limit: f64, rate: f64) -> Bracket {
    Bracket { upper_limit, rate }
}

/// Marginal-bracket evaluation: each band taxes only the slice of
/// `amount` that falls inside it. Returns 0 for non-positive amounts.
pub fn marginal_tax(amount: f64, brackets: &[Bracket]) -> f64 {
    if amount <= 0.0 {
        return 0.0;
    }

    let mut tax = 0.0;
    let mut previous_limit = 0.0;
    for b in brackets {
        let slice = amount.min(b.upper_limit) - previous_limit;
        tax += slice * b.rate;
        if amount <= b.upper_limit {
            break;
        }
        previous_limit = b.upper_limit;
    }
    tax
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum IncomeTaxLevel {
    Lower,
    /// Linear-band approximation of the statutory schedule, suitable for
    /// illustrative charts only. The authoritative status-quo income tax
    /// is the closed-form formula in `policy::status_quo_income_tax`;
    /// the two disagree slightly and are never interchangeable.
    SimplifiedCurrent,
    Adenauer,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InheritanceTaxLevel {
    Lower,
    Current,
    Higher,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CapitalIncomeLevel {
    StatusQuo,
    Lower,
    Higher,
    Highest,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WealthTaxLevel {
    None,
    Progressive,
}

const INCOME_TAX_LOWER: &[Bracket] = &[
    bracket(12_096.0, 0.0),
    bracket(30_000.0, 0.10),
    bracket(68_480.0, 0.20),
    bracket(277_825.0, 0.32),
    bracket(f64::INFINITY, 0.38),
];

const INCOME_TAX_SIMPLIFIED_CURRENT: &[Bracket] = &[
    bracket(12_096.0, 0.0),
    bracket(17_443.0, 0.16),
    bracket(68_480.0, 0.30),
    bracket(277_825.0, 0.42),
    bracket(f64::INFINITY, 0.45),
];

const INCOME_TAX_ADENAUER: &[Bracket] = &[
    bracket(12_096.0, 0.0),
    bracket(30_000.0, 0.20),
    bracket(68_480.0, 0.38),
    bracket(150_000.0, 0.50),
    bracket(277_825.0, 0.56),
    bracket(f64::INFINITY, 0.63),
];

pub fn income_tax_table(level: IncomeTaxLevel) -> &'static [Bracket] {
    match level {
        IncomeTaxLevel::Lower => INCOME_TAX_LOWER,
        IncomeTaxLevel::SimplifiedCurrent => INCOME_TAX_SIMPLIFIED_CURRENT,
        IncomeTaxLevel::Adenauer => INCOME_TAX_ADENAUER,
    }
}

const INHERITANCE_CLASS_ONE: &[Bracket] = &[
    bracket(75_000.0, 0.07),
    bracket(300_000.0, 0.11),
    bracket(600_000.0, 0.15),
    bracket(6_000_000.0, 0.19),
    bracket(13_000_000.0, 0.23),
    bracket(26_000_000.0, 0.27),
    bracket(f64::INFINITY, 0.30),
];

const INHERITANCE_CLASS_TWO: &[Bracket] = &[
    bracket(75_000.0, 0.15),
    bracket(300_000.0, 0.20),
    bracket(600_000.0, 0.25),
    bracket(6_000_000.0, 0.30),
    bracket(13_000_000.0, 0.35),
    bracket(26_000_000.0, 0.40),
    bracket(f64::INFINITY, 0.43),
];

const INHERITANCE_CLASS_THREE: &[Bracket] = &[
    bracket(75_000.0, 0.30),
    bracket(300_000.0, 0.30),
    bracket(600_000.0, 0.30),
    bracket(6_000_000.0, 0.30),
    bracket(13_000_000.0, 0.50),
    bracket(26_000_000.0, 0.50),
    bracket(f64::INFINITY, 0.50),
];

/// Statutory-style per-class schedule, scaled down at the `Lower` level
/// and shifted up by ten points at the `Higher` level.
pub fn inheritance_tax_table(level: InheritanceTaxLevel, class: TaxClass) -> Vec<Bracket> {
    let base = match class {
        TaxClass::One => INHERITANCE_CLASS_ONE,
        TaxClass::Two => INHERITANCE_CLASS_TWO,
        TaxClass::Three => INHERITANCE_CLASS_THREE,
    };
    base.iter()
        .map(|b| {
            let rate = match level {
                InheritanceTaxLevel::Lower => b.rate * 0.5,
                InheritanceTaxLevel::Current => b.rate,
                InheritanceTaxLevel::Higher => (b.rate + 0.10).min(0.60),
            };
            bracket(b.upper_limit, rate)
        })
        .collect()
}

const CAPITAL_INCOME_STATUS_QUO: &[Bracket] = &[bracket(f64::INFINITY, 0.26375)];
const CAPITAL_INCOME_LOWER: &[Bracket] = &[bracket(f64::INFINITY, 0.15)];
const CAPITAL_INCOME_HIGHER: &[Bracket] = &[bracket(f64::INFINITY, 0.35)];
const CAPITAL_INCOME_HIGHEST: &[Bracket] = &[bracket(f64::INFINITY, 0.45)];

pub fn capital_income_table(level: CapitalIncomeLevel) -> &'static [Bracket] {
    match level {
        CapitalIncomeLevel::StatusQuo => CAPITAL_INCOME_STATUS_QUO,
        CapitalIncomeLevel::Lower => CAPITAL_INCOME_LOWER,
        CapitalIncomeLevel::Higher => CAPITAL_INCOME_HIGHER,
        CapitalIncomeLevel::Highest => CAPITAL_INCOME_HIGHEST,
    }
}

/// Progressive wealth tax over raw wealth: 1,000,000 exempt, then 1% on
/// the next 10M, 1.5% up to 100M over the exemption, 2% beyond.
pub const WEALTH_TAX_PROGRESSIVE: &[Bracket] = &[
    bracket(1_000_000.0, 0.0),
    bracket(11_000_000.0, 0.01),
    bracket(101_000_000.0, 0.015),
    bracket(f64::INFINITY, 0.02),
];

/// Effective VAT burden, as a single rate on the VAT-bearing share of
/// consumption (19% gross-price equivalent).
pub const VAT_EQUIVALENT: &[Bracket] = &[bracket(f64::INFINITY, 19.0 / 119.0)];

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn named_tables() -> Vec<(&'static str, Vec<Bracket>)> {
        let mut tables = vec![
            ("income-lower", INCOME_TAX_LOWER.to_vec()),
            (
                "income-simplified-current",
                INCOME_TAX_SIMPLIFIED_CURRENT.to_vec(),
            ),
            ("income-adenauer", INCOME_TAX_ADENAUER.to_vec()),
            ("capital-status-quo", CAPITAL_INCOME_STATUS_QUO.to_vec()),
            ("capital-lower", CAPITAL_INCOME_LOWER.to_vec()),
            ("capital-higher", CAPITAL_INCOME_HIGHER.to_vec()),
            ("capital-highest", CAPITAL_INCOME_HIGHEST.to_vec()),
            ("wealth-progressive", WEALTH_TAX_PROGRESSIVE.to_vec()),
            ("vat-equivalent", VAT_EQUIVALENT.to_vec()),
        ];
        for level in [
            InheritanceTaxLevel::Lower,
            InheritanceTaxLevel::Current,
            InheritanceTaxLevel::Higher,
        ] {
            for class in [TaxClass::One, TaxClass::Two, TaxClass::Three] {
                tables.push(("inheritance", inheritance_tax_table(level, class)));
            }
        }
        tables
    }

    #[test]
    fn marginal_tax_taxes_each_slice_at_its_band_rate() {
        let table = [
            bracket(10_000.0, 0.0),
            bracket(20_000.0, 0.10),
            bracket(f64::INFINITY, 0.25),
        ];

        assert_approx(marginal_tax(5_000.0, &table), 0.0);
        assert_approx(marginal_tax(15_000.0, &table), 500.0);
        assert_approx(marginal_tax(20_000.0, &table), 1_000.0);
        assert_approx(marginal_tax(30_000.0, &table), 3_500.0);
    }

    #[test]
    fn marginal_tax_is_zero_for_non_positive_amounts() {
        for (_, table) in named_tables() {
            assert_approx(marginal_tax(0.0, &table), 0.0);
            assert_approx(marginal_tax(-5_000.0, &table), 0.0);
        }
    }

    #[test]
    fn every_named_table_terminates_with_infinity_and_increasing_limits() {
        for (name, table) in named_tables() {
            assert!(!table.is_empty(), "{name} is empty");
            let mut previous = 0.0;
            for b in &table {
                assert!(b.upper_limit > previous, "{name} limits must increase");
                assert!((0.0..=1.0).contains(&b.rate), "{name} rate out of range");
                previous = b.upper_limit;
            }
            assert!(
                table.last().unwrap().upper_limit.is_infinite(),
                "{name} must cover [0, inf)"
            );
        }
    }

    #[test]
    fn progressive_wealth_table_matches_hand_calculation() {
        assert_approx(marginal_tax(1_000_000.0, WEALTH_TAX_PROGRESSIVE), 0.0);
        assert_approx(marginal_tax(2_000_000.0, WEALTH_TAX_PROGRESSIVE), 10_000.0);
        // 10M at 1%, 9M at 1.5%
        assert_approx(marginal_tax(20_000_000.0, WEALTH_TAX_PROGRESSIVE), 235_000.0);
        // 10M at 1%, 90M at 1.5%, 19M at 2%
        assert_approx(
            marginal_tax(120_000_000.0, WEALTH_TAX_PROGRESSIVE),
            1_830_000.0,
        );
    }

    #[test]
    fn inheritance_class_one_matches_hand_calculation() {
        let table = inheritance_tax_table(InheritanceTaxLevel::Current, TaxClass::One);
        // 75k at 7%, 25k at 11%
        assert_approx(marginal_tax(100_000.0, &table), 8_000.0);
    }

    #[test]
    fn inheritance_levels_order_rates() {
        for class in [TaxClass::One, TaxClass::Two, TaxClass::Three] {
            let lower = inheritance_tax_table(InheritanceTaxLevel::Lower, class);
            let current = inheritance_tax_table(InheritanceTaxLevel::Current, class);
            let higher = inheritance_tax_table(InheritanceTaxLevel::Higher, class);
            for amount in [50_000.0, 500_000.0, 10_000_000.0, 50_000_000.0] {
                let l = marginal_tax(amount, &lower);
                let c = marginal_tax(amount, &current);
                let h = marginal_tax(amount, &higher);
                assert!(l <= c && c <= h);
            }
        }
    }

    proptest! {
        #[test]
        fn prop_marginal_tax_is_non_negative_and_non_decreasing(
            amount in 0u64..2_000_000_000,
            delta in 0u64..10_000_000
        ) {
            let amount = amount as f64;
            let delta = delta as f64;
            for (name, table) in named_tables() {
                let at = marginal_tax(amount, &table);
                let above = marginal_tax(amount + delta, &table);
                prop_assert!(at >= 0.0, "{} negative at {}", name, amount);
                prop_assert!(above + 1e-9 >= at, "{} decreasing at {}", name, amount);
                // marginal rates never exceed 100%, so the function is
                // 1-Lipschitz and in particular continuous
                prop_assert!(above - at <= delta + 1e-6);
            }
        }
    }
}
