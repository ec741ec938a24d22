use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

use crate::core::{
    CapitalIncomeLevel, CustomPolicy, IncomeGrowth, IncomeTaxLevel, InheritanceEvent, Persona,
    SimulationResult, TaxClass, TaxPolicy, ValidationFailure, WealthTaxLevel, YearlyOverride,
    all_policies, run_scenarios, run_simulation,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliTaxPolicy {
    StatusQuo,
    ProgressiveWealthTax,
    FlatTax,
    Custom,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliIncomeTaxLevel {
    Lower,
    SimplifiedCurrent,
    Adenauer,
}

impl From<CliIncomeTaxLevel> for IncomeTaxLevel {
    fn from(value: CliIncomeTaxLevel) -> Self {
        match value {
            CliIncomeTaxLevel::Lower => IncomeTaxLevel::Lower,
            CliIncomeTaxLevel::SimplifiedCurrent => IncomeTaxLevel::SimplifiedCurrent,
            CliIncomeTaxLevel::Adenauer => IncomeTaxLevel::Adenauer,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliCapitalIncomeLevel {
    StatusQuo,
    Lower,
    Higher,
    Highest,
}

impl From<CliCapitalIncomeLevel> for CapitalIncomeLevel {
    fn from(value: CliCapitalIncomeLevel) -> Self {
        match value {
            CliCapitalIncomeLevel::StatusQuo => CapitalIncomeLevel::StatusQuo,
            CliCapitalIncomeLevel::Lower => CapitalIncomeLevel::Lower,
            CliCapitalIncomeLevel::Higher => CapitalIncomeLevel::Higher,
            CliCapitalIncomeLevel::Highest => CapitalIncomeLevel::Highest,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliWealthTaxLevel {
    None,
    Progressive,
}

impl From<CliWealthTaxLevel> for WealthTaxLevel {
    fn from(value: CliWealthTaxLevel) -> Self {
        match value {
            CliWealthTaxLevel::None => WealthTaxLevel::None,
            CliWealthTaxLevel::Progressive => WealthTaxLevel::Progressive,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
enum ApiTaxPolicy {
    #[serde(alias = "statusQuo", alias = "status_quo")]
    StatusQuo,
    #[serde(alias = "progressiveWealthTax", alias = "progressive_wealth_tax")]
    ProgressiveWealthTax,
    #[serde(alias = "flatTax", alias = "flat_tax")]
    FlatTax,
    Custom,
}

impl From<ApiTaxPolicy> for CliTaxPolicy {
    fn from(value: ApiTaxPolicy) -> Self {
        match value {
            ApiTaxPolicy::StatusQuo => CliTaxPolicy::StatusQuo,
            ApiTaxPolicy::ProgressiveWealthTax => CliTaxPolicy::ProgressiveWealthTax,
            ApiTaxPolicy::FlatTax => CliTaxPolicy::FlatTax,
            ApiTaxPolicy::Custom => CliTaxPolicy::Custom,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiIncomeTaxLevel {
    Lower,
    #[serde(alias = "simplifiedCurrent", alias = "current")]
    SimplifiedCurrent,
    Adenauer,
}

impl From<ApiIncomeTaxLevel> for CliIncomeTaxLevel {
    fn from(value: ApiIncomeTaxLevel) -> Self {
        match value {
            ApiIncomeTaxLevel::Lower => CliIncomeTaxLevel::Lower,
            ApiIncomeTaxLevel::SimplifiedCurrent => CliIncomeTaxLevel::SimplifiedCurrent,
            ApiIncomeTaxLevel::Adenauer => CliIncomeTaxLevel::Adenauer,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiCapitalIncomeLevel {
    #[serde(alias = "statusQuo", alias = "status_quo")]
    StatusQuo,
    Lower,
    Higher,
    Highest,
}

impl From<ApiCapitalIncomeLevel> for CliCapitalIncomeLevel {
    fn from(value: ApiCapitalIncomeLevel) -> Self {
        match value {
            ApiCapitalIncomeLevel::StatusQuo => CliCapitalIncomeLevel::StatusQuo,
            ApiCapitalIncomeLevel::Lower => CliCapitalIncomeLevel::Lower,
            ApiCapitalIncomeLevel::Higher => CliCapitalIncomeLevel::Higher,
            ApiCapitalIncomeLevel::Highest => CliCapitalIncomeLevel::Highest,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiWealthTaxLevel {
    None,
    Progressive,
}

impl From<ApiWealthTaxLevel> for CliWealthTaxLevel {
    fn from(value: ApiWealthTaxLevel) -> Self {
        match value {
            ApiWealthTaxLevel::None => CliWealthTaxLevel::None,
            ApiWealthTaxLevel::Progressive => CliWealthTaxLevel::Progressive,
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct OverridePayload {
    age: Option<u32>,
    income: Option<f64>,
    wealth: Option<f64>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    current_income: Option<f64>,
    current_age: Option<u32>,
    initial_age: Option<u32>,
    current_wealth: Option<f64>,
    /// Fraction of income saved, 0 to 1.
    savings_rate: Option<f64>,
    /// Annual income compounding factor, e.g. 1.02.
    income_growth_factor: Option<f64>,

    inheritance_age: Option<u32>,
    inheritance_amount: Option<f64>,
    inheritance_tax_class: Option<u8>,

    yearly_spending_from_wealth: Option<f64>,
    vat_rate: Option<f64>,
    vat_applicable_rate: Option<f64>,

    tax_policy: Option<ApiTaxPolicy>,
    custom_income_level: Option<ApiIncomeTaxLevel>,
    custom_capital_income_level: Option<ApiCapitalIncomeLevel>,
    custom_wealth_tax_level: Option<ApiWealthTaxLevel>,

    yearly_overrides: Option<Vec<OverridePayload>>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ComparePayload {
    personas: Vec<SimulatePayload>,
    policies: Option<Vec<ApiTaxPolicy>>,
    /// Population-size scale factor per persona, parallel to `personas`.
    weights: Option<Vec<f64>>,
    custom_income_level: Option<ApiIncomeTaxLevel>,
    custom_capital_income_level: Option<ApiCapitalIncomeLevel>,
    custom_wealth_tax_level: Option<ApiWealthTaxLevel>,
}

#[derive(Parser, Debug)]
#[command(
    name = "taxsim",
    about = "Multi-year household tax and wealth projection under swappable tax policies"
)]
struct Cli {
    #[arg(long)]
    current_income: f64,
    #[arg(long)]
    current_age: u32,
    #[arg(long, default_value_t = 20, help = "Age the projection starts from")]
    initial_age: u32,
    #[arg(long, default_value_t = 0.0)]
    current_wealth: f64,
    #[arg(
        long,
        default_value_t = 20.0,
        help = "Share of income saved each year, in percent"
    )]
    savings_rate: f64,
    #[arg(
        long,
        default_value_t = 2.0,
        help = "Annual income growth in percent, compounded"
    )]
    income_growth_rate: f64,
    #[arg(long, help = "Age at which the inheritance is received")]
    inheritance_age: Option<u32>,
    #[arg(long, default_value_t = 0.0)]
    inheritance_amount: f64,
    #[arg(
        long,
        default_value_t = 1,
        help = "Inheritance tax class, 1 to 3 (1 = close family)"
    )]
    inheritance_tax_class: u8,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Fixed annual amount spent out of wealth"
    )]
    yearly_spending_from_wealth: f64,
    #[arg(long, default_value_t = 19.0, help = "VAT rate in percent")]
    vat_rate: f64,
    #[arg(
        long,
        default_value_t = 70.0,
        help = "Share of income spent on VAT-bearing consumption, in percent"
    )]
    vat_applicable_rate: f64,
    #[arg(long, value_enum, default_value_t = CliTaxPolicy::StatusQuo)]
    tax_policy: CliTaxPolicy,
    #[arg(
        long,
        value_enum,
        default_value_t = CliIncomeTaxLevel::SimplifiedCurrent,
        help = "Income tax bracket level for --tax-policy=custom"
    )]
    custom_income_level: CliIncomeTaxLevel,
    #[arg(
        long,
        value_enum,
        default_value_t = CliCapitalIncomeLevel::StatusQuo,
        help = "Capital income bracket level for --tax-policy=custom"
    )]
    custom_capital_income_level: CliCapitalIncomeLevel,
    #[arg(
        long,
        value_enum,
        default_value_t = CliWealthTaxLevel::None,
        help = "Wealth tax level for --tax-policy=custom"
    )]
    custom_wealth_tax_level: CliWealthTaxLevel,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PolicyInfo {
    id: String,
    name: String,
    description: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    policy: PolicyInfo,
    #[serde(flatten)]
    result: SimulationResult,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidationErrorResponse {
    error: String,
    violations: Vec<String>,
}

struct ApiRequest {
    persona: Persona,
    policy: Box<dyn TaxPolicy>,
}

fn build_persona(cli: &Cli) -> Result<Persona, String> {
    if !(0.0..=100.0).contains(&cli.savings_rate) {
        return Err("--savings-rate must be between 0 and 100".to_string());
    }

    if !cli.income_growth_rate.is_finite() || cli.income_growth_rate <= -100.0 {
        return Err("--income-growth-rate must be > -100".to_string());
    }

    if !(0.0..=100.0).contains(&cli.vat_rate) {
        return Err("--vat-rate must be between 0 and 100".to_string());
    }

    if !(0.0..=100.0).contains(&cli.vat_applicable_rate) {
        return Err("--vat-applicable-rate must be between 0 and 100".to_string());
    }

    if cli.yearly_spending_from_wealth < 0.0 || !cli.yearly_spending_from_wealth.is_finite() {
        return Err("--yearly-spending-from-wealth must be >= 0".to_string());
    }

    let inheritance = if cli.inheritance_amount > 0.0 {
        let Some(age) = cli.inheritance_age else {
            return Err(
                "--inheritance-age is required when --inheritance-amount > 0".to_string(),
            );
        };
        let Some(tax_class) = TaxClass::from_number(cli.inheritance_tax_class) else {
            return Err("--inheritance-tax-class must be 1, 2 or 3".to_string());
        };
        Some(InheritanceEvent {
            age,
            amount: cli.inheritance_amount,
            tax_class,
        })
    } else {
        None
    };

    Ok(Persona {
        initial_age: cli.initial_age,
        current_age: cli.current_age,
        current_income: cli.current_income,
        current_wealth: cli.current_wealth,
        savings_rate: cli.savings_rate / 100.0,
        growth: IncomeGrowth::Constant(1.0 + cli.income_growth_rate / 100.0),
        inheritance,
        yearly_spending_from_wealth: cli.yearly_spending_from_wealth,
        vat_rate: cli.vat_rate,
        vat_applicable_rate: cli.vat_applicable_rate,
        overrides: Vec::new(),
    })
}

fn build_policy(cli: &Cli) -> Box<dyn TaxPolicy> {
    match cli.tax_policy {
        CliTaxPolicy::StatusQuo => Box::new(crate::core::StatusQuoPolicy),
        CliTaxPolicy::ProgressiveWealthTax => Box::new(crate::core::ProgressiveWealthTaxPolicy),
        CliTaxPolicy::FlatTax => Box::new(crate::core::FlatTaxPolicy),
        CliTaxPolicy::Custom => Box::new(
            CustomPolicy::builder()
                .income(cli.custom_income_level.into())
                .capital_income(cli.custom_capital_income_level.into())
                .wealth(cli.custom_wealth_tax_level.into())
                .build(),
        ),
    }
}

fn default_cli_for_api() -> Cli {
    Cli {
        current_income: 50_000.0,
        current_age: 25,
        initial_age: 20,
        current_wealth: 0.0,
        savings_rate: 20.0,
        income_growth_rate: 2.0,
        inheritance_age: None,
        inheritance_amount: 0.0,
        inheritance_tax_class: 1,
        yearly_spending_from_wealth: 0.0,
        vat_rate: 19.0,
        vat_applicable_rate: 70.0,
        tax_policy: CliTaxPolicy::StatusQuo,
        custom_income_level: CliIncomeTaxLevel::SimplifiedCurrent,
        custom_capital_income_level: CliCapitalIncomeLevel::StatusQuo,
        custom_wealth_tax_level: CliWealthTaxLevel::None,
    }
}

fn overrides_from_payload(payload: &[OverridePayload]) -> Result<Vec<YearlyOverride>, String> {
    payload
        .iter()
        .map(|ov| {
            let Some(age) = ov.age else {
                return Err("yearlyOverrides entries require an age".to_string());
            };
            Ok(YearlyOverride {
                age,
                income: ov.income.unwrap_or(0.0),
                wealth: ov.wealth.unwrap_or(0.0),
            })
        })
        .collect()
}

fn api_request_from_payload(payload: SimulatePayload) -> Result<ApiRequest, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.current_income {
        cli.current_income = v;
    }
    if let Some(v) = payload.current_age {
        cli.current_age = v;
        // keep the default projection start usable when only the
        // current age is supplied
        if cli.initial_age > v {
            cli.initial_age = v;
        }
    }
    if let Some(v) = payload.initial_age {
        cli.initial_age = v;
    }
    if let Some(v) = payload.current_wealth {
        cli.current_wealth = v;
    }
    if let Some(v) = payload.savings_rate {
        cli.savings_rate = v * 100.0;
    }
    if let Some(v) = payload.income_growth_factor {
        cli.income_growth_rate = (v - 1.0) * 100.0;
    }
    if let Some(v) = payload.inheritance_age {
        cli.inheritance_age = Some(v);
    }
    if let Some(v) = payload.inheritance_amount {
        cli.inheritance_amount = v;
    }
    if let Some(v) = payload.inheritance_tax_class {
        cli.inheritance_tax_class = v;
    }
    if let Some(v) = payload.yearly_spending_from_wealth {
        cli.yearly_spending_from_wealth = v;
    }
    if let Some(v) = payload.vat_rate {
        cli.vat_rate = v;
    }
    if let Some(v) = payload.vat_applicable_rate {
        cli.vat_applicable_rate = v;
    }
    if let Some(v) = payload.tax_policy {
        cli.tax_policy = v.into();
    }
    if let Some(v) = payload.custom_income_level {
        cli.custom_income_level = CliIncomeTaxLevel::from(v);
    }
    if let Some(v) = payload.custom_capital_income_level {
        cli.custom_capital_income_level = CliCapitalIncomeLevel::from(v);
    }
    if let Some(v) = payload.custom_wealth_tax_level {
        cli.custom_wealth_tax_level = CliWealthTaxLevel::from(v);
    }

    let mut persona = build_persona(&cli)?;
    if let Some(entries) = &payload.yearly_overrides {
        persona.overrides = overrides_from_payload(entries)?;
    }

    Ok(ApiRequest {
        persona,
        policy: build_policy(&cli),
    })
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route("/api/compare", get(not_found_handler).post(compare_handler))
        .route("/api/policies", get(policies_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "tax simulation API listening");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn policies_handler() -> Response {
    let policies: Vec<PolicyInfo> = all_policies()
        .iter()
        .map(|p| PolicyInfo {
            id: p.id().to_string(),
            name: p.name().to_string(),
            description: p.description().to_string(),
        })
        .collect();
    json_response(StatusCode::OK, policies)
}

async fn simulate_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    match run_simulation(&request.persona, request.policy.as_ref()) {
        Ok(result) => json_response(
            StatusCode::OK,
            SimulateResponse {
                policy: PolicyInfo {
                    id: request.policy.id().to_string(),
                    name: request.policy.name().to_string(),
                    description: request.policy.description().to_string(),
                },
                result,
            },
        ),
        Err(failure) => validation_error_response(&failure),
    }
}

async fn compare_handler(Json(payload): Json<ComparePayload>) -> Response {
    if payload.personas.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "personas must not be empty");
    }
    if let Some(weights) = &payload.weights {
        if weights.len() != payload.personas.len() {
            return error_response(
                StatusCode::BAD_REQUEST,
                "weights must be parallel to personas",
            );
        }
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return error_response(StatusCode::BAD_REQUEST, "weights must be >= 0");
        }
    }

    let mut personas = Vec::with_capacity(payload.personas.len());
    for persona_payload in &payload.personas {
        let request = match api_request_from_payload(persona_payload.clone()) {
            Ok(request) => request,
            Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
        };
        personas.push(request.persona);
    }

    let selections = payload.policies.clone().unwrap_or(vec![
        ApiTaxPolicy::StatusQuo,
        ApiTaxPolicy::ProgressiveWealthTax,
        ApiTaxPolicy::FlatTax,
    ]);
    let mut cli = default_cli_for_api();
    if let Some(v) = payload.custom_income_level {
        cli.custom_income_level = v.into();
    }
    if let Some(v) = payload.custom_capital_income_level {
        cli.custom_capital_income_level = v.into();
    }
    if let Some(v) = payload.custom_wealth_tax_level {
        cli.custom_wealth_tax_level = v.into();
    }

    let policies: Vec<Box<dyn TaxPolicy>> = selections
        .into_iter()
        .map(|selection| {
            cli.tax_policy = selection.into();
            build_policy(&cli)
        })
        .collect();
    let policy_refs: Vec<&dyn TaxPolicy> = policies.iter().map(Box::as_ref).collect();

    match run_scenarios(&policy_refs, &personas, payload.weights.as_deref()) {
        Ok(comparison) => json_response(StatusCode::OK, comparison),
        Err(failure) => validation_error_response(&failure),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn validation_error_response(failure: &ValidationFailure) -> Response {
    json_response(
        StatusCode::BAD_REQUEST,
        ValidationErrorResponse {
            error: "invalid simulation inputs".to_string(),
            violations: failure.messages(),
        },
    )
}
