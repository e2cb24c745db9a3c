//! Financial calculators
//!
//! - `calc_loan`: down payment, monthly payment and interest for the two
//!   common repayment methods
//! - `calc_tax`: deed tax, VAT, income tax, agent fee and fixed fees
//! - `calc_total_cost`: everything paid over the life of the purchase
//! - `assess_pressure`: payment-to-income ratio with suggestions
//! - `generate_repayment_plan`: month-by-month or yearly schedule of
//!   principal, interest and remaining balance

use async_trait::async_trait;
use roundtable_domain::{
    ParamType, ToolDefinition, ToolError, ToolHandler, ToolParameter, ValidatedArgs,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const CALC_LOAN: &str = "calc_loan";
pub const CALC_TAX: &str = "calc_tax";
pub const CALC_TOTAL_COST: &str = "calc_total_cost";
pub const ASSESS_PRESSURE: &str = "assess_pressure";
pub const GENERATE_REPAYMENT_PLAN: &str = "generate_repayment_plan";

/// Monthly rates below this are treated as interest-free.
const ZERO_RATE_EPSILON: f64 = 1e-10;

/// Monthly schedules are cut to this many rows.
const MONTHLY_ROWS_SHOWN: usize = 36;

/// Payment-to-income ratio up to which pressure is low.
const LOW_PRESSURE_RATIO: f64 = 0.3;
/// Payment-to-income ratio up to which pressure is medium.
const MEDIUM_PRESSURE_RATIO: f64 = 0.5;

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn number(name: &str, description: &str) -> ToolParameter {
    ToolParameter::new(name, description, true).with_type(ParamType::Number)
}

fn optional_number(name: &str, description: &str) -> ToolParameter {
    ToolParameter::new(name, description, false).with_type(ParamType::Number)
}

fn ensure(condition: bool, message: &str) -> Result<(), ToolError> {
    if condition {
        Ok(())
    } else {
        Err(ToolError::invalid_argument(message))
    }
}

// ==================== Loan ====================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepaymentMethod {
    /// Same payment every month.
    #[default]
    EqualPayment,
    /// Same principal every month; payments decrease.
    EqualPrincipal,
}

/// Repayment figures for one loan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Repayment {
    /// Fixed payment, or the average payment for equal principal.
    pub monthly_payment: f64,
    pub first_month_payment: f64,
    pub last_month_payment: f64,
    pub total_payment: f64,
    pub total_interest: f64,
}

/// Equal monthly payments: `M = P·r·(1+r)^n / ((1+r)^n − 1)`.
pub fn equal_payment(loan: f64, monthly_rate: f64, months: u32) -> Repayment {
    let n = f64::from(months);
    let power = (1.0 + monthly_rate).powf(n);
    let monthly = if monthly_rate < ZERO_RATE_EPSILON || (power - 1.0).abs() < ZERO_RATE_EPSILON {
        loan / n
    } else {
        loan * monthly_rate * power / (power - 1.0)
    };
    let total = monthly * n;
    Repayment {
        monthly_payment: monthly,
        first_month_payment: monthly,
        last_month_payment: monthly,
        total_payment: total,
        total_interest: (total - loan).max(0.0),
    }
}

/// Equal monthly principal; interest is charged on the remaining balance.
pub fn equal_principal(loan: f64, monthly_rate: f64, months: u32) -> Repayment {
    let n = f64::from(months);
    let principal = loan / n;
    let total_interest = (n + 1.0) * loan * monthly_rate / 2.0;
    let total = loan + total_interest;
    Repayment {
        monthly_payment: total / n,
        first_month_payment: principal + loan * monthly_rate,
        last_month_payment: principal * (1.0 + monthly_rate),
        total_payment: total,
        total_interest,
    }
}

pub fn calc_loan_definition() -> ToolDefinition {
    ToolDefinition::new(
        CALC_LOAN,
        "Calculate a mortgage: down payment, loan amount, monthly payment and total interest \
         for equal-payment or equal-principal repayment",
    )
    .with_parameter(number("price", "Total house price"))
    .with_parameter(number(
        "down_payment_ratio",
        "Down payment as a fraction of the price, e.g. 0.3",
    ))
    .with_parameter(
        ToolParameter::new("years", "Loan term in years", true).with_type(ParamType::Integer),
    )
    .with_parameter(number("rate", "Annual interest rate in percent, e.g. 4.2"))
    .with_parameter(
        ToolParameter::new("method", "Repayment method", false)
            .with_enum(["equal_payment", "equal_principal"]),
    )
}

#[derive(Debug, Deserialize)]
struct LoanArgs {
    price: f64,
    down_payment_ratio: f64,
    years: i64,
    rate: f64,
    #[serde(default)]
    method: RepaymentMethod,
}

pub struct CalcLoan {
    definition: ToolDefinition,
}

impl CalcLoan {
    pub fn new() -> Self {
        Self {
            definition: calc_loan_definition(),
        }
    }
}

impl Default for CalcLoan {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolHandler for CalcLoan {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, args: ValidatedArgs) -> Result<Value, ToolError> {
        let args: LoanArgs = args.parse()?;
        ensure(args.price > 0.0, "price must be positive")?;
        ensure(
            (0.0..1.0).contains(&args.down_payment_ratio),
            "down_payment_ratio must be in [0, 1)",
        )?;
        ensure((1..=50).contains(&args.years), "years must be between 1 and 50")?;
        ensure(args.rate >= 0.0, "rate must not be negative")?;

        let down_payment = args.price * args.down_payment_ratio;
        let loan = args.price - down_payment;
        let monthly_rate = args.rate / 100.0 / 12.0;
        let months = (args.years * 12) as u32;

        let repayment = match args.method {
            RepaymentMethod::EqualPayment => equal_payment(loan, monthly_rate, months),
            RepaymentMethod::EqualPrincipal => equal_principal(loan, monthly_rate, months),
        };

        Ok(json!({
            "down_payment": round2(down_payment),
            "loan_amount": round2(loan),
            "months": months,
            "monthly_payment": round2(repayment.monthly_payment),
            "first_month_payment": round2(repayment.first_month_payment),
            "last_month_payment": round2(repayment.last_month_payment),
            "total_payment": round2(repayment.total_payment),
            "total_interest": round2(repayment.total_interest),
            "method": args.method,
        }))
    }
}

// ==================== Tax ====================

/// Purchase tax rates. All rates are fractions of the base amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxRates {
    /// Deed tax, first home up to `small_area_limit` m²
    pub deed_first_small: f64,
    /// Deed tax, first home above `small_area_limit` m²
    pub deed_first_large: f64,
    pub deed_second_small: f64,
    pub deed_second_large: f64,
    pub small_area_limit: f64,
    /// VAT on the gain (5% plus 0.6% surcharges)
    pub vat_rate: f64,
    /// Holding period from which VAT is waived
    pub vat_exempt_years: i64,
    /// Income tax on the gain...
    pub income_tax_gain_rate: f64,
    /// ...or on the whole price, whichever is lower
    pub income_tax_price_rate: f64,
    /// Holding period from which a first home is income-tax exempt
    pub income_tax_exempt_years: i64,
    pub agent_fee_rate: f64,
    /// Fixed registration and notary fees
    pub misc_fees: f64,
}

impl Default for TaxRates {
    fn default() -> Self {
        Self {
            deed_first_small: 0.01,
            deed_first_large: 0.015,
            deed_second_small: 0.01,
            deed_second_large: 0.02,
            small_area_limit: 90.0,
            vat_rate: 0.056,
            vat_exempt_years: 2,
            income_tax_gain_rate: 0.2,
            income_tax_price_rate: 0.01,
            income_tax_exempt_years: 5,
            agent_fee_rate: 0.02,
            misc_fees: 500.0,
        }
    }
}

impl TaxRates {
    pub fn deed_rate(&self, area: f64, first_home: bool) -> f64 {
        match (first_home, area <= self.small_area_limit) {
            (true, true) => self.deed_first_small,
            (true, false) => self.deed_first_large,
            (false, true) => self.deed_second_small,
            (false, false) => self.deed_second_large,
        }
    }

    /// Every fractional rate with its config key.
    pub(crate) fn rates(&self) -> [(&'static str, f64); 8] {
        [
            ("deed_first_small", self.deed_first_small),
            ("deed_first_large", self.deed_first_large),
            ("deed_second_small", self.deed_second_small),
            ("deed_second_large", self.deed_second_large),
            ("vat_rate", self.vat_rate),
            ("income_tax_gain_rate", self.income_tax_gain_rate),
            ("income_tax_price_rate", self.income_tax_price_rate),
            ("agent_fee_rate", self.agent_fee_rate),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxBreakdown {
    pub deed_tax: f64,
    pub deed_tax_rate: f64,
    pub vat: f64,
    pub vat_exempt: bool,
    pub income_tax: f64,
    pub income_tax_exempt: bool,
    pub agent_fee: f64,
    pub other_fees: f64,
    pub total: f64,
}

/// Taxes and fees for one purchase.
///
/// Without an `original_price` the seller's purchase price is estimated
/// at 70% of the current price.
pub fn compute_taxes(
    rates: &TaxRates,
    price: f64,
    area: f64,
    first_home: bool,
    house_age_years: i64,
    original_price: Option<f64>,
) -> TaxBreakdown {
    let original = original_price.unwrap_or(price * 0.7);
    let gain = (price - original).max(0.0);

    let deed_tax_rate = rates.deed_rate(area, first_home);
    let deed_tax = price * deed_tax_rate;

    let vat_exempt = house_age_years >= rates.vat_exempt_years;
    let vat = if vat_exempt { 0.0 } else { gain * rates.vat_rate };

    let income_tax_exempt = house_age_years >= rates.income_tax_exempt_years && first_home;
    let income_tax = if income_tax_exempt {
        0.0
    } else {
        (gain * rates.income_tax_gain_rate).min(price * rates.income_tax_price_rate)
    };

    let agent_fee = price * rates.agent_fee_rate;
    let other_fees = rates.misc_fees;
    let total = deed_tax + vat + income_tax + agent_fee + other_fees;

    TaxBreakdown {
        deed_tax: round2(deed_tax),
        deed_tax_rate,
        vat: round2(vat),
        vat_exempt,
        income_tax: round2(income_tax),
        income_tax_exempt,
        agent_fee: round2(agent_fee),
        other_fees: round2(other_fees),
        total: round2(total),
    }
}

pub fn calc_tax_definition() -> ToolDefinition {
    ToolDefinition::new(
        CALC_TAX,
        "Calculate purchase taxes and fees: deed tax, VAT, income tax, agent fee and other fees",
    )
    .with_parameter(number("price", "Total house price"))
    .with_parameter(number("area", "Floor area in square meters"))
    .with_parameter(
        ToolParameter::new("is_first_home", "Whether this is the buyer's first home", true)
            .with_type(ParamType::Boolean),
    )
    .with_parameter(
        ToolParameter::new("house_age_years", "Years the seller held the house, 0 for new", true)
            .with_type(ParamType::Integer),
    )
    .with_parameter(optional_number(
        "original_price",
        "Seller's purchase price, used for VAT and income tax",
    ))
}

#[derive(Debug, Deserialize)]
struct TaxArgs {
    price: f64,
    area: f64,
    is_first_home: bool,
    house_age_years: i64,
    #[serde(default)]
    original_price: Option<f64>,
}

pub struct CalcTax {
    definition: ToolDefinition,
    rates: TaxRates,
}

impl CalcTax {
    pub fn new(rates: TaxRates) -> Self {
        Self {
            definition: calc_tax_definition(),
            rates,
        }
    }
}

#[async_trait]
impl ToolHandler for CalcTax {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, args: ValidatedArgs) -> Result<Value, ToolError> {
        let args: TaxArgs = args.parse()?;
        ensure(args.price > 0.0, "price must be positive")?;
        ensure(args.area > 0.0, "area must be positive")?;
        ensure(args.house_age_years >= 0, "house_age_years must not be negative")?;

        let breakdown = compute_taxes(
            &self.rates,
            args.price,
            args.area,
            args.is_first_home,
            args.house_age_years,
            args.original_price,
        );
        serde_json::to_value(breakdown).map_err(|e| ToolError::execution_failed(e.to_string()))
    }
}

// ==================== Total cost ====================

pub fn calc_total_cost_definition() -> ToolDefinition {
    ToolDefinition::new(
        CALC_TOTAL_COST,
        "Sum up the full cost of buying: down payment, loan interest, taxes and extras",
    )
    .with_parameter(number("price", "Total house price"))
    .with_parameter(number("down_payment", "Down payment amount"))
    .with_parameter(number("total_interest", "Total loan interest"))
    .with_parameter(number("taxes", "Total taxes and fees"))
    .with_parameter(optional_number("decoration", "Renovation budget"))
    .with_parameter(optional_number("furniture", "Furniture and appliances"))
    .with_parameter(optional_number("other_fees", "Any other costs"))
}

#[derive(Debug, Deserialize)]
struct TotalCostArgs {
    price: f64,
    down_payment: f64,
    total_interest: f64,
    taxes: f64,
    #[serde(default)]
    decoration: f64,
    #[serde(default)]
    furniture: f64,
    #[serde(default)]
    other_fees: f64,
}

pub struct CalcTotalCost {
    definition: ToolDefinition,
}

impl CalcTotalCost {
    pub fn new() -> Self {
        Self {
            definition: calc_total_cost_definition(),
        }
    }
}

impl Default for CalcTotalCost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolHandler for CalcTotalCost {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, args: ValidatedArgs) -> Result<Value, ToolError> {
        let a: TotalCostArgs = args.parse()?;
        ensure(a.price > 0.0, "price must be positive")?;
        ensure(
            (0.0..=a.price).contains(&a.down_payment),
            "down_payment must be between 0 and price",
        )?;

        let loan = a.price - a.down_payment;
        let extras = a.decoration + a.furniture + a.other_fees;
        let initial = a.down_payment + a.taxes + extras;
        let total = a.price + a.total_interest + a.taxes + extras;

        Ok(json!({
            "price": round2(a.price),
            "initial_cost": round2(initial),
            "loan_amount": round2(loan),
            "total_interest": round2(a.total_interest),
            "total_cost": round2(total),
            "breakdown": [
                {"name": "down_payment", "amount": round2(a.down_payment), "type": "initial"},
                {"name": "taxes", "amount": round2(a.taxes), "type": "initial"},
                {"name": "decoration", "amount": round2(a.decoration), "type": "initial"},
                {"name": "furniture", "amount": round2(a.furniture), "type": "initial"},
                {"name": "other", "amount": round2(a.other_fees), "type": "initial"},
                {"name": "loan_principal", "amount": round2(loan), "type": "loan"},
                {"name": "loan_interest", "amount": round2(a.total_interest), "type": "loan"},
            ],
        }))
    }
}

// ==================== Repayment plan ====================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    Monthly,
    #[default]
    Yearly,
}

/// One period of a repayment schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleRow {
    /// Month or year number, starting at 1
    pub period: u32,
    pub payment: f64,
    pub principal: f64,
    pub interest: f64,
    /// Balance left after this period
    pub remaining: f64,
}

impl ScheduleRow {
    fn rounded(&self) -> Self {
        Self {
            period: self.period,
            payment: round2(self.payment),
            principal: round2(self.principal),
            interest: round2(self.interest),
            remaining: round2(self.remaining.max(0.0)),
        }
    }
}

/// Month-by-month schedule. Interest is charged on the balance left after
/// the previous month.
pub fn repayment_schedule(
    loan: f64,
    monthly_rate: f64,
    months: u32,
    method: RepaymentMethod,
) -> Vec<ScheduleRow> {
    let fixed_payment = equal_payment(loan, monthly_rate, months).monthly_payment;
    let fixed_principal = loan / f64::from(months);
    let mut remaining = loan;

    (1..=months)
        .map(|period| {
            let interest = remaining * monthly_rate;
            let (payment, principal) = match method {
                RepaymentMethod::EqualPayment => (fixed_payment, fixed_payment - interest),
                RepaymentMethod::EqualPrincipal => (fixed_principal + interest, fixed_principal),
            };
            remaining -= principal;
            ScheduleRow {
                period,
                payment,
                principal,
                interest,
                remaining,
            }
        })
        .collect()
}

/// Sum a monthly schedule into whole years.
pub fn yearly_schedule(monthly: &[ScheduleRow]) -> Vec<ScheduleRow> {
    monthly
        .chunks_exact(12)
        .zip(1..)
        .map(|(months, year)| ScheduleRow {
            period: year,
            payment: months.iter().map(|m| m.payment).sum(),
            principal: months.iter().map(|m| m.principal).sum(),
            interest: months.iter().map(|m| m.interest).sum(),
            remaining: months.last().map_or(0.0, |m| m.remaining),
        })
        .collect()
}

pub fn generate_repayment_plan_definition() -> ToolDefinition {
    ToolDefinition::new(
        GENERATE_REPAYMENT_PLAN,
        "Generate a repayment schedule showing principal, interest and remaining balance \
         per month or per year",
    )
    .with_parameter(number("loan_amount", "Amount borrowed"))
    .with_parameter(
        ToolParameter::new("years", "Loan term in years", true).with_type(ParamType::Integer),
    )
    .with_parameter(number("rate", "Annual interest rate in percent, e.g. 4.2"))
    .with_parameter(
        ToolParameter::new("method", "Repayment method", false)
            .with_enum(["equal_payment", "equal_principal"]),
    )
    .with_parameter(
        ToolParameter::new("detail_level", "One row per month or per year", false)
            .with_enum(["monthly", "yearly"]),
    )
}

#[derive(Debug, Deserialize)]
struct PlanArgs {
    loan_amount: f64,
    years: i64,
    rate: f64,
    #[serde(default)]
    method: RepaymentMethod,
    #[serde(default)]
    detail_level: DetailLevel,
}

pub struct GenerateRepaymentPlan {
    definition: ToolDefinition,
}

impl GenerateRepaymentPlan {
    pub fn new() -> Self {
        Self {
            definition: generate_repayment_plan_definition(),
        }
    }
}

impl Default for GenerateRepaymentPlan {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolHandler for GenerateRepaymentPlan {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, args: ValidatedArgs) -> Result<Value, ToolError> {
        let a: PlanArgs = args.parse()?;
        ensure(a.loan_amount > 0.0, "loan_amount must be positive")?;
        ensure((1..=50).contains(&a.years), "years must be between 1 and 50")?;
        ensure(a.rate >= 0.0, "rate must not be negative")?;

        let months = (a.years * 12) as u32;
        let monthly = repayment_schedule(a.loan_amount, a.rate / 100.0 / 12.0, months, a.method);
        let total_payment: f64 = monthly.iter().map(|m| m.payment).sum();
        let total_interest: f64 = monthly.iter().map(|m| m.interest).sum();

        let rows = match a.detail_level {
            DetailLevel::Monthly => monthly,
            DetailLevel::Yearly => yearly_schedule(&monthly),
        };
        let schedule_count = rows.len();
        let shown: Vec<ScheduleRow> = rows
            .iter()
            .take(match a.detail_level {
                DetailLevel::Monthly => MONTHLY_ROWS_SHOWN,
                DetailLevel::Yearly => schedule_count,
            })
            .map(ScheduleRow::rounded)
            .collect();

        Ok(json!({
            "loan_amount": round2(a.loan_amount),
            "years": a.years,
            "rate": a.rate,
            "method": a.method,
            "total_payment": round2(total_payment),
            "total_interest": round2(total_interest),
            "detail_level": a.detail_level,
            "schedule": shown,
            "schedule_count": schedule_count,
        }))
    }
}

// ==================== Pressure ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PressureLevel {
    Low,
    Medium,
    High,
}

impl PressureLevel {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio <= LOW_PRESSURE_RATIO {
            PressureLevel::Low
        } else if ratio <= MEDIUM_PRESSURE_RATIO {
            PressureLevel::Medium
        } else {
            PressureLevel::High
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PressureAssessment {
    /// Payment-to-income ratio in percent
    pub payment_ratio: f64,
    pub level: PressureLevel,
    pub disposable_income: f64,
    /// Months of payments covered by savings; `None` without a payment
    pub savings_months: Option<f64>,
    pub risk_factors: Vec<String>,
    pub suggestions: Vec<String>,
}

pub fn assess(
    monthly_payment: f64,
    monthly_income: f64,
    monthly_expense: f64,
    savings: f64,
) -> PressureAssessment {
    let ratio = if monthly_income > 0.0 {
        monthly_payment / monthly_income
    } else {
        1.0
    };
    let disposable = monthly_income - monthly_payment - monthly_expense;
    let savings_months = (monthly_payment > 0.0).then(|| savings / monthly_payment);
    let level = PressureLevel::from_ratio(ratio);

    let mut risk_factors = Vec::new();
    if ratio > MEDIUM_PRESSURE_RATIO {
        risk_factors.push("Payment takes more than half of income".to_string());
    }
    if disposable < 2000.0 {
        risk_factors.push("Little disposable income left".to_string());
    }
    if savings_months.is_some_and(|m| m < 6.0) {
        risk_factors.push("Emergency savings cover less than 6 months".to_string());
    }

    let mut suggestions: Vec<String> = match level {
        PressureLevel::Low => vec![
            "Repayment pressure is low and finances look healthy".into(),
            "Keep saving; moderate investing is reasonable".into(),
        ],
        PressureLevel::Medium => vec![
            "Repayment pressure is moderate; hold back on other large expenses".into(),
            "Keep an emergency fund of at least 6 months of payments".into(),
        ],
        PressureLevel::High => vec![
            "Repayment pressure is high; plan finances carefully".into(),
            "Cut non-essential spending and prioritise repayment".into(),
            "Consider a longer term to lower the monthly payment".into(),
        ],
    };
    if level == PressureLevel::Medium && disposable < 3000.0 {
        suggestions.push("Look for extra income or reduce discretionary spending".into());
    }
    if level == PressureLevel::High && savings_months.is_some_and(|m| m < 3.0) {
        suggestions.push("Build savings to at least 3 months of payments first".into());
    }

    PressureAssessment {
        payment_ratio: (ratio * 1000.0).round() / 10.0,
        level,
        disposable_income: round2(disposable),
        savings_months: savings_months.map(|m| (m * 10.0).round() / 10.0),
        risk_factors,
        suggestions,
    }
}

pub fn assess_pressure_definition() -> ToolDefinition {
    ToolDefinition::new(
        ASSESS_PRESSURE,
        "Assess repayment pressure from the monthly payment and household income",
    )
    .with_parameter(number("monthly_payment", "Monthly mortgage payment"))
    .with_parameter(number("monthly_income", "Household monthly income"))
    .with_parameter(optional_number(
        "monthly_expense",
        "Monthly household expenses excluding the mortgage",
    ))
    .with_parameter(optional_number("savings", "Current savings"))
}

#[derive(Debug, Deserialize)]
struct PressureArgs {
    monthly_payment: f64,
    monthly_income: f64,
    #[serde(default)]
    monthly_expense: f64,
    #[serde(default)]
    savings: f64,
}

pub struct AssessPressure {
    definition: ToolDefinition,
}

impl AssessPressure {
    pub fn new() -> Self {
        Self {
            definition: assess_pressure_definition(),
        }
    }
}

impl Default for AssessPressure {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolHandler for AssessPressure {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, args: ValidatedArgs) -> Result<Value, ToolError> {
        let a: PressureArgs = args.parse()?;
        ensure(a.monthly_payment >= 0.0, "monthly_payment must not be negative")?;
        ensure(a.monthly_income >= 0.0, "monthly_income must not be negative")?;

        let assessment = assess(a.monthly_payment, a.monthly_income, a.monthly_expense, a.savings);
        serde_json::to_value(assessment).map_err(|e| ToolError::execution_failed(e.to_string()))
    }
}
