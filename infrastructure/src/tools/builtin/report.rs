//! Purchase analysis report
//!
//! `generate_report` combines a standard loan, the market snapshot and
//! the purchase tax rates into one structured report with risks,
//! recommendations and next steps.

use super::financial::{PressureLevel, TaxRates, equal_payment, round2};
use super::market::{DistrictSnapshot, city_overview, select};
use async_trait::async_trait;
use roundtable_domain::{
    ParamType, ToolDefinition, ToolError, ToolHandler, ToolParameter, ValidatedArgs,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const GENERATE_REPORT: &str = "generate_report";

/// Minimum down payment ratio and annual rate (percent) assumed for a
/// first and a second home.
const FIRST_HOME_TERMS: (f64, f64) = (0.2, 3.5);
const SECOND_HOME_TERMS: (f64, f64) = (0.3, 3.9);

/// Year-over-year change beyond which the market counts as moving.
const TREND_THRESHOLD: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialAnalysis {
    pub budget: f64,
    pub down_payment: f64,
    pub down_payment_ratio: f64,
    pub loan_amount: f64,
    /// Annual rate in percent
    pub rate: f64,
    pub loan_years: u32,
    pub monthly_payment: f64,
    pub total_interest: f64,
    pub total_payment: f64,
    /// `None` without an income
    pub pressure_level: Option<PressureLevel>,
    /// Payment-to-income ratio in percent
    pub pressure_ratio: Option<f64>,
}

/// Equal-payment loan on the budget at the standard terms for the home.
pub fn analyze_financial(
    budget: f64,
    loan_years: u32,
    first_home: bool,
    monthly_income: Option<f64>,
) -> FinancialAnalysis {
    let (down_ratio, rate) = if first_home {
        FIRST_HOME_TERMS
    } else {
        SECOND_HOME_TERMS
    };
    let down_payment = budget * down_ratio;
    let loan = budget - down_payment;
    let repayment = equal_payment(loan, rate / 100.0 / 12.0, loan_years * 12);

    let ratio = monthly_income
        .filter(|income| *income > 0.0)
        .map(|income| repayment.monthly_payment / income);

    FinancialAnalysis {
        budget: round2(budget),
        down_payment: round2(down_payment),
        down_payment_ratio: down_ratio,
        loan_amount: round2(loan),
        rate,
        loan_years,
        monthly_payment: round2(repayment.monthly_payment),
        total_interest: round2(repayment.total_interest),
        total_payment: round2(repayment.total_payment),
        pressure_level: ratio.map(PressureLevel::from_ratio),
        pressure_ratio: ratio.map(|r| (r * 1000.0).round() / 10.0),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketTrend {
    Rising,
    Stable,
    Falling,
}

impl MarketTrend {
    pub fn from_yoy(yoy_change: f64) -> Self {
        if yoy_change > TREND_THRESHOLD {
            MarketTrend::Rising
        } else if yoy_change < -TREND_THRESHOLD {
            MarketTrend::Falling
        } else {
            MarketTrend::Stable
        }
    }

    fn advice(self) -> &'static str {
        match self {
            MarketTrend::Rising => "Prices are climbing; decide early once a suitable home is found",
            MarketTrend::Stable => "The market is steady; there is time to choose carefully",
            MarketTrend::Falling => "The market is adjusting; wait a little or bargain harder",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketAnalysis {
    /// Average price per m² of the district, or sales-weighted for the city
    pub avg_price: f64,
    /// Floor area the budget buys at the average price
    pub affordable_area: f64,
    pub yoy_change: f64,
    pub trend: MarketTrend,
    pub trend_advice: &'static str,
}

pub fn analyze_market(districts: &[&DistrictSnapshot], budget: f64) -> MarketAnalysis {
    let (avg_price, yoy_change) = match districts {
        [one] => (one.avg_price, one.yoy_change),
        many => {
            let owned: Vec<DistrictSnapshot> = many.iter().map(|d| (*d).clone()).collect();
            let overview = city_overview(&owned);
            (overview.avg_price, overview.avg_yoy_change)
        }
    };
    let trend = MarketTrend::from_yoy(yoy_change);
    MarketAnalysis {
        avg_price,
        affordable_area: if avg_price > 0.0 {
            (budget / avg_price * 10.0).round() / 10.0
        } else {
            0.0
        },
        yoy_change,
        trend,
        trend_advice: trend.advice(),
    }
}

fn policy_points(city: &str, first_home: bool, tax: &TaxRates) -> Vec<String> {
    let (down_ratio, _) = if first_home {
        FIRST_HOME_TERMS
    } else {
        SECOND_HOME_TERMS
    };
    let home = if first_home { "first" } else { "second" };
    let (small, large) = if first_home {
        (tax.deed_first_small, tax.deed_first_large)
    } else {
        (tax.deed_second_small, tax.deed_second_large)
    };
    let mut points = vec![
        format!("{city} has no purchase restrictions; non-residents may buy"),
        format!(
            "Minimum down payment for a {home} home: {}%",
            (down_ratio * 100.0).round()
        ),
        "Provident fund loans: up to 800,000 for two contributors, 500,000 for one".to_string(),
        format!(
            "Deed tax: {}% up to {} m², {}% above",
            small * 100.0,
            tax.small_area_limit,
            large * 100.0
        ),
    ];
    if first_home {
        points.push("First homes qualify for the preferential mortgage rate".to_string());
    }
    points
}

fn risk_factors(financial: &FinancialAnalysis, market: &MarketAnalysis) -> Vec<&'static str> {
    let mut risks = Vec::new();
    match financial.pressure_level {
        Some(PressureLevel::High) => risks.push(
            "The payment takes too much of the income; lower the budget or lengthen the term",
        ),
        Some(PressureLevel::Medium) => {
            risks.push("The payment is a moderate share of income; keep other spending in check")
        }
        Some(PressureLevel::Low) => {}
        None => risks.push("No income given, so affordability could not be checked"),
    }
    if market.trend == MarketTrend::Falling {
        risks.push("Prices are falling; the home may lose value in the short term");
    }
    if risks.is_empty() {
        risks.push("No significant risk found");
    }
    risks
}

fn recommendations(financial: &FinancialAnalysis, market: &MarketAnalysis) -> Vec<&'static str> {
    let mut advice = match financial.pressure_level {
        Some(PressureLevel::High) => vec![
            "Lower the budget or lengthen the loan term to reduce the payment",
            "Consider a larger down payment to borrow less",
        ],
        Some(PressureLevel::Low) => {
            vec!["Finances are comfortable; a somewhat higher budget would buy a better home"]
        }
        _ => vec!["Stay within the current budget"],
    };
    advice.push(match market.trend {
        MarketTrend::Rising => "The market is rising; act soon on a suitable home",
        MarketTrend::Falling => "The market is adjusting; compare widely and negotiate",
        MarketTrend::Stable => "The market is steady; no need to rush",
    });
    advice.push("Visit in person to check the estate and its amenities");
    advice.push("Confirm the latest policy with a professional before signing");
    advice
}

fn next_steps(location: &str) -> Vec<String> {
    vec![
        "Confirm purchase eligibility and gather identity documents".to_string(),
        "Set aside the down payment and the taxes".to_string(),
        format!("Visit shortlisted projects in {location}"),
        "Compare location, price, layout and amenities".to_string(),
        "Compare bank rates and pick a lender".to_string(),
        "Sign the contract after reading every clause".to_string(),
        "Apply for the loan and wait for approval".to_string(),
        "Pay deed tax and the maintenance fund".to_string(),
        "Register the transfer of ownership".to_string(),
        "Inspect the home and take delivery".to_string(),
    ]
}

pub fn generate_report_definition() -> ToolDefinition {
    ToolDefinition::new(
        GENERATE_REPORT,
        "Generate a complete purchase analysis report covering finances, market, policy, \
         risks and next steps",
    )
    .with_parameter(ToolParameter::new("city", "Target city", true).with_enum(["nanning", "liuzhou"]))
    .with_parameter(ToolParameter::new("district", "Target district", false))
    .with_parameter(ToolParameter::new("budget", "Total budget", true).with_type(ParamType::Number))
    .with_parameter(
        ToolParameter::new("loan_years", "Loan term in years", true).with_type(ParamType::Integer),
    )
    .with_parameter(
        ToolParameter::new("is_first_home", "Whether this is the buyer's first home", true)
            .with_type(ParamType::Boolean),
    )
    .with_parameter(
        ToolParameter::new("monthly_income", "Household monthly income", false)
            .with_type(ParamType::Number),
    )
}

#[derive(Debug, Deserialize)]
struct ReportArgs {
    city: String,
    #[serde(default)]
    district: Option<String>,
    budget: f64,
    loan_years: i64,
    is_first_home: bool,
    #[serde(default)]
    monthly_income: Option<f64>,
}

pub struct GenerateReport {
    definition: ToolDefinition,
    tax: TaxRates,
}

impl GenerateReport {
    pub fn new(tax: TaxRates) -> Self {
        Self {
            definition: generate_report_definition(),
            tax,
        }
    }
}

#[async_trait]
impl ToolHandler for GenerateReport {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, args: ValidatedArgs) -> Result<Value, ToolError> {
        let a: ReportArgs = args.parse()?;
        if a.budget <= 0.0 {
            return Err(ToolError::invalid_argument("budget must be positive"));
        }
        if !(1..=50).contains(&a.loan_years) {
            return Err(ToolError::invalid_argument("loan_years must be between 1 and 50"));
        }

        let districts = select(&a.city, a.district.as_deref())?;
        let location = match &a.district {
            Some(_) => format!("{} {}", a.city, districts[0].district),
            None => a.city.clone(),
        };

        let financial =
            analyze_financial(a.budget, a.loan_years as u32, a.is_first_home, a.monthly_income);
        let market = analyze_market(&districts, a.budget);

        let pressure = financial
            .pressure_level
            .map_or("unknown", |level| match level {
                PressureLevel::Low => "low",
                PressureLevel::Medium => "medium",
                PressureLevel::High => "high",
            });
        let summary = format!(
            "In {location} a budget of {:.0} buys about {:.0} m² at the average price. \
             Over {} years the monthly payment is about {:.0} and repayment pressure is {pressure}. {}.",
            a.budget,
            market.affordable_area,
            financial.loan_years,
            financial.monthly_payment,
            market.trend_advice,
        );

        Ok(json!({
            "summary": summary,
            "city": a.city,
            "district": a.district,
            "budget": a.budget,
            "policy_summary": {
                "is_first_home": a.is_first_home,
                "points": policy_points(&a.city, a.is_first_home, &self.tax),
            },
            "risk_factors": risk_factors(&financial, &market),
            "recommendations": recommendations(&financial, &market),
            "next_steps": next_steps(&location),
            "financial_analysis": financial,
            "market_analysis": market,
        }))
    }
}
