//! Market snapshot, price trends, district comparison and purchase timing
//!
//! Figures come from a built-in table of monthly district statistics.
//! Price trends are rebuilt from each district's year-over-year and
//! month-over-month change. `judge_timing` scores four factors (price
//! trend, inventory, market activity, policy) and weighs them by purchase
//! purpose.

use async_trait::async_trait;
use roundtable_domain::{
    ParamType, ToolDefinition, ToolError, ToolHandler, ToolParameter, ValidatedArgs,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const QUERY_MARKET: &str = "query_market";
pub const QUERY_PRICE_TREND: &str = "query_price_trend";
pub const COMPARE_DISTRICTS: &str = "compare_districts";
pub const JUDGE_TIMING: &str = "judge_timing";

const CITIES: [&str; 2] = ["nanning", "liuzhou"];

/// Policy environment score; constant while the snapshot is static.
const POLICY_SCORE: u32 = 70;

/// Year and month the snapshot describes.
const SNAPSHOT_MONTH: (i32, u32) = (2025, 11);
/// Longest trend that can be requested.
const TREND_MONTHS: usize = 12;
/// Year-over-year change above which a district counts as stable.
const STABLE_YOY_FLOOR: f64 = -2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HotLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictSnapshot {
    pub district: &'static str,
    /// Average price per m²
    pub avg_price: f64,
    pub price_range: &'static str,
    pub monthly_sales: u32,
    pub inventory: u32,
    pub inventory_months: f64,
    /// Year-over-year price change in percent
    pub yoy_change: f64,
    /// Month-over-month price change in percent
    pub mom_change: f64,
    pub hot_level: HotLevel,
    pub description: &'static str,
}

#[allow(clippy::too_many_arguments)]
const fn district(
    district: &'static str,
    avg_price: f64,
    price_range: &'static str,
    monthly_sales: u32,
    inventory: u32,
    inventory_months: f64,
    yoy_change: f64,
    mom_change: f64,
    hot_level: HotLevel,
    description: &'static str,
) -> DistrictSnapshot {
    DistrictSnapshot {
        district,
        avg_price,
        price_range,
        monthly_sales,
        inventory,
        inventory_months,
        yoy_change,
        mom_change,
        hot_level,
        description,
    }
}

static NANNING: [DistrictSnapshot; 4] = [
    district(
        "qingxiu", 16800.0, "12000-28000", 320, 5200, 16.3, -4.2, -0.6, HotLevel::High,
        "Central business district with the best schools and hospitals",
    ),
    district(
        "liangqing", 11500.0, "9000-16000", 260, 6100, 23.5, -6.1, -0.8, HotLevel::Medium,
        "New district with many projects under construction and ample supply",
    ),
    district(
        "jiangnan", 10200.0, "8000-14000", 180, 3900, 21.7, -5.3, -0.5, HotLevel::Low,
        "Older residential area south of the river, improving transport links",
    ),
    district(
        "xixiangtang", 12300.0, "9500-17000", 210, 4200, 20.0, -3.8, -0.3, HotLevel::Medium,
        "University area with steady rental demand",
    ),
];

static LIUZHOU: [DistrictSnapshot; 3] = [
    district(
        "chengzhong", 11800.0, "9000-16000", 150, 1900, 12.7, -2.5, -0.2, HotLevel::Medium,
        "Historic centre with limited new supply",
    ),
    district(
        "liunan", 8600.0, "6500-11000", 170, 2600, 15.3, -3.6, -0.4, HotLevel::Medium,
        "Industrial base with affordable family housing",
    ),
    district(
        "yufeng", 8200.0, "6000-10500", 120, 2200, 18.3, -4.4, -0.6, HotLevel::Low,
        "Quiet northern district, large inventory of new homes",
    ),
];

fn city_districts(city: &str) -> Option<&'static [DistrictSnapshot]> {
    match city.to_ascii_lowercase().as_str() {
        "nanning" => Some(&NANNING),
        "liuzhou" => Some(&LIUZHOU),
        _ => None,
    }
}

/// Look up `city`, optionally narrowed to one district.
pub(crate) fn select(
    city: &str,
    district: Option<&str>,
) -> Result<Vec<&'static DistrictSnapshot>, ToolError> {
    let districts = city_districts(city).ok_or_else(|| {
        ToolError::not_found(format!("market data for {}", city))
            .with_details(format!("available cities: {}", CITIES.join(", ")))
    })?;
    match district {
        None => Ok(districts.iter().collect()),
        Some(name) => districts
            .iter()
            .find(|d| d.district.eq_ignore_ascii_case(name.trim()))
            .map(|d| vec![d])
            .ok_or_else(|| {
                let available: Vec<&str> = districts.iter().map(|d| d.district).collect();
                ToolError::not_found(format!("district {} in {}", name, city))
                    .with_details(format!("available districts: {}", available.join(", ")))
            }),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityOverview {
    /// Sales-weighted average price
    pub avg_price: f64,
    pub total_monthly_sales: u32,
    pub total_inventory: u32,
    pub avg_yoy_change: f64,
    pub district_count: usize,
}

pub fn city_overview(districts: &[DistrictSnapshot]) -> CityOverview {
    let total_sales: u32 = districts.iter().map(|d| d.monthly_sales).sum();
    let weighted = districts
        .iter()
        .map(|d| d.avg_price * f64::from(d.monthly_sales))
        .sum::<f64>();
    let avg_price = if total_sales > 0 {
        (weighted / f64::from(total_sales)).round()
    } else {
        0.0
    };
    let count = districts.len().max(1) as f64;
    let avg_yoy = districts.iter().map(|d| d.yoy_change).sum::<f64>() / count;

    CityOverview {
        avg_price,
        total_monthly_sales: total_sales,
        total_inventory: districts.iter().map(|d| d.inventory).sum(),
        avg_yoy_change: (avg_yoy * 10.0).round() / 10.0,
        district_count: districts.len(),
    }
}

fn city_parameter() -> ToolParameter {
    ToolParameter::new("city", "City name", true).with_enum(CITIES)
}

fn district_parameter() -> ToolParameter {
    ToolParameter::new(
        "district",
        "District name, e.g. qingxiu. Omit for the whole city",
        false,
    )
}

pub fn query_market_definition() -> ToolDefinition {
    ToolDefinition::new(
        QUERY_MARKET,
        "Look up market data for a city or district: average price, sales, inventory and price change",
    )
    .with_parameter(city_parameter())
    .with_parameter(district_parameter())
}

#[derive(Debug, Deserialize)]
struct MarketArgs {
    city: String,
    #[serde(default)]
    district: Option<String>,
    #[serde(default)]
    purpose: Purpose,
}

pub struct QueryMarket {
    definition: ToolDefinition,
}

impl QueryMarket {
    pub fn new() -> Self {
        Self {
            definition: query_market_definition(),
        }
    }
}

impl Default for QueryMarket {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolHandler for QueryMarket {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, args: ValidatedArgs) -> Result<Value, ToolError> {
        let args: MarketArgs = args.parse()?;
        let selected = select(&args.city, args.district.as_deref())?;

        if args.district.is_some() {
            let d = selected[0];
            let direction = if d.yoy_change > 0.0 { "up" } else { "down" };
            return Ok(json!({
                "city": args.city,
                "district": d,
                "summary": format!(
                    "{} {}: average {} per m², {} sales a month, {} {}% year over year.",
                    args.city, d.district, d.avg_price, d.monthly_sales, direction, d.yoy_change.abs()
                ),
            }));
        }

        let snapshots: Vec<DistrictSnapshot> = selected.into_iter().cloned().collect();
        let overview = city_overview(&snapshots);
        let mut districts: Vec<Value> = snapshots
            .iter()
            .map(|d| {
                json!({
                    "district": d.district,
                    "avg_price": d.avg_price,
                    "monthly_sales": d.monthly_sales,
                    "hot_level": d.hot_level,
                })
            })
            .collect();
        districts.sort_by(|a, b| {
            let price = |v: &Value| v["avg_price"].as_f64().unwrap_or_default();
            price(b).total_cmp(&price(a))
        });

        Ok(json!({
            "city": args.city,
            "overview": overview,
            "districts": districts,
        }))
    }
}

// ==================== Price trend ====================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    /// `YYYY-MM`
    pub month: String,
    /// Average price per m²
    pub price: f64,
}

fn month_label(months_back: usize) -> String {
    let (year, month) = SNAPSHOT_MONTH;
    let index = year * 12 + month as i32 - 1 - months_back as i32;
    format!("{}-{:02}", index.div_euclid(12), index.rem_euclid(12) + 1)
}

/// Monthly average prices for the [`TREND_MONTHS`] months ending at the
/// snapshot, oldest first.
///
/// The last step follows `mom_change`; earlier months are interpolated
/// geometrically from the price a year earlier implied by `yoy_change`.
pub fn price_trend(d: &DistrictSnapshot) -> Vec<TrendPoint> {
    let year_ago = d.avg_price / (1.0 + d.yoy_change / 100.0);
    let last_month = d.avg_price / (1.0 + d.mom_change / 100.0);
    let span = (TREND_MONTHS - 1) as f64;

    (0..TREND_MONTHS)
        .rev()
        .map(|back| {
            let price = if back == 0 {
                d.avg_price
            } else {
                let step = (back - 1) as f64 / span;
                last_month * (year_ago / last_month).powf(step)
            };
            TrendPoint {
                month: month_label(back),
                price: price.round(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendStatistics {
    pub start_price: f64,
    pub end_price: f64,
    pub change: f64,
    /// Change over the period in percent
    pub change_pct: f64,
    pub max_price: f64,
    pub max_month: String,
    pub min_price: f64,
    pub min_month: String,
    pub avg_price: f64,
}

/// Summary figures of a non-empty trend.
pub fn trend_statistics(trend: &[TrendPoint]) -> Option<TrendStatistics> {
    let first = trend.first()?;
    let last = trend.last()?;
    let max = trend.iter().max_by(|a, b| a.price.total_cmp(&b.price))?;
    let min = trend.iter().min_by(|a, b| a.price.total_cmp(&b.price))?;

    let change = last.price - first.price;
    let change_pct = if first.price > 0.0 {
        (change / first.price * 10_000.0).round() / 100.0
    } else {
        0.0
    };
    let avg = trend.iter().map(|p| p.price).sum::<f64>() / trend.len() as f64;

    Some(TrendStatistics {
        start_price: first.price,
        end_price: last.price,
        change,
        change_pct,
        max_price: max.price,
        max_month: max.month.clone(),
        min_price: min.price,
        min_month: min.month.clone(),
        avg_price: avg.round(),
    })
}

pub fn query_price_trend_definition() -> ToolDefinition {
    ToolDefinition::new(
        QUERY_PRICE_TREND,
        "Show the monthly average price history of a district with its high, low and change",
    )
    .with_parameter(city_parameter())
    .with_parameter(ToolParameter::new("district", "District name, e.g. qingxiu", true))
    .with_parameter(
        ToolParameter::new("months", "How many recent months to show, at most 12", false)
            .with_type(ParamType::Integer),
    )
}

#[derive(Debug, Deserialize)]
struct TrendArgs {
    city: String,
    district: String,
    #[serde(default)]
    months: Option<i64>,
}

pub struct QueryPriceTrend {
    definition: ToolDefinition,
}

impl QueryPriceTrend {
    pub fn new() -> Self {
        Self {
            definition: query_price_trend_definition(),
        }
    }
}

impl Default for QueryPriceTrend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolHandler for QueryPriceTrend {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, args: ValidatedArgs) -> Result<Value, ToolError> {
        let args: TrendArgs = args.parse()?;
        let months = match args.months {
            None => TREND_MONTHS,
            Some(m) if m >= 1 => (m as usize).min(TREND_MONTHS),
            Some(_) => return Err(ToolError::invalid_argument("months must be at least 1")),
        };
        let selected = select(&args.city, Some(args.district.as_str()))?;
        let d = selected[0];

        let mut trend = price_trend(d);
        trend.drain(..trend.len() - months);
        let stats = trend_statistics(&trend)
            .ok_or_else(|| ToolError::execution_failed("empty price trend"))?;
        let direction = if stats.change > 0.0 { "up" } else { "down" };

        Ok(json!({
            "city": args.city,
            "district": d.district,
            "months": trend.len(),
            "trend": trend,
            "summary": format!(
                "{} {} over the last {} months: {} {} per m² ({}%), now {} per m².",
                args.city,
                d.district,
                months,
                direction,
                stats.change.abs(),
                stats.change_pct.abs(),
                stats.end_price
            ),
            "statistics": stats,
        }))
    }
}

// ==================== District comparison ====================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub district: &'static str,
    pub reason: &'static str,
    pub detail: String,
}

/// Districts priced at or below the group average with real demand are
/// good value; the district with the smallest yearly move is the stable
/// pick unless even that one fell hard.
pub fn recommend(districts: &[&DistrictSnapshot]) -> Vec<Recommendation> {
    if districts.is_empty() {
        return Vec::new();
    }
    let avg = districts.iter().map(|d| d.avg_price).sum::<f64>() / districts.len() as f64;

    let mut picks: Vec<Recommendation> = districts
        .iter()
        .filter(|d| d.avg_price <= avg && d.hot_level != HotLevel::Low)
        .map(|d| Recommendation {
            district: d.district,
            reason: "good value",
            detail: format!(
                "average {} per m² is below the compared average of {}",
                d.avg_price,
                avg.round()
            ),
        })
        .collect();

    if let Some(stable) = districts
        .iter()
        .min_by(|a, b| a.yoy_change.abs().total_cmp(&b.yoy_change.abs()))
        && stable.yoy_change > STABLE_YOY_FLOOR
    {
        picks.push(Recommendation {
            district: stable.district,
            reason: "stable prices",
            detail: format!("{}% year over year", stable.yoy_change),
        });
    }
    picks
}

pub fn compare_districts_definition() -> ToolDefinition {
    ToolDefinition::new(
        COMPARE_DISTRICTS,
        "Compare the market data of several districts in one city side by side",
    )
    .with_parameter(city_parameter())
    .with_parameter(ToolParameter::new(
        "districts",
        "Comma-separated district names, e.g. qingxiu,liangqing",
        true,
    ))
}

#[derive(Debug, Deserialize)]
struct CompareArgs {
    city: String,
    districts: String,
}

pub struct CompareDistricts {
    definition: ToolDefinition,
}

impl CompareDistricts {
    pub fn new() -> Self {
        Self {
            definition: compare_districts_definition(),
        }
    }
}

impl Default for CompareDistricts {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolHandler for CompareDistricts {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, args: ValidatedArgs) -> Result<Value, ToolError> {
        let args: CompareArgs = args.parse()?;
        let names: Vec<&str> = args
            .districts
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .collect();
        if names.len() < 2 {
            return Err(ToolError::invalid_argument(
                "provide at least two districts to compare",
            ));
        }
        let all = select(&args.city, None)?;

        let mut found: Vec<&DistrictSnapshot> = Vec::new();
        let mut not_found: Vec<&str> = Vec::new();
        for name in names {
            match all.iter().find(|d| d.district.eq_ignore_ascii_case(name)) {
                Some(d) if !found.iter().any(|f| f.district == d.district) => found.push(*d),
                Some(_) => {}
                None => not_found.push(name),
            }
        }

        let by_price = |a: &&&DistrictSnapshot, b: &&&DistrictSnapshot| {
            a.avg_price.total_cmp(&b.avg_price)
        };
        let (Some(cheapest), Some(priciest), Some(hottest)) = (
            found.iter().min_by(by_price),
            found.iter().max_by(by_price),
            found.iter().max_by_key(|d| d.monthly_sales),
        ) else {
            let available: Vec<&str> = all.iter().map(|d| d.district).collect();
            return Err(ToolError::not_found(format!("districts {} in {}", args.districts, args.city))
                .with_details(format!("available districts: {}", available.join(", "))));
        };

        Ok(json!({
            "city": args.city,
            "comparison": found,
            "not_found": not_found,
            "analysis": {
                "cheapest": {"district": cheapest.district, "price": cheapest.avg_price},
                "most_expensive": {"district": priciest.district, "price": priciest.avg_price},
                "price_diff": priciest.avg_price - cheapest.avg_price,
                "hottest": {"district": hottest.district, "monthly_sales": hottest.monthly_sales},
            },
            "recommendations": recommend(&found),
        }))
    }
}

// ==================== Timing ====================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Purpose {
    #[default]
    SelfUse,
    Investment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimingLevel {
    Good,
    Neutral,
    Wait,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingScore {
    pub total: u32,
    pub price_trend: u32,
    pub inventory: u32,
    pub market_activity: u32,
    pub policy: u32,
    pub level: TimingLevel,
}

/// Falling prices and deep inventory favour the buyer.
pub fn score_timing(data: &[&DistrictSnapshot], purpose: Purpose) -> TimingScore {
    let n = data.len().max(1) as f64;
    let avg_yoy = data.iter().map(|d| d.yoy_change).sum::<f64>() / n;
    let price_trend = match avg_yoy {
        y if y <= -5.0 => 90,
        y if y <= -2.0 => 75,
        y if y <= 0.0 => 60,
        y if y <= 3.0 => 45,
        _ => 30,
    };

    let avg_months = data.iter().map(|d| d.inventory_months).sum::<f64>() / n;
    let inventory = match avg_months {
        m if m >= 18.0 => 85,
        m if m >= 12.0 => 70,
        m if m >= 8.0 => 55,
        _ => 40,
    };

    let market_activity = match purpose {
        Purpose::SelfUse => 60,
        Purpose::Investment => {
            let hot = data.iter().filter(|d| d.hot_level == HotLevel::High).count() as f64;
            let avg_sales = data.iter().map(|d| f64::from(d.monthly_sales)).sum::<f64>() / n;
            if hot > n / 2.0 {
                75
            } else if avg_sales > 200.0 {
                65
            } else {
                50
            }
        }
    };

    let (w_price, w_inventory, w_activity, w_policy) = match purpose {
        Purpose::Investment => (0.35, 0.25, 0.25, 0.15),
        Purpose::SelfUse => (0.30, 0.30, 0.15, 0.25),
    };
    let weighted = f64::from(price_trend) * w_price
        + f64::from(inventory) * w_inventory
        + f64::from(market_activity) * w_activity
        + f64::from(POLICY_SCORE) * w_policy;
    let total = weighted.round() as u32;

    let level = match total {
        t if t >= 70 => TimingLevel::Good,
        t if t >= 50 => TimingLevel::Neutral,
        _ => TimingLevel::Wait,
    };

    TimingScore {
        total,
        price_trend,
        inventory,
        market_activity,
        policy: POLICY_SCORE,
        level,
    }
}

fn timing_suggestions(score: &TimingScore, purpose: Purpose) -> Vec<&'static str> {
    let mut suggestions = match score.level {
        TimingLevel::Good => vec![
            "Conditions favour buyers; shortlist homes and negotiate on price",
            "Lock in the loan rate while it is low",
        ],
        TimingLevel::Neutral => vec![
            "Buy if the need is real and the home fits; do not rush otherwise",
            "Compare several projects before committing",
        ],
        TimingLevel::Wait => vec![
            "Prices are still rising; consider waiting",
            "Use the time to save a larger down payment",
        ],
    };
    if score.inventory >= 70 {
        suggestions.push("Inventory is deep, so there is room to bargain");
    }
    if purpose == Purpose::Investment && score.market_activity < 65 {
        suggestions.push("Resale activity is thin; investment returns may be slow");
    }
    suggestions
}

pub fn judge_timing_definition() -> ToolDefinition {
    ToolDefinition::new(
        JUDGE_TIMING,
        "Judge whether now is a good time to buy, with a 0-100 score and suggestions",
    )
    .with_parameter(city_parameter())
    .with_parameter(district_parameter())
    .with_parameter(
        ToolParameter::new("purpose", "Purchase purpose", false)
            .with_enum(["self-use", "investment"]),
    )
}

pub struct JudgeTiming {
    definition: ToolDefinition,
}

impl JudgeTiming {
    pub fn new() -> Self {
        Self {
            definition: judge_timing_definition(),
        }
    }
}

impl Default for JudgeTiming {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolHandler for JudgeTiming {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, args: ValidatedArgs) -> Result<Value, ToolError> {
        let args: MarketArgs = args.parse()?;
        let selected = select(&args.city, args.district.as_deref())?;
        let score = score_timing(&selected, args.purpose);
        let suggestions = timing_suggestions(&score, args.purpose);

        Ok(json!({
            "city": args.city,
            "district": args.district,
            "purpose": args.purpose,
            "score": score,
            "suggestions": suggestions,
        }))
    }
}
