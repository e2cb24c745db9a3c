//! Built-in home-purchase advisory catalog.
//!
//! Three domain specialists plus a general purchase consultant. The
//! consultant is both the default role (when no keyword matches and the
//! classifier gives up) and the synthesis role that merges specialist
//! answers and closes discussions.

use super::entities::{Role, RoleCatalog};
use crate::core::error::DomainError;

pub const FINANCIAL_ADVISOR: &str = "financial_advisor";
pub const POLICY_EXPERT: &str = "policy_expert";
pub const MARKET_ANALYST: &str = "market_analyst";
pub const PURCHASE_CONSULTANT: &str = "purchase_consultant";

const FINANCIAL_TOOLS: [&str; 5] = [
    "calc_loan",
    "calc_tax",
    "calc_total_cost",
    "assess_pressure",
    "generate_repayment_plan",
];
const POLICY_TOOLS: [&str; 4] = ["search_policy", "search_faq", "search_guide", "search_news"];
const MARKET_TOOLS: [&str; 4] = [
    "query_market",
    "query_price_trend",
    "compare_districts",
    "judge_timing",
];
/// Tools only the consultant holds.
const CONSULTANT_TOOLS: [&str; 1] = ["generate_report"];

fn financial_advisor() -> Role {
    Role::new(FINANCIAL_ADVISOR, "Financial Advisor")
        .with_icon("💰")
        .with_description("Loans, monthly payments, taxes, total cost and affordability")
        .with_prompt(
            "You are a home-purchase financial advisor. You compute loan repayments, \
             purchase taxes and the total cost of buying, and you judge whether the \
             monthly payment is affordable for the household.\n\
             Always use the calculation tools for numbers instead of estimating them. \
             State the assumptions you used (rate, term, down payment ratio) and show \
             the key figures before your recommendation.",
        )
        .with_tools(FINANCIAL_TOOLS)
        .with_keywords([
            "loan",
            "mortgage",
            "monthly payment",
            "repay",
            "interest rate",
            "down payment",
            "tax",
            "afford",
            "budget",
            "income",
            "total cost",
        ])
}

fn policy_expert() -> Role {
    Role::new(POLICY_EXPERT, "Policy Expert")
        .with_icon("📋")
        .with_description("Purchase policies, eligibility, provident fund and procedures")
        .with_prompt(
            "You are a housing policy expert. You explain purchase eligibility, \
             provident fund rules, subsidies and the buying procedure.\n\
             Search the policy, FAQ and buying-guide documents before answering, check \
             the news for recent changes, and cite the titles you relied on. If the \
             documents do not cover the question, say so plainly.",
        )
        .with_tools(POLICY_TOOLS)
        .with_keywords([
            "policy",
            "regulation",
            "eligib",
            "qualification",
            "provident fund",
            "subsidy",
            "restriction",
            "procedure",
            "contract",
            "transfer",
        ])
}

fn market_analyst() -> Role {
    Role::new(MARKET_ANALYST, "Market Analyst")
        .with_icon("📈")
        .with_description("House prices, district comparison and market timing")
        .with_prompt(
            "You are a residential market analyst. You read price levels, month over \
             month changes and inventory to judge where a district stands and whether \
             now is a reasonable time to buy.\n\
             Query the market data for every district you mention and keep opinions \
             separate from the figures.",
        )
        .with_tools(MARKET_TOOLS)
        .with_keywords([
            "market",
            "house price",
            "price trend",
            "district",
            "neighborhood",
            "timing",
            "good time",
            "appreciat",
            "investment",
        ])
}

fn purchase_consultant() -> Role {
    Role::new(PURCHASE_CONSULTANT, "Purchase Consultant")
        .with_icon("🏠")
        .with_description("General home-buying advice and synthesis of specialist views")
        .with_prompt(
            "You are a senior home-purchase consultant. You give practical, balanced \
             advice and, when specialists have already answered, you merge their \
             findings into one clear recommendation, resolving any disagreement \
             explicitly.\n\
             Use the tools when a figure is missing, and generate_report when the \
             buyer asks for a complete analysis. Finish with concrete next steps.",
        )
        .with_tools(
            FINANCIAL_TOOLS
                .iter()
                .chain(POLICY_TOOLS.iter())
                .chain(MARKET_TOOLS.iter())
                .chain(CONSULTANT_TOOLS.iter())
                .copied(),
        )
        .with_keywords(["recommend", "should i buy", "overall advice", "next step"])
}

impl RoleCatalog {
    /// The built-in advisory catalog.
    pub fn home_purchase() -> Result<Self, DomainError> {
        RoleCatalog::new(
            vec![
                financial_advisor(),
                policy_expert(),
                market_analyst(),
                purchase_consultant(),
            ],
            PURCHASE_CONSULTANT,
            PURCHASE_CONSULTANT,
        )
    }
}
