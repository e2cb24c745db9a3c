//! Policy, FAQ and buying-guide retrieval
//!
//! A small in-process knowledge base ranked by keyword overlap. Documents
//! are built in, or loaded from a JSON file shaped like:
//!
//! ```json
//! {
//!   "policies": [{"id": "...", "title": "...", "city": "nanning", "content": "...", "keywords": ["..."]}],
//!   "faqs": [{"id": "...", "question": "...", "answer": "...", "category": "...", "keywords": ["..."]}],
//!   "guides": [{"id": "...", "title": "...", "stage": "signing", "content": "...", "keywords": ["..."]}]
//! }
//! ```
//!
//! Guide content is split into paragraphs by blank lines; a hit returns
//! the paragraphs that best match the query.

use async_trait::async_trait;
use roundtable_domain::{
    ParamType, ToolDefinition, ToolError, ToolHandler, ToolParameter, ValidatedArgs,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

pub const SEARCH_POLICY: &str = "search_policy";
pub const SEARCH_FAQ: &str = "search_faq";
pub const SEARCH_GUIDE: &str = "search_guide";

/// Longest content excerpt returned per hit.
const EXCERPT_CHARS: usize = 500;
/// Longest guide section returned per hit.
const SECTION_CHARS: usize = 800;
/// Matching paragraphs kept per guide hit.
const SECTION_PARAGRAPHS: usize = 2;

pub const GUIDE_STAGES: [&str; 6] = [
    "viewing",
    "signing",
    "loan",
    "transfer",
    "handover",
    "renovation",
];

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDocument {
    pub id: String,
    pub title: String,
    /// `None` applies to every city.
    #[serde(default)]
    pub city: Option<String>,
    pub content: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub id: String,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// A step-by-step buying guide for one stage of the purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideEntry {
    pub id: String,
    pub title: String,
    /// One of [`GUIDE_STAGES`]; `None` covers the whole process.
    #[serde(default)]
    pub stage: Option<String>,
    pub content: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// One ranked hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Score scaled into `0.0..=1.0`
    pub relevance: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    #[serde(default)]
    pub policies: Vec<PolicyDocument>,
    #[serde(default)]
    pub faqs: Vec<FaqEntry>,
    #[serde(default)]
    pub guides: Vec<GuideEntry>,
}

impl KnowledgeBase {
    pub fn from_file(path: &Path) -> Result<Self, KnowledgeError> {
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| KnowledgeError::Io {
            path: display.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| KnowledgeError::Parse {
            path: display,
            source,
        })
    }

    /// Rank policy documents against `query`.
    ///
    /// Per document: +1 for each query word found in the content, +2 for
    /// each keyword contained in the query (or containing it), +3 when the
    /// whole query appears in the title. Documents scoring zero are dropped.
    pub fn search_policy(&self, query: &str, city: Option<&str>, top_k: usize) -> Vec<SearchHit> {
        let query = query.to_lowercase();
        let terms: Vec<&str> = query.split_whitespace().collect();

        let hits = self
            .policies
            .iter()
            .filter(|doc| city_matches(doc.city.as_deref(), city))
            .filter_map(|doc| {
                let content = doc.content.to_lowercase();
                let mut score = terms.iter().filter(|t| content.contains(*t)).count();
                score += doc
                    .keywords
                    .iter()
                    .map(|k| k.to_lowercase())
                    .filter(|k| !k.is_empty() && (query.contains(k.as_str()) || k.contains(&query)))
                    .count()
                    * 2;
                if !query.is_empty() && doc.title.to_lowercase().contains(&query) {
                    score += 3;
                }
                (score > 0).then(|| SearchHit {
                    id: doc.id.clone(),
                    title: doc.title.clone(),
                    content: excerpt(&doc.content),
                    city: doc.city.clone(),
                    category: None,
                    relevance: relevance(score),
                })
            })
            .collect();
        rank(hits, top_k)
    }

    /// Rank FAQ entries: +2 per query word in the question, +1 per word in
    /// the answer, +3 per keyword contained in the query.
    pub fn search_faq(
        &self,
        query: &str,
        city: Option<&str>,
        category: Option<&str>,
        top_k: usize,
    ) -> Vec<SearchHit> {
        let query = query.to_lowercase();
        let terms: Vec<&str> = query.split_whitespace().collect();

        let hits = self
            .faqs
            .iter()
            .filter(|faq| city_matches(faq.city.as_deref(), city))
            .filter(|faq| category.is_none_or(|c| faq.category.as_deref() == Some(c)))
            .filter_map(|faq| {
                let question = faq.question.to_lowercase();
                let answer = faq.answer.to_lowercase();
                let mut score = terms.iter().filter(|t| question.contains(*t)).count() * 2;
                score += terms.iter().filter(|t| answer.contains(*t)).count();
                score += faq
                    .keywords
                    .iter()
                    .filter(|k| !k.is_empty() && query.contains(&k.to_lowercase()))
                    .count()
                    * 3;
                (score > 0).then(|| SearchHit {
                    id: faq.id.clone(),
                    title: faq.question.clone(),
                    content: excerpt(&faq.answer),
                    city: faq.city.clone(),
                    category: faq.category.clone(),
                    relevance: relevance(score),
                })
            })
            .collect();
        rank(hits, top_k)
    }

    /// Rank guides against `query`, restricted to `stage` when given.
    ///
    /// Scored like policies, with the stage name counted as part of the
    /// query. Each hit carries the best matching paragraphs instead of the
    /// start of the guide.
    pub fn search_guide(&self, query: &str, stage: Option<&str>, top_k: usize) -> Vec<SearchHit> {
        let query = query.to_lowercase();
        let mut terms: Vec<&str> = query.split_whitespace().collect();
        let stage = stage.map(str::to_lowercase);
        if let Some(stage) = &stage {
            terms.push(stage.as_str());
        }

        let hits = self
            .guides
            .iter()
            .filter(|g| match (&stage, &g.stage) {
                (Some(wanted), Some(own)) => own.eq_ignore_ascii_case(wanted),
                _ => true,
            })
            .filter_map(|g| {
                let content = g.content.to_lowercase();
                let mut score = terms.iter().filter(|t| content.contains(*t)).count();
                score += g
                    .keywords
                    .iter()
                    .map(|k| k.to_lowercase())
                    .filter(|k| !k.is_empty() && (query.contains(k.as_str()) || k.contains(&query)))
                    .count()
                    * 2;
                if !query.is_empty() && g.title.to_lowercase().contains(&query) {
                    score += 3;
                }
                (score > 0).then(|| SearchHit {
                    id: g.id.clone(),
                    title: g.title.clone(),
                    content: relevant_section(&g.content, &terms),
                    city: None,
                    category: g.stage.clone(),
                    relevance: relevance(score),
                })
            })
            .collect();
        rank(hits, top_k)
    }

    /// Documents shipped with the binary.
    pub fn builtin() -> Self {
        Self {
            policies: vec![
                policy(
                    "policy_nanning_purchase",
                    "Nanning housing purchase policy",
                    Some("nanning"),
                    "Purchase restrictions in Nanning have been lifted for both residents and \
                     non-residents. A first home needs a minimum down payment of 15% under \
                     commercial loans and 20% under housing provident fund loans. A second \
                     home needs 25%. Buyers of a first home under 90 square meters pay 1% \
                     deed tax, above 90 square meters 1.5%.",
                    &["purchase restriction", "down payment", "deed tax", "first home", "second home"],
                ),
                policy(
                    "policy_nanning_provident_fund",
                    "Nanning housing provident fund loans",
                    Some("nanning"),
                    "The provident fund loan limit is 800,000 for a single contributor and \
                     1,000,000 for a couple. The five-year-plus provident fund rate is 2.85% \
                     for a first home. Contributors need at least 6 months of continuous \
                     payments. Combined loans pair a provident fund loan with a commercial loan.",
                    &["provident fund", "loan limit", "interest rate", "combined loan"],
                ),
                policy(
                    "policy_liuzhou_subsidy",
                    "Liuzhou home purchase subsidies",
                    Some("liuzhou"),
                    "Liuzhou grants a deed tax subsidy of 50% for new homes bought within the \
                     campaign period. Families with two or more children may borrow up to \
                     20% more from the provident fund. Talent programs offer an additional \
                     purchase subsidy for graduates.",
                    &["subsidy", "deed tax", "provident fund", "talent", "new home"],
                ),
                policy(
                    "policy_mortgage_rates",
                    "Commercial mortgage rate rules",
                    None,
                    "Commercial mortgage rates float on the five-year loan prime rate (LPR). \
                     The floor for a first home follows local policy and can be below the LPR. \
                     Existing borrowers may ask their bank to reprice once per year. Early \
                     repayment is allowed; some banks charge a fee in the first years.",
                    &["mortgage rate", "lpr", "interest rate", "early repayment"],
                ),
                policy(
                    "policy_second_hand_tax",
                    "Second-hand home transfer taxes",
                    None,
                    "VAT is waived when the seller has held the home for two years or more. \
                     Personal income tax is waived when the seller has held the home for five \
                     years and it is their only home. Otherwise income tax is 20% of the gain \
                     or 1% of the price.",
                    &["vat", "income tax", "second-hand", "transfer", "tax"],
                ),
            ],
            faqs: vec![
                faq(
                    "faq_down_payment",
                    "How much down payment do I need?",
                    "A first home usually needs at least 15% down with a commercial loan and \
                     20% with a provident fund loan. A second home needs at least 25%.",
                    "loan",
                    &["down payment"],
                ),
                faq(
                    "faq_repayment_method",
                    "Should I choose equal payment or equal principal?",
                    "Equal payment keeps the monthly amount fixed and suits stable incomes. \
                     Equal principal costs less interest in total but the first payments are \
                     higher.",
                    "loan",
                    &["equal payment", "equal principal", "repayment"],
                ),
                faq(
                    "faq_provident_fund_use",
                    "Can I use my provident fund for the down payment?",
                    "Provident fund balances can be withdrawn after the purchase contract is \
                     registered to repay the loan or reimburse the down payment.",
                    "provident fund",
                    &["provident fund", "withdraw"],
                ),
                faq(
                    "faq_taxes_second_hand",
                    "Which taxes apply when buying a second-hand home?",
                    "The buyer pays deed tax. VAT and income tax are legally the seller's but \
                     are often passed on; both depend on how long the seller held the home.",
                    "tax",
                    &["tax", "second-hand"],
                ),
                faq(
                    "faq_credit_record",
                    "Does a late credit card payment affect my mortgage?",
                    "Banks review the last two years of credit history. Occasional late \
                     payments may raise the rate; repeated defaults can lead to rejection.",
                    "loan",
                    &["credit", "late payment"],
                ),
            ],
            guides: vec![
                guide(
                    "guide_viewing",
                    "Viewing homes",
                    "viewing",
                    "Visit at different times of day to judge noise, light and traffic. \
                     Check the orientation, floor height and the distance to schools and \
                     transit.\n\n\
                     For a second-hand home, ask for the title certificate and confirm the \
                     seller is the registered owner and that the home is not mortgaged or \
                     seized.\n\n\
                     For a new project, check the presale permit and the developer's \
                     delivery record before paying any deposit.",
                    &["viewing", "inspection", "presale permit", "title certificate"],
                ),
                guide(
                    "guide_signing",
                    "Signing the purchase contract",
                    "signing",
                    "Read every clause before signing. Confirm the price, payment schedule, \
                     delivery date and the penalty for late delivery.\n\n\
                     Write down what happens if the loan is rejected; a good contract lets \
                     the buyer cancel and recover the deposit.\n\n\
                     Register the contract online with the housing authority so the home \
                     cannot be sold twice.",
                    &["contract", "deposit", "penalty", "registration"],
                ),
                guide(
                    "guide_loan",
                    "Applying for the mortgage",
                    "loan",
                    "Prepare identity documents, proof of income, bank statements for six \
                     months and the signed contract.\n\n\
                     Compare the rate and early repayment terms of several banks. A \
                     provident fund loan is cheaper; a combined loan covers the rest.\n\n\
                     Approval usually takes two to four weeks. Do not take on new debt \
                     while the application is pending.",
                    &["mortgage", "loan application", "bank", "approval", "provident fund"],
                ),
                guide(
                    "guide_transfer",
                    "Transferring ownership",
                    "transfer",
                    "Buyer and seller go to the registration center together with the \
                     contract, identity documents and tax receipts.\n\n\
                     Pay the deed tax and the seller's taxes before registration; the new \
                     title certificate is issued within a few working days.\n\n\
                     Transfer utilities and the property management account on the same \
                     day.",
                    &["transfer", "ownership", "registration", "deed tax", "title"],
                ),
                guide(
                    "guide_handover",
                    "Taking delivery",
                    "handover",
                    "Inspect walls, floors, windows, plumbing and wiring before signing the \
                     handover form. Record every defect with photos.\n\n\
                     Check that the area on the measurement report matches the contract; \
                     differences above 3% can be refunded or the contract cancelled.\n\n\
                     Keep the keys receipt, the quality guarantee and the user manual.",
                    &["handover", "delivery", "inspection", "defect", "area"],
                ),
                guide(
                    "guide_renovation",
                    "Planning the renovation",
                    "renovation",
                    "Budget about 10% to 15% of the price for renovation, furniture and \
                     appliances.\n\n\
                     Get at least three quotes, sign a contract with itemised prices and \
                     pay in stages tied to inspections.\n\n\
                     Ventilate for at least three months before moving in.",
                    &["renovation", "decoration", "budget", "contractor"],
                ),
            ],
        }
    }
}

fn policy(id: &str, title: &str, city: Option<&str>, content: &str, keywords: &[&str]) -> PolicyDocument {
    PolicyDocument {
        id: id.to_string(),
        title: title.to_string(),
        city: city.map(str::to_string),
        content: content.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    }
}

fn faq(id: &str, question: &str, answer: &str, category: &str, keywords: &[&str]) -> FaqEntry {
    FaqEntry {
        id: id.to_string(),
        question: question.to_string(),
        answer: answer.to_string(),
        category: Some(category.to_string()),
        city: None,
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    }
}

fn guide(id: &str, title: &str, stage: &str, content: &str, keywords: &[&str]) -> GuideEntry {
    GuideEntry {
        id: id.to_string(),
        title: title.to_string(),
        stage: Some(stage.to_string()),
        content: content.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    }
}

/// Up to [`SECTION_PARAGRAPHS`] paragraphs containing the most terms,
/// in score order. Falls back to the start of the content.
fn relevant_section(content: &str, terms: &[&str]) -> String {
    let mut scored: Vec<(usize, &str)> = content
        .split("\n\n")
        .map(|para| {
            let lower = para.to_lowercase();
            (terms.iter().filter(|t| lower.contains(*t)).count(), para)
        })
        .filter(|(score, _)| *score > 0)
        .collect();
    if scored.is_empty() {
        return excerpt(content);
    }
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    let section = scored
        .iter()
        .take(SECTION_PARAGRAPHS)
        .map(|(_, para)| *para)
        .collect::<Vec<_>>()
        .join("\n\n");
    section.chars().take(SECTION_CHARS).collect()
}

/// City-less documents match every city filter.
fn city_matches(doc_city: Option<&str>, filter: Option<&str>) -> bool {
    match (doc_city, filter) {
        (Some(doc), Some(wanted)) => doc.eq_ignore_ascii_case(wanted),
        _ => true,
    }
}

fn relevance(score: usize) -> f64 {
    (score as f64 / 10.0).min(1.0)
}

fn excerpt(content: &str) -> String {
    if content.chars().count() > EXCERPT_CHARS {
        let cut: String = content.chars().take(EXCERPT_CHARS).collect();
        format!("{}...", cut)
    } else {
        content.to_string()
    }
}

/// Stable sort keeps document order among equal scores.
fn rank(mut hits: Vec<SearchHit>, top_k: usize) -> Vec<SearchHit> {
    hits.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
    hits.truncate(top_k.max(1));
    hits
}

fn top_k_parameter() -> ToolParameter {
    ToolParameter::new("top_k", "Number of results to return", false).with_type(ParamType::Integer)
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    stage: Option<String>,
    #[serde(default)]
    top_k: Option<i64>,
}

impl SearchArgs {
    fn top_k(&self, default: usize) -> usize {
        self.top_k
            .and_then(|k| usize::try_from(k).ok())
            .filter(|k| *k > 0)
            .unwrap_or(default)
    }
}

fn search_response(query: &str, hits: Vec<SearchHit>) -> Value {
    let count = hits.len();
    json!({
        "query": query,
        "count": count,
        "results": hits,
    })
}

pub fn search_policy_definition() -> ToolDefinition {
    ToolDefinition::new(
        SEARCH_POLICY,
        "Search housing policy documents: purchase restrictions, loan rules, taxes and subsidies",
    )
    .with_parameter(ToolParameter::new(
        "query",
        "What to look for, e.g. 'provident fund loan limit'",
        true,
    ))
    .with_parameter(
        ToolParameter::new("city", "Restrict results to one city", false)
            .with_enum(["nanning", "liuzhou"]),
    )
    .with_parameter(top_k_parameter())
}

pub struct SearchPolicy {
    definition: ToolDefinition,
    knowledge: Arc<KnowledgeBase>,
    top_k: usize,
}

impl SearchPolicy {
    pub fn new(knowledge: Arc<KnowledgeBase>, top_k: usize) -> Self {
        Self {
            definition: search_policy_definition(),
            knowledge,
            top_k,
        }
    }
}

#[async_trait]
impl ToolHandler for SearchPolicy {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, args: ValidatedArgs) -> Result<Value, ToolError> {
        let args: SearchArgs = args.parse()?;
        if args.query.trim().is_empty() {
            return Err(ToolError::invalid_argument("query must not be empty"));
        }
        let hits = self
            .knowledge
            .search_policy(&args.query, args.city.as_deref(), args.top_k(self.top_k));
        Ok(search_response(&args.query, hits))
    }
}

pub fn search_faq_definition() -> ToolDefinition {
    ToolDefinition::new(
        SEARCH_FAQ,
        "Search frequently asked home-buying questions and their answers",
    )
    .with_parameter(ToolParameter::new("query", "The buyer's question", true))
    .with_parameter(
        ToolParameter::new("category", "Restrict results to one category", false)
            .with_enum(["loan", "tax", "provident fund"]),
    )
    .with_parameter(top_k_parameter())
}

pub struct SearchFaq {
    definition: ToolDefinition,
    knowledge: Arc<KnowledgeBase>,
    top_k: usize,
}

impl SearchFaq {
    pub fn new(knowledge: Arc<KnowledgeBase>, top_k: usize) -> Self {
        Self {
            definition: search_faq_definition(),
            knowledge,
            top_k,
        }
    }
}

#[async_trait]
impl ToolHandler for SearchFaq {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, args: ValidatedArgs) -> Result<Value, ToolError> {
        let args: SearchArgs = args.parse()?;
        if args.query.trim().is_empty() {
            return Err(ToolError::invalid_argument("query must not be empty"));
        }
        let hits = self.knowledge.search_faq(
            &args.query,
            args.city.as_deref(),
            args.category.as_deref(),
            args.top_k(self.top_k),
        );
        Ok(search_response(&args.query, hits))
    }
}

pub fn search_guide_definition() -> ToolDefinition {
    ToolDefinition::new(
        SEARCH_GUIDE,
        "Search the step-by-step home buying guide, from viewing to renovation",
    )
    .with_parameter(ToolParameter::new(
        "query",
        "What the buyer wants to know, e.g. 'what to check before signing'",
        true,
    ))
    .with_parameter(
        ToolParameter::new("stage", "Restrict results to one stage of the purchase", false)
            .with_enum(GUIDE_STAGES),
    )
    .with_parameter(top_k_parameter())
}

pub struct SearchGuide {
    definition: ToolDefinition,
    knowledge: Arc<KnowledgeBase>,
    top_k: usize,
}

impl SearchGuide {
    pub fn new(knowledge: Arc<KnowledgeBase>, top_k: usize) -> Self {
        Self {
            definition: search_guide_definition(),
            knowledge,
            top_k,
        }
    }
}

#[async_trait]
impl ToolHandler for SearchGuide {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, args: ValidatedArgs) -> Result<Value, ToolError> {
        let args: SearchArgs = args.parse()?;
        if args.query.trim().is_empty() {
            return Err(ToolError::invalid_argument("query must not be empty"));
        }
        let hits = self.knowledge.search_guide(
            &args.query,
            args.stage.as_deref(),
            args.top_k(self.top_k),
        );
        let mut response = search_response(&args.query, hits);
        response["stage"] = json!(args.stage);
        Ok(response)
    }
}
