//! Housing news search
//!
//! A dated corpus of policy and market news, built in or loaded from a
//! JSON file shaped like:
//!
//! ```json
//! {
//!   "as_of": "2025-12-31",
//!   "articles": [{"id": "...", "title": "...", "summary": "...", "source": "...",
//!                 "url": "...", "publish_date": "2025-12-15", "city": "nanning",
//!                 "keywords": ["..."]}]
//! }
//! ```
//!
//! The `days` window of a search counts back from `as_of`, or from the
//! newest article when the file sets none.

use super::knowledge::KnowledgeError;
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use roundtable_domain::{
    ParamType, ToolDefinition, ToolError, ToolHandler, ToolParameter, ValidatedArgs,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::Path;
use std::sync::Arc;

pub const SEARCH_NEWS: &str = "search_news";

/// Most articles returned by one search.
const MAX_RESULTS: usize = 5;
const DEFAULT_DAYS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub source: String,
    #[serde(default)]
    pub url: Option<String>,
    pub publish_date: NaiveDate,
    /// `None` for province-wide or national news.
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsFeed {
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
    #[serde(default)]
    pub articles: Vec<NewsArticle>,
}

impl NewsFeed {
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

    /// Date the `days` window ends at.
    pub fn reference_date(&self) -> Option<NaiveDate> {
        self.as_of
            .or_else(|| self.articles.iter().map(|a| a.publish_date).max())
    }

    /// Articles matching `query`, best first.
    ///
    /// +3 for each query word in the title, +1 for each in the summary,
    /// +2 for each keyword contained in the query (or containing it).
    /// Ties go to the newer article.
    pub fn search(&self, query: &str, city: Option<&str>, days: u64) -> Vec<&NewsArticle> {
        let query = query.to_lowercase();
        let terms: Vec<&str> = query.split_whitespace().collect();
        let cutoff = self
            .reference_date()
            .and_then(|d| d.checked_sub_days(Days::new(days)));

        let mut scored: Vec<(usize, &NewsArticle)> = self
            .articles
            .iter()
            .filter(|a| match (&a.city, city) {
                (Some(own), Some(wanted)) => own.eq_ignore_ascii_case(wanted),
                _ => true,
            })
            .filter(|a| cutoff.is_none_or(|c| a.publish_date >= c))
            .filter_map(|a| {
                let title = a.title.to_lowercase();
                let summary = a.summary.to_lowercase();
                let mut score = terms.iter().filter(|t| title.contains(*t)).count() * 3;
                score += terms.iter().filter(|t| summary.contains(*t)).count();
                score += a
                    .keywords
                    .iter()
                    .map(|k| k.to_lowercase())
                    .filter(|k| !k.is_empty() && (query.contains(k.as_str()) || k.contains(&query)))
                    .count()
                    * 2;
                (score > 0).then_some((score, a))
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.publish_date.cmp(&a.1.publish_date)));
        scored.into_iter().take(MAX_RESULTS).map(|(_, a)| a).collect()
    }

    /// Articles shipped with the binary.
    pub fn builtin() -> Self {
        Self {
            as_of: None,
            articles: vec![
                article(
                    "news_001",
                    "Nanning eases purchase rules for 2025",
                    "The Nanning housing bureau lowered the minimum down payment to 20% for a \
                     first home and 30% for a second home, supporting both first-time and \
                     upgrade buyers.",
                    "Nanning Housing Bureau",
                    (2025, 12, 15),
                    Some("nanning"),
                    &["purchase restriction", "down payment", "regulation"],
                ),
                article(
                    "news_002",
                    "Provident fund loan limit raised to 800,000",
                    "From 1 January 2026 the regional provident fund center raises the loan \
                     limit for dual-contributor families from 600,000 to 800,000 and for \
                     single contributors to 500,000.",
                    "Regional Provident Fund Center",
                    (2025, 12, 20),
                    None,
                    &["provident fund", "loan limit"],
                ),
                article(
                    "news_003",
                    "Liuzhou sales recover, up 15% month over month",
                    "Liuzhou recorded 3,200 new home sales in November, 15% more than in \
                     October and 8% more than a year earlier. Buyer confidence is returning.",
                    "Liuzhou Daily",
                    (2025, 12, 10),
                    Some("liuzhou"),
                    &["sales", "market", "recovery"],
                ),
                article(
                    "news_004",
                    "New Qingxiu project opens at about 15,000 per m²",
                    "A branded project in northern Qingxiu released 500 homes of 89 to 143 \
                     m² at an average of 15,000 per m².",
                    "Nanning Evening News",
                    (2025, 12, 18),
                    Some("nanning"),
                    &["new project", "qingxiu", "launch"],
                ),
                article(
                    "news_005",
                    "Mortgage rates expected to fall further in 2026",
                    "Analysts expect more room for LPR cuts in 2026, which could bring first \
                     home mortgage rates below 3.5% and lower the cost of buying.",
                    "Economic Observer",
                    (2025, 12, 22),
                    None,
                    &["interest rate", "lpr", "mortgage"],
                ),
                article(
                    "news_006",
                    "Chengzhong starts renewal of old estates covering 3,000 households",
                    "Liuzhou's Chengzhong district begins renovating 15 older estates with \
                     about 3,000 households, a 200 million investment due to finish in 2027.",
                    "Liuzhou Housing Bureau",
                    (2025, 12, 8),
                    Some("liuzhou"),
                    &["urban renewal", "chengzhong", "old estates"],
                ),
                article(
                    "news_007",
                    "Nanning metro line 6 plan published",
                    "The first phase of metro line 6 runs about 25 km with 18 stations and is \
                     due to open in 2028. Interest in projects along the line is rising.",
                    "Nanning Development Commission",
                    (2025, 12, 25),
                    Some("nanning"),
                    &["metro", "transport", "planning"],
                ),
                article(
                    "news_008",
                    "Deed tax relief extended to the end of 2026",
                    "Buyers of a family's only home keep the reduced deed tax until 31 \
                     December 2026: 1% for homes up to 90 m².",
                    "Regional Finance Department",
                    (2025, 12, 28),
                    None,
                    &["deed tax", "tax relief", "tax"],
                ),
            ],
        }
    }
}

fn article(
    id: &str,
    title: &str,
    summary: &str,
    source: &str,
    (year, month, day): (i32, u32, u32),
    city: Option<&str>,
    keywords: &[&str],
) -> NewsArticle {
    NewsArticle {
        id: id.to_string(),
        title: title.to_string(),
        summary: summary.to_string(),
        source: source.to_string(),
        url: None,
        publish_date: NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN),
        city: city.map(str::to_string),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    }
}

pub fn search_news_definition() -> ToolDefinition {
    ToolDefinition::new(
        SEARCH_NEWS,
        "Search recent housing policy news and market updates",
    )
    .with_parameter(ToolParameter::new(
        "query",
        "Keywords, e.g. 'provident fund' or 'mortgage rate'",
        true,
    ))
    .with_parameter(
        ToolParameter::new("city", "Restrict results to one city", false)
            .with_enum(["nanning", "liuzhou"]),
    )
    .with_parameter(
        ToolParameter::new("days", "Only news from the last N days, default 30", false)
            .with_type(ParamType::Integer),
    )
}

#[derive(Debug, Deserialize)]
struct NewsArgs {
    query: String,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    days: Option<i64>,
}

pub struct SearchNews {
    definition: ToolDefinition,
    feed: Arc<NewsFeed>,
}

impl SearchNews {
    pub fn new(feed: Arc<NewsFeed>) -> Self {
        Self {
            definition: search_news_definition(),
            feed,
        }
    }
}

#[async_trait]
impl ToolHandler for SearchNews {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, args: ValidatedArgs) -> Result<Value, ToolError> {
        let args: NewsArgs = args.parse()?;
        if args.query.trim().is_empty() {
            return Err(ToolError::invalid_argument("query must not be empty"));
        }
        let days = match args.days {
            None => DEFAULT_DAYS,
            Some(d) if d >= 1 => d as u64,
            Some(_) => return Err(ToolError::invalid_argument("days must be at least 1")),
        };

        let results = self.feed.search(&args.query, args.city.as_deref(), days);
        Ok(json!({
            "query": args.query,
            "city": args.city,
            "days": days,
            "as_of": self.feed.reference_date(),
            "count": results.len(),
            "results": results,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roundtable_domain::{DefaultToolValidator, ToolCall, ToolValidator};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_window_counts_back_from_newest_article() {
        let feed = NewsFeed::builtin();
        assert_eq!(
            feed.reference_date(),
            NaiveDate::from_ymd_opt(2025, 12, 28)
        );
        // 2025-12-08 is 20 days before the newest article
        let renewal = |days| {
            feed.search("chengzhong", Some("liuzhou"), days)
                .iter()
                .any(|a| a.id == "news_006")
        };
        assert!(renewal(30));
        assert!(!renewal(10));
    }

    #[test]
    fn test_city_filter_keeps_regional_news() {
        let feed = NewsFeed::builtin();
        let hits = feed.search("provident fund", Some("liuzhou"), 30);
        assert_eq!(hits[0].id, "news_002");
        assert!(hits.iter().all(|a| a.city.as_deref() != Some("nanning")));
    }

    #[test]
    fn test_ties_go_to_newer_article() {
        let feed = NewsFeed::builtin();
        let hits = feed.search("tax", None, 60);
        assert_eq!(hits[0].id, "news_008");
        assert!(hits.len() <= MAX_RESULTS);
    }

    #[test]
    fn test_from_file_with_explicit_as_of() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"as_of": "2026-03-01", "articles": [{{"id": "n1", "title": "Rate cut", "summary": "LPR down", "source": "Wire", "publish_date": "2026-01-15"}}]}}"#
        )
        .unwrap();
        let feed = NewsFeed::from_file(file.path()).unwrap();
        assert_eq!(feed.search("rate", None, 30).len(), 0);
        assert_eq!(feed.search("rate", None, 60).len(), 1);
    }

    #[tokio::test]
    async fn test_search_news_tool_rejects_zero_days() {
        let tool = SearchNews::new(Arc::new(NewsFeed::builtin()));
        let call = ToolCall::new(SEARCH_NEWS)
            .with_arg("query", "metro")
            .with_arg("days", 0);
        let args = DefaultToolValidator.validate(&call, tool.definition()).unwrap();
        let err = tool.execute(args).await.unwrap_err();
        assert_eq!(err.code, "INVALID_ARGUMENT");
    }

    #[tokio::test]
    async fn test_search_news_tool_defaults_to_thirty_days() {
        let tool = SearchNews::new(Arc::new(NewsFeed::builtin()));
        let call = ToolCall::new(SEARCH_NEWS).with_arg("query", "metro");
        let args = DefaultToolValidator.validate(&call, tool.definition()).unwrap();
        let out = tool.execute(args).await.unwrap();
        assert_eq!(out["days"], 30);
        assert_eq!(out["as_of"], "2025-12-28");
        assert_eq!(out["results"][0]["id"], "news_007");
    }
}
