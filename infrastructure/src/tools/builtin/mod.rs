//! Built-in home-purchase advisory tools
//!
//! | tool | module |
//! |------|--------|
//! | `calc_loan`, `calc_tax`, `calc_total_cost`, `assess_pressure`, `generate_repayment_plan` | [`financial`] |
//! | `search_policy`, `search_faq`, `search_guide` | [`knowledge`] |
//! | `query_market`, `query_price_trend`, `compare_districts`, `judge_timing` | [`market`] |
//! | `search_news` | [`news`] |
//! | `generate_report` | [`report`] |

pub mod financial;
pub mod knowledge;
pub mod market;
pub mod news;
pub mod report;

use std::sync::Arc;

pub use financial::{
    AssessPressure, CalcLoan, CalcTax, CalcTotalCost, GenerateRepaymentPlan, TaxRates,
};
pub use knowledge::{KnowledgeBase, KnowledgeError, SearchFaq, SearchGuide, SearchPolicy};
pub use market::{CompareDistricts, JudgeTiming, QueryMarket, QueryPriceTrend};
pub use news::{NewsFeed, SearchNews};
pub use report::GenerateReport;

use super::registry::ToolRegistry;
use crate::config::FileToolsConfig;
use tracing::info;

/// Data sources behind the retrieval tools.
#[derive(Debug, Clone)]
pub struct AdvisoryData {
    pub knowledge: Arc<KnowledgeBase>,
    pub news: Arc<NewsFeed>,
}

impl AdvisoryData {
    pub fn builtin() -> Self {
        Self {
            knowledge: Arc::new(KnowledgeBase::builtin()),
            news: Arc::new(NewsFeed::builtin()),
        }
    }
}

/// Registry holding every built-in tool.
pub fn advisory_registry(tax: TaxRates, data: AdvisoryData, top_k: usize) -> ToolRegistry {
    let top_k = top_k.max(1);
    ToolRegistry::new()
        .register(CalcLoan::new())
        .register(CalcTax::new(tax.clone()))
        .register(CalcTotalCost::new())
        .register(AssessPressure::new())
        .register(GenerateRepaymentPlan::new())
        .register(SearchPolicy::new(data.knowledge.clone(), top_k))
        .register(SearchFaq::new(data.knowledge.clone(), top_k))
        .register(SearchGuide::new(data.knowledge, top_k))
        .register(SearchNews::new(data.news))
        .register(QueryMarket::new())
        .register(QueryPriceTrend::new())
        .register(CompareDistricts::new())
        .register(JudgeTiming::new())
        .register(GenerateReport::new(tax))
}

/// Registry built from the `[tools]` section.
///
/// Loads the knowledge and news files when configured; a missing or
/// broken file is an error rather than a silent fallback to built-in
/// documents.
pub fn configured_registry(config: &FileToolsConfig) -> Result<ToolRegistry, KnowledgeError> {
    let knowledge = match &config.knowledge.path {
        Some(path) => {
            let kb = KnowledgeBase::from_file(path)?;
            info!(
                path = %path.display(),
                policies = kb.policies.len(),
                faqs = kb.faqs.len(),
                guides = kb.guides.len(),
                "Loaded knowledge file"
            );
            kb
        }
        None => KnowledgeBase::builtin(),
    };
    let news = match &config.news.path {
        Some(path) => {
            let feed = NewsFeed::from_file(path)?;
            info!(
                path = %path.display(),
                articles = feed.articles.len(),
                "Loaded news file"
            );
            feed
        }
        None => NewsFeed::builtin(),
    };
    Ok(advisory_registry(
        config.tax.clone(),
        AdvisoryData {
            knowledge: Arc::new(knowledge),
            news: Arc::new(news),
        },
        config.knowledge.top_k,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use roundtable_application::ToolExecutorPort;
    use roundtable_domain::RoleCatalog;

    #[test]
    fn test_advisory_registry_covers_builtin_roles() {
        let registry = advisory_registry(TaxRates::default(), AdvisoryData::builtin(), 3);
        assert_eq!(registry.stats().total_tools, 14);

        let catalog = RoleCatalog::home_purchase().unwrap();
        assert!(catalog.validate_tools(registry.tool_spec()).is_ok());
    }

    #[test]
    fn test_configured_registry_reports_missing_knowledge_file() {
        let mut config = FileToolsConfig::default();
        config.knowledge.path = Some("/nonexistent/knowledge.json".into());
        assert!(matches!(
            configured_registry(&config),
            Err(KnowledgeError::Io { .. })
        ));
    }

    #[test]
    fn test_configured_registry_reports_missing_news_file() {
        let mut config = FileToolsConfig::default();
        config.news.path = Some("/nonexistent/news.json".into());
        let err = configured_registry(&config).err().unwrap();
        assert!(err.to_string().contains("news.json"));
    }
}
