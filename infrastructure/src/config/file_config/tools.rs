//! Built-in tool configuration from TOML (`[tools]` section)

use crate::tools::builtin::financial::TaxRates;
use roundtable_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// # Example
///
/// ```toml
/// [tools.tax]
/// agent_fee_rate = 0.015
/// misc_fees = 800
///
/// [tools.knowledge]
/// path = "knowledge.json"
/// top_k = 5
///
/// [tools.news]
/// path = "news.json"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileToolsConfig {
    /// Rates used by `calc_tax`.
    pub tax: TaxRates,
    /// Document source for `search_policy`, `search_faq` and `search_guide`.
    pub knowledge: FileKnowledgeConfig,
    /// Article source for `search_news`.
    pub news: FileNewsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileKnowledgeConfig {
    /// JSON file with `policies`, `faqs` and `guides` arrays. Built-in
    /// documents are used when unset.
    pub path: Option<PathBuf>,
    /// Default number of hits returned by a search.
    pub top_k: usize,
}

impl Default for FileKnowledgeConfig {
    fn default() -> Self {
        Self {
            path: None,
            top_k: 3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileNewsConfig {
    /// JSON file with an `articles` array and an optional `as_of` date.
    /// Built-in articles are used when unset.
    pub path: Option<PathBuf>,
}

impl FileToolsConfig {
    pub(super) fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        for (field, rate) in self.tax.rates() {
            if !(0.0..=1.0).contains(&rate) {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::OutOfRange,
                    format!("tools.tax.{} = {} is not a fraction between 0 and 1", field, rate),
                ));
            }
        }
        if self.tax.misc_fees < 0.0 {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::OutOfRange,
                "tools.tax.misc_fees is negative",
            ));
        }
        if self.knowledge.top_k == 0 {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::OutOfRange,
                "tools.knowledge.top_k must be at least 1, using 1",
            ));
        }
        issues
    }
}
