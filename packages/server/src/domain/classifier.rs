//! Keyword-based sensitivity classifier.
//!
//! Flags user messages that must not be answered by the automated responder.
//! Matching is a case-insensitive contiguous substring scan; the first
//! configured category with a matching keyword wins.

use serde::{Deserialize, Serialize};

/// One category of sensitive topics and the keywords that identify it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitiveCategory {
    pub category: String,
    pub keywords: Vec<String>,
}

impl SensitiveCategory {
    pub fn new(category: impl Into<String>, keywords: &[&str]) -> Self {
        Self {
            category: category.into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Ordered category table with lower-cased keywords.
#[derive(Debug, Clone)]
pub struct SensitivityClassifier {
    categories: Vec<SensitiveCategory>,
}

impl SensitivityClassifier {
    /// Build a classifier from an ordered category table.
    ///
    /// Empty keywords are discarded; they would match every text.
    pub fn new(categories: Vec<SensitiveCategory>) -> Self {
        let categories = categories
            .into_iter()
            .map(|c| SensitiveCategory {
                category: c.category,
                keywords: c
                    .keywords
                    .into_iter()
                    .map(|k| k.to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect(),
            })
            .collect();
        Self { categories }
    }

    /// Return the first category with a keyword contained in `text`.
    pub fn classify(&self, text: &str) -> Option<&str> {
        let lowered = text.to_lowercase();
        self.categories
            .iter()
            .find(|c| c.keywords.iter().any(|k| lowered.contains(k.as_str())))
            .map(|c| c.category.as_str())
    }

    #[cfg(test)]
    pub fn categories(&self) -> &[SensitiveCategory] {
        &self.categories
    }
}

impl Default for SensitivityClassifier {
    fn default() -> Self {
        Self::new(default_categories())
    }
}

/// Built-in category table.
pub fn default_categories() -> Vec<SensitiveCategory> {
    vec![
        SensitiveCategory::new(
            "Financial & Business Information",
            &[
                "revenue",
                "profit margin",
                "financial statements",
                "valuation",
                "charges",
                "cost",
            ],
        ),
        SensitiveCategory::new(
            "Legal & Compliance Issues",
            &["lawsuit", "court order", "policy violation", "nda"],
        ),
        SensitiveCategory::new(
            "Employee & HR Data",
            &["salary", "compensation", "benefits", "layoffs"],
        ),
        SensitiveCategory::new(
            "Security & Data Breach",
            &["cyber attack", "hacked", "data breach", "password leak"],
        ),
        SensitiveCategory::new(
            "Negative Reputation & Crisis Management",
            &["scandal", "fraud", "public backlash", "ceo resignation"],
        ),
        SensitiveCategory::new(
            "Competitive & Confidential Information",
            &["competitor strategy", "pricing model", "business secrets"],
        ),
        SensitiveCategory::new(
            "Unethical or Illegal Activities",
            &["bribery", "corruption", "money laundering", "insider trading"],
        ),
        SensitiveCategory::new(
            "Fraudulent & Phishing Attempts",
            &["fake refund", "payment dispute", "unauthorized transaction"],
        ),
        SensitiveCategory::new(
            "Workplace Culture & Ethics",
            &["work-life balance", "employee burnout", "toxic culture"],
        ),
        SensitiveCategory::new(
            "Political & Social Issues",
            &["government policy", "human rights", "labor rights"],
        ),
    ]
}
