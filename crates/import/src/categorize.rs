use ledgerline_core::PendingTransaction;
use serde::{Deserialize, Serialize};

/// One categorization rule: if any keyword appears in the description
/// (case-insensitive substring), the rule's category applies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRule {
    pub category: String,
    pub keywords: Vec<String>,
}

/// The built-in merchant keyword table, in match order. Earlier rules win,
/// which is load-bearing: "coffee" must be claimed by Food & Dining before
/// any fee rule could see the "fee" substring inside it.
const STANDARD_RULES: &[(&str, &[&str])] = &[
    (
        "Food & Dining",
        &[
            "starbucks", "coffee", "restaurant", "mcdonald", "burger", "pizza", "chipotle",
            "doordash", "grubhub", "cafe", "diner", "bakery",
        ],
    ),
    (
        "Groceries",
        &[
            "grocery", "whole foods", "safeway", "kroger", "trader joe", "supermarket", "costco",
        ],
    ),
    (
        "Transportation",
        &[
            "gas", "shell", "fuel", "chevron", "exxon", "uber", "lyft", "parking", "transit",
            "toll",
        ],
    ),
    (
        "Income",
        &["salary", "payroll", "direct deposit", "dividend"],
    ),
    ("Housing", &["rent", "mortgage", "hoa dues"]),
    (
        "Utilities",
        &[
            "electric", "water bill", "internet", "comcast", "verizon", "utility",
        ],
    ),
    (
        "Entertainment",
        &["netflix", "spotify", "hulu", "cinema", "theater"],
    ),
    (
        "Shopping",
        &["amazon", "walmart", "target", "best buy", "ebay"],
    ),
    (
        "Bank Fees",
        &["overdraft", "service fee", "atm fee", "monthly fee", "wire fee"],
    ),
];

/// An ordered rule table. First matching rule wins; rows matching nothing
/// stay uncategorized so the review screen can surface them — the engine
/// never invents a catch-all label.
#[derive(Debug, Clone)]
pub struct CategoryRuleSet {
    rules: Vec<CategoryRule>,
}

impl CategoryRuleSet {
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        CategoryRuleSet { rules }
    }

    /// The default table shipped with the engine.
    pub fn standard() -> Self {
        CategoryRuleSet::new(
            STANDARD_RULES
                .iter()
                .map(|(category, keywords)| CategoryRule {
                    category: category.to_string(),
                    keywords: keywords.iter().map(|k| k.to_string()).collect(),
                })
                .collect(),
        )
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// First rule with a keyword contained in the description, if any.
    pub fn match_category(&self, description: &str) -> Option<&str> {
        let haystack = description.to_lowercase();
        self.rules
            .iter()
            .find(|rule| {
                rule.keywords
                    .iter()
                    .any(|kw| haystack.contains(&kw.to_lowercase()))
            })
            .map(|rule| rule.category.as_str())
    }
}

impl Default for CategoryRuleSet {
    fn default() -> Self {
        CategoryRuleSet::standard()
    }
}

/// Annotate each row with its best-effort category. Pure and deterministic
/// for a fixed rule table; rows are returned in input order.
pub fn categorize_rows(
    rows: &[PendingTransaction],
    rules: &CategoryRuleSet,
) -> Vec<PendingTransaction> {
    rows.iter()
        .map(|row| {
            let mut row = row.clone();
            if row.category.is_none() {
                row.category = rules.match_category(&row.description).map(String::from);
            }
            row
        })
        .collect()
}
