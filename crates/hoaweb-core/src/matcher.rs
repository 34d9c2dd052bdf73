//! Category matcher
//!
//! Resolves free-text transaction labels to one of the categories being
//! charted. Matching is first-hit-wins over the candidate list in its ranked
//! order, and containment is checked in both directions, so a short
//! candidate such as "Gas" can claim a label meant for a later candidate.
//! That order sensitivity is part of the contract: each view keeps its own
//! ranking and the same ranking always gives the same answer.

use hoaweb_config::KeywordRule;
use hoaweb_loader::Transaction;

use crate::types::LabelMatching;

/// Bucket for transactions that match no candidate
pub const OTHER: &str = "Other";

const BUILTIN_KEYWORDS: &[(&str, &str)] = &[
    ("guard", "Guard Service"),
    ("insurance", "Insurance"),
    ("legal", "Legal Fees"),
    ("lifeguard", "Lifeguards"),
    ("management", "Management Expenses"),
    ("office", "Office Supplies"),
    ("police", "Police Detail"),
    ("social", "Social Functions"),
    ("website", "Website"),
    ("accounting", "Accounting & Software"),
    ("bank", "Bank Service Charges"),
    ("janitorial", "Janitorial Expenses"),
    ("pool", "Swimming Pool"),
    ("landscap", "Grass Cutting & Landscaping"),
    ("tree", "Tree Removal"),
    ("gate", "Gate Maintenance & Repair"),
    ("electric", "Electric"),
    ("water", "Water"),
    ("telephone", "Telephone"),
    ("gas", "Gas"),
];

/// Ordered keyword → category fallback table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordTable {
    rules: Vec<(String, String)>,
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl KeywordTable {
    pub fn builtin() -> Self {
        Self {
            rules: BUILTIN_KEYWORDS
                .iter()
                .map(|(k, c)| (k.to_string(), c.to_string()))
                .collect(),
        }
    }

    /// Table from configuration; an empty list means the built-in table
    pub fn from_rules(rules: &[KeywordRule]) -> Self {
        if rules.is_empty() {
            return Self::builtin();
        }
        Self {
            rules: rules
                .iter()
                .map(|r| (r.keyword.to_lowercase(), r.category.clone()))
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rules.iter().map(|(k, c)| (k.as_str(), c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Match one label against the ranked candidates.
///
/// Returns a member of `candidates` or `None`; never any other string.
pub fn match_label<'c>(
    label: &str,
    candidates: &'c [String],
    keywords: &KeywordTable,
) -> Option<&'c str> {
    let label = label.to_lowercase();
    if label.is_empty() {
        return None;
    }

    for candidate in candidates {
        let normalized = candidate.to_lowercase();
        if label.contains(&normalized) || normalized.contains(&label) {
            return Some(candidate.as_str());
        }
    }

    for (keyword, category) in keywords.iter() {
        if label.contains(keyword) {
            if let Some(candidate) = candidates.iter().find(|c| c.as_str() == category) {
                return Some(candidate.as_str());
            }
        }
    }

    None
}

/// Assigns transactions to a fixed candidate list
#[derive(Debug, Clone)]
pub struct CategoryMatcher<'a> {
    candidates: &'a [String],
    keywords: &'a KeywordTable,
    mode: LabelMatching,
}

impl<'a> CategoryMatcher<'a> {
    pub fn new(candidates: &'a [String], keywords: &'a KeywordTable, mode: LabelMatching) -> Self {
        Self {
            candidates,
            keywords,
            mode,
        }
    }

    pub fn candidates(&self) -> &'a [String] {
        self.candidates
    }

    /// Category the transaction is charted under, or `None` for "Other".
    ///
    /// Heuristic mode tries the category field, then the vendor, then the
    /// memo; exact mode only accepts a category field equal to a candidate.
    pub fn resolve(&self, txn: &Transaction) -> Option<&'a str> {
        match self.mode {
            LabelMatching::Exact => self
                .candidates
                .iter()
                .find(|c| c.as_str() == txn.category)
                .map(|c| c.as_str()),
            LabelMatching::Heuristic => [&txn.category, &txn.vendor, &txn.memo]
                .into_iter()
                .find_map(|label| match_label(label, self.candidates, self.keywords)),
        }
    }

    /// Like [`resolve`](Self::resolve) with "Other" filled in
    pub fn bucket(&self, txn: &Transaction) -> &'a str {
        self.resolve(txn).unwrap_or(OTHER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn txn(category: &str, vendor: &str, memo: &str) -> Transaction {
        Transaction {
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            amount: dec!(10),
            year: 2025,
            month: 1,
            category: category.to_string(),
            vendor: vendor.to_string(),
            memo: memo.to_string(),
            kind: String::new(),
        }
    }

    #[test]
    fn test_substring_either_direction() {
        let candidates = names(&["Guard Service", "Water"]);
        let table = KeywordTable::builtin();
        assert_eq!(match_label("Water bill - March", &candidates, &table), Some("Water"));
        assert_eq!(match_label("guard", &candidates, &table), Some("Guard Service"));
    }

    #[test]
    fn test_empty_label_is_none() {
        let candidates = names(&["Water"]);
        assert_eq!(match_label("", &candidates, &KeywordTable::builtin()), None);
    }

    #[test]
    fn test_keyword_requires_candidate_membership() {
        let table = KeywordTable::builtin();
        let with_pool = names(&["Swimming Pool", "Electric"]);
        let without_pool = names(&["Electric"]);
        assert_eq!(match_label("Pool chemicals", &with_pool, &table), Some("Swimming Pool"));
        assert_eq!(match_label("Pool chemicals", &without_pool, &table), None);
    }

    #[test]
    fn test_order_sensitive_double_match() {
        let table = KeywordTable::builtin();
        let gas_first = names(&["Gas", "Gates Maintenance"]);
        let gates_first = names(&["Gates Maintenance", "Gas"]);

        // both candidates are substrings of the label
        let label = "Gas & Gates Maintenance";
        assert_eq!(match_label(label, &gas_first, &table), Some("Gas"));
        assert_eq!(match_label(label, &gates_first, &table), Some("Gates Maintenance"));

        // deterministic for a fixed order
        for _ in 0..3 {
            assert_eq!(match_label(label, &gas_first, &table), Some("Gas"));
        }
    }

    #[test]
    fn test_falls_through_category_vendor_memo() {
        let candidates = names(&["Electric", "Telephone"]);
        let table = KeywordTable::builtin();
        let matcher = CategoryMatcher::new(&candidates, &table, LabelMatching::Heuristic);

        assert_eq!(matcher.resolve(&txn("Uncategorized", "FPL Electric", "")), Some("Electric"));
        assert_eq!(matcher.resolve(&txn("Uncategorized", "AT&T", "telephone line")), Some("Telephone"));
        assert_eq!(matcher.bucket(&txn("Uncategorized", "Acme", "misc")), OTHER);
    }

    #[test]
    fn test_exact_mode_uses_raw_category() {
        let candidates = names(&["Water"]);
        let table = KeywordTable::builtin();
        let matcher = CategoryMatcher::new(&candidates, &table, LabelMatching::Exact);

        assert_eq!(matcher.resolve(&txn("Water", "", "")), Some("Water"));
        assert_eq!(matcher.resolve(&txn("Water bill", "Water Co", "")), None);
    }

    #[test]
    fn test_configured_keywords_replace_builtin() {
        let rules = vec![KeywordRule {
            keyword: "HOA Mgmt".to_string(),
            category: "Management Expenses".to_string(),
        }];
        let table = KeywordTable::from_rules(&rules);
        assert_eq!(table.len(), 1);
        let candidates = names(&["Management Expenses"]);
        assert_eq!(
            match_label("Monthly hoa mgmt fee", &candidates, &table),
            Some("Management Expenses")
        );
        assert_eq!(KeywordTable::from_rules(&[]).len(), 20);
    }
}
